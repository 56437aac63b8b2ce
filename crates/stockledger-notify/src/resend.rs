//! Resend (`https://resend.com`) email provider.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{
  config::ResendConfig,
  provider::{Delivery, EmailProvider},
};

#[derive(Debug, Clone)]
pub struct ResendProvider {
  client:   Client,
  api_key:  Option<String>,
  base_url: String,
  from:     String,
}

#[derive(Deserialize)]
struct SendResponse {
  id: Option<String>,
}

impl ResendProvider {
  pub fn new(cfg: &ResendConfig, from: &str, client: Client) -> Self {
    Self {
      client,
      api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
      base_url: cfg.base_url.trim_end_matches('/').to_owned(),
      from: from.to_owned(),
    }
  }

  /// `POST {base}/emails`
  pub async fn deliver(&self, to: &str, subject: &str, html: &str) -> Delivery {
    let Some(key) = self.api_key.as_deref() else {
      return Delivery::failed("resend is not configured");
    };

    let body = json!({
      "from":    self.from,
      "to":      [to],
      "subject": subject,
      "html":    html,
    });

    let resp = match self
      .client
      .post(format!("{}/emails", self.base_url))
      .bearer_auth(key)
      .json(&body)
      .send()
      .await
    {
      Ok(resp) => resp,
      Err(e) => return Delivery::failed(format!("resend request failed: {e}")),
    };

    let status = resp.status();
    if !status.is_success() {
      let text = resp.text().await.unwrap_or_default();
      return Delivery::failed(format!("resend returned {status}: {text}"));
    }

    // A 2xx without a parseable body still means the message was accepted.
    let message_id = resp.json::<SendResponse>().await.ok().and_then(|r| r.id);
    Delivery::Sent { message_id }
  }
}

impl EmailProvider for ResendProvider {
  fn name(&self) -> &str { "resend" }

  fn is_configured(&self) -> bool { self.api_key.is_some() }

  async fn send(&self, to: &str, subject: &str, html: &str) -> Delivery {
    self.deliver(to, subject, html).await
  }
}
