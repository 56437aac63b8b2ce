//! SendGrid v3 mail-send provider.

use reqwest::Client;
use serde_json::json;

use crate::{
  config::SendGridConfig,
  provider::{Delivery, EmailProvider},
};

#[derive(Debug, Clone)]
pub struct SendGridProvider {
  client:   Client,
  api_key:  Option<String>,
  base_url: String,
  from:     String,
}

impl SendGridProvider {
  pub fn new(cfg: &SendGridConfig, from: &str, client: Client) -> Self {
    Self {
      client,
      api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
      base_url: cfg.base_url.trim_end_matches('/').to_owned(),
      from: from.to_owned(),
    }
  }

  /// `POST {base}/v3/mail/send`; SendGrid answers `202 Accepted` with an
  /// empty body and the message id in `X-Message-Id`.
  pub async fn deliver(&self, to: &str, subject: &str, html: &str) -> Delivery {
    let Some(key) = self.api_key.as_deref() else {
      return Delivery::failed("sendgrid is not configured");
    };

    let body = json!({
      "personalizations": [{ "to": [{ "email": to }] }],
      "from":    { "email": self.from },
      "subject": subject,
      "content": [{ "type": "text/html", "value": html }],
    });

    let resp = match self
      .client
      .post(format!("{}/v3/mail/send", self.base_url))
      .bearer_auth(key)
      .json(&body)
      .send()
      .await
    {
      Ok(resp) => resp,
      Err(e) => return Delivery::failed(format!("sendgrid request failed: {e}")),
    };

    let status = resp.status();
    if !status.is_success() {
      let text = resp.text().await.unwrap_or_default();
      return Delivery::failed(format!("sendgrid returned {status}: {text}"));
    }

    let message_id = resp
      .headers()
      .get("x-message-id")
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    Delivery::Sent { message_id }
  }
}

impl EmailProvider for SendGridProvider {
  fn name(&self) -> &str { "sendgrid" }

  fn is_configured(&self) -> bool { self.api_key.is_some() }

  async fn send(&self, to: &str, subject: &str, html: &str) -> Delivery {
    self.deliver(to, subject, html).await
  }
}
