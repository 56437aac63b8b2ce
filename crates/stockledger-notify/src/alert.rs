//! Alert messages and their (deliberately plain) HTML rendering.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use stockledger_core::{notification::NotificationKind, stock::LowStockSignal};

/// A rendered alert waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
  pub kind:      NotificationKind,
  /// Overrides the dispatcher's default recipient when set.
  pub recipient: Option<String>,
  pub subject:   String,
  pub html:      String,
}

impl AlertMessage {
  /// Alert for a single product at or below the threshold.
  pub fn low_stock(signal: &LowStockSignal) -> Self {
    let name = escape(&signal.product_name);
    Self {
      kind:      NotificationKind::LowStock,
      recipient: None,
      subject:   format!("Low stock: {}", signal.product_name),
      html:      format!(
        "<p><strong>{name}</strong> is running low: {} units left.</p>",
        signal.current_stock
      ),
    }
  }

  /// One consolidated alert listing every low product.
  pub fn low_stock_digest(signals: &[LowStockSignal]) -> Self {
    let mut html = String::from("<p>The following products are at or below the restock threshold:</p><ul>");
    for s in signals {
      let _ = write!(html, "<li>{}: {} units</li>", escape(&s.product_name), s.current_stock);
    }
    html.push_str("</ul>");

    let subject = match signals.len() {
      1 => "Low stock: 1 product needs restocking".to_owned(),
      n => format!("Low stock: {n} products need restocking"),
    };

    Self { kind: NotificationKind::LowStockDigest, recipient: None, subject, html }
  }

  pub fn to(mut self, recipient: impl Into<String>) -> Self {
    self.recipient = Some(recipient.into());
    self
  }
}

fn escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}
