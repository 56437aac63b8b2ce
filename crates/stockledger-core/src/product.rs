//! Product: the catalog entity the ledger refers to by id.
//!
//! The catalog owns pricing and descriptions; the ledger only needs identity
//! and a human-readable name to label alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub product_id: Uuid,
  pub name:       String,
  pub slug:       String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::InventoryStore::add_product`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  pub name: String,
  pub slug: String,
}

impl NewProduct {
  pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
    Self { name: name.into(), slug: slug.into() }
  }
}

/// Outcome of [`crate::store::InventoryStore::add_product`]. Slugs are unique;
/// the store reports a collision as a value so every backend can be mapped
/// the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductInsert {
  Created(Product),
  SlugTaken,
}

impl ProductInsert {
  pub fn created(self) -> Option<Product> {
    match self {
      Self::Created(p) => Some(p),
      Self::SlugTaken => None,
    }
  }
}
