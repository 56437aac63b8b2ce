//! Core types and trait definitions for the stockledger inventory ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Every other crate depends on it; stock is never stored here, only derived
//! from the event log by [`stock`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod audit;
pub mod error;
pub mod event;
pub mod notification;
pub mod product;
pub mod stock;
pub mod store;

pub use error::{Error, Result};
