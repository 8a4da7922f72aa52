//! Core types and logic for the Roster registration store.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::SheetBackend`]; everything else depends on
//! [`store::RecordStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod error;
pub mod geo;
pub mod place;
pub mod record;
pub mod search;
pub mod session;
pub mod sheet;
pub mod store;

pub use error::{Error, FieldError, Result, ValidationErrors};
