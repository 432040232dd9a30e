//! Core types, access policy and lifecycle orchestration for Snipper.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement the traits in [`store`]; the API layer drives
//! the services in [`service`] and [`account`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod error;
pub mod identity;
pub mod page;
pub mod policy;
pub mod service;
pub mod snippet;
pub mod store;
pub mod tags;
pub mod user;

#[cfg(test)]
mod testing;

pub use error::{Error, FieldErrors, Result};
pub use identity::Identity;
