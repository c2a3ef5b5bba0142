//! Core types and trait definitions for the task tracker.
//!
//! This crate has no HTTP or database dependencies. It owns the domain model,
//! the authorization policy, and the managers that enforce that policy on top
//! of any [`store::TaskStore`] backend.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod policy;
pub mod report;
pub mod service;
pub mod store;
pub mod task;
pub mod user;

pub use error::{Error, Result};
