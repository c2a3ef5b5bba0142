//! SQLite backend for the task tracker.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every [`TaskStore`] method is one
//! SQLite transaction.
//!
//! [`TaskStore`]: tasktrack_core::store::TaskStore

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
