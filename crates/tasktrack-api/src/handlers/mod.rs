//! HTTP handlers, one module per resource.

pub mod health;
pub mod reports;
pub mod tasks;
pub mod users;
