//! Managers that enforce the [`policy`](crate::policy) on top of a
//! [`TaskStore`](crate::store::TaskStore).
//!
//! Each manager borrows the store for the duration of one request; it holds no
//! state of its own.

mod identity;
mod reports;
mod tasks;

#[cfg(test)]
mod tests;

pub use identity::IdentityResolver;
pub use reports::ReportManager;
pub use tasks::TaskManager;

use crate::{Error, Result};

/// Reject blank required text before anything is written.
fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::Validation(format!("{field} must not be empty")));
  }
  Ok(())
}

/// A backend returned an outcome its contract rules out for this call.
fn unreachable_outcome<T>(operation: &str) -> Result<T> {
  Err(Error::Store(
    format!("backend returned an invalid outcome for {operation}").into(),
  ))
}
