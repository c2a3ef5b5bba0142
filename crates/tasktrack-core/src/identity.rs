//! The identity-provider seam.
//!
//! Token verification is an external concern. Whatever verifies the bearer
//! credential only has to turn it into a stable subject identifier, or fail.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// A subject identifier the identity provider has vouched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerifiedSubject(String);

impl VerifiedSubject {
  /// Only identity providers should construct this.
  pub fn new(subject: impl Into<String>) -> Self { Self(subject.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

/// Verifies bearer tokens issued by an external identity provider.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn verify<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<VerifiedSubject, Self::Error>> + Send + 'a;
}
