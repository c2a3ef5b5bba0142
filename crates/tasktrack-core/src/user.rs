//! Users: local records keyed to an identity-provider subject.
//!
//! A user row is created on first registration and never changes afterwards.
//! The role in particular is fixed at creation; there is no promotion path.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Surrogate key of a [`User`] row.
pub type UserId = i64;

/// The two roles the service distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Internee,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Internee => "internee",
    }
  }

  pub fn is_admin(self) -> bool { matches!(self, Role::Admin) }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "admin" => Ok(Role::Admin),
      "internee" => Ok(Role::Internee),
      other => Err(Error::Validation(format!("unknown role: {other:?}"))),
    }
  }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:                  UserId,
  /// Stable identifier issued by the identity provider. Unique.
  pub external_subject_id: String,
  pub email:               String,
  pub name:                String,
  pub role:                Role,
  pub created_at:          DateTime<Utc>,
}

/// Input for [`TaskStore::register_user`](crate::store::TaskStore::register_user).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub external_subject_id: String,
  pub email:               String,
  pub name:                String,
  pub role:                Role,
}

/// Result of an idempotent registration.
#[derive(Debug, Clone)]
pub struct Registration {
  pub user:    User,
  /// `false` when the subject was already registered (including when a
  /// concurrent registration won the race).
  pub created: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_parses_known_values() {
    assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!("internee".parse::<Role>().unwrap(), Role::Internee);
  }

  #[test]
  fn role_rejects_unknown_values() {
    let err = "superuser".parse::<Role>().unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(matches!("Admin".parse::<Role>(), Err(Error::Validation(_))));
  }
}
