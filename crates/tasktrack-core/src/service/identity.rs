use tracing::info;

use crate::{
  Error, Result,
  identity::VerifiedSubject,
  policy::{self, Action},
  store::TaskStore,
  user::{NewUser, Registration, Role, User},
};

use super::require_text;

/// Maps verified identity-provider subjects to local users.
pub struct IdentityResolver<'a, S> {
  store: &'a S,
}

impl<'a, S: TaskStore> IdentityResolver<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Look up the user registered for `subject`.
  pub async fn resolve(&self, subject: &VerifiedSubject) -> Result<User> {
    self
      .store
      .find_user_by_subject(subject.as_str())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound("user not registered".to_string()))
  }

  /// Register `subject`, or return the existing record if it already is.
  pub async fn register(
    &self,
    subject: &VerifiedSubject,
    email: String,
    name: String,
    role: Role,
  ) -> Result<Registration> {
    require_text("email", &email)?;
    require_text("name", &name)?;

    let registration = self
      .store
      .register_user(NewUser {
        external_subject_id: subject.as_str().to_owned(),
        email,
        name,
        role,
      })
      .await
      .map_err(Error::store)?;

    if registration.created {
      info!(
        user_id = registration.user.id,
        role = %registration.user.role,
        "registered user"
      );
    }
    Ok(registration)
  }

  /// All internees, for admins assembling assignments.
  pub async fn list_internees(&self, actor: &User) -> Result<Vec<User>> {
    policy::require(
      actor,
      Action::ListInternees,
      policy::can_list_internees(actor.role),
    )?;
    self
      .store
      .list_users_by_role(Role::Internee)
      .await
      .map_err(Error::store)
  }
}
