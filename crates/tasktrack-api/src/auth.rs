//! Bearer-token extractors.
//!
//! [`Subject`] proves the caller holds a valid token. [`CurrentUser`] also
//! requires that the subject has registered.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use tasktrack_core::{
  Error,
  identity::{IdentityProvider, VerifiedSubject},
  service::IdentityResolver,
  store::TaskStore,
  user::User,
};
use tracing::debug;

use crate::{AppState, error::ApiError};

/// The raw token from an `Authorization: Bearer <token>` header. The scheme
/// name is case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.trim_start().split_once(' '))
    .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
    .map(|(_, token)| token.trim())
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthenticated)
}

/// A caller whose token verified. They may not be registered yet.
pub struct Subject(pub VerifiedSubject);

/// A verified and registered caller.
pub struct CurrentUser(pub User);

impl<S, I> FromRequestParts<AppState<S, I>> for Subject
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, I>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?;
    let subject = state.identity.verify(token).await.map_err(|e| {
      debug!(error = %e, "rejected bearer token");
      Error::Unauthenticated
    })?;
    Ok(Subject(subject))
  }
}

impl<S, I> FromRequestParts<AppState<S, I>> for CurrentUser
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, I>,
  ) -> Result<Self, Self::Rejection> {
    let Subject(subject) = Subject::from_request_parts(parts, state).await?;
    let user = IdentityResolver::new(state.store.as_ref())
      .resolve(&subject)
      .await?;
    Ok(CurrentUser(user))
  }
}
