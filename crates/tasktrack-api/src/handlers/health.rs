use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tasktrack_core::{Error, identity::IdentityProvider, store::TaskStore};

use crate::{AppState, auth::Subject, error::ApiError};

#[derive(Debug, Serialize)]
pub struct Health {
  pub status:    &'static str,
  pub timestamp: DateTime<Utc>,
}

/// `GET /health`, unauthenticated.
pub async fn liveness() -> Json<Health> {
  Json(Health { status: "healthy", timestamp: Utc::now() })
}

/// `GET /health/storage`
pub async fn storage<S, I>(
  State(state): State<AppState<S, I>>,
  _subject: Subject,
) -> Result<Json<Health>, ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  state.store.ping().await.map_err(Error::store)?;
  Ok(Json(Health { status: "healthy", timestamp: Utc::now() }))
}
