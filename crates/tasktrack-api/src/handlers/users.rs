//! Handlers for registration and user lookups.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/register` | Body: `{"email","name","role"}`; 201 new, 200 existing |
//! | `GET`  | `/users/me` | 404 until registered |
//! | `GET`  | `/users/internees` | Admin only |

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tasktrack_core::{
  identity::IdentityProvider,
  service::IdentityResolver,
  store::TaskStore,
  user::{Role, User, UserId},
};

use crate::{
  AppState,
  auth::{CurrentUser, Subject},
  error::ApiError,
  extract::JsonBody,
};

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email: String,
  pub name:  String,
  pub role:  String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterStatus {
  Created,
  Existing,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
  pub user_id: UserId,
  pub status:  RegisterStatus,
  pub user:    User,
}

/// `POST /register`
pub async fn register<S, I>(
  State(state): State<AppState<S, I>>,
  Subject(subject): Subject,
  JsonBody(body): JsonBody<RegisterBody>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  let role: Role = body.role.parse()?;
  let registration = IdentityResolver::new(state.store.as_ref())
    .register(&subject, body.email, body.name, role)
    .await?;

  let (status, tag) = if registration.created {
    (StatusCode::CREATED, RegisterStatus::Created)
  } else {
    (StatusCode::OK, RegisterStatus::Existing)
  };
  Ok((status, Json(RegisterResponse {
    user_id: registration.user.id,
    status:  tag,
    user:    registration.user,
  })))
}

// ─── Me ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MeResponse {
  pub subject: String,
  pub user:    User,
}

/// `GET /users/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
  Json(MeResponse {
    subject: user.external_subject_id.clone(),
    user,
  })
}

// ─── Internees ───────────────────────────────────────────────────────────────

/// `GET /users/internees`
pub async fn internees<S, I>(
  State(state): State<AppState<S, I>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  let users = IdentityResolver::new(state.store.as_ref())
    .list_internees(&actor)
    .await?;
  Ok(Json(users))
}
