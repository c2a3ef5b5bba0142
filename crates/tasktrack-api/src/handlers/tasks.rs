//! Handlers for `/tasks` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/tasks` | Admin only; body: `{"title","assigned_to",..}` |
//! | `GET`  | `/tasks` | Scoped to the caller's role |
//! | `PUT`/`PATCH` | `/tasks/{id}` | Partial; `{}` is a no-op |
//! | `DELETE` | `/tasks/{id}` | Admin only; 204 |
//! | `POST` | `/tasks/{id}/submit` | Assignee only; marks the task completed |
//! | `GET`  | `/tasks/{id}/submissions` | Newest first |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasktrack_core::{
  identity::IdentityProvider,
  service::TaskManager,
  store::TaskStore,
  task::{
    NewTask, SubmissionView, Task, TaskId, TaskPatch, TaskStatus,
    TaskSubmission, TaskView,
  },
  user::UserId,
};

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  extract::{JsonBody, PathParam},
};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateTaskBody {
  pub title:       String,
  #[serde(default)]
  pub description: Option<String>,
  pub assigned_to: UserId,
  #[serde(default)]
  pub deadline:    Option<DateTime<Utc>>,
}

/// `POST /tasks`
pub async fn create<S, I>(
  State(state): State<AppState<S, I>>,
  CurrentUser(actor): CurrentUser,
  JsonBody(body): JsonBody<CreateTaskBody>,
) -> Result<(StatusCode, Json<Task>), ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  let task = TaskManager::new(state.store.as_ref())
    .create(&actor, NewTask {
      title:       body.title,
      description: body.description,
      assigned_to: body.assigned_to,
      deadline:    body.deadline,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(task)))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /tasks`
pub async fn list<S, I>(
  State(state): State<AppState<S, I>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<TaskView>>, ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  let tasks = TaskManager::new(state.store.as_ref()).list(&actor).await?;
  Ok(Json(tasks))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Every field optional; absent means unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskBody {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub status:      Option<String>,
  pub assigned_to: Option<UserId>,
  pub deadline:    Option<DateTime<Utc>>,
}

impl TryFrom<UpdateTaskBody> for TaskPatch {
  type Error = tasktrack_core::Error;

  fn try_from(body: UpdateTaskBody) -> Result<Self, Self::Error> {
    Ok(TaskPatch {
      title:       body.title,
      description: body.description,
      status:      body.status.as_deref().map(str::parse::<TaskStatus>).transpose()?,
      assigned_to: body.assigned_to,
      deadline:    body.deadline,
    })
  }
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
  pub updated: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub task:    Option<Task>,
}

/// `PUT /tasks/{id}` and `PATCH /tasks/{id}`
pub async fn update<S, I>(
  State(state): State<AppState<S, I>>,
  CurrentUser(actor): CurrentUser,
  PathParam(id): PathParam<TaskId>,
  JsonBody(body): JsonBody<UpdateTaskBody>,
) -> Result<Json<UpdateResponse>, ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  let patch = TaskPatch::try_from(body)?;
  let task = TaskManager::new(state.store.as_ref())
    .update(&actor, id, patch)
    .await?;
  Ok(Json(UpdateResponse { updated: task.is_some(), task }))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /tasks/{id}`
pub async fn delete<S, I>(
  State(state): State<AppState<S, I>>,
  CurrentUser(actor): CurrentUser,
  PathParam(id): PathParam<TaskId>,
) -> Result<StatusCode, ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  TaskManager::new(state.store.as_ref()).delete(&actor, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Submissions ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub description:    String,
  #[serde(default)]
  pub attachment_url: Option<String>,
}

/// `POST /tasks/{id}/submit`
pub async fn submit<S, I>(
  State(state): State<AppState<S, I>>,
  CurrentUser(actor): CurrentUser,
  PathParam(id): PathParam<TaskId>,
  JsonBody(body): JsonBody<SubmitBody>,
) -> Result<(StatusCode, Json<TaskSubmission>), ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  let submission = TaskManager::new(state.store.as_ref())
    .submit(&actor, id, body.description, body.attachment_url)
    .await?;
  Ok((StatusCode::CREATED, Json(submission)))
}

/// `GET /tasks/{id}/submissions`
pub async fn submissions<S, I>(
  State(state): State<AppState<S, I>>,
  CurrentUser(actor): CurrentUser,
  PathParam(id): PathParam<TaskId>,
) -> Result<Json<Vec<SubmissionView>>, ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  let submissions = TaskManager::new(state.store.as_ref())
    .list_submissions(&actor, id)
    .await?;
  Ok(Json(submissions))
}
