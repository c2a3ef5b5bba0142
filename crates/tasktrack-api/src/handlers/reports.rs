//! Handlers for `/reports` endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tasktrack_core::{
  identity::IdentityProvider,
  report::{NewReport, ProgressReport, ReportView},
  service::ReportManager,
  store::TaskStore,
  user::UserId,
};

use crate::{AppState, auth::CurrentUser, error::ApiError, extract::JsonBody};

#[derive(Debug, Deserialize)]
pub struct CreateReportBody {
  pub internee_id:         UserId,
  pub period_start:        String,
  pub period_end:          String,
  pub tasks_completed:     u32,
  pub tasks_pending:       u32,
  pub overall_performance: String,
  #[serde(default)]
  pub comments:            Option<String>,
}

impl From<CreateReportBody> for NewReport {
  fn from(body: CreateReportBody) -> Self {
    NewReport {
      internee_id:         body.internee_id,
      period_start:        body.period_start,
      period_end:          body.period_end,
      tasks_completed:     body.tasks_completed,
      tasks_pending:       body.tasks_pending,
      overall_performance: body.overall_performance,
      comments:            body.comments,
    }
  }
}

/// `POST /reports`
pub async fn create<S, I>(
  State(state): State<AppState<S, I>>,
  CurrentUser(actor): CurrentUser,
  JsonBody(body): JsonBody<CreateReportBody>,
) -> Result<(StatusCode, Json<ProgressReport>), ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  let report = ReportManager::new(state.store.as_ref())
    .create(&actor, body.into())
    .await?;
  Ok((StatusCode::CREATED, Json(report)))
}

/// `GET /reports`
pub async fn list<S, I>(
  State(state): State<AppState<S, I>>,
  CurrentUser(actor): CurrentUser,
) -> Result<Json<Vec<ReportView>>, ApiError>
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  let reports = ReportManager::new(state.store.as_ref()).list(&actor).await?;
  Ok(Json(reports))
}
