//! Progress reports.
//!
//! Reports are issued by admins and never change afterwards. The figures they
//! carry are asserted by the admin; nothing here recomputes them from task
//! rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

pub type ReportId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
  pub id:                  ReportId,
  pub internee_id:         UserId,
  pub generated_by:        UserId,
  /// Free-form date string supplied by the caller.
  pub period_start:        String,
  pub period_end:          String,
  pub tasks_completed:     u32,
  pub tasks_pending:       u32,
  pub overall_performance: String,
  pub comments:            Option<String>,
  pub created_at:          DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
  pub internee_id:         UserId,
  pub period_start:        String,
  pub period_end:          String,
  pub tasks_completed:     u32,
  pub tasks_pending:       u32,
  pub overall_performance: String,
  pub comments:            Option<String>,
}

/// A report joined with the names of the internee and the issuing admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportView {
  #[serde(flatten)]
  pub report:            ProgressReport,
  pub internee_name:     String,
  pub generated_by_name: String,
}
