//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexicographic order equals chronological
//! order. Enums are stored as their lowercase wire names.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Row, types::Value};
use tasktrack_core::{
  report::{ProgressReport, ReportView},
  store::{Scope, WriteOutcome},
  task::{
    SubmissionView, Task, TaskField, TaskPatch, TaskStatus, TaskSubmission,
    TaskView,
  },
  user::{Role, User, UserId},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Scope ───────────────────────────────────────────────────────────────────

/// `None` for [`Scope::All`]; bound to `(?1 IS NULL OR owner = ?1)` filters.
pub fn encode_scope(scope: Scope) -> Option<UserId> {
  match scope {
    Scope::All => None,
    Scope::OwnedBy(id) => Some(id),
  }
}

// ─── TaskPatch ───────────────────────────────────────────────────────────────

/// Column/value pairs for an `UPDATE tasks SET ..` statement, one per field
/// present in the patch.
pub fn encode_patch(patch: TaskPatch) -> Vec<(&'static str, Value)> {
  let mut sets = Vec::new();
  if let Some(title) = patch.title {
    sets.push((TaskField::Title.as_str(), Value::Text(title)));
  }
  if let Some(description) = patch.description {
    sets.push((TaskField::Description.as_str(), Value::Text(description)));
  }
  if let Some(status) = patch.status {
    sets.push((TaskField::Status.as_str(), Value::Text(status.as_str().to_owned())));
  }
  if let Some(assigned_to) = patch.assigned_to {
    sets.push((TaskField::AssignedTo.as_str(), Value::Integer(assigned_to)));
  }
  if let Some(deadline) = patch.deadline {
    sets.push((TaskField::Deadline.as_str(), Value::Text(encode_dt(deadline))));
  }
  sets
}

// ─── Counts ──────────────────────────────────────────────────────────────────

fn decode_count(column: &'static str, v: i64) -> Result<u32> {
  u32::try_from(v).map_err(|_| Error::Decode { column, value: v.to_string() })
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Decode the payload of an applied write, passing other outcomes through.
pub fn decode_outcome<R, T>(
  outcome: WriteOutcome<R>,
  decode: impl FnOnce(R) -> Result<T>,
) -> Result<WriteOutcome<T>> {
  Ok(match outcome {
    WriteOutcome::Applied(raw) => WriteOutcome::Applied(decode(raw)?),
    WriteOutcome::TaskMissing => WriteOutcome::TaskMissing,
    WriteOutcome::NotAssignee => WriteOutcome::NotAssignee,
    WriteOutcome::UserMissing(id) => WriteOutcome::UserMissing(id),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected for a [`RawUser`], in order.
pub const USER_COLUMNS: &str =
  "id, external_subject_id, email, name, role, created_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:                  i64,
  pub external_subject_id: String,
  pub email:               String,
  pub name:                String,
  pub role:                String,
  pub created_at:          String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      external_subject_id: row.get(1)?,
      email:               row.get(2)?,
      name:                row.get(3)?,
      role:                row.get(4)?,
      created_at:          row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:                  self.id,
      external_subject_id: self.external_subject_id,
      email:               self.email,
      name:                self.name,
      role:                self.role.parse::<Role>()?,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

/// Columns selected for a [`RawTask`], in order, from `tasks` aliased as `t`.
pub const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.status, \
   t.created_by, t.assigned_to, t.deadline, t.created_at, t.updated_at";

/// Raw values read directly from a `tasks` row.
pub struct RawTask {
  pub id:          i64,
  pub title:       String,
  pub description: Option<String>,
  pub status:      String,
  pub created_by:  i64,
  pub assigned_to: i64,
  pub deadline:    Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawTask {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      status:      row.get(3)?,
      created_by:  row.get(4)?,
      assigned_to: row.get(5)?,
      deadline:    row.get(6)?,
      created_at:  row.get(7)?,
      updated_at:  row.get(8)?,
    })
  }

  pub fn into_task(self) -> Result<Task> {
    Ok(Task {
      id:          self.id,
      title:       self.title,
      description: self.description,
      status:      self.status.parse::<TaskStatus>()?,
      created_by:  self.created_by,
      assigned_to: self.assigned_to,
      deadline:    self.deadline.as_deref().map(decode_dt).transpose()?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// A task row followed by creator and assignee names.
pub struct RawTaskView {
  pub task:             RawTask,
  pub created_by_name:  String,
  pub assigned_to_name: String,
}

impl RawTaskView {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      task:             RawTask::from_row(row)?,
      created_by_name:  row.get(9)?,
      assigned_to_name: row.get(10)?,
    })
  }

  pub fn into_view(self) -> Result<TaskView> {
    Ok(TaskView {
      task:             self.task.into_task()?,
      created_by_name:  self.created_by_name,
      assigned_to_name: self.assigned_to_name,
    })
  }
}

/// Columns selected for a [`RawSubmission`], from `task_submissions` as `s`.
pub const SUBMISSION_COLUMNS: &str = "s.id, s.task_id, s.submitted_by, \
   s.description, s.attachment_url, s.submitted_at";

pub struct RawSubmission {
  pub id:             i64,
  pub task_id:        i64,
  pub submitted_by:   i64,
  pub description:    String,
  pub attachment_url: Option<String>,
  pub submitted_at:   String,
}

impl RawSubmission {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      task_id:        row.get(1)?,
      submitted_by:   row.get(2)?,
      description:    row.get(3)?,
      attachment_url: row.get(4)?,
      submitted_at:   row.get(5)?,
    })
  }

  pub fn into_submission(self) -> Result<TaskSubmission> {
    Ok(TaskSubmission {
      id:             self.id,
      task_id:        self.task_id,
      submitted_by:   self.submitted_by,
      description:    self.description,
      attachment_url: self.attachment_url,
      submitted_at:   decode_dt(&self.submitted_at)?,
    })
  }
}

pub struct RawSubmissionView {
  pub submission:        RawSubmission,
  pub submitted_by_name: String,
}

impl RawSubmissionView {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      submission:        RawSubmission::from_row(row)?,
      submitted_by_name: row.get(6)?,
    })
  }

  pub fn into_view(self) -> Result<SubmissionView> {
    Ok(SubmissionView {
      submission:        self.submission.into_submission()?,
      submitted_by_name: self.submitted_by_name,
    })
  }
}

/// Columns selected for a [`RawReport`], from `progress_reports` as `r`.
pub const REPORT_COLUMNS: &str = "r.id, r.internee_id, r.generated_by, \
   r.period_start, r.period_end, r.tasks_completed, r.tasks_pending, \
   r.overall_performance, r.comments, r.created_at";

pub struct RawReport {
  pub id:                  i64,
  pub internee_id:         i64,
  pub generated_by:        i64,
  pub period_start:        String,
  pub period_end:          String,
  pub tasks_completed:     i64,
  pub tasks_pending:       i64,
  pub overall_performance: String,
  pub comments:            Option<String>,
  pub created_at:          String,
}

impl RawReport {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      internee_id:         row.get(1)?,
      generated_by:        row.get(2)?,
      period_start:        row.get(3)?,
      period_end:          row.get(4)?,
      tasks_completed:     row.get(5)?,
      tasks_pending:       row.get(6)?,
      overall_performance: row.get(7)?,
      comments:            row.get(8)?,
      created_at:          row.get(9)?,
    })
  }

  pub fn into_report(self) -> Result<ProgressReport> {
    Ok(ProgressReport {
      id:                  self.id,
      internee_id:         self.internee_id,
      generated_by:        self.generated_by,
      period_start:        self.period_start,
      period_end:          self.period_end,
      tasks_completed:     decode_count("tasks_completed", self.tasks_completed)?,
      tasks_pending:       decode_count("tasks_pending", self.tasks_pending)?,
      overall_performance: self.overall_performance,
      comments:            self.comments,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawReportView {
  pub report:            RawReport,
  pub internee_name:     String,
  pub generated_by_name: String,
}

impl RawReportView {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      report:            RawReport::from_row(row)?,
      internee_name:     row.get(10)?,
      generated_by_name: row.get(11)?,
    })
  }

  pub fn into_view(self) -> Result<ReportView> {
    Ok(ReportView {
      report:            self.report.into_report()?,
      internee_name:     self.internee_name,
      generated_by_name: self.generated_by_name,
    })
  }
}
