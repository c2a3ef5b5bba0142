//! Tasks and task submissions.
//!
//! A task moves through `pending → in_progress → completed`. Admins may set
//! any status at any time; the submit operation is the only path that forces
//! `completed`, and it does so together with recording a [`TaskSubmission`].

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, user::UserId};

pub type TaskId = i64;
pub type SubmissionId = i64;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  #[default]
  Pending,
  InProgress,
  Completed,
}

impl TaskStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      TaskStatus::Pending => "pending",
      TaskStatus::InProgress => "in_progress",
      TaskStatus::Completed => "completed",
    }
  }
}

impl fmt::Display for TaskStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TaskStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(TaskStatus::Pending),
      "in_progress" => Ok(TaskStatus::InProgress),
      "completed" => Ok(TaskStatus::Completed),
      other => Err(Error::Validation(format!("unsupported status: {other:?}"))),
    }
  }
}

// ─── Task ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
  pub id:          TaskId,
  pub title:       String,
  pub description: Option<String>,
  pub status:      TaskStatus,
  /// Always an admin at creation time.
  pub created_by:  UserId,
  pub assigned_to: UserId,
  pub deadline:    Option<DateTime<Utc>>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input for creating a task. `created_by` and `status` are set by the
/// manager, not the caller.
#[derive(Debug, Clone)]
pub struct NewTask {
  pub title:       String,
  pub description: Option<String>,
  pub assigned_to: UserId,
  pub deadline:    Option<DateTime<Utc>>,
}

/// A task joined with the display names of its creator and assignee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
  #[serde(flatten)]
  pub task:             Task,
  pub created_by_name:  String,
  pub assigned_to_name: String,
}

// ─── Partial updates ─────────────────────────────────────────────────────────

/// Names of the task columns a caller may write.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
  Title,
  Description,
  Status,
  AssignedTo,
  Deadline,
}

impl TaskField {
  pub const ALL: [TaskField; 5] = [
    TaskField::Title,
    TaskField::Description,
    TaskField::Status,
    TaskField::AssignedTo,
    TaskField::Deadline,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      TaskField::Title => "title",
      TaskField::Description => "description",
      TaskField::Status => "status",
      TaskField::AssignedTo => "assigned_to",
      TaskField::Deadline => "deadline",
    }
  }
}

pub type FieldSet = BTreeSet<TaskField>;

/// A partial update. `None` means "leave unchanged"; there is no way to reset
/// a nullable column to `NULL` through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub status:      Option<TaskStatus>,
  pub assigned_to: Option<UserId>,
  pub deadline:    Option<DateTime<Utc>>,
}

impl TaskPatch {
  /// The set of fields this patch would write.
  pub fn fields(&self) -> FieldSet {
    let mut set = FieldSet::new();
    if self.title.is_some() {
      set.insert(TaskField::Title);
    }
    if self.description.is_some() {
      set.insert(TaskField::Description);
    }
    if self.status.is_some() {
      set.insert(TaskField::Status);
    }
    if self.assigned_to.is_some() {
      set.insert(TaskField::AssignedTo);
    }
    if self.deadline.is_some() {
      set.insert(TaskField::Deadline);
    }
    set
  }

  pub fn is_empty(&self) -> bool { self.fields().is_empty() }
}

// ─── Submissions ─────────────────────────────────────────────────────────────

/// A record of completed work against a task. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSubmission {
  pub id:             SubmissionId,
  pub task_id:        TaskId,
  pub submitted_by:   UserId,
  pub description:    String,
  pub attachment_url: Option<String>,
  pub submitted_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
  pub task_id:        TaskId,
  pub submitted_by:   UserId,
  pub description:    String,
  pub attachment_url: Option<String>,
}

/// A submission joined with the submitter's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionView {
  #[serde(flatten)]
  pub submission:        TaskSubmission,
  pub submitted_by_name: String,
}
