//! The `TaskStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `tasktrack-store-sqlite`).
//! The managers in [`crate::service`] depend on this abstraction, not on any
//! concrete backend.
//!
//! Every method is a single storage transaction. Methods that write more than
//! one row, or that must check a precondition before writing, do both inside
//! that transaction and report the outcome as a [`WriteOutcome`].

use std::future::Future;

use crate::{
  report::{NewReport, ProgressReport, ReportView},
  task::{
    NewSubmission, NewTask, SubmissionView, Task, TaskId, TaskPatch,
    TaskSubmission, TaskView,
  },
  user::{NewUser, Registration, Role, User, UserId},
};

// ─── Supporting types ────────────────────────────────────────────────────────

/// Row scope for listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  /// Every row.
  All,
  /// Only rows owned by this user (`assigned_to` for tasks, `internee_id`
  /// for reports).
  OwnedBy(UserId),
}

/// Outcome of a write whose preconditions are checked inside the storage
/// transaction. Anything other than `Applied` means nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome<T> {
  Applied(T),
  /// The target task does not exist.
  TaskMissing,
  /// The target task exists but is not assigned to the expected user.
  NotAssignee,
  /// A referenced user (assignee, internee) does not exist.
  UserMissing(UserId),
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a task tracker storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait TaskStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Look up a user by identity-provider subject.
  fn find_user_by_subject<'a>(
    &'a self,
    subject: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Insert a user unless one already exists for the subject.
  ///
  /// Must be race-free: two concurrent calls for the same subject produce one
  /// row, and the loser receives it with `created = false`.
  fn register_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Registration, Self::Error>> + Send + '_;

  /// All users with `role`, ordered by id.
  fn list_users_by_role(
    &self,
    role: Role,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  // ── Tasks ─────────────────────────────────────────────────────────────

  /// Insert a task with status `pending`. Yields `UserMissing` if the
  /// assignee does not exist.
  fn create_task(
    &self,
    created_by: UserId,
    input: NewTask,
  ) -> impl Future<Output = Result<WriteOutcome<Task>, Self::Error>> + Send + '_;

  fn get_task(
    &self,
    id: TaskId,
  ) -> impl Future<Output = Result<Option<Task>, Self::Error>> + Send + '_;

  /// Tasks with creator and assignee names, newest first (`created_at` desc,
  /// then `id` desc).
  fn list_tasks(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<TaskView>, Self::Error>> + Send + '_;

  /// Apply every field in `patch` and bump `updated_at`, atomically.
  ///
  /// When `assignee` is `Some`, the write only happens if the task is still
  /// assigned to that user; otherwise `NotAssignee`. A patch that reassigns
  /// the task to a non-existent user yields `UserMissing`.
  fn update_task(
    &self,
    id: TaskId,
    patch: TaskPatch,
    assignee: Option<UserId>,
  ) -> impl Future<Output = Result<WriteOutcome<Task>, Self::Error>> + Send + '_;

  /// Delete a task and its submissions. Returns `false` if no task matched.
  fn delete_task(
    &self,
    id: TaskId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Submissions ───────────────────────────────────────────────────────

  /// Record a submission and mark the task `completed` in one transaction.
  ///
  /// The task must still be assigned to `input.submitted_by`; otherwise
  /// `NotAssignee` and nothing is written.
  fn submit_task(
    &self,
    input: NewSubmission,
  ) -> impl Future<Output = Result<WriteOutcome<TaskSubmission>, Self::Error>>
  + Send
  + '_;

  /// All submissions for a task with submitter names, newest first.
  fn list_submissions(
    &self,
    task_id: TaskId,
  ) -> impl Future<Output = Result<Vec<SubmissionView>, Self::Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Insert a report. Yields `UserMissing` if the internee does not exist.
  fn create_report(
    &self,
    generated_by: UserId,
    input: NewReport,
  ) -> impl Future<Output = Result<WriteOutcome<ProgressReport>, Self::Error>>
  + Send
  + '_;

  /// Reports with internee and issuer names, newest first.
  fn list_reports(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<ReportView>, Self::Error>> + Send + '_;

  // ── Health ────────────────────────────────────────────────────────────

  /// Run a trivial query to prove the backend is reachable.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
