//! Manager tests that must never reach storage.
//!
//! Behaviour that does touch storage is covered against a real backend in
//! `tasktrack-store-sqlite`.

use chrono::Utc;

use crate::{
  Error,
  report::{NewReport, ProgressReport, ReportView},
  store::{Scope, TaskStore, WriteOutcome},
  task::{
    NewSubmission, NewTask, SubmissionView, Task, TaskId, TaskPatch,
    TaskStatus, TaskSubmission, TaskView,
  },
  user::{NewUser, Registration, Role, User, UserId},
};

use super::{IdentityResolver, ReportManager, TaskManager};

/// A store whose every method panics.
struct UnreachableStore;

impl TaskStore for UnreachableStore {
  type Error = std::convert::Infallible;
  async fn find_user_by_subject(&self, _: &str) -> Result<Option<User>, Self::Error> { unimplemented!() }
  async fn register_user(&self, _: NewUser) -> Result<Registration, Self::Error> { unimplemented!() }
  async fn list_users_by_role(&self, _: Role) -> Result<Vec<User>, Self::Error> { unimplemented!() }
  async fn create_task(&self, _: UserId, _: NewTask) -> Result<WriteOutcome<Task>, Self::Error> { unimplemented!() }
  async fn get_task(&self, _: TaskId) -> Result<Option<Task>, Self::Error> { unimplemented!() }
  async fn list_tasks(&self, _: Scope) -> Result<Vec<TaskView>, Self::Error> { unimplemented!() }
  async fn update_task(&self, _: TaskId, _: TaskPatch, _: Option<UserId>) -> Result<WriteOutcome<Task>, Self::Error> { unimplemented!() }
  async fn delete_task(&self, _: TaskId) -> Result<bool, Self::Error> { unimplemented!() }
  async fn submit_task(&self, _: NewSubmission) -> Result<WriteOutcome<TaskSubmission>, Self::Error> { unimplemented!() }
  async fn list_submissions(&self, _: TaskId) -> Result<Vec<SubmissionView>, Self::Error> { unimplemented!() }
  async fn create_report(&self, _: UserId, _: NewReport) -> Result<WriteOutcome<ProgressReport>, Self::Error> { unimplemented!() }
  async fn list_reports(&self, _: Scope) -> Result<Vec<ReportView>, Self::Error> { unimplemented!() }
  async fn ping(&self) -> Result<(), Self::Error> { unimplemented!() }
}

fn user(id: UserId, role: Role) -> User {
  User {
    id,
    external_subject_id: format!("sub-{id}"),
    email: format!("u{id}@example.com"),
    name: format!("User {id}"),
    role,
    created_at: Utc::now(),
  }
}

fn report_for(internee_id: UserId) -> NewReport {
  NewReport {
    internee_id,
    period_start: "2026-01-01".into(),
    period_end: "2026-01-31".into(),
    tasks_completed: 4,
    tasks_pending: 1,
    overall_performance: "good".into(),
    comments: None,
  }
}

#[tokio::test]
async fn empty_patch_is_a_no_op() {
  let store = UnreachableStore;
  for actor in [user(1, Role::Admin), user(2, Role::Internee)] {
    let updated = TaskManager::new(&store)
      .update(&actor, 42, TaskPatch::default())
      .await
      .unwrap();
    assert!(updated.is_none());
  }
}

#[tokio::test]
async fn internee_cannot_create_task() {
  let store = UnreachableStore;
  let err = TaskManager::new(&store)
    .create(&user(2, Role::Internee), NewTask {
      title:       "Sneaky".into(),
      description: None,
      assigned_to: 2,
      deadline:    None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn internee_cannot_delete_task() {
  let store = UnreachableStore;
  let err = TaskManager::new(&store)
    .delete(&user(2, Role::Internee), 1)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn blank_title_is_rejected_before_storage() {
  let store = UnreachableStore;
  let err = TaskManager::new(&store)
    .create(&user(1, Role::Admin), NewTask {
      title:       "   ".into(),
      description: None,
      assigned_to: 2,
      deadline:    None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));

  let patch = TaskPatch {
    title: Some(String::new()),
    status: Some(TaskStatus::Completed),
    ..TaskPatch::default()
  };
  let err = TaskManager::new(&store)
    .update(&user(1, Role::Admin), 1, patch)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn internee_cannot_create_report() {
  let store = UnreachableStore;
  let err = ReportManager::new(&store)
    .create(&user(2, Role::Internee), report_for(2))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn internee_cannot_list_internees() {
  let store = UnreachableStore;
  let err = IdentityResolver::new(&store)
    .list_internees(&user(2, Role::Internee))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));
}
