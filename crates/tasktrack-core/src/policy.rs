//! Authorization policy.
//!
//! Pure decision functions: no storage access, no side effects. Managers call
//! these before reading or writing anything the decision does not depend on,
//! and turn a denial into [`Error::Forbidden`] via [`require`].

use std::fmt;

use tracing::warn;

use crate::{
  Error, Result,
  store::Scope,
  task::{FieldSet, TaskField},
  user::{Role, User, UserId},
};

/// An operation subject to a policy check. Used for denial messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  ListInternees,
  CreateTask,
  UpdateTask,
  DeleteTask,
  SubmitTask,
  ViewSubmissions,
  CreateReport,
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Action::ListInternees => "list internees",
      Action::CreateTask => "create tasks",
      Action::UpdateTask => "update this task",
      Action::DeleteTask => "delete tasks",
      Action::SubmitTask => "submit this task",
      Action::ViewSubmissions => "view submissions for this task",
      Action::CreateReport => "create reports",
    })
  }
}

// ─── Decisions ───────────────────────────────────────────────────────────────

pub fn can_list_internees(role: Role) -> bool { role.is_admin() }

pub fn can_create_task(role: Role) -> bool { role.is_admin() }

pub fn can_list_all_tasks(role: Role) -> bool { role.is_admin() }

/// Fields `caller_id` may write on a task currently assigned to `assigned_to`.
pub fn allowed_update_fields(
  role: Role,
  caller_id: UserId,
  assigned_to: UserId,
) -> FieldSet {
  match role {
    Role::Admin => TaskField::ALL.into_iter().collect(),
    Role::Internee if caller_id == assigned_to => {
      FieldSet::from([TaskField::Status])
    }
    Role::Internee => FieldSet::new(),
  }
}

pub fn can_delete_task(role: Role) -> bool { role.is_admin() }

pub fn can_submit(role: Role, caller_id: UserId, assigned_to: UserId) -> bool {
  role == Role::Internee && caller_id == assigned_to
}

/// Whether the caller may see the task at all (and hence ask for its
/// submissions).
pub fn can_view_task(role: Role, caller_id: UserId, assigned_to: UserId) -> bool {
  role.is_admin() || caller_id == assigned_to
}

pub fn can_view_submissions(
  role: Role,
  caller_id: UserId,
  submitted_by: UserId,
) -> bool {
  role.is_admin() || caller_id == submitted_by
}

pub fn can_create_report(role: Role) -> bool { role.is_admin() }

pub fn can_view_report(role: Role, caller_id: UserId, internee_id: UserId) -> bool {
  role.is_admin() || caller_id == internee_id
}

// ─── Derived helpers ─────────────────────────────────────────────────────────

/// Row scope for task listings.
pub fn task_scope(actor: &User) -> Scope {
  if can_list_all_tasks(actor.role) {
    Scope::All
  } else {
    Scope::OwnedBy(actor.id)
  }
}

/// Row scope for report listings. Internees only ever see their own.
pub fn report_scope(actor: &User) -> Scope {
  if actor.role.is_admin() {
    Scope::All
  } else {
    Scope::OwnedBy(actor.id)
  }
}

/// The assignee a task write must be conditioned on, if any. Admin writes are
/// unconditional; everyone else may only write while they are the assignee.
pub fn assignee_guard(actor: &User) -> Option<UserId> {
  (!actor.role.is_admin()).then_some(actor.id)
}

/// Build the `Forbidden` error for a denied action, logging the denial.
pub fn deny(actor: &User, action: Action) -> Error {
  warn!(
    user_id = actor.id,
    role = %actor.role,
    %action,
    "authorization denied"
  );
  Error::Forbidden(format!("{} is not permitted to {action}", actor.role))
}

/// Turn a policy decision into a `Result`.
pub fn require(actor: &User, action: Action, allowed: bool) -> Result<()> {
  if allowed { Ok(()) } else { Err(deny(actor, action)) }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

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

  #[test]
  fn only_admins_create_delete_and_report() {
    assert!(can_create_task(Role::Admin));
    assert!(!can_create_task(Role::Internee));
    assert!(can_delete_task(Role::Admin));
    assert!(!can_delete_task(Role::Internee));
    assert!(can_create_report(Role::Admin));
    assert!(!can_create_report(Role::Internee));
    assert!(can_list_internees(Role::Admin));
    assert!(!can_list_internees(Role::Internee));
  }

  #[test]
  fn admin_may_update_every_field() {
    let fields = allowed_update_fields(Role::Admin, 1, 2);
    assert_eq!(fields.len(), TaskField::ALL.len());
  }

  #[test]
  fn assignee_may_update_status_only() {
    let fields = allowed_update_fields(Role::Internee, 2, 2);
    assert_eq!(fields, FieldSet::from([TaskField::Status]));
  }

  #[test]
  fn other_internee_may_update_nothing() {
    assert!(allowed_update_fields(Role::Internee, 3, 2).is_empty());
  }

  #[test]
  fn submit_requires_internee_assignee() {
    assert!(can_submit(Role::Internee, 2, 2));
    assert!(!can_submit(Role::Internee, 3, 2));
    // Admins never submit, even for a task assigned to themselves.
    assert!(!can_submit(Role::Admin, 1, 1));
  }

  #[test]
  fn submission_visibility() {
    assert!(can_view_submissions(Role::Admin, 1, 2));
    assert!(can_view_submissions(Role::Internee, 2, 2));
    assert!(!can_view_submissions(Role::Internee, 3, 2));
  }

  #[test]
  fn report_visibility() {
    assert!(can_view_report(Role::Admin, 1, 5));
    assert!(can_view_report(Role::Internee, 5, 5));
    assert!(!can_view_report(Role::Internee, 4, 5));
  }

  #[test]
  fn scopes_follow_role() {
    assert_eq!(task_scope(&user(1, Role::Admin)), Scope::All);
    assert_eq!(task_scope(&user(2, Role::Internee)), Scope::OwnedBy(2));
    assert_eq!(report_scope(&user(2, Role::Internee)), Scope::OwnedBy(2));
    assert_eq!(assignee_guard(&user(1, Role::Admin)), None);
    assert_eq!(assignee_guard(&user(2, Role::Internee)), Some(2));
  }

  #[test]
  fn require_maps_denial_to_forbidden() {
    let internee = user(2, Role::Internee);
    assert!(require(&internee, Action::CreateTask, true).is_ok());
    let err = require(&internee, Action::CreateTask, false).unwrap_err();
    assert!(matches!(err, Error::Forbidden(ref m) if m.contains("create tasks")));
  }
}
