use tracing::info;

use crate::{
  Error, Result,
  policy::{self, Action},
  store::{TaskStore, WriteOutcome},
  task::{
    NewSubmission, NewTask, SubmissionView, Task, TaskId, TaskPatch,
    TaskSubmission, TaskView,
  },
  user::{User, UserId},
};

use super::{require_text, unreachable_outcome};

fn task_not_found(id: TaskId) -> Error { Error::NotFound(format!("task {id}")) }

fn user_not_found(id: UserId) -> Error { Error::NotFound(format!("user {id}")) }

/// Orchestrates the task lifecycle: create, list, update, delete, submit.
pub struct TaskManager<'a, S> {
  store: &'a S,
}

impl<'a, S: TaskStore> TaskManager<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  async fn load(&self, id: TaskId) -> Result<Task> {
    self
      .store
      .get_task(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| task_not_found(id))
  }

  /// Create a task in `pending` status, owned by `actor`.
  pub async fn create(&self, actor: &User, input: NewTask) -> Result<Task> {
    policy::require(actor, Action::CreateTask, policy::can_create_task(actor.role))?;
    require_text("title", &input.title)?;

    match self
      .store
      .create_task(actor.id, input)
      .await
      .map_err(Error::store)?
    {
      WriteOutcome::Applied(task) => {
        info!(
          task_id = task.id,
          created_by = task.created_by,
          assigned_to = task.assigned_to,
          "created task"
        );
        Ok(task)
      }
      WriteOutcome::UserMissing(id) => Err(user_not_found(id)),
      WriteOutcome::TaskMissing | WriteOutcome::NotAssignee => {
        unreachable_outcome("create_task")
      }
    }
  }

  /// Every task for admins; only the caller's own tasks for internees.
  pub async fn list(&self, actor: &User) -> Result<Vec<TaskView>> {
    self
      .store
      .list_tasks(policy::task_scope(actor))
      .await
      .map_err(Error::store)
  }

  /// Apply a partial update, all-or-nothing.
  ///
  /// Returns `Ok(None)` for an empty patch, which touches no storage at all.
  pub async fn update(
    &self,
    actor: &User,
    id: TaskId,
    patch: TaskPatch,
  ) -> Result<Option<Task>> {
    let requested = patch.fields();
    if requested.is_empty() {
      return Ok(None);
    }
    if let Some(title) = &patch.title {
      require_text("title", title)?;
    }

    let task = self.load(id).await?;
    let allowed =
      policy::allowed_update_fields(actor.role, actor.id, task.assigned_to);
    policy::require(actor, Action::UpdateTask, requested.is_subset(&allowed))?;

    match self
      .store
      .update_task(id, patch, policy::assignee_guard(actor))
      .await
      .map_err(Error::store)?
    {
      WriteOutcome::Applied(task) => Ok(Some(task)),
      WriteOutcome::TaskMissing => Err(task_not_found(id)),
      // Reassigned between the read above and the write.
      WriteOutcome::NotAssignee => Err(policy::deny(actor, Action::UpdateTask)),
      WriteOutcome::UserMissing(user) => Err(user_not_found(user)),
    }
  }

  pub async fn delete(&self, actor: &User, id: TaskId) -> Result<()> {
    policy::require(actor, Action::DeleteTask, policy::can_delete_task(actor.role))?;

    if !self.store.delete_task(id).await.map_err(Error::store)? {
      return Err(task_not_found(id));
    }
    info!(task_id = id, deleted_by = actor.id, "deleted task");
    Ok(())
  }

  /// Record completed work and mark the task `completed`, atomically.
  pub async fn submit(
    &self,
    actor: &User,
    id: TaskId,
    description: String,
    attachment_url: Option<String>,
  ) -> Result<TaskSubmission> {
    require_text("description", &description)?;

    let task = self.load(id).await?;
    policy::require(
      actor,
      Action::SubmitTask,
      policy::can_submit(actor.role, actor.id, task.assigned_to),
    )?;

    let input = NewSubmission {
      task_id: id,
      submitted_by: actor.id,
      description,
      attachment_url,
    };
    match self.store.submit_task(input).await.map_err(Error::store)? {
      WriteOutcome::Applied(submission) => {
        info!(
          task_id = id,
          submission_id = submission.id,
          submitted_by = actor.id,
          "task submitted"
        );
        Ok(submission)
      }
      WriteOutcome::TaskMissing => Err(task_not_found(id)),
      WriteOutcome::NotAssignee => Err(policy::deny(actor, Action::SubmitTask)),
      WriteOutcome::UserMissing(user) => Err(user_not_found(user)),
    }
  }

  /// Submissions for a task, newest first. Internees see only their own.
  pub async fn list_submissions(
    &self,
    actor: &User,
    id: TaskId,
  ) -> Result<Vec<SubmissionView>> {
    let task = self.load(id).await?;
    policy::require(
      actor,
      Action::ViewSubmissions,
      policy::can_view_task(actor.role, actor.id, task.assigned_to),
    )?;

    let mut submissions =
      self.store.list_submissions(id).await.map_err(Error::store)?;
    submissions.retain(|s| {
      policy::can_view_submissions(actor.role, actor.id, s.submission.submitted_by)
    });
    Ok(submissions)
  }
}
