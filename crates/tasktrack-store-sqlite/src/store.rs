//! [`SqliteStore`]: the SQLite implementation of [`TaskStore`].

use std::{path::Path, time::Duration};

use chrono::Utc;
use rusqlite::{
  Connection, OptionalExtension as _, TransactionBehavior, params,
  params_from_iter, types::Value,
};
use tracing::debug;

use tasktrack_core::{
  report::{NewReport, ProgressReport, ReportView},
  store::{Scope, TaskStore, WriteOutcome},
  task::{
    NewSubmission, NewTask, SubmissionView, Task, TaskId, TaskPatch,
    TaskStatus, TaskSubmission, TaskView,
  },
  user::{NewUser, Registration, Role, User, UserId},
};

use crate::{
  Result,
  encode::{
    REPORT_COLUMNS, RawReport, RawReportView, RawSubmission, RawSubmissionView,
    RawTask, RawTaskView, RawUser, SUBMISSION_COLUMNS, TASK_COLUMNS,
    USER_COLUMNS, decode_outcome, encode_dt, encode_patch, encode_scope,
  },
  schema::SCHEMA,
};

/// Default time a statement waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn select_user_by_subject(
  conn: &Connection,
  subject: &str,
) -> rusqlite::Result<Option<RawUser>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE external_subject_id = ?1"),
      params![subject],
      RawUser::from_row,
    )
    .optional()
}

fn user_exists(conn: &Connection, id: UserId) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM users WHERE id = ?1", params![id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

fn task_assignee(conn: &Connection, id: TaskId) -> rusqlite::Result<Option<UserId>> {
  conn
    .query_row(
      "SELECT assigned_to FROM tasks WHERE id = ?1",
      params![id],
      |r| r.get(0),
    )
    .optional()
}

fn select_task(conn: &Connection, id: TaskId) -> rusqlite::Result<RawTask> {
  conn.query_row(
    &format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1"),
    params![id],
    RawTask::from_row,
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A task store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls are
/// serialised on the connection's thread; multi-statement writes additionally
/// run inside `BEGIN IMMEDIATE` transactions so they also hold against other
/// processes sharing the file.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT).await
  }

  /// Like [`open`](Self::open) with a custom busy timeout.
  pub async fn open_with_timeout(
    path: impl AsRef<Path>,
    busy_timeout: Duration,
  ) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init(busy_timeout).await?;
    debug!(path = %path.display(), ?busy_timeout, "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init(DEFAULT_BUSY_TIMEOUT).await?;
    Ok(store)
  }

  async fn init(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run arbitrary SQL. Tests use this to inject faults.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── TaskStore impl ──────────────────────────────────────────────────────────

impl TaskStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn find_user_by_subject(&self, subject: &str) -> Result<Option<User>> {
    let subject = subject.to_owned();

    let raw = self
      .conn
      .call(move |conn| Ok(select_user_by_subject(conn, &subject)?))
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn register_user(&self, input: NewUser) -> Result<Registration> {
    let at_str = encode_dt(Utc::now());
    let role_str = input.role.as_str();

    let (raw, created) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // A concurrent registration for the same subject leaves this a no-op.
        let inserted = tx.execute(
          "INSERT INTO users (external_subject_id, email, name, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (external_subject_id) DO NOTHING",
          params![
            input.external_subject_id,
            input.email,
            input.name,
            role_str,
            at_str,
          ],
        )?;

        let raw = select_user_by_subject(&tx, &input.external_subject_id)?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;

        tx.commit()?;
        Ok((raw, inserted == 1))
      })
      .await?;

    Ok(Registration { user: raw.into_user()?, created })
  }

  async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>> {
    let role_str = role.as_str();

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(params![role_str], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  // ── Tasks ─────────────────────────────────────────────────────────────────

  async fn create_task(
    &self,
    created_by: UserId,
    input: NewTask,
  ) -> Result<WriteOutcome<Task>> {
    let at_str = encode_dt(Utc::now());
    let deadline_str = input.deadline.map(encode_dt);
    let status_str = TaskStatus::Pending.as_str();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !user_exists(&tx, input.assigned_to)? {
          return Ok(WriteOutcome::UserMissing(input.assigned_to));
        }

        tx.execute(
          "INSERT INTO tasks (
             title, description, status, created_by, assigned_to,
             deadline, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          params![
            input.title,
            input.description,
            status_str,
            created_by,
            input.assigned_to,
            deadline_str,
            at_str,
          ],
        )?;
        let raw = select_task(&tx, tx.last_insert_rowid())?;

        tx.commit()?;
        Ok(WriteOutcome::Applied(raw))
      })
      .await?;

    decode_outcome(outcome, RawTask::into_task)
  }

  async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1"),
              params![id],
              RawTask::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTask::into_task).transpose()
  }

  async fn list_tasks(&self, scope: Scope) -> Result<Vec<TaskView>> {
    let owner = encode_scope(scope);

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TASK_COLUMNS}, creator.name, assignee.name
           FROM tasks t
           JOIN users creator  ON creator.id  = t.created_by
           JOIN users assignee ON assignee.id = t.assigned_to
           WHERE ?1 IS NULL OR t.assigned_to = ?1
           ORDER BY t.created_at DESC, t.id DESC"
        ))?;
        let rows = stmt
          .query_map(params![owner], RawTaskView::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTaskView::into_view).collect()
  }

  async fn update_task(
    &self,
    id: TaskId,
    patch: TaskPatch,
    assignee: Option<UserId>,
  ) -> Result<WriteOutcome<Task>> {
    let new_assignee = patch.assigned_to;
    let mut sets = encode_patch(patch);
    sets.push(("updated_at", Value::Text(encode_dt(Utc::now()))));

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(current) = task_assignee(&tx, id)? else {
          return Ok(WriteOutcome::TaskMissing);
        };
        if assignee.is_some_and(|expected| expected != current) {
          return Ok(WriteOutcome::NotAssignee);
        }
        if let Some(user) = new_assignee
          && !user_exists(&tx, user)?
        {
          return Ok(WriteOutcome::UserMissing(user));
        }

        let assignments = sets
          .iter()
          .map(|(column, _)| format!("{column} = ?"))
          .collect::<Vec<_>>()
          .join(", ");
        let values = sets
          .into_iter()
          .map(|(_, value)| value)
          .chain(std::iter::once(Value::Integer(id)));
        tx.execute(
          &format!("UPDATE tasks SET {assignments} WHERE id = ?"),
          params_from_iter(values),
        )?;
        let raw = select_task(&tx, id)?;

        tx.commit()?;
        Ok(WriteOutcome::Applied(raw))
      })
      .await?;

    decode_outcome(outcome, RawTask::into_task)
  }

  async fn delete_task(&self, id: TaskId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn submit_task(
    &self,
    input: NewSubmission,
  ) -> Result<WriteOutcome<TaskSubmission>> {
    let at_str = encode_dt(Utc::now());
    let completed = TaskStatus::Completed.as_str();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match task_assignee(&tx, input.task_id)? {
          None => return Ok(WriteOutcome::TaskMissing),
          Some(current) if current != input.submitted_by => {
            return Ok(WriteOutcome::NotAssignee);
          }
          Some(_) => {}
        }

        tx.execute(
          "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
          params![completed, at_str, input.task_id],
        )?;
        tx.execute(
          "INSERT INTO task_submissions (
             task_id, submitted_by, description, attachment_url, submitted_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            input.task_id,
            input.submitted_by,
            input.description,
            input.attachment_url,
            at_str,
          ],
        )?;
        let raw = tx.query_row(
          &format!(
            "SELECT {SUBMISSION_COLUMNS} FROM task_submissions s WHERE s.id = ?1"
          ),
          params![tx.last_insert_rowid()],
          RawSubmission::from_row,
        )?;

        tx.commit()?;
        Ok(WriteOutcome::Applied(raw))
      })
      .await?;

    decode_outcome(outcome, RawSubmission::into_submission)
  }

  async fn list_submissions(&self, task_id: TaskId) -> Result<Vec<SubmissionView>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBMISSION_COLUMNS}, u.name
           FROM task_submissions s
           JOIN users u ON u.id = s.submitted_by
           WHERE s.task_id = ?1
           ORDER BY s.submitted_at DESC, s.id DESC"
        ))?;
        let rows = stmt
          .query_map(params![task_id], RawSubmissionView::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubmissionView::into_view).collect()
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn create_report(
    &self,
    generated_by: UserId,
    input: NewReport,
  ) -> Result<WriteOutcome<ProgressReport>> {
    let at_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !user_exists(&tx, input.internee_id)? {
          return Ok(WriteOutcome::UserMissing(input.internee_id));
        }

        tx.execute(
          "INSERT INTO progress_reports (
             internee_id, generated_by, period_start, period_end,
             tasks_completed, tasks_pending, overall_performance, comments,
             created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          params![
            input.internee_id,
            generated_by,
            input.period_start,
            input.period_end,
            input.tasks_completed,
            input.tasks_pending,
            input.overall_performance,
            input.comments,
            at_str,
          ],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {REPORT_COLUMNS} FROM progress_reports r WHERE r.id = ?1"),
          params![tx.last_insert_rowid()],
          RawReport::from_row,
        )?;

        tx.commit()?;
        Ok(WriteOutcome::Applied(raw))
      })
      .await?;

    decode_outcome(outcome, RawReport::into_report)
  }

  async fn list_reports(&self, scope: Scope) -> Result<Vec<ReportView>> {
    let owner = encode_scope(scope);

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REPORT_COLUMNS}, internee.name, issuer.name
           FROM progress_reports r
           JOIN users internee ON internee.id = r.internee_id
           JOIN users issuer   ON issuer.id   = r.generated_by
           WHERE ?1 IS NULL OR r.internee_id = ?1
           ORDER BY r.created_at DESC, r.id DESC"
        ))?;
        let rows = stmt
          .query_map(params![owner], RawReportView::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReportView::into_view).collect()
  }

  // ── Health ────────────────────────────────────────────────────────────────

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
