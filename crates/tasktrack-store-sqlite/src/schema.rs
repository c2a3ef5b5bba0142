//! SQL schema for the task tracker SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    external_subject_id TEXT NOT NULL UNIQUE,   -- identity-provider subject
    email               TEXT NOT NULL,
    name                TEXT NOT NULL,
    role                TEXT NOT NULL CHECK (role IN ('admin', 'internee')),
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    description TEXT,
    status      TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'in_progress', 'completed')),
    created_by  INTEGER NOT NULL REFERENCES users(id),
    assigned_to INTEGER NOT NULL REFERENCES users(id),
    deadline    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Submissions are append-only; they only disappear with their task.
CREATE TABLE IF NOT EXISTS task_submissions (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id        INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    submitted_by   INTEGER NOT NULL REFERENCES users(id),
    description    TEXT NOT NULL,
    attachment_url TEXT,
    submitted_at   TEXT NOT NULL
);

-- Reports are immutable once written.
CREATE TABLE IF NOT EXISTS progress_reports (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    internee_id         INTEGER NOT NULL REFERENCES users(id),
    generated_by        INTEGER NOT NULL REFERENCES users(id),
    period_start        TEXT NOT NULL,
    period_end          TEXT NOT NULL,
    tasks_completed     INTEGER NOT NULL CHECK (tasks_completed >= 0),
    tasks_pending       INTEGER NOT NULL CHECK (tasks_pending >= 0),
    overall_performance TEXT NOT NULL,
    comments            TEXT,
    created_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS tasks_assigned_idx       ON tasks(assigned_to);
CREATE INDEX IF NOT EXISTS tasks_created_idx        ON tasks(created_at);
CREATE INDEX IF NOT EXISTS submissions_task_idx     ON task_submissions(task_id);
CREATE INDEX IF NOT EXISTS reports_internee_idx     ON progress_reports(internee_id);

PRAGMA user_version = 1;
";
