//! JSON HTTP API for the task tracker.
//!
//! Exposes an axum [`Router`] backed by any [`TaskStore`] and any
//! [`IdentityProvider`]. Every route except `GET /health` requires a bearer
//! token. CORS and request tracing are layered on by the server binary.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod token;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use tasktrack_core::{identity::IdentityProvider, store::TaskStore};

use handlers::{health, reports, tasks, users};

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, I> {
  pub store:    Arc<S>,
  pub identity: Arc<I>,
}

impl<S, I> Clone for AppState<S, I> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      identity: Arc::clone(&self.identity),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router.
pub fn router<S, I>(state: AppState<S, I>) -> Router
where
  S: TaskStore + 'static,
  I: IdentityProvider + 'static,
{
  Router::new()
    // Health
    .route("/health", get(health::liveness))
    .route("/health/storage", get(health::storage::<S, I>))
    // Users
    .route("/register", post(users::register::<S, I>))
    .route("/users/me", get(users::me))
    .route("/users/internees", get(users::internees::<S, I>))
    // Tasks
    .route("/tasks", get(tasks::list::<S, I>).post(tasks::create::<S, I>))
    .route(
      "/tasks/{id}",
      put(tasks::update::<S, I>)
        .patch(tasks::update::<S, I>)
        .delete(tasks::delete::<S, I>),
    )
    .route("/tasks/{id}/submit", post(tasks::submit::<S, I>))
    .route("/tasks/{id}/submissions", get(tasks::submissions::<S, I>))
    // Reports
    .route("/reports", get(reports::list::<S, I>).post(reports::create::<S, I>))
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
  };
  use chrono::{Duration, Utc};
  use jsonwebtoken::{Algorithm, EncodingKey};
  use serde_json::{Value, json};
  use tasktrack_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;
  use crate::token::{self, JwtVerifier};

  struct Harness {
    app:     Router,
    signing: EncodingKey,
  }

  impl Harness {
    async fn new() -> Self {
      let (private, public) = token::generate_keypair().unwrap();
      let verifier = JwtVerifier::from_pem(Algorithm::EdDSA, &public, 30).unwrap();
      let store = SqliteStore::open_in_memory().await.unwrap();
      let app = router(AppState {
        store:    Arc::new(store),
        identity: Arc::new(verifier),
      });
      Self {
        app,
        signing: token::encoding_key_from_pem(&private).unwrap(),
      }
    }

    fn token(&self, subject: &str) -> String {
      token::mint(&self.signing, subject, Utc::now(), Duration::hours(1)).unwrap()
    }

    async fn send(
      &self,
      method: &str,
      uri: &str,
      token: Option<&str>,
      body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
      let mut builder = Request::builder().method(method).uri(uri);
      if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
      }
      let body = match body {
        Some(json) => {
          builder = builder.header(header::CONTENT_TYPE, "application/json");
          Body::from(json.to_string())
        }
        None => Body::empty(),
      };

      let res = self
        .app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
      let status = res.status();
      let headers = res.headers().clone();
      let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
      let json = if bytes.is_empty() {
        Value::Null
      } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
      };
      (status, headers, json)
    }

    /// Register `subject` with `role`, returning its bearer token and id.
    async fn register(&self, subject: &str, role: &str) -> (String, i64) {
      let token = self.token(subject);
      let (status, _, body) = self
        .send(
          "POST",
          "/register",
          Some(&token),
          Some(json!({
            "email": format!("{subject}@example.com"),
            "name": subject,
            "role": role,
          })),
        )
        .await;
      assert_eq!(status, StatusCode::CREATED);
      let id = body["user_id"].as_i64().unwrap();
      (token, id)
    }

    async fn create_task(&self, admin: &str, assignee: i64, title: &str) -> i64 {
      let (status, _, body) = self
        .send(
          "POST",
          "/tasks",
          Some(admin),
          Some(json!({ "title": title, "assigned_to": assignee })),
        )
        .await;
      assert_eq!(status, StatusCode::CREATED);
      body["id"].as_i64().unwrap()
    }
  }

  // ── Health & authentication ───────────────────────────────────────────────

  #[tokio::test]
  async fn liveness_needs_no_token() {
    let h = Harness::new().await;
    let (status, _, body) = h.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
  }

  #[tokio::test]
  async fn storage_check_requires_token() {
    let h = Harness::new().await;
    let (status, headers, _) = h.send("GET", "/health/storage", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers[header::WWW_AUTHENTICATE], "Bearer");

    let token = h.token("anyone");
    let (status, _, body) =
      h.send("GET", "/health/storage", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
  }

  #[tokio::test]
  async fn forged_token_is_unauthenticated() {
    let h = Harness::new().await;
    let (stranger, _) = token::generate_keypair().unwrap();
    let stranger = token::encoding_key_from_pem(&stranger).unwrap();
    let forged =
      token::mint(&stranger, "admin", Utc::now(), Duration::hours(1)).unwrap();

    for token in [forged.as_str(), "garbage"] {
      let (status, _, body) = h.send("GET", "/tasks", Some(token), None).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED);
      assert_eq!(body["error"], "authentication required");
    }
  }

  #[tokio::test]
  async fn expired_token_is_unauthenticated() {
    let h = Harness::new().await;
    let stale = token::mint(
      &h.signing,
      "late",
      Utc::now() - Duration::hours(2),
      Duration::hours(1),
    )
    .unwrap();
    let (status, _, _) = h.send("GET", "/users/me", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  // ── Registration ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_then_reregister() {
    let h = Harness::new().await;
    let (token, id) = h.register("uid-1", "internee").await;

    let (status, _, body) = h
      .send(
        "POST",
        "/register",
        Some(&token),
        Some(json!({ "email": "x@example.com", "name": "X", "role": "admin" })),
      )
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "existing");
    assert_eq!(body["user_id"], id);
    assert_eq!(body["user"]["role"], "internee");

    let (status, _, body) = h.send("GET", "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], "uid-1");
    assert_eq!(body["user"]["id"], id);
  }

  #[tokio::test]
  async fn unknown_role_is_rejected() {
    let h = Harness::new().await;
    let token = h.token("uid-2");
    let (status, _, _) = h
      .send(
        "POST",
        "/register",
        Some(&token),
        Some(json!({ "email": "a@example.com", "name": "A", "role": "mentor" })),
      )
      .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _, _) = h.send("GET", "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn only_admins_list_internees() {
    let h = Harness::new().await;
    let (admin, _) = h.register("boss", "admin").await;
    let (intern, intern_id) = h.register("alice", "internee").await;

    let (status, _, body) =
      h.send("GET", "/users/internees", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], intern_id);

    let (status, _, _) =
      h.send("GET", "/users/internees", Some(&intern), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  // ── Tasks ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn task_lifecycle() {
    let h = Harness::new().await;
    let (admin, _) = h.register("boss", "admin").await;
    let (intern, intern_id) = h.register("alice", "internee").await;
    let task_id = h.create_task(&admin, intern_id, "Write tests").await;
    let uri = format!("/tasks/{task_id}");

    // Internee sees the task with joined names.
    let (_, _, body) = h.send("GET", "/tasks", Some(&intern), None).await;
    assert_eq!(body[0]["id"], task_id);
    assert_eq!(body[0]["status"], "pending");
    assert_eq!(body[0]["assigned_to_name"], "alice");
    assert_eq!(body[0]["created_by_name"], "boss");

    // Title belongs to admins.
    let (status, _, _) = h
      .send("PATCH", &uri, Some(&intern), Some(json!({ "title": "Mine now" })))
      .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Empty body is a no-op.
    let (status, _, body) = h.send("PUT", &uri, Some(&intern), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "updated": false }));

    let (status, _, body) = h
      .send("PATCH", &uri, Some(&intern), Some(json!({ "status": "in_progress" })))
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], true);
    assert_eq!(body["task"]["status"], "in_progress");
    assert_eq!(body["task"]["title"], "Write tests");

    let (status, _, _) = h
      .send("PATCH", &uri, Some(&intern), Some(json!({ "status": "archived" })))
      .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Submit completes the task.
    let (status, _, body) = h
      .send(
        "POST",
        &format!("{uri}/submit"),
        Some(&intern),
        Some(json!({ "description": "all green" })),
      )
      .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["task_id"], task_id);
    assert_eq!(body["submitted_by"], intern_id);

    let (_, _, body) = h
      .send("GET", &format!("{uri}/submissions"), Some(&admin), None)
      .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["submitted_by_name"], "alice");

    let (_, _, body) = h.send("GET", "/tasks", Some(&admin), None).await;
    assert_eq!(body[0]["status"], "completed");

    // Deletion is admin-only.
    let (status, _, _) = h.send("DELETE", &uri, Some(&intern), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _, _) = h.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) = h.send("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn unregistered_caller_is_not_found() {
    let h = Harness::new().await;
    let token = h.token("ghost");
    let (status, _, body) = h.send("GET", "/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found: user not registered");
  }

  #[tokio::test]
  async fn internees_only_see_their_tasks() {
    let h = Harness::new().await;
    let (admin, _) = h.register("boss", "admin").await;
    let (a, a_id) = h.register("alice", "internee").await;
    let (b, b_id) = h.register("bob", "internee").await;
    for i in 0..3 {
      h.create_task(&admin, a_id, &format!("a{i}")).await;
    }
    let b_task = h.create_task(&admin, b_id, "b0").await;
    h.create_task(&admin, b_id, "b1").await;

    let count = |v: &Value| v.as_array().unwrap().len();
    assert_eq!(count(&h.send("GET", "/tasks", Some(&a), None).await.2), 3);
    assert_eq!(count(&h.send("GET", "/tasks", Some(&b), None).await.2), 2);
    assert_eq!(count(&h.send("GET", "/tasks", Some(&admin), None).await.2), 5);

    let (status, _, _) = h
      .send(
        "POST",
        &format!("/tasks/{b_task}/submit"),
        Some(&a),
        Some(json!({ "description": "not mine" })),
      )
      .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn malformed_requests_get_json_errors() {
    let h = Harness::new().await;
    let (admin, _) = h.register("boss", "admin").await;

    // Missing `title`.
    let (status, headers, body) = h
      .send("POST", "/tasks", Some(&admin), Some(json!({ "assigned_to": 1 })))
      .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert!(body["error"].as_str().is_some_and(|m| m.contains("title")));

    let (status, headers, body) =
      h.send("DELETE", "/tasks/abc", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert!(body["error"].is_string());

    // No JSON content type at all.
    let res = h
      .app
      .clone()
      .oneshot(
        Request::builder()
          .method("POST")
          .uri("/tasks")
          .header(header::AUTHORIZATION, format!("Bearer {admin}"))
          .body(Body::from("title=x"))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn reports_flow() {
    let h = Harness::new().await;
    let (admin, _) = h.register("boss", "admin").await;
    let (a, a_id) = h.register("alice", "internee").await;
    let (b, _) = h.register("bob", "internee").await;

    let report = json!({
      "internee_id": a_id,
      "period_start": "2026-09-01",
      "period_end": "2026-09-30",
      "tasks_completed": 4,
      "tasks_pending": 1,
      "overall_performance": "strong",
    });

    let (status, _, _) = h.send("POST", "/reports", Some(&a), Some(report.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) =
      h.send("POST", "/reports", Some(&admin), Some(report)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tasks_completed"], 4);
    assert!(body["comments"].is_null());

    let (_, _, body) = h.send("GET", "/reports", Some(&a), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["internee_name"], "alice");

    let (_, _, body) = h.send("GET", "/reports", Some(&b), None).await;
    assert!(body.as_array().unwrap().is_empty());
  }
}
