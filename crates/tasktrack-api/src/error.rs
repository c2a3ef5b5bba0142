//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use tasktrack_core::Error;
use tracing::error;

/// An error on its way out of a handler.
#[derive(Debug)]
pub enum ApiError {
  /// A core operation failed.
  Core(Error),
  /// The request could not be decoded; `status` comes from axum.
  Rejected { status: StatusCode, message: String },
}

impl From<Error> for ApiError {
  fn from(e: Error) -> Self { Self::Core(e) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::Rejected {
      status:  rejection.status(),
      message: rejection.body_text(),
    }
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    Self::Rejected {
      status:  rejection.status(),
      message: rejection.body_text(),
    }
  }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Core(Error::Unauthenticated) => StatusCode::UNAUTHORIZED,
      ApiError::Core(Error::Forbidden(_)) => StatusCode::FORBIDDEN,
      ApiError::Core(Error::NotFound(_)) => StatusCode::NOT_FOUND,
      ApiError::Core(Error::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Core(Error::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Rejected { status, .. } => *status,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match self {
      ApiError::Core(Error::Store(e)) => {
        error!(error = %e, "storage failure");
        "internal server error".to_string()
      }
      ApiError::Core(other) => other.to_string(),
      ApiError::Rejected { message, .. } => message,
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}
