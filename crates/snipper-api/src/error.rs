//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as
//! `{timestamp, status, error, message, validationErrors?}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use snipper_core::FieldErrors;
use thiserror::Error;
use tracing::{error, warn};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  /// Rendered with `WWW-Authenticate: Bearer`.
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation failed")]
  Validation(FieldErrors),

  /// Anything the caller cannot fix. The detail is logged, never returned.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// A server-side failure outside the store, e.g. password hashing.
  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
      Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<snipper_core::Error> for ApiError {
  fn from(err: snipper_core::Error) -> Self {
    use snipper_core::Error as E;
    match err {
      E::NotFound(m) => Self::NotFound(m),
      E::Forbidden(m) => Self::Forbidden(m),
      E::Unauthenticated(m) => Self::Unauthorized(m),
      E::Conflict(m) => Self::Conflict(m),
      E::Validation(fields) => Self::Validation(fields),
      E::InvalidArgument(m) => Self::BadRequest(m),
      E::Store(e) => Self::Store(e),
      E::Hashing(m) => Self::Internal(format!("password hashing failed: {m}")),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::BadRequest(format!("Malformed JSON: {}", rejection.body_text()))
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
  timestamp:         String,
  status:            u16,
  error:             &'static str,
  message:           String,
  #[serde(skip_serializing_if = "Option::is_none")]
  validation_errors: Option<FieldErrors>,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let (message, validation_errors) = match self {
      Self::Store(e) => {
        error!(error = %e, "store request failed");
        ("An unexpected error occurred".to_owned(), None)
      }
      Self::Internal(detail) => {
        error!(error = %detail, "request failed");
        ("An unexpected error occurred".to_owned(), None)
      }
      Self::Validation(fields) => ("Validation failed".to_owned(), Some(fields)),
      Self::NotFound(m)
      | Self::Forbidden(m)
      | Self::Unauthorized(m)
      | Self::Conflict(m)
      | Self::BadRequest(m) => (m, None),
    };
    if status.is_client_error() {
      warn!(status = status.as_u16(), %message, "request rejected");
    }

    let body = ErrorBody {
      timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
      status: status.as_u16(),
      error: status.canonical_reason().unwrap_or("Error"),
      message,
      validation_errors,
    };
    let mut res = (status, Json(body)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hashing_failure_is_an_opaque_internal_error() {
    let err = ApiError::from(snipper_core::Error::Hashing("salt too short".into()));
    assert!(matches!(&err, ApiError::Internal(m) if m.contains("salt too short")));
    assert!(!err.to_string().contains("store"));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[tokio::test]
  async fn internal_detail_never_reaches_the_body() {
    let resp = ApiError::Internal("argon2 exploded".into()).into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "An unexpected error occurred");
    assert_eq!(body["error"], "Internal Server Error");
  }
}
