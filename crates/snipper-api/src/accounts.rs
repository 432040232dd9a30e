//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | `POST` | `/auth/register` | `{username, email, password, fullName?}` | 201 + token pair |
//! | `POST` | `/auth/login` | `{username, password}` | token pair |
//! | `POST` | `/auth/refresh` | `{refreshToken}` | token pair |
//! | `POST` | `/auth/logout` | none | `{message}` |
//! | `GET`  | `/auth/health` | none | `{status, timestamp}` |
//!
//! `username` on login may also be the account's email address.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snipper_core::{Identity, user::{Registration, UserId}};
use tracing::{debug, info};

use crate::{
  AppState, Backend,
  error::ApiError,
  extract::JsonBody,
  token::TokenKind,
};

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
  pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthUserInfo {
  pub id:       UserId,
  pub username: String,
  pub email:    String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
  pub token:         String,
  pub refresh_token: String,
  pub token_type:    &'static str,
  pub expires_at:    DateTime<Utc>,
  pub user:          AuthUserInfo,
}

#[derive(Debug, Serialize)]
pub struct Message {
  pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Health {
  pub status:    &'static str,
  pub timestamp: DateTime<Utc>,
}

impl<S: Backend> AppState<S> {
  /// Issue a fresh access/refresh pair for `who`.
  async fn token_pair(&self, who: &Identity) -> Result<AuthResponse, ApiError> {
    let user = self.accounts.profile(who).await?;
    let access = self.tokens.issue(who, TokenKind::Access);
    let refresh = self.tokens.issue(who, TokenKind::Refresh);
    Ok(AuthResponse {
      token:         access.token,
      refresh_token: refresh.token,
      token_type:    "Bearer",
      expires_at:    access.expires_at,
      user:          AuthUserInfo { id: user.id, username: user.username, email: user.email },
    })
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `POST /auth/register`
pub async fn register<S: Backend>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<Registration>,
) -> Result<impl IntoResponse, ApiError> {
  let user = state.accounts.register(body).await?;
  let pair = state.token_pair(&user.identity()).await?;
  Ok((StatusCode::CREATED, Json(pair)))
}

/// `POST /auth/login`
pub async fn login<S: Backend>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<LoginBody>,
) -> Result<Json<AuthResponse>, ApiError> {
  let who = state.accounts.authenticate(&body.username, &body.password).await?;
  info!(user = who.id, "logged in");
  Ok(Json(state.token_pair(&who).await?))
}

/// `POST /auth/refresh`
pub async fn refresh<S: Backend>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<RefreshBody>,
) -> Result<Json<AuthResponse>, ApiError> {
  let claims = state
    .tokens
    .verify(&body.refresh_token, TokenKind::Refresh)
    .map_err(|e| {
      debug!(error = %e, "refresh token rejected");
      ApiError::Unauthorized("Invalid or expired refresh token".into())
    })?;
  let who = state.accounts.resolve(claims.uid).await?;
  Ok(Json(state.token_pair(&who).await?))
}

/// `POST /auth/logout`. Tokens are stateless; the client discards them.
pub async fn logout() -> Json<Message> {
  Json(Message { message: "Logged out successfully" })
}

/// `GET /auth/health`
pub async fn health() -> Json<Health> {
  Json(Health { status: "UP", timestamp: Utc::now() })
}
