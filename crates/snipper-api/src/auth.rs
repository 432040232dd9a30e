//! Bearer-token extractors.
//!
//! - [`AuthUser`]: the route requires a caller. No header, a non-bearer
//!   header or an invalid token all reject with 401.
//! - [`Viewer`]: the route serves anonymous callers too. No header means
//!   anonymous; a header that is present but invalid still rejects with 401.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use snipper_core::Identity;
use tracing::debug;

use crate::{AppState, Backend, error::ApiError, token::TokenKind};

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// A caller who may or may not be authenticated.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Identity>);

impl Viewer {
  pub fn identity(&self) -> Option<&Identity> { self.0.as_ref() }
}

/// The raw bearer token, if an `Authorization` header is present at all.
fn bearer(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  value
    .to_str()
    .ok()
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(Some)
    .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token".into()))
}

impl<S: Backend> AppState<S> {
  /// Verify an access token and re-load the user it names.
  pub async fn identify(&self, token: &str) -> Result<Identity, ApiError> {
    let claims = self.tokens.verify(token, TokenKind::Access).map_err(|e| {
      debug!(error = %e, "access token rejected");
      ApiError::Unauthorized("Invalid or expired token".into())
    })?;
    Ok(self.accounts.resolve(claims.uid).await?)
  }
}

impl<S: Backend> FromRequestParts<AppState<S>> for AuthUser {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer(&parts.headers)?
      .ok_or_else(|| ApiError::Unauthorized("Authentication required".into()))?;
    Ok(AuthUser(state.identify(token).await?))
  }
}

impl<S: Backend> FromRequestParts<AppState<S>> for Viewer {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match bearer(&parts.headers)? {
      Some(token) => Ok(Viewer(Some(state.identify(token).await?))),
      None => Ok(Viewer(None)),
    }
  }
}
