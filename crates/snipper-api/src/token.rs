//! Bearer tokens: compact HS256 JWS strings signed with a server secret.
//!
//! `base64url(header) . base64url(claims) . base64url(hmac-sha256)`
//!
//! Only the one fixed header is ever accepted, so a token cannot talk the
//! verifier into a different algorithm.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use snipper_core::{Identity, user::UserId};
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Secrets shorter than this are refused.
pub const MIN_SECRET_LEN: usize = 32;

const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
  #[error("token secret must be at least {MIN_SECRET_LEN} bytes")]
  WeakSecret,

  #[error("malformed token")]
  Malformed,

  #[error("invalid token signature")]
  BadSignature,

  #[error("token has expired")]
  Expired,

  #[error("expected a {expected} token")]
  WrongKind { expected: TokenKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
  Access,
  Refresh,
}

impl std::fmt::Display for TokenKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::Access => "access",
      Self::Refresh => "refresh",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  /// Username at issue time. Informational; `uid` is authoritative.
  pub sub:  String,
  pub uid:  UserId,
  pub kind: TokenKind,
  pub iat:  i64,
  pub exp:  i64,
  pub jti:  Uuid,
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct Issued {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
}

/// Signs and verifies tokens with a single symmetric key.
pub struct TokenIssuer {
  key:         HmacSha256,
  access_ttl:  Duration,
  refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenIssuer")
      .field("access_ttl", &self.access_ttl)
      .field("refresh_ttl", &self.refresh_ttl)
      .finish_non_exhaustive()
  }
}

impl TokenIssuer {
  pub fn new(
    secret: impl AsRef<[u8]>,
    access_ttl: Duration,
    refresh_ttl: Duration,
  ) -> Result<Self, TokenError> {
    let secret = secret.as_ref();
    if secret.len() < MIN_SECRET_LEN {
      return Err(TokenError::WeakSecret);
    }
    let key = <HmacSha256 as Mac>::new_from_slice(secret).map_err(|_| TokenError::WeakSecret)?;
    Ok(Self { key, access_ttl, refresh_ttl })
  }

  pub fn issue(&self, who: &Identity, kind: TokenKind) -> Issued {
    self.issue_at(who, kind, Utc::now())
  }

  pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
    self.verify_at(token, expected, Utc::now())
  }

  fn issue_at(&self, who: &Identity, kind: TokenKind, now: DateTime<Utc>) -> Issued {
    let ttl = match kind {
      TokenKind::Access => self.access_ttl,
      TokenKind::Refresh => self.refresh_ttl,
    };
    let expires_at = now + ttl;
    let claims = Claims {
      sub: who.username.clone(),
      uid: who.id,
      kind,
      iat: now.timestamp(),
      exp: expires_at.timestamp(),
      jti: Uuid::new_v4(),
    };

    // Serializing a struct of strings and integers cannot fail.
    let payload = serde_json::to_vec(&claims).unwrap_or_default();
    let signing_input = format!("{}.{}", B64.encode(HEADER_JSON), B64.encode(payload));
    let signature = B64.encode(self.mac(&signing_input).finalize().into_bytes());

    Issued {
      token: format!("{signing_input}.{signature}"),
      expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
    }
  }

  fn verify_at(
    &self,
    token: &str,
    expected: TokenKind,
    now: DateTime<Utc>,
  ) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
      (parts.next(), parts.next(), parts.next(), parts.next())
    else {
      return Err(TokenError::Malformed);
    };

    if B64.decode(header).map_err(|_| TokenError::Malformed)? != HEADER_JSON.as_bytes() {
      return Err(TokenError::Malformed);
    }

    let signature = B64.decode(signature).map_err(|_| TokenError::Malformed)?;
    let signing_input = &token[..header.len() + 1 + payload.len()];
    self
      .mac(signing_input)
      .verify_slice(&signature)
      .map_err(|_| TokenError::BadSignature)?;

    let payload = B64.decode(payload).map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

    if claims.exp <= now.timestamp() {
      return Err(TokenError::Expired);
    }
    if claims.kind != expected {
      return Err(TokenError::WrongKind { expected });
    }
    Ok(claims)
  }

  fn mac(&self, input: &str) -> HmacSha256 {
    let mut mac = self.key.clone();
    mac.update(input.as_bytes());
    mac
  }
}
