//! User accounts.
//!
//! Users are created at registration and may be deactivated, never deleted.
//! Only the argon2 PHC string of a password ever reaches this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::identity::Identity;

pub type UserId = i64;

/// A registered user as seen by the owner (and, minus nothing sensitive,
/// by anyone viewing the public profile).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         UserId,
  pub username:   String,
  pub email:      String,
  pub full_name:  Option<String>,
  pub bio:        Option<String>,
  pub active:     bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  pub fn identity(&self) -> Identity { Identity::new(self.id, &self.username) }
}

/// Input to [`UserStore::insert_user`](crate::store::UserStore::insert_user).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub full_name:     Option<String>,
}

/// What the store hands back for a login attempt. Only active users have
/// credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub id:            UserId,
  pub username:      String,
  pub password_hash: String,
}

/// A registration request, validated before anything is hashed or stored.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  #[validate(length(
    min = 3,
    max = 50,
    message = "must be between 3 and 50 characters"
  ))]
  pub username:  String,
  #[validate(
    email(message = "must be a valid email address"),
    length(max = 100, message = "must not exceed 100 characters")
  )]
  pub email:     String,
  #[validate(length(
    min = 6,
    max = 100,
    message = "must be between 6 and 100 characters"
  ))]
  pub password:  String,
  #[serde(default)]
  #[validate(length(max = 100, message = "must not exceed 100 characters"))]
  pub full_name: Option<String>,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
  #[validate(length(
    min = 3,
    max = 50,
    message = "must be between 3 and 50 characters"
  ))]
  pub username:  Option<String>,
  #[validate(
    email(message = "must be a valid email address"),
    length(max = 100, message = "must not exceed 100 characters")
  )]
  pub email:     Option<String>,
  #[validate(length(max = 100, message = "must not exceed 100 characters"))]
  pub full_name: Option<String>,
  #[validate(length(max = 500, message = "must not exceed 500 characters"))]
  pub bio:       Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn registration_rules() {
    let ok = Registration {
      username:  "alice".into(),
      email:     "alice@example.com".into(),
      password:  "hunter22".into(),
      full_name: None,
    };
    assert!(ok.validate().is_ok());

    let bad = Registration {
      username:  "al".into(),
      email:     "not-an-email".into(),
      password:  "123".into(),
      full_name: Some("x".repeat(101)),
    };
    let err = crate::Error::from(bad.validate().unwrap_err());
    let crate::Error::Validation(fields) = err else {
      panic!("expected validation error");
    };
    assert_eq!(fields.len(), 4);
    assert_eq!(fields["email"], "must be a valid email address");
  }

  #[test]
  fn empty_profile_update_is_valid() {
    assert!(ProfileUpdate::default().validate().is_ok());
  }
}
