//! The authenticated caller, passed explicitly into every core operation.
//!
//! There is no ambient "current user": anything that needs to know who is
//! asking takes an `&Identity` (or `Option<&Identity>` where anonymous access
//! is allowed) as a parameter.

use serde::{Deserialize, Serialize};

use crate::user::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub id:       UserId,
  pub username: String,
}

impl Identity {
  pub fn new(id: UserId, username: impl Into<String>) -> Self {
    Self { id, username: username.into() }
  }
}
