//! Argon2id password hashing behind the core [`PasswordHasher`] seam.

use argon2::{
  Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version,
  password_hash::{self, SaltString},
};
use rand_core::OsRng;
use snipper_core::{Result, account::PasswordHasher};

/// Produces and checks PHC strings (`$argon2id$v=19$...`).
#[derive(Clone, Default)]
pub struct Argon2Hasher {
  argon: Argon2<'static>,
}

impl Argon2Hasher {
  /// Use explicit cost parameters instead of the argon2 defaults.
  pub fn with_params(params: Params) -> Self {
    Self { argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) }
  }
}

impl PasswordHasher for Argon2Hasher {
  fn hash(&self, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    password_hash::PasswordHasher::hash_password(&self.argon, password.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| snipper_core::Error::Hashing(e.to_string()))
  }

  fn verify(&self, password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
      self
        .argon
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
  }
}
