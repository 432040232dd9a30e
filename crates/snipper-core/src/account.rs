//! Registration, login and profile management.
//!
//! Password hashing is delegated to a [`PasswordHasher`] so this crate never
//! links a concrete algorithm. Token issuance belongs to the transport layer;
//! the service only ever hands back an [`Identity`] or a [`User`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate as _;

use crate::{
  Error, Result,
  identity::Identity,
  snippet::SnippetStats,
  store::{SnippetStore, UserStore},
  user::{NewUser, ProfileUpdate, Registration, User, UserId},
};

const BAD_CREDENTIALS: &str = "Invalid username or password";

/// One-way password hashing with a self-describing output format.
pub trait PasswordHasher: Send + Sync {
  fn hash(&self, password: &str) -> Result<String>;

  /// `false` for a wrong password and for an unparseable `hash` alike.
  fn verify(&self, password: &str, hash: &str) -> bool;
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
  #[serde(flatten)]
  pub snippets:      SnippetStats,
  pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
  pub profile:          User,
  pub statistics:       UserStatistics,
  pub recent_languages: Vec<String>,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct AccountService<S, H> {
  store:  Arc<S>,
  hasher: Arc<H>,
}

impl<S, H> Clone for AccountService<S, H> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), hasher: Arc::clone(&self.hasher) }
  }
}

impl<S: UserStore, H: PasswordHasher> AccountService<S, H> {
  pub fn new(store: Arc<S>, hasher: Arc<H>) -> Self { Self { store, hasher } }

  pub async fn register(&self, registration: Registration) -> Result<User> {
    registration.validate()?;
    self
      .ensure_available(Some(&registration.username), Some(&registration.email), None)
      .await?;

    let password_hash = self.hasher.hash(&registration.password)?;
    let user = self
      .store
      .insert_user(NewUser {
        username: registration.username,
        email: registration.email,
        password_hash,
        full_name: registration.full_name,
      })
      .await
      .map_err(Error::store)?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
  }

  /// Check a login (username or email) and password.
  ///
  /// Unknown logins, inactive users and wrong passwords are reported with
  /// the same message.
  pub async fn authenticate(&self, login: &str, password: &str) -> Result<Identity> {
    let credentials = self
      .store
      .find_credentials(login)
      .await
      .map_err(Error::store)?;

    match credentials {
      Some(c) if self.hasher.verify(password, &c.password_hash) => {
        info!(user_id = c.id, username = %c.username, "user logged in");
        Ok(Identity::new(c.id, c.username))
      }
      _ => {
        warn!(login, "failed login attempt");
        Err(Error::Unauthenticated(BAD_CREDENTIALS.into()))
      }
    }
  }

  /// Re-load the identity a verified token names. The user must still exist
  /// and be active.
  pub async fn resolve(&self, id: UserId) -> Result<Identity> {
    match self.store.get_user(id).await.map_err(Error::store)? {
      Some(user) if user.active => Ok(user.identity()),
      _ => Err(Error::Unauthenticated("user is no longer active".into())),
    }
  }

  pub async fn profile(&self, who: &Identity) -> Result<User> {
    self
      .store
      .get_user(who.id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("user not found with id: {}", who.id)))
  }

  pub async fn public_profile(&self, username: &str) -> Result<User> {
    self
      .store
      .get_active_user_by_username(username)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("user not found with username: {username}")))
  }

  pub async fn update_profile(&self, who: &Identity, update: ProfileUpdate) -> Result<User> {
    update.validate()?;
    self
      .ensure_available(update.username.as_deref(), update.email.as_deref(), Some(who.id))
      .await?;

    let user = self
      .store
      .update_profile(who.id, update)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("user not found with id: {}", who.id)))?;
    info!(user_id = user.id, "profile updated");
    Ok(user)
  }

  /// Conflict if `username` or `email` belongs to anyone other than `except`.
  async fn ensure_available(
    &self,
    username: Option<&str>,
    email: Option<&str>,
    except: Option<UserId>,
  ) -> Result<()> {
    if let Some(username) = username
      && self
        .store
        .username_taken(username, except)
        .await
        .map_err(Error::store)?
    {
      return Err(Error::Conflict("Username is already taken".into()));
    }
    if let Some(email) = email
      && self.store.email_taken(email, except).await.map_err(Error::store)?
    {
      return Err(Error::Conflict("Email is already registered".into()));
    }
    Ok(())
  }
}

impl<S: UserStore + SnippetStore, H: PasswordHasher> AccountService<S, H> {
  pub async fn dashboard(&self, who: &Identity) -> Result<Dashboard> {
    let profile = self.profile(who).await?;
    let snippets = self.store.author_stats(who.id).await.map_err(Error::store)?;
    let recent_languages = self
      .store
      .author_languages(who.id)
      .await
      .map_err(Error::store)?;

    Ok(Dashboard {
      statistics: UserStatistics { snippets, last_activity: profile.updated_at },
      profile,
      recent_languages,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    service::SnippetService,
    snippet::{SnippetDraft, Visibility},
    testing::MemoryStore,
  };

  /// Reversible "hash" so tests stay fast.
  struct PlainHasher;

  impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String> { Ok(format!("plain:{password}")) }

    fn verify(&self, password: &str, hash: &str) -> bool {
      hash.strip_prefix("plain:") == Some(password)
    }
  }

  fn service() -> (Arc<MemoryStore>, AccountService<MemoryStore, PlainHasher>) {
    let store = Arc::new(MemoryStore::default());
    (Arc::clone(&store), AccountService::new(store, Arc::new(PlainHasher)))
  }

  fn registration(username: &str, email: &str) -> Registration {
    Registration {
      username:  username.into(),
      email:     email.into(),
      password:  "secret-pw".into(),
      full_name: Some("Test User".into()),
    }
  }

  #[tokio::test]
  async fn register_then_login_by_username_or_email() {
    let (_, svc) = service();
    let user = svc
      .register(registration("alice", "alice@example.com"))
      .await
      .unwrap();
    assert!(user.active);

    let by_name = svc.authenticate("alice", "secret-pw").await.unwrap();
    let by_mail = svc.authenticate("alice@example.com", "secret-pw").await.unwrap();
    assert_eq!(by_name, by_mail);
    assert_eq!(by_name.id, user.id);
  }

  #[tokio::test]
  async fn duplicate_registration_conflicts() {
    let (_, svc) = service();
    svc.register(registration("alice", "alice@example.com")).await.unwrap();

    let err = svc
      .register(registration("alice", "other@example.com"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    let err = svc
      .register(registration("bob", "alice@example.com"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
  }

  #[tokio::test]
  async fn bad_credentials_share_one_message() {
    let (store, svc) = service();
    let user = svc.register(registration("alice", "alice@example.com")).await.unwrap();

    let wrong = svc.authenticate("alice", "nope").await.unwrap_err();
    let unknown = svc.authenticate("nobody", "secret-pw").await.unwrap_err();
    store.deactivate(user.id);
    let inactive = svc.authenticate("alice", "secret-pw").await.unwrap_err();

    for err in [wrong, unknown, inactive] {
      assert!(matches!(&err, Error::Unauthenticated(m) if m == BAD_CREDENTIALS));
    }
  }

  #[tokio::test]
  async fn resolve_requires_active_user() {
    let (store, svc) = service();
    let user = svc.register(registration("alice", "alice@example.com")).await.unwrap();
    assert_eq!(svc.resolve(user.id).await.unwrap().username, "alice");

    store.deactivate(user.id);
    assert!(matches!(svc.resolve(user.id).await, Err(Error::Unauthenticated(_))));
    assert!(matches!(
      svc.public_profile("alice").await,
      Err(Error::NotFound(_))
    ));
  }

  #[tokio::test]
  async fn profile_update_checks_uniqueness_excluding_self() {
    let (_, svc) = service();
    let alice = svc.register(registration("alice", "alice@example.com")).await.unwrap();
    svc.register(registration("bob", "bob@example.com")).await.unwrap();
    let who = alice.identity();

    let same = ProfileUpdate {
      username: Some("alice".into()),
      bio: Some("hello".into()),
      ..ProfileUpdate::default()
    };
    let updated = svc.update_profile(&who, same).await.unwrap();
    assert_eq!(updated.bio.as_deref(), Some("hello"));

    let taken = ProfileUpdate {
      email: Some("bob@example.com".into()),
      ..ProfileUpdate::default()
    };
    let err = svc.update_profile(&who, taken).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
  }

  #[tokio::test]
  async fn dashboard_aggregates_own_snippets() {
    let (store, svc) = service();
    let alice = svc.register(registration("alice", "alice@example.com")).await.unwrap();
    let who = alice.identity();
    let snippets = SnippetService::new(Arc::clone(&store));

    for (lang, vis) in [
      ("rust", Visibility::Public),
      ("go", Visibility::Private),
      ("rust", Visibility::Unlisted),
    ] {
      let s = snippets
        .create(&who, SnippetDraft::new("t", "c", lang).with_visibility(vis))
        .await
        .unwrap();
      store.set_views(s.id, 2);
    }

    let dash = svc.dashboard(&who).await.unwrap();
    assert_eq!(dash.statistics.snippets.total_snippets, 3);
    assert_eq!(dash.statistics.snippets.public_snippets, 1);
    assert_eq!(dash.statistics.snippets.private_snippets, 1);
    assert_eq!(dash.statistics.snippets.unlisted_snippets, 1);
    assert_eq!(dash.statistics.snippets.total_views, 6);
    assert_eq!(dash.recent_languages, ["go", "rust"]);

    let json = serde_json::to_value(&dash).unwrap();
    assert_eq!(json["statistics"]["totalSnippets"], 3);
    assert!(json["statistics"]["lastActivity"].is_string());
  }
}
