//! Store traits and the parameterized snippet query.
//!
//! The traits are implemented by storage backends (e.g.
//! `snipper-store-sqlite`). The services in this crate and the API layer
//! depend on these abstractions, not on any concrete backend.

use std::future::Future;

use crate::{
  page::{Page, PageRequest, SortOrder},
  snippet::{Snippet, SnippetDraft, SnippetId, SnippetStats, Visibility},
  tags::Tags,
  user::{Credentials, NewUser, ProfileUpdate, User, UserId},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Coarse classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
  /// A uniqueness constraint was violated.
  Conflict,
  /// The query itself was rejected (e.g. an unknown sort field).
  InvalidArgument,
  Other,
}

pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> StoreErrorKind;
}

impl StoreError for std::convert::Infallible {
  fn kind(&self) -> StoreErrorKind { match *self {} }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Optional, independently composable filters (AND semantics).
///
/// Blank strings are normalised to `None` by the `with_*` builders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetFilter {
  /// Case-insensitive substring over title, description, content and tags.
  pub text:       Option<String>,
  /// Exact language match.
  pub language:   Option<String>,
  /// Case-insensitive substring over the encoded tag list.
  pub tag:        Option<String>,
  pub visibility: Option<Visibility>,
}

impl SnippetFilter {
  pub fn with_text(mut self, text: Option<String>) -> Self {
    self.text = non_blank(text);
    self
  }

  pub fn with_language(mut self, language: Option<String>) -> Self {
    self.language = non_blank(language);
    self
  }

  pub fn with_tag(mut self, tag: Option<String>) -> Self {
    self.tag = non_blank(tag);
    self
  }

  pub fn with_visibility(mut self, visibility: Option<Visibility>) -> Self {
    self.visibility = visibility;
    self
  }
}

fn non_blank(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// Parameters for [`SnippetStore::query_snippets`].
#[derive(Debug, Clone, Default)]
pub struct SnippetQuery {
  /// Restrict to snippets written by this user.
  pub author: Option<UserId>,
  pub filter: SnippetFilter,
  pub order:  SortOrder,
  pub page:   PageRequest,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Durable storage of snippets.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SnippetStore: Send + Sync {
  type Error: StoreError;

  fn get_snippet(
    &self,
    id: SnippetId,
  ) -> impl Future<Output = Result<Option<Snippet>, Self::Error>> + Send + '_;

  /// Fetch by id, but only if the snippet is public or unlisted.
  fn get_public_or_unlisted(
    &self,
    id: SnippetId,
  ) -> impl Future<Output = Result<Option<Snippet>, Self::Error>> + Send + '_;

  /// Fetch by id, but only if `author` wrote it.
  fn get_snippet_by_author(
    &self,
    id: SnippetId,
    author: UserId,
  ) -> impl Future<Output = Result<Option<Snippet>, Self::Error>> + Send + '_;

  /// Persist a new snippet with `view_count = 0`. Timestamps and the id are
  /// assigned by the store.
  fn insert_snippet(
    &self,
    author: UserId,
    draft: SnippetDraft,
  ) -> impl Future<Output = Result<Snippet, Self::Error>> + Send + '_;

  /// Replace the author-controlled fields and bump `updated_at`. Never
  /// touches `author_id` or `view_count`. Returns `None` if the id is gone.
  fn update_snippet(
    &self,
    id: SnippetId,
    draft: SnippetDraft,
  ) -> impl Future<Output = Result<Option<Snippet>, Self::Error>> + Send + '_;

  /// Returns whether a row was removed.
  fn delete_snippet(
    &self,
    id: SnippetId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Atomically add one to the view counter and return the new value.
  ///
  /// Must be a single storage-level increment, never a read-modify-write,
  /// so concurrent readers cannot lose updates.
  fn increment_views(
    &self,
    id: SnippetId,
  ) -> impl Future<Output = Result<Option<u64>, Self::Error>> + Send + '_;

  fn query_snippets<'a>(
    &'a self,
    query: &'a SnippetQuery,
  ) -> impl Future<Output = Result<Page<Snippet>, Self::Error>> + Send + 'a;

  /// Distinct languages across public snippets, sorted.
  fn public_languages(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Distinct languages across every snippet of `author`, sorted.
  fn author_languages(
    &self,
    author: UserId,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// The tag sets of all public snippets that have any.
  fn public_tags(
    &self,
  ) -> impl Future<Output = Result<Vec<Tags>, Self::Error>> + Send + '_;

  fn author_stats(
    &self,
    author: UserId,
  ) -> impl Future<Output = Result<SnippetStats, Self::Error>> + Send + '_;
}

/// Durable storage of user accounts.
pub trait UserStore: Send + Sync {
  type Error: StoreError;

  /// Persist a new, active user. A duplicate username or email must fail
  /// with an error whose kind is [`StoreErrorKind::Conflict`].
  fn insert_user(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_active_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Look up an active user by username or email.
  fn find_credentials<'a>(
    &'a self,
    login: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  /// Apply the present fields of `update` and bump `updated_at`.
  fn update_profile(
    &self,
    id: UserId,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Is `username` used by anyone other than `except`?
  fn username_taken<'a>(
    &'a self,
    username: &'a str,
    except: Option<UserId>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Is `email` used by anyone other than `except`?
  fn email_taken<'a>(
    &'a self,
    email: &'a str,
    except: Option<UserId>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_filters_are_absent() {
    let filter = SnippetFilter::default()
      .with_text(Some("   ".into()))
      .with_language(Some(" rust ".into()))
      .with_tag(None);
    assert_eq!(filter.text, None);
    assert_eq!(filter.language.as_deref(), Some("rust"));
    assert_eq!(filter.tag, None);
  }
}
