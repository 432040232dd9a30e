//! Snippet lifecycle: create, read, update, delete and enumerate, with the
//! visibility policy and view accounting applied in one place.
//!
//! Not-found conditions are deliberately ambiguous where the policy demands
//! it:
//!
//! | Path | Missing | Hidden from caller |
//! |------|---------|--------------------|
//! | authenticated read | `NotFound` | `Forbidden` |
//! | anonymous read | `NotFound` | `NotFound` (private) |
//! | update / delete | `NotFound` | `NotFound` (not the author) |

use std::{collections::BTreeSet, sync::Arc};

use tracing::{debug, info};
use validator::Validate as _;

use crate::{
  Error, Result,
  identity::Identity,
  page::{Page, PageRequest, SortOrder},
  policy,
  snippet::{Snippet, SnippetDraft, SnippetId, Visibility},
  store::{SnippetFilter, SnippetQuery, SnippetStore, UserStore},
};

/// Stateless orchestration over a [`SnippetStore`]. Cheap to clone.
pub struct SnippetService<S> {
  store: Arc<S>,
}

impl<S> Clone for SnippetService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

fn not_found(id: SnippetId) -> Error {
  Error::NotFound(format!("snippet not found with id: {id}"))
}

impl<S: SnippetStore> SnippetService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Create a snippet owned by `author`.
  pub async fn create(&self, author: &Identity, draft: SnippetDraft) -> Result<Snippet> {
    draft.validate()?;
    let snippet = self
      .store
      .insert_snippet(author.id, draft)
      .await
      .map_err(Error::store)?;
    info!(
      snippet_id = snippet.id,
      author = %author.username,
      visibility = %snippet.visibility,
      "snippet created"
    );
    Ok(snippet)
  }

  /// Replace the content fields of a snippet `author` owns.
  ///
  /// Ownership is part of the fetch, so someone else's snippet is reported
  /// exactly like a missing one.
  pub async fn update(
    &self,
    author: &Identity,
    id: SnippetId,
    draft: SnippetDraft,
  ) -> Result<Snippet> {
    draft.validate()?;
    let existing = self.owned(author, id).await?;
    debug_assert!(policy::can_write(&existing, Some(author)));

    let updated = self
      .store
      .update_snippet(existing.id, draft)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found(id))?;
    info!(snippet_id = id, author = %author.username, "snippet updated");
    Ok(updated)
  }

  pub async fn delete(&self, author: &Identity, id: SnippetId) -> Result<()> {
    let existing = self.owned(author, id).await?;
    debug_assert!(policy::can_write(&existing, Some(author)));

    let removed = self
      .store
      .delete_snippet(existing.id)
      .await
      .map_err(Error::store)?;
    if !removed {
      return Err(not_found(id));
    }
    info!(snippet_id = id, author = %author.username, "snippet deleted");
    Ok(())
  }

  async fn owned(&self, author: &Identity, id: SnippetId) -> Result<Snippet> {
    self
      .store
      .get_snippet_by_author(id, author.id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| {
        Error::NotFound(format!(
          "snippet {id} not found or you don't have permission to modify it"
        ))
      })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Direct read by id for a possibly-authenticated caller.
  ///
  /// A private snippet read by anyone but its author is `Forbidden`.
  pub async fn get(&self, id: SnippetId, viewer: Option<&Identity>) -> Result<Snippet> {
    let mut snippet = self
      .store
      .get_snippet(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| not_found(id))?;

    if !policy::can_read(&snippet, viewer) {
      return Err(Error::Forbidden(
        "you don't have permission to access this snippet".into(),
      ));
    }

    self.record_view(&mut snippet, viewer).await?;
    Ok(snippet)
  }

  /// Anonymous read by id. Private snippets are filtered out by the store,
  /// so they are indistinguishable from ids that never existed.
  pub async fn get_public(&self, id: SnippetId) -> Result<Snippet> {
    let mut snippet = self
      .store
      .get_public_or_unlisted(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("public snippet not found with id: {id}")))?;

    self.record_view(&mut snippet, None).await?;
    Ok(snippet)
  }

  /// Apply the view-accounting rule to a read of `snippet` by `viewer`.
  ///
  /// On increment, `snippet.view_count` is refreshed from the value the store
  /// returned. Returns whether an increment happened.
  pub async fn record_view(
    &self,
    snippet: &mut Snippet,
    viewer: Option<&Identity>,
  ) -> Result<bool> {
    if !policy::should_record_view(snippet, viewer) {
      debug!(snippet_id = snippet.id, "view not counted");
      return Ok(false);
    }

    match self
      .store
      .increment_views(snippet.id)
      .await
      .map_err(Error::store)?
    {
      Some(count) => {
        snippet.view_count = count;
        debug!(snippet_id = snippet.id, view_count = count, "view counted");
        Ok(true)
      }
      None => {
        debug!(snippet_id = snippet.id, "snippet vanished before view was counted");
        Ok(false)
      }
    }
  }

  // ── Enumeration ───────────────────────────────────────────────────────────

  /// Everything `owner` wrote, whatever its visibility. A visibility filter
  /// may still be supplied to narrow the result.
  pub async fn list_mine(
    &self,
    owner: &Identity,
    filter: SnippetFilter,
    order: SortOrder,
    page: PageRequest,
  ) -> Result<Page<Snippet>> {
    let query = SnippetQuery { author: Some(owner.id), filter, order, page };
    self.store.query_snippets(&query).await.map_err(Error::store)
  }

  /// Public listing and search. Any visibility in `filter` is overridden:
  /// only public snippets are ever enumerated.
  pub async fn list_public(
    &self,
    filter: SnippetFilter,
    order: SortOrder,
    page: PageRequest,
  ) -> Result<Page<Snippet>> {
    self.enumerate(None, filter, order, page).await
  }

  pub async fn popular(&self, page: PageRequest) -> Result<Page<Snippet>> {
    self
      .enumerate(None, SnippetFilter::default(), SortOrder::Popular, page)
      .await
  }

  pub async fn recent(&self, page: PageRequest) -> Result<Page<Snippet>> {
    self
      .enumerate(None, SnippetFilter::default(), SortOrder::recent(), page)
      .await
  }

  pub async fn by_language(&self, language: &str, page: PageRequest) -> Result<Page<Snippet>> {
    let filter = SnippetFilter::default().with_language(Some(language.to_owned()));
    self.enumerate(None, filter, SortOrder::recent(), page).await
  }

  async fn enumerate(
    &self,
    author: Option<crate::user::UserId>,
    filter: SnippetFilter,
    order: SortOrder,
    page: PageRequest,
  ) -> Result<Page<Snippet>> {
    let query = SnippetQuery {
      author,
      filter: filter.with_visibility(Some(Visibility::Public)),
      order,
      page,
    };
    let result = self.store.query_snippets(&query).await.map_err(Error::store)?;
    debug_assert!(result.content.iter().all(policy::can_enumerate));
    Ok(result)
  }

  /// Distinct languages of public snippets.
  pub async fn languages(&self) -> Result<Vec<String>> {
    self.store.public_languages().await.map_err(Error::store)
  }

  /// Distinct tags across public snippets, sorted.
  pub async fn tags(&self) -> Result<Vec<String>> {
    let sets = self.store.public_tags().await.map_err(Error::store)?;
    let all: BTreeSet<String> = sets.into_iter().flatten().collect();
    Ok(all.into_iter().collect())
  }
}

impl<S: SnippetStore + UserStore> SnippetService<S> {
  /// Public snippets of an active user, looked up by username.
  pub async fn public_by_username(
    &self,
    username: &str,
    order: SortOrder,
    page: PageRequest,
  ) -> Result<Page<Snippet>> {
    let user = self
      .store
      .get_active_user_by_username(username)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("user not found with username: {username}")))?;
    self
      .enumerate(Some(user.id), SnippetFilter::default(), order, page)
      .await
  }
}
