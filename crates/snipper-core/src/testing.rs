//! A `HashMap`-backed store for exercising the services without a database.

use std::{
  collections::HashMap,
  convert::Infallible,
  future::{Future, ready},
  sync::{Mutex, MutexGuard},
};

use chrono::{Duration, Utc};

use crate::{
  page::{Page, SortDirection, SortOrder},
  snippet::{Snippet, SnippetDraft, SnippetId, SnippetStats, Visibility},
  store::{SnippetQuery, SnippetStore, UserStore},
  tags::Tags,
  user::{Credentials, NewUser, ProfileUpdate, User, UserId},
};

#[derive(Default)]
struct State {
  users:        HashMap<UserId, (User, String)>,
  snippets:     HashMap<SnippetId, Snippet>,
  next_user:    UserId,
  next_snippet: SnippetId,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
  state: Mutex<State>,
}

impl MemoryStore {
  fn lock(&self) -> MutexGuard<'_, State> { self.state.lock().unwrap() }

  pub fn add_user(&self, id: UserId, username: &str) {
    let now = Utc::now();
    let user = User {
      id,
      username: username.into(),
      email: format!("{username}@example.com"),
      full_name: None,
      bio: None,
      active: true,
      created_at: now,
      updated_at: now,
    };
    let mut state = self.lock();
    state.next_user = state.next_user.max(id);
    state.users.insert(id, (user, format!("hashed:{username}")));
  }

  pub fn deactivate(&self, id: UserId) {
    if let Some((user, _)) = self.lock().users.get_mut(&id) {
      user.active = false;
    }
  }

  pub fn snippet_count(&self) -> usize { self.lock().snippets.len() }

  pub fn views(&self, id: SnippetId) -> u64 {
    self.lock().snippets.get(&id).map_or(0, |s| s.view_count)
  }

  pub fn set_views(&self, id: SnippetId, views: u64) {
    if let Some(s) = self.lock().snippets.get_mut(&id) {
      s.view_count = views;
    }
  }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn query_matches(s: &Snippet, query: &SnippetQuery) -> bool {
  let f = &query.filter;
  query.author.is_none_or(|a| a == s.author_id)
    && f.visibility.is_none_or(|v| v == s.visibility)
    && f.language.as_deref().is_none_or(|l| l == s.language)
    && f.tag.as_deref().is_none_or(|t| contains_ci(&s.tags.encode(), t))
    && f.text.as_deref().is_none_or(|t| {
      contains_ci(&s.title, t)
        || s.description.as_deref().is_some_and(|d| contains_ci(d, t))
        || contains_ci(&s.content, t)
        || contains_ci(&s.tags.encode(), t)
    })
}

impl SnippetStore for MemoryStore {
  type Error = Infallible;

  fn get_snippet(
    &self,
    id: SnippetId,
  ) -> impl Future<Output = Result<Option<Snippet>, Infallible>> + Send + '_ {
    ready(Ok(self.lock().snippets.get(&id).cloned()))
  }

  fn get_public_or_unlisted(
    &self,
    id: SnippetId,
  ) -> impl Future<Output = Result<Option<Snippet>, Infallible>> + Send + '_ {
    let found = self
      .lock()
      .snippets
      .get(&id)
      .filter(|s| s.visibility != Visibility::Private)
      .cloned();
    ready(Ok(found))
  }

  fn get_snippet_by_author(
    &self,
    id: SnippetId,
    author: UserId,
  ) -> impl Future<Output = Result<Option<Snippet>, Infallible>> + Send + '_ {
    let found = self
      .lock()
      .snippets
      .get(&id)
      .filter(|s| s.author_id == author)
      .cloned();
    ready(Ok(found))
  }

  fn insert_snippet(
    &self,
    author: UserId,
    draft: SnippetDraft,
  ) -> impl Future<Output = Result<Snippet, Infallible>> + Send + '_ {
    let mut state = self.lock();
    state.next_snippet += 1;
    let id = state.next_snippet;
    // Strictly increasing creation times keep "recent" ordering deterministic.
    let now = Utc::now() + Duration::milliseconds(id);
    let author_username = state
      .users
      .get(&author)
      .map(|(u, _)| u.username.clone())
      .unwrap_or_default();
    let snippet = Snippet {
      id,
      title: draft.title,
      description: draft.description,
      content: draft.content,
      language: draft.language,
      tags: draft.tags,
      visibility: draft.visibility,
      view_count: 0,
      created_at: now,
      updated_at: now,
      author_id: author,
      author_username,
    };
    state.snippets.insert(id, snippet.clone());
    ready(Ok(snippet))
  }

  fn update_snippet(
    &self,
    id: SnippetId,
    draft: SnippetDraft,
  ) -> impl Future<Output = Result<Option<Snippet>, Infallible>> + Send + '_ {
    let updated = self.lock().snippets.get_mut(&id).map(|s| {
      s.title = draft.title;
      s.description = draft.description;
      s.content = draft.content;
      s.language = draft.language;
      s.tags = draft.tags;
      s.visibility = draft.visibility;
      s.updated_at = Utc::now();
      s.clone()
    });
    ready(Ok(updated))
  }

  fn delete_snippet(
    &self,
    id: SnippetId,
  ) -> impl Future<Output = Result<bool, Infallible>> + Send + '_ {
    ready(Ok(self.lock().snippets.remove(&id).is_some()))
  }

  fn increment_views(
    &self,
    id: SnippetId,
  ) -> impl Future<Output = Result<Option<u64>, Infallible>> + Send + '_ {
    let count = self.lock().snippets.get_mut(&id).map(|s| {
      s.view_count += 1;
      s.view_count
    });
    ready(Ok(count))
  }

  fn query_snippets<'a>(
    &'a self,
    query: &'a SnippetQuery,
  ) -> impl Future<Output = Result<Page<Snippet>, Infallible>> + Send + 'a {
    let mut hits: Vec<Snippet> = self
      .lock()
      .snippets
      .values()
      .filter(|s| query_matches(s, query))
      .cloned()
      .collect();

    match &query.order {
      SortOrder::Popular => hits.sort_by(|a, b| {
        (b.view_count, b.created_at, b.id).cmp(&(a.view_count, a.created_at, a.id))
      }),
      SortOrder::By { direction, .. } => {
        hits.sort_by_key(|s| (s.created_at, s.id));
        if *direction == SortDirection::Desc {
          hits.reverse();
        }
      }
    }

    let total = hits.len() as u64;
    let content = hits
      .into_iter()
      .skip(query.page.offset() as usize)
      .take(query.page.size as usize)
      .collect();
    ready(Ok(Page::new(content, query.page, total)))
  }

  fn public_languages(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Infallible>> + Send + '_ {
    let mut langs: Vec<String> = self
      .lock()
      .snippets
      .values()
      .filter(|s| s.visibility == Visibility::Public)
      .map(|s| s.language.clone())
      .collect();
    langs.sort();
    langs.dedup();
    ready(Ok(langs))
  }

  fn author_languages(
    &self,
    author: UserId,
  ) -> impl Future<Output = Result<Vec<String>, Infallible>> + Send + '_ {
    let mut langs: Vec<String> = self
      .lock()
      .snippets
      .values()
      .filter(|s| s.author_id == author)
      .map(|s| s.language.clone())
      .collect();
    langs.sort();
    langs.dedup();
    ready(Ok(langs))
  }

  fn public_tags(
    &self,
  ) -> impl Future<Output = Result<Vec<Tags>, Infallible>> + Send + '_ {
    let tags = self
      .lock()
      .snippets
      .values()
      .filter(|s| s.visibility == Visibility::Public && !s.tags.is_empty())
      .map(|s| s.tags.clone())
      .collect();
    ready(Ok(tags))
  }

  fn author_stats(
    &self,
    author: UserId,
  ) -> impl Future<Output = Result<SnippetStats, Infallible>> + Send + '_ {
    let mut stats = SnippetStats::default();
    for s in self.lock().snippets.values().filter(|s| s.author_id == author) {
      stats.total_snippets += 1;
      stats.total_views += s.view_count;
      match s.visibility {
        Visibility::Public => stats.public_snippets += 1,
        Visibility::Private => stats.private_snippets += 1,
        Visibility::Unlisted => stats.unlisted_snippets += 1,
      }
    }
    ready(Ok(stats))
  }
}

impl UserStore for MemoryStore {
  type Error = Infallible;

  fn insert_user(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<User, Infallible>> + Send + '_ {
    let mut state = self.lock();
    state.next_user += 1;
    let now = Utc::now();
    let created = User {
      id: state.next_user,
      username: user.username,
      email: user.email,
      full_name: user.full_name,
      bio: None,
      active: true,
      created_at: now,
      updated_at: now,
    };
    state
      .users
      .insert(created.id, (created.clone(), user.password_hash));
    ready(Ok(created))
  }

  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Infallible>> + Send + '_ {
    ready(Ok(self.lock().users.get(&id).map(|(u, _)| u.clone())))
  }

  fn get_active_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Infallible>> + Send + 'a {
    let found = self
      .lock()
      .users
      .values()
      .find(|(u, _)| u.active && u.username == username)
      .map(|(u, _)| u.clone());
    ready(Ok(found))
  }

  fn find_credentials<'a>(
    &'a self,
    login: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Infallible>> + Send + 'a {
    let found = self
      .lock()
      .users
      .values()
      .find(|(u, _)| u.active && (u.username == login || u.email == login))
      .map(|(u, hash)| Credentials {
        id:            u.id,
        username:      u.username.clone(),
        password_hash: hash.clone(),
      });
    ready(Ok(found))
  }

  fn update_profile(
    &self,
    id: UserId,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<User>, Infallible>> + Send + '_ {
    let updated = self.lock().users.get_mut(&id).map(|(u, _)| {
      if let Some(username) = update.username {
        u.username = username;
      }
      if let Some(email) = update.email {
        u.email = email;
      }
      if update.full_name.is_some() {
        u.full_name = update.full_name;
      }
      if update.bio.is_some() {
        u.bio = update.bio;
      }
      u.updated_at = Utc::now();
      u.clone()
    });
    ready(Ok(updated))
  }

  fn username_taken<'a>(
    &'a self,
    username: &'a str,
    except: Option<UserId>,
  ) -> impl Future<Output = Result<bool, Infallible>> + Send + 'a {
    let taken = self
      .lock()
      .users
      .values()
      .any(|(u, _)| u.username == username && Some(u.id) != except);
    ready(Ok(taken))
  }

  fn email_taken<'a>(
    &'a self,
    email: &'a str,
    except: Option<UserId>,
  ) -> impl Future<Output = Result<bool, Infallible>> + Send + 'a {
    let taken = self
      .lock()
      .users
      .values()
      .any(|(u, _)| u.email == email && Some(u.id) != except);
    ready(Ok(taken))
  }
}
