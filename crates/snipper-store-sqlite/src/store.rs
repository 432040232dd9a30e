//! [`SqliteStore`]: the SQLite implementation of [`SnippetStore`] and
//! [`UserStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};
use tracing::{debug, info};

use snipper_core::{
  page::{Page, SortDirection, SortOrder},
  snippet::{Snippet, SnippetDraft, SnippetId, SnippetStats},
  store::{SnippetQuery, SnippetStore, UserStore},
  tags::Tags,
  user::{Credentials, NewUser, ProfileUpdate, User, UserId},
};

use crate::{
  Error, Result,
  encode::{
    RawSnippet, RawUser, SNIPPET_COLUMNS, USER_COLUMNS, decode_count, encode_dt,
    encode_visibility, like_pattern,
  },
  schema::{FOLD_CASE, SCHEMA, register_functions},
};

// ─── SQL helpers ─────────────────────────────────────────────────────────────

const SNIPPET_FROM: &str = "FROM snippets s JOIN users u ON u.user_id = s.author_id";

fn select_snippet(
  conn: &rusqlite::Connection,
  predicate: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Option<RawSnippet>> {
  conn
    .query_row(
      &format!("SELECT {SNIPPET_COLUMNS} {SNIPPET_FROM} WHERE {predicate}"),
      params,
      RawSnippet::from_row,
    )
    .optional()
}

fn select_user(
  conn: &rusqlite::Connection,
  predicate: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Option<RawUser>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}"),
      params,
      RawUser::from_row,
    )
    .optional()
}

/// Map a [`SortOrder`] onto an `ORDER BY` body. Every ordering ends with
/// `snippet_id DESC` so pages are stable under ties.
fn order_clause(order: &SortOrder) -> Result<String> {
  let (field, direction) = match order {
    SortOrder::Popular => {
      return Ok("s.view_count DESC, s.created_at DESC, s.snippet_id DESC".into());
    }
    SortOrder::By { field, direction } => (field, direction),
  };

  let column = match field.as_str() {
    "createdAt" => "s.created_at",
    "updatedAt" => "s.updated_at",
    "title" => "s.title COLLATE NOCASE",
    "language" => "s.language COLLATE NOCASE",
    "viewCount" => "s.view_count",
    "id" => return Ok(format!("s.snippet_id {}", sql_direction(*direction))),
    other => return Err(Error::InvalidSortField(other.to_owned())),
  };
  Ok(format!("{column} {}, s.snippet_id DESC", sql_direction(*direction)))
}

fn sql_direction(direction: SortDirection) -> &'static str {
  match direction {
    SortDirection::Asc => "ASC",
    SortDirection::Desc => "DESC",
  }
}

/// Build the `WHERE` clause for a query. Placeholders are numbered so one
/// pattern can be referenced by several conditions.
fn where_clause(query: &SnippetQuery) -> (String, Vec<Value>) {
  let mut conds: Vec<String> = vec![];
  let mut params: Vec<Value> = vec![];
  let f = &query.filter;

  if let Some(author) = query.author {
    params.push(Value::Integer(author));
    conds.push(format!("s.author_id = ?{}", params.len()));
  }
  if let Some(visibility) = f.visibility {
    params.push(Value::Text(encode_visibility(visibility).to_owned()));
    conds.push(format!("s.visibility = ?{}", params.len()));
  }
  if let Some(language) = &f.language {
    params.push(Value::Text(language.clone()));
    conds.push(format!("s.language = ?{}", params.len()));
  }
  if let Some(tag) = &f.tag {
    params.push(Value::Text(like_pattern(&tag.to_lowercase())));
    conds.push(format!("{FOLD_CASE}(s.tags) LIKE ?{} ESCAPE '\\'", params.len()));
  }
  if let Some(text) = &f.text {
    params.push(Value::Text(like_pattern(&text.to_lowercase())));
    let n = params.len();
    conds.push(format!(
      "({FOLD_CASE}(s.title) LIKE ?{n} ESCAPE '\\'
        OR {FOLD_CASE}(s.description) LIKE ?{n} ESCAPE '\\'
        OR {FOLD_CASE}(s.content) LIKE ?{n} ESCAPE '\\'
        OR {FOLD_CASE}(s.tags) LIKE ?{n} ESCAPE '\\')"
    ));
  }

  let clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (clause, params)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Snippets and users backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    info!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Soft-(de)activate a user. Inactive users cannot log in, cannot use
  /// existing tokens and have no public profile.
  pub async fn set_user_active(&self, id: UserId, active: bool) -> Result<bool> {
    let now = encode_dt(Utc::now());
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET active = ?2, updated_at = ?3 WHERE user_id = ?1",
          rusqlite::params![id, active, now],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn languages_where(&self, predicate: &'static str, param: Value) -> Result<Vec<String>> {
    let langs = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT DISTINCT language FROM snippets WHERE {predicate} ORDER BY language"
        ))?;
        let rows = stmt
          .query_map([param], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(langs)
  }

  async fn exists(&self, sql: &'static str, value: String, except: Option<UserId>) -> Result<bool> {
    let taken = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(sql, rusqlite::params![value, except], |row| row.get(0))?)
      })
      .await?;
    Ok(taken)
  }
}

// ─── SnippetStore impl ───────────────────────────────────────────────────────

impl SnippetStore for SqliteStore {
  type Error = Error;

  // ── Point reads ───────────────────────────────────────────────────────────

  async fn get_snippet(&self, id: SnippetId) -> Result<Option<Snippet>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_snippet(conn, "s.snippet_id = ?1", [id])?))
      .await?;
    raw.map(RawSnippet::into_snippet).transpose()
  }

  async fn get_public_or_unlisted(&self, id: SnippetId) -> Result<Option<Snippet>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(select_snippet(
          conn,
          "s.snippet_id = ?1 AND s.visibility IN ('PUBLIC', 'UNLISTED')",
          [id],
        )?)
      })
      .await?;
    raw.map(RawSnippet::into_snippet).transpose()
  }

  async fn get_snippet_by_author(
    &self,
    id: SnippetId,
    author: UserId,
  ) -> Result<Option<Snippet>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(select_snippet(conn, "s.snippet_id = ?1 AND s.author_id = ?2", [id, author])?)
      })
      .await?;
    raw.map(RawSnippet::into_snippet).transpose()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert_snippet(&self, author: UserId, draft: SnippetDraft) -> Result<Snippet> {
    let now = encode_dt(Utc::now());
    let tags = draft.tags.encode();
    let visibility = encode_visibility(draft.visibility);

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO snippets (
             author_id, title, description, content, language, tags,
             visibility, view_count, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)",
          rusqlite::params![
            author,
            draft.title,
            draft.description,
            draft.content,
            draft.language,
            tags,
            visibility,
            now,
          ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(select_snippet(conn, "s.snippet_id = ?1", [id])?)
      })
      .await?;

    raw
      .ok_or_else(|| Error::Decode("inserted snippet vanished".into()))?
      .into_snippet()
  }

  async fn update_snippet(&self, id: SnippetId, draft: SnippetDraft) -> Result<Option<Snippet>> {
    let now = encode_dt(Utc::now());
    let tags = draft.tags.encode();
    let visibility = encode_visibility(draft.visibility);

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE snippets
              SET title = ?2, description = ?3, content = ?4, language = ?5,
                  tags = ?6, visibility = ?7, updated_at = ?8
            WHERE snippet_id = ?1",
          rusqlite::params![
            id,
            draft.title,
            draft.description,
            draft.content,
            draft.language,
            tags,
            visibility,
            now,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_snippet(conn, "s.snippet_id = ?1", [id])?)
      })
      .await?;
    raw.map(RawSnippet::into_snippet).transpose()
  }

  async fn delete_snippet(&self, id: SnippetId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM snippets WHERE snippet_id = ?1", [id])?))
      .await?;
    Ok(removed > 0)
  }

  async fn increment_views(&self, id: SnippetId) -> Result<Option<u64>> {
    let count: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "UPDATE snippets SET view_count = view_count + 1
                WHERE snippet_id = ?1
                RETURNING view_count",
              [id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    count.map(decode_count).transpose()
  }

  // ── Enumeration ───────────────────────────────────────────────────────────

  async fn query_snippets<'a>(&'a self, query: &'a SnippetQuery) -> Result<Page<Snippet>> {
    let order = order_clause(&query.order)?;
    let (filter, mut params) = where_clause(query);
    let count_sql = format!("SELECT COUNT(*) FROM snippets s {filter}");

    let count_params = params.clone();
    params.push(Value::Integer(i64::from(query.page.size)));
    let limit = params.len();
    params.push(Value::Integer(i64::try_from(query.page.offset()).unwrap_or(i64::MAX)));
    let offset = params.len();
    let page_sql = format!(
      "SELECT {SNIPPET_COLUMNS} {SNIPPET_FROM} {filter}
       ORDER BY {order}
       LIMIT ?{limit} OFFSET ?{offset}"
    );
    debug!(sql = %page_sql, "snippet query");

    let (total, raws) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &count_sql,
          rusqlite::params_from_iter(&count_params),
          |row| row.get(0),
        )?;
        let mut stmt = conn.prepare(&page_sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(&params), RawSnippet::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, rows))
      })
      .await?;

    let content = raws
      .into_iter()
      .map(RawSnippet::into_snippet)
      .collect::<Result<_>>()?;
    Ok(Page::new(content, query.page, decode_count(total)?))
  }

  async fn public_languages(&self) -> Result<Vec<String>> {
    self
      .languages_where("visibility = ?1", Value::Text("PUBLIC".into()))
      .await
  }

  async fn author_languages(&self, author: UserId) -> Result<Vec<String>> {
    self
      .languages_where("author_id = ?1", Value::Integer(author))
      .await
  }

  async fn public_tags(&self) -> Result<Vec<Tags>> {
    let encoded: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT tags FROM snippets WHERE visibility = 'PUBLIC' AND tags <> ''",
        )?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(encoded.iter().map(|s| Tags::parse(s)).collect())
  }

  async fn author_stats(&self, author: UserId) -> Result<SnippetStats> {
    let (total, public, private, unlisted, views): (i64, i64, i64, i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*),
                  COALESCE(SUM(visibility = 'PUBLIC'), 0),
                  COALESCE(SUM(visibility = 'PRIVATE'), 0),
                  COALESCE(SUM(visibility = 'UNLISTED'), 0),
                  COALESCE(SUM(view_count), 0)
             FROM snippets
            WHERE author_id = ?1",
          [author],
          |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )?)
      })
      .await?;

    Ok(SnippetStats {
      total_snippets:    decode_count(total)?,
      public_snippets:   decode_count(public)?,
      private_snippets:  decode_count(private)?,
      unlisted_snippets: decode_count(unlisted)?,
      total_views:       decode_count(views)?,
    })
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = Error;

  async fn insert_user(&self, user: NewUser) -> Result<User> {
    let now = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             username, email, password_hash, full_name, active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
          rusqlite::params![user.username, user.email, user.password_hash, user.full_name, now],
        )?;
        let id = conn.last_insert_rowid();
        Ok(select_user(conn, "user_id = ?1", [id])?)
      })
      .await?;

    raw
      .ok_or_else(|| Error::Decode("inserted user vanished".into()))?
      .into_user()
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_user(conn, "user_id = ?1", [id])?))
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn get_active_user_by_username<'a>(&'a self, username: &'a str) -> Result<Option<User>> {
    let username = username.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(select_user(conn, "username = ?1 AND active = 1", [username])?))
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn find_credentials<'a>(&'a self, login: &'a str) -> Result<Option<Credentials>> {
    let login = login.to_owned();
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, username, password_hash
                 FROM users
                WHERE active = 1 AND (username = ?1 OR email = ?1)
                LIMIT 1",
              [login],
              |row| {
                Ok(Credentials {
                  id:            row.get(0)?,
                  username:      row.get(1)?,
                  password_hash: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(found)
  }

  async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<Option<User>> {
    let now = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE users
              SET username  = COALESCE(?2, username),
                  email     = COALESCE(?3, email),
                  full_name = COALESCE(?4, full_name),
                  bio       = COALESCE(?5, bio),
                  updated_at = ?6
            WHERE user_id = ?1",
          rusqlite::params![id, update.username, update.email, update.full_name, update.bio, now],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(select_user(conn, "user_id = ?1", [id])?)
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn username_taken<'a>(
    &'a self,
    username: &'a str,
    except: Option<UserId>,
  ) -> Result<bool> {
    self
      .exists(
        "SELECT EXISTS(
           SELECT 1 FROM users WHERE username = ?1 AND (?2 IS NULL OR user_id <> ?2)
         )",
        username.to_owned(),
        except,
      )
      .await
  }

  async fn email_taken<'a>(&'a self, email: &'a str, except: Option<UserId>) -> Result<bool> {
    self
      .exists(
        "SELECT EXISTS(
           SELECT 1 FROM users WHERE email = ?1 AND (?2 IS NULL OR user_id <> ?2)
         )",
        email.to_owned(),
        except,
      )
      .await
  }
}
