//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings
//! (microsecond precision, `Z` suffix) so lexical order equals chronological
//! order. Tags are stored as a comma-delimited string. Visibility is stored
//! as its upper-case name.

use chrono::{DateTime, SecondsFormat, Utc};
use snipper_core::{
  snippet::{Snippet, Visibility},
  tags::Tags,
  user::User,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Visibility ──────────────────────────────────────────────────────────────

pub fn encode_visibility(v: Visibility) -> &'static str {
  match v {
    Visibility::Public => "PUBLIC",
    Visibility::Private => "PRIVATE",
    Visibility::Unlisted => "UNLISTED",
  }
}

pub fn decode_visibility(s: &str) -> Result<Visibility> {
  match s {
    "PUBLIC" => Ok(Visibility::Public),
    "PRIVATE" => Ok(Visibility::Private),
    "UNLISTED" => Ok(Visibility::Unlisted),
    other => Err(Error::Decode(format!("unknown visibility: {other:?}"))),
  }
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// SQLite integers are signed; counters never are.
pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Decode(format!("negative counter: {n}")))
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// `%needle%` with the LIKE metacharacters in `needle` escaped by `\`.
pub fn like_pattern(needle: &str) -> String {
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSnippet::from_row`]. Expects `snippets s` joined
/// with `users u` on the author.
pub const SNIPPET_COLUMNS: &str = "
  s.snippet_id, s.title, s.description, s.content, s.language, s.tags,
  s.visibility, s.view_count, s.created_at, s.updated_at,
  s.author_id, u.username";

/// Raw values read directly from a `snippets` row joined with its author.
pub struct RawSnippet {
  pub snippet_id:      i64,
  pub title:           String,
  pub description:     Option<String>,
  pub content:         String,
  pub language:        String,
  pub tags:            String,
  pub visibility:      String,
  pub view_count:      i64,
  pub created_at:      String,
  pub updated_at:      String,
  pub author_id:       i64,
  pub author_username: String,
}

impl RawSnippet {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      snippet_id:      row.get(0)?,
      title:           row.get(1)?,
      description:     row.get(2)?,
      content:         row.get(3)?,
      language:        row.get(4)?,
      tags:            row.get(5)?,
      visibility:      row.get(6)?,
      view_count:      row.get(7)?,
      created_at:      row.get(8)?,
      updated_at:      row.get(9)?,
      author_id:       row.get(10)?,
      author_username: row.get(11)?,
    })
  }

  pub fn into_snippet(self) -> Result<Snippet> {
    Ok(Snippet {
      id:              self.snippet_id,
      title:           self.title,
      description:     self.description,
      content:         self.content,
      language:        self.language,
      tags:            Tags::parse(&self.tags),
      visibility:      decode_visibility(&self.visibility)?,
      view_count:      decode_count(self.view_count)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
      author_id:       self.author_id,
      author_username: self.author_username,
    })
  }
}

pub const USER_COLUMNS: &str = "
  user_id, username, email, full_name, bio, active, created_at, updated_at";

/// Raw values read directly from a `users` row (minus the password hash).
pub struct RawUser {
  pub user_id:    i64,
  pub username:   String,
  pub email:      String,
  pub full_name:  Option<String>,
  pub bio:        Option<String>,
  pub active:     bool,
  pub created_at: String,
  pub updated_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      email:      row.get(2)?,
      full_name:  row.get(3)?,
      bio:        row.get(4)?,
      active:     row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         self.user_id,
      username:   self.username,
      email:      self.email,
      full_name:  self.full_name,
      bio:        self.bio,
      active:     self.active,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let late = early + chrono::Duration::microseconds(1);
    let (a, b) = (encode_dt(early), encode_dt(late));
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), late);
  }

  #[test]
  fn like_metacharacters_are_escaped() {
    assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    assert_eq!(like_pattern("rust"), "%rust%");
  }

  #[test]
  fn unknown_visibility_is_a_decode_error() {
    assert!(matches!(decode_visibility("public"), Err(Error::Decode(_))));
    assert_eq!(decode_visibility("UNLISTED").unwrap(), Visibility::Unlisted);
  }
}
