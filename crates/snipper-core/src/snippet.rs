//! Snippets: titled pieces of source text, each owned by exactly one author.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::{
  identity::Identity,
  tags::{MAX_ENCODED_LEN, Tags},
  user::UserId,
};

pub type SnippetId = i64;

// ─── Visibility ──────────────────────────────────────────────────────────────

/// Access tier of a snippet.
///
/// - `Public`: world-readable and listed in every public enumeration.
/// - `Private`: readable by its author only, never listed.
/// - `Unlisted`: readable by anyone who knows the id, never listed.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Visibility {
  #[default]
  Public,
  Private,
  Unlisted,
}

impl<'de> Deserialize<'de> for Visibility {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw
      .parse()
      .map_err(|_| serde::de::Error::custom(format!("invalid visibility: {raw:?}")))
  }
}

// ─── Snippet ─────────────────────────────────────────────────────────────────

/// A persisted snippet, joined with its author's username.
///
/// `author_id` never changes after creation and `view_count` never decreases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
  pub id:              SnippetId,
  pub title:           String,
  pub description:     Option<String>,
  pub content:         String,
  pub language:        String,
  pub tags:            Tags,
  pub visibility:      Visibility,
  pub view_count:      u64,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub author_id:       UserId,
  pub author_username: String,
}

impl Snippet {
  pub fn is_owned_by(&self, viewer: Option<&Identity>) -> bool {
    viewer.is_some_and(|v| v.id == self.author_id)
  }
}

/// The listing projection of a snippet: everything except the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetSummary {
  pub id:              SnippetId,
  pub title:           String,
  pub description:     Option<String>,
  pub language:        String,
  pub tags:            Tags,
  pub visibility:      Visibility,
  pub view_count:      u64,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  pub author_id:       UserId,
  pub author_username: String,
}

impl From<Snippet> for SnippetSummary {
  fn from(s: Snippet) -> Self {
    Self {
      id:              s.id,
      title:           s.title,
      description:     s.description,
      language:        s.language,
      tags:            s.tags,
      visibility:      s.visibility,
      view_count:      s.view_count,
      created_at:      s.created_at,
      updated_at:      s.updated_at,
      author_id:       s.author_id,
      author_username: s.author_username,
    }
  }
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// The author-controlled fields of a snippet, used for both create and
/// update. Missing required strings deserialize as empty so they are reported
/// by validation rather than as a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SnippetDraft {
  #[serde(default)]
  #[validate(
    custom(function = "not_blank"),
    length(max = 200, message = "must not exceed 200 characters")
  )]
  pub title:       String,
  #[serde(default)]
  #[validate(length(max = 1000, message = "must not exceed 1000 characters"))]
  pub description: Option<String>,
  #[serde(default)]
  #[validate(custom(function = "not_blank"))]
  pub content:     String,
  #[serde(default)]
  #[validate(
    custom(function = "not_blank"),
    length(max = 50, message = "must not exceed 50 characters")
  )]
  pub language:    String,
  #[serde(default)]
  #[validate(custom(function = "tags_fit"))]
  pub tags:        Tags,
  #[serde(default)]
  pub visibility:  Visibility,
}

impl SnippetDraft {
  pub fn new(
    title: impl Into<String>,
    content: impl Into<String>,
    language: impl Into<String>,
  ) -> Self {
    Self {
      title: title.into(),
      content: content.into(),
      language: language.into(),
      ..Self::default()
    }
  }

  pub fn with_visibility(mut self, visibility: Visibility) -> Self {
    self.visibility = visibility;
    self
  }

  pub fn with_tags(mut self, tags: Tags) -> Self {
    self.tags = tags;
    self
  }
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Aggregate counters over all snippets of one author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetStats {
  pub total_snippets:    u64,
  pub public_snippets:   u64,
  pub private_snippets:  u64,
  pub unlisted_snippets: u64,
  pub total_views:       u64,
}

// ─── Field validators ────────────────────────────────────────────────────────

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
  if value.trim().is_empty() {
    let mut err = ValidationError::new("blank");
    err.message = Some(Cow::Borrowed("must not be blank"));
    return Err(err);
  }
  Ok(())
}

fn tags_fit(tags: &Tags) -> Result<(), ValidationError> {
  if tags.encode().chars().count() > MAX_ENCODED_LEN {
    let mut err = ValidationError::new("length");
    err.message = Some(Cow::Borrowed("must not exceed 500 characters"));
    return Err(err);
  }
  Ok(())
}
