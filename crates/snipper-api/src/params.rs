//! Query-string parameters shared by the listing endpoints.
//!
//! Paging and filtering live in separate structs: axum's `Query` is built on
//! `serde_urlencoded`, which cannot parse numbers through `#[serde(flatten)]`.

use serde::Deserialize;
use snipper_core::{
  page::{DEFAULT_PAGE_SIZE, PageRequest, SortDirection, SortOrder},
  snippet::Visibility,
  store::SnippetFilter,
};

use crate::error::ApiError;

fn default_size() -> u32 { DEFAULT_PAGE_SIZE }

/// `?page=&size=` (0-based; size clamped to `1..=100`).
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
  #[serde(default)]
  pub page: u32,
  #[serde(default = "default_size")]
  pub size: u32,
}

impl PageParams {
  pub fn request(&self) -> PageRequest { PageRequest::new(self.page, self.size) }
}

/// `?sortBy=&sortDir=`. Defaults to `createdAt desc`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortParams {
  pub sort_by:  Option<String>,
  pub sort_dir: Option<String>,
}

impl SortParams {
  /// The field name is passed through untouched; the store decides whether
  /// it can order by it.
  pub fn order(&self) -> Result<SortOrder, ApiError> {
    let direction = match self.sort_dir.as_deref().map(str::trim) {
      None | Some("") => SortDirection::default(),
      Some(raw) => raw
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("sortDir must be 'asc' or 'desc', got {raw:?}")))?,
    };
    let field = self
      .sort_by
      .as_deref()
      .map(str::trim)
      .filter(|f| !f.is_empty())
      .unwrap_or(SortOrder::CREATED_AT);
    Ok(SortOrder::by(field, direction))
  }
}

/// `?q=&language=&tags=&visibility=` for the search endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
  pub q:          Option<String>,
  pub language:   Option<String>,
  pub tags:       Option<String>,
  pub visibility: Option<String>,
}

impl SearchParams {
  pub fn filter(self) -> Result<SnippetFilter, ApiError> {
    Ok(
      SnippetFilter::default()
        .with_text(self.q)
        .with_language(self.language)
        .with_tag(self.tags)
        .with_visibility(parse_visibility(self.visibility.as_deref())?),
    )
  }
}

/// `?visibility=&language=&search=` for the caller's own snippets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnSnippetParams {
  pub visibility: Option<String>,
  pub language:   Option<String>,
  pub search:     Option<String>,
}

impl OwnSnippetParams {
  pub fn filter(self) -> Result<SnippetFilter, ApiError> {
    Ok(
      SnippetFilter::default()
        .with_text(self.search)
        .with_language(self.language)
        .with_visibility(parse_visibility(self.visibility.as_deref())?),
    )
  }
}

/// Blank means "any"; anything else must name a visibility (any case).
fn parse_visibility(raw: Option<&str>) -> Result<Option<Visibility>, ApiError> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(v) => v
      .parse()
      .map(Some)
      .map_err(|_| ApiError::BadRequest(format!("unknown visibility: {v:?}"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sort_defaults_to_newest_first() {
    assert_eq!(SortParams::default().order().unwrap(), SortOrder::recent());
  }

  #[test]
  fn sort_direction_is_case_insensitive_and_strict() {
    let p = SortParams { sort_by: Some("title".into()), sort_dir: Some("ASC".into()) };
    assert_eq!(p.order().unwrap(), SortOrder::by("title", SortDirection::Asc));

    let bad = SortParams { sort_by: None, sort_dir: Some("sideways".into()) };
    assert!(matches!(bad.order(), Err(ApiError::BadRequest(_))));
  }

  #[test]
  fn page_size_is_clamped() {
    assert_eq!(PageParams { page: 3, size: 0 }.request(), PageRequest::new(3, 1));
    assert_eq!(PageParams { page: 0, size: 5000 }.request().size, 100);
  }

  #[test]
  fn visibility_filter_parses_any_case() {
    let p = SearchParams { visibility: Some("unlisted".into()), ..SearchParams::default() };
    assert_eq!(p.filter().unwrap().visibility, Some(Visibility::Unlisted));

    let p = SearchParams { visibility: Some("secret".into()), ..SearchParams::default() };
    assert!(p.filter().is_err());
  }
}
