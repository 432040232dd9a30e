//! Pagination and ordering primitives shared by every listing operation.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

// ─── Request ─────────────────────────────────────────────────────────────────

/// A 0-based page window. `size` is always within `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page: u32,
  pub size: u32,
}

impl PageRequest {
  pub fn new(page: u32, size: u32) -> Self {
    Self { page, size: size.clamp(1, MAX_PAGE_SIZE) }
  }

  pub fn offset(&self) -> u64 { u64::from(self.page) * u64::from(self.size) }
}

impl Default for PageRequest {
  fn default() -> Self { Self::new(0, DEFAULT_PAGE_SIZE) }
}

// ─── Ordering ────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
  Asc,
  #[default]
  Desc,
}

/// How a listing is ordered.
///
/// `By::field` is an opaque, caller-supplied column name (e.g. `createdAt`).
/// The core passes it through; the store decides which names it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
  /// Most viewed first, newest first among equals.
  Popular,
  By {
    field:     String,
    direction: SortDirection,
  },
}

impl SortOrder {
  pub const CREATED_AT: &'static str = "createdAt";

  pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
    Self::By { field: field.into(), direction }
  }

  /// Newest first.
  pub fn recent() -> Self { Self::by(Self::CREATED_AT, SortDirection::Desc) }
}

impl Default for SortOrder {
  fn default() -> Self { Self::recent() }
}

// ─── Response ────────────────────────────────────────────────────────────────

/// One page of results plus the bookkeeping clients need to paginate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub content:        Vec<T>,
  pub page:           u32,
  pub size:           u32,
  pub total_elements: u64,
  pub total_pages:    u64,
  pub first:          bool,
  pub last:           bool,
  pub has_next:       bool,
  pub has_previous:   bool,
}

impl<T> Page<T> {
  pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
    let total_pages = total_elements.div_ceil(u64::from(request.size));
    let has_next = u64::from(request.page) + 1 < total_pages;
    Self {
      content,
      page: request.page,
      size: request.size,
      total_elements,
      total_pages,
      first: request.page == 0,
      last: !has_next,
      has_next,
      has_previous: request.page > 0,
    }
  }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      content:        self.content.into_iter().map(f).collect(),
      page:           self.page,
      size:           self.size,
      total_elements: self.total_elements,
      total_pages:    self.total_pages,
      first:          self.first,
      last:           self.last,
      has_next:       self.has_next,
      has_previous:   self.has_previous,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn size_is_clamped() {
    assert_eq!(PageRequest::new(0, 0).size, 1);
    assert_eq!(PageRequest::new(0, 5000).size, MAX_PAGE_SIZE);
    assert_eq!(PageRequest::new(3, 20).offset(), 60);
  }

  #[test]
  fn page_flags_in_the_middle() {
    let page = Page::new(vec![1, 2], PageRequest::new(1, 2), 5);
    assert_eq!(page.total_pages, 3);
    assert!(!page.first);
    assert!(!page.last);
    assert!(page.has_next);
    assert!(page.has_previous);
  }

  #[test]
  fn empty_result_is_first_and_last() {
    let page: Page<u8> = Page::new(vec![], PageRequest::default(), 0);
    assert_eq!(page.total_pages, 0);
    assert!(page.first && page.last);
    assert!(!page.has_next && !page.has_previous);
  }

  #[test]
  fn sort_direction_parses_any_case() {
    assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Asc);
    assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
    assert!("sideways".parse::<SortDirection>().is_err());
  }
}
