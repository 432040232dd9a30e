//! Visibility policy and the view-accounting rule.
//!
//! Every function here is pure: same inputs, same answer, no I/O. Each one
//! matches on [`Visibility`] exhaustively so a new tier cannot slip through
//! unnoticed.

use crate::{
  identity::Identity,
  snippet::{Snippet, Visibility},
};

/// May `viewer` read `snippet` once its id is known?
///
/// Unlisted snippets behave like public ones here; they differ only in
/// [`can_enumerate`].
pub fn can_read(snippet: &Snippet, viewer: Option<&Identity>) -> bool {
  match snippet.visibility {
    Visibility::Public | Visibility::Unlisted => true,
    Visibility::Private => snippet.is_owned_by(viewer),
  }
}

/// May `viewer` update or delete `snippet`? Only the author, regardless of
/// visibility.
pub fn can_write(snippet: &Snippet, viewer: Option<&Identity>) -> bool {
  snippet.is_owned_by(viewer)
}

/// May `snippet` appear in public listings, searches and rankings?
pub fn can_enumerate(snippet: &Snippet) -> bool {
  match snippet.visibility {
    Visibility::Public => true,
    Visibility::Private | Visibility::Unlisted => false,
  }
}

/// Should a read of `snippet` by `viewer` bump its view counter?
///
/// Permitted reads by anonymous callers or non-owners count; the author
/// reading their own snippet never does.
pub fn should_record_view(snippet: &Snippet, viewer: Option<&Identity>) -> bool {
  can_read(snippet, viewer) && !snippet.is_owned_by(viewer)
}
