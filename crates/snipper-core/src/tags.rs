//! Snippet tags.
//!
//! Tags are a set at the domain boundary: trimmed, non-empty, de-duplicated
//! and sorted. Normalisation happens once, in the constructors below; the
//! comma-delimited form only exists for storage and for lenient input.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

/// Separator used by the persisted (and accepted input) string form.
pub const DELIMITER: char = ',';

/// Maximum length, in characters, of the encoded (delimited) form.
pub const MAX_ENCODED_LEN: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tags(BTreeSet<String>);

impl Tags {
  /// Build a tag set from raw items. Items containing the delimiter are
  /// split, so a set always survives a trip through [`Tags::encode`].
  pub fn new<I, S>(items: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let set = items
      .into_iter()
      .flat_map(|item| {
        item
          .as_ref()
          .split(DELIMITER)
          .map(str::trim)
          .filter(|t| !t.is_empty())
          .map(str::to_owned)
          .collect::<Vec<_>>()
      })
      .collect();
    Self(set)
  }

  /// Parse the delimited form, e.g. `"rust, async,rust"`.
  pub fn parse(delimited: &str) -> Self { Self::new([delimited]) }

  /// The delimited storage form, e.g. `"async,rust"`.
  pub fn encode(&self) -> String {
    self.0.iter().cloned().collect::<Vec<_>>().join(",")
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn contains(&self, tag: &str) -> bool { self.0.contains(tag) }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }
}

impl IntoIterator for Tags {
  type IntoIter = std::collections::btree_set::IntoIter<String>;
  type Item = String;

  fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl FromIterator<String> for Tags {
  fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
    Self::new(iter)
  }
}

impl<'de> Deserialize<'de> for Tags {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      List(Vec<String>),
      Delimited(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
      Some(Raw::List(items)) => Self::new(items),
      Some(Raw::Delimited(s)) => Self::parse(&s),
      None => Self::default(),
    })
  }
}
