//! Identifier canonicalisation.
//!
//! Every product identifier that flows through the engine (spreadsheet cells,
//! regex captures, positioned words) is reduced to an [`IdentifierKey`] before
//! it is compared with anything else. Two raw strings name the same product
//! iff their keys are equal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical form of a product identifier: uppercase ASCII letters, ASCII
/// digits and `-`, in their original order.
///
/// The empty key is representable (it is what blank input normalises to) but
/// never matches anything; see [`IdentifierKey::is_empty`].
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IdentifierKey(String);

impl IdentifierKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters. Keys are ASCII, so this is also the byte length.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for IdentifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IdentifierKey {
    fn from(raw: &str) -> Self {
        normalize(raw)
    }
}

/// Canonicalise a raw identifier string.
///
/// Total: any input, including an empty or all-punctuation string, produces a
/// key. The result is idempotent under re-normalisation.
pub fn normalize(raw: &str) -> IdentifierKey {
    IdentifierKey(
        raw.trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .map(|c| c.to_ascii_uppercase())
            .collect(),
    )
}

/// [`normalize`] for values that may be missing altogether (blank cells).
pub fn normalize_opt(raw: Option<&str>) -> IdentifierKey {
    raw.map(normalize).unwrap_or_default()
}
