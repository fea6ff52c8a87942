//! Candidate identifier extraction for a single page.
//!
//! Three independent passes feed one candidate set:
//!
//! ```text
//! page text  --labeled patterns-->  ┐
//! words      --"Model" anchors--->  ├──>  PageCandidateSet
//! page text  --loose tokens------>  ┘
//! ```
//!
//! Labeled patterns are precise but only see a label and its value when text
//! extraction put them on the same line. Packing slips often print the model
//! number in a cell *below* a "Model" heading, so the positional pass looks
//! for words in a window under every "Model" anchor. The loose pass is a
//! low-precision net; the assignment engine only counts what it finds when it
//! hits a known identifier.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, IdentifierKey};
use crate::store::StoreProfile;

/// Single-token spellings that count as a "Model" label on their own.
pub const ANCHOR_KEYWORDS: &[&str] = &[
    "MODEL",
    "MODEL#",
    "MODELNO",
    "MODELNUMBER",
    "MODEL#.",
    "MODELNO.",
    "MODELNUMBER.",
];

/// Tokens that may follow a bare `MODEL` and extend the anchor box.
const ANCHOR_SUFFIXES: &[&str] = &["#", "NO", "NO.", "NUMBER", "NUMBER."];

/// How far below an anchor's bottom edge a value may start.
pub const BELOW_ANCHOR_MAX_DY: f32 = 180.0;

/// Horizontal slack left of the anchor.
pub const ANCHOR_LEFT_SLACK: f32 = 20.0;

/// Horizontal slack right of the anchor.
pub const ANCHOR_RIGHT_SLACK: f32 = 220.0;

/// Shortest normalised word accepted from the positional pass.
pub const MIN_POSITIONAL_LEN: usize = 4;

/// All distinct identifier keys found on one page, in key order.
pub type PageCandidateSet = BTreeSet<IdentifierKey>;

/// Axis-aligned box in page coordinates. `top < bottom`: y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        BoundingBox {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// A whitespace-delimited token and where it sits on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedWord {
    pub text: String,
    pub bbox: BoundingBox,
}

impl PositionedWord {
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        PositionedWord {
            text: text.into(),
            bbox,
        }
    }
}

/// Which pass produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateSource {
    Labeled,
    BelowModel,
    Loose,
}

/// Extract the candidate set for one page.
pub fn extract(
    page_text: &str,
    profile: &StoreProfile,
    words: &[PositionedWord],
) -> PageCandidateSet {
    extract_traced(page_text, profile, words)
        .into_keys()
        .collect()
}

/// Like [`extract`], but remembers every pass that found each key.
///
/// The candidate set is the key set of the returned map; the sources are
/// for diagnostics only and never influence a vendor decision.
pub fn extract_traced(
    page_text: &str,
    profile: &StoreProfile,
    words: &[PositionedWord],
) -> BTreeMap<IdentifierKey, BTreeSet<CandidateSource>> {
    let mut found: BTreeMap<IdentifierKey, BTreeSet<CandidateSource>> = BTreeMap::new();
    let mut add = |key: IdentifierKey, source: CandidateSource| {
        if !key.is_empty() {
            found.entry(key).or_default().insert(source);
        }
    };

    for key in labeled_matches(page_text, profile) {
        add(key, CandidateSource::Labeled);
    }
    if !words.is_empty() {
        for key in keys_below_model_anchors(words) {
            add(key, CandidateSource::BelowModel);
        }
    }
    for key in loose_matches(page_text, profile) {
        add(key, CandidateSource::Loose);
    }

    found
}

/// Capture group 1 of every match of every labeled pattern, normalised.
pub fn labeled_matches(page_text: &str, profile: &StoreProfile) -> Vec<IdentifierKey> {
    profile
        .labeled
        .iter()
        .flat_map(|pattern| pattern.regex.captures_iter(page_text))
        .filter_map(|caps| caps.get(1).map(|m| normalize(m.as_str())))
        .collect()
}

/// Every loose-token match, normalised.
pub fn loose_matches(page_text: &str, profile: &StoreProfile) -> Vec<IdentifierKey> {
    profile
        .loose
        .iter()
        .flat_map(|regex| regex.captures_iter(page_text))
        .filter_map(|caps| caps.get(1).map(|m| normalize(m.as_str())))
        .collect()
}

/// Locate "Model" label regions in reading order.
///
/// A bare `MODEL` token may absorb the next token when it is `#`, or starts
/// with `NO` or `NUMBER`; in that case one more token from the exact suffix
/// set (`#`, `NO`, `NO.`, `NUMBER`, `NUMBER.`) may be absorbed too. The
/// absorbed boxes are merged into a single anchor. Compact spellings such as
/// `MODEL#` or `MODELNO.` are anchors on their own.
pub fn find_model_anchors(words: &[PositionedWord]) -> Vec<BoundingBox> {
    let seq: Vec<(String, &PositionedWord)> = words
        .iter()
        .filter_map(|w| {
            let token = w.text.trim();
            (!token.is_empty()).then(|| (token.to_uppercase(), w))
        })
        .collect();

    let mut anchors = Vec::new();
    for i in 0..seq.len() {
        let (token, word) = &seq[i];
        if token == "MODEL" {
            let mut anchor = word.bbox;
            if let Some((next, next_word)) = seq.get(i + 1) {
                if is_model_continuation(next) {
                    anchor = anchor.union(&next_word.bbox);
                    if let Some((after, after_word)) = seq.get(i + 2) {
                        if ANCHOR_SUFFIXES.contains(&after.as_str()) {
                            anchor = anchor.union(&after_word.bbox);
                        }
                    }
                }
            }
            anchors.push(anchor);
        } else if ANCHOR_KEYWORDS.contains(&token.as_str()) {
            anchors.push(word.bbox);
        }
    }
    anchors
}

fn is_model_continuation(token: &str) -> bool {
    ANCHOR_SUFFIXES.contains(&token) || token.starts_with("NO") || token.starts_with("NUMBER")
}

/// Normalised words whose top edge falls within [`BELOW_ANCHOR_MAX_DY`] under
/// the anchor and whose horizontal extent fits the slack window.
pub fn words_below_anchor(words: &[PositionedWord], anchor: &BoundingBox) -> Vec<IdentifierKey> {
    let x_min = anchor.left - ANCHOR_LEFT_SLACK;
    let x_max = anchor.right + ANCHOR_RIGHT_SLACK;
    let y_min = anchor.bottom;
    let y_max = anchor.bottom + BELOW_ANCHOR_MAX_DY;

    words
        .iter()
        .filter(|w| {
            let b = &w.bbox;
            b.top >= y_min && b.top <= y_max && b.left >= x_min && b.right <= x_max
        })
        .map(|w| normalize(&w.text))
        .filter(|key| key.len() >= MIN_POSITIONAL_LEN)
        .collect()
}

/// Union of [`words_below_anchor`] over every anchor on the page.
pub fn keys_below_model_anchors(words: &[PositionedWord]) -> BTreeSet<IdentifierKey> {
    find_model_anchors(words)
        .iter()
        .flat_map(|anchor| words_below_anchor(words, anchor))
        .collect()
}
