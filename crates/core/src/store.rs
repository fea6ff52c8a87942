//! Supported retail portals and their identifier pattern profiles.
//!
//! Each store prints product identifiers next to slightly different labels
//! ("Internet #" on Home Depot slips, "MFR #" on Lowe's, "Vendor SKU" on
//! Tractor Supply). A [`StoreProfile`] holds the compiled label patterns for
//! one store plus the loose fallback pattern shared by all of them.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Any alphanumeric/hyphen run of at least four characters.
const LOOSE_TOKEN_PATTERN: &str = r"\b([A-Za-z0-9][A-Za-z0-9-]{3,})\b";

const HOME_DEPOT_LABELS: &[&str] = &[
    "Model",
    "Model #",
    "Model No",
    "Model Number",
    "MODEL",
    "Internet #",
    "SKU",
    "SKU #",
    "SKU#",
    "Item #",
];

const LOWES_LABELS: &[&str] = &[
    "Model",
    "Model #",
    "Model No",
    "Model Number",
    "SKU",
    "SKU #",
    "SKU#",
    "Item #",
    "MFR #",
    "MFR No",
];

const TRACTOR_SUPPLY_LABELS: &[&str] = &[
    "Model",
    "Model #",
    "Model No",
    "Model Number",
    "SKU",
    "SKU #",
    "SKU#",
    "Item #",
    "Vendor SKU",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Store {
    #[serde(rename = "Home Depot")]
    HomeDepot,
    #[serde(rename = "Lowe's")]
    Lowes,
    #[serde(rename = "Tractor Supply")]
    TractorSupply,
}

impl Store {
    pub const ALL: [Store; 3] = [Store::HomeDepot, Store::Lowes, Store::TractorSupply];

    /// Name as shown on reports and output file names.
    pub fn display_name(&self) -> &'static str {
        match self {
            Store::HomeDepot => "Home Depot",
            Store::Lowes => "Lowe's",
            Store::TractorSupply => "Tractor Supply",
        }
    }

    /// Field labels whose values are captured as candidate identifiers.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            Store::HomeDepot => HOME_DEPOT_LABELS,
            Store::Lowes => LOWES_LABELS,
            Store::TractorSupply => TRACTOR_SUPPLY_LABELS,
        }
    }

    /// The compiled pattern profile for this store. Built once per process.
    pub fn profile(&self) -> &'static StoreProfile {
        static PROFILES: OnceLock<[StoreProfile; 3]> = OnceLock::new();
        let profiles = PROFILES.get_or_init(|| Store::ALL.map(StoreProfile::compile));
        match self {
            Store::HomeDepot => &profiles[0],
            Store::Lowes => &profiles[1],
            Store::TractorSupply => &profiles[2],
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Error)]
#[error("Unknown store '{0}' (expected one of: Home Depot, Lowe's, Tractor Supply)")]
pub struct StoreParseError(String);

impl FromStr for Store {
    type Err = StoreParseError;

    /// Accepts display names and short slugs, ignoring case and punctuation:
    /// `"Lowe's"`, `"lowes"`, `"home-depot"`, `"hd"`, `"TSC"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "homedepot" | "hd" | "thd" => Ok(Store::HomeDepot),
            "lowes" => Ok(Store::Lowes),
            "tractorsupply" | "tsc" => Ok(Store::TractorSupply),
            _ => Err(StoreParseError(s.to_string())),
        }
    }
}

/// A regular expression pairing a field label with a capture group for the
/// value printed after it.
#[derive(Debug)]
pub struct LabeledPattern {
    pub label: &'static str,
    pub regex: Regex,
}

impl LabeledPattern {
    /// `<label>`, optional `:` or `#`, then an identifier-shaped capture.
    /// Matching is case-insensitive.
    fn new(label: &'static str) -> Self {
        let pattern = format!(
            r"(?i){}\s*[:#]?\s*([A-Za-z0-9][A-Za-z0-9_-]+)",
            regex::escape(label)
        );
        LabeledPattern {
            label,
            regex: Regex::new(&pattern).unwrap(),
        }
    }
}

/// Immutable per-store pattern set used by the candidate extractor.
#[derive(Debug)]
pub struct StoreProfile {
    pub store: Store,
    /// Tried in order; every match of every pattern contributes.
    pub labeled: Vec<LabeledPattern>,
    /// Low-precision fallback patterns, capture group 1 is the token.
    pub loose: Vec<Regex>,
}

impl StoreProfile {
    fn compile(store: Store) -> Self {
        StoreProfile {
            store,
            labeled: store.labels().iter().copied().map(LabeledPattern::new).collect(),
            loose: vec![Regex::new(LOOSE_TOKEN_PATTERN).unwrap()],
        }
    }
}
