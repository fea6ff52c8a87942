//! Report rows for a run.
//!
//! Rows are plain string records in column order so any renderer (terminal
//! table, CSV, JSON) can consume them without knowing the engine types.

use serde::{Deserialize, Serialize};

use crate::assign::{PageAssignment, UnmatchedPageRecord};
use crate::normalize::IdentifierKey;
use crate::store::Store;

pub const SUMMARY_HEADERS: [&str; 7] = [
    "Store",
    "Vendor",
    "Source PDF",
    "Page Index (0-based)",
    "Matched SKUs",
    "Decision",
    "Notes",
];

pub const UNMATCHED_HEADERS: [&str; 6] = [
    "Store",
    "Source PDF",
    "Page Index (0-based)",
    "Found Candidates",
    "Reason",
    "Notes",
];

/// Reason recorded for a source document that could not be opened.
pub const UNREADABLE_DOCUMENT_REASON: &str = "Could not read PDF";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub store: String,
    pub vendor: String,
    pub source_pdf: String,
    pub page_index: usize,
    pub matched_skus: String,
    pub decision: String,
    pub notes: String,
}

impl SummaryRow {
    pub fn cells(&self) -> [String; 7] {
        [
            self.store.clone(),
            self.vendor.clone(),
            self.source_pdf.clone(),
            self.page_index.to_string(),
            self.matched_skus.clone(),
            self.decision.clone(),
            self.notes.clone(),
        ]
    }
}

impl From<&PageAssignment> for SummaryRow {
    fn from(a: &PageAssignment) -> Self {
        SummaryRow {
            store: a.store.to_string(),
            vendor: a.vendor.clone(),
            source_pdf: a.source_name.clone(),
            page_index: a.page_index,
            matched_skus: join_keys(&a.matched_keys),
            decision: a.decision.to_string(),
            notes: a.notes.clone(),
        }
    }
}

/// A row of the unmatched/errors report. `page_index` is empty for
/// document-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedRow {
    pub store: String,
    pub source_pdf: String,
    pub page_index: Option<usize>,
    pub found_candidates: String,
    pub reason: String,
    pub notes: String,
}

impl UnmatchedRow {
    /// Row for a source document that failed to load.
    pub fn unreadable_document(store: Store, source_pdf: &str, error: &str) -> Self {
        UnmatchedRow {
            store: store.to_string(),
            source_pdf: source_pdf.to_string(),
            page_index: None,
            found_candidates: String::new(),
            reason: UNREADABLE_DOCUMENT_REASON.to_string(),
            notes: error.to_string(),
        }
    }

    pub fn cells(&self) -> [String; 6] {
        [
            self.store.clone(),
            self.source_pdf.clone(),
            self.page_index.map(|i| i.to_string()).unwrap_or_default(),
            self.found_candidates.clone(),
            self.reason.clone(),
            self.notes.clone(),
        ]
    }
}

impl From<&UnmatchedPageRecord> for UnmatchedRow {
    fn from(u: &UnmatchedPageRecord) -> Self {
        UnmatchedRow {
            store: u.store.to_string(),
            source_pdf: u.source_name.clone(),
            page_index: Some(u.page_index),
            found_candidates: join_keys(&u.candidates),
            reason: u.reason.clone(),
            notes: u.notes.clone(),
        }
    }
}

pub fn summary_rows(assignments: &[PageAssignment]) -> Vec<SummaryRow> {
    assignments.iter().map(SummaryRow::from).collect()
}

pub fn unmatched_rows(unmatched: &[UnmatchedPageRecord]) -> Vec<UnmatchedRow> {
    unmatched.iter().map(UnmatchedRow::from).collect()
}

fn join_keys(keys: &[IdentifierKey]) -> String {
    keys.iter()
        .map(IdentifierKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
