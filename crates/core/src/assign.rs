//! Page → vendor decisions.
//!
//! For every page the candidate set is narrowed to identifiers the lookup
//! table knows, each survivor votes for its vendor, and the vendor with the
//! most votes wins. Ties go to the lexicographically smallest vendor name so
//! the same inputs always split the same way. A page nobody claims is
//! assigned to [`UNASSIGNED_VENDOR`] and reported for triage; that is a normal
//! outcome, not an error.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::candidates::PageCandidateSet;
use crate::lookup::VendorLookupTable;
use crate::normalize::IdentifierKey;
use crate::store::Store;

/// Sentinel vendor for pages with no known identifier.
pub const UNASSIGNED_VENDOR: &str = "Unassigned";

/// Reason recorded on every unmatched page.
pub const NO_MATCH_REASON: &str = "No candidates matched SKU map";

/// How many candidates an unmatched page lists for a human to look at.
pub const TRIAGE_CANDIDATE_LIMIT: usize = 10;

/// Why a page went to its vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "majority-sku")]
    MajoritySku,
    #[serde(rename = "no-match")]
    NoMatch,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::MajoritySku => "majority-sku",
            Decision::NoMatch => "no-match",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a page came from: the source document's position in the run's
/// input list and its 0-based page index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageRef {
    pub source_index: usize,
    pub page_index: usize,
}

/// Candidates found on one page, ready for [`assign`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageCandidates {
    pub page: PageRef,
    pub source_name: String,
    pub candidates: PageCandidateSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAssignment {
    pub store: Store,
    pub source_index: usize,
    pub source_name: String,
    pub page_index: usize,
    /// Known identifiers on the page that resolved to a vendor.
    pub matched_keys: Vec<IdentifierKey>,
    pub vendor: String,
    pub decision: Decision,
    pub notes: String,
}

impl PageAssignment {
    pub fn page_ref(&self) -> PageRef {
        PageRef {
            source_index: self.source_index,
            page_index: self.page_index,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.decision != Decision::NoMatch
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedPageRecord {
    pub store: Store,
    pub source_index: usize,
    pub source_name: String,
    pub page_index: usize,
    /// Every candidate found on the page, in key order.
    pub candidates: Vec<IdentifierKey>,
    pub reason: String,
    pub notes: String,
}

impl UnmatchedPageRecord {
    /// The first [`TRIAGE_CANDIDATE_LIMIT`] candidates.
    pub fn triage_candidates(&self) -> &[IdentifierKey] {
        let n = self.candidates.len().min(TRIAGE_CANDIDATE_LIMIT);
        &self.candidates[..n]
    }
}

/// Everything [`assign`] decided for a run, in input page order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    pub assignments: Vec<PageAssignment>,
    pub unmatched: Vec<UnmatchedPageRecord>,
}

/// Decide a vendor for every page.
///
/// Produces exactly one [`PageAssignment`] per input page, in input order,
/// and one [`UnmatchedPageRecord`] per page that no vendor claims.
pub fn assign<I>(store: Store, lookup: &VendorLookupTable, pages: I) -> AssignmentOutcome
where
    I: IntoIterator<Item = PageCandidates>,
{
    let mut outcome = AssignmentOutcome::default();

    for page in pages {
        let (assignment, unmatched) = assign_page(store, lookup, page);
        debug!(
            "{} p{}: {} -> {} ({})",
            assignment.source_name,
            assignment.page_index,
            assignment
                .matched_keys
                .iter()
                .map(IdentifierKey::as_str)
                .collect::<Vec<_>>()
                .join(","),
            assignment.vendor,
            assignment.decision
        );
        outcome.assignments.push(assignment);
        outcome.unmatched.extend(unmatched);
    }

    outcome
}

fn assign_page(
    store: Store,
    lookup: &VendorLookupTable,
    page: PageCandidates,
) -> (PageAssignment, Option<UnmatchedPageRecord>) {
    let known: Vec<&IdentifierKey> = page
        .candidates
        .iter()
        .filter(|key| lookup.contains(key))
        .collect();
    // With nothing known, keep the raw candidates around for the report.
    let considered: Vec<&IdentifierKey> = if known.is_empty() {
        page.candidates.iter().collect()
    } else {
        known
    };

    let mut matched_keys = Vec::new();
    let mut votes: Vec<&str> = Vec::new();
    for key in considered {
        if let Some(vendor) = lookup.vendor_for(key) {
            matched_keys.push(key.clone());
            votes.push(vendor);
        }
    }

    match majority_vendor(&votes) {
        Some(vendor) => {
            let assignment = PageAssignment {
                store,
                source_index: page.page.source_index,
                source_name: page.source_name,
                page_index: page.page.page_index,
                matched_keys,
                vendor: vendor.to_string(),
                decision: Decision::MajoritySku,
                notes: String::new(),
            };
            (assignment, None)
        }
        None => {
            let candidates: Vec<IdentifierKey> = page.candidates.into_iter().collect();
            let notes = format!(
                "No vendor match; candidates seen: {}",
                candidates
                    .iter()
                    .take(TRIAGE_CANDIDATE_LIMIT)
                    .map(IdentifierKey::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            let assignment = PageAssignment {
                store,
                source_index: page.page.source_index,
                source_name: page.source_name.clone(),
                page_index: page.page.page_index,
                matched_keys,
                vendor: UNASSIGNED_VENDOR.to_string(),
                decision: Decision::NoMatch,
                notes: notes.clone(),
            };
            let unmatched = UnmatchedPageRecord {
                store,
                source_index: page.page.source_index,
                source_name: page.source_name,
                page_index: page.page.page_index,
                candidates,
                reason: NO_MATCH_REASON.to_string(),
                notes,
            };
            (assignment, Some(unmatched))
        }
    }
}

/// Most frequent vendor; ties resolve to the smallest name.
pub fn majority_vendor<'a>(votes: &[&'a str]) -> Option<&'a str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for vendor in votes {
        *counts.entry(vendor).or_insert(0) += 1;
    }

    // BTreeMap iterates in ascending name order, so keeping only strictly
    // larger counts leaves the smallest name among the leaders.
    let mut best: Option<(&str, usize)> = None;
    for (vendor, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((vendor, count));
        }
    }
    best.map(|(vendor, _)| vendor)
}
