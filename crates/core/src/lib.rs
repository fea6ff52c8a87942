//! Core library for order-splitter
//!
//! This crate implements the **Functional Core** of the order-splitter
//! application, following the Functional Core - Imperative Shell pattern.
//!
//! # Architecture Overview
//!
//! - **`order_splitter_core`** (this crate): identifier matching and page
//!   assignment, with no file or PDF I/O
//! - **`pdf`**: page text/word extraction and page copying
//! - **`order-splitter`**: the CLI that reads inputs, drives a run and writes
//!   the run directory (the Imperative Shell)
//!
//! The only decoding done here is turning spreadsheet bytes into a [`sheet::Table`];
//! everything else is a pure function of its inputs.
//!
//! # Pipeline
//!
//! ```text
//! SKU map bytes ─▶ sheet::Table ─▶ lookup::VendorLookupTable ─┐
//!                                                              ▼
//! page text + words ─▶ candidates::extract ─▶ assign::assign ─▶ bundle::group_by_vendor
//!                                                  │
//!                                                  └─▶ report rows
//! ```
//!
//! # Module Organization
//!
//! - [`normalize`]: canonical form for product identifiers
//! - [`store`]: supported stores and their label pattern profiles
//! - [`sheet`]: spreadsheet decoding into a header + rows table
//! - [`lookup`]: identifier → vendor index
//! - [`candidates`]: candidate identifiers on a page (labels, layout, loose tokens)
//! - [`assign`]: majority vote per page, unmatched records
//! - [`bundle`]: per-vendor page grouping and output file naming
//! - [`report`]: summary and unmatched report rows
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use order_splitter_core::prelude::*;
//!
//! let lookup = VendorLookupTable::from_xlsx_bytes(&sheet_bytes)?;
//! let store = Store::Lowes;
//! let pages = vec![PageCandidates {
//!     page: PageRef { source_index: 0, page_index: 0 },
//!     source_name: "slips.pdf".to_string(),
//!     candidates: extract("Model # XYZ999", store.profile(), &[]),
//! }];
//!
//! let outcome = assign(store, &lookup, pages);
//! let bundles = group_by_vendor(&outcome.assignments);
//! ```

pub mod assign;
pub mod bundle;
pub mod candidates;
pub mod lookup;
pub mod normalize;
pub mod report;
pub mod sheet;
pub mod store;

/// Re-exports of the types most callers need.
pub mod prelude {
    pub use crate::assign::{
        assign, AssignmentOutcome, Decision, PageAssignment, PageCandidates, PageRef,
        UnmatchedPageRecord, NO_MATCH_REASON, UNASSIGNED_VENDOR,
    };
    pub use crate::bundle::{
        bundle_file_name, group_by_vendor, store_dir_name, unique_bundle_file_names, VendorBundle,
    };
    pub use crate::candidates::{
        extract, extract_traced, BoundingBox, CandidateSource, PageCandidateSet, PositionedWord,
    };
    pub use crate::lookup::{SchemaError, VendorLookupTable};
    pub use crate::normalize::{normalize, IdentifierKey};
    pub use crate::report::{SummaryRow, UnmatchedRow};
    pub use crate::sheet::{SheetError, Table};
    pub use crate::store::{Store, StoreProfile};
}
