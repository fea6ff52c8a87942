//! Grouping of assigned pages into per-vendor bundles.
//!
//! The page copying itself lives in the `pdf` crate; this module only decides
//! which pages go into which vendor's document and what the file is called.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::assign::{PageAssignment, PageRef};
use crate::store::Store;

/// Pages destined for one vendor's output document, in copy order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorBundle {
    pub vendor: String,
    pub pages: Vec<PageRef>,
}

/// Group assigned pages by vendor.
///
/// Bundles appear in the order their vendor is first seen; pages inside a
/// bundle keep assignment order. Unassigned pages are never bundled.
pub fn group_by_vendor(assignments: &[PageAssignment]) -> Vec<VendorBundle> {
    let mut bundles: Vec<VendorBundle> = Vec::new();
    for assignment in assignments.iter().filter(|a| a.is_assigned()) {
        match bundles.iter_mut().find(|b| b.vendor == assignment.vendor) {
            Some(bundle) => bundle.pages.push(assignment.page_ref()),
            None => bundles.push(VendorBundle {
                vendor: assignment.vendor.clone(),
                pages: vec![assignment.page_ref()],
            }),
        }
    }
    bundles
}

/// `"<store> <date> order page bundle <vendor>.pdf"`, safe to use as a file name.
pub fn bundle_file_name(store: Store, date_label: &str, vendor: &str) -> String {
    sanitize_file_component(&format!(
        "{} {} order page bundle {}.pdf",
        store.display_name(),
        date_label,
        vendor
    ))
}

/// [`bundle_file_name`] for each vendor, in order, with no two names equal
/// ignoring case. A later vendor whose name is already taken gets ` (2)`,
/// ` (3)`, ... before the extension.
pub fn unique_bundle_file_names<'a>(
    store: Store,
    date_label: &str,
    vendors: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    vendors
        .into_iter()
        .map(|vendor| {
            let base = bundle_file_name(store, date_label, vendor);
            let stem = base.strip_suffix(".pdf").unwrap_or(&base).to_string();
            let mut name = base.clone();
            let mut n = 2;
            while !taken.insert(name.to_lowercase()) {
                name = format!("{stem} ({n}).pdf");
                n += 1;
            }
            name
        })
        .collect()
}

/// Replace characters that are not allowed in file names on common
/// filesystems with `_`.
pub fn sanitize_file_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Directory name for a store inside a run: spaces become `_`.
pub fn store_dir_name(store: Store) -> String {
    sanitize_file_component(&store.display_name().replace(' ', "_"))
}
