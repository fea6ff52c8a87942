//! Identifier → vendor index built from the SKU map spreadsheet.

use std::collections::{BTreeSet, HashMap};

use log::info;
use thiserror::Error;

use crate::normalize::{normalize, normalize_opt, IdentifierKey};
use crate::sheet::{SheetError, Table};

/// Header names accepted for the vendor column, in order of preference.
pub const VENDOR_COLUMNS: &[&str] = &["Vendor", "Vendor Name"];

/// Header names accepted as identifier columns. Every one present is used.
pub const IDENTIFIER_COLUMNS: &[&str] = &[
    "SKU",
    "Model",
    "Model #",
    "Model Number",
    "Item #",
    "Internet #",
    "UPC",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("SKU sheet must include one of the vendor columns: {}", .0.join(", "))]
    MissingVendorColumn(Vec<String>),
    #[error("SKU sheet must include at least one SKU-like column: {}", .0.join(", "))]
    MissingIdentifierColumn(Vec<String>),
}

/// Read-only mapping from [`IdentifierKey`] to vendor name.
///
/// When the same key appears on several rows the first row wins.
#[derive(Debug, Clone)]
pub struct VendorLookupTable {
    entries: HashMap<IdentifierKey, String>,
    vendor_column: String,
    identifier_columns: Vec<String>,
}

impl VendorLookupTable {
    /// Build the index from a decoded table.
    ///
    /// The vendor column is the first of `vendor_columns` present in the
    /// header; identifier columns are all of `identifier_columns` present,
    /// visited in that order for every row. Rows with a blank vendor are
    /// skipped, as are cells that normalise to an empty key.
    pub fn build(
        table: &Table,
        vendor_columns: &[&str],
        identifier_columns: &[&str],
    ) -> Result<Self, SchemaError> {
        let (vendor_column, vendor_idx) = vendor_columns
            .iter()
            .find_map(|name| table.column(name).map(|idx| (name.to_string(), idx)))
            .ok_or_else(|| SchemaError::MissingVendorColumn(owned(vendor_columns)))?;

        let id_columns: Vec<(String, usize)> = identifier_columns
            .iter()
            .filter_map(|name| table.column(name).map(|idx| (name.to_string(), idx)))
            .collect();
        if id_columns.is_empty() {
            return Err(SchemaError::MissingIdentifierColumn(owned(identifier_columns)));
        }

        let mut entries: HashMap<IdentifierKey, String> = HashMap::new();
        for row in 0..table.row_count() {
            let vendor = table.cell(row, vendor_idx).map(str::trim).unwrap_or("");
            if vendor.is_empty() {
                continue;
            }
            for (_, col) in &id_columns {
                let key = normalize_opt(table.cell(row, *col));
                if key.is_empty() {
                    continue;
                }
                entries.entry(key).or_insert_with(|| vendor.to_string());
            }
        }

        let identifier_columns: Vec<String> = id_columns.into_iter().map(|(name, _)| name).collect();
        info!(
            "SKU map: {} identifiers from vendor column '{}' and identifier columns [{}]",
            entries.len(),
            vendor_column,
            identifier_columns.join(", ")
        );

        Ok(VendorLookupTable {
            entries,
            vendor_column,
            identifier_columns,
        })
    }

    /// [`VendorLookupTable::build`] with the standard column candidates.
    pub fn from_table(table: &Table) -> Result<Self, SchemaError> {
        Self::build(table, VENDOR_COLUMNS, IDENTIFIER_COLUMNS)
    }

    /// Decode `.xlsx` bytes and build the index with the standard columns.
    pub fn from_xlsx_bytes(bytes: &[u8]) -> Result<Self, SheetError> {
        let table = Table::from_xlsx_bytes(bytes)?;
        Ok(Self::from_table(&table)?)
    }

    /// Vendor for a raw candidate string; the candidate is normalised first.
    pub fn find_vendor(&self, candidate: &str) -> Option<&str> {
        self.vendor_for(&normalize(candidate))
    }

    pub fn vendor_for(&self, key: &IdentifierKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &IdentifierKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn known_keys(&self) -> BTreeSet<IdentifierKey> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Header of the column vendor names were read from.
    pub fn vendor_column(&self) -> &str {
        &self.vendor_column
    }

    pub fn identifier_columns(&self) -> &[String] {
        &self.identifier_columns
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_strings(
            headers.iter().copied(),
            rows.iter().map(|r| r.iter().copied()),
        )
    }

    #[test]
    fn test_build_indexes_every_identifier_column() {
        let t = table(
            &["Vendor", "SKU", "Model #", "Notes"],
            &[&["Acme", "xyz-999", "A 100", "fragile"], &["Globex", "G7", "", ""]],
        );
        let lookup = VendorLookupTable::from_table(&t).unwrap();

        assert_eq!(lookup.len(), 3);
        assert_eq!(lookup.find_vendor("XYZ-999"), Some("Acme"));
        assert_eq!(lookup.find_vendor("a100"), Some("Acme"));
        assert_eq!(lookup.find_vendor("g7"), Some("Globex"));
        assert_eq!(lookup.find_vendor("fragile"), None);
        assert_eq!(lookup.vendor_column(), "Vendor");
        assert_eq!(lookup.identifier_columns(), ["SKU", "Model #"]);
    }

    #[test]
    fn test_first_row_wins_on_duplicate_key() {
        let t = table(
            &["Vendor", "SKU"],
            &[&["Acme", "DUP-1"], &["Globex", "dup-1"], &["Initech", "DUP 1"]],
        );
        let lookup = VendorLookupTable::from_table(&t).unwrap();
        assert_eq!(lookup.find_vendor("DUP-1"), Some("Acme"));
        // "DUP 1" normalises to a different key.
        assert_eq!(lookup.find_vendor("DUP1"), Some("Initech"));
    }

    #[test]
    fn test_earlier_row_wins_across_columns() {
        // The same key under two vendors via different columns: the earlier
        // row still wins regardless of which column it came from.
        let t = table(
            &["Vendor", "UPC", "SKU"],
            &[&["Acme", "", "K-1"], &["Globex", "K-1", ""]],
        );
        let lookup = VendorLookupTable::from_table(&t).unwrap();
        assert_eq!(lookup.find_vendor("K-1"), Some("Acme"));
    }

    #[test]
    fn test_blank_vendor_rows_are_skipped() {
        let t = table(&["Vendor", "SKU"], &[&["   ", "ORPHAN1"], &["Acme", "OWNED1"]]);
        let lookup = VendorLookupTable::from_table(&t).unwrap();
        assert_eq!(lookup.find_vendor("ORPHAN1"), None);
        assert_eq!(lookup.find_vendor("OWNED1"), Some("Acme"));
    }

    #[test]
    fn test_vendor_name_is_trimmed_and_cells_normalised() {
        let t = table(&["Vendor Name", "Item #"], &[&["  Acme Tools  ", "  ab/12_c "]]);
        let lookup = VendorLookupTable::from_table(&t).unwrap();
        assert_eq!(lookup.find_vendor("AB12C"), Some("Acme Tools"));
        assert_eq!(lookup.vendor_column(), "Vendor Name");
    }

    #[test]
    fn test_vendor_column_preference_order() {
        let t = table(&["Vendor Name", "Vendor", "SKU"], &[&["Long", "Short", "S1"]]);
        let lookup = VendorLookupTable::from_table(&t).unwrap();
        assert_eq!(lookup.find_vendor("S1"), Some("Short"));
    }

    #[test]
    fn test_empty_keys_never_match() {
        let t = table(&["Vendor", "SKU"], &[&["Acme", "#--#"], &["Globex", "..."]]);
        let lookup = VendorLookupTable::from_table(&t).unwrap();
        assert_eq!(lookup.find_vendor(""), None);
        assert_eq!(lookup.find_vendor("..."), None);
        assert_eq!(lookup.find_vendor("--"), Some("Acme"));
    }

    #[test]
    fn test_missing_vendor_column_is_schema_error() {
        let t = table(&["Supplier", "SKU"], &[&["Acme", "X1"]]);
        let err = VendorLookupTable::from_table(&t).unwrap_err();
        assert!(matches!(err, SchemaError::MissingVendorColumn(_)));
        assert!(err.to_string().contains("Vendor Name"));
    }

    #[test]
    fn test_missing_identifier_column_is_schema_error() {
        let t = table(&["Vendor", "Description"], &[&["Acme", "Widget"]]);
        let err = VendorLookupTable::from_table(&t).unwrap_err();
        assert!(matches!(err, SchemaError::MissingIdentifierColumn(_)));
        assert!(err.to_string().contains("Internet #"));
    }

    #[test]
    fn test_header_only_table_builds_empty_index() {
        let t = table(&["Vendor", "SKU"], &[]);
        let lookup = VendorLookupTable::from_table(&t).unwrap();
        assert!(lookup.is_empty());
        assert!(lookup.known_keys().is_empty());
    }

    #[test]
    fn test_known_keys_are_normalised() {
        let t = table(&["Vendor", "Model"], &[&["Acme", "hd-9981"], &["Acme", "b2"]]);
        let keys: Vec<String> = VendorLookupTable::from_table(&t)
            .unwrap()
            .known_keys()
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["B2", "HD-9981"]);
    }

    #[test]
    fn test_custom_column_candidates() {
        let t = table(&["Supplier", "Part"], &[&["Acme", "P-1"]]);
        let lookup = VendorLookupTable::build(&t, &["Supplier"], &["Part"]).unwrap();
        assert_eq!(lookup.find_vendor("p-1"), Some("Acme"));
    }
}
