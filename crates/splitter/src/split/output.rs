//! The run directory on disk.
//!
//! ```text
//! <root>/<YYYY-MM-DD_HH-MM-SS>/<Store_Name>/
//!     <store> <M-D-YYYY> order page bundle <vendor>.pdf
//!     summary.csv
//!     unmatched_or_errors.csv
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, TimeZone};
use log::info;
use serde::Serialize;

use order_splitter_core::bundle::{store_dir_name, unique_bundle_file_names};
use order_splitter_core::report::{SUMMARY_HEADERS, UNMATCHED_HEADERS};

use super::run::RunOutput;
use crate::prelude::*;

pub const SUMMARY_FILE: &str = "summary.csv";
pub const UNMATCHED_FILE: &str = "unmatched_or_errors.csv";

/// Paths written for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunFiles {
    pub run_dir: PathBuf,
    pub store_dir: PathBuf,
    pub vendor_files: Vec<PathBuf>,
    pub summary_csv: PathBuf,
    pub unmatched_csv: PathBuf,
}

/// `2025-08-11_15-25-06`
pub fn run_dir_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// `8-11-2025`: month and day without leading zeros.
pub fn bundle_date_label<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!("{}-{}-{}", at.month(), at.day(), at.year())
}

/// Write vendor PDFs and both reports under `root`.
pub fn write_run<Tz: TimeZone>(root: &Path, at: &DateTime<Tz>, run: &RunOutput) -> Result<RunFiles>
where
    Tz::Offset: std::fmt::Display,
{
    let run_dir = root.join(run_dir_name(at));
    let store_dir = run_dir.join(store_dir_name(run.store));
    std::fs::create_dir_all(&store_dir).map_err(|e| output_error(&store_dir, e))?;

    let names = unique_bundle_file_names(
        run.store,
        &bundle_date_label(at),
        run.bundles.iter().map(|b| b.vendor.as_str()),
    );
    let mut vendor_files = Vec::with_capacity(run.bundles.len());
    for (bundle, name) in run.bundles.iter().zip(names) {
        let path = store_dir.join(name);
        write_file(&path, &bundle.bytes)?;
        info!("wrote {}", path.display());
        vendor_files.push(path);
    }

    let summary = std::iter::once(SUMMARY_HEADERS.map(String::from))
        .chain(run.summary_rows().into_iter().map(|r| r.cells()));
    let summary_csv = store_dir.join(SUMMARY_FILE);
    write_file(&summary_csv, &csv_bytes(summary)?)?;

    let unmatched = std::iter::once(UNMATCHED_HEADERS.map(String::from))
        .chain(run.unmatched_rows().into_iter().map(|r| r.cells()));
    let unmatched_csv = store_dir.join(UNMATCHED_FILE);
    write_file(&unmatched_csv, &csv_bytes(unmatched)?)?;

    Ok(RunFiles {
        run_dir,
        store_dir,
        vendor_files,
        summary_csv,
        unmatched_csv,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| output_error(path, e))?;
    Ok(())
}

fn output_error(path: &Path, e: std::io::Error) -> Error {
    Error::Output {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::super::run::{fixtures, process_run, SourceDocument};
    use super::*;
    use order_splitter_core::store::Store;

    fn at() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2025, 8, 1)
            .unwrap()
            .and_hms_opt(9, 5, 3)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_names_from_timestamp() {
        assert_eq!(run_dir_name(&at()), "2025-08-01_09-05-03");
        assert_eq!(bundle_date_label(&at()), "8-1-2025");
    }

    #[test]
    fn test_write_run_lays_out_store_directory() {
        let a = fixtures::pdf(&[
            &[(72.0, 700.0, "Model # XYZ999")],
            &[(72.0, 700.0, "Gift receipt")],
        ]);
        let sku_map = fixtures::sku_map(&[("Acme/West", "XYZ999")]);
        let run = process_run(
            Store::HomeDepot,
            &[SourceDocument {
                name: "slips.pdf".to_string(),
                bytes: a,
            }],
            &sku_map,
        )
        .unwrap();

        let root = tempfile::tempdir().unwrap();
        let files = write_run(root.path(), &at(), &run).unwrap();

        let store_dir = root.path().join("2025-08-01_09-05-03").join("Home_Depot");
        assert_eq!(files.store_dir, store_dir);
        assert_eq!(
            files.vendor_files,
            vec![store_dir.join("Home Depot 8-1-2025 order page bundle Acme_West.pdf")]
        );
        assert!(files.vendor_files[0].is_file());

        let summary = std::fs::read_to_string(&files.summary_csv).unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(
            lines[0],
            "Store,Vendor,Source PDF,Page Index (0-based),Matched SKUs,Decision,Notes"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Home Depot,Acme/West,slips.pdf,0,XYZ999,majority-sku"));
        assert!(lines[2].starts_with("Home Depot,Unassigned,slips.pdf,1,,no-match"));

        let unmatched = std::fs::read_to_string(&files.unmatched_csv).unwrap();
        let lines: Vec<&str> = unmatched.lines().collect();
        assert_eq!(
            lines[0],
            "Store,Source PDF,Page Index (0-based),Found Candidates,Reason,Notes"
        );
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("No candidates matched SKU map"));
    }

    #[test]
    fn test_vendors_with_clashing_file_names_both_written() {
        let a = fixtures::pdf(&[
            &[(72.0, 700.0, "SKU: AAA1")],
            &[(72.0, 700.0, "SKU: BBB2")],
        ]);
        let sku_map = fixtures::sku_map(&[("Acme/West", "AAA1"), ("Acme:West", "BBB2")]);
        let run = process_run(
            Store::Lowes,
            &[SourceDocument {
                name: "slips.pdf".to_string(),
                bytes: a,
            }],
            &sku_map,
        )
        .unwrap();
        assert_eq!(run.bundles.len(), 2);

        let root = tempfile::tempdir().unwrap();
        let files = write_run(root.path(), &at(), &run).unwrap();

        assert_eq!(files.vendor_files.len(), 2);
        assert_ne!(files.vendor_files[0], files.vendor_files[1]);
        assert!(files.vendor_files[1]
            .ends_with("Lowe's 8-1-2025 order page bundle Acme_West (2).pdf"));

        let pdfs = std::fs::read_dir(&files.store_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "pdf"))
            .count();
        assert_eq!(pdfs, 2);

        let second = pdf::extract_pages(&std::fs::read(&files.vendor_files[1]).unwrap()).unwrap();
        assert_eq!(second[0].text, "SKU: BBB2");
    }

    #[test]
    fn test_empty_reports_still_have_headers() {
        let run = RunOutput {
            store: Store::Lowes,
            assignments: Vec::new(),
            unmatched: Vec::new(),
            failed: Vec::new(),
            bundles: Vec::new(),
        };
        let root = tempfile::tempdir().unwrap();
        let files = write_run(root.path(), &at(), &run).unwrap();

        assert!(files.vendor_files.is_empty());
        let unmatched = std::fs::read_to_string(&files.unmatched_csv).unwrap();
        assert_eq!(unmatched.lines().count(), 1);
    }
}
