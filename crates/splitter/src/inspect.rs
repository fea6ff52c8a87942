use std::collections::BTreeSet;
use std::path::PathBuf;

use colored::Colorize;

use order_splitter_core::prelude::*;

use crate::prelude::{println, *};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct InspectOptions {
    /// Store whose label patterns are applied
    #[arg(short, long, env = "ORDER_SPLITTER_STORE")]
    pub store: Store,

    /// Only show this page (0-based)
    #[arg(short, long)]
    pub page: Option<usize>,

    /// Resolve candidates against this SKU map
    #[arg(long, value_name = "PATH")]
    pub sku_map: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Packing-slip PDF to inspect
    #[arg(value_name = "PDF")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CandidateReport {
    pub key: IdentifierKey,
    pub sources: BTreeSet<CandidateSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PageReport {
    pub page_index: usize,
    pub word_count: usize,
    pub candidates: Vec<CandidateReport>,
}

pub fn run(options: InspectOptions, global: crate::Global) -> Result<()> {
    let bytes = std::fs::read(&options.path).map_err(|e| Error::Input {
        path: options.path.display().to_string(),
        reason: e.to_string(),
    })?;
    let lookup = match &options.sku_map {
        Some(path) => {
            let sheet = std::fs::read(path).map_err(|e| Error::Input {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            Some(VendorLookupTable::from_xlsx_bytes(&sheet)?)
        }
        None => None,
    };

    if global.verbose {
        if let Some(lookup) = &lookup {
            println!(
                "SKU map: {} identifiers, vendor column '{}'",
                lookup.len(),
                lookup.vendor_column()
            );
        }
    }

    let reports = inspect_pages(&bytes, options.store, options.page, lookup.as_ref())?;

    if options.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports)
                .map_err(|e| eyre!("JSON serialization failed: {}", e))?
        );
    } else {
        output_formatted(&reports, global.verbose);
    }

    Ok(())
}

/// Candidates for every page of a document, or for one page only.
pub fn inspect_pages(
    bytes: &[u8],
    store: Store,
    only: Option<usize>,
    lookup: Option<&VendorLookupTable>,
) -> Result<Vec<PageReport>> {
    let document = pdf::PdfDocument::from_bytes(bytes)?;
    let pages: Vec<_> = match only {
        Some(index) => vec![document.page(index).ok_or_else(|| {
            eyre!(
                "Page {} is out of range; the document has {} pages",
                index,
                document.page_count()
            )
        })?],
        None => document.pages().collect(),
    };

    let profile = store.profile();
    Ok(pages
        .into_iter()
        .map(|page| PageReport {
            page_index: page.index,
            word_count: page.words.len(),
            candidates: extract_traced(&page.text, profile, &page.words)
                .into_iter()
                .map(|(key, sources)| CandidateReport {
                    vendor: lookup.and_then(|l| l.vendor_for(&key)).map(String::from),
                    key,
                    sources,
                })
                .collect(),
        })
        .collect())
}

fn output_formatted(reports: &[PageReport], verbose: bool) {
    for report in reports {
        println!(
            "\n{} {} ({} candidates)",
            "Page".bold(),
            report.page_index.to_string().bold(),
            report.candidates.len()
        );
        if verbose {
            println!("  {} words", report.word_count);
        }
        for candidate in &report.candidates {
            let sources: Vec<String> = candidate
                .sources
                .iter()
                .map(|s| match s {
                    CandidateSource::Labeled => "labeled".to_string(),
                    CandidateSource::BelowModel => "below-model".to_string(),
                    CandidateSource::Loose => "loose".to_string(),
                })
                .collect();
            let padded = format!("{:<24}", candidate.key);
            let mut line = match &candidate.vendor {
                Some(vendor) => format!("  {} -> {}", padded.bright_green(), vendor.bright_cyan()),
                None => format!("  {padded}"),
            };
            line.push_str(&format!("  {}", sources.join(", ").dimmed()));
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::run::fixtures;

    #[test]
    fn test_inspect_reports_sources_per_candidate() {
        let bytes = fixtures::pdf(&[&[(72.0, 700.0, "Model"), (72.0, 660.0, "HD9981")]]);
        let reports = inspect_pages(&bytes, Store::HomeDepot, None, None).unwrap();

        assert_eq!(reports.len(), 1);
        let hd = reports[0]
            .candidates
            .iter()
            .find(|c| c.key.as_str() == "HD9981")
            .unwrap();
        assert!(hd.sources.contains(&CandidateSource::BelowModel));
        assert!(hd.sources.contains(&CandidateSource::Loose));
        assert_eq!(hd.vendor, None);
    }

    #[test]
    fn test_inspect_single_page_with_lookup() {
        let bytes = fixtures::pdf(&[
            &[(72.0, 700.0, "Thank you")],
            &[(72.0, 700.0, "Item # 5550")],
        ]);
        let sheet = fixtures::sku_map(&[("Acme", "5550")]);
        let lookup = VendorLookupTable::from_xlsx_bytes(&sheet).unwrap();

        let reports =
            inspect_pages(&bytes, Store::TractorSupply, Some(1), Some(&lookup)).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].page_index, 1);
        let hit = reports[0]
            .candidates
            .iter()
            .find(|c| c.key.as_str() == "5550")
            .unwrap();
        assert_eq!(hit.vendor.as_deref(), Some("Acme"));
        assert!(hit.sources.contains(&CandidateSource::Labeled));
    }

    #[test]
    fn test_inspect_page_out_of_range() {
        let bytes = fixtures::pdf(&[&[(72.0, 700.0, "Thank you")]]);
        let err = inspect_pages(&bytes, Store::Lowes, Some(3), None).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
