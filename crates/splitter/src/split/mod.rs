use std::path::{Path, PathBuf};

use colored::Colorize;
use prettytable::row;

use order_splitter_core::store::Store;

use crate::prelude::{eprintln, println, *};

pub mod output;
pub mod run;

use output::RunFiles;
use run::{process_run, RunOutput, SourceDocument};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct SplitOptions {
    /// Store the packing slips come from (e.g. "Home Depot", "lowes", "tsc")
    #[arg(short, long, env = "ORDER_SPLITTER_STORE")]
    pub store: Store,

    /// Spreadsheet (.xlsx) mapping SKUs to vendors
    #[arg(long, value_name = "PATH")]
    pub sku_map: PathBuf,

    /// Directory that receives one timestamped folder per run
    #[arg(short, long, env = "ORDER_SPLITTER_RUNS_DIR", default_value = "runs")]
    pub out: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Packing-slip PDFs, processed in the given order
    #[arg(value_name = "PDF", required = true)]
    pub pdfs: Vec<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
struct SplitReport<'a> {
    store: Store,
    assigned: usize,
    unmatched: usize,
    files: &'a RunFiles,
    run: &'a RunOutput,
}

pub fn run(options: SplitOptions, global: crate::Global) -> Result<()> {
    if options.pdfs.is_empty() {
        return Err(Error::NoInputs.into());
    }

    let sku_map = read_input(&options.sku_map)?;
    let mut documents = Vec::with_capacity(options.pdfs.len());
    for path in &options.pdfs {
        documents.push(SourceDocument {
            name: display_name(path),
            bytes: read_input(path)?,
        });
    }

    if global.verbose {
        println!(
            "Processing {} PDF(s) for {}...",
            documents.len(),
            options.store
        );
    }

    let run = process_run(options.store, &documents, &sku_map)?;
    let files = output::write_run(&options.out, &chrono::Local::now(), &run)?;

    if options.json {
        let report = SplitReport {
            store: run.store,
            assigned: run.assigned_count(),
            unmatched: run.unmatched_count(),
            files: &files,
            run: &run,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report)
                .map_err(|e| eyre!("JSON serialization failed: {}", e))?
        );
    } else {
        output_formatted(&run, &files, global.verbose);
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        Error::Input {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// File name shown on reports; the full path when there is none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn output_formatted(run: &RunOutput, files: &RunFiles, verbose: bool) {
    println!(
        "Assigned {} pages. Unmatched pages: {}.",
        run.assigned_count().to_string().bright_green(),
        run.unmatched_count().to_string().bright_yellow()
    );

    for failed in &run.failed {
        eprintln!(
            "{} {}: {}",
            "Skipped".bright_red(),
            failed.name,
            failed.error
        );
    }

    let mut table = new_table();
    table.add_row(row![b -> "Vendor", b -> "Pages", b -> "File"]);
    for (bundle, path) in run.bundles.iter().zip(&files.vendor_files) {
        table.add_row(row![
            bundle.vendor.bright_cyan(),
            bundle.page_count,
            display_name(path)
        ]);
    }
    if !run.bundles.is_empty() {
        table.printstd();
    }

    println!("\n{} {}", "Run folder:".bold(), files.store_dir.display());
    println!("  {}", display_name(&files.summary_csv));
    println!("  {}", display_name(&files.unmatched_csv));

    if verbose {
        for row in run.unmatched_rows() {
            let page = row
                .page_index
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            println!(
                "{} {} p{}: {}",
                "unmatched".dimmed(),
                row.source_pdf,
                page,
                row.notes
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_formatted_with_skipped_document() {
        let good = run::fixtures::pdf(&[&[(72.0, 700.0, "Model # XYZ999")]]);
        let sku_map = run::fixtures::sku_map(&[("Acme", "XYZ999")]);
        let documents = [
            SourceDocument {
                name: "broken.pdf".to_string(),
                bytes: b"not a pdf".to_vec(),
            },
            SourceDocument {
                name: "good.pdf".to_string(),
                bytes: good,
            },
        ];
        let run = process_run(Store::HomeDepot, &documents, &sku_map).unwrap();
        assert_eq!(run.failed.len(), 1);

        let root = tempfile::tempdir().unwrap();
        let files = output::write_run(root.path(), &chrono::Local::now(), &run).unwrap();
        output_formatted(&run, &files, true);
        assert_eq!(files.vendor_files.len(), 1);
    }

    #[test]
    fn test_display_name_uses_file_name() {
        assert_eq!(display_name(Path::new("/tmp/in/slips.pdf")), "slips.pdf");
        assert_eq!(display_name(Path::new("/")), "/");
    }
}
