//! One splitting run, in memory: extraction, assignment and bundling.

use log::{debug, info, warn};
use serde::Serialize;

use order_splitter_core::prelude::*;
use order_splitter_core::report::{summary_rows, unmatched_rows};

use crate::prelude::*;

/// A named input document.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A source document that could not be opened. Its pages are skipped.
#[derive(Debug, Clone, Serialize)]
pub struct FailedDocument {
    pub source_index: usize,
    pub name: String,
    pub error: String,
}

/// A vendor's output document.
#[derive(Debug, Clone, Serialize)]
pub struct BundleDocument {
    pub vendor: String,
    pub page_count: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub store: Store,
    pub assignments: Vec<PageAssignment>,
    pub unmatched: Vec<UnmatchedPageRecord>,
    pub failed: Vec<FailedDocument>,
    pub bundles: Vec<BundleDocument>,
}

impl RunOutput {
    pub fn assigned_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched.len()
    }

    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        summary_rows(&self.assignments)
    }

    /// Unmatched pages followed by unreadable documents.
    pub fn unmatched_rows(&self) -> Vec<UnmatchedRow> {
        let mut rows = unmatched_rows(&self.unmatched);
        rows.extend(
            self.failed
                .iter()
                .map(|f| UnmatchedRow::unreadable_document(self.store, &f.name, &f.error)),
        );
        rows
    }
}

/// Run the whole pipeline over `documents` with the SKU map in `sku_map`.
///
/// Only a bad SKU map aborts the run. Unreadable documents are recorded in
/// [`RunOutput::failed`] and the remaining documents still process.
pub fn process_run(store: Store, documents: &[SourceDocument], sku_map: &[u8]) -> Result<RunOutput> {
    let lookup = VendorLookupTable::from_xlsx_bytes(sku_map)?;
    let profile = store.profile();

    let mut pages = Vec::new();
    let mut failed = Vec::new();
    for (source_index, doc) in documents.iter().enumerate() {
        let parsed = match pdf::PdfDocument::from_bytes(&doc.bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("skipping {}: {e}", doc.name);
                failed.push(FailedDocument {
                    source_index,
                    name: doc.name.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        debug!("{}: {} pages", doc.name, parsed.page_count());
        for page in parsed.pages() {
            let candidates = extract(&page.text, profile, &page.words);
            debug!("{} p{}: {} candidates", doc.name, page.index, candidates.len());
            pages.push(PageCandidates {
                page: PageRef {
                    source_index,
                    page_index: page.index,
                },
                source_name: doc.name.clone(),
                candidates,
            });
        }
    }

    let outcome = assign(store, &lookup, pages);

    let sources: Vec<&[u8]> = documents.iter().map(|d| d.bytes.as_slice()).collect();
    let mut bundles = Vec::new();
    for bundle in group_by_vendor(&outcome.assignments) {
        let bytes = pdf::build_bundle(&sources, &bundle.pages)
            .wrap_err_with(|| format!("Failed to build the PDF for vendor {}", bundle.vendor))?;
        info!("{}: {} pages", bundle.vendor, bundle.pages.len());
        bundles.push(BundleDocument {
            vendor: bundle.vendor,
            page_count: bundle.pages.len(),
            bytes,
        });
    }

    Ok(RunOutput {
        store,
        assignments: outcome.assignments,
        unmatched: outcome.unmatched,
        failed,
        bundles,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use rust_xlsxwriter::Workbook;

    /// One PDF page per entry; each page is a list of `(x, y, text)` runs.
    pub fn pdf(pages: &[&[(f32, f32, &str)]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids = Vec::new();
        for runs in pages {
            let mut operations = Vec::new();
            for &(x, y, text) in runs.iter() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(10)],
                ));
                operations.push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// A SKU map workbook with `Vendor` and `SKU` columns.
    pub fn sku_map(rows: &[(&str, &str)]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Vendor").unwrap();
        sheet.write_string(0, 1, "SKU").unwrap();
        for (i, (vendor, sku)) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, *vendor).unwrap();
            sheet.write_string(row, 1, *sku).unwrap();
        }
        workbook.save_to_buffer().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, bytes: Vec<u8>) -> SourceDocument {
        SourceDocument {
            name: name.to_string(),
            bytes,
        }
    }

    #[test]
    fn test_two_documents_one_matched_one_unmatched() {
        let a = fixtures::pdf(&[&[(72.0, 700.0, "Model # XYZ999")]]);
        let b = fixtures::pdf(&[&[(72.0, 700.0, "Ship to: 42 Main Street")]]);
        let sku_map = fixtures::sku_map(&[("Acme", "XYZ999")]);

        let run = process_run(
            Store::HomeDepot,
            &[doc("a.pdf", a), doc("b.pdf", b)],
            &sku_map,
        )
        .unwrap();

        assert_eq!(run.assignments.len(), 2);
        assert_eq!(run.assignments[0].vendor, "Acme");
        assert_eq!(run.assignments[0].decision, Decision::MajoritySku);
        assert_eq!(run.assignments[1].vendor, UNASSIGNED_VENDOR);
        assert_eq!(run.assignments[1].decision, Decision::NoMatch);

        assert_eq!(run.unmatched.len(), 1);
        assert_eq!(run.unmatched[0].source_name, "b.pdf");
        assert_eq!(run.unmatched[0].reason, NO_MATCH_REASON);

        assert_eq!(run.bundles.len(), 1);
        assert_eq!(run.bundles[0].vendor, "Acme");
        assert_eq!(run.bundles[0].page_count, 1);
        let pages = pdf::extract_pages(&run.bundles[0].bytes).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "Model # XYZ999");
    }

    #[test]
    fn test_value_below_model_anchor_is_matched() {
        // The identifier sits on its own line under a column header.
        let a = fixtures::pdf(&[&[
            (72.0, 700.0, "Model"),
            (300.0, 700.0, "Qty"),
            (72.0, 660.0, "HD9981"),
        ]]);
        let sku_map = fixtures::sku_map(&[("Globex", "HD9981")]);

        let run = process_run(Store::HomeDepot, &[doc("a.pdf", a)], &sku_map).unwrap();
        assert_eq!(run.assignments[0].vendor, "Globex");
    }

    #[test]
    fn test_bundles_follow_vendor_first_appearance() {
        let a = fixtures::pdf(&[
            &[(72.0, 700.0, "SKU: Z-100")],
            &[(72.0, 700.0, "SKU: A-100")],
            &[(72.0, 700.0, "SKU: Z-200")],
        ]);
        let sku_map =
            fixtures::sku_map(&[("Zeta", "Z-100"), ("Zeta", "Z-200"), ("Acme", "A-100")]);

        let run = process_run(Store::Lowes, &[doc("a.pdf", a)], &sku_map).unwrap();

        let vendors: Vec<&str> = run.bundles.iter().map(|b| b.vendor.as_str()).collect();
        assert_eq!(vendors, vec!["Zeta", "Acme"]);
        let zeta = pdf::extract_pages(&run.bundles[0].bytes).unwrap();
        let texts: Vec<&str> = zeta.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["SKU: Z-100", "SKU: Z-200"]);
    }

    #[test]
    fn test_unreadable_document_is_skipped_and_reported() {
        let good = fixtures::pdf(&[&[(72.0, 700.0, "Item # 5550")]]);
        let sku_map = fixtures::sku_map(&[("Acme", "5550")]);

        let run = process_run(
            Store::TractorSupply,
            &[doc("broken.pdf", b"not a pdf".to_vec()), doc("good.pdf", good)],
            &sku_map,
        )
        .unwrap();

        assert_eq!(run.failed.len(), 1);
        assert_eq!(run.failed[0].name, "broken.pdf");
        assert_eq!(run.assignments.len(), 1);
        assert_eq!(run.assignments[0].source_index, 1);
        assert_eq!(run.bundles.len(), 1);

        let rows = run.unmatched_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source_pdf, "broken.pdf");
        assert_eq!(rows[0].page_index, None);
    }

    #[test]
    fn test_bad_sku_map_aborts_the_run() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Supplier").unwrap();
        sheet.write_string(0, 1, "SKU").unwrap();
        let sku_map = workbook.save_to_buffer().unwrap();
        let a = fixtures::pdf(&[&[(72.0, 700.0, "SKU 1")]]);

        let err = process_run(Store::HomeDepot, &[doc("a.pdf", a)], &sku_map).unwrap_err();
        assert!(err.to_string().contains("vendor columns"));
    }

    #[test]
    fn test_no_match_anywhere_builds_no_bundles() {
        let a = fixtures::pdf(&[&[(72.0, 700.0, "Thank you for your order")]]);
        let sku_map = fixtures::sku_map(&[("Acme", "XYZ999")]);

        let run = process_run(Store::HomeDepot, &[doc("a.pdf", a)], &sku_map).unwrap();
        assert!(run.bundles.is_empty());
        assert_eq!(run.unmatched_count(), 1);
        assert_eq!(run.assigned_count(), 1);
    }

    #[test]
    fn test_zero_page_document_contributes_nothing() {
        let empty = fixtures::pdf(&[]);
        assert_eq!(pdf::PdfDocument::from_bytes(&empty).unwrap().page_count(), 0);
        let sku_map = fixtures::sku_map(&[("Acme", "XYZ999")]);

        let run =
            process_run(Store::HomeDepot, &[doc("empty.pdf", empty.clone())], &sku_map).unwrap();
        assert!(run.assignments.is_empty());
        assert!(run.unmatched.is_empty());
        assert!(run.failed.is_empty());
        assert!(run.bundles.is_empty());

        let b = fixtures::pdf(&[&[(72.0, 700.0, "Model # XYZ999")]]);
        let run = process_run(
            Store::HomeDepot,
            &[doc("empty.pdf", empty), doc("b.pdf", b)],
            &sku_map,
        )
        .unwrap();
        assert_eq!(run.assigned_count(), 1);
        assert_eq!(run.assignments[0].source_index, 1);
        assert_eq!(run.bundles.len(), 1);
        assert_eq!(run.bundles[0].page_count, 1);
    }
}
