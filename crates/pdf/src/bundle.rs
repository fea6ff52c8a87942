//! Copying pages from source documents into a new PDF.

use std::collections::BTreeMap;

use log::debug;
use lopdf::{dictionary, Document, Object, ObjectId};

use order_splitter_core::assign::PageRef;

use crate::PdfError;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains.
const MAX_TREE_DEPTH: usize = 64;

/// Build a document holding exactly `pages`, in order.
///
/// `sources[i]` is the bytes of the document `PageRef::source_index == i`
/// refers to. Each page keeps its content streams and resources; inherited
/// attributes are copied onto the page so it renders the same outside its
/// original page tree.
pub fn build_bundle(sources: &[&[u8]], pages: &[PageRef]) -> Result<Vec<u8>, PdfError> {
    let mut output = Document::with_version("1.5");
    let pages_id = output.new_object_id();

    // Source index -> (1-based page number -> renumbered page object id).
    let mut imported: BTreeMap<usize, BTreeMap<u32, ObjectId>> = BTreeMap::new();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page in pages {
        if !imported.contains_key(&page.source_index) {
            let bytes = sources
                .get(page.source_index)
                .ok_or(PdfError::SourceNotFound(page.source_index))?;
            let page_map = import_source(&mut output, bytes)?;
            imported.insert(page.source_index, page_map);
        }

        let page_id = imported
            .get(&page.source_index)
            .and_then(|map| map.get(&(page.page_index as u32 + 1)))
            .copied()
            .ok_or(PdfError::PageNotFound {
                source_index: page.source_index,
                page_index: page.page_index,
            })?;

        output
            .get_dictionary_mut(page_id)?
            .set("Parent", Object::Reference(pages_id));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    output.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = output.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    output.trailer.set("Root", catalog_id);

    // Drops the source catalogs, page trees and unselected pages.
    output.prune_objects();
    output.renumber_objects();
    output.compress();

    let mut buf = Vec::new();
    output.save_to(&mut buf)?;
    debug!("bundle: {} pages, {} bytes", count, buf.len());
    Ok(buf)
}

/// Move every object of `bytes` into `output` under fresh ids and return the
/// source's page map in the new numbering.
fn import_source(output: &mut Document, bytes: &[u8]) -> Result<BTreeMap<u32, ObjectId>, PdfError> {
    let mut doc = Document::load_mem(bytes)?;
    if doc.is_encrypted() {
        return Err(PdfError::Encrypted);
    }

    doc.renumber_objects_with(output.max_id + 1);
    let page_map = doc.get_pages();
    for &page_id in page_map.values() {
        materialize_inherited(&mut doc, page_id)?;
    }

    output.max_id = output.max_id.max(doc.max_id);
    output.objects.extend(doc.objects);
    Ok(page_map)
}

fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<(), PdfError> {
    let page = doc.get_dictionary(page_id)?;
    let inherited: Vec<(&[u8], Object)> = INHERITABLE
        .iter()
        .filter(|key| !page.has(key))
        .filter_map(|key| inherited_value(doc, page, key).map(|value| (*key, value)))
        .collect();

    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    Ok(())
}

fn inherited_value(doc: &Document, page: &lopdf::Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}
