use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use order_splitter_core::candidates::PositionedWord;

use parser::backend::{LopdfBackend, PageId, PdfBackend};

pub mod bundle;
pub mod parser;

pub use bundle::build_bundle;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Page {page_index} not found in source document {source_index}")]
    PageNotFound {
        source_index: usize,
        page_index: usize,
    },
    #[error("Source document {0} not found")]
    SourceNotFound(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for PdfError {
    fn from(e: lopdf::Error) -> Self {
        PdfError::Parse(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Text and word boxes of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// 0-based position in the document.
    pub index: usize,
    /// Visual lines, top to bottom, joined by `\n`.
    pub text: String,
    /// Words in top-down page coordinates.
    pub words: Vec<PositionedWord>,
}

/// A loaded source document.
///
/// Constructed via [`PdfDocument::from_bytes`]. Pages are extracted on demand
/// so a caller can stream them without holding every page's words at once.
pub struct PdfDocument {
    backend: LopdfBackend,
    page_ids: Vec<PageId>,
}

impl PdfDocument {
    /// Parse PDF bytes. Fails on malformed or encrypted input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        let page_ids = backend.pages().into_values().collect();
        Ok(PdfDocument { backend, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Extract one page by 0-based index.
    ///
    /// A page whose content stream cannot be decoded comes back empty; the
    /// failure is logged rather than returned.
    pub fn page(&self, index: usize) -> Option<PageContent> {
        let page_id = *self.page_ids.get(index)?;
        Some(extract_page(&self.backend, page_id, index))
    }

    /// All pages in document order.
    pub fn pages(&self) -> impl Iterator<Item = PageContent> + '_ {
        (0..self.page_count()).filter_map(|index| self.page(index))
    }
}

/// Parse `bytes` and extract every page.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<PageContent>, PdfError> {
    let doc = PdfDocument::from_bytes(bytes)?;
    debug!("extracting {} pages", doc.page_count());
    Ok(doc.pages().collect())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn extract_page(backend: &dyn PdfBackend, page_id: PageId, index: usize) -> PageContent {
    let spans = match parser::layout::extract_page_spans(backend, page_id) {
        Ok(spans) => spans,
        Err(e) => {
            warn!("page {index}: could not decode content, treating as empty: {e}");
            return PageContent {
                index,
                ..Default::default()
            };
        }
    };

    // Words are split from the glued line spans, matching `text`.
    let lines = parser::layout::group_spans_into_lines(spans);
    let top = parser::words::page_top(backend, page_id);
    let words = lines
        .iter()
        .flat_map(|line| parser::words::span_words(&line.spans, top))
        .collect();
    let text = lines
        .iter()
        .map(|line| line.text())
        .collect::<Vec<_>>()
        .join("\n");

    PageContent { index, text, words }
}
