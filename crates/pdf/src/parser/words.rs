//! Word boxes in top-down page coordinates.
//!
//! Spans are split on whitespace and each word gets an even share of its
//! span's estimated width. The y axis is flipped against the top of the
//! MediaBox so `top < bottom` and "below" means a larger y.

use log::debug;

use order_splitter_core::candidates::{BoundingBox, PositionedWord};

use super::backend::{PageId, PdfBackend, DEFAULT_MEDIA_BOX};
use super::layout::TextSpan;

/// y of the page's top edge in PDF user space.
pub fn page_top(backend: &dyn PdfBackend, page_id: PageId) -> f32 {
    match backend.media_box(page_id) {
        Ok([_, lly, _, ury]) => lly.max(ury),
        Err(e) => {
            debug!("page {:?}: {e}; assuming US Letter", page_id);
            DEFAULT_MEDIA_BOX[3]
        }
    }
}

/// Every whitespace-separated word of every span, in span order.
pub fn span_words(spans: &[TextSpan], page_top: f32) -> Vec<PositionedWord> {
    spans
        .iter()
        .flat_map(|span| split_span(span, page_top))
        .collect()
}

fn split_span(span: &TextSpan, page_top: f32) -> Vec<PositionedWord> {
    let chars = span.text.chars().count();
    if chars == 0 {
        return Vec::new();
    }
    let advance = span.width / chars as f32;
    let bottom = page_top - span.y;
    let top = bottom - span.font_size;

    let mut words = Vec::new();
    let mut start: Option<(usize, String)> = None;
    for (i, ch) in span.text.chars().enumerate() {
        if ch.is_whitespace() {
            if let Some((first, text)) = start.take() {
                words.push(word(text, span.x, advance, first, i, top, bottom));
            }
        } else {
            start.get_or_insert_with(|| (i, String::new())).1.push(ch);
        }
    }
    if let Some((first, text)) = start {
        words.push(word(text, span.x, advance, first, chars, top, bottom));
    }
    words
}

fn word(
    text: String,
    x: f32,
    advance: f32,
    first: usize,
    end: usize,
    top: f32,
    bottom: f32,
) -> PositionedWord {
    let left = x + first as f32 * advance;
    let right = x + end as f32 * advance;
    PositionedWord::new(text, BoundingBox::new(left, top, right, bottom))
}
