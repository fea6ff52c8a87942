//! Text span extraction and line grouping.
//!
//! Walks a page's content stream with a small PDF text-state machine and
//! produces positioned [`TextSpan`]s in PDF user space (y grows upward).
//! Spans are then grouped into visual [`TextLine`]s for the page text.
//!
//! ```text
//! content ops  ->  TextSpan[]  ->  TextLine[]
//!                  extract         group_spans_into_lines
//! ```

use std::cmp::Ordering;

use super::backend::{
    decode_text_simple, get_number_from_value, BackendFontInfo, PageId, PdfBackend, PdfValue,
};
use crate::PdfError;

/// A run of text at a position on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Left edge of the first glyph.
    pub x: f32,
    /// Baseline.
    pub y: f32,
    /// Estimated advance of the whole run.
    pub width: f32,
    pub font_size: f32,
}

/// Spans sharing (approximately) one baseline, left to right.
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub y: f32,
    pub x: f32,
}

impl TextLine {
    /// Span texts joined by single spaces.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Baselines closer than this share a line.
const Y_TOLERANCE: f32 = 1.0;

/// Glyph width as a fraction of font size. No font metrics are read.
pub const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Spans closer than this are glued without a space.
const MIN_WORD_GAP: f32 = 1.5;

/// [a, b, c, d, tx, ty]
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Text state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    /// Resource key of the current font (`/F1`), used for decoding.
    font_key: Vec<u8>,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    /// Tz / 100.
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5]
    }

    /// `font_size * sqrt(b^2 + d^2)` of the text matrix.
    fn effective_font_size(&self) -> f32 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    fn char_width(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Td: translate the line matrix and restart the text matrix from it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn estimate_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_width()
    }

    fn advance_after_show(&mut self, text: &str) {
        let dx: f32 = text
            .chars()
            .map(|ch| {
                let spacing = if ch == ' ' { self.word_spacing } else { 0.0 };
                self.char_width() + self.char_spacing + spacing
            })
            .sum();
        self.advance_x(dx);
    }
}

// ---------------------------------------------------------------------------
// Span extraction
// ---------------------------------------------------------------------------

/// Walk one page's content stream and collect its text spans.
///
/// | Operator | Action |
/// |----------|--------|
/// | `BT`     | Reset matrices |
/// | `Tf`     | Font and size |
/// | `Tm`     | Set text matrix |
/// | `Td` `TD` `T*` `TL` | Line positioning and leading |
/// | `Tc` `Tw` `Tz` `Ts` | Spacing, scaling, rise |
/// | `Tj` `TJ` `'` `"`   | Show text |
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextSpan>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();

    let mut state = TextState::default();
    let mut spans: Vec<TextSpan> = Vec::new();

    for op in &ops {
        let number = |i: usize| op.operands.get(i).and_then(get_number_from_value);
        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            "Tf" => handle_tf(&op.operands, &fonts, &mut state),
            "Tm" => handle_tm(&op.operands, &mut state),
            "Td" => {
                if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.next_line(),
            "TL" => state.leading = number(0).unwrap_or(state.leading),
            "Tc" => state.char_spacing = number(0).unwrap_or(state.char_spacing),
            "Tw" => state.word_spacing = number(0).unwrap_or(state.word_spacing),
            "Tz" => {
                if let Some(v) = number(0) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => state.text_rise = number(0).unwrap_or(state.text_rise),
            "Tj" => {
                if let Some(first) = op.operands.first() {
                    show_string(first, backend, page_id, &mut state, &mut spans);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    show_tj_array(arr, backend, page_id, &mut state, &mut spans);
                }
            }
            "'" => {
                state.next_line();
                if let Some(first) = op.operands.first() {
                    show_string(first, backend, page_id, &mut state, &mut spans);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac), Some(s)) = (number(0), number(1), op.operands.get(2)) {
                    state.word_spacing = aw;
                    state.char_spacing = ac;
                    state.next_line();
                    show_string(s, backend, page_id, &mut state, &mut spans);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn handle_tf(operands: &[PdfValue], fonts: &[BackendFontInfo], state: &mut TextState) {
    let (Some(key), Some(size)) = (operands.first(), operands.get(1)) else {
        return;
    };
    let key = match key {
        PdfValue::Name(n) | PdfValue::Str(n) => n.clone(),
        _ => return,
    };
    if !fonts.iter().any(|f| f.name == key) {
        log::trace!("font {} not in page resources", String::from_utf8_lossy(&key));
    }
    state.font_key = key;
    state.font_size = get_number_from_value(size).unwrap_or(0.0);
}

fn handle_tm(operands: &[PdfValue], state: &mut TextState) {
    let vals: Vec<f32> = operands
        .iter()
        .take(6)
        .filter_map(get_number_from_value)
        .collect();
    if let [a, b, c, d, e, f] = vals[..] {
        state.text_matrix = [a, b, c, d, e, f];
        state.line_matrix = state.text_matrix;
    }
}

fn decode_string(
    val: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    font_key: &[u8],
) -> String {
    match val {
        PdfValue::Str(bytes) => {
            let decoded = backend.decode_text(page_id, font_key, bytes);
            if decoded.is_empty() {
                decode_text_simple(bytes)
            } else {
                decoded
            }
        }
        _ => String::new(),
    }
}

/// Tj, `'` and `"`: one span per string.
fn show_string(
    operand: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let text = decode_string(operand, backend, page_id, &state.font_key);
    if text.is_empty() {
        return;
    }
    spans.push(TextSpan {
        x: state.x(),
        y: state.y() + state.text_rise,
        width: state.estimate_width(&text),
        font_size: state.effective_font_size(),
        text: text.clone(),
    });
    state.advance_after_show(&text);
}

/// TJ: strings interleaved with kerning in thousandths of text space.
/// Kerning wider than a third of a glyph reads as a word gap.
fn show_tj_array(
    arr: &[PdfValue],
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let mut buf = String::new();
    let mut span_x = state.x();
    let span_y = state.y() + state.text_rise;

    for elem in arr {
        if let PdfValue::Str(_) = elem {
            let fragment = decode_string(elem, backend, page_id, &state.font_key);
            if buf.is_empty() {
                span_x = state.x();
            }
            buf.push_str(&fragment);
            state.advance_after_show(&fragment);
        } else if let Some(adj) = get_number_from_value(elem) {
            let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
            if dx > state.char_width() * 0.3 && !buf.is_empty() {
                buf.push(' ');
            }
            state.advance_x(dx);
        }
    }

    let text = buf.trim_end();
    if !text.is_empty() {
        spans.push(TextSpan {
            text: text.to_string(),
            x: span_x,
            y: span_y,
            width: state.x() - span_x,
            font_size: state.effective_font_size(),
        });
    }
}

// ---------------------------------------------------------------------------
// Line grouping
// ---------------------------------------------------------------------------

/// Group spans into lines, top of the page first.
///
/// Spans within [`Y_TOLERANCE`] of the line's first baseline join it. Inside
/// a line, touching spans are glued; anything further apart stays a
/// separate span and is space-joined by [`TextLine::text`].
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y = 0.0;

    for span in spans {
        if !current.is_empty() && (span.y - current_y).abs() > Y_TOLERANCE {
            lines.push(assemble_line(std::mem::take(&mut current)));
        }
        if current.is_empty() {
            current_y = span.y;
        }
        current.push(span);
    }
    if !current.is_empty() {
        lines.push(assemble_line(current));
    }

    lines
}

fn assemble_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(prev) = merged.last_mut() {
            let gap = span.x - (prev.x + prev.width);
            if gap < MIN_WORD_GAP && gap > -prev.font_size {
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }
        }
        merged.push(span);
    }

    TextLine {
        y: merged.first().map(|s| s.y).unwrap_or(0.0),
        x: merged.first().map(|s| s.x).unwrap_or(0.0),
        spans: merged,
    }
}
