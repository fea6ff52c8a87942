use std::collections::BTreeMap;

use log::debug;
use lopdf::{self, content::Content};

use crate::PdfError;

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// US Letter, used when a page declares no usable MediaBox.
pub const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Font information from a page's resource dictionary.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Resource key, e.g. `b"F1"`.
    pub name: Vec<u8>,
    pub base_font: Option<String>,
    pub encoding: Option<String>,
}

/// A PDF value detached from `lopdf::Object`, so the text state machine can
/// run against a mock backend.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Dict(Vec<(Vec<u8>, PdfValue)>),
    Reference(PageId),
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a `lopdf::Object` into a [`PdfValue`]. Stream bodies are dropped;
/// only their dictionaries survive.
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Boolean(b) => PdfValue::Bool(*b),
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        lopdf::Object::Dictionary(dict) => PdfValue::Dict(convert_dict(dict)),
        lopdf::Object::Stream(stream) => PdfValue::Dict(convert_dict(&stream.dict)),
        lopdf::Object::Reference(id) => PdfValue::Reference(*id),
    }
}

fn convert_dict(dict: &lopdf::Dictionary) -> Vec<(Vec<u8>, PdfValue)> {
    dict.iter()
        .map(|(k, v)| (k.clone(), convert_object(v)))
        .collect()
}

/// Best-effort decoding of string bytes from a text-showing operator.
///
/// UTF-16BE with a BOM, then UTF-8, then Latin-1 byte-for-codepoint.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, payload @ ..] = bytes {
        let code_units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// What the extractor needs from a parsed PDF. Implemented by
/// [`LopdfBackend`] and by mocks in tests.
pub trait PdfBackend {
    /// 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError>;

    /// Raw content stream bytes for a page, all parts concatenated.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode string bytes shown with font `font_name` on `page`.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// `[llx, lly, urx, ury]` of the page, inherited from the page tree when
    /// the page itself has none.
    fn media_box(&self, page: PageId) -> Result<[f32; 4], PdfError>;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from memory. Encrypted documents are rejected.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    /// Walk up the page tree to find the MediaBox array.
    fn find_media_box(&self, dict: &lopdf::Dictionary) -> Option<Vec<lopdf::Object>> {
        if let Some(arr) = dict.get(b"MediaBox").ok().and_then(|o| self.resolve_array(o)) {
            return Some(arr);
        }

        let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
        let parent = self.doc.get_dictionary(parent_id).ok()?;
        self.find_media_box(parent)
    }

    fn resolve_array(&self, obj: &lopdf::Object) -> Option<Vec<lopdf::Object>> {
        match obj {
            lopdf::Object::Array(arr) => Some(arr.clone()),
            lopdf::Object::Reference(id) => self
                .doc
                .get_object(*id)
                .ok()
                .and_then(|o| o.as_array().ok())
                .cloned(),
            _ => None,
        }
    }

    fn resolve_number(&self, obj: &lopdf::Object) -> Result<f32, PdfError> {
        let resolved = match obj {
            lopdf::Object::Reference(id) => self.doc.get_object(*id)?,
            other => other,
        };
        match resolved {
            lopdf::Object::Integer(i) => Ok(*i as f32),
            lopdf::Object::Real(f) => Ok(*f),
            _ => Err(PdfError::Parse(format!(
                "expected number in MediaBox, got {:?}",
                resolved
            ))),
        }
    }

    fn font_dict(&self, page: PageId, font_name: &[u8]) -> Option<&lopdf::Dictionary> {
        self.doc.get_page_fonts(page).ok()?.get(font_name).copied()
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError> {
        let fonts_map = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        let name_of = |dict: &lopdf::Dictionary, key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).into_owned())
        };

        Ok(fonts_map
            .iter()
            .map(|(name, dict)| BackendFontInfo {
                name: name.clone(),
                base_font: name_of(dict, b"BaseFont"),
                encoding: name_of(dict, b"Encoding"),
            })
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        let Some(font) = self.font_dict(page, font_name) else {
            return decode_text_simple(bytes);
        };
        // Fonts without either key are read as plain text.
        if !font.has(b"Encoding") && !font.has(b"ToUnicode") {
            return decode_text_simple(bytes);
        }

        match font
            .get_font_encoding(&self.doc)
            .and_then(|encoding| lopdf::Document::decode_text(&encoding, bytes))
        {
            Ok(text) => text,
            Err(e) => {
                debug!(
                    "font {}: {e}; decoding as plain text",
                    String::from_utf8_lossy(font_name)
                );
                decode_text_simple(bytes)
            }
        }
    }

    fn media_box(&self, page: PageId) -> Result<[f32; 4], PdfError> {
        let page_dict = self
            .doc
            .get_dictionary(page)
            .map_err(|e| PdfError::Parse(format!("page object is not a dictionary: {}", e)))?;

        let media_box = self
            .find_media_box(page_dict)
            .ok_or_else(|| PdfError::Parse("MediaBox not found for page".into()))?;

        match media_box.as_slice() {
            [a, b, c, d, ..] => Ok([
                self.resolve_number(a)?,
                self.resolve_number(b)?,
                self.resolve_number(c)?,
                self.resolve_number(d)?,
            ]),
            short => Err(PdfError::Parse(format!(
                "MediaBox has {} elements, expected 4",
                short.len()
            ))),
        }
    }
}
