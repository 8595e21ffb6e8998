use std::collections::{BTreeMap, HashMap, HashSet};

use lopdf::{self, content::Content};

use crate::types::Rect;
use crate::PdfError;

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// PDF `FontDescriptor` flag bit 19 (1-based): glyphs are painted bold.
const FORCE_BOLD_FLAG: i64 = 1 << 18;

/// `FontWeight` values at or above this are treated as bold.
const BOLD_WEIGHT: f32 = 600.0;

/// Default glyph width for CID fonts without a `DW` entry (PDF 32000-1, 9.7.4.3).
const DEFAULT_CID_WIDTH: f32 = 1000.0;

/// Largest character code a width table may describe (2-byte CIDs).
const MAX_CHAR_CODE: u32 = 0xFFFF;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Font information extracted from a page's resource dictionary.
#[derive(Debug, Clone, Default)]
pub struct BackendFontInfo {
    /// The font name key as it appears in the resource dictionary (e.g. `b"F1"`).
    pub name: Vec<u8>,
    /// Base font name from the font dictionary, if present.
    pub base_font: Option<String>,
    /// Font subtype (e.g. `Type1`, `TrueType`, `Type0`).
    pub subtype: Option<String>,
    /// Encoding entry from the font dictionary, if present.
    pub encoding: Option<String>,
    /// The font descriptor declares a bold face (`ForceBold` or a heavy `FontWeight`).
    pub descriptor_bold: bool,
    /// Glyph advance widths in thousandths of text space.
    pub widths: GlyphWidths,
    /// Character code to Unicode mapping parsed from the `ToUnicode` CMap.
    pub to_unicode: Option<HashMap<u32, String>>,
}

impl BackendFontInfo {
    /// Composite (Type0) fonts address glyphs with 2-byte codes.
    pub fn is_two_byte(&self) -> bool {
        self.subtype.as_deref() == Some("Type0")
    }

    /// Split raw string bytes into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.is_two_byte() {
            bytes
                .chunks(2)
                .map(|c| match c {
                    [hi, lo] => u32::from(u16::from_be_bytes([*hi, *lo])),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }
}

/// Per-code glyph widths of a font.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphWidths {
    pub widths: HashMap<u32, f32>,
    /// Width used for codes missing from `widths`, when the font declares one.
    pub default_width: Option<f32>,
}

impl GlyphWidths {
    pub fn width(&self, code: u32) -> Option<f32> {
        self.widths.get(&code).copied().or(self.default_width)
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty() && self.default_width.is_none()
    }
}

/// A simplified, lopdf-independent representation of a PDF value.
///
/// This enum decouples higher-level logic from the concrete `lopdf::Object`
/// type so that the functional core can work with pure data.
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

/// Extract an `f32` from a [`PdfValue`], accepting both `Integer` and `Real`.
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(f) => Some(*f),
        _ => None,
    }
}

/// Convert a `lopdf::Object` into a [`PdfValue`].
///
/// References are preserved as `PdfValue::Reference`.  Stream dictionaries
/// are converted but the raw stream bytes are discarded (they must be
/// obtained through [`PdfBackend::page_content`]).
pub fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Null => PdfValue::Null,
        lopdf::Object::Boolean(b) => PdfValue::Bool(*b),
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        lopdf::Object::Dictionary(dict) => {
            let entries = dict
                .iter()
                .map(|(k, v)| (k.clone(), convert_object(v)))
                .collect();
            PdfValue::Dict(entries)
        }
        lopdf::Object::Stream(stream) => {
            let entries = stream
                .dict
                .iter()
                .map(|(k, v)| (k.clone(), convert_object(v)))
                .collect();
            PdfValue::Dict(entries)
        }
        lopdf::Object::Reference(id) => PdfValue::Reference(*id),
    }
}

/// Map a single byte through WinAnsiEncoding.
///
/// Only 0x80..=0x9F differ from Latin-1; unassigned slots map to U+FFFD.
pub fn win_ansi_char(b: u8) -> char {
    const HIGH: [char; 32] = [
        '\u{20AC}', '\u{FFFD}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}',
        '\u{2021}', '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{FFFD}',
        '\u{017D}', '\u{FFFD}', '\u{FFFD}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}',
        '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}',
        '\u{0153}', '\u{FFFD}', '\u{017E}', '\u{0178}',
    ];
    match b {
        0x80..=0x9F => HIGH[(b - 0x80) as usize],
        _ => b as char,
    }
}

/// Best-effort decoding of raw PDF string bytes into a Rust `String`.
///
/// Handles three cases in order:
/// 1. UTF-16BE with BOM (`\xFE\xFF` prefix) -- strips BOM and decodes.
/// 2. Valid UTF-8 -- returned as-is.
/// 3. Fallback to WinAnsi (Latin-1 plus the 0x80..=0x9F punctuation block).
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let payload = &bytes[2..];
        let code_units: Vec<u16> = payload
            .chunks(2)
            .filter_map(|chunk| {
                if chunk.len() == 2 {
                    Some(u16::from_be_bytes([chunk[0], chunk[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    // Try UTF-8
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| win_ansi_char(b)).collect()
}

/// Decode the bytes of a text-showing operand using whatever the font tells us.
///
/// Order of preference: the `ToUnicode` CMap, UTF-16BE for `Identity` encoded
/// composite fonts, then [`decode_text_simple`].
pub fn decode_with_font(font: Option<&BackendFontInfo>, bytes: &[u8]) -> String {
    let Some(font) = font else {
        return decode_text_simple(bytes);
    };

    if let Some(map) = &font.to_unicode {
        let mut out = String::with_capacity(bytes.len());
        let mut mapped = 0usize;
        for code in font.codes(bytes) {
            match map.get(&code) {
                Some(s) => {
                    out.push_str(s);
                    mapped += 1;
                }
                None if !font.is_two_byte() => out.push(win_ansi_char(code as u8)),
                None => out.push('\u{FFFD}'),
            }
        }
        if mapped > 0 {
            return out;
        }
    }

    // Identity-H / Identity-V fonts typically use 2-byte CID codes that map
    // to Unicode.  Try UTF-16BE decoding.
    let identity = font
        .encoding
        .as_deref()
        .is_some_and(|e| e.contains("Identity"));
    if identity && bytes.len() >= 2 && bytes.len().is_multiple_of(2) {
        let code_units: Vec<u16> = bytes
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        let decoded = String::from_utf16_lossy(&code_units);
        if !decoded.is_empty() && !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
            return decoded;
        }
    }

    decode_text_simple(bytes)
}

/// Convert the code/UTF-16BE pairs produced by the CMap parser into strings.
fn unicode_map_from_cmap(raw: HashMap<u32, Vec<u8>>) -> HashMap<u32, String> {
    let mut map = HashMap::with_capacity(raw.len());
    for (code, bytes) in raw {
        if bytes.len() % 2 != 0 {
            log::debug!("skipping ToUnicode entry {code}: odd UTF-16BE length");
            continue;
        }
        let units: Vec<u16> = bytes
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&units) {
            map.insert(code, s);
        }
    }
    map
}

/// A width-table code as `u32`, or `None` when negative, fractional or past
/// [`MAX_CHAR_CODE`].
fn char_code(value: f32) -> Option<u32> {
    (value >= 0.0 && value.fract() == 0.0 && value <= MAX_CHAR_CODE as f32).then_some(value as u32)
}

/// Parse a CID font `W` array: `c [w1 w2 ...]` or `c_first c_last w`.
///
/// Codes past [`MAX_CHAR_CODE`] are ignored and ranges are clamped to it.
pub fn parse_cid_widths(entries: &[PdfValue]) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < entries.len() {
        let Some(first) = get_number_from_value(&entries[i]) else {
            i += 1;
            continue;
        };
        match entries.get(i + 1) {
            Some(PdfValue::Array(list)) => {
                if let Some(first) = char_code(first) {
                    let codes = first..=MAX_CHAR_CODE;
                    widths.extend(codes.zip(list.iter().filter_map(get_number_from_value)));
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (
                    get_number_from_value(last),
                    entries.get(i + 2).and_then(get_number_from_value),
                ) else {
                    break;
                };
                if let Some(first) = char_code(first) {
                    let last = if last > MAX_CHAR_CODE as f32 {
                        MAX_CHAR_CODE
                    } else {
                        last.max(0.0) as u32
                    };
                    widths.extend((first..=last).map(|code| (code, w)));
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Widths of a simple font: `Widths[i]` belongs to code `FirstChar + i`.
pub fn parse_simple_widths(first_char: i64, widths: Vec<f32>) -> HashMap<u32, f32> {
    let Ok(first) = u32::try_from(first_char) else {
        return HashMap::new();
    };
    (first..=MAX_CHAR_CODE).zip(widths).collect()
}

/// Bold hint from a font descriptor dictionary converted to [`PdfValue`] entries.
pub fn descriptor_is_bold(entries: &[(Vec<u8>, PdfValue)]) -> bool {
    let lookup = |key: &[u8]| entries.iter().find(|(k, _)| k == key).map(|(_, v)| v);
    let force_bold = matches!(lookup(b"Flags"), Some(PdfValue::Integer(f)) if f & FORCE_BOLD_FLAG != 0);
    let heavy = lookup(b"FontWeight")
        .and_then(get_number_from_value)
        .is_some_and(|w| w >= BOLD_WEIGHT);
    force_bold || heavy
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// Abstraction over a PDF parsing backend (currently backed by `lopdf`).
///
/// This trait exists so that higher-level modules in the functional core can
/// be tested against mock implementations without pulling in the full lopdf
/// dependency.
pub trait PdfBackend {
    /// Return a mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return font information for every font referenced by the given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError>;

    /// Return the raw (possibly compressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    /// Decode raw content-stream bytes into a sequence of [`ContentOp`]s.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// The page's MediaBox in PDF user space (origin bottom-left).
    fn media_box(&self, page: PageId) -> Result<Rect, PdfError>;

    /// Resource names of the image XObjects available to the page.
    fn page_images(&self, page: PageId) -> Vec<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] implementation backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    /// Total number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    // -- private helpers ----------------------------------------------------

    /// Follow a single level of indirection.
    fn resolve<'a>(&'a self, obj: &'a lopdf::Object) -> &'a lopdf::Object {
        match obj {
            lopdf::Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a lopdf::Object) -> Option<&'a lopdf::Dictionary> {
        match self.resolve(obj) {
            lopdf::Object::Dictionary(d) => Some(d),
            lopdf::Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    fn page_dict(&self, page: PageId) -> Result<&lopdf::Dictionary, PdfError> {
        let page_obj = self
            .doc
            .get_object(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page object: {}", e)))?;

        page_obj
            .as_dict()
            .map_err(|e| PdfError::Parse(format!("page object is not a dictionary: {}", e)))
    }

    /// Walk up the page tree looking for an inheritable attribute.
    ///
    /// A `Parent` chain that loops back on itself ends the search.
    fn inherited<'a>(&'a self, dict: &'a lopdf::Dictionary, key: &[u8]) -> Option<&'a lopdf::Object> {
        let mut visited = HashSet::new();
        let mut node = dict;
        loop {
            if let Ok(obj) = node.get(key) {
                return Some(self.resolve(obj));
            }

            let parent_id = node.get(b"Parent").ok()?.as_reference().ok()?;
            if !visited.insert(parent_id) {
                log::warn!("page tree cycle at object {:?}", parent_id);
                return None;
            }
            node = self.doc.get_object(parent_id).ok()?.as_dict().ok()?;
        }
    }

    /// Convert a vector of lopdf objects to `f32` values.
    fn array_to_f32s(&self, objects: &[lopdf::Object]) -> Result<Vec<f32>, PdfError> {
        objects
            .iter()
            .map(|obj| match self.resolve(obj) {
                lopdf::Object::Integer(i) => Ok(*i as f32),
                lopdf::Object::Real(f) => Ok(*f),
                other => Err(PdfError::Parse(format!(
                    "expected number in array, got {:?}",
                    other
                ))),
            })
            .collect()
    }

    fn name_entry(&self, dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
        match self.resolve(dict.get(key).ok()?) {
            lopdf::Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
            _ => None,
        }
    }

    /// The first descendant of a Type0 font, where widths and the descriptor live.
    fn descendant_font<'a>(&'a self, font: &'a lopdf::Dictionary) -> Option<&'a lopdf::Dictionary> {
        let descendants = self.resolve(font.get(b"DescendantFonts").ok()?);
        let first = descendants.as_array().ok()?.first()?;
        self.resolve_dict(first)
    }

    fn glyph_widths(&self, font: &lopdf::Dictionary) -> GlyphWidths {
        if let Some(cid) = self.descendant_font(font) {
            let widths = cid
                .get(b"W")
                .ok()
                .map(|w| match convert_object(self.resolve(w)) {
                    PdfValue::Array(entries) => parse_cid_widths(&entries),
                    _ => HashMap::new(),
                })
                .unwrap_or_default();
            let default_width = cid
                .get(b"DW")
                .ok()
                .and_then(|o| get_number_from_value(&convert_object(self.resolve(o))))
                .unwrap_or(DEFAULT_CID_WIDTH);
            return GlyphWidths {
                widths,
                default_width: Some(default_width),
            };
        }

        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| self.resolve(o).as_i64().ok());
        let widths = font
            .get(b"Widths")
            .ok()
            .and_then(|o| self.resolve(o).as_array().ok())
            .and_then(|arr| self.array_to_f32s(arr).ok());

        match (first_char, widths) {
            (Some(first), Some(widths)) => GlyphWidths {
                widths: parse_simple_widths(first, widths),
                default_width: None,
            },
            _ => GlyphWidths::default(),
        }
    }

    fn font_descriptor_bold(&self, font: &lopdf::Dictionary) -> bool {
        let owner = self.descendant_font(font).unwrap_or(font);
        owner
            .get(b"FontDescriptor")
            .ok()
            .and_then(|o| self.resolve_dict(o))
            .map(|d| match convert_object(&lopdf::Object::Dictionary(d.clone())) {
                PdfValue::Dict(entries) => descriptor_is_bold(&entries),
                _ => false,
            })
            .unwrap_or(false)
    }

    fn to_unicode(&self, font: &lopdf::Dictionary) -> Option<HashMap<u32, String>> {
        let stream = match self.resolve(font.get(b"ToUnicode").ok()?) {
            lopdf::Object::Stream(s) => s,
            _ => return None,
        };
        let contents = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        // The CMap parser is known to panic on malformed input.
        let parsed = std::panic::catch_unwind(|| adobe_cmap_parser::get_unicode_map(&contents));
        match parsed {
            Ok(Ok(raw)) => Some(unicode_map_from_cmap(raw)),
            Ok(Err(e)) => {
                log::warn!("failed to parse ToUnicode CMap: {:?}", e);
                None
            }
            Err(_) => {
                log::warn!("ToUnicode CMap parser panicked; ignoring the map");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PdfBackend implementation for LopdfBackend
// ---------------------------------------------------------------------------

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>, PdfError> {
        let fonts_map = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page fonts: {}", e)))?;

        let mut result = Vec::with_capacity(fonts_map.len());
        for (name, dict) in &fonts_map {
            result.push(BackendFontInfo {
                name: name.clone(),
                base_font: self.name_entry(dict, b"BaseFont"),
                subtype: self.name_entry(dict, b"Subtype"),
                encoding: self.name_entry(dict, b"Encoding"),
                descriptor_bold: self.font_descriptor_bold(dict),
                widths: self.glyph_widths(dict),
                to_unicode: self.to_unicode(dict),
            });
        }

        Ok(result)
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("cannot get page content: {}", e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream decode error: {}", e)))?;

        let ops = content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect();

        Ok(ops)
    }

    /// MediaBox is an array `[llx, lly, urx, ury]`, possibly inherited from
    /// an ancestor `Pages` node.
    fn media_box(&self, page: PageId) -> Result<Rect, PdfError> {
        let page_dict = self.page_dict(page)?;

        let media_box = self
            .inherited(page_dict, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .ok_or_else(|| PdfError::Parse("MediaBox not found for page".into()))?;

        let nums = self.array_to_f32s(media_box)?;
        if nums.len() < 4 {
            return Err(PdfError::Parse(format!(
                "MediaBox has {} elements, expected 4",
                nums.len()
            )));
        }

        Ok(Rect::new(
            nums[0].min(nums[2]),
            nums[1].min(nums[3]),
            nums[0].max(nums[2]),
            nums[1].max(nums[3]),
        ))
    }

    fn page_images(&self, page: PageId) -> Vec<Vec<u8>> {
        let Ok(page_dict) = self.page_dict(page) else {
            return Vec::new();
        };
        let Some(xobjects) = self
            .inherited(page_dict, b"Resources")
            .and_then(|r| self.resolve_dict(r))
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|x| self.resolve_dict(x))
        else {
            return Vec::new();
        };

        xobjects
            .iter()
            .filter(|(_, obj)| {
                self.resolve_dict(obj)
                    .and_then(|d| self.name_entry(d, b"Subtype"))
                    .is_some_and(|s| s == "Image")
            })
            .map(|(name, _)| name.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
