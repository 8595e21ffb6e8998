//! Text extraction, line grouping, and block assembly.
//!
//! This module implements a pure-functional pipeline that transforms raw PDF
//! content-stream operators into positioned [`TextBlock`]s.  Every public
//! function is a pure transformation -- side effects (I/O) live behind the
//! [`PdfBackend`] trait provided by the caller.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  RawSpan[]  ->  TextLine[]  ->  TextBlock[]  ->  TextPage
//!   (per page)      extract        group_spans     group_lines
//! ```
//!
//! Coordinates leave this module in page space: origin at the top-left
//! corner of the MediaBox, y growing downwards.

use std::collections::HashMap;

use super::backend::{
    decode_with_font, get_number_from_value, BackendFontInfo, PageId, PdfBackend, PdfValue,
};
use super::cleanup::cleanup_span_text;
use crate::types::{Rect, TextBlock, TextLine, TextPage, TextSpan};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A single run of text at a specific position, before line assembly.
///
/// `baseline` is the distance of the glyph baseline from the top of the page.
#[derive(Debug, Clone)]
pub struct RawSpan {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
    pub is_bold: bool,
    pub is_italic: bool,
}

impl RawSpan {
    fn into_span(self) -> TextSpan {
        let bbox = Rect::new(
            self.x,
            self.baseline - self.font_size * ASCENT_RATIO,
            self.x + self.width,
            self.baseline + self.font_size * DESCENT_RATIO,
        );
        TextSpan {
            text: self.text,
            size: self.font_size,
            font: self.font_name,
            bold: self.is_bold,
            italic: self.is_italic,
            bbox,
        }
    }
}

/// Everything drawn on one page, in page space.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub spans: Vec<RawSpan>,
    pub images: Vec<Rect>,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Two spans whose baselines differ by less than this are treated as
/// belonging to the same line.
const Y_TOLERANCE: f32 = 1.0;

/// Approximate character width as a fraction of font size when no better
/// metric is available.  0.5 is a reasonable default for proportional fonts.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Minimum gap (in points) between adjacent spans before we insert a space.
const MIN_WORD_GAP: f32 = 1.5;

/// Horizontal gaps wider than this multiple of the font size split a line.
const LINE_SPLIT_FACTOR: f32 = 3.0;

/// When grouping lines into blocks, a vertical gap larger than this multiple
/// of the line's font size starts a new block.
const BLOCK_GAP_FACTOR: f32 = 1.4;

/// Lines whose sizes differ by at least this many points never share a block.
const BLOCK_SIZE_TOLERANCE: f32 = 1.0;

/// Glyph extent above / below the baseline as a fraction of the font size.
const ASCENT_RATIO: f32 = 0.8;
const DESCENT_RATIO: f32 = 0.2;

/// Font name fragments that indicate a heavy face.
const BOLD_MARKERS: [&str; 5] = ["BOLD", "BLACK", "HEAVY", "SEMIBOLD", "DEMI"];

// ---------------------------------------------------------------------------
// CJK / spaceless-script helper
// ---------------------------------------------------------------------------

/// Returns `true` if `c` belongs to a script that does not use inter-word
/// spaces (CJK Unified Ideographs, Hiragana, Katakana, Hangul, Thai, etc.).
pub fn is_spaceless_script_char(c: char) -> bool {
    let cp = c as u32;
    matches!(
        cp,
        // CJK Unified Ideographs
        0x4E00..=0x9FFF
        // CJK Unified Ideographs Extension A
        | 0x3400..=0x4DBF
        // CJK Unified Ideographs Extension B
        | 0x20000..=0x2A6DF
        // CJK Compatibility Ideographs
        | 0xF900..=0xFAFF
        // Hiragana
        | 0x3040..=0x309F
        // Katakana
        | 0x30A0..=0x30FF
        // Hangul Syllables
        | 0xAC00..=0xD7AF
        // CJK Symbols and Punctuation
        | 0x3000..=0x303F
        // Fullwidth Forms
        | 0xFF00..=0xFFEF
        // Thai
        | 0x0E00..=0x0E7F
    )
}

// ---------------------------------------------------------------------------
// Internal: matrices
// ---------------------------------------------------------------------------

/// The identity 2x3 matrix: [a, b, c, d, e, f].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m1 x m2` for PDF's row-vector convention (apply `m1` first).
fn multiply(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn transform_point(m: &[f32; 6], x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn matrix_from_operands(operands: &[PdfValue]) -> Option<[f32; 6]> {
    let vals: Vec<f32> = operands
        .iter()
        .take(6)
        .filter_map(get_number_from_value)
        .collect();
    match vals.as_slice() {
        [a, b, c, d, e, f] => Some([*a, *b, *c, *d, *e, *f]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    /// Current font resource name (the `/F1`-style key, not the full name).
    font_key: Vec<u8>,
    /// Resolved base-font name for the current font.
    font_name: String,
    /// Current font size in text-space units.
    font_size: f32,
    /// Elements [a, b, c, d, tx, ty] of the current text matrix.
    text_matrix: [f32; 6],
    /// Text line matrix -- set by BT and updated by Td/TD/T*/Tm.
    line_matrix: [f32; 6],
    /// Current transformation matrix (graphics state).
    ctm: [f32; 6],
    /// Horizontal scaling factor (percent / 100).  Default 1.0.
    horiz_scale: f32,
    /// Character spacing (Tc).
    char_spacing: f32,
    /// Word spacing (Tw).
    word_spacing: f32,
    /// Text rise (Ts).
    text_rise: f32,
    /// Leading (TL).
    leading: f32,
    is_bold: bool,
    is_italic: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            ctm: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
            is_bold: false,
            is_italic: false,
        }
    }
}

impl TextState {
    /// Text matrix composed with the CTM: text space to user space.
    fn rendering_matrix(&self) -> [f32; 6] {
        multiply(&self.text_matrix, &self.ctm)
    }

    /// Current pen position (including text rise) in user space.
    fn position(&self) -> (f32, f32) {
        transform_point(&self.rendering_matrix(), 0.0, self.text_rise)
    }

    /// Effective font size accounting for the vertical scale of the text
    /// matrix and the CTM.
    ///
    /// The rendered size is `font_size * sqrt(c^2 + d^2)` of the combined
    /// matrix.
    fn effective_font_size(&self) -> f32 {
        let m = self.rendering_matrix();
        (self.font_size * (m[2].powi(2) + m[3].powi(2)).sqrt()).abs()
    }

    /// Horizontal scale from text space to user space.
    fn horizontal_scale(&self) -> f32 {
        let m = self.rendering_matrix();
        (m[0].powi(2) + m[1].powi(2)).sqrt()
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Multiply the text line matrix by a translation (used by Td / TD).
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    /// Apply the `Tf` operator: set font and size, detect bold/italic from
    /// the base-font name and the descriptor hint.
    fn set_font(&mut self, key: Vec<u8>, base_font: &str, descriptor_bold: bool, size: f32) {
        self.font_key = key;
        self.font_size = size;

        let upper = base_font.to_uppercase();
        self.is_bold = descriptor_bold || BOLD_MARKERS.iter().any(|m| upper.contains(m));
        self.is_italic = upper.contains("ITALIC") || upper.contains("OBLIQUE");
        self.font_name = strip_subset_prefix(base_font).to_string();
    }
}

/// Drop the `ABCDEF+` subset tag embedders put in front of font names.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

/// Resolve a font resource name to its [`BackendFontInfo`].
///
/// The `BackendFontInfo.name` field holds the resource key (e.g. `b"F1"`).
fn resolve_font<'a>(key: &[u8], fonts: &'a [BackendFontInfo]) -> Option<&'a BackendFontInfo> {
    fonts.iter().find(|info| info.name == key)
}

/// Horizontal displacement, in text space, produced by showing `bytes`.
///
/// Uses the font's glyph widths when known; otherwise each code contributes
/// `font_size * APPROX_CHAR_WIDTH_RATIO`.
fn text_advance(bytes: &[u8], font: Option<&BackendFontInfo>, state: &TextState) -> f32 {
    let (codes, two_byte) = match font {
        Some(f) => (f.codes(bytes), f.is_two_byte()),
        None => (bytes.iter().map(|&b| u32::from(b)).collect(), false),
    };

    let mut total: f32 = 0.0;
    for code in codes {
        let glyph = font
            .and_then(|f| f.widths.width(code))
            .map(|w| w / 1000.0 * state.font_size)
            .unwrap_or(state.font_size * APPROX_CHAR_WIDTH_RATIO);
        total += glyph + state.char_spacing;
        // Word spacing only applies to the single-byte code 32.
        if code == 32 && !two_byte {
            total += state.word_spacing;
        }
    }
    total * state.horiz_scale
}

/// Decode a single [`PdfValue::Str`] operand into text and its raw bytes.
fn decode_string<'v>(val: &'v PdfValue, font: Option<&BackendFontInfo>) -> Option<(String, &'v [u8])> {
    match val {
        PdfValue::Str(bytes) => Some((decode_with_font(font, bytes), bytes.as_slice())),
        _ => None,
    }
}

/// Walks one page's operators and collects spans and image placements.
struct PageWalker<'a> {
    fonts: &'a [BackendFontInfo],
    images: &'a [Vec<u8>],
    /// Top edge and left edge of the MediaBox in user space.
    top: f32,
    left: f32,
    state: TextState,
    saved: Vec<[f32; 6]>,
    content: PageContent,
}

impl<'a> PageWalker<'a> {
    fn new(fonts: &'a [BackendFontInfo], images: &'a [Vec<u8>], media_box: Rect) -> Self {
        Self {
            fonts,
            images,
            top: media_box.y1,
            left: media_box.x0,
            state: TextState::default(),
            saved: Vec::new(),
            content: PageContent::default(),
        }
    }

    fn font(&self) -> Option<&'a BackendFontInfo> {
        resolve_font(&self.state.font_key, self.fonts)
    }

    fn push_span(&mut self, text: &str, user_x: f32, user_y: f32, text_width: f32) {
        let cleaned = cleanup_span_text(text);
        if cleaned.trim().is_empty() {
            return;
        }
        self.content.spans.push(RawSpan {
            text: cleaned,
            x: user_x - self.left,
            baseline: self.top - user_y,
            width: text_width * self.state.horizontal_scale(),
            font_size: self.state.effective_font_size(),
            font_name: self.state.font_name.clone(),
            is_bold: self.state.is_bold,
            is_italic: self.state.is_italic,
        });
    }

    /// Decode an operand as a string, create a span, and advance the text
    /// position.  Shared by `Tj`, `'`, and `"` operators.
    fn show_string(&mut self, operand: &PdfValue) {
        let font = self.font();
        let Some((text, bytes)) = decode_string(operand, font) else {
            return;
        };
        let advance = text_advance(bytes, font, &self.state);
        let (x, y) = self.state.position();
        self.push_span(&text, x, y, advance);
        self.state.advance_x(advance);
    }

    /// Process a `TJ` array: elements are either strings to render or numeric
    /// kerning adjustments (in thousandths of a unit of text space).
    fn show_array(&mut self, arr: &[PdfValue]) {
        let font = self.font();
        let mut buf = String::new();
        let (start_x, start_y) = self.state.position();
        let start_tx = self.state.text_matrix[4];
        let start_ty = self.state.text_matrix[5];

        for elem in arr {
            if let Some((fragment, bytes)) = decode_string(elem, font) {
                buf.push_str(&fragment);
                let advance = text_advance(bytes, font, &self.state);
                self.state.advance_x(advance);
            } else if let Some(adj) = get_number_from_value(elem) {
                // Negative value = move right, positive = move left.
                let dx = -adj / 1000.0 * self.state.font_size * self.state.horiz_scale;

                // A displacement that looks like a word gap becomes a space.
                let gap_threshold =
                    self.state.font_size * APPROX_CHAR_WIDTH_RATIO * self.state.horiz_scale * 0.3;
                if dx > gap_threshold && !buf.is_empty() && !buf.ends_with(' ') {
                    buf.push(' ');
                }
                self.state.advance_x(dx);
            }
        }

        let dx = self.state.text_matrix[4] - start_tx;
        let dy = self.state.text_matrix[5] - start_ty;
        let row_scale = self.state.text_matrix[0]
            .hypot(self.state.text_matrix[1])
            .max(f32::EPSILON);
        let text_width = dx.hypot(dy) / row_scale;
        let trimmed = buf.trim_end().to_string();
        self.push_span(&trimmed, start_x, start_y, text_width);
    }

    /// `Do` on an image XObject paints the unit square under the CTM.
    fn place_image(&mut self, name: &[u8]) {
        if !self.images.iter().any(|n| n == name) {
            return;
        }
        let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
            .map(|(x, y)| transform_point(&self.state.ctm, x, y));
        let xs = corners.iter().map(|c| c.0);
        let ys = corners.iter().map(|c| c.1);
        let (x0, x1) = xs.fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let (y0, y1) = ys.fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        self.content.images.push(Rect::new(
            x0 - self.left,
            self.top - y1,
            x1 - self.left,
            self.top - y0,
        ));
    }

    fn apply(&mut self, operator: &str, operands: &[PdfValue]) {
        match operator {
            // -- Graphics state -----------------------------------------
            "q" => self.saved.push(self.state.ctm),
            "Q" => {
                if let Some(ctm) = self.saved.pop() {
                    self.state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = matrix_from_operands(operands) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }
            "Do" => {
                if let Some(PdfValue::Name(name)) = operands.first() {
                    self.place_image(name);
                }
            }

            // -- Text object delimiters --------------------------------
            "BT" => {
                self.state.text_matrix = IDENTITY_MATRIX;
                self.state.line_matrix = IDENTITY_MATRIX;
            }
            "ET" => {
                // Font state survives text objects because some PDFs reuse
                // the font set earlier.
            }

            // -- Font ---------------------------------------------------
            "Tf" => handle_tf(operands, self.fonts, &mut self.state),

            // -- Text matrix / position ---------------------------------
            "Tm" => {
                if let Some(m) = matrix_from_operands(operands) {
                    self.state.text_matrix = m;
                    self.state.line_matrix = m;
                }
            }
            "Td" => {
                if operands.len() >= 2 {
                    let tx = get_number_from_value(&operands[0]).unwrap_or(0.0);
                    let ty = get_number_from_value(&operands[1]).unwrap_or(0.0);
                    self.state.translate_line(tx, ty);
                }
            }
            "TD" => {
                // TD is equivalent to: -ty TL ; tx ty Td
                if operands.len() >= 2 {
                    let tx = get_number_from_value(&operands[0]).unwrap_or(0.0);
                    let ty = get_number_from_value(&operands[1]).unwrap_or(0.0);
                    self.state.leading = -ty;
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => {
                let leading = self.state.leading;
                self.state.translate_line(0.0, -leading);
            }
            "TL" => {
                if let Some(v) = operands.first().and_then(get_number_from_value) {
                    self.state.leading = v;
                }
            }

            // -- Spacing / scaling --------------------------------------
            "Tc" => {
                if let Some(v) = operands.first().and_then(get_number_from_value) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = operands.first().and_then(get_number_from_value) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = operands.first().and_then(get_number_from_value) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = operands.first().and_then(get_number_from_value) {
                    self.state.text_rise = v;
                }
            }

            // -- Show text ----------------------------------------------
            "Tj" => {
                if let Some(first) = operands.first() {
                    self.show_string(first);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = operands.first() {
                    self.show_array(arr);
                }
            }
            "'" => {
                let leading = self.state.leading;
                self.state.translate_line(0.0, -leading);
                if let Some(first) = operands.first() {
                    self.show_string(first);
                }
            }
            "\"" => {
                // " aw ac string  =>  set Tw, Tc, T*, Tj
                if operands.len() >= 3 {
                    if let Some(aw) = get_number_from_value(&operands[0]) {
                        self.state.word_spacing = aw;
                    }
                    if let Some(ac) = get_number_from_value(&operands[1]) {
                        self.state.char_spacing = ac;
                    }
                    let leading = self.state.leading;
                    self.state.translate_line(0.0, -leading);
                    self.show_string(&operands[2]);
                }
            }

            _ => { /* Ignore path construction, color, etc. */ }
        }
    }
}

/// Handle the `Tf` (set font) operator.
fn handle_tf(operands: &[PdfValue], fonts: &[BackendFontInfo], state: &mut TextState) {
    if operands.len() < 2 {
        return;
    }
    let key = match &operands[0] {
        PdfValue::Name(n) => n.clone(),
        PdfValue::Str(s) => s.clone(),
        _ => return,
    };
    let size = get_number_from_value(&operands[1]).unwrap_or(0.0);
    if let Some(info) = resolve_font(&key, fonts) {
        let base = info.base_font.as_deref().unwrap_or("");
        let descriptor_bold = info.descriptor_bold;
        state.set_font(key, base, descriptor_bold, size);
    } else {
        // Font not in resource dict -- keep the key anyway.
        let name = String::from_utf8_lossy(&key).to_string();
        state.set_font(key, &name, false, size);
    }
}

// ---------------------------------------------------------------------------
// Public API: span extraction
// ---------------------------------------------------------------------------

/// Walk a single page's content stream and collect its spans and images.
///
/// This is the heart of the text extraction pipeline.  It implements a
/// simplified PDF rendering state machine handling the operators:
///
/// | Operator | Action |
/// |----------|--------|
/// | `q` `Q`  | Save / restore the CTM |
/// | `cm`     | Concatenate a matrix onto the CTM |
/// | `Do`     | Place an image XObject |
/// | `BT`     | Begin text object -- reset matrices |
/// | `Tf`     | Set font and size |
/// | `Tm`     | Set text matrix directly |
/// | `Td` `TD` `T*` | Move the text position |
/// | `TL` `Tc` `Tw` `Tz` `Ts` | Text state parameters |
/// | `Tj` `TJ` `'` `"` | Show strings |
pub fn extract_page_content(
    backend: &dyn PdfBackend,
    page_id: PageId,
    media_box: Rect,
) -> Result<PageContent, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();
    let images = backend.page_images(page_id);

    let mut walker = PageWalker::new(&fonts, &images, media_box);
    for op in &ops {
        walker.apply(op.operator.as_str(), &op.operands);
    }

    Ok(walker.content)
}

// ---------------------------------------------------------------------------
// Public API: multi-page extraction
// ---------------------------------------------------------------------------

/// Extract every page of the document into a [`TextPage`].
///
/// Pages whose content cannot be decoded come back empty; a broken content
/// stream on one page does not make the rest of the document unreadable.
pub fn extract_all_pages(backend: &dyn PdfBackend) -> Vec<TextPage> {
    let page_map = backend.pages();
    let mut result: Vec<TextPage> = Vec::with_capacity(page_map.len());

    for (index, (&page_num, &page_id)) in page_map.iter().enumerate() {
        let number = index + 1;
        let media_box = backend.media_box(page_id).unwrap_or_else(|e| {
            log::warn!("page {page_num}: {e}; assuming US Letter");
            Rect::new(0.0, 0.0, 612.0, 792.0)
        });

        let page = match extract_page_content(backend, page_id, media_box) {
            Ok(content) => assemble_page(number, media_box, content),
            Err(e) => {
                log::warn!("page {page_num}: cannot extract text: {e}");
                TextPage::empty(number, media_box.width(), media_box.height())
            }
        };
        result.push(page);
    }

    result
}

/// Turn the raw content of one page into its block structure.
pub fn assemble_page(number: usize, media_box: Rect, content: PageContent) -> TextPage {
    let lines = group_spans_into_lines(content.spans);
    let mut blocks = group_lines_into_blocks(lines);
    blocks.extend(content.images.into_iter().map(TextBlock::image));
    TextPage {
        number,
        width: media_box.width(),
        height: media_box.height(),
        blocks,
    }
}

// ---------------------------------------------------------------------------
// Public API: span -> line grouping
// ---------------------------------------------------------------------------

/// Group a flat list of [`RawSpan`]s into [`TextLine`]s.
///
/// Spans whose baselines are within [`Y_TOLERANCE`] points of each other are
/// placed on the same row.  Within a row, spans are sorted left-to-right,
/// adjacent spans of the same style are merged, and a horizontal gap wider
/// than [`LINE_SPLIT_FACTOR`] times the font size splits the row into
/// separate lines (e.g. a running header with a left and a right part).
pub fn group_spans_into_lines(mut spans: Vec<RawSpan>) -> Vec<TextLine> {
    if spans.is_empty() {
        return Vec::new();
    }

    // Top of page first, then left to right.
    spans.sort_by(|a, b| a.baseline.total_cmp(&b.baseline).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<RawSpan>> = Vec::new();
    let mut current: Vec<RawSpan> = Vec::new();
    let mut current_y = spans[0].baseline;

    for span in spans {
        if (span.baseline - current_y).abs() <= Y_TOLERANCE {
            current.push(span);
        } else {
            rows.push(std::mem::take(&mut current));
            current_y = span.baseline;
            current.push(span);
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }

    rows.into_iter().flat_map(assemble_row).collect()
}

/// Build one or more [`TextLine`]s from spans known to share a baseline.
fn assemble_row(mut spans: Vec<RawSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut lines: Vec<Vec<RawSpan>> = Vec::new();
    let mut merged: Vec<RawSpan> = Vec::with_capacity(spans.len());

    for span in spans {
        if let Some(prev) = merged.last_mut() {
            let prev_end = prev.x + prev.width;
            let gap = span.x - prev_end;

            if gap > prev.font_size.max(span.font_size) * LINE_SPLIT_FACTOR {
                lines.push(std::mem::take(&mut merged));
                merged.push(span);
                continue;
            }

            let same_font = prev.font_name == span.font_name
                && (prev.font_size - span.font_size).abs() < 0.5
                && prev.is_bold == span.is_bold
                && prev.is_italic == span.is_italic;

            if same_font && gap < MIN_WORD_GAP && gap > -prev.font_size {
                // Adjacent or overlapping -- concatenate directly.
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }

            if same_font && gap >= MIN_WORD_GAP {
                // Meaningful gap but still the same run -- insert a space
                // unless both boundary characters are from spaceless scripts.
                if !boundary_is_spaceless(prev, &span) && !prev.text.ends_with(' ') {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.width = (span.x + span.width) - prev.x;
                continue;
            }
        }

        merged.push(span);
    }
    if !merged.is_empty() {
        lines.push(merged);
    }

    lines
        .into_iter()
        .map(|spans| TextLine::from_spans(spans.into_iter().map(RawSpan::into_span).collect()))
        .collect()
}

/// Check whether the boundary between two adjacent spans is between
/// spaceless-script characters (no space needed).
fn boundary_is_spaceless(prev: &RawSpan, next: &RawSpan) -> bool {
    let last_char = prev.text.chars().next_back();
    let first_char = next.text.chars().next();
    match (last_char, first_char) {
        (Some(l), Some(f)) => is_spaceless_script_char(l) && is_spaceless_script_char(f),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Public API: line -> block grouping
// ---------------------------------------------------------------------------

/// Font size that covers the most characters in the line.
fn line_font_size(line: &TextLine) -> f32 {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for s in &line.spans {
        let key = (s.size * 100.0).round() as i32;
        *counts.entry(key).or_insert(0) += s.text.chars().count();
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(k, _)| k as f32 / 100.0)
        .unwrap_or(0.0)
}

fn line_all_bold(line: &TextLine) -> bool {
    !line.spans.is_empty() && line.spans.iter().all(|s| s.bold)
}

/// Whether `line` continues the paragraph whose last line is `last`.
fn continues_block(last: &TextLine, block_bbox: &Rect, line: &TextLine) -> bool {
    let last_size = line_font_size(last);
    let size = line_font_size(line);
    let gap = line.bbox.y0 - last.bbox.y0;

    gap > 0.0
        && gap <= last_size.max(size) * BLOCK_GAP_FACTOR + last.bbox.height().max(0.0) * 0.2
        && block_bbox.overlaps_horizontally(&line.bbox)
        && (last_size - size).abs() < BLOCK_SIZE_TOLERANCE
        && line_all_bold(last) == line_all_bold(line)
}

/// Group [`TextLine`]s (top-to-bottom order) into paragraph [`TextBlock`]s.
///
/// A line joins the most recent block whose last line sits directly above
/// it: the vertical step is at most [`BLOCK_GAP_FACTOR`] times the font
/// size, the line overlaps the block horizontally, the sizes agree within
/// [`BLOCK_SIZE_TOLERANCE`], and both lines share their all-bold status.
/// Otherwise the line opens a new block.  Blocks are returned in the order
/// of their first line.
pub fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<TextBlock> {
    let mut groups: Vec<(Rect, Vec<TextLine>)> = Vec::new();

    for line in lines {
        let target = groups.iter().rposition(|(bbox, members)| {
            members
                .last()
                .is_some_and(|last| continues_block(last, bbox, &line))
        });

        match target {
            Some(i) => {
                let (bbox, members) = &mut groups[i];
                *bbox = bbox.union(&line.bbox);
                members.push(line);
            }
            None => groups.push((line.bbox, vec![line])),
        }
    }

    groups
        .into_iter()
        .map(|(_, members)| TextBlock::text(members))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
