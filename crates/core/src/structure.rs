//! Document Structure: the normalized page/block/line model every later
//! stage reads.
//!
//! [`normalize`] is the only producer. It keeps text blocks in the order the
//! decoder reported them, joins span texts into line texts, and drops lines
//! and blocks that carry no text.

use pdf::parser::cleanup::normalize_whitespace;
use pdf::{BlockKind, Rect, TextPage, TextSpan};
use serde::Serialize;

use crate::stats::round_half_even;

/// One visual line of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    /// Space-joined span texts with whitespace collapsed and trimmed.
    pub text: String,
    pub bbox: Rect,
    pub spans: Vec<TextSpan>,
}

/// Identity of a line for suppression and repetition matching: the text plus
/// its bounding box rounded half-to-even.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId {
    pub text: String,
    pub bbox: [i64; 4],
}

impl Line {
    pub fn id(&self) -> LineId {
        let r = |v: f32| round_half_even(v) as i64;
        LineId {
            text: self.text.clone(),
            bbox: [r(self.bbox.x0), r(self.bbox.y0), r(self.bbox.x1), r(self.bbox.y1)],
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn has_bold_span(&self) -> bool {
        self.spans.iter().any(|s| s.bold)
    }

    /// Span sizes rounded half-to-even, in span order.
    pub fn rounded_sizes(&self) -> Vec<i64> {
        self.spans
            .iter()
            .map(|s| round_half_even(s.size) as i64)
            .collect()
    }
}

/// A visual paragraph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub bbox: Rect,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// 1-based.
    pub page_num: usize,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentStructure {
    pub pages: Vec<Page>,
}

impl DocumentStructure {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every line in document order, with its page and block.
    pub fn lines(&self) -> impl Iterator<Item = (&Page, &Block, &Line)> {
        self.pages.iter().flat_map(|page| {
            page.blocks
                .iter()
                .flat_map(move |block| block.lines.iter().map(move |line| (page, block, line)))
        })
    }

    pub fn has_text(&self) -> bool {
        self.lines().next().is_some()
    }
}

/// Build the Document Structure from decoded pages.
///
/// Image blocks are skipped, empty lines are dropped, and blocks left without
/// lines are dropped. Line text collapses every whitespace run to one space. Pages are renumbered 1..=n in the order given, so an
/// empty page still counts towards the page total.
pub fn normalize(pages: &[TextPage]) -> DocumentStructure {
    let pages = pages
        .iter()
        .enumerate()
        .map(|(index, page)| Page {
            page_num: index + 1,
            width: page.width,
            height: page.height,
            blocks: page
                .blocks
                .iter()
                .filter(|block| block.kind == BlockKind::Text)
                .filter_map(|block| {
                    let lines: Vec<Line> = block
                        .lines
                        .iter()
                        .filter_map(|line| {
                            let joined = line
                                .spans
                                .iter()
                                .map(|s| s.text.as_str())
                                .collect::<Vec<_>>()
                                .join(" ");
                            let text = normalize_whitespace(&joined);
                            (!text.is_empty()).then(|| Line {
                                text,
                                bbox: line.bbox,
                                spans: line.spans.clone(),
                            })
                        })
                        .collect();
                    (!lines.is_empty()).then_some(Block {
                        bbox: block.bbox,
                        lines,
                    })
                })
                .collect(),
        })
        .collect();

    DocumentStructure { pages }
}
