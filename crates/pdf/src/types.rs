use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page space (origin top-left, y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Rect { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Union of every rectangle in `rects`, or `None` for an empty iterator.
    pub fn union_all<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        rects.into_iter().fold(None, |acc, r| match acc {
            None => Some(*r),
            Some(a) => Some(a.union(r)),
        })
    }

    /// True when the horizontal extents of the two rectangles intersect.
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.1}, {:.1}, {:.1}, {:.1})",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}

/// A run of text drawn with a single font at a single size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub size: f32,
    pub font: String,
    pub bold: bool,
    pub italic: bool,
    pub bbox: Rect,
}

/// One visual line of spans, ordered left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub bbox: Rect,
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    /// Build a line from spans, deriving the bounding box from their union.
    pub fn from_spans(spans: Vec<TextSpan>) -> Self {
        let bbox = Rect::union_all(spans.iter().map(|s| &s.bbox)).unwrap_or_default();
        TextLine { bbox, spans }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Text => write!(f, "text"),
            BlockKind::Image => write!(f, "image"),
        }
    }
}

/// A paragraph-like group of lines, or an image placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub bbox: Rect,
    pub lines: Vec<TextLine>,
}

impl TextBlock {
    pub fn text(lines: Vec<TextLine>) -> Self {
        let bbox = Rect::union_all(lines.iter().map(|l| &l.bbox)).unwrap_or_default();
        TextBlock {
            kind: BlockKind::Text,
            bbox,
            lines,
        }
    }

    pub fn image(bbox: Rect) -> Self {
        TextBlock {
            kind: BlockKind::Image,
            bbox,
            lines: Vec::new(),
        }
    }
}

/// Positioned text of a single page as reported by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPage {
    /// 1-based page number.
    pub number: usize,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<TextBlock>,
}

impl TextPage {
    pub fn empty(number: usize, width: f32, height: f32) -> Self {
        TextPage {
            number,
            width,
            height,
            blocks: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_union() {
        let a = Rect::new(10.0, 10.0, 50.0, 20.0);
        let b = Rect::new(5.0, 15.0, 40.0, 30.0);
        assert_eq!(a.union(&b), Rect::new(5.0, 10.0, 50.0, 30.0));
    }

    #[test]
    fn test_rect_union_all_empty() {
        assert!(Rect::union_all(std::iter::empty()).is_none());
    }

    #[test]
    fn test_rect_overlaps_horizontally() {
        let a = Rect::new(0.0, 0.0, 100.0, 10.0);
        assert!(a.overlaps_horizontally(&Rect::new(90.0, 20.0, 200.0, 30.0)));
        assert!(!a.overlaps_horizontally(&Rect::new(101.0, 0.0, 200.0, 10.0)));
    }

    #[test]
    fn test_text_line_bbox_from_spans() {
        let span = |x0: f32, x1: f32| TextSpan {
            text: "x".to_string(),
            size: 12.0,
            font: "Helvetica".to_string(),
            bold: false,
            italic: false,
            bbox: Rect::new(x0, 100.0, x1, 112.0),
        };
        let line = TextLine::from_spans(vec![span(72.0, 100.0), span(110.0, 150.0)]);
        assert_eq!(line.bbox, Rect::new(72.0, 100.0, 150.0, 112.0));
    }

    #[test]
    fn test_block_kind_display() {
        assert_eq!(BlockKind::Image.to_string(), "image");
        assert_eq!(BlockKind::Text.to_string(), "text");
    }
}
