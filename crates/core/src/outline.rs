//! The output document: title, ordered headings, and an optional error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::HeadingCandidate;
use crate::styles::Level;

pub const UNREADABLE_ERROR: &str = "Could not open or read PDF file.";
pub const NO_TEXT_TITLE: &str = "No Text Found";
pub const NO_TEXT_ERROR: &str = "No text extracted from the document.";
pub const FAILED_TITLE: &str = "Extraction Failed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: Level,
    pub text: String,
    /// 1-based page number.
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A way the produced outline breaks the output contract.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("title is empty")]
    EmptyTitle,
    #[error("entry {index} has empty text")]
    EmptyText { index: usize },
    #[error("entry {index} is on page {page}, outside 1..={page_count}")]
    PageOutOfRange {
        index: usize,
        page: usize,
        page_count: usize,
    },
    #[error("entry {index} is on page {page}, before the previous entry's page {previous}")]
    PagesDecreasing {
        index: usize,
        page: usize,
        previous: usize,
    },
}

impl Outline {
    pub fn new(title: impl Into<String>, outline: Vec<OutlineEntry>) -> Self {
        Self {
            title: title.into(),
            outline,
            error: None,
        }
    }

    /// The input could not be opened or parsed as a PDF.
    pub fn unreadable(file_name: impl Into<String>) -> Self {
        Self {
            title: file_name.into(),
            outline: Vec::new(),
            error: Some(UNREADABLE_ERROR.to_string()),
        }
    }

    /// The document decoded fine but holds no text.
    pub fn no_text() -> Self {
        Self {
            title: NO_TEXT_TITLE.to_string(),
            outline: Vec::new(),
            error: Some(NO_TEXT_ERROR.to_string()),
        }
    }

    /// Processing crashed; `message` says why.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            title: FAILED_TITLE.to_string(),
            outline: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Every way this outline violates the output contract for a document
    /// of `page_count` pages.
    pub fn validate(&self, page_count: usize) -> Vec<ValidationError> {
        let mut problems = Vec::new();
        if self.title.trim().is_empty() {
            problems.push(ValidationError::EmptyTitle);
        }

        let mut previous: Option<usize> = None;
        for (index, entry) in self.outline.iter().enumerate() {
            if entry.text.trim().is_empty() {
                problems.push(ValidationError::EmptyText { index });
            }
            if entry.page == 0 || entry.page > page_count {
                problems.push(ValidationError::PageOutOfRange {
                    index,
                    page: entry.page,
                    page_count,
                });
            }
            if let Some(prev) = previous.filter(|&prev| entry.page < prev) {
                problems.push(ValidationError::PagesDecreasing {
                    index,
                    page: entry.page,
                    previous: prev,
                });
            }
            previous = Some(entry.page);
        }
        problems
    }

    /// Pretty JSON with two-space indentation; non-ASCII stays unescaped.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Order leveled candidates by page, then by vertical position, keeping
/// document order for equal keys.
pub fn assemble(title: String, candidates: Vec<HeadingCandidate>, levels: Vec<Level>) -> Outline {
    let mut rows: Vec<(HeadingCandidate, Level)> = candidates.into_iter().zip(levels).collect();
    rows.sort_by(|(a, _), (b, _)| {
        a.page
            .cmp(&b.page)
            .then(a.line.bbox.y0.total_cmp(&b.line.bbox.y0))
    });

    let outline = rows
        .into_iter()
        .map(|(candidate, level)| OutlineEntry {
            level,
            text: candidate.line.text,
            page: candidate.page,
        })
        .collect();
    Outline::new(title, outline)
}
