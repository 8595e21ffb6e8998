//! Positioned-text extraction for PDF documents.
//!
//! The crate turns a PDF into a list of [`TextPage`]s: blocks of lines of
//! styled spans, each with a bounding box in top-left page coordinates.
//! `lopdf` does the object-level parsing behind the [`parser::backend::PdfBackend`]
//! trait; everything above it is pure layout code.

use std::path::Path;

use thiserror::Error;

use parser::backend::{LopdfBackend, PdfBackend};

pub mod parser;
pub mod types;

pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Decode PDF bytes into positioned text, one [`TextPage`] per page.
///
/// Fails only when the document itself cannot be loaded. Pages with broken
/// content streams come back empty.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<TextPage>, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    let pages = parser::layout::extract_all_pages(&backend);
    log::debug!(
        "decoded {} of {} pages",
        pages.iter().filter(|p| !p.blocks.is_empty()).count(),
        backend.page_count()
    );
    Ok(pages)
}

/// Read a PDF file from disk and decode it with [`extract_pages`].
pub fn open(path: impl AsRef<Path>) -> Result<Vec<TextPage>, PdfError> {
    let bytes = std::fs::read(path.as_ref())?;
    extract_pages(&bytes)
}

/// Number of pages in the document without decoding any content.
pub fn page_count(bytes: &[u8]) -> Result<usize, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    Ok(backend.pages().len())
}
