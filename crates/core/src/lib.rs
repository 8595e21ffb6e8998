//! Core library for pdfoutline
//!
//! This crate implements the **Functional Core** of the pdfoutline application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The pdfoutline project uses a three-crate architecture to enforce separation of concerns:
//!
//! - **`pdf`**: Decodes PDF bytes into positioned text (pages, blocks, lines, spans)
//! - **`outline_core`** (this crate): Pure transformation functions with zero I/O
//! - **`pdfoutline`**: File system, batch driving, and output (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no global state
//! - **Deterministic**: Every median, mode, and ranking has an explicit tie rule
//! - **Testable**: Can be tested with hand-built pages, no PDF files required
//!
//! # Pipeline
//!
//! [`extract_outline`] runs the stages in a fixed order, each consuming the
//! previous stage's output:
//!
//! 1. [`structure::normalize`]: decoded pages into the Document Structure
//! 2. [`noise::suppress_noise`]: running headers, footers, uniform blocks
//! 3. [`title::detect_title`]: best layout candidate on the first pages
//! 4. [`baseline::body_baseline`]: dominant body-text size
//! 5. [`scoring::find_candidates`]: every unsuppressed line against [`rules::RULES`]
//! 6. [`styles::assign_levels`]: style clusters ranked into H1/H2/H3
//! 7. [`outline::assemble`]: entries ordered by page and position
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use outline_core::{extract_outline, OutlineConfig};
//!
//! let pages = pdf::open("report.pdf")?;
//! let outline = extract_outline(&pages, &OutlineConfig::default());
//! println!("{}", outline.to_json_pretty()?);
//! ```

pub mod baseline;
pub mod config;
pub mod noise;
pub mod outline;
pub mod rules;
pub mod scoring;
pub mod stats;
pub mod structure;
pub mod styles;
pub mod suppression;
pub mod title;

pub use config::{ConfigError, OutlineConfig};
pub use outline::{Outline, OutlineEntry, ValidationError};
pub use structure::DocumentStructure;
pub use styles::Level;

use pdf::TextPage;

/// Infer the title and heading outline of a decoded document.
pub fn extract_outline(pages: &[TextPage], config: &OutlineConfig) -> Outline {
    let doc = structure::normalize(pages);
    outline_from_structure(&doc, config)
}

/// Run stages 2-7 over an already normalized document.
pub fn outline_from_structure(doc: &DocumentStructure, config: &OutlineConfig) -> Outline {
    if !doc.has_text() {
        return Outline::no_text();
    }

    let mut suppressed = noise::suppress_noise(doc, config);
    let title = title::detect_title(doc, &suppressed, config);
    suppressed.extend(title.line_ids);

    let baseline = baseline::body_baseline(doc, config);
    let candidates = scoring::find_candidates(doc, &suppressed, baseline, config);
    let levels = styles::assign_levels(&candidates);

    let outline = outline::assemble(title.text, candidates, levels);
    for problem in outline.validate(doc.page_count()) {
        log::warn!("outline check: {problem}");
    }
    outline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::fixtures::*;

    fn levels_and_texts(outline: &Outline) -> Vec<(Level, &str, usize)> {
        outline
            .outline
            .iter()
            .map(|e| (e.level, e.text.as_str(), e.page))
            .collect()
    }

    #[test]
    fn test_centered_title_with_plain_body() {
        // "Annual Report 2024" at 24pt: 18 * 12 = 216 wide, centered on 612.
        let pages = [page(
            1,
            vec![
                block(vec![line("Annual Report 2024", 24.0, true, 198.0, 80.0)]),
                paragraph(6, 11.0, 72.0, 200.0),
                paragraph(3, 11.0, 72.0, 320.0),
            ],
        )];

        let outline = extract_outline(&pages, &OutlineConfig::default());
        assert_eq!(outline.title, "Annual Report 2024");
        assert!(outline.outline.is_empty());
        assert_eq!(outline.error, None);
    }

    #[test]
    fn test_page_footer_never_in_outline() {
        let pages: Vec<_> = (1..=6)
            .map(|n| {
                page(
                    n,
                    vec![
                        paragraph(3, 11.0, 72.0, 300.0),
                        block(vec![line(&format!("Page {n} of 6"), 14.0, true, 260.0, 760.0)]),
                    ],
                )
            })
            .collect();

        let doc = structure::normalize(&pages);
        let suppressed = noise::suppress_noise(&doc, &OutlineConfig::default());
        assert_eq!(suppressed.len(), 6);

        let outline = extract_outline(&pages, &OutlineConfig::default());
        assert!(outline.outline.iter().all(|e| !e.text.starts_with("Page ")));
        assert!(!outline.title.starts_with("Page "));
    }

    #[test]
    fn test_two_heading_levels() {
        // Headings sit below the title zone, so no title is found.
        let pages = [page(
            1,
            vec![
                block(vec![line("Introduction", 18.0, true, 72.0, 340.0)]),
                paragraph(3, 12.0, 72.0, 370.0),
                block(vec![line("Background", 14.0, true, 72.0, 450.0)]),
                paragraph(3, 12.0, 72.0, 480.0),
            ],
        )];

        let outline = extract_outline(&pages, &OutlineConfig::default());
        assert_eq!(outline.title, "Untitled Document");
        assert_eq!(
            levels_and_texts(&outline),
            vec![(Level::H1, "Introduction", 1), (Level::H2, "Background", 1)]
        );
    }

    #[test]
    fn test_no_text_document() {
        let pages = [page(1, vec![]), page(2, vec![])];
        assert_eq!(extract_outline(&pages, &OutlineConfig::default()), Outline::no_text());
        assert_eq!(extract_outline(&[], &OutlineConfig::default()), Outline::no_text());
    }

    #[test]
    fn test_uniform_document_has_empty_outline() {
        let pages: Vec<_> = (1..=3)
            .map(|n| {
                page(
                    n,
                    vec![
                        paragraph(4, 11.0, 72.0, 400.0),
                        paragraph(3, 11.0, 72.0, 500.0),
                    ],
                )
            })
            .collect();

        let outline = extract_outline(&pages, &OutlineConfig::default());
        assert!(outline.outline.is_empty());
        assert!(!outline.title.is_empty());
    }

    #[test]
    fn test_title_lines_excluded_from_outline() {
        let pages = [page(
            1,
            vec![
                block(vec![line("Design Notes", 26.0, true, 228.0, 60.0)]),
                block(vec![line("Overview", 16.0, true, 72.0, 200.0)]),
                paragraph(3, 11.0, 72.0, 230.0),
            ],
        )];

        let outline = extract_outline(&pages, &OutlineConfig::default());
        assert_eq!(outline.title, "Design Notes");
        assert_eq!(
            levels_and_texts(&outline),
            vec![(Level::H1, "Overview", 1)]
        );
    }

    #[test]
    fn test_headings_across_pages_in_order() {
        let pages = [
            page(
                1,
                vec![
                    block(vec![line("1. Scope", 16.0, true, 72.0, 350.0)]),
                    paragraph(3, 11.0, 72.0, 380.0),
                    block(vec![line("1.1 Goals", 13.0, true, 90.0, 460.0)]),
                    paragraph(3, 11.0, 90.0, 490.0),
                ],
            ),
            page(
                2,
                vec![
                    block(vec![line("2. Method", 16.0, true, 72.0, 350.0)]),
                    paragraph(3, 11.0, 72.0, 380.0),
                ],
            ),
        ];

        let outline = extract_outline(&pages, &OutlineConfig::default());
        assert_eq!(
            levels_and_texts(&outline),
            vec![
                (Level::H1, "1. Scope", 1),
                (Level::H2, "1.1 Goals", 1),
                (Level::H1, "2. Method", 2),
            ]
        );
        assert!(outline.validate(2).is_empty());
    }

    #[test]
    fn test_repeated_runs_are_byte_identical() {
        let pages = [page(
            1,
            vec![
                block(vec![line("Title", 24.0, true, 276.0, 60.0)]),
                block(vec![line("Alpha", 14.0, true, 72.0, 340.0)]),
                paragraph(3, 11.0, 72.0, 370.0),
                block(vec![line("Beta", 14.0, false, 72.0, 450.0)]),
                paragraph(3, 11.0, 72.0, 480.0),
            ],
        )];
        let config = OutlineConfig::default();

        let first = extract_outline(&pages, &config).to_json_pretty().unwrap();
        let second = extract_outline(&pages, &config).to_json_pretty().unwrap();
        assert_eq!(first, second);
    }
}
