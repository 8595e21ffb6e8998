//! Title detection by layout scoring on the first pages.

use crate::config::OutlineConfig;
use crate::stats::median;
use crate::structure::{Block, DocumentStructure, LineId, Page};
use crate::suppression::SuppressionSet;

pub const UNTITLED: &str = "Untitled Document";

/// Title blocks must start within this fraction of the page height.
const TITLE_ZONE: f32 = 0.4;

/// Blocks with more lines than this are paragraphs, not titles.
const MAX_TITLE_LINES: usize = 4;

const CENTERING_WEIGHT: f32 = 15.0;
const POSITION_WEIGHT: f32 = 5.0;

/// The chosen title and the lines it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub text: String,
    pub line_ids: Vec<LineId>,
    pub page: Option<usize>,
    pub score: Option<f32>,
}

impl Title {
    pub fn untitled() -> Self {
        Self {
            text: UNTITLED.to_string(),
            line_ids: Vec::new(),
            page: None,
            score: None,
        }
    }
}

/// Layout score of a title candidate block, or `None` when the block cannot
/// be a title.
pub fn score_block(block: &Block, page: &Page, suppressed: &SuppressionSet) -> Option<f32> {
    if !(1..=MAX_TITLE_LINES).contains(&block.lines.len()) {
        return None;
    }
    if block.bbox.y0 > page.height * TITLE_ZONE {
        return None;
    }
    if block.lines.iter().any(|l| suppressed.contains(l)) {
        return None;
    }
    if block.lines.iter().all(|l| l.text.is_empty()) {
        return None;
    }

    let sizes: Vec<f32> = block
        .lines
        .iter()
        .flat_map(|l| l.spans.iter().map(|s| s.size))
        .collect();
    let size = median(&sizes).unwrap_or(0.0);

    let page_cx = page.width / 2.0;
    let centering = if page_cx > 0.0 {
        let offset = (block.bbox.center_x() - page_cx).abs() / page_cx;
        (CENTERING_WEIGHT * (1.0 - offset)).clamp(0.0, CENTERING_WEIGHT)
    } else {
        0.0
    };

    let zone = page.height * TITLE_ZONE;
    let position = if zone > 0.0 {
        (POSITION_WEIGHT * (1.0 - block.bbox.y0 / zone)).clamp(0.0, POSITION_WEIGHT)
    } else {
        0.0
    };

    Some(size + centering + position)
}

/// Pick the best-scoring block on the first `title_page_limit` pages.
///
/// Ties go to the earliest candidate in document order.
pub fn detect_title(
    doc: &DocumentStructure,
    suppressed: &SuppressionSet,
    config: &OutlineConfig,
) -> Title {
    let mut best: Option<(f32, &Page, &Block)> = None;

    for page in doc.pages.iter().take(config.title_page_limit) {
        for block in &page.blocks {
            let Some(score) = score_block(block, page, suppressed) else {
                continue;
            };
            if best.is_none_or(|(top, _, _)| score > top) {
                best = Some((score, page, block));
            }
        }
    }

    let Some((score, page, block)) = best else {
        log::debug!("title: no candidate block");
        return Title::untitled();
    };

    let text = block
        .lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    log::debug!("title: {text:?} on page {} (score {score:.2})", page.page_num);

    Title {
        text,
        line_ids: block.lines.iter().map(|l| l.id()).collect(),
        page: Some(page.page_num),
        score: Some(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::fixtures::*;
    use crate::structure::normalize;

    fn default_config() -> OutlineConfig {
        OutlineConfig::default()
    }

    #[test]
    fn test_centered_large_block_wins() {
        // "Annual Report" at 24pt is 13 * 12 = 156pt wide; centered on 612.
        let pages = [page(
            1,
            vec![
                block(vec![line("Annual Report", 24.0, true, 228.0, 72.0)]),
                block(vec![line("Prepared by the team", 11.0, false, 72.0, 150.0)]),
                paragraph(4, 11.0, 72.0, 400.0),
            ],
        )];
        let doc = normalize(&pages);

        let title = detect_title(&doc, &SuppressionSet::new(), &default_config());
        assert_eq!(title.text, "Annual Report");
        assert_eq!(title.line_ids.len(), 1);
        assert_eq!(title.page, Some(1));
    }

    #[test]
    fn test_multi_line_title_joined() {
        let pages = [page(
            1,
            vec![block(vec![
                line("Understanding", 20.0, true, 200.0, 80.0),
                line("Layout Analysis", 20.0, true, 190.0, 104.0),
            ])],
        )];
        let doc = normalize(&pages);

        let title = detect_title(&doc, &SuppressionSet::new(), &default_config());
        assert_eq!(title.text, "Understanding Layout Analysis");
        assert_eq!(title.line_ids.len(), 2);
    }

    #[test]
    fn test_no_candidate_gives_untitled() {
        // Everything sits below 40% of the page.
        let pages = [page(1, vec![paragraph(3, 11.0, 72.0, 400.0)])];
        let doc = normalize(&pages);

        let title = detect_title(&doc, &SuppressionSet::new(), &default_config());
        assert_eq!(title, Title::untitled());
    }

    #[test]
    fn test_suppressed_block_skipped() {
        let pages = [page(
            1,
            vec![
                block(vec![line("Running Header", 30.0, true, 200.0, 20.0)]),
                block(vec![line("Real Title", 18.0, true, 230.0, 100.0)]),
            ],
        )];
        let doc = normalize(&pages);
        let mut suppressed = SuppressionSet::new();
        suppressed.suppress(&doc.pages[0].blocks[0].lines[0]);

        let title = detect_title(&doc, &suppressed, &default_config());
        assert_eq!(title.text, "Real Title");
    }

    #[test]
    fn test_long_blocks_rejected() {
        let pages = [page(1, vec![paragraph(5, 30.0, 72.0, 50.0)])];
        let doc = normalize(&pages);
        assert_eq!(
            detect_title(&doc, &SuppressionSet::new(), &default_config()).text,
            UNTITLED
        );
    }

    #[test]
    fn test_page_limit() {
        let pages = [
            page(1, vec![paragraph(3, 11.0, 72.0, 500.0)]),
            page(2, vec![paragraph(3, 11.0, 72.0, 500.0)]),
            page(3, vec![block(vec![line("Late Title", 24.0, true, 240.0, 72.0)])]),
        ];
        let doc = normalize(&pages);
        assert_eq!(
            detect_title(&doc, &SuppressionSet::new(), &default_config()).text,
            UNTITLED
        );

        let config = OutlineConfig {
            title_page_limit: 3,
            ..Default::default()
        };
        assert_eq!(
            detect_title(&doc, &SuppressionSet::new(), &config).text,
            "Late Title"
        );
    }

    #[test]
    fn test_tie_prefers_first_in_document_order() {
        let twin = || block(vec![line("Same", 16.0, true, 274.0, 100.0)]);
        let pages = [page(1, vec![twin()]), page(2, vec![twin()])];
        let doc = normalize(&pages);

        let title = detect_title(&doc, &SuppressionSet::new(), &default_config());
        assert_eq!(title.page, Some(1));
    }

    #[test]
    fn test_score_components() {
        let pages = [page(
            1,
            vec![block(vec![line("Centered", 20.0, false, 226.0, 0.0)])],
        )];
        let doc = normalize(&pages);
        let page = &doc.pages[0];
        // Width 8 * 10 = 80: center 266 vs 306. Offset 40/306.
        let score = score_block(&page.blocks[0], page, &SuppressionSet::new()).unwrap();
        let expected = 20.0 + 15.0 * (1.0 - 40.0 / 306.0) + 5.0;
        assert!((score - expected).abs() < 1e-3, "{score} vs {expected}");
    }
}
