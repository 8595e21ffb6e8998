use crate::config::OutlineConfig;
use crate::rules::{evaluate, LineFacts};
use crate::structure::{Block, DocumentStructure, Line};
use crate::suppression::SuppressionSet;

/// A line that scored high enough to be a heading.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingCandidate {
    pub line: Line,
    /// 1-based page number.
    pub page: usize,
    pub score: f32,
}

/// Heading score of `line` within `block` against the body baseline.
pub fn score_line(line: &Line, block: &Block, baseline: f32, config: &OutlineConfig) -> f32 {
    let facts = LineFacts::new(line, block.lines.len(), baseline, config);
    let evaluation = evaluate(&facts);
    log::trace!(
        "score {:>6.2} {:?} {:?}",
        evaluation.score,
        line.text,
        evaluation.fired
    );
    evaluation.score
}

/// Score every line outside the Suppression Set and keep those reaching
/// `min_heading_score`, in document order.
pub fn find_candidates(
    doc: &DocumentStructure,
    suppressed: &SuppressionSet,
    baseline: f32,
    config: &OutlineConfig,
) -> Vec<HeadingCandidate> {
    let candidates: Vec<HeadingCandidate> = doc
        .lines()
        .filter(|(_, _, line)| !suppressed.contains(line))
        .filter_map(|(page, block, line)| {
            let score = score_line(line, block, baseline, config);
            (score >= config.min_heading_score).then(|| HeadingCandidate {
                line: line.clone(),
                page: page.page_num,
                score,
            })
        })
        .collect();

    log::debug!("scoring: {} heading candidates", candidates.len());
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::fixtures::*;
    use crate::structure::normalize;

    #[test]
    fn test_candidates_in_document_order() {
        let pages = [
            page(
                1,
                vec![
                    block(vec![line("Introduction", 18.0, true, 72.0, 400.0)]),
                    paragraph(3, 12.0, 72.0, 430.0),
                ],
            ),
            page(
                2,
                vec![
                    block(vec![line("Background", 14.0, true, 72.0, 100.0)]),
                    paragraph(3, 12.0, 72.0, 130.0),
                ],
            ),
        ];
        let doc = normalize(&pages);
        let config = OutlineConfig::default();

        let found = find_candidates(&doc, &SuppressionSet::new(), 12.0, &config);
        let summary: Vec<(&str, usize, f32)> = found
            .iter()
            .map(|c| (c.line.text.as_str(), c.page, c.score))
            .collect();
        assert_eq!(
            summary,
            vec![("Introduction", 1, 26.0), ("Background", 2, 14.0)]
        );
    }

    #[test]
    fn test_suppressed_lines_skipped() {
        let pages = [page(
            1,
            vec![block(vec![line("Confidential", 18.0, true, 72.0, 20.0)])],
        )];
        let doc = normalize(&pages);
        let mut suppressed = SuppressionSet::new();
        suppressed.suppress(&doc.pages[0].blocks[0].lines[0]);

        assert!(find_candidates(&doc, &suppressed, 12.0, &OutlineConfig::default()).is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // Equal size, regular, multi-line block: title case 1.5 + short 1.0.
        let pages = [page(
            1,
            vec![block(vec![
                line("Some Label", 12.0, false, 72.0, 100.0),
                line("Other Label", 12.0, false, 72.0, 114.0),
            ])],
        )];
        let doc = normalize(&pages);

        let config = OutlineConfig {
            min_heading_score: 2.5,
            ..Default::default()
        };
        assert_eq!(find_candidates(&doc, &SuppressionSet::new(), 12.0, &config).len(), 2);

        let config = OutlineConfig {
            min_heading_score: 2.6,
            ..Default::default()
        };
        assert!(find_candidates(&doc, &SuppressionSet::new(), 12.0, &config).is_empty());
    }

    #[test]
    fn test_body_paragraph_not_a_candidate() {
        let doc = normalize(&[page(1, vec![paragraph(3, 12.0, 72.0, 100.0)])]);
        assert!(find_candidates(&doc, &SuppressionSet::new(), 12.0, &OutlineConfig::default())
            .is_empty());
    }
}
