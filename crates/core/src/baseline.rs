use crate::config::OutlineConfig;
use crate::stats::median;
use crate::structure::DocumentStructure;

/// Body size assumed when a document has no line long enough to measure.
pub const DEFAULT_BODY_SIZE: f32 = 10.0;

/// Estimate the dominant body-text size.
///
/// Collects the rounded span sizes of every line with more than
/// `min_body_text_words` words and no bold span, and returns their median.
pub fn body_baseline(doc: &DocumentStructure, config: &OutlineConfig) -> f32 {
    let sizes: Vec<f32> = doc
        .lines()
        .filter(|(_, _, line)| {
            line.word_count() > config.min_body_text_words && !line.has_bold_span()
        })
        .flat_map(|(_, _, line)| line.rounded_sizes())
        .map(|size| size as f32)
        .collect();

    let baseline = median(&sizes).unwrap_or(DEFAULT_BODY_SIZE);
    log::debug!("baseline: {baseline} from {} spans", sizes.len());
    baseline
}
