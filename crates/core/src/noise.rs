//! Noise filter: running headers, footers, and uniform list blocks.
//!
//! Repetition is detected on a digit-insensitive key so that "Page 3 of 40"
//! and "Page 4 of 40" count as the same footer.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::config::OutlineConfig;
use crate::stats::round_half_even;
use crate::structure::{Block, DocumentStructure, Page};
use crate::suppression::SuppressionSet;

/// Keys with this many words or more are never treated as running text.
const MAX_KEY_WORDS: usize = 8;

/// A key seen on more than this many distinct pages is noise.
const MIN_REPEAT_PAGES: usize = 2;

/// Documents longer than this also treat keys on most pages as noise.
const LONG_DOCUMENT_PAGES: usize = 5;

/// Blocks with more lines than this are checked for uniform spacing.
const UNIFORM_BLOCK_MIN_LINES: usize = 5;

/// Fewer distinct line gaps than this marks a block as uniform.
const UNIFORM_MAX_DISTINCT_GAPS: usize = 3;

/// Replace every run of digits with `#`.
pub fn digit_key(text: &str) -> String {
    static RE_DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = RE_DIGITS.get_or_init(|| Regex::new(r"\d+").unwrap());
    re.replace_all(text, "#").into_owned()
}

fn in_header_or_footer(block: &Block, page: &Page, config: &OutlineConfig) -> bool {
    let is_header = block.bbox.y1 < page.height * config.header_threshold;
    let is_footer = block.bbox.y0 > page.height * config.footer_threshold;
    is_header || is_footer
}

/// Digit-normalized texts that repeat often enough in the header and footer
/// bands to count as noise.
///
/// The first page is not tallied since cover pages rarely carry running
/// headers.
pub fn noise_keys(doc: &DocumentStructure, config: &OutlineConfig) -> BTreeSet<String> {
    let mut seen: BTreeMap<String, HashSet<usize>> = BTreeMap::new();

    for page in doc.pages.iter().skip(1) {
        for block in &page.blocks {
            if !in_header_or_footer(block, page, config) {
                continue;
            }
            for line in &block.lines {
                let key = digit_key(&line.text);
                if key.split_whitespace().count() < MAX_KEY_WORDS {
                    seen.entry(key).or_default().insert(page.page_num);
                }
            }
        }
    }

    let page_count = doc.page_count();
    seen.into_iter()
        .filter(|(_, pages)| {
            pages.len() > MIN_REPEAT_PAGES
                || (page_count > LONG_DOCUMENT_PAGES && pages.len() as f32 > page_count as f32 * 0.5)
        })
        .map(|(key, _)| key)
        .collect()
}

/// True when a long block has nearly constant line spacing, the signature of
/// tables of contents, indexes, and other list-like material.
pub fn is_uniform_block(block: &Block) -> bool {
    if block.lines.len() <= UNIFORM_BLOCK_MIN_LINES {
        return false;
    }
    let gaps: HashSet<i64> = block
        .lines
        .windows(2)
        .map(|pair| round_half_even(pair[1].bbox.y0 - pair[0].bbox.y0) as i64)
        .collect();
    gaps.len() < UNIFORM_MAX_DISTINCT_GAPS
}

/// Build the initial Suppression Set.
///
/// Every line in the document whose digit key is noise is suppressed, on
/// every page and at any position. Uniform blocks are suppressed wholesale.
pub fn suppress_noise(doc: &DocumentStructure, config: &OutlineConfig) -> SuppressionSet {
    let keys = noise_keys(doc, config);
    let mut suppressed = SuppressionSet::new();
    let mut uniform_blocks = 0usize;

    for page in &doc.pages {
        for block in &page.blocks {
            if is_uniform_block(block) {
                uniform_blocks += 1;
                suppressed.extend(block.lines.iter().map(|l| l.id()));
                continue;
            }
            if keys.is_empty() {
                continue;
            }
            for line in &block.lines {
                if keys.contains(&digit_key(&line.text)) {
                    suppressed.suppress(line);
                }
            }
        }
    }

    log::debug!(
        "noise: {} repeating keys, {} uniform blocks, {} lines suppressed",
        keys.len(),
        uniform_blocks,
        suppressed.len()
    );
    suppressed
}
