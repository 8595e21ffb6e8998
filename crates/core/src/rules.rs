//! Heading classification rules.
//!
//! [`RULES`] is an ordered table of named predicates. Rejection rules run
//! first; if any fires the line scores [`REJECTED`] and nothing else is
//! evaluated. Otherwise every scoring rule contributes its weight and the
//! weights are summed in table order.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::OutlineConfig;
use crate::structure::Line;

/// Score of a hard-rejected line.
pub const REJECTED: f32 = -10.0;

/// Lines with more words than this are prose.
const MAX_HEADING_WORDS: usize = 15;

/// Lines with fewer words than this get the brevity bonus.
const SHORT_LINE_WORDS: usize = 10;

const BULLETS: &[char] = &[
    '\u{2022}', '\u{25E6}', '\u{25AA}', '\u{25CF}', '\u{25CB}', '\u{25A0}', '\u{2023}', '\u{2043}',
    '\u{00B7}', '*', '-', '\u{2013}', '\u{2014}', '|', '>',
];

/// What the rules look at, precomputed once per line.
#[derive(Debug, Clone)]
pub struct LineFacts<'a> {
    pub text: &'a str,
    pub words: usize,
    /// The line's rounded font size, or `None` when its spans disagree or it
    /// has no spans.
    pub size: Option<f32>,
    pub bold: bool,
    /// The line is the only one in its block.
    pub sole_line: bool,
    pub baseline: f32,
    pub size_ratio: f32,
}

impl<'a> LineFacts<'a> {
    pub fn new(line: &'a Line, block_lines: usize, baseline: f32, config: &OutlineConfig) -> Self {
        let sizes = line.rounded_sizes();
        let size = match sizes.split_first() {
            Some((first, rest)) if rest.iter().all(|s| s == first) => Some(*first as f32),
            _ => None,
        };
        Self {
            text: &line.text,
            words: line.word_count(),
            size,
            bold: line.has_bold_span(),
            sole_line: block_lines == 1,
            baseline,
            size_ratio: config.font_size_ratio,
        }
    }
}

pub enum Effect {
    /// The line cannot be a heading when the predicate holds.
    Reject(fn(&LineFacts) -> bool),
    /// Adds the returned weight (possibly zero or negative) to the score.
    Score(fn(&LineFacts) -> f32),
}

pub struct Rule {
    pub name: &'static str,
    pub effect: Effect,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "list_marker",
        effect: Effect::Reject(starts_with_list_marker),
    },
    Rule {
        name: "link_or_file",
        effect: Effect::Reject(contains_link_or_file),
    },
    Rule {
        name: "too_many_words",
        effect: Effect::Reject(|f| f.words > MAX_HEADING_WORDS),
    },
    Rule {
        name: "sentence_punctuation",
        effect: Effect::Reject(|f| f.text.ends_with('.') || f.text.ends_with(',')),
    },
    Rule {
        name: "mixed_font_sizes",
        effect: Effect::Reject(|f| f.size.is_none()),
    },
    Rule {
        name: "font_size",
        effect: Effect::Score(font_size_weight),
    },
    Rule {
        name: "bold",
        effect: Effect::Score(|f| if f.bold { 2.5 } else { 0.0 }),
    },
    Rule {
        name: "numbered",
        effect: Effect::Score(|f| if is_numbered(f.text) { 2.0 } else { 0.0 }),
    },
    Rule {
        name: "title_case",
        effect: Effect::Score(|f| if is_title_case(f.text) { 1.5 } else { 0.0 }),
    },
    Rule {
        name: "upper_case",
        effect: Effect::Score(|f| if is_upper_case(f.text) { 2.0 } else { 0.0 }),
    },
    Rule {
        name: "short",
        effect: Effect::Score(|f| if f.words < SHORT_LINE_WORDS { 1.0 } else { 0.0 }),
    },
    Rule {
        name: "trailing_colon",
        effect: Effect::Score(|f| if f.text.ends_with(':') { 2.0 } else { 0.0 }),
    },
    Rule {
        name: "sole_line",
        effect: Effect::Score(|f| if f.sole_line { 3.0 } else { 0.0 }),
    },
    Rule {
        name: "small_regular",
        effect: Effect::Score(|f| match f.size {
            Some(s) if s < f.baseline && !f.bold => -3.0,
            _ => 0.0,
        }),
    },
];

/// Result of running [`RULES`] over one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub score: f32,
    /// Names of the rules that rejected the line or changed its score.
    pub fired: Vec<&'static str>,
}

pub fn evaluate(facts: &LineFacts) -> Evaluation {
    for rule in RULES {
        if let Effect::Reject(applies) = rule.effect {
            if applies(facts) {
                return Evaluation {
                    score: REJECTED,
                    fired: vec![rule.name],
                };
            }
        }
    }

    let mut score = 0.0;
    let mut fired = Vec::new();
    for rule in RULES {
        if let Effect::Score(weight) = rule.effect {
            let w = weight(facts);
            if w != 0.0 {
                score += w;
                fired.push(rule.name);
            }
        }
    }
    Evaluation { score, fired }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

pub fn starts_with_list_marker(facts: &LineFacts) -> bool {
    let trimmed = facts.text.trim_start();
    trimmed.starts_with(BULLETS) || facts.text.contains('`')
}

pub fn contains_link_or_file(facts: &LineFacts) -> bool {
    static RE_LINK: OnceLock<Regex> = OnceLock::new();
    let re = RE_LINK.get_or_init(|| {
        Regex::new(
            r"(?i)https?://\S+|www\.\S+|\b[\w-]+\.(com|org|net|io|edu|gov|dev)\b|\S+\.(git|pdf|docx?|xlsx?|pptx?|txt|csv|json|xml|html?|zip|png|jpe?g)$",
        )
        .unwrap()
    });
    re.is_match(facts.text)
}

fn font_size_weight(facts: &LineFacts) -> f32 {
    let Some(size) = facts.size else {
        return 0.0;
    };
    if size > facts.baseline * facts.size_ratio {
        3.0 * (size - facts.baseline)
    } else if size < facts.baseline {
        -(facts.baseline - size)
    } else {
        0.0
    }
}

/// `1. Introduction`, `12. Results`.
pub fn is_numbered(text: &str) -> bool {
    static RE_NUMBERED: OnceLock<Regex> = OnceLock::new();
    let re = RE_NUMBERED.get_or_init(|| Regex::new(r"^\d+\.\s").unwrap());
    re.is_match(text)
}

/// Every cased run starts with an upper-case letter followed only by
/// lower-case letters, and there is at least one cased letter.
pub fn is_title_case(text: &str) -> bool {
    let mut any_cased = false;
    let mut prev_cased = false;
    for c in text.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            any_cased = true;
        } else {
            prev_cased = false;
        }
    }
    any_cased
}

/// At least one cased letter and no lower-case letters.
pub fn is_upper_case(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}
