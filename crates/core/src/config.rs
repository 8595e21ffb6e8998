//! Tunable thresholds for outline inference.
//!
//! Configuration is a plain value handed to [`crate::extract_outline`]; the
//! shell layers defaults, an optional TOML file, and command-line overrides
//! before calling [`OutlineConfig::validate`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must lie strictly between 0 and 1, got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f32 },
    #[error("header_threshold ({header}) must be below footer_threshold ({footer})")]
    BandsOverlap { header: f32, footer: f32 },
    #[error("{name} is invalid: {reason}")]
    InvalidValue { name: &'static str, reason: String },
    #[error("cannot parse configuration: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutlineConfig {
    /// Blocks whose bottom edge lies above this fraction of the page height
    /// are header candidates.
    pub header_threshold: f32,
    /// Blocks whose top edge lies below this fraction of the page height are
    /// footer candidates.
    pub footer_threshold: f32,
    /// Lines scoring at least this much become headings.
    pub min_heading_score: f32,
    /// A line gets the size bonus only when larger than `baseline * ratio`.
    pub font_size_ratio: f32,
    /// Lines need more than this many words to count as body text.
    pub min_body_text_words: usize,
    /// How many leading pages are searched for the title.
    pub title_page_limit: usize,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            header_threshold: 0.15,
            footer_threshold: 0.85,
            min_heading_score: 3.0,
            font_size_ratio: 1.0,
            min_body_text_words: 6,
            title_page_limit: 2,
        }
    }
}

impl OutlineConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check the invariants every stage relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("header_threshold", self.header_threshold),
            ("footer_threshold", self.footer_threshold),
        ] {
            if value.is_nan() || value <= 0.0 || value >= 1.0 {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }

        if self.header_threshold >= self.footer_threshold {
            return Err(ConfigError::BandsOverlap {
                header: self.header_threshold,
                footer: self.footer_threshold,
            });
        }

        if !self.font_size_ratio.is_finite() || self.font_size_ratio <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "font_size_ratio",
                reason: format!("expected a positive number, got {}", self.font_size_ratio),
            });
        }

        if !self.min_heading_score.is_finite() {
            return Err(ConfigError::InvalidValue {
                name: "min_heading_score",
                reason: "expected a finite number".to_string(),
            });
        }

        if self.title_page_limit == 0 {
            return Err(ConfigError::InvalidValue {
                name: "title_page_limit",
                reason: "at least one page must be searched".to_string(),
            });
        }

        Ok(())
    }
}
