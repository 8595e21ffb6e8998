//! Style clustering and heading-level assignment.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::HeadingCandidate;
use crate::stats::{median, mode};
use crate::structure::Line;

/// Heading level, H1 being the most prominent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    H1,
    H2,
    H3,
}

impl Level {
    pub fn depth(self) -> u8 {
        match self {
            Level::H1 => 1,
            Level::H2 => 2,
            Level::H3 => 3,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.depth())
    }
}

impl TryFrom<u8> for Level {
    type Error = InvalidHeadingLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Level::H1),
            2 => Ok(Level::H2),
            3 => Ok(Level::H3),
            _ => Err(InvalidHeadingLevel(value)),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("Heading level must be between 1 and 3, got {0}")]
pub struct InvalidHeadingLevel(pub u8);

/// Visual style of a heading: dominant rounded size and boldness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StyleKey {
    pub size: i64,
    pub bold: bool,
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}pt{}", self.size, if self.bold { " bold" } else { "" })
    }
}

/// Style key of a line; `None` when it has no spans.
pub fn style_key(line: &Line) -> Option<StyleKey> {
    mode(&line.rounded_sizes()).map(|size| StyleKey {
        size,
        bold: line.has_bold_span(),
    })
}

/// Candidates sharing one style key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleCluster {
    pub key: StyleKey,
    /// Median left edge of the member lines.
    pub median_x0: f32,
    pub members: usize,
}

fn prominence(a: &StyleCluster, b: &StyleCluster) -> Ordering {
    b.key
        .size
        .cmp(&a.key.size)
        .then(a.median_x0.total_cmp(&b.median_x0))
        .then(b.key.bold.cmp(&a.key.bold))
}

/// Group candidates by style and rank the groups from most to least
/// prominent: larger size first, then smaller indentation, then bold.
pub fn rank_styles(candidates: &[HeadingCandidate]) -> Vec<StyleCluster> {
    let mut groups: BTreeMap<StyleKey, Vec<f32>> = BTreeMap::new();
    for candidate in candidates {
        if let Some(key) = style_key(&candidate.line) {
            groups.entry(key).or_default().push(candidate.line.bbox.x0);
        }
    }

    let mut clusters: Vec<StyleCluster> = groups
        .into_iter()
        .map(|(key, x0s)| StyleCluster {
            key,
            median_x0: median(&x0s).unwrap_or(0.0),
            members: x0s.len(),
        })
        .collect();
    clusters.sort_by(prominence);
    clusters
}

/// Maps style keys to levels: the three most prominent clusters become
/// H1, H2, and H3. Anything else is H3.
#[derive(Debug, Clone, Default)]
pub struct LevelMap {
    levels: BTreeMap<StyleKey, Level>,
}

impl LevelMap {
    pub fn from_clusters(clusters: &[StyleCluster]) -> Self {
        let levels = clusters
            .iter()
            .zip([Level::H1, Level::H2, Level::H3])
            .map(|(cluster, level)| (cluster.key, level))
            .collect();
        Self { levels }
    }

    pub fn level_of(&self, line: &Line) -> Level {
        style_key(line)
            .and_then(|key| self.levels.get(&key).copied())
            .unwrap_or(Level::H3)
    }
}

/// Level of each candidate, in the same order.
pub fn assign_levels(candidates: &[HeadingCandidate]) -> Vec<Level> {
    let clusters = rank_styles(candidates);
    for (rank, cluster) in clusters.iter().enumerate() {
        log::debug!(
            "style #{} {} x0={:.1} ({} lines)",
            rank + 1,
            cluster.key,
            cluster.median_x0,
            cluster.members
        );
    }
    let map = LevelMap::from_clusters(&clusters);
    candidates.iter().map(|c| map.level_of(&c.line)).collect()
}
