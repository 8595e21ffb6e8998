use std::collections::HashSet;

use crate::structure::{Line, LineId};

/// Lines excluded from title and heading consideration.
///
/// The set only grows: the noise filter and the title detector add to it,
/// and the scorer reads it.
#[derive(Debug, Clone, Default)]
pub struct SuppressionSet {
    ids: HashSet<LineId>,
}

impl SuppressionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: LineId) -> bool {
        self.ids.insert(id)
    }

    pub fn suppress(&mut self, line: &Line) -> bool {
        self.insert(line.id())
    }

    pub fn contains(&self, line: &Line) -> bool {
        self.ids.contains(&line.id())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Extend<LineId> for SuppressionSet {
    fn extend<T: IntoIterator<Item = LineId>>(&mut self, iter: T) {
        self.ids.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use pdf::Rect;

    use super::*;

    fn line(text: &str, y0: f32) -> Line {
        Line {
            text: text.to_string(),
            bbox: Rect::new(72.0, y0, 200.0, y0 + 10.0),
            spans: vec![],
        }
    }

    #[test]
    fn test_identity_covers_text_and_geometry() {
        let mut set = SuppressionSet::new();
        assert!(set.suppress(&line("Confidential", 20.0)));
        assert!(!set.suppress(&line("Confidential", 20.2)), "same rounded box");

        assert!(set.contains(&line("Confidential", 20.0)));
        assert!(!set.contains(&line("Confidential", 400.0)));
        assert!(!set.contains(&line("Other", 20.0)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_extend() {
        let mut set = SuppressionSet::new();
        set.extend([line("a", 1.0).id(), line("b", 2.0).id()]);
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
    }
}
