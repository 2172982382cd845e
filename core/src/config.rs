//! Tunables for a [`Sequence`](crate::sequence::Sequence).

use crate::abstract_editor::DEFAULT_MAX_UNDO;

/// Behaviour of a sequence's edit log and split gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct SequenceConfig {
    /// Maximum number of undo steps kept.
    pub max_undo: usize,
    /// Extend cutting segments across the whole XY extent before splitting.
    pub extend_split_lines: bool,
    /// Outline vertices used when clipping an ellipse.
    pub ellipse_segments: usize,
}

impl SequenceConfig {
    pub fn new() -> Self {
        Self {
            max_undo: DEFAULT_MAX_UNDO,
            extend_split_lines: true,
            ellipse_segments: 64,
        }
    }

    pub fn with_max_undo(mut self, max_undo: usize) -> Self {
        self.max_undo = max_undo;
        self
    }

    pub fn with_extend_split_lines(mut self, extend: bool) -> Self {
        self.extend_split_lines = extend;
        self
    }

    /// Sets the ellipse outline resolution (at least 3 vertices are always used).
    pub fn with_ellipse_segments(mut self, segments: usize) -> Self {
        self.ellipse_segments = segments;
        self
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = SequenceConfig::default()
            .with_max_undo(5)
            .with_ellipse_segments(16);
        assert_eq!(config.max_undo, 5);
        assert_eq!(config.ellipse_segments, 16);
        assert!(config.extend_split_lines);
    }
}
