use serde::{Deserialize, Serialize};

use crate::expansion::ExpansionSet;
use crate::tree::Forest;

pub const DEFAULT_ROW_HEIGHT: f64 = 20.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 400.0;

/// Range of virtual rows intersecting the viewport, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub start_index: usize,
    pub stop_index: usize,
}

impl VisibleRange {
    pub fn new(start_index: usize, stop_index: usize) -> Self {
        Self {
            start_index,
            stop_index,
        }
    }
}

/// How tall each top-level virtual row is.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RowSizing {
    /// Every row is `row_height` tall; expanded content beyond it is clipped.
    Fixed,
    /// A row grows with the visible rows of its subtree.
    #[default]
    Measured,
}

/// Heights and offsets of the top-level virtual rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    row_height: f64,
    // offsets[i] is the top of row i; the last entry is the total height
    offsets: Vec<f64>,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self::fixed(0, DEFAULT_ROW_HEIGHT)
    }
}

impl RowLayout {
    pub fn fixed(count: usize, row_height: f64) -> Self {
        Self::from_heights(row_height, std::iter::repeat_n(row_height, count))
    }

    pub fn measured(forest: &Forest, expansion: &ExpansionSet, row_height: f64) -> Self {
        let heights = forest
            .roots()
            .iter()
            .map(|root| root.visible_row_count(expansion) as f64 * row_height);
        Self::from_heights(row_height, heights)
    }

    pub fn for_sizing(
        sizing: RowSizing,
        forest: &Forest,
        expansion: &ExpansionSet,
        row_height: f64,
    ) -> Self {
        match sizing {
            RowSizing::Fixed => Self::fixed(forest.len(), row_height),
            RowSizing::Measured => Self::measured(forest, expansion, row_height),
        }
    }

    fn from_heights(row_height: f64, heights: impl Iterator<Item = f64>) -> Self {
        let mut offsets = vec![0.0];
        let mut top = 0.0;
        for height in heights {
            top += height;
            offsets.push(top);
        }
        Self { row_height, offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    pub fn total_height(&self) -> f64 {
        self.offsets.last().copied().unwrap_or(0.0)
    }

    pub fn row_offset(&self, index: usize) -> Option<f64> {
        if index < self.len() {
            Some(self.offsets[index])
        } else {
            None
        }
    }

    pub fn row_height_at(&self, index: usize) -> Option<f64> {
        if index < self.len() {
            Some(self.offsets[index + 1] - self.offsets[index])
        } else {
            None
        }
    }

    /// Rows intersecting `[scroll_offset, scroll_offset + viewport_height)`.
    ///
    /// Offsets past the end are clamped so the last rows stay visible.
    /// Returns `None` when there are no rows.
    pub fn visible_range(&self, scroll_offset: f64, viewport_height: f64) -> Option<VisibleRange> {
        if self.is_empty() {
            return None;
        }
        let last = self.len() - 1;
        let max_offset = (self.total_height() - viewport_height).max(0.0);
        let top = scroll_offset.clamp(0.0, max_offset);
        let bottom = top + viewport_height.max(0.0);

        // First row whose bottom edge is below the viewport top.
        let start = self.offsets[1..]
            .partition_point(|&row_bottom| row_bottom <= top)
            .min(last);
        // Last row whose top edge is above the viewport bottom.
        let stop = self.offsets[..self.len()]
            .partition_point(|&row_top| row_top < bottom)
            .saturating_sub(1)
            .clamp(start, last);

        Some(VisibleRange::new(start, stop))
    }
}
