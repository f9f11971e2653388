//! Pipeline options and configuration.

use super::table_merge::TableMergeConfig;
use super::table_split::TableSplitConfig;
use super::text_blocks::TextBlockConfig;

/// Options for the reconstruction pipeline.
///
/// Composes the per-stage configurations. Inconsistent values are
/// overridden (and logged) by [`validated`](Self::validated) rather than
/// rejected.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Text line/block grouping configuration.
    pub text: TextBlockConfig,

    /// Table deduplication configuration.
    pub merge: TableMergeConfig,

    /// Table structural post-processing configuration.
    pub split: TableSplitConfig,

    /// Detections containing a cell longer than this are discarded
    /// entirely (0 = no limit).
    pub max_cell_len: usize,
}

impl PipelineOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the vertical tolerance for words sharing a line.
    pub fn with_line_tolerance(mut self, tolerance: f32) -> Self {
        self.text.line_tolerance = tolerance;
        self
    }

    /// Set the maximum vertical gap between lines of one block.
    pub fn with_block_gap(mut self, gap: f32) -> Self {
        self.text.block_gap = gap;
        self
    }

    /// Set the minimum font size for text lines (0 = off).
    pub fn with_min_font_size(mut self, size: f32) -> Self {
        self.text.min_font_size = size;
        self
    }

    /// Set the IOU threshold for table deduplication.
    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.merge.iou_threshold = threshold;
        self
    }

    /// Set the row-gap multiplier for geometric table splitting.
    pub fn with_gap_multiplier(mut self, multiplier: f32) -> Self {
        self.split.gap_multiplier = multiplier;
        self
    }

    /// Set the maximum raw cell length (0 = no limit).
    pub fn with_max_cell_len(mut self, len: usize) -> Self {
        self.max_cell_len = len;
        self
    }

    /// Replace the whole text grouping configuration.
    pub fn with_text_config(mut self, config: TextBlockConfig) -> Self {
        self.text = config;
        self
    }

    /// Replace the whole split configuration.
    pub fn with_split_config(mut self, config: TableSplitConfig) -> Self {
        self.split = config;
        self
    }

    /// Override inconsistent values with workable ones.
    ///
    /// Overrides are logged, never raised.
    pub fn validated(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.merge.iou_threshold) {
            log::warn!(
                "iou_threshold {} outside [0, 1], using default 0.6",
                self.merge.iou_threshold
            );
            self.merge.iou_threshold = 0.6;
        }
        if self.split.min_header_cols == 0 {
            log::warn!("min_header_cols 0 is not usable, using 1");
            self.split.min_header_cols = 1;
        }
        if self.split.gap_multiplier < 1.0 {
            log::warn!(
                "gap_multiplier {} below 1.0 would split every table, using 1.0",
                self.split.gap_multiplier
            );
            self.split.gap_multiplier = 1.0;
        }
        if self.text.line_tolerance < 0.0 {
            log::warn!("negative line_tolerance, using 0");
            self.text.line_tolerance = 0.0;
        }
        if self.text.block_gap < 0.0 {
            log::warn!("negative block_gap, using 0");
            self.text.block_gap = 0.0;
        }
        self
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            text: TextBlockConfig::default(),
            merge: TableMergeConfig::default(),
            split: TableSplitConfig::default(),
            max_cell_len: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = PipelineOptions::new()
            .with_line_tolerance(3.0)
            .with_iou_threshold(0.5)
            .with_gap_multiplier(2.0)
            .with_max_cell_len(100);

        assert_eq!(options.text.line_tolerance, 3.0);
        assert_eq!(options.merge.iou_threshold, 0.5);
        assert_eq!(options.split.gap_multiplier, 2.0);
        assert_eq!(options.max_cell_len, 100);
    }

    #[test]
    fn test_validated_overrides_bad_values() {
        let options = PipelineOptions::new()
            .with_iou_threshold(1.5)
            .with_gap_multiplier(0.2)
            .with_line_tolerance(-1.0)
            .validated();

        assert_eq!(options.merge.iou_threshold, 0.6);
        assert_eq!(options.split.gap_multiplier, 1.0);
        assert_eq!(options.text.line_tolerance, 0.0);
    }

    #[test]
    fn test_defaults() {
        let options = PipelineOptions::new();
        assert_eq!(options.merge.iou_threshold, 0.6);
        assert_eq!(options.split.min_header_cols, 2);
        assert_eq!(options.text.block_gap, 8.0);
        assert_eq!(options.max_cell_len, 500);
    }
}
