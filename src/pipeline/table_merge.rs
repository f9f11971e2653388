//! Deduplication of competing table detections.
//!
//! Multiple detectors observe the same physical region and report
//! overlapping detections of varying quality. This stage collapses them
//! per page with an incremental nearest-match suppression: each candidate
//! is compared against everything already kept and either replaces its
//! best overlap, is discarded, or is kept as a new region.
//!
//! The pass is greedy and order-sensitive; candidates are processed in
//! input order so the result is reproducible.

use std::collections::BTreeMap;

use crate::backend::TableDetection;
use crate::model::DetectorFlavor;

/// Table merge configuration.
#[derive(Debug, Clone)]
pub struct TableMergeConfig {
    /// Detections overlapping above this IOU are considered duplicates.
    pub iou_threshold: f32,
}

impl Default for TableMergeConfig {
    fn default() -> Self {
        Self { iou_threshold: 0.6 }
    }
}

/// Collapses overlapping table detections into one list per page.
pub struct TableMerger {
    config: TableMergeConfig,
}

impl TableMerger {
    /// Create a merger with default configuration.
    pub fn new() -> Self {
        Self {
            config: TableMergeConfig::default(),
        }
    }

    /// Create a merger with custom configuration.
    pub fn with_config(config: TableMergeConfig) -> Self {
        Self { config }
    }

    /// Group detections by page and deduplicate each page.
    ///
    /// Per-page input order is preserved, which keeps the greedy pass
    /// deterministic.
    pub fn merge(&self, detections: Vec<TableDetection>) -> BTreeMap<u32, Vec<TableDetection>> {
        let mut by_page: BTreeMap<u32, Vec<TableDetection>> = BTreeMap::new();
        for detection in detections {
            by_page.entry(detection.page).or_default().push(detection);
        }

        by_page
            .into_iter()
            .map(|(page, dets)| (page, self.merge_page(dets)))
            .collect()
    }

    /// Deduplicate one page's detections.
    ///
    /// Detections without geometry are discarded before comparison. When
    /// a candidate overlaps a kept detection above the threshold, a
    /// "stream" candidate replaces a kept "lattice" one; any other
    /// combination keeps the existing detection.
    pub fn merge_page(&self, detections: Vec<TableDetection>) -> Vec<TableDetection> {
        let mut kept: Vec<TableDetection> = Vec::new();

        for candidate in detections {
            let Some(cand_bbox) = candidate.bbox else {
                log::debug!(
                    "table merge: dropping geometry-less detection from {} on page {}",
                    candidate.detector,
                    candidate.page
                );
                continue;
            };

            let best = kept
                .iter()
                .enumerate()
                .filter_map(|(i, existing)| {
                    existing.bbox.map(|b| (i, cand_bbox.iou(&b)))
                })
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

            match best {
                Some((index, overlap)) if overlap > self.config.iou_threshold => {
                    let existing = &kept[index];
                    if candidate.flavor == DetectorFlavor::Stream
                        && existing.flavor == DetectorFlavor::Lattice
                    {
                        log::debug!(
                            "table merge: page {} iou {:.2}, stream detection replaces lattice",
                            candidate.page,
                            overlap
                        );
                        kept[index] = candidate;
                    } else {
                        log::debug!(
                            "table merge: page {} iou {:.2}, discarding duplicate {:?} detection",
                            candidate.page,
                            overlap,
                            candidate.flavor
                        );
                    }
                }
                _ => kept.push(candidate),
            }
        }

        kept
    }
}

impl Default for TableMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn detection(page: u32, bbox: BoundingBox, flavor: DetectorFlavor) -> TableDetection {
        TableDetection::new(page, bbox, flavor, vec![vec![Some("x".to_string())]])
    }

    #[test]
    fn test_disjoint_detections_all_kept() {
        let merger = TableMerger::new();
        let dets = vec![
            detection(1, BoundingBox::new(0.0, 0.0, 100.0, 50.0), DetectorFlavor::Lattice),
            detection(1, BoundingBox::new(0.0, 200.0, 100.0, 250.0), DetectorFlavor::Stream),
        ];
        assert_eq!(merger.merge_page(dets).len(), 2);
    }

    #[test]
    fn test_stream_replaces_lattice() {
        let merger = TableMerger::new();
        // Nearly identical regions: IOU ~0.8.
        let dets = vec![
            detection(1, BoundingBox::new(0.0, 0.0, 100.0, 100.0), DetectorFlavor::Lattice),
            detection(1, BoundingBox::new(0.0, 0.0, 100.0, 80.0), DetectorFlavor::Stream),
        ];
        let kept = merger.merge_page(dets);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].flavor, DetectorFlavor::Stream);
    }

    #[test]
    fn test_lattice_does_not_replace_stream() {
        let merger = TableMerger::new();
        let dets = vec![
            detection(1, BoundingBox::new(0.0, 0.0, 100.0, 80.0), DetectorFlavor::Stream),
            detection(1, BoundingBox::new(0.0, 0.0, 100.0, 100.0), DetectorFlavor::Lattice),
        ];
        let kept = merger.merge_page(dets);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].flavor, DetectorFlavor::Stream);
    }

    #[test]
    fn test_geometry_less_detection_discarded() {
        let merger = TableMerger::new();
        let mut det = detection(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0), DetectorFlavor::Unknown);
        det.bbox = None;
        assert!(merger.merge_page(vec![det]).is_empty());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let merger = TableMerger::new();
        let dets = vec![
            detection(1, BoundingBox::new(0.0, 0.0, 100.0, 100.0), DetectorFlavor::Lattice),
            detection(1, BoundingBox::new(0.0, 0.0, 100.0, 80.0), DetectorFlavor::Stream),
            detection(1, BoundingBox::new(0.0, 200.0, 100.0, 260.0), DetectorFlavor::Lattice),
        ];
        let once = merger.merge_page(dets);
        let twice = merger.merge_page(once.clone());
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(a.bbox, b.bbox);
            assert_eq!(a.flavor, b.flavor);
        }
    }

    #[test]
    fn test_pages_merged_independently() {
        let merger = TableMerger::new();
        let same_region = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let dets = vec![
            detection(1, same_region, DetectorFlavor::Lattice),
            detection(2, same_region, DetectorFlavor::Stream),
        ];
        let by_page = merger.merge(dets);
        assert_eq!(by_page.len(), 2);
        assert_eq!(by_page[&1].len(), 1);
        assert_eq!(by_page[&2].len(), 1);
    }
}
