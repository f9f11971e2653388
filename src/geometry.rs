//! Bounding-box geometry utilities.
//!
//! All geometry in this crate uses a single canonical convention:
//! top-left origin with y increasing downward, so `y0` is the top edge
//! and smaller `y0` means earlier in reading order. Backend adapters
//! must normalize into this convention before handing boxes to the
//! pipeline; boxes from different conventions must never be compared.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in page coordinates.
///
/// Invariants: `x1 >= x0`, `y1 >= y0`. `y0` is the top edge in the
/// crate's canonical top-down convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width of the box (0 if degenerate).
    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    /// Height of the box (0 if degenerate).
    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    /// Area of the box (0 if degenerate).
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Check whether the box has zero or negative extent on either axis.
    pub fn is_degenerate(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Intersection-over-union overlap score with another box.
    ///
    /// Returns 0.0 when either box is degenerate or the union area is 0.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        if self.is_degenerate() || other.is_degenerate() {
            return 0.0;
        }
        let ix0 = self.x0.max(other.x0);
        let iy0 = self.y0.max(other.y0);
        let ix1 = self.x1.min(other.x1);
        let iy1 = self.y1.min(other.y1);
        let inter = (ix1 - ix0).max(0.0) * (iy1 - iy0).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }
}

/// Intersection-over-union of two optional boxes.
///
/// Absent boxes score 0 against everything.
pub fn iou(b1: Option<&BoundingBox>, b2: Option<&BoundingBox>) -> f32 {
    match (b1, b2) {
        (Some(a), Some(b)) => a.iou(b),
        _ => 0.0,
    }
}

/// A single cell of a table detection's raw geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    /// Row index within the detection grid.
    pub row: usize,
    /// Column index within the detection grid.
    pub col: usize,
    /// Cell corner coordinates in the canonical convention.
    pub bbox: BoundingBox,
}

impl CellGeometry {
    /// Create cell geometry from corner coordinates.
    pub fn new(row: usize, col: usize, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            row,
            col,
            bbox: BoundingBox::new(x0, y0, x1, y1),
        }
    }
}

/// Mean top-edge y per distinct row index, ordered by row index ascending.
pub fn row_positions(cells: &[CellGeometry]) -> Vec<f32> {
    if cells.is_empty() {
        return vec![];
    }
    let max_row = cells.iter().map(|c| c.row).max().unwrap_or(0);
    let mut sums = vec![0.0f32; max_row + 1];
    let mut counts = vec![0usize; max_row + 1];
    for cell in cells {
        sums[cell.row] += cell.bbox.y0;
        counts[cell.row] += 1;
    }
    sums.iter()
        .zip(&counts)
        .filter(|(_, &count)| count > 0)
        .map(|(&sum, &count)| sum / count as f32)
        .collect()
}

/// Absolute differences between consecutive row positions.
///
/// Empty if fewer than 2 positions.
pub fn row_gaps(positions: &[f32]) -> Vec<f32> {
    positions
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).abs())
        .collect()
}
