//! Structural post-processing of table detections.
//!
//! A single detection frequently covers more than one logical table: a
//! header block followed by several stacked tables, or a region where
//! the detector bridged two tables across a small gap. This stage infers
//! a header block, collapses it into one header row, finds split
//! boundaries (re-stated header rows and unusually large geometric row
//! gaps), and cuts the detection into logical subtables with recomputed
//! bounding boxes.
//!
//! Anything that cannot be analyzed — missing cell geometry, inconsistent
//! grids — degrades to the unprocessed detection as a single element.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::backend::TableDetection;
use crate::error::{Error, Result};
use crate::geometry::{row_gaps, row_positions, CellGeometry};
use crate::model::{Element, ElementContent, Provenance};

/// A cell value that matches this is counted as numeric: optional sign
/// and currency, digit groups with separators, optional decimal part,
/// optional trailing percent/currency.
const NUMERIC_TOKEN: &str =
    r"^\(?[-+]?[$€£¥]?(?:\d{1,3}(?:[,.\s]\d{3})+|\d+)(?:[.,]\d+)?\s?(?:%|[$€£¥])?\)?$";

/// Temporal/reporting vocabulary that hints at a header row.
const HEADER_KEYWORD: &str = r"(?ix)
    \b(?:19|20)\d{2}\b
    | \b(?:q[1-4]|h[12]|fy\d{2,4})\b
    | \b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?
        |jul(?:y)?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b
    | \b(?:year|quarter|month|week|period|date|total|ytd|annual|fiscal)\b";

/// Table splitting configuration.
#[derive(Debug, Clone)]
pub struct TableSplitConfig {
    /// Minimum non-empty cells for a row to start or extend a header.
    pub min_header_cols: usize,
    /// Score bonus for rows containing header vocabulary.
    pub header_boost: f32,
    /// Maximum numeric ratio for a header-block row.
    pub header_numeric_max: f32,
    /// Minimum composite score for a header-block row.
    pub header_score_min: f32,
    /// Maximum numeric ratio for a re-header row.
    pub reheader_numeric_max: f32,
    /// Minimum non-empty ratio for a re-header row.
    pub reheader_nonempty_min: f32,
    /// Minimum token overlap with the collapsed header for a re-header row.
    pub reheader_jaccard_min: f32,
    /// A row gap beyond `median * gap_multiplier` marks a table break.
    pub gap_multiplier: f32,
}

impl Default for TableSplitConfig {
    fn default() -> Self {
        Self {
            min_header_cols: 2,
            header_boost: 0.15,
            header_numeric_max: 0.35,
            header_score_min: 0.6,
            reheader_numeric_max: 0.5,
            reheader_nonempty_min: 0.4,
            reheader_jaccard_min: 0.2,
            gap_multiplier: 1.6,
        }
    }
}

/// Per-row structural features.
#[derive(Debug, Clone, Copy)]
struct RowProfile {
    nonempty: usize,
    numeric_ratio: f32,
    nonempty_ratio: f32,
    header_hint: bool,
    header_score: f32,
}

/// Splits a deduplicated table detection into logical subtable elements.
pub struct TableSplitter {
    config: TableSplitConfig,
    numeric_token: Regex,
    header_keyword: Regex,
}

impl TableSplitter {
    /// Create a splitter with default configuration.
    pub fn new() -> Self {
        Self::with_config(TableSplitConfig::default())
    }

    /// Create a splitter with custom configuration.
    pub fn with_config(config: TableSplitConfig) -> Self {
        Self {
            config,
            numeric_token: Regex::new(NUMERIC_TOKEN).unwrap(),
            header_keyword: Regex::new(HEADER_KEYWORD).unwrap(),
        }
    }

    /// Process one detection into one or more table elements.
    ///
    /// Never fails: a detection that cannot be analyzed is passed through
    /// unprocessed as a single element.
    pub fn process(&self, detection: &TableDetection) -> Vec<Element> {
        let has_geometry = detection
            .cells
            .as_ref()
            .map(|cells| !cells.is_empty())
            .unwrap_or(false);
        if !has_geometry || detection.rows.is_empty() {
            return vec![self.passthrough(detection)];
        }

        match self.split(detection) {
            Ok(elements) if !elements.is_empty() => elements,
            Ok(_) => vec![self.passthrough(detection)],
            Err(e) => {
                log::debug!(
                    "table split: page {} detection passed through: {}",
                    detection.page,
                    e
                );
                vec![self.passthrough(detection)]
            }
        }
    }

    fn split(&self, detection: &TableDetection) -> Result<Vec<Element>> {
        let cells = detection.cells.as_deref().unwrap_or_default();

        let row_count = detection.rows.len();
        if cells.iter().any(|c| c.row >= row_count) {
            return Err(Error::MalformedTable(format!(
                "cell geometry references row beyond the {row_count}-row grid"
            )));
        }

        let rows: Vec<Vec<Option<String>>> = detection
            .rows
            .iter()
            .map(|row| row.iter().map(normalize_cell).collect())
            .collect();
        let profiles: Vec<RowProfile> = rows.iter().map(|row| self.profile(row)).collect();

        let header_len = self.detect_header_len(&profiles);
        let header = self.collapse_header(&rows[..header_len]);
        let body = &rows[header_len..];

        let header_text = header
            .as_ref()
            .map(|h| {
                h.iter()
                    .filter_map(|c| c.as_deref())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        let header_tokens = tokens(&header_text);

        let mut boundaries =
            self.reheader_boundaries(body, &profiles[header_len..], &header_tokens);
        boundaries.extend(self.gap_boundaries(cells, header_len, body.len()));
        boundaries.sort_unstable();
        boundaries.dedup();

        log::debug!(
            "table split: page {} header rows {} boundaries {:?}",
            detection.page,
            header_len,
            boundaries
        );

        let mut elements = Vec::new();
        let mut start = 0;
        for boundary in boundaries.into_iter().chain(std::iter::once(body.len())) {
            if let Some(element) =
                self.chunk_element(detection, header.as_ref(), body, start..boundary, header_len, cells)
            {
                elements.push(element);
            }
            start = boundary;
        }

        Ok(elements)
    }

    /// Compute structural features for one normalized row.
    fn profile(&self, row: &[Option<String>]) -> RowProfile {
        let nonempty_cells: Vec<&str> = row.iter().filter_map(|c| c.as_deref()).collect();
        let nonempty = nonempty_cells.len();

        let numeric = nonempty_cells
            .iter()
            .filter(|cell| self.numeric_token.is_match(cell))
            .count();
        let numeric_ratio = if nonempty > 0 {
            numeric as f32 / nonempty as f32
        } else {
            0.0
        };
        let nonempty_ratio = if row.is_empty() {
            0.0
        } else {
            nonempty as f32 / row.len() as f32
        };
        let header_hint = nonempty_cells
            .iter()
            .any(|cell| self.header_keyword.is_match(cell));

        let mut header_score = (1.0 - numeric_ratio) * nonempty_ratio;
        if header_hint {
            header_score += self.config.header_boost;
        }

        RowProfile {
            nonempty,
            numeric_ratio,
            nonempty_ratio,
            header_hint,
            header_score,
        }
    }

    /// Number of leading rows forming the header block.
    fn detect_header_len(&self, profiles: &[RowProfile]) -> usize {
        let mut header_len = 0;

        for (i, profile) in profiles.iter().enumerate() {
            if profile.nonempty >= self.config.min_header_cols {
                if profile.numeric_ratio <= self.config.header_numeric_max
                    || profile.header_score >= self.config.header_score_min
                {
                    header_len = i + 1;
                } else {
                    break;
                }
            } else if header_len > 0 {
                // Sparse continuation/preamble row inside a started block.
                header_len = i + 1;
            } else {
                break;
            }
        }

        // Trim trailing fully-empty rows from the block.
        while header_len > 0 && profiles[header_len - 1].nonempty == 0 {
            header_len -= 1;
        }

        header_len
    }

    /// Join the header block's per-column text into one header row.
    fn collapse_header(&self, header_rows: &[Vec<Option<String>>]) -> Option<Vec<Option<String>>> {
        if header_rows.is_empty() {
            return None;
        }

        let width = header_rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let collapsed: Vec<Option<String>> = (0..width)
            .map(|col| {
                let joined = header_rows
                    .iter()
                    .filter_map(|row| row.get(col).and_then(|c| c.as_deref()))
                    .collect::<Vec<_>>()
                    .join(" ");
                if joined.is_empty() {
                    None
                } else {
                    Some(joined)
                }
            })
            .collect();
        Some(collapsed)
    }

    /// Body-relative indices of rows that re-state the header.
    ///
    /// Consecutive flagged rows collapse to the first.
    fn reheader_boundaries(
        &self,
        body: &[Vec<Option<String>>],
        profiles: &[RowProfile],
        header_tokens: &[String],
    ) -> Vec<usize> {
        let mut boundaries = Vec::new();
        let mut prev_flagged = false;

        for (i, (row, profile)) in body.iter().zip(profiles).enumerate() {
            let flagged = profile.numeric_ratio < self.config.reheader_numeric_max
                && profile.nonempty_ratio >= self.config.reheader_nonempty_min
                && (self.row_header_overlap(row, header_tokens)
                    >= self.config.reheader_jaccard_min
                    || profile.header_hint);

            if flagged && !prev_flagged {
                boundaries.push(i);
            }
            prev_flagged = flagged;
        }

        boundaries
    }

    /// Jaccard overlap between a row's tokens and the collapsed header's.
    fn row_header_overlap(&self, row: &[Option<String>], header_tokens: &[String]) -> f32 {
        let text = row
            .iter()
            .filter_map(|c| c.as_deref())
            .collect::<Vec<_>>()
            .join(" ");
        jaccard(&tokens(&text), header_tokens)
    }

    /// Body-relative indices where the vertical row gap is unusually large.
    fn gap_boundaries(
        &self,
        cells: &[CellGeometry],
        header_len: usize,
        body_len: usize,
    ) -> Vec<usize> {
        let mut rows_present: Vec<usize> = cells.iter().map(|c| c.row).collect();
        rows_present.sort_unstable();
        rows_present.dedup();

        let positions = row_positions(cells);
        let gaps = row_gaps(&positions);
        let median_gap = median(&gaps);
        if median_gap <= 0.0 {
            return vec![];
        }

        let threshold = median_gap * self.config.gap_multiplier;
        gaps.iter()
            .enumerate()
            .filter(|(_, &gap)| gap > threshold)
            .map(|(k, _)| rows_present[k + 1])
            // Boundaries inside the header block are discarded.
            .filter(|&abs_row| abs_row > header_len)
            .map(|abs_row| abs_row - header_len)
            .filter(|&rel| rel < body_len)
            .collect()
    }

    /// Build an element for one body chunk, or `None` if the chunk holds
    /// no content.
    fn chunk_element(
        &self,
        detection: &TableDetection,
        header: Option<&Vec<Option<String>>>,
        body: &[Vec<Option<String>>],
        range: std::ops::Range<usize>,
        header_len: usize,
        cells: &[CellGeometry],
    ) -> Option<Element> {
        let chunk = &body[range.clone()];
        if chunk.iter().all(|row| row.iter().all(|c| c.is_none())) {
            return None;
        }

        let mut rows = Vec::with_capacity(chunk.len() + 1);
        if let Some(header_row) = header {
            rows.push(header_row.clone());
        }
        rows.extend_from_slice(chunk);

        let abs_range = (header_len + range.start)..(header_len + range.end);
        let bbox = cells
            .iter()
            .filter(|c| abs_range.contains(&c.row))
            .map(|c| c.bbox)
            .reduce(|acc, b| acc.union(&b));

        Some(Element {
            page: detection.page,
            ordinal: None,
            bbox,
            content: ElementContent::Table { rows },
            provenance: Provenance {
                lineage: detection.id.clone(),
                resolved_header: header.map(|h| {
                    h.iter().map(|c| c.clone().unwrap_or_default()).collect()
                }),
                ..self.base_provenance(detection)
            },
        })
    }

    /// Convert a detection to a single element without structural changes.
    fn passthrough(&self, detection: &TableDetection) -> Element {
        Element {
            page: detection.page,
            ordinal: None,
            bbox: detection.bbox,
            content: ElementContent::Table {
                rows: detection.rows.clone(),
            },
            provenance: Provenance {
                lineage: detection.id.clone(),
                ..self.base_provenance(detection)
            },
        }
    }

    fn base_provenance(&self, detection: &TableDetection) -> Provenance {
        Provenance {
            source: if detection.detector.is_empty() {
                None
            } else {
                Some(detection.detector.clone())
            },
            flavor: Some(detection.flavor),
            accuracy: detection.accuracy,
            ..Default::default()
        }
    }
}

impl Default for TableSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// NFKC-normalize a raw cell, collapse whitespace runs, blank to `None`.
fn normalize_cell(cell: &Option<String>) -> Option<String> {
    let text: String = cell.as_deref()?.nfkc().collect();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Lowercased alphanumeric tokens of a text, deduplicated and sorted.
fn tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens
}

/// Jaccard similarity of two sorted, deduplicated token lists.
fn jaccard(a: &[String], b: &[String]) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let set_a: std::collections::BTreeSet<&String> = a.iter().collect();
    let set_b: std::collections::BTreeSet<&String> = b.iter().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use crate::model::DetectorFlavor;

    fn cell(text: &str) -> Option<String> {
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    fn row(texts: &[&str]) -> Vec<Option<String>> {
        texts.iter().map(|t| cell(t)).collect()
    }

    /// Uniform cell geometry: one cell per column per row, rows spaced
    /// `spacing` points apart starting at y=0.
    fn uniform_cells(rows: usize, cols: usize, spacing: f32) -> Vec<CellGeometry> {
        let mut cells = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                let y0 = r as f32 * spacing;
                cells.push(CellGeometry::new(
                    r,
                    c,
                    c as f32 * 50.0,
                    y0,
                    (c + 1) as f32 * 50.0,
                    y0 + spacing,
                ));
            }
        }
        cells
    }

    fn detection(rows: Vec<Vec<Option<String>>>, cells: Vec<CellGeometry>) -> TableDetection {
        let bbox = BoundingBox::new(0.0, 0.0, 150.0, rows.len() as f32 * 12.0);
        TableDetection::new(1, bbox, DetectorFlavor::Lattice, rows)
            .with_cells(cells)
            .with_id("p1-t0")
            .with_detector("camelot")
    }

    fn table_rows(element: &Element) -> &Vec<Vec<Option<String>>> {
        match &element.content {
            ElementContent::Table { rows } => rows,
            other => panic!("not a table: {other:?}"),
        }
    }

    #[test]
    fn test_fail_soft_without_geometry() {
        let splitter = TableSplitter::new();
        let mut det = detection(vec![row(&["a", "b"]), row(&["1", "2"])], vec![]);
        det.cells = None;

        let elements = splitter.process(&det);
        assert_eq!(elements.len(), 1);
        // Unprocessed: raw rows kept verbatim, no resolved header.
        assert_eq!(table_rows(&elements[0]), &det.rows);
        assert!(elements[0].provenance.resolved_header.is_none());
        assert_eq!(elements[0].bbox, det.bbox);
    }

    #[test]
    fn test_inconsistent_geometry_passes_through() {
        let splitter = TableSplitter::new();
        // Cell geometry claims row 10 in a 2-row grid.
        let cells = vec![CellGeometry::new(10, 0, 0.0, 0.0, 50.0, 12.0)];
        let det = detection(vec![row(&["a", "b"]), row(&["1", "2"])], cells);

        let elements = splitter.process(&det);
        assert_eq!(elements.len(), 1);
        assert_eq!(table_rows(&elements[0]), &det.rows);
    }

    #[test]
    fn test_reheader_splits_into_two_tables() {
        let splitter = TableSplitter::new();
        let rows = vec![
            row(&["Region", "Q1 2023", "Q2 2023"]),
            row(&["", "Revenue", "Revenue"]),
            row(&["North", "1,200", "1,300"]),
            row(&["South", "900", "950"]),
            row(&["East", "700", "720"]),
            row(&["West", "1,100", "1,150"]),
            row(&["Central", "400", "430"]),
            row(&["Region", "Q1 2023", "Q2 2023"]),
            row(&["North", "2,200", "2,300"]),
            row(&["South", "1,900", "1,950"]),
            row(&["East", "1,700", "1,720"]),
        ];
        let cells = uniform_cells(11, 3, 12.0);
        let det = detection(rows, cells);

        let elements = splitter.process(&det);
        assert_eq!(elements.len(), 2);

        let header = vec![
            cell("Region"),
            cell("Q1 2023 Revenue"),
            cell("Q2 2023 Revenue"),
        ];
        for element in &elements {
            assert_eq!(table_rows(element)[0], header);
            assert_eq!(element.provenance.lineage.as_deref(), Some("p1-t0"));
        }
        // 5 data rows in the first chunk, re-header plus 3 in the second.
        assert_eq!(table_rows(&elements[0]).len(), 6);
        assert_eq!(table_rows(&elements[1]).len(), 5);
    }

    #[test]
    fn test_geometric_gap_splits() {
        let splitter = TableSplitter::new();
        let rows = vec![
            row(&["Item", "Amount"]),
            row(&["aa", "1"]),
            row(&["bb", "2"]),
            row(&["cc", "3"]),
            row(&["dd", "4"]),
            row(&["ee", "5"]),
        ];
        // Rows 0-3 spaced 12pt apart; a 60pt jump before rows 4-5.
        let mut cells = uniform_cells(4, 2, 12.0);
        for r in 4..6 {
            for c in 0..2 {
                let y0 = 48.0 + 60.0 + (r - 4) as f32 * 12.0;
                cells.push(CellGeometry::new(r, c, c as f32 * 50.0, y0, (c + 1) as f32 * 50.0, y0 + 12.0));
            }
        }
        let det = detection(rows, cells);

        let elements = splitter.process(&det);
        assert_eq!(elements.len(), 2);
        assert_eq!(table_rows(&elements[0]).len(), 4); // header + 3 rows
        assert_eq!(table_rows(&elements[1]).len(), 3); // header + 2 rows

        // Subtable bounding boxes cover only their own rows.
        let first_bbox = elements[0].bbox.unwrap();
        let second_bbox = elements[1].bbox.unwrap();
        assert!(first_bbox.y1 <= 60.0);
        assert!(second_bbox.y0 >= 100.0);
    }

    #[test]
    fn test_no_boundary_yields_single_table_with_header() {
        let splitter = TableSplitter::new();
        let rows = vec![
            row(&["Name", "Total"]),
            row(&["aa", "10"]),
            row(&["bb", "20"]),
        ];
        let det = detection(rows, uniform_cells(3, 2, 12.0));

        let elements = splitter.process(&det);
        assert_eq!(elements.len(), 1);
        let rows = table_rows(&elements[0]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![cell("Name"), cell("Total")]);
        assert_eq!(
            elements[0].provenance.resolved_header,
            Some(vec!["Name".to_string(), "Total".to_string()])
        );
    }

    #[test]
    fn test_cell_normalization() {
        assert_eq!(
            normalize_cell(&Some("  Total \u{00A0} Sales ".to_string())),
            Some("Total Sales".to_string())
        );
        assert_eq!(normalize_cell(&Some("   ".to_string())), None);
        assert_eq!(normalize_cell(&None), None);
    }

    #[test]
    fn test_numeric_token_pattern() {
        let splitter = TableSplitter::new();
        for token in ["1,200", "-3.5", "$1,234.56", "42", "85%", "(1,000)"] {
            assert!(splitter.numeric_token.is_match(token), "{token}");
        }
        for token in ["North", "Q1 2023", "12 apples", ""] {
            assert!(!splitter.numeric_token.is_match(token), "{token}");
        }
    }

    #[test]
    fn test_deterministic_output() {
        let splitter = TableSplitter::new();
        let rows = vec![
            row(&["Year", "Total"]),
            row(&["2022", "10"]),
            row(&["2023", "20"]),
        ];
        let det = detection(rows, uniform_cells(3, 2, 12.0));

        let first = splitter.process(&det);
        let second = splitter.process(&det);
        assert_eq!(first, second);
    }

    #[test]
    fn test_jaccard() {
        let a = tokens("Region Q1 2023");
        let b = tokens("region q1 2023 revenue");
        assert!((jaccard(&a, &b) - 0.75).abs() < 1e-6);
        assert_eq!(jaccard(&[], &[]), 0.0);
    }
}
