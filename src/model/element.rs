//! Element types.
//!
//! An [`Element`] is the unit of document content: a text block, a table,
//! an image, or a figure. Kind-specific payload lives in the closed
//! [`ElementContent`] enum; shared fields (page, ordinal, bounding box,
//! provenance) live on the struct so every kind is handled with
//! exhaustive matches rather than downcasts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// The strategy a table detector used for a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorFlavor {
    /// Ruled-line based detection.
    Lattice,
    /// Whitespace/alignment based detection.
    Stream,
    /// Detector did not report a strategy.
    #[default]
    Unknown,
}

/// Element kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A merged text block
    Text,
    /// A logical table
    Table,
    /// An image region
    Image,
    /// A figure region
    Figure,
}

/// Kind-specific element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ElementContent {
    /// A text block with the font attributes of its first line.
    Text {
        /// Merged text content
        content: String,
        /// Font size in points, when known
        font_size: Option<f32>,
        /// Font name, when known
        font_name: Option<String>,
    },

    /// A table as an ordered row grid; `None` marks a blank cell.
    Table {
        /// Row-major cell grid
        rows: Vec<Vec<Option<String>>>,
    },

    /// An image region; caption and detector info live in provenance.
    Image,

    /// A figure region; caption and detector info live in provenance.
    Figure,
}

/// Where an element came from and how it was derived.
///
/// A closed schema instead of a free-form attribute map; `extra` is the
/// only open extension point and is reserved for backend-specific debug
/// metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Name of the producing backend or detector.
    pub source: Option<String>,
    /// Table detection strategy, for table elements.
    pub flavor: Option<DetectorFlavor>,
    /// Detector accuracy score, when reported.
    pub accuracy: Option<f32>,
    /// Id of the original detection a subtable was split from.
    pub lineage: Option<String>,
    /// Number of lines merged into a text block.
    pub merged_lines: Option<u32>,
    /// Collapsed header resolved for a table, one entry per column.
    pub resolved_header: Option<Vec<String>>,
    /// Caption for image/figure elements.
    pub caption: Option<String>,
    /// Backend-specific debug metadata.
    pub extra: BTreeMap<String, String>,
}

/// A single piece of content on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// 1-based page number.
    pub page: u32,
    /// Reading-order ordinal within the page. Unset until assembly, then
    /// unique and contiguous `0..n-1` per page.
    pub ordinal: Option<u32>,
    /// Region covered by the element, when known.
    pub bbox: Option<BoundingBox>,
    /// Kind-specific payload.
    #[serde(flatten)]
    pub content: ElementContent,
    /// Origin and derivation record.
    pub provenance: Provenance,
}

impl Element {
    /// Create a text element.
    pub fn text(page: u32, content: impl Into<String>) -> Self {
        Self {
            page,
            ordinal: None,
            bbox: None,
            content: ElementContent::Text {
                content: content.into(),
                font_size: None,
                font_name: None,
            },
            provenance: Provenance::default(),
        }
    }

    /// Create a table element from a row grid.
    pub fn table(page: u32, rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            page,
            ordinal: None,
            bbox: None,
            content: ElementContent::Table { rows },
            provenance: Provenance::default(),
        }
    }

    /// Create an image element.
    pub fn image(page: u32) -> Self {
        Self {
            page,
            ordinal: None,
            bbox: None,
            content: ElementContent::Image,
            provenance: Provenance::default(),
        }
    }

    /// Create a figure element.
    pub fn figure(page: u32) -> Self {
        Self {
            page,
            ordinal: None,
            bbox: None,
            content: ElementContent::Figure,
            provenance: Provenance::default(),
        }
    }

    /// Set the bounding box and return self.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Set the caption and return self.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.provenance.caption = Some(caption.into());
        self
    }

    /// Kind discriminant of this element.
    pub fn kind(&self) -> ElementKind {
        match self.content {
            ElementContent::Text { .. } => ElementKind::Text,
            ElementContent::Table { .. } => ElementKind::Table,
            ElementContent::Image => ElementKind::Image,
            ElementContent::Figure => ElementKind::Figure,
        }
    }

    /// Check if this element is a text block.
    pub fn is_text(&self) -> bool {
        matches!(self.content, ElementContent::Text { .. })
    }

    /// Check if this element is a table.
    pub fn is_table(&self) -> bool {
        matches!(self.content, ElementContent::Table { .. })
    }

    /// Plain text projection of this element.
    ///
    /// Text blocks yield their content; tables yield `" | "`-joined rows
    /// when `include_tables` is set; images/figures yield their caption
    /// marker when `include_images` is set. `None` when the element
    /// contributes nothing under the given settings.
    pub fn flatten(&self, include_tables: bool, include_images: bool) -> Option<String> {
        match &self.content {
            ElementContent::Text { content, .. } => Some(content.clone()),
            ElementContent::Table { rows } => {
                if !include_tables {
                    return None;
                }
                let lines: Vec<String> = rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|cell| cell.as_deref().unwrap_or(""))
                            .collect::<Vec<_>>()
                            .join(" | ")
                    })
                    .collect();
                Some(lines.join("\n"))
            }
            ElementContent::Image | ElementContent::Figure => {
                if !include_images {
                    return None;
                }
                self.provenance
                    .caption
                    .as_ref()
                    .map(|caption| format!("[Image: {caption}]"))
            }
        }
    }
}
