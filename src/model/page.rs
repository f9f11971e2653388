//! Page-level types.

use serde::{Deserialize, Serialize};

use super::Element;

/// A single page of the reconstructed document, holding its elements in
/// reading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Elements on the page, ordered by ordinal
    pub elements: Vec<Element>,
}

impl Page {
    /// Create a new empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            elements: Vec::new(),
        }
    }

    /// Create a page from elements that already carry ordinals.
    pub fn with_elements(number: u32, elements: Vec<Element>) -> Self {
        Self { number, elements }
    }

    /// Check if the page has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of elements on the page.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Flattened text content of the page in reading order.
    ///
    /// Elements are emitted by ordinal and joined with blank lines.
    /// Tables can optionally be included as textified rows; images and
    /// figures are skipped unless requested.
    pub fn flatten(&self, include_tables: bool, include_images: bool) -> String {
        let mut ordered: Vec<&Element> = self.elements.iter().collect();
        ordered.sort_by_key(|el| el.ordinal.unwrap_or(u32::MAX));

        let parts: Vec<String> = ordered
            .iter()
            .filter_map(|el| el.flatten(include_tables, include_images))
            .collect();
        parts.join("\n\n").trim().to_string()
    }
}
