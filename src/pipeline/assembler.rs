//! Final assembly of typed per-page elements into a document.
//!
//! Takes the per-type element maps produced by the earlier stages, unions
//! them per page, sorts each page into reading order (top edge ascending,
//! then left edge ascending in the canonical top-down convention), and
//! assigns each element its ordinal. Elements are constructed without an
//! ordinal; ordinal-bearing values exist only downstream of this stage.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::backend::ElementsByPage;
use crate::model::{Document, Element, Metadata, Page};

/// Assembles per-type element maps into a [`Document`].
pub struct DocumentAssembler;

impl DocumentAssembler {
    /// Create an assembler.
    pub fn new() -> Self {
        Self
    }

    /// Union the typed element maps, order each page, and build the
    /// document.
    ///
    /// `metadata` is the flat attribute map from the metadata backend;
    /// when `source` is empty the `source` attribute is used instead,
    /// and an absent map yields empty metadata.
    pub fn assemble(
        &self,
        source: &str,
        metadata: &BTreeMap<String, String>,
        text: ElementsByPage,
        tables: ElementsByPage,
        images: ElementsByPage,
        figures: ElementsByPage,
    ) -> Document {
        let mut by_page: BTreeMap<u32, Vec<Element>> = BTreeMap::new();
        for map in [text, tables, images, figures] {
            for (page_num, elements) in map {
                by_page.entry(page_num).or_default().extend(elements);
            }
        }

        let pages: Vec<Page> = by_page
            .into_iter()
            .map(|(number, elements)| Page::with_elements(number, order_elements(elements)))
            .collect();

        let source = if source.is_empty() {
            metadata.get("source").cloned().unwrap_or_default()
        } else {
            source.to_string()
        };

        Document {
            source,
            metadata: Metadata::from_attributes(metadata),
            pages,
        }
    }
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort elements into reading order and assign contiguous ordinals.
///
/// The sort is stable: elements without a bounding box go last and keep
/// their relative input order among themselves.
fn order_elements(mut elements: Vec<Element>) -> Vec<Element> {
    elements.sort_by(|a, b| match (&a.bbox, &b.bbox) {
        (Some(x), Some(y)) => x
            .y0
            .partial_cmp(&y.y0)
            .unwrap_or(Ordering::Equal)
            .then(x.x0.partial_cmp(&y.x0).unwrap_or(Ordering::Equal)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    elements
        .into_iter()
        .enumerate()
        .map(|(i, mut element)| {
            element.ordinal = Some(i as u32);
            element
        })
        .collect()
}
