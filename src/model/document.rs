//! Document-level types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Page;

/// Marker inserted between page texts by [`Document::flatten`].
pub const PAGE_BREAK_MARKER: &str = "--- PAGE BREAK ---";

/// A fully reconstructed document: metadata plus pages in page order.
///
/// Built once per input file; immutable afterward except for read-only
/// projections (flattening, serialization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Source identifier (path, URL, or logical name)
    pub source: String,

    /// Document metadata
    pub metadata: Metadata,

    /// Pages ordered by page number ascending
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a new empty document.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            metadata: Metadata::default(),
            pages: Vec::new(),
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by page number.
    pub fn get_page(&self, number: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Total number of elements across all pages.
    pub fn element_count(&self) -> usize {
        self.pages.iter().map(|p| p.element_count()).sum()
    }

    /// Flatten the whole document to text in page and reading order.
    ///
    /// Page texts are joined by a page-break marker; empty pages are
    /// skipped. Pages are emitted by page number ascending regardless of
    /// insertion order.
    pub fn flatten(&self, include_tables: bool, include_images: bool) -> String {
        let mut ordered: Vec<&Page> = self.pages.iter().collect();
        ordered.sort_by_key(|p| p.number);

        let texts: Vec<String> = ordered
            .iter()
            .map(|p| p.flatten(include_tables, include_images))
            .filter(|t| !t.is_empty())
            .collect();
        texts.join(&format!("\n\n{PAGE_BREAK_MARKER}\n\n"))
    }

    /// Plain text with tables included and images skipped.
    pub fn plain_text(&self) -> String {
        self.flatten(true, false)
    }
}

/// Document metadata projected from the metadata backend's flat
/// attribute map.
///
/// Known attributes get typed fields; everything else is preserved in
/// `extra`. Absent attributes stay `None` rather than empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// Total number of pages reported by the metadata backend
    pub page_count: Option<u32>,

    /// Whether the document is encrypted
    pub encrypted: bool,

    /// Format version (e.g., "1.7")
    pub version: Option<String>,

    /// Attributes with no typed field
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    /// Build metadata from the backend's flat attribute map.
    ///
    /// Dates are expected as ISO-8601 strings; unparseable dates are kept
    /// verbatim in `extra` instead of being dropped.
    pub fn from_attributes(attrs: &BTreeMap<String, String>) -> Self {
        let mut meta = Metadata::default();

        for (key, value) in attrs {
            match key.as_str() {
                "title" => meta.title = Some(value.clone()),
                "author" => meta.author = Some(value.clone()),
                "subject" => meta.subject = Some(value.clone()),
                "keywords" => meta.keywords = Some(value.clone()),
                "creator" => meta.creator = Some(value.clone()),
                "producer" => meta.producer = Some(value.clone()),
                "creation_date" => match parse_iso_date(value) {
                    Some(date) => meta.created = Some(date),
                    None => {
                        meta.extra.insert(key.clone(), value.clone());
                    }
                },
                "mod_date" => match parse_iso_date(value) {
                    Some(date) => meta.modified = Some(date),
                    None => {
                        meta.extra.insert(key.clone(), value.clone());
                    }
                },
                "page_count" => match value.parse::<u32>() {
                    Ok(count) => meta.page_count = Some(count),
                    Err(_) => {
                        meta.extra.insert(key.clone(), value.clone());
                    }
                },
                "encrypted" => meta.encrypted = value == "true" || value == "1",
                "pdf_version" => meta.version = Some(value.clone()),
                // The source identifier is carried on Document, not here.
                "source" => {}
                _ => {
                    meta.extra.insert(key.clone(), value.clone());
                }
            }
        }

        meta
    }
}

fn parse_iso_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;

    fn text_page(number: u32, content: &str) -> Page {
        let mut el = Element::text(number, content);
        el.ordinal = Some(0);
        Page::with_elements(number, vec![el])
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new("a.pdf");
        assert!(doc.is_empty());
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.flatten(true, false), "");
    }

    #[test]
    fn test_flatten_orders_pages_regardless_of_insertion() {
        let mut doc = Document::new("a.pdf");
        doc.pages.push(text_page(2, "second page"));
        doc.pages.push(text_page(1, "first page"));

        let text = doc.flatten(true, false);
        assert_eq!(
            text,
            format!("first page\n\n{PAGE_BREAK_MARKER}\n\nsecond page")
        );
    }

    #[test]
    fn test_flatten_skips_empty_pages() {
        let mut doc = Document::new("a.pdf");
        doc.pages.push(text_page(1, "only page"));
        doc.pages.push(Page::new(2));

        assert_eq!(doc.flatten(true, false), "only page");
    }

    #[test]
    fn test_metadata_from_attributes() {
        let mut attrs = BTreeMap::new();
        attrs.insert("title".to_string(), "Annual Report".to_string());
        attrs.insert("author".to_string(), "Finance".to_string());
        attrs.insert("creation_date".to_string(), "2023-08-05T12:30:00Z".to_string());
        attrs.insert("page_count".to_string(), "12".to_string());
        attrs.insert("encrypted".to_string(), "false".to_string());
        attrs.insert("pdf_version".to_string(), "1.7".to_string());
        attrs.insert("scanner_model".to_string(), "XR-2".to_string());

        let meta = Metadata::from_attributes(&attrs);
        assert_eq!(meta.title.as_deref(), Some("Annual Report"));
        assert_eq!(meta.page_count, Some(12));
        assert!(!meta.encrypted);
        assert_eq!(meta.version.as_deref(), Some("1.7"));
        assert_eq!(meta.created.unwrap().to_rfc3339(), "2023-08-05T12:30:00+00:00");
        assert_eq!(meta.extra.get("scanner_model").unwrap(), "XR-2");
    }

    #[test]
    fn test_metadata_keeps_bad_date_in_extra() {
        let mut attrs = BTreeMap::new();
        attrs.insert("creation_date".to_string(), "sometime in 2023".to_string());

        let meta = Metadata::from_attributes(&attrs);
        assert!(meta.created.is_none());
        assert_eq!(meta.extra.get("creation_date").unwrap(), "sometime in 2023");
    }
}
