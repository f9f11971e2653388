//! Plain text rendering for reconstructed documents.

use crate::error::Result;
use crate::model::Document;

use super::FlattenOptions;

/// Flatten a document to plain text.
///
/// Page texts are emitted in page-number order, joined by the page-break
/// marker, with elements in reading order inside each page.
pub fn to_text(doc: &Document, options: &FlattenOptions) -> Result<String> {
    Ok(doc.flatten(options.include_tables, options.include_images))
}
