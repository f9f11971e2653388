//! Document model types for reconstructed content.
//!
//! This module defines the output representation of the reconstruction
//! pipeline: typed elements grouped into pages, pages grouped into a
//! document. Elements are created during assembly and never mutated
//! afterward.

mod document;
mod element;
mod page;

pub use document::{Document, Metadata, PAGE_BREAK_MARKER};
pub use element::{DetectorFlavor, Element, ElementContent, ElementKind, Provenance};
pub use page::Page;
