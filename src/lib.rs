//! # restitch
//!
//! Reassembles the raw outputs of several PDF content-extraction
//! backends into a single, coherent, reading-ordered document model.
//!
//! Extraction backends each observe a page from a different, noisy
//! angle: one emits loose word boxes, several table detectors emit
//! competing detections over the same physical region. This library
//! deduplicates the competing table detections, infers logical table
//! headers and split points, groups words into lines and paragraph-like
//! blocks, and merges everything into one reading-order sequence per
//! page.
//!
//! ## Quick Start
//!
//! ```
//! use restitch::{reconstruct, ExtractedContent, WordPrimitive};
//!
//! fn main() -> restitch::Result<()> {
//!     let mut content = ExtractedContent::new("report.pdf");
//!     content
//!         .words
//!         .entry(1)
//!         .or_default()
//!         .push(WordPrimitive::new("Hello", 1, 72.0, 90.0, 110.0, 102.0));
//!
//!     let doc = reconstruct(content)?;
//!     println!("{}", doc.plain_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Table deduplication**: competing detections collapsed per page,
//!   preferring stream-flavor detections over lattice for one region
//! - **Structural table recovery**: header-block inference, header
//!   collapse, and splitting along re-header rows and geometric gaps
//! - **Text grouping**: words into lines, lines into blocks by vertical
//!   proximity and font style
//! - **Reading order**: deterministic per-page ordering with contiguous
//!   ordinals
//! - **Fail soft**: a malformed table degrades to its unprocessed
//!   detection instead of aborting the page

pub mod backend;
pub mod error;
pub mod geometry;
pub mod model;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use backend::{
    ElementsByPage, ExtractedContent, ExtractionBackend, TableDetection, WordPrimitive,
};
pub use error::{Error, Result};
pub use geometry::{BoundingBox, CellGeometry};
pub use model::{
    DetectorFlavor, Document, Element, ElementContent, ElementKind, Metadata, Page, Provenance,
    PAGE_BREAK_MARKER,
};
pub use pipeline::{
    Pipeline, PipelineOptions, TableMergeConfig, TableSplitConfig, TextBlockConfig,
};
pub use render::{to_json, to_text, FlattenOptions, JsonFormat};

/// Reconstruct a document from gathered backend output.
///
/// # Example
///
/// ```
/// use restitch::{reconstruct, ExtractedContent};
///
/// let doc = reconstruct(ExtractedContent::new("empty.pdf")).unwrap();
/// assert_eq!(doc.page_count(), 0);
/// ```
pub fn reconstruct(content: ExtractedContent) -> Result<Document> {
    Pipeline::new().run(content)
}

/// Reconstruct a document with custom pipeline options.
///
/// # Example
///
/// ```
/// use restitch::{reconstruct_with_options, ExtractedContent, PipelineOptions};
///
/// let options = PipelineOptions::new().with_iou_threshold(0.5);
/// let doc = reconstruct_with_options(ExtractedContent::new("a.pdf"), options).unwrap();
/// assert!(doc.is_empty());
/// ```
pub fn reconstruct_with_options(
    content: ExtractedContent,
    options: PipelineOptions,
) -> Result<Document> {
    Pipeline::with_options(options).run(content)
}

/// Invoke an extraction backend once and reconstruct from its output.
///
/// A backend failure is fatal for the whole parse and carries the source
/// identifier and the originating cause.
pub fn reconstruct_from_backend<B: ExtractionBackend>(
    source: impl Into<String>,
    backend: &mut B,
) -> Result<Document> {
    let content = ExtractedContent::gather(source, backend)?;
    Pipeline::new().run(content)
}

/// Invoke an extraction backend and reconstruct with custom options.
pub fn reconstruct_from_backend_with_options<B: ExtractionBackend>(
    source: impl Into<String>,
    backend: &mut B,
    options: PipelineOptions,
) -> Result<Document> {
    let content = ExtractedContent::gather(source, backend)?;
    Pipeline::with_options(options).run(content)
}

/// Builder for reconstructing and flattening documents.
///
/// # Example
///
/// ```
/// use restitch::{ExtractedContent, Restitch};
///
/// let text = Restitch::new()
///     .with_iou_threshold(0.7)
///     .with_images(true)
///     .reconstruct(ExtractedContent::new("report.pdf"))?
///     .to_text()?;
/// assert!(text.is_empty());
/// # Ok::<(), restitch::Error>(())
/// ```
pub struct Restitch {
    pipeline_options: PipelineOptions,
    flatten_options: FlattenOptions,
}

impl Restitch {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            pipeline_options: PipelineOptions::new(),
            flatten_options: FlattenOptions::default(),
        }
    }

    /// Replace the pipeline options wholesale.
    pub fn with_pipeline_options(mut self, options: PipelineOptions) -> Self {
        self.pipeline_options = options;
        self
    }

    /// Set the IOU threshold for table deduplication.
    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.pipeline_options = self.pipeline_options.with_iou_threshold(threshold);
        self
    }

    /// Set the minimum font size for text lines.
    pub fn with_min_font_size(mut self, size: f32) -> Self {
        self.pipeline_options = self.pipeline_options.with_min_font_size(size);
        self
    }

    /// Set the row-gap multiplier for geometric table splitting.
    pub fn with_gap_multiplier(mut self, multiplier: f32) -> Self {
        self.pipeline_options = self.pipeline_options.with_gap_multiplier(multiplier);
        self
    }

    /// Include or exclude tables when flattening to text.
    pub fn with_tables(mut self, include: bool) -> Self {
        self.flatten_options = self.flatten_options.with_tables(include);
        self
    }

    /// Include or exclude image captions when flattening to text.
    pub fn with_images(mut self, include: bool) -> Self {
        self.flatten_options = self.flatten_options.with_images(include);
        self
    }

    /// Reconstruct from gathered content and return a result wrapper.
    pub fn reconstruct(self, content: ExtractedContent) -> Result<RestitchResult> {
        let document = Pipeline::with_options(self.pipeline_options).run(content)?;
        Ok(RestitchResult {
            document,
            flatten_options: self.flatten_options,
        })
    }

    /// Invoke an extraction backend and reconstruct from its output.
    pub fn from_backend<B: ExtractionBackend>(
        self,
        source: impl Into<String>,
        backend: &mut B,
    ) -> Result<RestitchResult> {
        let content = ExtractedContent::gather(source, backend)?;
        self.reconstruct(content)
    }
}

impl Default for Restitch {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of reconstructing a document.
pub struct RestitchResult {
    /// The reconstructed document
    pub document: Document,
    /// Flatten options to use
    flatten_options: FlattenOptions,
}

impl RestitchResult {
    /// Flatten to plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.document, &self.flatten_options)
    }

    /// Export as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Plain text with default inclusion settings.
    pub fn plain_text(&self) -> String {
        self.document.plain_text()
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
