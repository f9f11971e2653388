//! Extraction backend contracts.
//!
//! Provides the input shapes produced by the external extraction
//! collaborators (word geometry, table detectors, image/figure regions,
//! structural metadata) and a trait-based interface for invoking them,
//! isolating the concrete extraction libraries from the reconstruction
//! pipeline.
//!
//! Backends are invoked once, synchronously, before reconstruction
//! begins. All geometry handed over here must already be normalized into
//! the crate's canonical top-down coordinate convention (see
//! [`crate::geometry`]).

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, CellGeometry};
use crate::model::{DetectorFlavor, Element};

/// Mapping from 1-based page number to the elements found on that page.
pub type ElementsByPage = BTreeMap<u32, Vec<Element>>;

/// A single word with position and font attributes, as produced by the
/// text extraction backend.
#[derive(Debug, Clone, PartialEq)]
pub struct WordPrimitive {
    /// The word text.
    pub text: String,
    /// Left edge.
    pub x0: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub x1: f32,
    /// Bottom edge.
    pub bottom: f32,
    /// Font size in points, when the backend reports one.
    pub font_size: Option<f32>,
    /// Font name, when the backend reports one.
    pub font_name: Option<String>,
    /// 1-based page number.
    pub page: u32,
}

impl WordPrimitive {
    /// Create a word primitive without font attributes.
    pub fn new(text: impl Into<String>, page: u32, x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
            x1,
            bottom,
            font_size: None,
            font_name: None,
            page,
        }
    }

    /// Bounding box of the word.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.x0, self.top, self.x1, self.bottom)
    }
}

/// A raw table detection from one of the table-detection backends.
///
/// Transient: owned by the merger/post-processor during the pipeline and
/// discarded after conversion to [`Element`].
#[derive(Debug, Clone)]
pub struct TableDetection {
    /// 1-based page number.
    pub page: u32,
    /// Detector-assigned identifier, if any. Used for lineage references
    /// on split subtables; a deterministic one is synthesized when absent.
    pub id: Option<String>,
    /// Region covered by the detection, if the detector reported one.
    pub bbox: Option<BoundingBox>,
    /// Detection strategy.
    pub flavor: DetectorFlavor,
    /// Detector accuracy score, when reported (Camelot-style 0-100).
    pub accuracy: Option<f32>,
    /// Cell-level geometry, when the detector exposes it.
    pub cells: Option<Vec<CellGeometry>>,
    /// Row-major grid of raw cell strings; `None` for blank cells.
    pub rows: Vec<Vec<Option<String>>>,
    /// Name of the originating detector backend.
    pub detector: String,
}

impl TableDetection {
    /// Create a detection with a bounding box and raw rows.
    pub fn new(
        page: u32,
        bbox: BoundingBox,
        flavor: DetectorFlavor,
        rows: Vec<Vec<Option<String>>>,
    ) -> Self {
        Self {
            page,
            id: None,
            bbox: Some(bbox),
            flavor,
            accuracy: None,
            cells: None,
            rows,
            detector: String::new(),
        }
    }

    /// Attach cell geometry and return self.
    pub fn with_cells(mut self, cells: Vec<CellGeometry>) -> Self {
        self.cells = Some(cells);
        self
    }

    /// Attach a detector name and return self.
    pub fn with_detector(mut self, detector: impl Into<String>) -> Self {
        self.detector = detector.into();
        self
    }

    /// Attach a detector-assigned id and return self.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach an accuracy score and return self.
    pub fn with_accuracy(mut self, accuracy: f32) -> Self {
        self.accuracy = Some(accuracy);
        self
    }
}

/// Everything the extraction backends produced for one document.
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    /// Source file identifier (path, URL, or logical name).
    pub source: String,
    /// Words per page, from the text backend.
    pub words: BTreeMap<u32, Vec<WordPrimitive>>,
    /// Raw table detections across all detector backends.
    pub tables: Vec<TableDetection>,
    /// Image elements per page, already final.
    pub images: ElementsByPage,
    /// Figure elements per page, already final.
    pub figures: ElementsByPage,
    /// Flat metadata attribute map (title, author, ISO-8601 dates, page
    /// count, encryption flag, format version). Absent fields omitted.
    pub metadata: BTreeMap<String, String>,
}

impl ExtractedContent {
    /// Create empty content for a source identifier.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Invoke every collaborator of `backend` once and collect the output.
    ///
    /// Any backend failure is fatal for the whole parse and is wrapped
    /// with the source identifier and the originating cause.
    pub fn gather<B: ExtractionBackend>(source: impl Into<String>, backend: &mut B) -> Result<Self> {
        let source = source.into();
        let wrap = |e: BackendError, file: &str| Error::backend(file, e);

        let words = backend.words().map_err(|e| wrap(e, &source))?;
        let tables = backend.table_detections().map_err(|e| wrap(e, &source))?;
        let images = backend.images().map_err(|e| wrap(e, &source))?;
        let figures = backend.figures().map_err(|e| wrap(e, &source))?;
        let metadata = backend.metadata().map_err(|e| wrap(e, &source))?;

        Ok(Self {
            source,
            words,
            tables,
            images,
            figures,
            metadata,
        })
    }
}

/// Error type reported by extraction backends.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Abstract interface over the external extraction collaborators.
///
/// Implementations adapt concrete extraction libraries to the input
/// shapes the pipeline consumes, normalizing geometry into the canonical
/// convention. Every method is invoked exactly once per parse; all but
/// [`metadata`](Self::metadata) default to empty output so partial
/// backends stay cheap to implement.
pub trait ExtractionBackend {
    /// Words per page from the text backend.
    fn words(&mut self) -> std::result::Result<BTreeMap<u32, Vec<WordPrimitive>>, BackendError> {
        Ok(BTreeMap::new())
    }

    /// Raw table detections across all table detectors.
    fn table_detections(&mut self) -> std::result::Result<Vec<TableDetection>, BackendError> {
        Ok(Vec::new())
    }

    /// Final image elements per page.
    fn images(&mut self) -> std::result::Result<ElementsByPage, BackendError> {
        Ok(BTreeMap::new())
    }

    /// Final figure elements per page.
    fn figures(&mut self) -> std::result::Result<ElementsByPage, BackendError> {
        Ok(BTreeMap::new())
    }

    /// Flat metadata attribute map.
    fn metadata(&mut self) -> std::result::Result<BTreeMap<String, String>, BackendError>;
}
