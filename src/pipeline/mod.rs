//! Document reconstruction pipeline.
//!
//! Runs the stages in order: text grouping, table deduplication, table
//! structural post-processing, then assembly into a [`Document`]. All
//! stages are pure, synchronous computations over already-materialized
//! backend output; element-level failures degrade to skipping or passing
//! through the affected element, never aborting the page.

mod assembler;
mod options;
mod table_merge;
mod table_split;
mod text_blocks;

pub use assembler::DocumentAssembler;
pub use options::PipelineOptions;
pub use table_merge::{TableMergeConfig, TableMerger};
pub use table_split::{TableSplitConfig, TableSplitter};
pub use text_blocks::{TextBlockConfig, TextBlockGrouper};

use crate::backend::{ElementsByPage, ExtractedContent, TableDetection};
use crate::error::Result;
use crate::model::Document;

/// The full reconstruction pipeline.
pub struct Pipeline {
    options: PipelineOptions,
    grouper: TextBlockGrouper,
    merger: TableMerger,
    splitter: TableSplitter,
}

impl Pipeline {
    /// Create a pipeline with default options.
    pub fn new() -> Self {
        Self::with_options(PipelineOptions::new())
    }

    /// Create a pipeline with custom options.
    ///
    /// Options are validated first; inconsistent values are overridden
    /// and logged.
    pub fn with_options(options: PipelineOptions) -> Self {
        let options = options.validated();
        Self {
            grouper: TextBlockGrouper::with_config(options.text.clone()),
            merger: TableMerger::with_config(options.merge.clone()),
            splitter: TableSplitter::with_config(options.split.clone()),
            options,
        }
    }

    /// Reconstruct a document from gathered backend output.
    pub fn run(&self, content: ExtractedContent) -> Result<Document> {
        let ExtractedContent {
            source,
            words,
            tables,
            images,
            figures,
            metadata,
        } = content;

        let mut text: ElementsByPage = ElementsByPage::new();
        for (page_num, page_words) in &words {
            let elements = self.grouper.group_page(page_words);
            if !elements.is_empty() {
                text.insert(*page_num, elements);
            }
        }

        let table_elements = self.process_tables(tables);

        let document = DocumentAssembler::new().assemble(
            &source,
            &metadata,
            text,
            table_elements,
            images,
            figures,
        );
        log::debug!(
            "reconstructed {} with {} pages, {} elements",
            document.source,
            document.page_count(),
            document.element_count()
        );
        Ok(document)
    }

    /// Deduplicate, guard, and structurally post-process table detections.
    fn process_tables(&self, detections: Vec<TableDetection>) -> ElementsByPage {
        let merged = self.merger.merge(detections);

        let mut results = ElementsByPage::new();
        for (page_num, page_detections) in merged {
            let mut elements = Vec::new();
            for (index, mut detection) in page_detections.into_iter().enumerate() {
                if detection.id.is_none() {
                    detection.id = Some(format!("p{page_num}-t{index}"));
                }
                if self.has_oversized_cell(&detection) {
                    log::debug!(
                        "tables: page {page_num} detection {index} dropped, cell exceeds {} chars",
                        self.options.max_cell_len
                    );
                    continue;
                }
                elements.extend(self.splitter.process(&detection));
            }
            if !elements.is_empty() {
                results.insert(page_num, elements);
            }
        }
        results
    }

    fn has_oversized_cell(&self, detection: &TableDetection) -> bool {
        if self.options.max_cell_len == 0 {
            return false;
        }
        detection.rows.iter().flatten().any(|cell| {
            cell.as_ref()
                .map(|text| text.len() > self.options.max_cell_len)
                .unwrap_or(false)
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::WordPrimitive;
    use crate::geometry::BoundingBox;
    use crate::model::DetectorFlavor;
    use std::collections::BTreeMap;

    #[test]
    fn test_run_empty_content() {
        let pipeline = Pipeline::new();
        let doc = pipeline.run(ExtractedContent::new("empty.pdf")).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.source, "empty.pdf");
    }

    #[test]
    fn test_run_text_and_tables_share_a_page() {
        let pipeline = Pipeline::new();
        let mut content = ExtractedContent::new("mixed.pdf");

        let mut words = BTreeMap::new();
        words.insert(
            1,
            vec![WordPrimitive::new("intro", 1, 0.0, 10.0, 40.0, 20.0)],
        );
        content.words = words;

        content.tables = vec![TableDetection::new(
            1,
            BoundingBox::new(0.0, 40.0, 100.0, 80.0),
            DetectorFlavor::Lattice,
            vec![vec![Some("a".to_string()), Some("b".to_string())]],
        )];

        let doc = pipeline.run(content).unwrap();
        assert_eq!(doc.page_count(), 1);
        let page = &doc.pages[0];
        assert_eq!(page.element_count(), 2);
        // Text sits above the table, so it reads first.
        assert!(page.elements[0].is_text());
        assert!(page.elements[1].is_table());
        assert_eq!(page.elements[0].ordinal, Some(0));
        assert_eq!(page.elements[1].ordinal, Some(1));
    }

    #[test]
    fn test_oversized_cell_drops_detection() {
        let pipeline = Pipeline::with_options(PipelineOptions::new().with_max_cell_len(5));
        let mut content = ExtractedContent::new("big.pdf");
        content.tables = vec![TableDetection::new(
            1,
            BoundingBox::new(0.0, 0.0, 100.0, 50.0),
            DetectorFlavor::Lattice,
            vec![vec![Some("this cell is far too long".to_string())]],
        )];

        let doc = pipeline.run(content).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_detections_get_lineage_ids() {
        let pipeline = Pipeline::new();
        let mut content = ExtractedContent::new("t.pdf");
        content.tables = vec![TableDetection::new(
            1,
            BoundingBox::new(0.0, 0.0, 100.0, 50.0),
            DetectorFlavor::Stream,
            vec![vec![Some("x".to_string())]],
        )];

        let doc = pipeline.run(content).unwrap();
        let element = &doc.pages[0].elements[0];
        assert_eq!(element.provenance.lineage.as_deref(), Some("p1-t0"));
    }
}
