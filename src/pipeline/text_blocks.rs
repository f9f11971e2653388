//! Grouping of word primitives into lines and paragraph-like blocks.
//!
//! Words arrive from the text backend unordered; this stage sorts them
//! into visual order, merges them into lines by vertical proximity, then
//! merges consecutive same-style lines into block elements. Ordering
//! across element types happens later, during assembly.

use crate::backend::WordPrimitive;
use crate::geometry::BoundingBox;
use crate::model::{Element, ElementContent};

/// Text grouping configuration.
#[derive(Debug, Clone)]
pub struct TextBlockConfig {
    /// Vertical tolerance for words to share a line (points).
    pub line_tolerance: f32,
    /// Maximum vertical gap between lines of the same block (points).
    pub block_gap: f32,
    /// Lines with a known font size below this are dropped (0 = off).
    pub min_font_size: f32,
    /// Maximum font-size difference for lines to share a block.
    pub max_font_size_delta: f32,
}

impl Default for TextBlockConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 4.0,
            block_gap: 8.0,
            min_font_size: 0.0,
            max_font_size_delta: 0.5,
        }
    }
}

/// A merged line of words, intermediate to block grouping.
#[derive(Debug, Clone)]
struct Line {
    text: String,
    bbox: BoundingBox,
    font_size: Option<f32>,
    font_name: Option<String>,
}

/// Groups word primitives into text block elements.
pub struct TextBlockGrouper {
    config: TextBlockConfig,
}

impl TextBlockGrouper {
    /// Create a grouper with default configuration.
    pub fn new() -> Self {
        Self {
            config: TextBlockConfig::default(),
        }
    }

    /// Create a grouper with custom configuration.
    pub fn with_config(config: TextBlockConfig) -> Self {
        Self { config }
    }

    /// Group one page's words into text block elements.
    ///
    /// The input order is irrelevant; output blocks follow the page's
    /// visual top-down order.
    pub fn group_page(&self, words: &[WordPrimitive]) -> Vec<Element> {
        if words.is_empty() {
            return vec![];
        }

        let mut sorted: Vec<&WordPrimitive> = words.iter().collect();
        sorted.sort_by(|a, b| {
            a.top
                .partial_cmp(&b.top)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal))
        });

        let page = sorted[0].page;
        let lines = self.group_words_into_lines(&sorted);
        log::debug!(
            "text grouping: page {} with {} words -> {} lines",
            page,
            words.len(),
            lines.len()
        );

        let blocks = self.group_lines_into_blocks(lines);
        blocks
            .into_iter()
            .map(|group| merge_block(page, group))
            .collect()
    }

    /// Group vertically-adjacent words into lines.
    ///
    /// A word starts a new line when its top edge differs from the
    /// current line's anchor top by more than the tolerance.
    fn group_words_into_lines(&self, sorted: &[&WordPrimitive]) -> Vec<Line> {
        let mut lines: Vec<Line> = Vec::new();
        let mut current: Vec<&WordPrimitive> = Vec::new();
        let mut anchor_top: Option<f32> = None;

        for &word in sorted {
            match anchor_top {
                Some(top) if (word.top - top).abs() <= self.config.line_tolerance => {
                    current.push(word);
                }
                _ => {
                    if let Some(line) = self.build_line(&current) {
                        lines.push(line);
                    }
                    anchor_top = Some(word.top);
                    current = vec![word];
                }
            }
        }
        if let Some(line) = self.build_line(&current) {
            lines.push(line);
        }

        lines
    }

    /// Build a line from its words, or `None` if it should be dropped.
    fn build_line(&self, words: &[&WordPrimitive]) -> Option<Line> {
        let first = words.first()?;

        let text = words
            .iter()
            .map(|w| w.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return None;
        }

        if let Some(size) = first.font_size {
            if self.config.min_font_size > 0.0 && size < self.config.min_font_size {
                return None;
            }
        }

        let bbox = words
            .iter()
            .map(|w| w.bbox())
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_else(|| first.bbox());

        Some(Line {
            text,
            bbox,
            font_size: first.font_size,
            font_name: first.font_name.clone(),
        })
    }

    /// Merge consecutive close, same-style lines into blocks.
    fn group_lines_into_blocks(&self, lines: Vec<Line>) -> Vec<Vec<Line>> {
        let mut blocks: Vec<Vec<Line>> = Vec::new();
        let mut current: Vec<Line> = Vec::new();

        for line in lines {
            let merge = match current.last() {
                Some(prev) => {
                    let gap = line.bbox.y0 - prev.bbox.y1;
                    let same_style = prev.font_name == line.font_name
                        && (prev.font_size.unwrap_or(0.0) - line.font_size.unwrap_or(0.0)).abs()
                            < self.config.max_font_size_delta;
                    gap <= self.config.block_gap && same_style
                }
                None => true,
            };

            if merge {
                current.push(line);
            } else {
                blocks.push(std::mem::take(&mut current));
                current.push(line);
            }
        }
        if !current.is_empty() {
            blocks.push(current);
        }

        blocks
    }
}

impl Default for TextBlockGrouper {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse a block of lines into one text element.
fn merge_block(page: u32, lines: Vec<Line>) -> Element {
    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let bbox = lines
        .iter()
        .map(|l| l.bbox)
        .reduce(|acc, b| acc.union(&b));

    let first = &lines[0];
    let mut element = Element {
        page,
        ordinal: None,
        bbox,
        content: ElementContent::Text {
            content: text,
            font_size: first.font_size,
            font_name: first.font_name.clone(),
        },
        provenance: Default::default(),
    };
    element.provenance.merged_lines = Some(lines.len() as u32);
    element
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x0: f32, top: f32, x1: f32, bottom: f32) -> WordPrimitive {
        let mut w = WordPrimitive::new(text, 1, x0, top, x1, bottom);
        w.font_size = Some(10.0);
        w.font_name = Some("Helvetica".to_string());
        w
    }

    #[test]
    fn test_empty_input() {
        let grouper = TextBlockGrouper::new();
        assert!(grouper.group_page(&[]).is_empty());
    }

    #[test]
    fn test_words_on_one_line_join_in_x_order() {
        let grouper = TextBlockGrouper::new();
        // Deliberately out of x order.
        let words = vec![
            word("world", 40.0, 100.0, 70.0, 110.0),
            word("hello", 0.0, 101.0, 30.0, 111.0),
        ];
        let blocks = grouper.group_page(&words);
        assert_eq!(blocks.len(), 1);
        match &blocks[0].content {
            ElementContent::Text { content, .. } => assert_eq!(content, "hello world"),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_vertical_tolerance_starts_new_line() {
        let grouper = TextBlockGrouper::new();
        let words = vec![
            word("one", 0.0, 100.0, 30.0, 110.0),
            // 5 points below the anchor: beyond the 4.0 tolerance, but
            // close enough to stay in the same block.
            word("two", 0.0, 105.0, 30.0, 115.0),
        ];
        let blocks = grouper.group_page(&words);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].provenance.merged_lines, Some(2));
    }

    #[test]
    fn test_block_split_on_large_gap() {
        let grouper = TextBlockGrouper::new();
        let words = vec![
            word("para1", 0.0, 100.0, 30.0, 110.0),
            // 20 points below the previous bottom: beyond the block gap.
            word("para2", 0.0, 130.0, 30.0, 140.0),
        ];
        let blocks = grouper.group_page(&words);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_block_split_on_style_change() {
        let grouper = TextBlockGrouper::new();
        let mut heading = word("Title", 0.0, 100.0, 30.0, 112.0);
        heading.font_size = Some(18.0);
        let body = word("body", 0.0, 116.0, 30.0, 126.0);

        let blocks = grouper.group_page(&[heading, body]);
        assert_eq!(blocks.len(), 2);
        match &blocks[0].content {
            ElementContent::Text { font_size, .. } => assert_eq!(*font_size, Some(18.0)),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_min_font_size_filter() {
        let config = TextBlockConfig {
            min_font_size: 6.0,
            ..Default::default()
        };
        let grouper = TextBlockGrouper::with_config(config);
        let mut footnote = word("tiny", 0.0, 100.0, 30.0, 104.0);
        footnote.font_size = Some(4.0);
        let body = word("body", 0.0, 120.0, 30.0, 130.0);

        let blocks = grouper.group_page(&[footnote, body.clone()]);
        assert_eq!(blocks.len(), 1);

        // Lines without a known font size are never filtered.
        let mut r#unsized = body;
        r#unsized.font_size = None;
        let blocks = grouper.group_page(&[r#unsized]);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_blank_words_dropped() {
        let grouper = TextBlockGrouper::new();
        let words = vec![word("  ", 0.0, 100.0, 30.0, 110.0)];
        assert!(grouper.group_page(&words).is_empty());
    }

    #[test]
    fn test_single_line_block_still_emitted() {
        let grouper = TextBlockGrouper::new();
        let blocks = grouper.group_page(&[word("alone", 0.0, 100.0, 30.0, 110.0)]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].provenance.merged_lines, Some(1));
        assert_eq!(
            blocks[0].bbox,
            Some(BoundingBox::new(0.0, 100.0, 30.0, 110.0))
        );
    }
}
