//! Content segmentation into code, formula, table and text buckets.
//!
//! Two segmenters share one output shape:
//!
//! - [`segment_blocks`] walks typed blocks and routes each node by kind.
//! - [`segment_markdown`] scans raw markdown in a fixed priority order
//!   (fenced code, inline code, display math, inline math, HTML tables,
//!   pipe tables, headings) and keeps the remainder as text.
//!
//! [`segment`] prefers typed blocks when they yield anything and falls back
//! to markdown otherwise.
//!
//! # Example
//!
//! ```
//! let result = docscore::segment(Some("Intro\n\n```\nlet x = 1;\n```"), None);
//! assert_eq!(result.code, "let x = 1;");
//! assert_eq!(result.text, "Intro");
//! ```

mod cleanup;
mod list;
mod markdown;
mod scan;
mod validate;

pub(crate) use list::strip_math_delimiters;
pub(crate) use scan::{html_table_spans, pipe_table_spans, Claims};

pub use cleanup::{CleanupOptions, CleanupPipeline};
pub use validate::{is_separator_line, is_valid_math_formula, is_valid_table_row, split_cells};

use serde::{Deserialize, Serialize};

use crate::model::TypedBlock;

/// Separator placed between fragments of one category.
pub const FRAGMENT_SEPARATOR: &str = "\n\n";

/// One of the four content categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Code blocks and inline code
    Code,
    /// Display and inline math
    Formula,
    /// HTML and markdown tables
    Table,
    /// Prose
    Text,
}

impl Category {
    /// All categories in output order.
    pub const ALL: [Category; 4] = [
        Category::Code,
        Category::Formula,
        Category::Table,
        Category::Text,
    ];

    /// Lowercase category name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Code => "code",
            Category::Formula => "formula",
            Category::Table => "table",
            Category::Text => "text",
        }
    }

    fn index(self) -> usize {
        match self {
            Category::Code => 0,
            Category::Formula => 1,
            Category::Table => 2,
            Category::Text => 3,
        }
    }
}

/// Segmented document content.
///
/// Every field is the concatenation of that category's fragments in
/// encounter order, joined by a blank line; a category without content is
/// an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationResult {
    pub code: String,
    pub formula: String,
    pub table: String,
    pub text: String,
}

impl SegmentationResult {
    /// Get the text of a category.
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Code => &self.code,
            Category::Formula => &self.formula,
            Category::Table => &self.table,
            Category::Text => &self.text,
        }
    }

    /// Check whether every category is empty.
    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_empty())
    }
}

/// Which input produced a segmentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentSource {
    /// Typed blocks were authoritative
    Blocks,
    /// Raw markdown was scanned
    Markdown,
    /// Neither input had content
    #[default]
    Empty,
}

impl SegmentSource {
    /// Lowercase source name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentSource::Blocks => "blocks",
            SegmentSource::Markdown => "markdown",
            SegmentSource::Empty => "empty",
        }
    }
}

/// Fragment counts per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentStats {
    pub code_fragments: usize,
    pub formula_fragments: usize,
    pub table_fragments: usize,
    pub text_fragments: usize,
}

impl SegmentStats {
    /// Total number of fragments.
    pub fn total(&self) -> usize {
        self.code_fragments + self.formula_fragments + self.table_fragments + self.text_fragments
    }
}

/// Segmentation result together with how it was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentReport {
    pub result: SegmentationResult,
    pub source: SegmentSource,
    pub stats: SegmentStats,
}

/// Options for segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentOptions {
    /// Cleanup applied to fragments
    pub cleanup: CleanupOptions,

    /// Use typed blocks before markdown when both are given
    pub prefer_blocks: bool,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            cleanup: CleanupOptions::default(),
            prefer_blocks: true,
        }
    }
}

impl SegmentOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Choose whether typed blocks take precedence over markdown.
    pub fn with_prefer_blocks(mut self, prefer: bool) -> Self {
        self.prefer_blocks = prefer;
        self
    }
}

/// Stateless segmenter bound to a set of options.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    options: SegmentOptions,
    cleanup: CleanupPipeline,
}

impl Segmenter {
    /// Create a segmenter with the given options.
    pub fn new(options: SegmentOptions) -> Self {
        let cleanup = CleanupPipeline::new(options.cleanup.clone());
        Self { options, cleanup }
    }

    /// Get the options.
    pub fn options(&self) -> &SegmentOptions {
        &self.options
    }

    /// Segment a document given as markdown and/or typed blocks.
    pub fn segment(&self, text: Option<&str>, blocks: Option<&[TypedBlock]>) -> SegmentationResult {
        self.report(text, blocks).result
    }

    /// Segment a document and report which input was used.
    pub fn report(&self, text: Option<&str>, blocks: Option<&[TypedBlock]>) -> SegmentReport {
        let blocks = blocks.filter(|b| !b.is_empty());
        let text = text.filter(|t| !t.trim().is_empty());

        let report = if self.options.prefer_blocks {
            self.from_blocks(blocks).or_else(|| self.from_markdown(text))
        } else {
            self.from_markdown(text).or_else(|| self.from_blocks(blocks))
        };

        let report = report.unwrap_or_default();
        log::debug!(
            "segmented from {}: {} fragments",
            report.source.as_str(),
            report.stats.total()
        );
        report
    }

    /// Segment typed blocks only.
    pub fn segment_blocks(&self, blocks: &[TypedBlock]) -> SegmentationResult {
        let mut buckets = Buckets::new(&self.cleanup);
        list::collect(blocks, &mut buckets);
        buckets.finish().0
    }

    /// Segment raw markdown only.
    pub fn segment_markdown(&self, text: &str) -> SegmentationResult {
        let mut buckets = Buckets::new(&self.cleanup);
        markdown::collect(text, &self.cleanup, &mut buckets);
        buckets.finish().0
    }

    fn from_blocks(&self, blocks: Option<&[TypedBlock]>) -> Option<SegmentReport> {
        let mut buckets = Buckets::new(&self.cleanup);
        list::collect(blocks?, &mut buckets);
        let (result, stats) = buckets.finish();
        if result.is_empty() {
            log::debug!("typed blocks yielded no content");
            return None;
        }
        Some(SegmentReport {
            result,
            source: SegmentSource::Blocks,
            stats,
        })
    }

    fn from_markdown(&self, text: Option<&str>) -> Option<SegmentReport> {
        let mut buckets = Buckets::new(&self.cleanup);
        markdown::collect(text?, &self.cleanup, &mut buckets);
        let (result, stats) = buckets.finish();
        Some(SegmentReport {
            result,
            source: SegmentSource::Markdown,
            stats,
        })
    }
}

/// Segment a document with default options.
///
/// Non-empty typed blocks that yield any content are authoritative;
/// otherwise the markdown text is scanned. Missing inputs give an all-empty
/// result.
pub fn segment(text: Option<&str>, blocks: Option<&[TypedBlock]>) -> SegmentationResult {
    Segmenter::default().segment(text, blocks)
}

/// Like [`segment`], also reporting the source and fragment counts.
pub fn segment_with_report(text: Option<&str>, blocks: Option<&[TypedBlock]>) -> SegmentReport {
    Segmenter::default().report(text, blocks)
}

/// Segment typed blocks with default options.
pub fn segment_blocks(blocks: &[TypedBlock]) -> SegmentationResult {
    Segmenter::default().segment_blocks(blocks)
}

/// Segment raw markdown with default options.
pub fn segment_markdown(text: &str) -> SegmentationResult {
    Segmenter::default().segment_markdown(text)
}

/// Per-category fragment accumulator.
pub(crate) struct Buckets<'a> {
    cleanup: &'a CleanupPipeline,
    fragments: [Vec<String>; 4],
}

impl<'a> Buckets<'a> {
    pub(crate) fn new(cleanup: &'a CleanupPipeline) -> Self {
        Self {
            cleanup,
            fragments: Default::default(),
        }
    }

    /// Add a fragment; blank fragments are dropped.
    ///
    /// Text is fully cleaned. Code keeps its indentation; formulas and
    /// tables are normalized and trimmed.
    pub(crate) fn push(&mut self, category: Category, fragment: &str) {
        let cleaned = match category {
            Category::Text => self.cleanup.process(fragment),
            Category::Code => {
                let normalized = self.cleanup.normalize(fragment);
                normalized
                    .trim_end()
                    .trim_start_matches(['\n', '\r'])
                    .to_string()
            }
            Category::Formula | Category::Table => {
                self.cleanup.normalize(fragment).trim().to_string()
            }
        };
        if !cleaned.trim().is_empty() {
            self.fragments[category.index()].push(cleaned);
        }
    }

    pub(crate) fn finish(self) -> (SegmentationResult, SegmentStats) {
        let [code, formula, table, text] = self.fragments;
        let stats = SegmentStats {
            code_fragments: code.len(),
            formula_fragments: formula.len(),
            table_fragments: table.len(),
            text_fragments: text.len(),
        };
        let result = SegmentationResult {
            code: code.join(FRAGMENT_SEPARATOR),
            formula: formula.join(FRAGMENT_SEPARATOR),
            table: table.join(FRAGMENT_SEPARATOR),
            text: text.join(FRAGMENT_SEPARATOR),
        };
        (result, stats)
    }
}
