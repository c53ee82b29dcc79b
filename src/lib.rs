//! # docscore
//!
//! Scoring of extracted document content against ground truth.
//!
//! An extractor turns a document into markdown and, optionally, a list of
//! typed content blocks. This library splits both the prediction and the
//! reference into four categories (code, formulas, tables, prose) and scores
//! each pair: normalized edit similarity per category plus tree-edit-distance
//! similarity (TEDS) for tables.
//!
//! ## Quick Start
//!
//! ```
//! use docscore::{calculate_all, OVERALL};
//!
//! let predicted = "# Intro\n\nSome text with $x^2$.";
//! let reference = "# Intro\n\nSome text with $x^2$.";
//!
//! let results = calculate_all(Some(predicted), None, Some(reference), None);
//! assert_eq!(results["text_edit"].score, 1.0);
//! assert_eq!(results[OVERALL].score, 1.0);
//! ```
//!
//! ## Features
//!
//! - **Segmentation**: typed blocks or raw markdown into four buckets
//! - **Edit metrics**: Levenshtein similarity per category
//! - **TEDS**: HTML and markdown tables compared as trees, with an optional
//!   structure-only variant
//! - **Fault isolation**: a failing or panicking metric becomes a failed
//!   entry and the other metrics still run
//! - **Rendering**: typed blocks back to markdown, results to JSON

pub mod detect;
pub mod error;
pub mod metric;
pub mod model;
pub mod render;
pub mod segment;
pub mod teds;

// Re-export commonly used types
pub use detect::{detect_table_format, is_table, TableFormat};
pub use error::{Error, Result};
pub use metric::{
    calculate_all, edit_score, EditMetric, EvalOptions, Metric, MetricCalculator, MetricInput,
    MetricResult, MetricResults, TedsMetric, OVERALL,
};
pub use model::{
    BlockContent, BlockKind, ExtractionResult, GroundTruthSample, InlineSpan, Table, TableCell,
    TableRow, TypedBlock,
};
pub use render::{JsonFormat, RenderOptions, TableFallback};
pub use segment::{
    segment, segment_blocks, segment_markdown, segment_with_report, Category, CleanupOptions,
    SegmentOptions, SegmentReport, SegmentSource, SegmentationResult, Segmenter,
};
pub use teds::{s_teds, teds, to_tree, TableSource, TableTree};

/// Score an extraction against a ground-truth sample with the default
/// metrics.
///
/// # Example
///
/// ```
/// use docscore::{evaluate, ExtractionResult, GroundTruthSample};
///
/// let extraction = ExtractionResult::from_content("```\nls\n```");
/// let sample = GroundTruthSample::from_content("```\nls -la\n```");
/// let results = evaluate(&extraction, &sample)?;
/// assert!(results["code_edit"].score < 1.0);
/// # Ok::<(), docscore::Error>(())
/// ```
pub fn evaluate(extraction: &ExtractionResult, sample: &GroundTruthSample) -> Result<MetricResults> {
    MetricCalculator::with_defaults().evaluate(extraction, sample)
}

/// Score with options loaded from a JSON file.
///
/// # Example
///
/// ```no_run
/// use docscore::evaluate_with_config;
///
/// let results = evaluate_with_config("eval.json", Some("a"), None, Some("b"), None)?;
/// # Ok::<(), docscore::Error>(())
/// ```
pub fn evaluate_with_config<P: AsRef<std::path::Path>>(
    config: P,
    predicted_content: Option<&str>,
    predicted_blocks: Option<&[TypedBlock]>,
    groundtruth_content: Option<&str>,
    groundtruth_blocks: Option<&[TypedBlock]>,
) -> Result<MetricResults> {
    let calculator = MetricCalculator::with_options(EvalOptions::from_path(config)?)?;
    Ok(calculator.calculate_all(
        predicted_content,
        predicted_blocks,
        groundtruth_content,
        groundtruth_blocks,
    ))
}

/// Reconstruct markdown from typed blocks with default options.
pub fn to_markdown(blocks: &[TypedBlock]) -> String {
    render::to_markdown(blocks, &RenderOptions::default())
}

/// Serialize metric results to JSON.
pub fn to_json(results: &MetricResults, format: JsonFormat) -> Result<String> {
    render::to_json(results, format)
}
