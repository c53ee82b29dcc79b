//! Tree-edit-distance based table similarity (TEDS).
//!
//! Tables are normalized to a canonical [`TableTree`] whatever their source
//! (HTML, markdown pipe table, JSON rows) and compared with an ordered tree
//! edit distance:
//!
//! ```text
//! TEDS = 1 - edit_distance(T1, T2) / max(|T1|, |T2|)
//! ```
//!
//! S-TEDS runs the same computation with cell text left out, so only tags,
//! span attributes and shape count.
//!
//! # Example
//!
//! ```
//! let a = "<table><tr><td>A</td></tr></table>";
//! let b = "<table><tr><td>B</td></tr></table>";
//! assert!(docscore::teds(a, b, false).score < 1.0);
//! assert_eq!(docscore::s_teds(a, b).score, 1.0);
//! ```

mod distance;
mod parse;
mod tree;

pub use distance::{edit_distance, list_edit_distance};
pub use parse::{table_tree, to_tree, TableSource, MAX_TABLE_DEPTH, TABLES_TAG};
pub use tree::{node_count, TableTree, SPAN_ATTRS};

use crate::metric::{run_metric, MetricResult};

/// Metric name of full TEDS.
pub const TEDS_NAME: &str = "table_TEDS";

/// Metric name of structure-only TEDS.
pub const S_TEDS_NAME: &str = "table_S-TEDS";

/// Metric name for the given mode.
pub fn metric_name(structure_only: bool) -> &'static str {
    if structure_only {
        S_TEDS_NAME
    } else {
        TEDS_NAME
    }
}

/// Score two table sources.
///
/// Both sides without a table score 1.0, exactly one side without a table
/// scores 0.0. Never panics outward: failures come back as a failed result.
pub fn teds<'a, 'b>(
    predicted: impl Into<TableSource<'a>>,
    groundtruth: impl Into<TableSource<'b>>,
    structure_only: bool,
) -> MetricResult {
    let (predicted, groundtruth) = (predicted.into(), groundtruth.into());
    let name = metric_name(structure_only);
    run_metric(name, || {
        let predicted = to_tree(predicted, structure_only);
        let groundtruth = to_tree(groundtruth, structure_only);
        Ok(score_trees(
            name,
            predicted.as_ref(),
            groundtruth.as_ref(),
            structure_only,
        ))
    })
}

/// Structure-only TEDS.
pub fn s_teds<'a, 'b>(
    predicted: impl Into<TableSource<'a>>,
    groundtruth: impl Into<TableSource<'b>>,
) -> MetricResult {
    teds(predicted, groundtruth, true)
}

/// Score two already built trees.
pub fn score_trees(
    name: &str,
    predicted: Option<&TableTree>,
    groundtruth: Option<&TableTree>,
    structure_only: bool,
) -> MetricResult {
    let predicted_nodes = node_count(predicted);
    let groundtruth_nodes = node_count(groundtruth);

    let (distance, score) = match (predicted, groundtruth) {
        (None, None) => (0, 1.0),
        (Some(p), Some(g)) => {
            let distance = edit_distance(p, g, structure_only);
            let max_nodes = predicted_nodes.max(groundtruth_nodes) as f64;
            (distance, (1.0 - distance as f64 / max_nodes).clamp(0.0, 1.0))
        }
        _ => (predicted_nodes.max(groundtruth_nodes), 0.0),
    };

    log::trace!(
        "{name}: {predicted_nodes} vs {groundtruth_nodes} nodes, distance {distance}"
    );

    let mut result = MetricResult::new(name, score)
        .with_detail("predicted_nodes", predicted_nodes)
        .with_detail("groundtruth_nodes", groundtruth_nodes)
        .with_detail("edit_distance", distance)
        .with_detail("structure_only", structure_only);
    if predicted.is_none() || groundtruth.is_none() {
        let note = match (predicted, groundtruth) {
            (None, None) => "both empty",
            (None, _) => "predicted has no table",
            _ => "groundtruth has no table",
        };
        result = result.with_detail("note", note);
    }
    result
}
