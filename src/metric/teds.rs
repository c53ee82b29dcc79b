//! TEDS over the segmented table buckets.

use serde_json::Value;

use crate::error::Result;
use crate::segment::Category;
use crate::teds::{metric_name, score_trees, to_tree};

use super::{EditMetric, Metric, MetricInput, MetricResult, MetricResults};

const DEPENDENCIES: &[&str] = &["table_edit"];

/// Tree-edit-distance similarity of the predicted and reference tables.
///
/// Reads the `table_edit` result and copies it into its details as
/// `table_edit_reference`; the score itself is computed independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct TedsMetric {
    structure_only: bool,
}

impl TedsMetric {
    /// Create a full TEDS metric (`table_TEDS`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a structure-only metric (`table_S-TEDS`).
    pub fn structure_only() -> Self {
        Self {
            structure_only: true,
        }
    }

    /// Check whether cell text is ignored.
    pub fn is_structure_only(&self) -> bool {
        self.structure_only
    }
}

impl Metric for TedsMetric {
    fn name(&self) -> &str {
        metric_name(self.structure_only)
    }

    fn depends_on(&self) -> &[&str] {
        DEPENDENCIES
    }

    fn calculate(&self, input: &MetricInput<'_>, completed: &MetricResults) -> Result<MetricResult> {
        let predicted = input.predicted().result.get(Category::Table);
        let groundtruth = input.groundtruth().result.get(Category::Table);

        let predicted = to_tree(predicted, self.structure_only);
        let groundtruth = to_tree(groundtruth, self.structure_only);
        let result = score_trees(
            self.name(),
            predicted.as_ref(),
            groundtruth.as_ref(),
            self.structure_only,
        );

        let reference = completed
            .get(EditMetric::name_for(Category::Table))
            .and_then(|r| serde_json::to_value(r).ok())
            .unwrap_or(Value::Null);

        Ok(result.with_detail("table_edit_reference", reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segmenter;

    #[test]
    fn test_teds_metric_reads_reference() {
        let table = "| a | b |\n|---|---|\n| 1 | 2 |";
        let segmenter = Segmenter::default();
        let input = MetricInput::new(&segmenter, Some(table), None, Some(table), None);

        let mut completed = MetricResults::new();
        completed.insert(
            "table_edit".into(),
            MetricResult::new("table_edit", 1.0),
        );

        let result = TedsMetric::new().calculate(&input, &completed).unwrap();
        assert_eq!(result.name, "table_TEDS");
        assert_eq!(result.score, 1.0);
        assert_eq!(result.detail("table_edit_reference").unwrap()["score"], 1.0);
    }

    #[test]
    fn test_structure_only_name() {
        let metric = TedsMetric::structure_only();
        assert_eq!(metric.name(), "table_S-TEDS");
        assert_eq!(metric.depends_on(), ["table_edit"]);
    }
}
