//! Normalized edit-distance scoring per content category.

use crate::error::Result;
use crate::segment::Category;

use super::{Metric, MetricInput, MetricResult, MetricResults};

/// Name of a bare [`edit_score`] result.
const EDIT_SCORE_NAME: &str = "edit_distance";

/// Levenshtein similarity of two strings, counted in characters.
///
/// Normalized: `1 - distance / max(len(a), len(b))`. Unnormalized:
/// `1 / (1 + distance)`. Two empty strings score 1.0 either way.
pub fn edit_score(a: &str, b: &str, normalize: bool) -> MetricResult {
    let distance = strsim::levenshtein(a, b);
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let max_len = a_len.max(b_len);

    let score = if max_len == 0 {
        1.0
    } else if normalize {
        1.0 - distance as f64 / max_len as f64
    } else {
        1.0 / (1.0 + distance as f64)
    };

    MetricResult::new(EDIT_SCORE_NAME, score)
        .with_detail("distance", distance)
        .with_detail("predicted_length", a_len)
        .with_detail("groundtruth_length", b_len)
        .with_detail("normalized", normalize)
}

/// Edit score of one segmented category.
#[derive(Debug, Clone, Copy)]
pub struct EditMetric {
    category: Category,
    normalize: bool,
}

impl EditMetric {
    /// Create a metric for the given category.
    pub fn new(category: Category) -> Self {
        Self {
            category,
            normalize: true,
        }
    }

    /// Enable or disable normalization.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Metric name for a category (`code_edit`, `formula_edit`, ...).
    pub fn name_for(category: Category) -> &'static str {
        match category {
            Category::Code => "code_edit",
            Category::Formula => "formula_edit",
            Category::Table => "table_edit",
            Category::Text => "text_edit",
        }
    }

    /// Category scored by this metric.
    pub fn category(&self) -> Category {
        self.category
    }
}

impl Metric for EditMetric {
    fn name(&self) -> &str {
        Self::name_for(self.category)
    }

    fn calculate(&self, input: &MetricInput<'_>, _completed: &MetricResults) -> Result<MetricResult> {
        let predicted = input.predicted();
        let groundtruth = input.groundtruth();

        let result = edit_score(
            predicted.result.get(self.category),
            groundtruth.result.get(self.category),
            self.normalize,
        );

        Ok(result
            .with_name(self.name())
            .with_detail("predicted_source", predicted.source.as_str())
            .with_detail("groundtruth_source", groundtruth.source.as_str()))
    }
}
