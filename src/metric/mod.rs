//! Scoring metrics and their aggregation.
//!
//! Every metric implements [`Metric`] and is run through [`run_metric`],
//! the single place where errors and panics turn into failed results.
//! [`MetricCalculator`] sequences metrics by their dependencies and adds
//! the `overall` mean.
//!
//! # Example
//!
//! ```
//! let results = docscore::calculate_all(Some("Hello `x`"), None, Some("Hello `x`"), None);
//! assert_eq!(results["code_edit"].score, 1.0);
//! assert_eq!(results["overall"].score, 1.0);
//! ```

mod calculator;
mod edit;
mod options;
mod teds;

pub use calculator::{calculate_all, MetricCalculator, OVERALL};
pub use edit::{edit_score, EditMetric};
pub use options::EvalOptions;
pub use teds::TedsMetric;

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::TypedBlock;
use crate::segment::{SegmentReport, Segmenter};

/// Results keyed by metric name.
pub type MetricResults = BTreeMap<String, MetricResult>;

/// Outcome of one metric for one document pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Metric name
    pub name: String,

    /// Score in `[0, 1]` (0 on failure)
    pub score: f64,

    /// Whether the metric ran to completion
    pub success: bool,

    /// Metric-specific details
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,

    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetricResult {
    /// Create a successful result; the score is clamped to `[0, 1]`.
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self {
            name: name.into(),
            score,
            success: true,
            details: BTreeMap::new(),
            error: None,
        }
    }

    /// Create a failed result.
    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0.0,
            success: false,
            details: BTreeMap::new(),
            error: Some(error.into()),
        }
    }

    /// Add a detail entry and return self.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Rename the result.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get a detail entry.
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

/// Inputs of one document pair, with segmentation computed on first use.
pub struct MetricInput<'a> {
    /// Predicted markdown
    pub predicted_content: Option<&'a str>,
    /// Predicted typed blocks
    pub predicted_blocks: Option<&'a [TypedBlock]>,
    /// Reference markdown
    pub groundtruth_content: Option<&'a str>,
    /// Reference typed blocks
    pub groundtruth_blocks: Option<&'a [TypedBlock]>,
    segmenter: &'a Segmenter,
    predicted: OnceCell<SegmentReport>,
    groundtruth: OnceCell<SegmentReport>,
}

impl<'a> MetricInput<'a> {
    /// Create an input for a document pair.
    pub fn new(
        segmenter: &'a Segmenter,
        predicted_content: Option<&'a str>,
        predicted_blocks: Option<&'a [TypedBlock]>,
        groundtruth_content: Option<&'a str>,
        groundtruth_blocks: Option<&'a [TypedBlock]>,
    ) -> Self {
        Self {
            predicted_content,
            predicted_blocks,
            groundtruth_content,
            groundtruth_blocks,
            segmenter,
            predicted: OnceCell::new(),
            groundtruth: OnceCell::new(),
        }
    }

    /// Segmentation of the predicted document.
    pub fn predicted(&self) -> &SegmentReport {
        self.predicted.get_or_init(|| {
            self.segmenter
                .report(self.predicted_content, self.predicted_blocks)
        })
    }

    /// Segmentation of the ground truth.
    pub fn groundtruth(&self) -> &SegmentReport {
        self.groundtruth.get_or_init(|| {
            self.segmenter
                .report(self.groundtruth_content, self.groundtruth_blocks)
        })
    }
}

/// A named score over one document pair.
pub trait Metric: Send + Sync {
    /// Name used as the key in [`MetricResults`].
    fn name(&self) -> &str;

    /// Names of metrics whose results this metric reads.
    fn depends_on(&self) -> &[&str] {
        &[]
    }

    /// Score the pair. `completed` holds the results of earlier metrics.
    fn calculate(&self, input: &MetricInput<'_>, completed: &MetricResults) -> Result<MetricResult>;
}

/// Run a scoring closure, turning errors and panics into a failed result.
pub fn run_metric<F>(name: &str, f: F) -> MetricResult
where
    F: FnOnce() -> Result<MetricResult>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            log::warn!("metric {name} failed: {err}");
            MetricResult::failed(name, err.to_string())
        }
        Err(payload) => {
            let err = Error::Panic(panic_message(payload.as_ref()));
            log::warn!("metric {name} panicked: {err}");
            MetricResult::failed(name, err.to_string())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
