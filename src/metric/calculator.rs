//! Metric registry and aggregation.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::model::{ExtractionResult, GroundTruthSample, TypedBlock};
use crate::segment::{Category, Segmenter};
use crate::teds::S_TEDS_NAME;

use super::{
    run_metric, EditMetric, EvalOptions, Metric, MetricInput, MetricResult, MetricResults,
    TedsMetric,
};

/// Key of the aggregate result.
pub const OVERALL: &str = "overall";

static DEFAULT_CALCULATOR: Lazy<MetricCalculator> = Lazy::new(MetricCalculator::with_defaults);

/// Runs a set of metrics over document pairs.
///
/// Metrics without unmet dependencies run first, in registration order;
/// dependents run once everything they read is done. The calculator holds
/// no per-call state and can be shared across threads.
pub struct MetricCalculator {
    metrics: Vec<Arc<dyn Metric>>,
    options: EvalOptions,
    segmenter: Segmenter,
}

impl MetricCalculator {
    /// Create a calculator with no metrics.
    pub fn new() -> Self {
        Self::empty(EvalOptions::default())
    }

    /// Create a calculator with the default metrics: the four category
    /// edit scores and `table_TEDS`.
    pub fn with_defaults() -> Self {
        let mut calculator = Self::new();
        for metric in default_metrics(&calculator.options) {
            calculator.register(metric);
        }
        calculator
    }

    /// Create a calculator from options.
    ///
    /// Fails with [`Error::UnknownMetric`] for names in `enabled_metrics`
    /// that no metric answers to, and with [`Error::MissingDependency`]
    /// when an enabled metric reads a disabled one.
    pub fn with_options(options: EvalOptions) -> Result<Self> {
        options.validate()?;

        let candidates = default_metrics(&options);
        if let Some(names) = &options.enabled_metrics {
            for name in names {
                if !candidates.iter().any(|m| m.name() == name) {
                    return Err(Error::UnknownMetric(name.clone()));
                }
            }
        }

        let mut calculator = Self::empty(options);
        for metric in candidates {
            if calculator.options.is_enabled(metric.name()) {
                calculator.register(metric);
            }
        }

        for metric in &calculator.metrics {
            for dependency in metric.depends_on() {
                if calculator.get_by_name(dependency).is_none() {
                    return Err(Error::MissingDependency {
                        metric: metric.name().to_string(),
                        dependency: dependency.to_string(),
                    });
                }
            }
        }

        Ok(calculator)
    }

    fn empty(options: EvalOptions) -> Self {
        let segmenter = Segmenter::new(options.segment.clone());
        Self {
            metrics: Vec::new(),
            options,
            segmenter,
        }
    }

    /// Register a metric, replacing any metric with the same name.
    pub fn register(&mut self, metric: Arc<dyn Metric>) {
        if let Some(slot) = self.metrics.iter_mut().find(|m| m.name() == metric.name()) {
            *slot = metric;
        } else {
            self.metrics.push(metric);
        }
    }

    /// Get a metric by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Metric>> {
        self.metrics.iter().find(|m| m.name() == name).cloned()
    }

    /// Names of the registered metrics, in registration order.
    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    /// Get the options.
    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Score one document pair.
    ///
    /// Always returns a result for every registered metric plus
    /// `overall`, the mean score of the metrics that succeeded.
    pub fn calculate_all(
        &self,
        predicted_content: Option<&str>,
        predicted_blocks: Option<&[TypedBlock]>,
        groundtruth_content: Option<&str>,
        groundtruth_blocks: Option<&[TypedBlock]>,
    ) -> MetricResults {
        let input = MetricInput::new(
            &self.segmenter,
            predicted_content,
            predicted_blocks,
            groundtruth_content,
            groundtruth_blocks,
        );

        let mut results = MetricResults::new();
        let mut pending: Vec<&Arc<dyn Metric>> = self.metrics.iter().collect();

        while !pending.is_empty() {
            let (ready, waiting): (Vec<_>, Vec<_>) = pending.into_iter().partition(|m| {
                m.depends_on().iter().all(|dep| {
                    results.contains_key(*dep) || self.get_by_name(dep).is_none()
                })
            });

            if ready.is_empty() {
                for metric in waiting {
                    let err = Error::metric(metric.name(), "dependency cycle");
                    log::warn!("{err}");
                    results.insert(
                        metric.name().to_string(),
                        MetricResult::failed(metric.name(), err.to_string()),
                    );
                }
                break;
            }

            for metric in ready {
                let result = run_metric(metric.name(), || metric.calculate(&input, &results));
                results.insert(metric.name().to_string(), result);
            }
            pending = waiting;
        }

        let overall = overall(&results);
        results.insert(OVERALL.to_string(), overall);
        results
    }

    /// Score an extraction against a ground-truth sample.
    ///
    /// Returns [`Error::ExtractionFailed`] when the extractor reported
    /// failure.
    pub fn evaluate(
        &self,
        extraction: &ExtractionResult,
        sample: &GroundTruthSample,
    ) -> Result<MetricResults> {
        if !extraction.success {
            let message = extraction
                .error
                .clone()
                .unwrap_or_else(|| "extractor reported failure".to_string());
            return Err(Error::ExtractionFailed(message));
        }

        Ok(self.calculate_all(
            Some(extraction.content.as_str()),
            Some(extraction.content_list.as_slice()),
            Some(sample.groundtruth_content.as_str()),
            Some(sample.groundtruth_content_list.as_slice()),
        ))
    }
}

impl Default for MetricCalculator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_metrics(options: &EvalOptions) -> Vec<Arc<dyn Metric>> {
    let mut metrics: Vec<Arc<dyn Metric>> = [
        Category::Code,
        Category::Formula,
        Category::Text,
        Category::Table,
    ]
    .into_iter()
    .map(|c| Arc::new(EditMetric::new(c).with_normalize(options.normalize)) as Arc<dyn Metric>)
    .collect();

    metrics.push(Arc::new(TedsMetric::new()));

    let structure_requested = options
        .enabled_metrics
        .as_ref()
        .is_some_and(|names| names.iter().any(|n| n == S_TEDS_NAME));
    if options.include_structure_teds || structure_requested {
        metrics.push(Arc::new(TedsMetric::structure_only()));
    }
    metrics
}

fn overall(results: &MetricResults) -> MetricResult {
    let scores: Vec<f64> = results
        .values()
        .filter(|r| r.success)
        .map(|r| r.score)
        .collect();
    let failed = results.len() - scores.len();

    if scores.is_empty() {
        return MetricResult::failed(OVERALL, "no metric succeeded")
            .with_detail("metrics_failed", failed);
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    MetricResult::new(OVERALL, mean)
        .with_detail("metrics_counted", scores.len())
        .with_detail("metrics_failed", failed)
}

/// Score one document pair with the default metrics.
///
/// Infallible: a failing metric is reported as a failed entry and left out
/// of `overall`.
pub fn calculate_all(
    predicted_content: Option<&str>,
    predicted_blocks: Option<&[TypedBlock]>,
    groundtruth_content: Option<&str>,
    groundtruth_blocks: Option<&[TypedBlock]>,
) -> MetricResults {
    DEFAULT_CALCULATOR.calculate_all(
        predicted_content,
        predicted_blocks,
        groundtruth_content,
        groundtruth_blocks,
    )
}
