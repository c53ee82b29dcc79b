//! Evaluation configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::segment::SegmentOptions;

/// Options for a [`MetricCalculator`](super::MetricCalculator).
///
/// Loadable from JSON; missing fields take their defaults.
///
/// ```
/// use docscore::EvalOptions;
///
/// let options = EvalOptions::from_json_str(r#"{"include_structure_teds": true}"#).unwrap();
/// assert!(options.normalize);
/// assert!(options.include_structure_teds);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Normalize edit distances by the longer string
    pub normalize: bool,

    /// Segmentation options
    pub segment: SegmentOptions,

    /// Also compute structure-only TEDS (`table_S-TEDS`)
    pub include_structure_teds: bool,

    /// Metrics to run (None = all registered)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_metrics: Option<Vec<String>>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            segment: SegmentOptions::default(),
            include_structure_teds: false,
            enabled_metrics: None,
        }
    }
}

impl EvalOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable edit-distance normalization.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set segmentation options.
    pub fn with_segment_options(mut self, segment: SegmentOptions) -> Self {
        self.segment = segment;
        self
    }

    /// Enable or disable the structure-only TEDS metric.
    pub fn with_structure_teds(mut self, enabled: bool) -> Self {
        self.include_structure_teds = enabled;
        self
    }

    /// Restrict evaluation to the named metrics.
    pub fn with_enabled_metrics<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.enabled_metrics = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Parse options from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if let Some(names) = &self.enabled_metrics {
            if names.iter().any(|n| n.trim().is_empty()) {
                return Err(Error::Config("empty metric name in enabled_metrics".into()));
            }
        }
        Ok(())
    }

    /// Check whether a metric is enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled_metrics
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| n == name))
    }
}
