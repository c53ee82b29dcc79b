//! Error types for docscore library.

use std::io;
use thiserror::Error;

/// Result type alias for docscore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while segmenting or scoring documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading configuration files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid evaluation configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A metric name is not known to the calculator.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// A metric requires another metric that is not registered.
    #[error("Metric {metric} depends on unregistered metric {dependency}")]
    MissingDependency {
        /// Dependent metric name
        metric: String,
        /// Name of the missing dependency
        dependency: String,
    },

    /// The extractor reported failure; there is nothing to score.
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// A metric failed while scoring.
    #[error("Metric {name} failed: {message}")]
    Metric {
        /// Metric name
        name: String,
        /// Failure description
        message: String,
    },

    /// A metric panicked while scoring.
    #[error("Metric panicked: {0}")]
    Panic(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a metric failure for the given metric name.
    pub fn metric(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Metric {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownMetric("bleu".into());
        assert_eq!(err.to_string(), "Unknown metric: bleu");

        let err = Error::metric("table_TEDS", "no tree");
        assert_eq!(err.to_string(), "Metric table_TEDS failed: no tree");

        let err = Error::MissingDependency {
            metric: "table_TEDS".into(),
            dependency: "table_edit".into(),
        };
        assert_eq!(
            err.to_string(),
            "Metric table_TEDS depends on unregistered metric table_edit"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
