//! Error types for the vitals-core crate.

use thiserror::Error;

/// Errors that can occur in the metrics system.
///
/// Every variant is a synchronous, non-retryable validation failure surfaced
/// to the caller of the operation that detected it. None of these represent
/// transient infrastructure faults.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The metric name does not match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
    #[error("metric name '{name}' is not a valid metric name")]
    InvalidMetricName {
        /// The rejected name.
        name: String,
    },

    /// The label name does not match `[a-zA-Z_][a-zA-Z0-9_]*` or uses the
    /// reserved `__` prefix.
    #[error("metric label '{label}' is not a valid label name")]
    InvalidMetricLabel {
        /// The rejected label name.
        label: String,
    },

    /// A builder was asked to build a collector without a name.
    #[error("cannot build a collector without a name")]
    NamelessCollector,

    /// A builder was asked to build a collector without a help text.
    ///
    /// An explicitly-set empty help string is valid; only an unset help fails.
    #[error("cannot build a collector without a help text")]
    HelplessCollector,

    /// A labelled builder was asked to build a collector with no labels.
    #[error("labelled collectors must declare at least one label")]
    MissingCollectorLabels,

    /// A labelled collector lookup did not supply a required label.
    #[error("a value for label '{label}' is required")]
    UndefinedLabel {
        /// The missing label name.
        label: String,
    },

    /// A labelled collector lookup supplied a label that was not declared.
    #[error("received a value for unknown label '{label}'")]
    UnexpectedLabel {
        /// The undeclared label name.
        label: String,
    },

    /// A counter was incremented by a negative amount.
    #[error("attempted to decrease counter '{name}'")]
    CounterDecrease {
        /// The counter's metric name.
        name: String,
    },

    /// A collector could not be registered.
    #[error("invalid collector: {reason}")]
    InvalidCollector {
        /// The reason the collector was rejected.
        reason: String,
    },

    /// A registry collection was requested with an unsupported strategy.
    #[error("attempted collection with an unsupported strategy")]
    InvalidCollectionStrategy,

    /// Writing exposition text to the output failed.
    #[error("failed to write exposition text")]
    ExpositionWrite(#[from] std::fmt::Error),
}

/// Result type for metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;
