//! Core value types for the metrics system.
//!
//! This module provides the immutable building blocks collectors produce:
//! - [`Descriptor`]: static metadata describing a metric's shape
//! - [`Sample`]: one observed value within a metric
//! - [`Metric`]: a descriptor plus the samples collected for it
//!
//! It also hosts the name and label validation rules shared by the builder
//! layer.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// Regex for valid metric names.
///
/// Matches the Prometheus data model rules at
/// <https://prometheus.io/docs/concepts/data_model/#metric-names-and-labels>.
static METRIC_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").unwrap_or_else(|_| unreachable!()));

/// Regex for valid label names.
static LABEL_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap_or_else(|_| unreachable!()));

/// Validates a metric name.
///
/// # Errors
///
/// Returns `MetricsError::InvalidMetricName` if the name is empty or
/// contains characters outside `[a-zA-Z0-9_:]` (or starts with a digit).
pub fn validate_name(name: &str) -> Result<()> {
    if METRIC_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(MetricsError::InvalidMetricName {
            name: name.to_string(),
        })
    }
}

/// Validates a metric label name.
///
/// Label names starting with `__` are reserved for internal use and rejected.
///
/// # Errors
///
/// Returns `MetricsError::InvalidMetricLabel` if the label fails validation.
pub fn validate_label(label: &str) -> Result<()> {
    if label.starts_with("__") || !LABEL_NAME_REGEX.is_match(label) {
        return Err(MetricsError::InvalidMetricLabel {
            label: label.to_string(),
        });
    }
    Ok(())
}

/// Combine hashes with an order-mixing fold.
///
/// Ported from the boost `hash_combine` recipe so that a sequence of
/// component hashes folds into a single value.
pub(crate) fn combine_hashes<I>(hashes: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let mut combined: u64 = 0;
    for hash in hashes {
        combined ^= hash
            .wrapping_add(0x9e37_79b9)
            .wrapping_add(combined << 6)
            .wrapping_add(combined >> 2);
    }
    combined
}

/// Hash a single string component with a deterministic hasher.
pub(crate) fn hash_str(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Hash a label-value map independent of the order values were supplied in.
///
/// The map's sorted iteration makes the result depend only on the
/// key/value contents, never on insertion order.
pub(crate) fn hash_labels(labels: &BTreeMap<String, String>) -> u64 {
    combine_hashes(
        labels
            .iter()
            .flat_map(|(key, value)| [hash_str(key), hash_str(value)]),
    )
}

/// The type of a metric, as exposed in the `# TYPE` exposition line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Monotonically increasing value.
    Counter,
    /// Value that can go up and down.
    Gauge,
    /// Quantile summary.
    Summary,
    /// Bucketed histogram.
    Histogram,
    /// No declared semantics.
    Untyped,
}

impl MetricType {
    /// Returns the lowercase exposition token for this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Summary => "summary",
            Self::Histogram => "histogram",
            Self::Untyped => "untyped",
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static metadata describing a metric exported by a collector.
///
/// Descriptors are immutable once constructed. The registry compares the
/// derived [`hash`](Descriptor::hash) to detect conflicting declarations of
/// the same metric name across independently created collectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    name: String,
    metric_type: MetricType,
    help: String,
    labels: BTreeSet<String>,
    hash: u64,
}

impl Descriptor {
    /// Creates a new descriptor and computes its consistency hash.
    ///
    /// The hash combines the name, the type token, the help text, and every
    /// label name in the set's sorted iteration order, so two descriptors
    /// with the same semantic content hash identically regardless of how
    /// their label sets were assembled.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        metric_type: MetricType,
        help: impl Into<String>,
        labels: BTreeSet<String>,
    ) -> Self {
        let name = name.into();
        let help = help.into();
        let hash = combine_hashes(
            [
                hash_str(&name),
                hash_str(metric_type.as_str()),
                hash_str(&help),
            ]
            .into_iter()
            .chain(labels.iter().map(|label| hash_str(label))),
        );
        Self {
            name,
            metric_type,
            help,
            labels,
            hash,
        }
    }

    /// Returns the metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the metric type.
    #[must_use]
    pub const fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    /// Returns the help text.
    #[must_use]
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Returns the declared label names.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Returns the consistency hash.
    ///
    /// Two descriptors are compatible iff their hashes match.
    #[must_use]
    pub const fn hash(&self) -> u64 {
        self.hash
    }
}

/// Shared handle to a descriptor, reused without rebuilding it.
pub type DescriptorRef = Arc<Descriptor>;

/// A single data point that is part of a metric.
///
/// Simple metrics such as counters emit one sample with an empty role;
/// compound metrics (histograms, summaries) emit several samples
/// distinguished by role suffixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    role: String,
    value: f64,
    labels: BTreeMap<String, String>,
}

/// Sort key implementing the sample total order: role first, then label
/// values in label-key order. Used to produce deterministic output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct SampleKey {
    role: String,
    labels: Vec<(String, String)>,
}

impl Sample {
    /// Creates a new sample.
    ///
    /// An empty `role` marks the metric's default value; non-empty roles are
    /// appended to the metric name with an underscore when rendered.
    #[must_use]
    pub fn new(role: impl Into<String>, value: f64, labels: BTreeMap<String, String>) -> Self {
        Self {
            role: role.into(),
            value,
            labels,
        }
    }

    /// Returns the sample role (`""` for the default value).
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns the observed value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Returns the label values attached to this sample.
    #[must_use]
    pub const fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Returns the key ordering this sample among its metric's samples.
    pub(crate) fn sort_key(&self) -> SampleKey {
        SampleKey {
            role: self.role.clone(),
            labels: self
                .labels
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

/// Immutable snapshot of a collected metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    descriptor: DescriptorRef,
    samples: Vec<Sample>,
}

impl Metric {
    /// Creates a new metric observation.
    #[must_use]
    pub const fn new(descriptor: DescriptorRef, samples: Vec<Sample>) -> Self {
        Self {
            descriptor,
            samples,
        }
    }

    /// Returns the shared descriptor for this metric.
    #[must_use]
    pub const fn descriptor(&self) -> &DescriptorRef {
        &self.descriptor
    }

    /// Returns the collected samples.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}
