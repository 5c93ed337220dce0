//! Monotonically increasing counter.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::builder::MetricBuilder;
use crate::collector::{Collector, LabelledCollector, SimpleCollector};
use crate::error::{MetricsError, Result};
use crate::metric::{Descriptor, DescriptorRef, Metric, MetricType, Sample};

/// Simple ever-increasing counter.
///
/// The value can only grow: [`inc_by`](Self::inc_by) rejects negative deltas
/// with `MetricsError::CounterDecrease` and leaves the value unchanged.
/// Mutation and collection are atomic with respect to each other.
pub struct Counter {
    descriptor: DescriptorRef,
    value: Mutex<f64>,
}

impl Counter {
    /// Creates a counter starting at zero.
    #[must_use]
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::with_value(name, help, 0.0)
    }

    /// Creates a counter starting at the given value.
    #[must_use]
    pub fn with_value(name: impl Into<String>, help: impl Into<String>, initial: f64) -> Self {
        Self {
            descriptor: Arc::new(Descriptor::new(
                name,
                MetricType::Counter,
                help,
                BTreeSet::new(),
            )),
            value: Mutex::new(initial),
        }
    }

    /// Returns a builder for counters and labelled counters.
    #[must_use]
    pub fn builder() -> MetricBuilder<Self> {
        MetricBuilder::new()
    }

    /// Increments the counter by one.
    pub fn inc(&self) {
        *self.value.lock() += 1.0;
    }

    /// Increments the counter by the given non-negative amount.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::CounterDecrease` if `value` is negative; the
    /// counter is left unchanged in that case.
    pub fn inc_by(&self, value: f64) -> Result<()> {
        if value < 0.0 {
            return Err(MetricsError::CounterDecrease {
                name: self.descriptor.name().to_string(),
            });
        }
        *self.value.lock() += value;
        Ok(())
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> f64 {
        *self.value.lock()
    }
}

impl Collector for Counter {
    fn describe(&self) -> Vec<DescriptorRef> {
        vec![Arc::clone(&self.descriptor)]
    }

    fn collect(&self) -> Vec<Metric> {
        let value = *self.value.lock();
        let sample = Sample::new("", value, std::collections::BTreeMap::new());
        vec![Metric::new(Arc::clone(&self.descriptor), vec![sample])]
    }
}

impl SimpleCollector for Counter {
    fn make(name: &str, help: &str) -> Self {
        Self::new(name, help)
    }
}

/// Ever-increasing counter with label dimensions.
pub type LabelledCounter = LabelledCollector<Counter>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_one_counter_type() {
        let counter = Counter::new("name", "comment");
        let descriptors = counter.describe();
        assert_eq!(descriptors.len(), 1);

        let descriptor = &descriptors[0];
        assert_eq!(descriptor.name(), "name");
        assert_eq!(descriptor.metric_type(), MetricType::Counter);
        assert!(descriptor.labels().is_empty());
    }

    #[test]
    fn hash_changes_on_name_and_help() {
        let hashes: Vec<u64> = [
            Counter::new("name1", "comment1"),
            Counter::new("name1", "comment2"),
            Counter::new("name2", "comment1"),
            Counter::new("name2", "comment2"),
        ]
        .iter()
        .map(|counter| counter.describe()[0].hash())
        .collect();

        for (i, lhs) in hashes.iter().enumerate() {
            for rhs in &hashes[i + 1..] {
                assert_ne!(lhs, rhs);
            }
        }
    }

    #[test]
    fn collects_one_metric() {
        let counter = Counter::new("name", "comment");
        let metrics = counter.collect();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].samples().len(), 1);

        let descriptor = metrics[0].descriptor();
        assert_eq!(descriptor.name(), "name");
        assert_eq!(descriptor.help(), "comment");
        assert_eq!(descriptor.metric_type(), MetricType::Counter);

        let sample = &metrics[0].samples()[0];
        assert_eq!(sample.role(), "");
        assert!(sample.labels().is_empty());
        assert!((sample.value() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn starts_at_value() {
        let counter = Counter::with_value("name", "comment", 42.0);
        assert!((counter.value() - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_increment() {
        let counter = Counter::new("name", "comment");
        counter.inc();
        counter.inc();
        counter.inc();
        assert!((counter.value() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn increment_by_value() {
        let counter = Counter::new("name", "comment");
        counter.inc_by(21.0).unwrap();
        counter.inc_by(21.0).unwrap();
        assert!((counter.value() - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_increment_is_allowed() {
        let counter = Counter::new("name", "comment");
        counter.inc_by(0.0).unwrap();
        assert!((counter.value() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_increment_fails_and_leaves_value() {
        let counter = Counter::new("name", "comment");
        let result = counter.inc_by(-1.0);
        assert!(matches!(
            result,
            Err(MetricsError::CounterDecrease { name }) if name == "name"
        ));
        assert!((counter.value() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn concurrent_increments_never_lose_updates() {
        let counter = Arc::new(Counter::new("name", "comment"));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    counter.inc();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert!((counter.value() - 8000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn labelled_counter_tracks_values_per_combination() {
        let counters = LabelledCounter::new(
            "name",
            "comment",
            ["lb1".to_string()].into_iter().collect(),
        );
        counters.labels([("lb1", "val1")]).unwrap().inc_by(55.0).unwrap();

        let metrics = counters.collect();
        assert_eq!(metrics.len(), 1);
        let sample = &metrics[0].samples()[0];
        assert!((sample.value() - 55.0).abs() < f64::EPSILON);
        assert_eq!(sample.labels().get("lb1").map(String::as_str), Some("val1"));
    }
}
