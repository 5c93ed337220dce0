//! Gauge metric: a value that can go up and down.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::builder::MetricBuilder;
use crate::collector::{Collector, LabelledCollector, SimpleCollector};
use crate::metric::{Descriptor, DescriptorRef, Metric, MetricType, Sample};

/// Gauge representing a value that can be set, incremented, and decremented.
///
/// The value lives in a single atomic cell storing the `f64` bit pattern.
/// Deltas use a compare-and-retry loop so concurrent updates never lose
/// increments; [`set`](Self::set) is a plain store. There are no error
/// conditions.
pub struct Gauge {
    descriptor: DescriptorRef,
    value: AtomicU64,
}

impl Gauge {
    /// Creates a gauge starting at zero.
    #[must_use]
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::with_value(name, help, 0.0)
    }

    /// Creates a gauge starting at the given value.
    #[must_use]
    pub fn with_value(name: impl Into<String>, help: impl Into<String>, initial: f64) -> Self {
        Self {
            descriptor: Arc::new(Descriptor::new(
                name,
                MetricType::Gauge,
                help,
                BTreeSet::new(),
            )),
            value: AtomicU64::new(initial.to_bits()),
        }
    }

    /// Returns a builder for gauges and labelled gauges.
    #[must_use]
    pub fn builder() -> MetricBuilder<Self> {
        MetricBuilder::new()
    }

    /// Increments the gauge by one.
    pub fn inc(&self) {
        self.update(1.0);
    }

    /// Increments the gauge by the given amount.
    pub fn inc_by(&self, value: f64) {
        self.update(value);
    }

    /// Decrements the gauge by one.
    pub fn dec(&self) {
        self.update(-1.0);
    }

    /// Decrements the gauge by the given amount.
    pub fn dec_by(&self, value: f64) {
        self.update(-value);
    }

    /// Sets the gauge to an absolute value.
    pub fn set(&self, value: f64) {
        self.value.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Relaxed))
    }

    /// Read-modify-write loop applying a delta without losing concurrent
    /// updates.
    fn update(&self, delta: f64) {
        let mut current = self.value.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .value
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}

impl Collector for Gauge {
    fn describe(&self) -> Vec<DescriptorRef> {
        vec![Arc::clone(&self.descriptor)]
    }

    fn collect(&self) -> Vec<Metric> {
        let sample = Sample::new("", self.value(), std::collections::BTreeMap::new());
        vec![Metric::new(Arc::clone(&self.descriptor), vec![sample])]
    }
}

impl SimpleCollector for Gauge {
    fn make(name: &str, help: &str) -> Self {
        Self::new(name, help)
    }
}

/// Gauge with label dimensions.
pub type LabelledGauge = LabelledCollector<Gauge>;
