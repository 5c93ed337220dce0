//! The collector capability and the labelled-collector decorator.
//!
//! A [`Collector`] knows how to report zero or more current metric values
//! and their descriptors. Concrete value holders ([`Counter`](crate::Counter),
//! [`Gauge`](crate::Gauge)) implement it directly; [`LabelledCollector`]
//! decorates any [`SimpleCollector`] with dynamic label dimensions, caching
//! one child per distinct label-value combination.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::metric::{hash_labels, Descriptor, DescriptorRef, Metric, Sample};

/// Abstract metric collector.
///
/// These two operations are the only entry points the registry requires;
/// any type implementing them can be registered.
pub trait Collector: Send + Sync {
    /// Returns zero or more metric descriptors.
    fn describe(&self) -> Vec<DescriptorRef>;

    /// Returns zero or more collected metrics.
    fn collect(&self) -> Vec<Metric>;
}

/// A collector constructible from a metric name and help text.
///
/// This is the capability [`LabelledCollector`] needs to make child
/// instances on demand, and the one the generic builders build against.
pub trait SimpleCollector: Collector {
    /// Creates a new instance exporting a metric with the given name and help.
    fn make(name: &str, help: &str) -> Self;
}

/// Per-instance state guarded by the collector's lock.
struct Children<C> {
    children: HashMap<u64, Arc<C>>,
    labels_by_hash: HashMap<u64, BTreeMap<String, String>>,
    descriptors: Option<Vec<DescriptorRef>>,
}

impl<C> Default for Children<C> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            labels_by_hash: HashMap::new(),
            descriptors: None,
        }
    }
}

/// Decorator adding label dimensions to any [`SimpleCollector`].
///
/// A labelled collector holds no value of its own: it is a container of
/// child collectors, one per distinct combination of label values seen so
/// far. Children are created lazily by [`labels`](Self::labels) and persist
/// until [`remove`](Self::remove) or [`clear`](Self::clear) evicts them.
///
/// Values must be read and written through the child handles returned by
/// `labels`; repeated lookups with the same values return the same child.
pub struct LabelledCollector<C> {
    name: String,
    help: String,
    label_names: BTreeSet<String>,
    inner: Mutex<Children<C>>,
}

impl<C: SimpleCollector> LabelledCollector<C> {
    /// Creates a labelled collector requiring exactly the given label names.
    ///
    /// The builder layer is responsible for rejecting an empty label set and
    /// invalid label names before constructing one of these.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        label_names: BTreeSet<String>,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            label_names,
            inner: Mutex::new(Children::default()),
        }
    }

    /// Returns the child collector for the given label values.
    ///
    /// The lookup is idempotent: the same label values always yield the same
    /// child instance, regardless of the order the values were supplied in.
    /// After the first lookup a combination costs one hash and one map probe,
    /// with no allocation.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::UndefinedLabel` if a required label is missing
    /// and `MetricsError::UnexpectedLabel` if an undeclared label is supplied.
    pub fn labels<K, V, I>(&self, values: I) -> Result<Arc<C>>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let values: BTreeMap<String, String> = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        let hash = hash_labels(&values);

        let mut inner = self.inner.lock();
        if let Some(child) = inner.children.get(&hash) {
            return Ok(Arc::clone(child));
        }

        // New combination: check all required labels are present and nothing
        // undeclared slipped in before creating a child.
        for label in &self.label_names {
            if !values.contains_key(label) {
                return Err(MetricsError::UndefinedLabel {
                    label: label.clone(),
                });
            }
        }
        for key in values.keys() {
            if !self.label_names.contains(key) {
                return Err(MetricsError::UnexpectedLabel { label: key.clone() });
            }
        }

        let child = Arc::new(C::make(&self.name, &self.help));
        inner.children.insert(hash, Arc::clone(&child));
        inner.labels_by_hash.insert(hash, values);
        debug!(metric = %self.name, children = inner.children.len(), "cached labelled child");
        Ok(child)
    }

    /// Evicts the child cached for the given label values.
    ///
    /// Removing a combination that was never cached is a silent no-op.
    pub fn remove<K, V, I>(&self, values: I)
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let values: BTreeMap<String, String> = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        let hash = hash_labels(&values);

        let mut inner = self.inner.lock();
        inner.labels_by_hash.remove(&hash);
        inner.children.remove(&hash);
    }

    /// Evicts all cached children.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.labels_by_hash.clear();
        inner.children.clear();
    }

    /// Returns the number of cached children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.inner.lock().children.len()
    }
}

impl<C: SimpleCollector> Collector for LabelledCollector<C> {
    fn describe(&self) -> Vec<DescriptorRef> {
        {
            let inner = self.inner.lock();
            if let Some(descriptors) = &inner.descriptors {
                return descriptors.clone();
            }
        }

        // Introspect a throwaway child outside the lock: a child that is
        // itself labelled would otherwise deadlock on its own describe call.
        // The probe never enters the children cache.
        let probe = C::make(&self.name, &self.help);
        let described: Vec<DescriptorRef> = probe
            .describe()
            .iter()
            .map(|descriptor| {
                let mut labels = descriptor.labels().clone();
                for label in &self.label_names {
                    labels.insert(label.clone());
                }
                Arc::new(Descriptor::new(
                    descriptor.name(),
                    descriptor.metric_type(),
                    descriptor.help(),
                    labels,
                ))
            })
            .collect();

        let mut inner = self.inner.lock();
        inner.descriptors.get_or_insert(described).clone()
    }

    fn collect(&self) -> Vec<Metric> {
        // Snapshot the children under the lock, then release it before
        // delegating so nested labelled collectors cannot deadlock.
        let snapshot: Vec<(Arc<C>, BTreeMap<String, String>)> = {
            let inner = self.inner.lock();
            inner
                .children
                .iter()
                .map(|(hash, child)| {
                    (
                        Arc::clone(child),
                        inner.labels_by_hash.get(hash).cloned().unwrap_or_default(),
                    )
                })
                .collect()
        };

        let mut metrics = Vec::new();
        for (child, child_labels) in snapshot {
            for metric in child.collect() {
                let samples = metric
                    .samples()
                    .iter()
                    .map(|sample| {
                        let mut labels = sample.labels().clone();
                        for (key, value) in &child_labels {
                            labels
                                .entry(key.clone())
                                .or_insert_with(|| value.clone());
                        }
                        Sample::new(sample.role(), sample.value(), labels)
                    })
                    .collect();
                metrics.push(Metric::new(Arc::clone(metric.descriptor()), samples));
            }
        }
        metrics
    }
}
