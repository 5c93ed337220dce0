//! Registry of collectors to pull metrics from.
//!
//! The registry is the aggregation point enforcing global name consistency:
//! the union of all registered collectors' descriptors never contains two
//! incompatible declarations of the same metric name.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::debug;

use crate::collector::Collector;
use crate::error::{MetricsError, Result};
use crate::metric::{DescriptorRef, Metric, Sample, SampleKey};

/// Strategy used to collect metrics from a registry.
///
/// Only [`Sorted`](Self::Sorted) exists today; the enum is open for
/// extension with other merge/ordering behaviors.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectStrategy {
    /// Deterministic output: metrics ordered by name, samples ordered by
    /// role and label values, duplicates across collectors merged.
    Sorted,
}

/// State guarded by the registry lock.
#[derive(Default)]
struct RegistryInner {
    /// Registered collectors, in registration order.
    collectors: Vec<Arc<dyn Collector>>,
    /// Last accepted descriptor hash for every metric name ever registered.
    metrics_hash: HashMap<String, u64>,
}

/// Per-name accumulator for the sorted collection merge.
struct MetricRecord {
    descriptor: DescriptorRef,
    samples: BTreeMap<SampleKey, Sample>,
}

/// Thread-safe set of registered collectors.
///
/// Multiple registries, or a registry and application code, may hold the
/// same collector concurrently; the registry only keeps shared references.
pub struct CollectorRegistry {
    inner: Mutex<RegistryInner>,
}

/// Process-wide default registry, lazily created on first access.
static GLOBAL_REGISTRY: Lazy<Arc<CollectorRegistry>> =
    Lazy::new(|| Arc::new(CollectorRegistry::new()));

impl CollectorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// Returns the process-wide default registry.
    ///
    /// Builders fall back to this registry when no explicit one is supplied.
    /// It lives for the process lifetime; there is no teardown.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Adds a collector to the registry.
    ///
    /// The collector's descriptors are checked against every name already
    /// registered; the registration either commits all of them or none.
    /// Registering another collector that declares identical descriptors for
    /// an existing name is allowed, so independently created collectors can
    /// legitimately share a metric name and be merged at collection time.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidCollector` if the collector describes no
    /// metrics, or if any descriptor conflicts with a previous declaration of
    /// the same name.
    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<()> {
        // Describe before taking the lock: collector code never runs while
        // the registry is locked.
        let descriptors = collector.describe();
        if descriptors.is_empty() {
            return Err(MetricsError::InvalidCollector {
                reason: "collector does not export any metric".to_string(),
            });
        }

        let mut inner = self.inner.lock();

        // Stage the name->hash updates so a conflict rejects the whole
        // registration without partial commits.
        let mut staged = inner.metrics_hash.clone();
        for descriptor in &descriptors {
            let name = descriptor.name();
            match staged.get(name) {
                Some(&known) if known != descriptor.hash() => {
                    return Err(MetricsError::InvalidCollector {
                        reason: format!(
                            "metric '{name}' already declared with a conflicting descriptor"
                        ),
                    });
                }
                _ => {
                    staged.insert(name.to_string(), descriptor.hash());
                }
            }
        }

        inner.metrics_hash = staged;
        inner.collectors.push(collector);
        debug!(
            collectors = inner.collectors.len(),
            metrics = descriptors.len(),
            "registered collector"
        );
        Ok(())
    }

    /// Removes a collector, comparing by identity rather than value.
    ///
    /// Returns whether anything was removed. The name->hash bookkeeping is
    /// intentionally kept, so re-registering the same metric name later is
    /// still checked against the original descriptor.
    pub fn unregister(&self, collector: &Arc<dyn Collector>) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.collectors.len();
        inner
            .collectors
            .retain(|existing| !Arc::ptr_eq(existing, collector));
        let removed = before != inner.collectors.len();
        if removed {
            debug!(collectors = inner.collectors.len(), "unregistered collector");
        }
        removed
    }

    /// Returns the number of registered collectors.
    #[must_use]
    pub fn collector_count(&self) -> usize {
        self.inner.lock().collectors.len()
    }

    /// Collects metrics from every registered collector.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidCollectionStrategy` for strategies this
    /// registry does not support.
    pub fn collect(&self, strategy: CollectStrategy) -> Result<Vec<Metric>> {
        match strategy {
            CollectStrategy::Sorted => Ok(self.sorted_collect()),
            #[allow(unreachable_patterns)]
            _ => Err(MetricsError::InvalidCollectionStrategy),
        }
    }

    /// Collects all metrics, merging same-named metrics and sorting
    /// deterministically.
    fn sorted_collect(&self) -> Vec<Metric> {
        // Snapshot the collector list, then release the lock: collection may
        // be slow and must not serialize registration. A scrape may observe
        // a collector set that was valid at snapshot time only.
        let collectors: Vec<Arc<dyn Collector>> = self.inner.lock().collectors.clone();

        let mut by_name: BTreeMap<String, MetricRecord> = BTreeMap::new();
        for collector in collectors {
            for metric in collector.collect() {
                let name = metric.descriptor().name().to_string();
                let record = by_name.entry(name).or_insert_with(|| MetricRecord {
                    descriptor: Arc::clone(metric.descriptor()),
                    samples: BTreeMap::new(),
                });

                // First sample wins for equal role+labels, de-duplicating
                // exact repeats across collectors sharing a name.
                for sample in metric.samples() {
                    record
                        .samples
                        .entry(sample.sort_key())
                        .or_insert_with(|| sample.clone());
                }
            }
        }

        by_name
            .into_values()
            .map(|record| Metric::new(record.descriptor, record.samples.into_values().collect()))
            .collect()
    }
}

impl Default for CollectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("collectors", &self.collector_count())
            .finish_non_exhaustive()
    }
}
