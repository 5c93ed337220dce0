//! Fluent builders for collectors.
//!
//! Builders validate metric names, help texts, and label sets before any
//! collector is constructed, so misconfiguration fails at setup time rather
//! than at collection time.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::collector::{LabelledCollector, SimpleCollector};
use crate::counter::Counter;
use crate::error::{MetricsError, Result};
use crate::gauge::Gauge;
use crate::metric::{validate_label, validate_name};
use crate::registry::CollectorRegistry;

/// Builder for collectors constructible from a name and help text.
///
/// Calling [`labels`](Self::labels) switches to a [`LabelledBuilder`] that
/// builds the labelled variant of the same collector type.
#[derive(Debug, Clone)]
pub struct MetricBuilder<C> {
    name: Option<String>,
    help: Option<String>,
    _collector: PhantomData<fn() -> C>,
}

/// Builder for labelled collectors.
#[derive(Debug, Clone)]
pub struct LabelledBuilder<C> {
    name: Option<String>,
    help: Option<String>,
    labels: BTreeSet<String>,
    _collector: PhantomData<fn() -> C>,
}

/// Builder for counters and labelled counters.
pub type CounterBuilder = MetricBuilder<Counter>;

/// Builder for gauges and labelled gauges.
pub type GaugeBuilder = MetricBuilder<Gauge>;

impl<C> MetricBuilder<C> {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name: None,
            help: None,
            _collector: PhantomData,
        }
    }

    /// Sets the metric name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the metric help text.
    ///
    /// An empty string is a valid, explicitly-set help.
    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Declares label dimensions, switching to the labelled variant.
    #[must_use]
    pub fn labels<I, S>(self, labels: I) -> LabelledBuilder<C>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LabelledBuilder {
            name: self.name,
            help: self.help,
            labels: labels.into_iter().map(Into::into).collect(),
            _collector: PhantomData,
        }
    }
}

/// Validates the shared name/help requirements and hands back the parts.
fn validated_parts<'a>(name: Option<&'a str>, help: Option<&'a str>) -> Result<(&'a str, &'a str)> {
    let name = name.ok_or(MetricsError::NamelessCollector)?;
    validate_name(name)?;
    let help = help.ok_or(MetricsError::HelplessCollector)?;
    Ok((name, help))
}

impl<C: SimpleCollector + 'static> MetricBuilder<C> {
    /// Builds the collector.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::NamelessCollector` if no name was set,
    /// `MetricsError::InvalidMetricName` if the name fails validation, and
    /// `MetricsError::HelplessCollector` if no help was set.
    pub fn build(&self) -> Result<Arc<C>> {
        let (name, help) = validated_parts(self.name.as_deref(), self.help.as_deref())?;
        Ok(Arc::new(C::make(name, help)))
    }

    /// Builds the collector and registers it.
    ///
    /// Falls back to the process-wide default registry when `registry` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`build`](Self::build), plus
    /// `MetricsError::InvalidCollector` if registration is rejected.
    pub fn register(&self, registry: Option<&CollectorRegistry>) -> Result<Arc<C>> {
        let collector = self.build()?;
        let handle: Arc<dyn crate::collector::Collector> = collector.clone();
        match registry {
            Some(registry) => registry.register(handle)?,
            None => CollectorRegistry::global().register(handle)?,
        }
        Ok(collector)
    }
}

impl<C> LabelledBuilder<C> {
    /// Sets the metric name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the metric help text.
    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Replaces the declared label dimensions.
    #[must_use]
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

impl<C: SimpleCollector + 'static> LabelledBuilder<C> {
    /// Builds the labelled collector.
    ///
    /// # Errors
    ///
    /// Returns the name/help errors of [`MetricBuilder::build`], plus
    /// `MetricsError::MissingCollectorLabels` if the label set is empty and
    /// `MetricsError::InvalidMetricLabel` if any label fails validation.
    pub fn build(&self) -> Result<Arc<LabelledCollector<C>>> {
        let (name, help) = validated_parts(self.name.as_deref(), self.help.as_deref())?;
        if self.labels.is_empty() {
            return Err(MetricsError::MissingCollectorLabels);
        }
        for label in &self.labels {
            validate_label(label)?;
        }
        Ok(Arc::new(LabelledCollector::new(
            name,
            help,
            self.labels.clone(),
        )))
    }

    /// Builds the labelled collector and registers it.
    ///
    /// Falls back to the process-wide default registry when `registry` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`build`](Self::build), plus
    /// `MetricsError::InvalidCollector` if registration is rejected.
    pub fn register(
        &self,
        registry: Option<&CollectorRegistry>,
    ) -> Result<Arc<LabelledCollector<C>>> {
        let collector = self.build()?;
        let handle: Arc<dyn crate::collector::Collector> = collector.clone();
        match registry {
            Some(registry) => registry.register(handle)?,
            None => CollectorRegistry::global().register(handle)?,
        }
        Ok(collector)
    }
}

impl<C> Default for MetricBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}
