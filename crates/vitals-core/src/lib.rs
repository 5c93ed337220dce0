//! In-process metrics instrumentation with Prometheus text exposition.
//!
//! `vitals-core` lets applications create counters and gauges, optionally
//! parameterized by label sets, and expose their current values in the
//! text exposition format (version 0.0.4) for scraping:
//!
//! - **Value types**: [`Descriptor`], [`Sample`], [`Metric`], the immutable
//!   snapshots produced by collectors
//! - **Collectors**: [`Counter`], [`Gauge`], and the [`LabelledCollector`]
//!   decorator caching one child per label-value combination
//! - **Registry**: [`CollectorRegistry`] aggregates independently created
//!   collectors under global name consistency and merges their output
//!   deterministically
//! - **Exposition**: [`TextFormatter`] and [`text::encode`] render the
//!   collected metrics into scrape-ready text
//!
//! The library holds only the current value of each metric in memory; it is
//! not a time-series store. Serving the text over HTTP is the job of a thin
//! transport such as the `vitals-exporter` crate.
//!
//! # Example
//!
//! ```rust
//! use vitals_core::{CollectorRegistry, Counter, text};
//!
//! let registry = CollectorRegistry::new();
//! let requests = Counter::builder()
//!     .name("requests_total")
//!     .help("Total requests served")
//!     .register(Some(&registry))
//!     .unwrap();
//! requests.inc();
//!
//! let exposition = text::encode_to_string(&registry).unwrap();
//! assert!(exposition.contains("# TYPE requests_total counter"));
//! ```
//!
//! Labelled metrics hand out one child per label combination:
//!
//! ```rust
//! use vitals_core::{CollectorRegistry, Counter};
//!
//! let registry = CollectorRegistry::new();
//! let requests = Counter::builder()
//!     .name("http_requests_total")
//!     .help("Requests by method")
//!     .labels(["method"])
//!     .register(Some(&registry))
//!     .unwrap();
//!
//! requests.labels([("method", "GET")]).unwrap().inc();
//! requests.labels([("method", "GET")]).unwrap().inc();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod builder;
pub mod collector;
pub mod counter;
pub mod error;
pub mod gauge;
pub mod metric;
pub mod registry;
pub mod text;

// Re-export main types at crate root
pub use builder::{CounterBuilder, GaugeBuilder, LabelledBuilder, MetricBuilder};
pub use collector::{Collector, LabelledCollector, SimpleCollector};
pub use counter::{Counter, LabelledCounter};
pub use error::{MetricsError, Result};
pub use gauge::{Gauge, LabelledGauge};
pub use metric::{
    validate_label, validate_name, Descriptor, DescriptorRef, Metric, MetricType, Sample,
};
pub use registry::{CollectStrategy, CollectorRegistry};
pub use text::{TextFormatter, TEXT_CONTENT_TYPE};
