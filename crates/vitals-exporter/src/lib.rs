//! HTTP exposition endpoint for `vitals-core` metrics.
//!
//! This crate is the thin transport around the metrics core: it binds a
//! listener, and on each request to `/metrics` collects the registry,
//! renders the text exposition format, and writes it back with the
//! `text/plain; version=0.0.4` content type. Everything stateful lives in
//! the registry; a scrape failure is fatal only for that request.
//!
//! # Example
//!
//! ```rust,no_run
//! use vitals_exporter::{ExporterConfig, MetricsExporter};
//! use vitals_core::Counter;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! Counter::builder()
//!     .name("requests_total")
//!     .help("Total requests served")
//!     .register(None)?;
//!
//! let exporter = MetricsExporter::with_global(ExporterConfig::default());
//! exporter.serve().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod server;

pub use config::ExporterConfig;
pub use error::{ExporterError, ExporterResult};
pub use server::MetricsExporter;
