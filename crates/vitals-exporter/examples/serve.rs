//! Minimal exporter: registers a gauge and a labelled counter against the
//! default registry and serves them on 127.0.0.1:9200.
//!
//! Run with `cargo run --example serve -p vitals-exporter`, then scrape
//! `http://127.0.0.1:9200/metrics`.

use vitals_core::{Counter, Gauge};
use vitals_exporter::{ExporterConfig, ExporterResult, MetricsExporter};

#[tokio::main]
async fn main() -> ExporterResult<()> {
    tracing_subscriber::fmt::init();

    let example_gauge = Gauge::builder()
        .name("example_gauge")
        .help("Constant gauge value")
        .register(None)?;

    let example_counter = Counter::builder()
        .name("example_counter")
        .help("An example counter that means nothing")
        .labels(["example"])
        .register(None)?;

    example_counter
        .labels([("example", "http")])?
        .inc_by(22.0)?;
    example_gauge.set(42.0);

    let exporter = MetricsExporter::with_global(ExporterConfig::default());
    println!("Server listening at {}", exporter.config().endpoint());
    exporter.serve().await
}
