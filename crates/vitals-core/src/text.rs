//! Prometheus text exposition format rendering.
//!
//! Stateless formatting of descriptors and samples into the line-based
//! text format (version 0.0.4), plus [`encode`] which renders a whole
//! registry into any [`std::fmt::Write`] sink.
//!
//! See <https://prometheus.io/docs/instrumenting/exposition_formats/#text-format-details>.

use std::fmt::Write;

use crate::error::Result;
use crate::metric::{Descriptor, Sample};
use crate::registry::{CollectStrategy, CollectorRegistry};

/// Content-Type header value for the text exposition format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Stateless renderer for the text exposition format.
pub struct TextFormatter;

impl TextFormatter {
    /// Formats the `# HELP` and `# TYPE` comment lines for a descriptor.
    ///
    /// The `# HELP` line is emitted only when the help text is non-empty.
    #[must_use]
    pub fn describe(descriptor: &Descriptor) -> String {
        let name = descriptor.name();
        let mut out = String::new();

        if !descriptor.help().is_empty() {
            let help = escape_help(descriptor.help());
            out.push_str("# HELP ");
            out.push_str(name);
            out.push(' ');
            out.push_str(&help);
            out.push('\n');
        }

        out.push_str("# TYPE ");
        out.push_str(name);
        out.push(' ');
        out.push_str(descriptor.metric_type().as_str());
        out.push('\n');
        out
    }

    /// Formats one sample line for the metric with the given name.
    ///
    /// The line is `<name>[_<role>][{k="v",...}] <value>\n` with label keys
    /// in sorted order and label values escaped.
    #[must_use]
    pub fn sample(name: &str, sample: &Sample) -> String {
        let mut line = String::from(name);

        if !sample.role().is_empty() {
            line.push('_');
            line.push_str(sample.role());
        }

        if !sample.labels().is_empty() {
            line.push('{');
            let mut first = true;
            for (key, value) in sample.labels() {
                if !first {
                    line.push(',');
                }
                first = false;
                line.push_str(key);
                line.push_str("=\"");
                line.push_str(&escape_label_value(value));
                line.push('"');
            }
            line.push('}');
        }

        line.push(' ');
        line.push_str(&format_value(sample.value()));
        line.push('\n');
        line
    }
}

/// Escapes a help text: backslash first, then newline.
fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Escapes a label value: backslash, newline, then double quote.
fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}

/// Renders a value with full round-trip precision.
///
/// Infinities and NaN become the literal `+Inf`/`-Inf`/`NaN` tokens; finite
/// values render in scientific notation with 16 fraction digits and a
/// signed two-digit exponent, so re-parsing recovers the original bits.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }

    let rendered = format!("{value:.16e}");
    // The standard formatter emits bare exponents ("e0", "e-5"); rewrite to
    // the signed, zero-padded form the exposition format uses ("e+00").
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => rendered,
    }
}

/// Collects the registry with the [`Sorted`](CollectStrategy::Sorted)
/// strategy and writes the full exposition text to `writer`.
///
/// # Errors
///
/// Returns `MetricsError::ExpositionWrite` if the sink rejects a write and
/// any error the underlying collection produces.
pub fn encode<W: Write>(writer: &mut W, registry: &CollectorRegistry) -> Result<()> {
    let metrics = registry.collect(CollectStrategy::Sorted)?;
    for metric in metrics {
        let descriptor = metric.descriptor();
        writer.write_str(&TextFormatter::describe(descriptor))?;
        for sample in metric.samples() {
            writer.write_str(&TextFormatter::sample(descriptor.name(), sample))?;
        }
    }
    Ok(())
}

/// Renders the full exposition text for a registry into a `String`.
///
/// # Errors
///
/// Returns any error the underlying collection produces.
pub fn encode_to_string(registry: &CollectorRegistry) -> Result<String> {
    let mut out = String::new();
    encode(&mut out, registry)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CounterBuilder;
    use crate::metric::MetricType;
    use std::collections::BTreeSet;

    fn descriptor(name: &str, help: &str, metric_type: MetricType) -> Descriptor {
        Descriptor::new(name, metric_type, help, BTreeSet::new())
    }

    fn sample(role: &str, value: f64, labels: &[(&str, &str)]) -> Sample {
        Sample::new(
            role,
            value,
            labels
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    mod describe_tests {
        use super::*;

        #[test]
        fn help_and_type() {
            let desc = descriptor("metric", "for testing", MetricType::Counter);
            assert_eq!(
                TextFormatter::describe(&desc),
                "# HELP metric for testing\n# TYPE metric counter\n"
            );
        }

        #[test]
        fn type_only_without_help() {
            let desc = descriptor("metric", "", MetricType::Counter);
            assert_eq!(TextFormatter::describe(&desc), "# TYPE metric counter\n");
        }

        #[test]
        fn help_escapes_newline() {
            let desc = descriptor("metric", "for\n testing", MetricType::Counter);
            assert_eq!(
                TextFormatter::describe(&desc),
                "# HELP metric for\\n testing\n# TYPE metric counter\n"
            );
        }

        #[test]
        fn help_escapes_backslash() {
            let desc = descriptor("metric", "for\\ testing", MetricType::Counter);
            assert_eq!(
                TextFormatter::describe(&desc),
                "# HELP metric for\\\\ testing\n# TYPE metric counter\n"
            );
        }

        #[test]
        fn gauge_type_token() {
            let desc = descriptor("metric", "", MetricType::Gauge);
            assert_eq!(TextFormatter::describe(&desc), "# TYPE metric gauge\n");
        }
    }

    mod sample_tests {
        use super::*;

        #[test]
        fn role_and_no_labels() {
            let line = TextFormatter::sample("metric_name", &sample("and_role", 5.0, &[]));
            assert_eq!(line, "metric_name_and_role 5.0000000000000000e+00\n");
        }

        #[test]
        fn no_role_no_labels() {
            let line = TextFormatter::sample("metric_name", &sample("", 5.0, &[]));
            assert_eq!(line, "metric_name 5.0000000000000000e+00\n");
        }

        #[test]
        fn labels_render_in_key_order() {
            let line = TextFormatter::sample(
                "metric_name",
                &sample("", 5.0, &[("lb2", "val2"), ("lb1", "val1")]),
            );
            assert_eq!(
                line,
                "metric_name{lb1=\"val1\",lb2=\"val2\"} 5.0000000000000000e+00\n"
            );
        }

        #[test]
        fn label_value_escapes_newline() {
            let line = TextFormatter::sample("metric_name", &sample("", 5.0, &[("l", "v\n1")]));
            assert_eq!(line, "metric_name{l=\"v\\n1\"} 5.0000000000000000e+00\n");
        }

        #[test]
        fn label_value_escapes_quote() {
            let line = TextFormatter::sample("metric_name", &sample("", 5.0, &[("l", "v\"1")]));
            assert_eq!(line, "metric_name{l=\"v\\\"1\"} 5.0000000000000000e+00\n");
        }

        #[test]
        fn label_value_escapes_backslash() {
            let line = TextFormatter::sample("metric_name", &sample("", 5.0, &[("l", "v\\1")]));
            assert_eq!(line, "metric_name{l=\"v\\\\1\"} 5.0000000000000000e+00\n");
        }
    }

    mod value_rendering_tests {
        use super::*;

        #[test]
        fn positive_infinity() {
            let line = TextFormatter::sample("metric_name", &sample("", f64::INFINITY, &[]));
            assert_eq!(line, "metric_name +Inf\n");
        }

        #[test]
        fn negative_infinity() {
            let line = TextFormatter::sample("metric_name", &sample("", f64::NEG_INFINITY, &[]));
            assert_eq!(line, "metric_name -Inf\n");
        }

        #[test]
        fn not_a_number() {
            let line = TextFormatter::sample("metric_name", &sample("", f64::NAN, &[]));
            assert_eq!(line, "metric_name NaN\n");
        }

        #[test]
        fn decimal_value() {
            let line =
                TextFormatter::sample("metric_name", &sample("", 185_592.735_366_983_26e+5, &[]));
            assert_eq!(line, "metric_name 1.8559273536698326e+10\n");
        }

        #[test]
        fn zero_value() {
            let line = TextFormatter::sample("metric_name", &sample("", 0.0, &[]));
            assert_eq!(line, "metric_name 0.0000000000000000e+00\n");
        }

        #[test]
        fn negative_value() {
            let line = TextFormatter::sample("metric_name", &sample("", -2.5, &[]));
            assert_eq!(line, "metric_name -2.5000000000000000e+00\n");
        }

        #[test]
        fn small_value_pads_exponent() {
            // 2^-20: exactly representable, so the rendering is stable.
            let line = TextFormatter::sample("metric_name", &sample("", 9.5367431640625e-7, &[]));
            assert_eq!(line, "metric_name 9.5367431640625000e-07\n");
        }

        #[test]
        fn value_roundtrips_through_text() {
            let value = 0.1_f64 + 0.2_f64;
            let line = TextFormatter::sample("m", &sample("", value, &[]));
            let rendered = line
                .trim_end()
                .rsplit(' ')
                .next()
                .and_then(|token| token.parse::<f64>().ok())
                .unwrap();
            assert_eq!(rendered.to_bits(), value.to_bits());
        }
    }

    mod encode_tests {
        use super::*;

        #[test]
        fn empty_registry_writes_nothing() {
            let registry = CollectorRegistry::new();
            assert_eq!(encode_to_string(&registry).unwrap(), "");
        }

        #[test]
        fn writes_counter_block() {
            let registry = CollectorRegistry::new();
            CounterBuilder::new()
                .name("test_metric")
                .help("used for tests")
                .register(Some(&registry))
                .unwrap();

            let expected = "# HELP test_metric used for tests\n\
                            # TYPE test_metric counter\n\
                            test_metric 0.0000000000000000e+00\n";
            assert_eq!(encode_to_string(&registry).unwrap(), expected);
        }

        #[test]
        fn blocks_appear_in_name_order() {
            let registry = CollectorRegistry::new();
            CounterBuilder::new()
                .name("zzz_total")
                .help("")
                .register(Some(&registry))
                .unwrap();
            CounterBuilder::new()
                .name("aaa_total")
                .help("")
                .register(Some(&registry))
                .unwrap();

            let text = encode_to_string(&registry).unwrap();
            let aaa = text.find("aaa_total").unwrap();
            let zzz = text.find("zzz_total").unwrap();
            assert!(aaa < zzz);
        }
    }
}
