//! Prometheus text exposition format (0.0.4) rendering.

use std::fmt::Write;

use super::definition::MetricDefinition;
use super::instrument::SeriesSnapshot;

/// Content type advertised for the exposition body.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

pub(crate) fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{v}")
    }
}

/// `{k="v",...}` or the empty string when there are no pairs.
fn label_set(names: &[String], values: &[String], le: Option<&str>) -> String {
    let mut pairs: Vec<String> = names
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect();
    if let Some(le) = le {
        pairs.push(format!("le=\"{le}\""));
    }
    if pairs.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", pairs.join(","))
    }
}

/// Render one family. `series` must already be sorted by label tuple.
pub(crate) fn write_family(
    out: &mut String,
    def: &MetricDefinition,
    series: &[(Vec<String>, SeriesSnapshot)],
) {
    let name = def.name();
    let _ = writeln!(out, "# HELP {} {}", name, escape_help(def.help()));
    let _ = writeln!(out, "# TYPE {} {}", name, def.kind().as_str());

    for (values, snap) in series {
        match snap {
            SeriesSnapshot::Scalar(v) => {
                let labels = label_set(def.label_names(), values, None);
                let _ = writeln!(out, "{}{} {}", name, labels, format_value(*v));
            }
            SeriesSnapshot::Histogram { cumulative, sum, count } => {
                for (le, n) in def.buckets().iter().zip(cumulative) {
                    let le = format_value(*le);
                    let labels = label_set(def.label_names(), values, Some(le.as_str()));
                    let _ = writeln!(out, "{}_bucket{} {}", name, labels, n);
                }
                let inf = label_set(def.label_names(), values, Some("+Inf"));
                let _ = writeln!(out, "{}_bucket{} {}", name, inf, count);

                let labels = label_set(def.label_names(), values, None);
                let _ = writeln!(out, "{}_sum{} {}", name, labels, format_value(*sum));
                let _ = writeln!(out, "{}_count{} {}", name, labels, count);
            }
        }
    }
}
