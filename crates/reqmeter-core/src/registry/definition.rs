use crate::error::{ReqMeterError, Result};

/// Default histogram buckets (seconds).
pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Metric instrument kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonically increasing value.
    Counter,
    /// Point-in-time value, may go up or down.
    Gauge,
    /// Cumulative bucketed distribution.
    Histogram,
}

impl MetricKind {
    /// Name used in `# TYPE` lines.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

/// Immutable description of a metric family.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    name: String,
    kind: MetricKind,
    help: String,
    label_names: Vec<String>,
    buckets: Vec<f64>,
}

impl MetricDefinition {
    fn new(name: impl Into<String>, kind: MetricKind, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            help: help.into(),
            label_names: Vec::new(),
            buckets: Vec::new(),
        }
    }

    pub fn counter(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, MetricKind::Counter, help)
    }

    pub fn gauge(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::new(name, MetricKind::Gauge, help)
    }

    /// Histogram with explicit upper bounds (`+Inf` is implicit).
    pub fn histogram(name: impl Into<String>, help: impl Into<String>, buckets: &[f64]) -> Self {
        let mut def = Self::new(name, MetricKind::Histogram, help);
        def.buckets = buckets.to_vec();
        def
    }

    /// Set the ordered label names.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_names = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    /// Reject names, labels, and buckets the exposition format can't carry.
    pub fn validate(&self) -> Result<()> {
        if !is_metric_name(&self.name) {
            return Err(ReqMeterError::InvalidDefinition(format!(
                "invalid metric name: {:?}",
                self.name
            )));
        }

        for (i, label) in self.label_names.iter().enumerate() {
            if !is_label_name(label) || label.starts_with("__") {
                return Err(ReqMeterError::InvalidDefinition(format!(
                    "{}: invalid label name: {:?}",
                    self.name, label
                )));
            }
            if self.label_names[..i].contains(label) {
                return Err(ReqMeterError::InvalidDefinition(format!(
                    "{}: duplicate label name: {label}",
                    self.name
                )));
            }
        }

        if self.kind == MetricKind::Histogram {
            if self.label_names.iter().any(|l| l == "le") {
                return Err(ReqMeterError::InvalidDefinition(format!(
                    "{}: histogram may not use label `le`",
                    self.name
                )));
            }
            if self.buckets.is_empty() {
                return Err(ReqMeterError::InvalidDefinition(format!(
                    "{}: histogram needs at least one bucket",
                    self.name
                )));
            }
            let sorted = self.buckets.windows(2).all(|w| w[0] < w[1]);
            if !sorted || self.buckets.iter().any(|b| !b.is_finite()) {
                return Err(ReqMeterError::InvalidDefinition(format!(
                    "{}: buckets must be finite and strictly increasing",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

fn is_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
