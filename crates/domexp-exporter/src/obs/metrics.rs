//! Minimal metrics registry for the exporter.
//!
//! No external metrics crate is used; this module provides counter/gauge/histogram
//! types with dynamic labels backed by `DashMap`. Labels are flattened into
//! sorted key vectors and series are rendered in sorted order, so the scrape
//! output is deterministic. Histogram buckets are fixed in milliseconds.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use domexp_core::Snapshot;

pub const RESULT_METRIC: &str = "domain_expiration_checker_result";
const RESULT_HELP: &str = "domain expiration check results (per domain).";

type LabelKey = Vec<(String, String)>;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn series(name: &str, labels: &str, value: impl std::fmt::Display) -> String {
    if labels.is_empty() {
        format!("{name} {value}")
    } else {
        format!("{name}{{{labels}}} {value}")
    }
}

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

fn write_sorted(out: &mut String, mut lines: Vec<String>) {
    lines.sort();
    for l in lines {
        let _ = writeln!(out, "{}", l);
    }
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "counter");
        let lines = self
            .map
            .iter()
            .map(|r| series(name, &label_str(r.key()), r.value().load(Ordering::Relaxed)))
            .collect();
        write_sorted(out, lines);
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    /// Set to an absolute value.
    pub fn set(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0));
        gauge.store(v, Ordering::Relaxed);
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "gauge");
        let lines = self
            .map
            .iter()
            .map(|r| series(name, &label_str(r.key()), r.value().load(Ordering::Relaxed)))
            .collect();
        write_sorted(out, lines);
    }
}

// Fixed buckets in milliseconds: 50ms .. 30s
const BUCKETS_MILLIS: [u64; 8] = [50, 100, 250, 500, 1_000, 2_500, 10_000, 30_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 8],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (millisecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(millis, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MILLIS.iter().enumerate() {
            if millis <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format (unit: milliseconds).
    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "histogram");
        let mut entries: Vec<_> = self.map.iter().collect();
        entries.sort_by(|a, b| a.key().cmp(b.key()));

        for r in entries {
            let labels = label_str(r.key());
            let hist = r.value();
            let prefix = if labels.is_empty() { String::new() } else { format!("{},", labels) };

            for (i, &le) in BUCKETS_MILLIS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);
            let _ = writeln!(out, "{}", series(&format!("{name}_sum"), &labels, hist.sum.load(Ordering::Relaxed)));
            let _ = writeln!(out, "{}", series(&format!("{name}_count"), &labels, count));
        }
    }
}

/// Operational metrics recorded by the checker.
#[derive(Default)]
pub struct CheckerMetrics {
    pub cycles: CounterVec,
    pub listing_errors: CounterVec,
    pub lookup_failures: CounterVec,
    pub lookup_duration: HistogramVec, // In Milliseconds
}

impl CheckerMetrics {
    pub fn render(&self, out: &mut String) {
        self.cycles.render(
            "domain_expiration_checker_cycles_total",
            "check cycles started.",
            out,
        );
        self.listing_errors.render(
            "domain_expiration_checker_listing_errors_total",
            "failed domain listings (per account).",
            out,
        );
        self.lookup_failures.render(
            "domain_expiration_checker_lookup_failures_total",
            "failed expiration lookup attempts (per account).",
            out,
        );
        self.lookup_duration.render(
            "domain_expiration_checker_lookup_duration_millis",
            "expiration lookup attempt duration.",
            out,
        );
    }
}

/// Translate a snapshot into one gauge sample per domain.
pub fn render_results(snapshot: &Snapshot, out: &mut String) {
    let gauges = GaugeVec::default();
    for (domain, result) in snapshot {
        gauges.set(
            &[("domain", domain.as_str()), ("status", result.status.as_str())],
            result.expires_in_days,
        );
    }
    gauges.render(RESULT_METRIC, RESULT_HELP, out);
}

/// Full scrape body: per-domain results followed by operational metrics.
pub fn render(snapshot: &Snapshot, checker: &CheckerMetrics) -> String {
    let mut out = String::new();
    render_results(snapshot, &mut out);
    checker.render(&mut out);
    out
}
