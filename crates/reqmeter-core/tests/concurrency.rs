//! Concurrent observers must not lose updates.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::thread;

use reqmeter_core::{MetricDefinition, Registry};

#[test]
fn concurrent_increments_on_one_tuple() {
    const THREADS: usize = 32;
    const PER_THREAD: usize = 1_000;

    let reg = Arc::new(Registry::new());
    reg.register(
        MetricDefinition::counter("http_requests_total", "Total number of HTTP requests")
            .with_labels(["method", "path", "status"]),
    )
    .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let reg = Arc::clone(&reg);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    reg.inc("http_requests_total", &["GET", "/", "200"]).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(
        reg.get("http_requests_total", &["GET", "/", "200"]),
        Some((THREADS * PER_THREAD) as f64)
    );
}

#[test]
fn concurrent_first_observation_creates_one_instance() {
    const THREADS: usize = 16;

    let reg = Arc::new(Registry::new());
    reg.register(MetricDefinition::counter("hits_total", "hits").with_labels(["k"]))
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let reg = Arc::clone(&reg);
            thread::spawn(move || {
                reg.inc("hits_total", &["same"]).unwrap();
                // serialize while others write
                let _ = reg.serialize();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let out = reg.serialize();
    let lines: Vec<_> = out.lines().filter(|l| l.starts_with("hits_total{")).collect();
    assert_eq!(lines, vec![format!("hits_total{{k=\"same\"}} {THREADS}")]);
}

#[test]
fn concurrent_collect_default() {
    let reg = Arc::new(Registry::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let reg = Arc::clone(&reg);
            thread::spawn(move || reg.collect_default().unwrap())
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert!(reg.contains("process_uptime_seconds"));
}
