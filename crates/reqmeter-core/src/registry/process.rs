//! Default process gauges.
//!
//! Sampled lazily: nothing runs in the background, each `collect_default()`
//! call reads the current values. On Linux CPU, memory, and fd counts come
//! from procfs; elsewhere only uptime and start time are reported, and the
//! start time falls back to when the collector was created.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use super::definition::MetricDefinition;

pub(crate) const UPTIME: &str = "process_uptime_seconds";
pub(crate) const START_TIME: &str = "process_start_time_seconds";
pub(crate) const CPU_USER: &str = "process_cpu_user_seconds";
pub(crate) const CPU_SYSTEM: &str = "process_cpu_system_seconds";
pub(crate) const CPU_TOTAL: &str = "process_cpu_seconds";
pub(crate) const RESIDENT_MEMORY: &str = "process_resident_memory_bytes";
pub(crate) const VIRTUAL_MEMORY: &str = "process_virtual_memory_bytes";
pub(crate) const OPEN_FDS: &str = "process_open_fds";

/// Gauge definitions for the default process metrics.
pub(crate) fn definitions() -> Vec<MetricDefinition> {
    vec![
        MetricDefinition::gauge(UPTIME, "Seconds since the registry was created."),
        MetricDefinition::gauge(
            START_TIME,
            "Start time of the process since unix epoch in seconds.",
        ),
        MetricDefinition::gauge(CPU_USER, "User CPU time spent in seconds."),
        MetricDefinition::gauge(CPU_SYSTEM, "System CPU time spent in seconds."),
        MetricDefinition::gauge(CPU_TOTAL, "Total user and system CPU time spent in seconds."),
        MetricDefinition::gauge(RESIDENT_MEMORY, "Resident memory size in bytes."),
        MetricDefinition::gauge(VIRTUAL_MEMORY, "Virtual memory size in bytes."),
        MetricDefinition::gauge(OPEN_FDS, "Number of open file descriptors."),
    ]
}

pub(crate) struct ProcessCollector {
    started: Instant,
    start_time_unix: f64,
}

impl ProcessCollector {
    pub(crate) fn new() -> Self {
        let start_time_unix = os_start_time().unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0)
        });
        Self {
            started: Instant::now(),
            start_time_unix,
        }
    }

    /// Current `(gauge name, value)` pairs. Unreadable sources are omitted.
    pub(crate) fn sample(&self) -> Vec<(&'static str, f64)> {
        let mut out = vec![
            (UPTIME, self.started.elapsed().as_secs_f64()),
            (START_TIME, self.start_time_unix),
        ];
        sample_os(&mut out);
        out
    }
}

// USER_HZ is fixed at 100 for the procfs ABI.
#[cfg(target_os = "linux")]
const CLOCK_TICKS: f64 = 100.0;

/// Fields of `/proc/self/stat` from field 3 on. comm (field 2) may contain
/// spaces, so split after its closing paren.
#[cfg(target_os = "linux")]
fn stat_fields(stat: &str) -> Vec<&str> {
    let rest = stat.rsplit_once(')').map(|(_, r)| r).unwrap_or("");
    rest.split_whitespace().collect()
}

/// Boot time (`btime` in `/proc/stat`) plus starttime (field 22).
#[cfg(target_os = "linux")]
fn os_start_time() -> Option<f64> {
    let proc_stat = std::fs::read_to_string("/proc/stat").ok()?;
    let btime = proc_stat
        .lines()
        .find_map(|l| l.strip_prefix("btime "))
        .and_then(|v| v.trim().parse::<f64>().ok())?;

    let stat = std::fs::read_to_string("/proc/self/stat").ok()?;
    let ticks = stat_fields(&stat).get(19)?.parse::<f64>().ok()?;
    Some(btime + ticks / CLOCK_TICKS)
}

#[cfg(not(target_os = "linux"))]
fn os_start_time() -> Option<f64> {
    None
}

#[cfg(target_os = "linux")]
fn sample_os(out: &mut Vec<(&'static str, f64)>) {
    const PAGE_SIZE: f64 = 4096.0;

    match std::fs::read_to_string("/proc/self/stat") {
        Ok(stat) => {
            let fields = stat_fields(&stat);
            // utime/stime are fields 14/15.
            let utime = fields.get(11).and_then(|s| s.parse::<f64>().ok());
            let stime = fields.get(12).and_then(|s| s.parse::<f64>().ok());
            if let (Some(u), Some(s)) = (utime, stime) {
                out.push((CPU_USER, u / CLOCK_TICKS));
                out.push((CPU_SYSTEM, s / CLOCK_TICKS));
                out.push((CPU_TOTAL, (u + s) / CLOCK_TICKS));
            }
        }
        Err(e) => tracing::debug!(error = %e, "read /proc/self/stat failed"),
    }

    match std::fs::read_to_string("/proc/self/statm") {
        Ok(statm) => {
            let mut parts = statm.split_whitespace();
            let vms = parts.next().and_then(|s| s.parse::<f64>().ok());
            let rss = parts.next().and_then(|s| s.parse::<f64>().ok());
            if let Some(vms) = vms {
                out.push((VIRTUAL_MEMORY, vms * PAGE_SIZE));
            }
            if let Some(rss) = rss {
                out.push((RESIDENT_MEMORY, rss * PAGE_SIZE));
            }
        }
        Err(e) => tracing::debug!(error = %e, "read /proc/self/statm failed"),
    }

    match std::fs::read_dir("/proc/self/fd") {
        Ok(dir) => out.push((OPEN_FDS, dir.count() as f64)),
        Err(e) => tracing::debug!(error = %e, "read /proc/self/fd failed"),
    }
}

#[cfg(not(target_os = "linux"))]
fn sample_os(_out: &mut Vec<(&'static str, f64)>) {}
