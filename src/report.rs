//! Counters shared by all virtual users and the summary printed at the end.

use std::{
    collections::BTreeMap,
    fmt,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, atomic::{AtomicU64, Ordering}},
    time::{Duration, Instant},
};

use http::StatusCode;
use serde::Serialize;

use crate::{prelude::*, target::Endpoint, workload::Checks};


#[derive(Debug, confique::Config)]
pub struct ReportConfig {
    /// If set, the end-of-run summary is also written to this file as JSON.
    pub summary_export: Option<PathBuf>,

    /// If `true`, seatrush exits with a non-zero code if at least one
    /// "System Integrity" check failed, i.e. a booking attempt was answered
    /// with something other than 201 or 409. Useful in CI.
    #[config(default = false)]
    pub fail_on_integrity_violation: bool,
}


#[derive(Debug, Default)]
struct CheckCounter {
    passed: AtomicU64,
    failed: AtomicU64,
}

impl CheckCounter {
    fn record(&self, ok: bool) {
        let counter = if ok { &self.passed } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn summary(&self, name: &'static str) -> CheckSummary {
        CheckSummary {
            name,
            passed: self.passed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Everything that is counted during a run.
#[derive(Debug)]
pub struct Stats {
    started_at: Instant,
    iterations_started: AtomicU64,
    iterations_completed: AtomicU64,
    bookings_skipped: AtomicU64,
    peak_vus: AtomicU64,
    integrity: CheckCounter,
    booked: CheckCounter,

    /// Number of responses per endpoint and status. `None` is a transport
    /// error.
    responses: Mutex<BTreeMap<(Endpoint, Option<u16>), u64>>,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            iterations_started: AtomicU64::new(0),
            iterations_completed: AtomicU64::new(0),
            bookings_skipped: AtomicU64::new(0),
            peak_vus: AtomicU64::new(0),
            integrity: CheckCounter::default(),
            booked: CheckCounter::default(),
            responses: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn iteration_started(&self) {
        self.iterations_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn iteration_completed(&self) {
        self.iterations_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn booking_skipped(&self) {
        self.bookings_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn response(&self, endpoint: Endpoint, status: Option<StatusCode>) {
        let key = (endpoint, status.map(|s| s.as_u16()));
        *self.responses.lock().unwrap_or_else(|e| e.into_inner()).entry(key).or_default() += 1;
    }

    pub fn checks(&self, checks: Checks) {
        self.integrity.record(checks.system_integrity);
        self.booked.record(checks.booked);
    }

    /// Reports a number of VUs that were running at the same time.
    pub fn peak_vus(&self, running: u64) {
        self.peak_vus.fetch_max(running, Ordering::Relaxed);
    }

    pub fn summary(&self) -> Summary {
        let responses = self.responses.lock().unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(&(endpoint, status), &count)| ResponseCount { endpoint, status, count })
            .collect();

        Summary {
            duration: self.started_at.elapsed(),
            peak_vus: self.peak_vus.load(Ordering::Relaxed),
            iterations_started: self.iterations_started.load(Ordering::Relaxed),
            iterations_completed: self.iterations_completed.load(Ordering::Relaxed),
            bookings_skipped: self.bookings_skipped.load(Ordering::Relaxed),
            checks: vec![
                self.integrity.summary(Checks::SYSTEM_INTEGRITY),
                self.booked.summary(Checks::BOOKED),
            ],
            responses,
        }
    }
}

/// Snapshot of `Stats`.
#[derive(Debug, Serialize)]
pub struct Summary {
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub peak_vus: u64,
    pub iterations_started: u64,
    pub iterations_completed: u64,
    pub bookings_skipped: u64,
    pub checks: Vec<CheckSummary>,
    pub responses: Vec<ResponseCount>,
}

#[derive(Debug, Serialize)]
pub struct CheckSummary {
    pub name: &'static str,
    pub passed: u64,
    pub failed: u64,
}

#[derive(Debug, Serialize)]
pub struct ResponseCount {
    pub endpoint: Endpoint,
    /// `None` if no response was received.
    pub status: Option<u16>,
    pub count: u64,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl CheckSummary {
    /// Pass rate in percent. A check that never ran counts as 100%.
    pub fn rate(&self) -> f64 {
        let total = self.passed + self.failed;
        if total == 0 {
            100.0
        } else {
            self.passed as f64 * 100.0 / total as f64
        }
    }
}

impl Summary {
    /// Number of booking attempts that got neither 201 nor 409.
    pub fn integrity_violations(&self) -> u64 {
        self.checks.iter()
            .find(|c| c.name == Checks::SYSTEM_INTEGRITY)
            .map_or(0, |c| c.failed)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize summary")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write summary to '{}'", path.display()))?;
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "checks")?;
        for check in &self.checks {
            let mark = if check.failed == 0 { '✓' } else { '✗' };
            writeln!(
                f,
                "  {mark} {:.<24} {:>6.2}%  ✓ {}  ✗ {}",
                format!("{} ", check.name),
                check.rate(),
                check.passed,
                check.failed,
            )?;
        }

        writeln!(f, "responses")?;
        for r in &self.responses {
            let status = match r.status {
                Some(status) => status.to_string(),
                None => "error".into(),
            };
            writeln!(f, "  {:<10} {:>5}  {}", r.endpoint.path(), status, r.count)?;
        }

        writeln!(f, "iterations")?;
        writeln!(f, "  started           {}", self.iterations_started)?;
        writeln!(f, "  completed         {}", self.iterations_completed)?;
        writeln!(f, "  without booking   {}", self.bookings_skipped)?;
        writeln!(f, "  peak VUs          {}", self.peak_vus)?;
        write!(f, "  duration          {:.1?}", self.duration)
    }
}
