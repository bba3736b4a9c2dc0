//! Phase timing for the demo programs.

use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Named phase durations in the order they were recorded.
#[derive(Debug, Clone, Default)]
pub struct TimingReport {
    phases: Vec<(String, Duration)>,
}

impl TimingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, elapsed: Duration) {
        let name = name.into();
        debug!(phase = %name, elapsed_ms = elapsed.as_secs_f64() * 1e3, "phase finished");
        self.phases.push((name, elapsed));
    }

    /// Runs `f` and records how long it took.
    pub fn time<T>(&mut self, name: impl Into<String>, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = f();
        self.record(name, start.elapsed());
        value
    }

    /// Starts a guard that records into this report when dropped.
    pub fn scoped(&mut self, name: impl Into<String>) -> ScopedTimer<'_> {
        ScopedTimer {
            report: self,
            name: Some(name.into()),
            start: Instant::now(),
        }
    }

    pub fn phases(&self) -> &[(String, Duration)] {
        &self.phases
    }

    pub fn get(&self, name: &str) -> Option<Duration> {
        self.phases
            .iter()
            .filter(|(phase, _)| phase == name)
            .map(|(_, elapsed)| *elapsed)
            .reduce(|a, b| a + b)
    }

    pub fn total(&self) -> Duration {
        self.phases.iter().map(|(_, elapsed)| *elapsed).sum()
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total().as_secs_f64();
        let width = self.phases.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        for (name, elapsed) in &self.phases {
            let share = if total > 0.0 {
                100.0 * elapsed.as_secs_f64() / total
            } else {
                0.0
            };
            writeln!(
                f,
                "{name:<width$}  {:>10.3} ms  {share:>5.1}%",
                elapsed.as_secs_f64() * 1e3
            )?;
        }
        write!(f, "{:<width$}  {:>10.3} ms", "total", total * 1e3)
    }
}

/// Records the time between its creation and drop.
#[derive(Debug)]
pub struct ScopedTimer<'a> {
    report: &'a mut TimingReport,
    name: Option<String>,
    start: Instant,
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        if let Some(name) = self.name.take() {
            self.report.record(name, self.start.elapsed());
        }
    }
}
