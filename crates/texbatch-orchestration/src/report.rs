//! Run report accumulation.

use std::time::Duration;

use serde::Serialize;

use texbatch_core::compiler::serialize_secs;
use texbatch_core::constants::exit_codes;

use crate::interfaces::ProjectOutcome;

/// Final summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Number of projects submitted.
    pub total: usize,
    /// Names of projects whose variants all built, in completion order.
    pub succeeded: Vec<String>,
    /// Names (or synthesized identifiers) of failed projects, in completion order.
    pub failed: Vec<String>,
    /// Wall-clock time of the whole run.
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Project fan-out width the run used.
    pub project_width: usize,
    /// Per-project outcomes in completion order. Faulted projects have none.
    pub outcomes: Vec<ProjectOutcome>,
}

impl RunReport {
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// True iff no project failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Rough speedup over a sequential build.
    ///
    /// This is an estimate, not a measurement: the sequential time is
    /// assumed to be `elapsed × project_width`, so the figure equals the
    /// width used. `None` when nothing succeeded or no time elapsed.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn speedup_estimate(&self) -> Option<f64> {
        let elapsed = self.elapsed.as_secs_f64();
        if self.succeeded.is_empty() || elapsed <= 0.0 {
            return None;
        }
        let sequential_estimate = elapsed * self.project_width as f64;
        Some(sequential_estimate / elapsed)
    }

    /// Process exit code for this report.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            exit_codes::SUCCESS
        } else {
            exit_codes::BUILD_FAILED
        }
    }
}

/// Accumulates outcomes as projects finish.
///
/// Owned by the thread draining the project pool, so appends are
/// serialized by construction.
#[derive(Debug)]
pub struct ReportAggregator {
    total: usize,
    project_width: usize,
    succeeded: Vec<String>,
    failed: Vec<String>,
    outcomes: Vec<ProjectOutcome>,
}

impl ReportAggregator {
    #[must_use]
    pub fn new(total: usize, project_width: usize) -> Self {
        Self {
            total,
            project_width,
            succeeded: Vec::with_capacity(total),
            failed: Vec::new(),
            outcomes: Vec::with_capacity(total),
        }
    }

    /// Record a reduced project outcome.
    pub fn record(&mut self, outcome: ProjectOutcome) {
        if outcome.succeeded {
            self.succeeded.push(outcome.project_name.clone());
        } else {
            self.failed.push(outcome.project_name.clone());
        }
        self.outcomes.push(outcome);
    }

    /// Record a project that faulted before producing an outcome.
    pub fn record_fault(&mut self, identifier: impl Into<String>) {
        self.failed.push(identifier.into());
    }

    /// Number of projects recorded so far.
    #[must_use]
    pub fn recorded(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    #[must_use]
    pub fn finish(self, elapsed: Duration) -> RunReport {
        if self.recorded() != self.total {
            tracing::warn!(
                recorded = self.recorded(),
                total = self.total,
                "report is missing outcomes"
            );
        }
        RunReport {
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            elapsed,
            project_width: self.project_width,
            outcomes: self.outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texbatch_core::compiler::CompileResult;

    fn outcome(index: usize, name: &str, ok: bool) -> ProjectOutcome {
        let result = if ok {
            CompileResult::success(format!("{index}_pad"), Duration::from_millis(1))
        } else {
            CompileResult::failure(format!("{index}_pad"), Duration::from_millis(1), "boom")
        };
        ProjectOutcome::from_results(index, name, vec![result])
    }

    #[test]
    fn empty_report_succeeds() {
        let report = ReportAggregator::new(0, 2).finish(Duration::ZERO);
        assert!(report.is_success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.speedup_estimate(), None);
    }

    #[test]
    fn keeps_arrival_order() {
        let mut agg = ReportAggregator::new(3, 2);
        agg.record(outcome(2, "C", true));
        agg.record(outcome(0, "A", false));
        agg.record(outcome(1, "B", true));
        let report = agg.finish(Duration::from_secs(3));

        assert_eq!(report.succeeded, ["C", "B"]);
        assert_eq!(report.failed, ["A"]);
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.outcomes[0].index, 2);
    }

    #[test]
    fn any_failure_sets_exit_code() {
        let mut agg = ReportAggregator::new(2, 2);
        agg.record(outcome(0, "A", true));
        agg.record_fault("project-1");
        let report = agg.finish(Duration::from_secs(1));

        assert!(!report.is_success());
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failed, ["project-1"]);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn speedup_estimate_equals_width() {
        let mut agg = ReportAggregator::new(1, 6);
        agg.record(outcome(0, "A", true));
        let report = agg.finish(Duration::from_millis(1500));
        let speedup = report.speedup_estimate().unwrap();
        assert!((speedup - 6.0).abs() < 1e-9);
    }

    #[test]
    fn no_speedup_without_successes() {
        let mut agg = ReportAggregator::new(1, 4);
        agg.record(outcome(0, "A", false));
        assert_eq!(agg.finish(Duration::from_secs(2)).speedup_estimate(), None);
    }

    #[test]
    fn recorded_counts_faults() {
        let mut agg = ReportAggregator::new(2, 2);
        agg.record_fault("project-0");
        agg.record(outcome(1, "B", true));
        assert_eq!(agg.recorded(), 2);
    }
}
