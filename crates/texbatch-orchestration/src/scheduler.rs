//! Project-level fan-out.

use std::sync::Arc;
use std::time::Instant;

use texbatch_core::cancel::CancellationToken;
use texbatch_core::compiler::Compiler;
use texbatch_core::plan::ConcurrencyPlan;
use texbatch_core::project::ProjectDescriptor;

use crate::interfaces::{BuildEvent, BuildObserver};
use crate::pool::{PoolError, WorkerPool};
use crate::report::{ReportAggregator, RunReport};
use crate::runner::ProjectRunner;

/// Runs projects on a pool of `project_width` workers, each project
/// building its variants on its own pool of `task_width` workers.
pub struct ProjectScheduler {
    compiler: Arc<dyn Compiler>,
    observer: Arc<dyn BuildObserver>,
    cancel: CancellationToken,
    plan: ConcurrencyPlan,
}

impl ProjectScheduler {
    #[must_use]
    pub fn new(
        compiler: Arc<dyn Compiler>,
        observer: Arc<dyn BuildObserver>,
        plan: ConcurrencyPlan,
    ) -> Self {
        Self {
            compiler,
            observer,
            cancel: CancellationToken::new(),
            plan,
        }
    }

    /// Projects that have not started once `cancel` fires fail without compiling.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Build every project and aggregate the outcomes.
    ///
    /// Outcomes are recorded in completion order. A project whose task
    /// faults is recorded as failed under `project-{index}`. Errors only
    /// when the project pool cannot be created.
    pub fn run_all(&self, projects: &[ProjectDescriptor]) -> Result<RunReport, PoolError> {
        let start = Instant::now();
        let mut report = ReportAggregator::new(projects.len(), self.plan.project_width);
        if projects.is_empty() {
            return Ok(report.finish(start.elapsed()));
        }

        let pool = WorkerPool::new("texbatch-project", self.plan.project_width)?;
        let runner = Arc::new(
            ProjectRunner::new(
                Arc::clone(&self.compiler),
                Arc::clone(&self.observer),
                self.plan.task_width,
            )
            .with_cancellation(self.cancel.clone()),
        );
        tracing::info!(
            projects = projects.len(),
            project_width = pool.width(),
            task_width = runner.task_width(),
            "starting build"
        );

        let jobs: Vec<_> = projects
            .iter()
            .enumerate()
            .map(|(index, project)| {
                let runner = Arc::clone(&runner);
                let project = project.clone();
                move || runner.run_project(index, &project)
            })
            .collect();

        pool.run_all(jobs, |index, result| {
            let failure = match result {
                Ok(Ok(outcome)) => {
                    tracing::debug!(project = %outcome.project_name, ok = outcome.succeeded, "project finished");
                    self.observer.on_event(&BuildEvent::ProjectFinished(&outcome));
                    report.record(outcome);
                    return;
                }
                Ok(Err(pool_error)) => pool_error.to_string(),
                Err(fault) => fault.to_string(),
            };
            let identifier = format!("project-{index}");
            tracing::warn!(%identifier, error = %failure, "project faulted");
            self.observer.on_event(&BuildEvent::ProjectFaulted {
                identifier: &identifier,
                message: &failure,
            });
            report.record_fault(identifier);
        });

        Ok(report.finish(start.elapsed()))
    }
}
