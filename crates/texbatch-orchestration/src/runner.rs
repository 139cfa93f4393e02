//! Per-project task scheduling: build both variants and reduce.

use std::sync::Arc;
use std::time::Duration;

use texbatch_core::cancel::CancellationToken;
use texbatch_core::compiler::{CompileJob, CompileResult, Compiler};
use texbatch_core::project::{ProjectDescriptor, Variant};
use texbatch_core::render::render_variant;

use crate::interfaces::{BuildEvent, BuildObserver, ProjectOutcome};
use crate::pool::{PoolError, WorkerPool};

/// Builds one project's variants on a pool of `task_width` workers.
pub struct ProjectRunner {
    compiler: Arc<dyn Compiler>,
    observer: Arc<dyn BuildObserver>,
    cancel: CancellationToken,
    task_width: usize,
}

impl ProjectRunner {
    #[must_use]
    pub fn new(
        compiler: Arc<dyn Compiler>,
        observer: Arc<dyn BuildObserver>,
        task_width: usize,
    ) -> Self {
        Self {
            compiler,
            observer,
            cancel: CancellationToken::new(),
            task_width,
        }
    }

    /// Skip variants that have not started once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn task_width(&self) -> usize {
        self.task_width
    }

    /// Render and compile every variant of `project`, then reduce with AND.
    ///
    /// A variant that fails to render or panics becomes a failed result;
    /// the sibling variant always runs. Errors only when the task pool
    /// cannot be created.
    pub fn run_project(
        &self,
        index: usize,
        project: &ProjectDescriptor,
    ) -> Result<ProjectOutcome, PoolError> {
        let pool = WorkerPool::new("texbatch-task", self.task_width)?;

        let jobs: Vec<_> = Variant::ALL
            .iter()
            .map(|&variant| {
                let task = VariantTask {
                    compiler: Arc::clone(&self.compiler),
                    observer: Arc::clone(&self.observer),
                    cancel: self.cancel.clone(),
                    index,
                    project: project.clone(),
                    variant,
                };
                move || task.run()
            })
            .collect();

        let mut results = Vec::with_capacity(jobs.len());
        pool.run_all(jobs, |slot, result| {
            let result = result.unwrap_or_else(|fault| {
                let variant = Variant::ALL[slot];
                let result =
                    CompileResult::failure(variant.job_id(index), Duration::ZERO, &fault.to_string());
                self.observer.on_event(&BuildEvent::Compiled {
                    variant,
                    result: &result,
                });
                result
            });
            results.push(result);
        });

        Ok(ProjectOutcome::from_results(index, &project.name, results))
    }
}

struct VariantTask {
    compiler: Arc<dyn Compiler>,
    observer: Arc<dyn BuildObserver>,
    cancel: CancellationToken,
    index: usize,
    project: ProjectDescriptor,
    variant: Variant,
}

impl VariantTask {
    fn run(self) -> CompileResult {
        let job_id = self.variant.job_id(self.index);
        self.observer.on_event(&BuildEvent::VariantStarted {
            job_id: &job_id,
            variant: self.variant,
            project: &self.project.name,
        });

        let result = if self.cancel.is_cancelled() {
            CompileResult::failure(&job_id, Duration::ZERO, "compilation cancelled")
        } else {
            match render_variant(&self.project, self.variant) {
                Ok(path) => {
                    self.observer.on_event(&BuildEvent::Rendered {
                        job_id: &job_id,
                        variant: self.variant,
                        path: &path,
                    });
                    let job = CompileJob::for_variant(self.index, &self.project, self.variant, path);
                    self.compiler.compile(&job)
                }
                Err(error) => {
                    self.observer.on_event(&BuildEvent::RenderFailed {
                        job_id: &job_id,
                        variant: self.variant,
                        error: &error,
                    });
                    return CompileResult::failure(&job_id, Duration::ZERO, &error.to_string());
                }
            }
        };

        self.observer.on_event(&BuildEvent::Compiled {
            variant: self.variant,
            result: &result,
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use parking_lot::Mutex;
    use texbatch_core::constants::SOURCE_FILE_NAME;

    use crate::interfaces::NullObserver;

    /// Fails every job whose output basename ends in `_exam`.
    struct ExamFails {
        calls: Mutex<Vec<String>>,
    }

    impl Compiler for ExamFails {
        fn compile(&self, job: &CompileJob) -> CompileResult {
            self.calls.lock().push(job.job_id.clone());
            if job.output_basename.ends_with("_exam") {
                CompileResult::failure(&job.job_id, Duration::from_millis(2), "! exam broke")
            } else {
                CompileResult::success(&job.job_id, Duration::from_millis(1))
            }
        }
    }

    struct AlwaysOk;

    impl Compiler for AlwaysOk {
        fn compile(&self, job: &CompileJob) -> CompileResult {
            CompileResult::success(&job.job_id, Duration::from_millis(1))
        }
    }

    struct Panics;

    impl Compiler for Panics {
        fn compile(&self, job: &CompileJob) -> CompileResult {
            assert!(!job.job_id.ends_with("exam"), "driver crashed");
            CompileResult::success(&job.job_id, Duration::ZERO)
        }
    }

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl BuildObserver for Recorder {
        fn on_event(&self, event: &BuildEvent<'_>) {
            let line = match event {
                BuildEvent::VariantStarted { job_id, .. } => format!("start {job_id}"),
                BuildEvent::Rendered { job_id, .. } => format!("rendered {job_id}"),
                BuildEvent::RenderFailed { job_id, .. } => format!("render-failed {job_id}"),
                BuildEvent::Compiled { result, .. } => {
                    format!("compiled {} {}", result.job_id, result.succeeded)
                }
                BuildEvent::ProjectFinished(o) => format!("finished {}", o.project_name),
                BuildEvent::ProjectFaulted { identifier, .. } => format!("fault {identifier}"),
            };
            self.lines.lock().push(line);
        }
    }

    fn project(dir: &Path) -> ProjectDescriptor {
        fs::write(dir.join(SOURCE_FILE_NAME), "% Limits\nbody\\newpage\n").unwrap();
        ProjectDescriptor::new("Limits", dir)
    }

    #[test]
    fn both_variants_succeed() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = ProjectRunner::new(Arc::new(AlwaysOk), Arc::new(NullObserver), 2);
        let outcome = runner.run_project(0, &project(tmp.path())).unwrap();

        assert!(outcome.succeeded);
        assert_eq!(outcome.variants.len(), 2);
        assert!(tmp.path().join("pad.tex").is_file());
        assert!(tmp.path().join("exam.tex").is_file());
    }

    #[test]
    fn failing_exam_fails_project_but_pad_completes() {
        let tmp = tempfile::tempdir().unwrap();
        let compiler = Arc::new(ExamFails {
            calls: Mutex::new(Vec::new()),
        });
        let runner = ProjectRunner::new(compiler.clone(), Arc::new(NullObserver), 2);
        let outcome = runner.run_project(5, &project(tmp.path())).unwrap();

        assert!(!outcome.succeeded);
        assert!(outcome.variant("5_pad").unwrap().succeeded);
        let exam = outcome.variant("5_exam").unwrap();
        assert!(!exam.succeeded);
        assert_eq!(exam.diagnostic_tail.as_deref(), Some("! exam broke"));
        assert_eq!(compiler.calls.lock().len(), 2);
    }

    #[test]
    fn render_failure_skips_compiler_for_that_variant_only() {
        let tmp = tempfile::tempdir().unwrap();
        // No source document: the exam render cannot read it, the pad render does not need it.
        let project = ProjectDescriptor::new("Orphan", tmp.path());
        let compiler = Arc::new(ExamFails {
            calls: Mutex::new(Vec::new()),
        });
        let runner = ProjectRunner::new(compiler.clone(), Arc::new(NullObserver), 2);
        let outcome = runner.run_project(1, &project).unwrap();

        assert!(!outcome.succeeded);
        assert_eq!(outcome.variants.len(), 2);
        assert!(outcome.variant("1_pad").unwrap().succeeded);
        let exam = outcome.variant("1_exam").unwrap();
        assert!(exam.diagnostic_tail.as_deref().unwrap().contains("failed to read"));
        assert_eq!(*compiler.calls.lock(), ["1_pad"]);
    }

    #[test]
    fn panicking_variant_becomes_failed_result() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let runner = ProjectRunner::new(Arc::new(Panics), recorder.clone(), 2);
        let outcome = runner.run_project(0, &project(tmp.path())).unwrap();

        assert!(!outcome.succeeded);
        assert!(outcome.variant("0_pad").unwrap().succeeded);
        let exam = outcome.variant("0_exam").unwrap();
        assert!(exam.diagnostic_tail.as_deref().unwrap().contains("driver crashed"));
        assert!(recorder.lines.lock().contains(&"compiled 0_exam false".to_string()));
    }

    #[test]
    fn single_task_width_still_builds_both() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = ProjectRunner::new(Arc::new(AlwaysOk), Arc::new(NullObserver), 1);
        let outcome = runner.run_project(0, &project(tmp.path())).unwrap();
        assert!(outcome.succeeded);
        assert_eq!(outcome.variants.len(), 2);
    }

    #[test]
    fn cancelled_run_skips_compiler() {
        let tmp = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let compiler = Arc::new(ExamFails {
            calls: Mutex::new(Vec::new()),
        });
        let runner = ProjectRunner::new(compiler.clone(), Arc::new(NullObserver), 2)
            .with_cancellation(cancel);
        let outcome = runner.run_project(0, &project(tmp.path())).unwrap();

        assert!(!outcome.succeeded);
        assert!(compiler.calls.lock().is_empty());
    }

    #[test]
    fn events_describe_each_variant() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::default());
        let runner = ProjectRunner::new(Arc::new(AlwaysOk), recorder.clone(), 2);
        runner.run_project(2, &project(tmp.path())).unwrap();

        let lines = recorder.lines.lock();
        for expected in [
            "start 2_pad",
            "rendered 2_pad",
            "compiled 2_pad true",
            "start 2_exam",
            "rendered 2_exam",
            "compiled 2_exam true",
        ] {
            assert!(lines.iter().any(|l| l == expected), "missing {expected}");
        }
        let pad_start = lines.iter().position(|l| l == "start 2_pad").unwrap();
        let pad_done = lines.iter().position(|l| l == "compiled 2_pad true").unwrap();
        assert!(pad_start < pad_done);
    }
}
