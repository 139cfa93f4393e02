//! Orchestration interfaces.

use std::path::Path;

use serde::Serialize;

use texbatch_core::compiler::CompileResult;
use texbatch_core::project::Variant;
use texbatch_core::render::RenderError;

/// Progress event emitted while a run is in flight.
///
/// Events from sibling tasks arrive in any order.
#[derive(Debug)]
pub enum BuildEvent<'a> {
    /// A variant task picked up work.
    VariantStarted {
        job_id: &'a str,
        variant: Variant,
        project: &'a str,
    },
    /// A variant document was written.
    Rendered {
        job_id: &'a str,
        variant: Variant,
        path: &'a Path,
    },
    /// A variant document could not be produced; the compiler is skipped.
    RenderFailed {
        job_id: &'a str,
        variant: Variant,
        error: &'a RenderError,
    },
    /// The compiler returned for a variant.
    Compiled {
        variant: Variant,
        result: &'a CompileResult,
    },
    /// Both variants of a project are known.
    ProjectFinished(&'a ProjectOutcome),
    /// A project task faulted and was recorded as failed.
    ProjectFaulted {
        identifier: &'a str,
        message: &'a str,
    },
}

/// Receives build progress. Implementations are called from worker threads.
pub trait BuildObserver: Send + Sync {
    fn on_event(&self, event: &BuildEvent<'_>);
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl BuildObserver for NullObserver {
    fn on_event(&self, _event: &BuildEvent<'_>) {}
}

/// Reduced result of one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectOutcome {
    /// Position of the project in the submitted list.
    pub index: usize,
    pub project_name: String,
    /// True iff every variant succeeded.
    pub succeeded: bool,
    /// Variant results in completion order.
    pub variants: Vec<CompileResult>,
}

impl ProjectOutcome {
    /// Reduce variant results with logical AND.
    #[must_use]
    pub fn from_results(index: usize, project_name: impl Into<String>, variants: Vec<CompileResult>) -> Self {
        Self {
            index,
            project_name: project_name.into(),
            succeeded: variants.iter().all(|r| r.succeeded),
            variants,
        }
    }

    /// Result for the job id, if that variant ran.
    #[must_use]
    pub fn variant(&self, job_id: &str) -> Option<&CompileResult> {
        self.variants.iter().find(|r| r.job_id == job_id)
    }
}
