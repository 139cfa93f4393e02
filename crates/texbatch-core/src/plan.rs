//! Concurrency planning: how many projects and variants run at once.
//!
//! The planner is a pure function of the CPU count and the user's
//! overrides. Building LaTeX is a mix of CPU and I/O work, so small
//! machines use every core while larger ones keep one or two back for the
//! system.

use serde::Serialize;

use crate::constants::{FALLBACK_CPU_COUNT, MIN_CPU_COUNT, VARIANTS_PER_PROJECT};

/// User overrides for the computed plan. `None` keeps the computed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOverrides {
    /// Replaces the computed project fan-out width.
    pub project_width: Option<usize>,
    /// Replaces the computed per-project task width.
    pub task_width: Option<usize>,
    /// Plans for this many CPUs instead of the detected count.
    pub forced_cpus: Option<usize>,
}

/// Fan-out widths for the two scheduler levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConcurrencyPlan {
    /// Maximum number of projects built concurrently.
    pub project_width: usize,
    /// Maximum number of variant tasks running concurrently inside one project.
    pub task_width: usize,
}

impl ConcurrencyPlan {
    /// Derive a plan from the detected CPU count and the overrides.
    ///
    /// # Example
    /// ```
    /// use texbatch_core::plan::{ConcurrencyPlan, PlanOverrides};
    ///
    /// let plan = ConcurrencyPlan::plan(6, &PlanOverrides::default());
    /// assert_eq!((plan.project_width, plan.task_width), (5, 2));
    /// ```
    #[must_use]
    pub fn plan(logical_cpus: usize, overrides: &PlanOverrides) -> Self {
        let cpus = effective_cpu_count(logical_cpus, overrides.forced_cpus);
        let (project_width, task_width) = widths_for(cpus);

        Self {
            project_width: overrides.project_width.unwrap_or(project_width).max(1),
            task_width: overrides.task_width.unwrap_or(task_width).max(1),
        }
    }

    /// Narrow the project width so no pool worker sits idle.
    #[must_use]
    pub fn fit_to(self, project_count: usize) -> Self {
        if project_count < self.project_width {
            Self {
                project_width: project_count.max(1),
                ..self
            }
        } else {
            self
        }
    }
}

/// CPU count the planner works with: the forced count if given, floored to
/// [`MIN_CPU_COUNT`].
#[must_use]
pub fn effective_cpu_count(logical_cpus: usize, forced_cpus: Option<usize>) -> usize {
    forced_cpus
        .filter(|&n| n > 0)
        .unwrap_or(logical_cpus)
        .max(MIN_CPU_COUNT)
}

fn widths_for(cpus: usize) -> (usize, usize) {
    if cpus <= 4 {
        (cpus.max(2), VARIANTS_PER_PROJECT)
    } else if cpus <= 8 {
        (cpus - 1, VARIANTS_PER_PROJECT)
    } else {
        (cpus - 2, VARIANTS_PER_PROJECT.min(cpus / 4))
    }
}

/// Number of logical CPUs this process may run on.
///
/// Prefers the affinity mask, then the OS-reported parallelism, then
/// [`FALLBACK_CPU_COUNT`].
#[must_use]
pub fn detect_logical_cpus() -> usize {
    let affinity = core_affinity::get_core_ids()
        .map(|ids| ids.len())
        .filter(|&n| n > 0);

    affinity.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(FALLBACK_CPU_COUNT)
    })
}
