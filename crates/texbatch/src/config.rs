//! Application configuration from CLI flags and environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use texbatch_core::constants::{DEFAULT_ENGINE, DEFAULT_ROOT_DIR, DEFAULT_TOOL};
use texbatch_core::plan::PlanOverrides;

use crate::errors::AppError;

/// texbatch: render and compile the pad and exam variants of every project.
#[derive(Parser, Debug, Clone)]
#[command(name = "texbatch", version, about)]
pub struct AppConfig {
    /// Sub-project mode. With `false` nothing is built.
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub sub: bool,

    /// Maximum number of projects built at once.
    #[arg(long, value_parser = parse_positive, env = "TEXBATCH_MAX_PROJECTS", value_name = "N")]
    pub max_projects: Option<usize>,

    /// Maximum number of variants compiled at once inside one project.
    #[arg(long, value_parser = parse_positive, env = "TEXBATCH_MAX_TASKS", value_name = "N")]
    pub max_tasks_per_project: Option<usize>,

    /// Plan for this many CPUs instead of the detected count (0 = detect).
    #[arg(long, default_value_t = 0, env = "TEXBATCH_FORCE_CPU", value_name = "N")]
    pub force_cpu: usize,

    /// Directory scanned recursively for projects.
    #[arg(long, default_value = DEFAULT_ROOT_DIR, env = "TEXBATCH_ROOT", value_name = "DIR")]
    pub root: PathBuf,

    /// Typesetting driver to run.
    #[arg(long, default_value = DEFAULT_TOOL, env = "TEXBATCH_LATEXMK", value_name = "PROGRAM")]
    pub latexmk: String,

    /// Engine selected through the driver's `-<engine>` flag.
    #[arg(long, default_value = DEFAULT_ENGINE, value_name = "NAME")]
    pub engine: String,

    /// Per-compilation time limit (e.g. "30s", "5m", "500ms"; 0 = none).
    ///
    /// On expiry the driver's process group is killed. Programs that
    /// detach into a new session survive.
    #[arg(long, default_value = "0", value_parser = parse_duration, value_name = "DUR")]
    pub timeout: Duration,

    /// Write a JSON run report to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Quiet mode (only warnings, failures and the summary).
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate shell completion.
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Overrides handed to the concurrency planner.
    #[must_use]
    pub fn plan_overrides(&self) -> PlanOverrides {
        PlanOverrides {
            project_width: self.max_projects,
            task_width: self.max_tasks_per_project,
            forced_cpus: (self.force_cpu > 0).then_some(self.force_cpu),
        }
    }

    /// Compilation time limit, `None` when unlimited.
    #[must_use]
    pub fn timeout_limit(&self) -> Option<Duration> {
        (!self.timeout.is_zero()).then_some(self.timeout)
    }

    /// Reject values clap cannot check on its own.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.latexmk.trim().is_empty() {
            return Err(AppError::Config("--latexmk must name a program".into()));
        }
        if self.engine.is_empty()
            || !self
                .engine
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::Config(format!(
                "--engine {:?} is not a valid engine name",
                self.engine
            )));
        }
        Ok(())
    }
}

fn parse_positive(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Parse a duration string like "5m", "1h", "30s", "500ms", or bare seconds.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let number = |digits: &str| {
        digits
            .parse::<u64>()
            .map_err(|_| format!("invalid duration {s:?}"))
    };
    let scaled = |digits: &str, unit: u64| -> Result<Duration, String> {
        number(digits)?
            .checked_mul(unit)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration {s:?} too large"))
    };
    if let Some(ms) = s.strip_suffix("ms") {
        Ok(Duration::from_millis(number(ms)?))
    } else if let Some(mins) = s.strip_suffix('m') {
        scaled(mins, 60)
    } else if let Some(hours) = s.strip_suffix('h') {
        scaled(hours, 3600)
    } else if let Some(secs) = s.strip_suffix('s') {
        Ok(Duration::from_secs(number(secs)?))
    } else {
        Ok(Duration::from_secs(number(s)?))
    }
}
