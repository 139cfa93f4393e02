//! Per-task progress lines.

use std::io::{self, Write};
use std::sync::Arc;

use texbatch_orchestration::{BuildEvent, BuildObserver};

use crate::console::SharedConsole;
use crate::output::format_secs;
use crate::ui::{tag, Tone};

/// Writes one block per build event to the shared console.
pub struct CliBuildReporter<W: Write + Send = io::Stdout> {
    console: Arc<SharedConsole<W>>,
    color: bool,
    quiet: bool,
}

impl<W: Write + Send> CliBuildReporter<W> {
    #[must_use]
    pub fn new(console: Arc<SharedConsole<W>>, color: bool, quiet: bool) -> Self {
        Self {
            console,
            color,
            quiet,
        }
    }

    /// Lines for `event`, prefixed with the job id where there is one.
    #[must_use]
    pub fn describe(&self, event: &BuildEvent<'_>) -> Vec<String> {
        let c = self.color;
        match event {
            BuildEvent::VariantStarted {
                job_id,
                variant,
                project,
            } => vec![format!("[{job_id}] building {variant}: {project}")],
            BuildEvent::Rendered {
                job_id,
                variant,
                path,
            } => vec![format!("[{job_id}] wrote {variant} source {}", path.display())],
            BuildEvent::RenderFailed {
                job_id,
                variant,
                error,
            } => vec![format!(
                "[{job_id}] {} {variant} source not written: {error}",
                tag("ERROR", Tone::Error, c)
            )],
            BuildEvent::Compiled { variant, result } => {
                let secs = format_secs(result.elapsed);
                if result.succeeded {
                    return vec![format!(
                        "[{}] {} {variant} built in {secs}",
                        result.job_id,
                        tag("OK", Tone::Success, c)
                    )];
                }
                let mut lines = vec![format!(
                    "[{}] {} {variant} failed after {secs}",
                    result.job_id,
                    tag("FAIL", Tone::Error, c)
                )];
                if let Some(tail) = &result.diagnostic_tail {
                    lines.push(format!("[{}] diagnostics:", result.job_id));
                    lines.extend(tail.lines().map(str::to_string));
                }
                lines
            }
            BuildEvent::ProjectFinished(outcome) => {
                if outcome.succeeded {
                    vec![format!(
                        "{} project {}: every variant built",
                        tag("OK", Tone::Success, c),
                        outcome.project_name
                    )]
                } else {
                    vec![format!(
                        "{} project {}: one or more variants failed",
                        tag("WARN", Tone::Warning, c),
                        outcome.project_name
                    )]
                }
            }
            BuildEvent::ProjectFaulted {
                identifier,
                message,
            } => vec![format!(
                "{} {identifier} aborted: {message}",
                tag("ERROR", Tone::Error, c)
            )],
        }
    }
}

impl<W: Write + Send> BuildObserver for CliBuildReporter<W> {
    fn on_event(&self, event: &BuildEvent<'_>) {
        if self.quiet && !is_failure(event) {
            return;
        }
        self.console.block(&self.describe(event));
    }
}

/// Events quiet mode still prints.
fn is_failure(event: &BuildEvent<'_>) -> bool {
    match event {
        BuildEvent::RenderFailed { .. } | BuildEvent::ProjectFaulted { .. } => true,
        BuildEvent::Compiled { result, .. } => !result.succeeded,
        _ => false,
    }
}
