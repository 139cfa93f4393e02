//! CLI run presenter: configuration, discovery, and the final summary.

use std::io::{self, Write};
use std::sync::Arc;

use texbatch_core::discovery::Discovery;
use texbatch_core::plan::ConcurrencyPlan;
use texbatch_orchestration::RunReport;

use crate::console::SharedConsole;
use crate::output::{format_duration, plural};
use crate::ui::{header, tag, Tone};

/// How the CPU count the plan was derived from was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuSource {
    Detected,
    Forced,
}

/// Writes run-level messages to the shared console.
pub struct CliRunPresenter<W: Write + Send = io::Stdout> {
    console: Arc<SharedConsole<W>>,
    color: bool,
    quiet: bool,
}

impl<W: Write + Send> CliRunPresenter<W> {
    #[must_use]
    pub fn new(console: Arc<SharedConsole<W>>, color: bool, quiet: bool) -> Self {
        Self {
            console,
            color,
            quiet,
        }
    }

    /// CPU count and the effective concurrency configuration.
    pub fn present_plan(&self, cpus: usize, source: CpuSource, plan: ConcurrencyPlan, sub: bool) {
        if self.quiet {
            return;
        }
        let cpu_line = match source {
            CpuSource::Detected => format!("Detected {cpus} logical CPUs"),
            CpuSource::Forced => format!("Using forced CPU count: {cpus}"),
        };
        self.console.block(&[
            cpu_line,
            "Concurrency:".to_string(),
            format!("  cpus:              {cpus}"),
            format!("  parallel projects: {}", plan.project_width),
            format!("  tasks per project: {}", plan.task_width),
            format!("  sub-project mode:  {sub}"),
        ]);
    }

    /// Warnings, found projects, and the project count.
    ///
    /// Warnings are shown even in quiet mode.
    pub fn present_discovery(&self, discovery: &Discovery) {
        let warn = tag("WARN", Tone::Warning, self.color);
        let mut lines: Vec<String> = discovery
            .warnings
            .iter()
            .map(|w| format!("{warn} {w}"))
            .collect();
        if !self.quiet {
            lines.extend(
                discovery
                    .projects
                    .iter()
                    .map(|p| format!("Found project: {}", p.name)),
            );
            lines.push(format!("Found {}", plural(discovery.projects.len(), "project")));
        }
        self.console.block(&lines);
    }

    /// Build start, including a notice when the project width was narrowed.
    pub fn present_start(&self, project_count: usize, planned: ConcurrencyPlan, fitted: ConcurrencyPlan) {
        if self.quiet {
            return;
        }
        let mut lines = vec![format!("Building {}...", plural(project_count, "project"))];
        if fitted.project_width < planned.project_width {
            lines.push(format!(
                "Only {}; parallel projects lowered to {}",
                plural(project_count, "project"),
                fitted.project_width
            ));
        }
        self.console.block(&lines);
    }

    /// Informational one-liner, e.g. an early exit reason.
    pub fn present_notice(&self, text: &str) {
        self.console.line(&format!("{} {text}", tag("INFO", Tone::Info, self.color)));
    }

    pub fn present_report(&self, report: &RunReport) {
        self.console.block(&summary_lines(report, self.color));
        self.console.flush();
    }
}

/// Final summary block for `report`.
#[must_use]
pub fn summary_lines(report: &RunReport, color: bool) -> Vec<String> {
    let rule = "=".repeat(60);
    let mut lines = vec![
        String::new(),
        rule.clone(),
        header("Build summary", color),
        rule.clone(),
        format!("Elapsed:   {}", format_duration(report.elapsed)),
        format!("Projects:  {}", report.total),
        format!("{} Succeeded: {}", tag("OK", Tone::Success, color), report.success_count()),
    ];
    lines.extend(report.succeeded.iter().map(|name| format!("    - {name}")));
    lines.push(format!(
        "{} Failed:    {}",
        tag("FAIL", Tone::Error, color),
        report.failure_count()
    ));
    lines.extend(report.failed.iter().map(|name| format!("    - {name}")));
    lines.push(rule);

    if let Some(speedup) = report.speedup_estimate() {
        lines.push(format!(
            "Estimated speedup: ~{speedup:.1}x (assumes sequential time = elapsed x {})",
            report.project_width
        ));
    }
    if report.is_success() {
        lines.push(format!("{} All projects built", tag("OK", Tone::Success, color)));
    } else {
        lines.push(format!(
            "{} {} failed",
            tag("WARN", Tone::Warning, color),
            plural(report.failure_count(), "project")
        ));
    }
    lines
}
