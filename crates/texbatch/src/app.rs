//! Application entry point and dispatch.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;

use texbatch_cli::output::write_json_report;
use texbatch_cli::presenter::CpuSource;
use texbatch_cli::ui::stdout_color;
use texbatch_cli::{CliBuildReporter, CliRunPresenter, SharedConsole};
use texbatch_core::cancel::CancellationToken;
use texbatch_core::compiler::LatexmkCompiler;
use texbatch_core::constants::exit_codes;
use texbatch_core::discovery::discover;
use texbatch_core::plan::{detect_logical_cpus, effective_cpu_count, ConcurrencyPlan};
use texbatch_orchestration::ProjectScheduler;

use crate::config::AppConfig;
use crate::errors::AppError;

/// Run the application and return the process exit code.
pub fn run(config: &AppConfig) -> Result<i32> {
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        texbatch_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(exit_codes::SUCCESS);
    }

    config.validate()?;

    let cancel = CancellationToken::new();
    ctrlc_handler(cancel.clone());

    let console = Arc::new(SharedConsole::stdout());
    run_build(config, console, stdout_color(), &cancel)
}

/// Plan, discover, build, and summarize, writing everything to `console`.
pub fn run_build<W: Write + Send + 'static>(
    config: &AppConfig,
    console: Arc<SharedConsole<W>>,
    color: bool,
    cancel: &CancellationToken,
) -> Result<i32> {
    let presenter = CliRunPresenter::new(Arc::clone(&console), color, config.quiet);

    let logical_cpus = detect_logical_cpus();
    let overrides = config.plan_overrides();
    let plan = ConcurrencyPlan::plan(logical_cpus, &overrides);
    let cpus = effective_cpu_count(logical_cpus, overrides.forced_cpus);
    let source = match overrides.forced_cpus {
        Some(_) => CpuSource::Forced,
        None => CpuSource::Detected,
    };
    tracing::debug!(cpus, ?plan, "concurrency plan");
    presenter.present_plan(cpus, source, plan, config.sub);

    if !config.sub {
        presenter.present_notice("sub-project mode is off, nothing to build");
        return Ok(exit_codes::SUCCESS);
    }

    let discovery = discover(&config.root);
    presenter.present_discovery(&discovery);
    if discovery.projects.is_empty() {
        presenter.present_notice("no projects found, nothing to build");
        return Ok(exit_codes::SUCCESS);
    }

    let fitted = plan.fit_to(discovery.projects.len());
    presenter.present_start(discovery.projects.len(), plan, fitted);

    let compiler = LatexmkCompiler::new()
        .with_program(config.latexmk.clone())
        .with_engine(config.engine.clone())
        .with_timeout(config.timeout_limit())
        .with_cancellation(cancel.clone());
    let reporter = CliBuildReporter::new(Arc::clone(&console), color, config.quiet);
    let scheduler = ProjectScheduler::new(Arc::new(compiler), Arc::new(reporter), fitted)
        .with_cancellation(cancel.clone());

    let report = scheduler
        .run_all(&discovery.projects)
        .map_err(AppError::from)?;
    presenter.present_report(&report);

    if let Some(path) = &config.report {
        write_json_report(path, &report).map_err(|source| AppError::Report {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "report written");
    }

    if cancel.is_cancelled() {
        presenter.present_notice("build cancelled");
        return Ok(exit_codes::ERROR_CANCELED);
    }
    Ok(report.exit_code())
}

fn ctrlc_handler(cancel: CancellationToken) {
    if let Err(err) = ctrlc::set_handler(move || cancel.cancel()) {
        tracing::warn!(error = %err, "Ctrl+C handler not installed");
    }
}
