//! Error handling and exit codes.

use std::io;
use std::path::PathBuf;

use texbatch_cli::ui::print_error;
use texbatch_core::constants::exit_codes;
use texbatch_orchestration::PoolError;

/// Failures that stop a run before its report exists.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("failed to write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exit code for an application error.
pub fn handle_error(err: &AppError) -> i32 {
    match err {
        AppError::Config(_) => exit_codes::ERROR_CONFIG,
        AppError::Pool(_) | AppError::Report { .. } => exit_codes::ERROR_GENERIC,
    }
}

/// Print `err` with its causes and return the exit code for it.
pub fn report_error(err: &anyhow::Error) -> i32 {
    print_error(&format!("{err:#}"));
    err.downcast_ref::<AppError>()
        .map_or(exit_codes::ERROR_GENERIC, handle_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(handle_error(&AppError::Config("bad".into())), 4);
        let report = AppError::Report {
            path: PathBuf::from("out/report.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(handle_error(&report), 1);
    }

    #[test]
    fn anyhow_errors_keep_their_code() {
        let err = anyhow::Error::new(AppError::Config("--engine".into()));
        assert_eq!(report_error(&err), exit_codes::ERROR_CONFIG);
        assert_eq!(report_error(&anyhow::anyhow!("other")), exit_codes::ERROR_GENERIC);
    }

    #[test]
    fn report_error_names_the_path() {
        let err = AppError::Report {
            path: PathBuf::from("out/report.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(
            err.to_string(),
            "failed to write report out/report.json: missing"
        );
    }
}
