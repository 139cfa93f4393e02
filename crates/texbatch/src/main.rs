//! texbatch: build every LaTeX project under a directory tree concurrently.

use std::process::ExitCode;

use texbatch_lib::{app, config, errors};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let config = config::AppConfig::parse();
    let code = match app::run(&config) {
        Ok(code) => code,
        Err(err) => errors::report_error(&err),
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
