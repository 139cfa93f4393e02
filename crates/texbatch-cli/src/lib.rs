//! # texbatch-cli
//!
//! Console output, build progress, run summaries, and shell completion.

pub mod completion;
pub mod console;
pub mod output;
pub mod presenter;
pub mod reporter;
pub mod ui;

pub use console::SharedConsole;
pub use presenter::CliRunPresenter;
pub use reporter::CliBuildReporter;
