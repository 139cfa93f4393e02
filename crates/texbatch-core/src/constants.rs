//! Constants for project layout, compiler invocation, and exit codes.

use std::time::Duration;

/// Source document every project unit must contain.
pub const SOURCE_FILE_NAME: &str = "main.tex";

/// Default root directory scanned for projects (relative to the working directory).
pub const DEFAULT_ROOT_DIR: &str = "contents";

/// Default typesetting driver.
pub const DEFAULT_TOOL: &str = "latexmk";

/// Default engine flag passed to the driver (as `-<engine>`).
pub const DEFAULT_ENGINE: &str = "xelatex";

/// Maximum number of characters of compiler stderr kept in a failed result.
pub const DIAGNOSTIC_TAIL_CHARS: usize = 500;

/// CPU count assumed when the OS cannot report one.
pub const FALLBACK_CPU_COUNT: usize = 4;

/// Lower bound applied to the CPU count before planning.
pub const MIN_CPU_COUNT: usize = 2;

/// Number of variants built per project.
pub const VARIANTS_PER_PROJECT: usize = 2;

/// How often a running compiler is polled for exit, timeout, or cancellation.
pub const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Process exit codes.
pub mod exit_codes {
    /// Every project built.
    pub const SUCCESS: i32 = 0;
    /// At least one project failed.
    pub const BUILD_FAILED: i32 = 1;
    /// The run could not be carried out (thread pools, report output).
    pub const ERROR_GENERIC: i32 = 1;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
    /// Run cancelled by user (Ctrl+C).
    pub const ERROR_CANCELED: i32 = 130;
}
