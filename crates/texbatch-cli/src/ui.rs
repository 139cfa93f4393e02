//! UI helpers for CLI display.

use console::style;

/// Severity of a status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

/// Check if color output is disabled via `NO_COLOR` env var.
#[must_use]
pub fn is_color_disabled() -> bool {
    std::env::var_os("NO_COLOR").is_some()
}

/// Whether stdout output should be styled.
#[must_use]
pub fn stdout_color() -> bool {
    !is_color_disabled() && console::colors_enabled()
}

/// Bracketed status tag such as `[OK]`, styled by tone when `color` is set.
#[must_use]
pub fn tag(label: &str, tone: Tone, color: bool) -> String {
    let text = format!("[{label}]");
    if !color {
        return text;
    }
    let styled = match tone {
        Tone::Info => style(text).cyan(),
        Tone::Success => style(text).green(),
        Tone::Warning => style(text).yellow(),
        Tone::Error => style(text).red(),
    };
    styled.bold().force_styling(true).to_string()
}

/// Section header line.
#[must_use]
pub fn header(text: &str, color: bool) -> String {
    let line = format!("=== {text} ===");
    if color {
        style(line).bold().cyan().force_styling(true).to_string()
    } else {
        line
    }
}

/// Print an error message to stderr.
pub fn print_error(text: &str) {
    if is_color_disabled() || !console::colors_enabled_stderr() {
        eprintln!("[ERROR] {text}");
    } else {
        eprintln!("{} {text}", style("[ERROR]").red().bold().for_stderr());
    }
}
