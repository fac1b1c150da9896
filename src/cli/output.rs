//! Shared CLI output helpers.
//!
//! Color scheme (respects NO_COLOR via `console`):
//! - Green: success
//! - Red: errors
//! - Cyan: paths, hints

use std::fmt::Display;

use console::style;

/// Print a success message with checkmark (green).
///
/// Example: `✓ wrote key to keys/app`
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

/// Print an error message to stderr (red).
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red(), msg);
}

/// Print a hint message (cyan).
pub fn hint(msg: &str) {
    eprintln!("{} {}", style("→").cyan(), style(msg).cyan());
}

/// Style a filesystem path.
pub fn path(p: impl Display) -> String {
    style(p).cyan().to_string()
}
