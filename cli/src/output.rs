//! Status lines for CLI commands
//!
//! Reports own stdout, so status goes to stderr.

use colored::Colorize;

/// Print a failed command with its full cause chain
pub fn error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "✗".red().bold(), err);
}

/// Print warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}
