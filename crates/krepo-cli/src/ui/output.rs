//! Console reporter.
//!
//! Everything the core reports goes to stdout with a two-space indent;
//! warnings and errors go to stderr. `quiet` keeps only the latter and the
//! final summary.

use std::path::Path;

use crossterm::style::Stylize;
use krepo_core::{Reporter, SkipReason};
use krepo_schema::{AddonId, AddonVersion};

use super::theme::Theme;

/// Reporter that prints to the terminal.
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
    quiet: bool,
}

impl Output {
    pub fn quiet(quiet: bool) -> Self {
        Self {
            quiet,
            ..Self::default()
        }
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        if !self.quiet {
            println!();
            println!("{}", title.bold());
        }
    }

    fn admitted(&self, dir: &str, id: &AddonId, version: &AddonVersion, entries: usize) {
        if self.quiet {
            return;
        }
        let columns = self.theme.columns;
        let name = format!("{dir: <width$}", width = columns.dir);
        let version = format!("{: <width$}", version.as_str(), width = columns.version);
        let detail = match (entries, id.as_str() == dir) {
            (1, true) => String::new(),
            (1, false) => id.to_string(),
            (n, true) => format!("{n} platforms"),
            (n, false) => format!("{id}, {n} platforms"),
        };
        println!(
            "  {} {name} {} {}",
            self.theme.icons.ok.green(),
            version.dark_grey(),
            detail.dark_grey()
        );
    }

    fn skipped(&self, dir: &str, reason: &SkipReason) {
        if self.quiet || *reason == SkipReason::SelfDescriptor {
            return;
        }
        let name = format!("{dir: <width$}", width = self.theme.columns.dir);
        println!(
            "  {} {name} {}",
            self.theme.icons.left_out.yellow(),
            reason.to_string().yellow()
        );
    }

    fn filed(&self, asset: &str, dest: &Path) {
        if !self.quiet {
            println!(
                "  {} {asset} {} {}",
                self.theme.icons.ok.green(),
                "->".dark_grey(),
                dest.display()
            );
        }
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", self.theme.icons.note.cyan());
        }
    }

    fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {}", self.theme.icons.ok.green(), msg.green());
        }
    }

    fn warning(&self, msg: &str) {
        eprintln!("  {} {}", self.theme.icons.caution.yellow(), msg.yellow());
    }

    fn error(&self, msg: &str) {
        eprintln!("  {} {}", self.theme.icons.failed.red(), msg.red());
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        println!();
        println!(
            "{} {count} {action} in {elapsed_secs:.1}s",
            self.theme.icons.ok.green()
        );
    }
}
