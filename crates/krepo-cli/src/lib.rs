//! krepo - Kodi add-on repository builder
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! Builds a Kodi repository from a directory of add-on packages.
//!
//! # Repository Layout
//!
//! ```text
//! <root>/
//! ├── addon.xml                 # the repository add-on itself
//! ├── sources.txt               # release sources for `krepo update`
//! ├── krepo.toml                # optional configuration
//! ├── plugin.video.foo/
//! │   └── plugin.video.foo-1.2.0.zip
//! ├── inputstream.bar/
//! │   ├── inputstream.bar-2.0.0-linux-x86_64.zip
//! │   └── inputstream.bar-2.0.0-windows-x86_64.zip
//! ├── addons.xml                # generated
//! ├── addons.xml.md5            # generated
//! └── index.html                # generated
//! ```

pub mod cmd;
pub mod ui;

pub use krepo_core::USER_AGENT;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "krepo")]
#[command(author, version = env!("KREPO_VERSION"), about = "krepo - Kodi add-on repository builder")]
pub struct Cli {
    /// Repository root
    #[arg(long, short = 'C', global = true, env = "KREPO_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Regenerate addons.xml, addons.xml.md5 and index.html
    Generate {
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pull the latest releases listed in the source list
    Update {
        /// Source list (defaults to `sources_file` from krepo.toml)
        #[arg(long, short = 's')]
        sources: Option<PathBuf>,
        /// GitHub token for API requests
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Regenerate the catalog afterwards
        #[arg(long, short = 'g')]
        generate: bool,
    },
    /// Check addons.xml against addons.xml.md5
    Verify,
    /// Show the platform classification table
    Platforms,
}

impl Cli {
    /// Default tracing directive for the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}
