//! Progress reporting.
//!
//! Generation and ingestion report through [`Reporter`]; the CLI renders
//! it on the terminal.

use std::path::Path;

use krepo_schema::{AddonId, AddonVersion};

use crate::summary::SkipReason;

/// Progress sink for generation and ingestion.
pub trait Reporter: Send + Sync {
    /// A new phase of the run, e.g. "Scanning packages".
    fn section(&self, title: &str);

    /// A package directory contributed `entries` catalog entries.
    fn admitted(&self, dir: &str, id: &AddonId, version: &AddonVersion, entries: usize);

    /// A package directory was left out of the catalog.
    fn skipped(&self, dir: &str, reason: &SkipReason);

    /// A downloaded release asset was filed into the repository.
    fn filed(&self, asset: &str, dest: &Path);

    /// Progress detail worth showing the user.
    fn info(&self, msg: &str);

    /// A step finished (catalog written, descriptor packaged).
    fn success(&self, msg: &str);

    /// Something was left out but the run continues.
    fn warning(&self, msg: &str);

    /// A source or step failed.
    fn error(&self, msg: &str);

    /// Final line of a run: `count` items `action` in `elapsed_secs`.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn admitted(&self, dir: &str, id: &AddonId, version: &AddonVersion, entries: usize) {
        (**self).admitted(dir, id, version, entries);
    }
    fn skipped(&self, dir: &str, reason: &SkipReason) {
        (**self).skipped(dir, reason);
    }
    fn filed(&self, asset: &str, dest: &Path) {
        (**self).filed(asset, dest);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs);
    }
}

/// Discards everything. Used by `generate --json` and tests.
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn admitted(&self, _: &str, _: &AddonId, _: &AddonVersion, _: usize) {}
    fn skipped(&self, _: &str, _: &SkipReason) {}
    fn filed(&self, _: &str, _: &Path) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}
