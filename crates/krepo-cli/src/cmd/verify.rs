//! `krepo verify`

use std::path::Path;

use anyhow::{Result, bail};
use crossterm::style::Stylize;
use krepo_core::catalog::{self, CATALOG_FILE, CHECKSUM_FILE};

/// Check `addons.xml` against `addons.xml.md5`.
pub fn verify(root: &Path) -> Result<()> {
    let verification = catalog::verify(root)?;
    if !verification.is_match() {
        bail!(
            "{CATALOG_FILE} does not match {CHECKSUM_FILE}: expected {}, found {}",
            verification.expected,
            verification.actual
        );
    }
    println!("{} {CATALOG_FILE} {}", "✓".green(), verification.actual.dark_grey());
    Ok(())
}
