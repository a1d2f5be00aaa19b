//! Embeds the release tag in `krepo --version`.
//!
//! Falls back to the crate version outside a git checkout (e.g. a packaged
//! source tarball).

use std::path::Path;
use std::process::Command;

fn git_version(workspace: &Path) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["describe", "--tags", "--always", "--dirty=-dev"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let described = String::from_utf8(output.stdout).ok()?;
    let version = described.trim().trim_start_matches('v');
    (!version.is_empty()).then(|| version.to_string())
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default();
    let workspace = Path::new(&manifest_dir).join("../..");
    println!("cargo:rerun-if-changed={}", workspace.join(".git/HEAD").display());

    let version = git_version(&workspace).unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
    println!("cargo:rustc-env=KREPO_VERSION={version}");
}
