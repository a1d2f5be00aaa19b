//! Repository directory traversal.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Package directories directly under `root`, sorted by name.
///
/// Hidden directories are skipped.
///
/// # Errors
///
/// Returns an error if the root cannot be read.
pub fn package_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)
        .with_context(|| format!("Failed to read {}", root.display()))?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .filter(|e| !is_hidden(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Names of the regular files directly inside `dir`, sorted.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut files: Vec<String> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_dirs_sorted_and_visible() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta", "alpha", ".git", "mid"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("addons.xml"), "").unwrap();

        let names: Vec<String> = package_dirs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_list_files_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.zip"), "").unwrap();
        fs::write(dir.path().join("a.zip"), "").unwrap();
        fs::create_dir(dir.path().join("resources")).unwrap();

        assert_eq!(list_files(dir.path()).unwrap(), ["a.zip", "b.zip"]);
    }
}
