//! `index.html` for installing the repository from the Kodi file manager.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use krepo_schema::naming::is_archive;

use crate::config::ListingConfig;

/// Listing page name.
pub const LISTING_FILE: &str = "index.html";

/// Width the archive name is padded to before its size.
const NAME_COLUMN: usize = 50;

/// A downloadable archive at the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedArchive {
    /// File name, also the link target.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// Archives directly under `root` whose name starts with `prefix`, sorted.
///
/// # Errors
///
/// Returns an error if the root cannot be read.
pub fn listed_archives(root: &Path, prefix: &str) -> Result<Vec<ListedArchive>> {
    let mut archives = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("Failed to read {}", root.display()))? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_archive(&name) || !name.starts_with(prefix) || !entry.file_type()?.is_file() {
            continue;
        }
        archives.push(ListedArchive {
            size: entry.metadata()?.len(),
            name,
        });
    }
    archives.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(archives)
}

/// The listing page for `archives`, in the given order.
pub fn render_listing(config: &ListingConfig, archives: &[ListedArchive]) -> String {
    let title = &config.title;
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>{title}</title>\n<meta charset=\"utf-8\">\n</head>\n<body>\n<h1>{title}</h1>\n<p>{}</p>\n<hr>\n<pre>\n",
        config.description
    );
    for archive in archives {
        let pad = NAME_COLUMN.saturating_sub(archive.name.chars().count());
        let _ = writeln!(
            html,
            "<a href=\"{name}\">{name}</a>{:pad$}{} bytes<br>",
            "",
            archive.size,
            name = archive.name,
        );
    }
    html.push_str("</pre>\n<hr>\n</body>\n</html>\n");
    html
}

/// Write `<root>/index.html` listing the archives starting with `prefix`.
///
/// # Errors
///
/// Returns an error if the root cannot be read or the page cannot be
/// written.
pub fn write_listing(root: &Path, config: &ListingConfig, prefix: &str) -> Result<PathBuf> {
    let archives = listed_archives(root, prefix)?;
    let path = root.join(LISTING_FILE);
    fs::write(&path, render_listing(config, &archives))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote {} ({} archives)", path.display(), archives.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_pads_to_column() {
        let html = render_listing(
            &ListingConfig::default(),
            &[ListedArchive {
                name: "repository.x-1.0.zip".to_string(),
                size: 1234,
            }],
        );
        let line = html
            .lines()
            .find(|l| l.starts_with("<a href"))
            .unwrap();
        let name = "repository.x-1.0.zip";
        assert_eq!(
            line,
            format!("<a href=\"{name}\">{name}</a>{}1234 bytes<br>", " ".repeat(50 - name.len()))
        );
        assert!(html.contains("<title>Kodi Add-on Repository</title>"));
    }

    #[test]
    fn test_long_names_are_not_padded() {
        let name = "x".repeat(60);
        let html = render_listing(
            &ListingConfig::default(),
            &[ListedArchive {
                name: name.clone(),
                size: 1,
            }],
        );
        assert!(html.contains(&format!("{name}</a>1 bytes<br>")));
    }

    #[test]
    fn test_write_lists_prefixed_archives_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("repository.x.ghproxy-1.0.zip"), b"12").unwrap();
        fs::write(root.join("repository.x-1.0.zip"), b"1").unwrap();
        fs::write(root.join("plugin.y-1.0.zip"), b"1").unwrap();
        fs::write(root.join("repository.x.txt"), b"1").unwrap();

        let path = write_listing(root, &ListingConfig::default(), "repository.x").unwrap();
        let html = fs::read_to_string(path).unwrap();

        let first = html.find("repository.x-1.0.zip").unwrap();
        let second = html.find("repository.x.ghproxy-1.0.zip").unwrap();
        assert!(first < second);
        assert!(!html.contains("plugin.y"));
        assert!(!html.contains("repository.x.txt"));
    }
}
