//! Platform entry expansion.
//!
//! A binary add-on ships one archive per platform from one `addon.xml`.
//! Kodi needs one catalog entry per platform, each telling it which
//! platform the entry is for and where its archive lives relative to the
//! repository root.

use std::sync::LazyLock;

use krepo_schema::naming::{platform_fragment, stem};
use krepo_schema::{AddonId, AddonVersion, Platform};
use regex::Regex;
use xmltree::{Element, XMLNode};

use crate::catalog::CatalogEntry;
use crate::metadata::{AddonMetadata, metadata_extension_mut, strip_declaration, write_element};

static METADATA_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)(<extension\b[^>]*\bpoint="xbmc\.addon\.metadata"[^>]*>)(.*?)(</extension>)"#)
        .expect("valid regex")
});

static PLATFORM_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\s*<(?:platform|path)>.*?</(?:platform|path)>").expect("valid regex")
});

/// An archive built for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformArchive {
    /// Archive name inside the package directory.
    pub file_name: String,
    /// Platform its fragment resolves to.
    pub platform: Platform,
}

/// The archives of a package directory that are builds of `id` `version`
/// for a specific platform, in input order.
///
/// An archive qualifies only if its name classifies to a platform, has more
/// than two `-` separated parts, and reads exactly
/// `<id>-<version>-<fragment>.zip`. The platform recorded is the one the
/// fragment itself classifies to.
pub fn platform_archives<'a, I>(files: I, id: &str, version: &str) -> Vec<PlatformArchive>
where
    I: IntoIterator<Item = &'a str>,
{
    files
        .into_iter()
        .filter(|file| !Platform::classify(file).is_generic())
        .filter(|file| stem(file).split('-').count() > 2)
        .filter_map(|file| {
            let fragment = platform_fragment(file, id, version)?;
            let platform = Platform::classify(fragment);
            if platform.is_generic() {
                tracing::debug!("Fragment {fragment:?} of {file} names no platform");
                return None;
            }
            Some(PlatformArchive {
                file_name: file.to_string(),
                platform,
            })
        })
        .collect()
}

/// Catalog entries for a package directory.
///
/// One entry per platform archive, each with `<platform>` and `<path>`
/// injected into the metadata extension. Falls back to the single
/// unmodified entry when there are no platform archives or none of them
/// could be expanded. Returns nothing if the document has no identity.
pub fn expand(meta: &AddonMetadata, dir_name: &str, archives: &[PlatformArchive]) -> Vec<CatalogEntry> {
    let Some((id, version)) = meta.identity() else {
        return Vec::new();
    };

    let entries: Vec<CatalogEntry> = archives
        .iter()
        .filter_map(|archive| {
            let path = format!("{dir_name}/{}", archive.file_name);
            let xml = match meta.tree() {
                Some(tree) => inject_tree(tree, archive.platform, &path),
                None => inject_text(meta.text(), archive.platform, &path),
            };
            match xml {
                Some(xml) => Some(
                    CatalogEntry::new(id.clone(), version.clone(), &xml)
                        .with_platform(archive.platform, path),
                ),
                None => {
                    tracing::debug!("No metadata extension to expand for {}", archive.file_name);
                    None
                }
            }
        })
        .collect();

    if entries.is_empty() {
        return generic_entry(id, version, meta);
    }
    entries
}

fn generic_entry(id: &AddonId, version: &AddonVersion, meta: &AddonMetadata) -> Vec<CatalogEntry> {
    vec![CatalogEntry::new(id.clone(), version.clone(), meta.entry_xml())]
}

fn text_element(name: &str, text: String) -> XMLNode {
    let mut element = Element::new(name);
    element.children.push(XMLNode::Text(text));
    XMLNode::Element(element)
}

fn inject_tree(tree: &Element, platform: Platform, path: &str) -> Option<String> {
    let mut root = tree.clone();
    let extension = metadata_extension_mut(&mut root)?;

    extension.children.retain(|node| {
        !matches!(node, XMLNode::Element(el) if el.name == "platform" || el.name == "path")
    });
    extension
        .children
        .push(text_element("platform", platform.to_string()));
    extension.children.push(text_element("path", path.to_string()));

    match write_element(&root) {
        Ok(xml) => Some(xml),
        Err(e) => {
            tracing::warn!("Failed to serialize metadata for {path}: {e}");
            None
        }
    }
}

fn inject_text(text: &str, platform: Platform, path: &str) -> Option<String> {
    let body = strip_declaration(text);
    let caps = METADATA_BLOCK.captures(body)?;
    let (whole, open, inner, close) = (caps.get(0)?, &caps[1], &caps[2], &caps[3]);
    if open.ends_with("/>") {
        return None;
    }

    let inner = PLATFORM_TAGS.replace_all(inner, "");
    let inner = inner.trim_end();
    let block = format!(
        "{open}{inner}\n        <platform>{platform}</platform>\n        <path>{path}</path>\n    {close}"
    );

    Some(format!(
        "{}{block}{}",
        &body[..whole.start()],
        &body[whole.end()..]
    ))
}
