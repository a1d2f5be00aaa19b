//! `addon.xml` normalization.
//!
//! Metadata from the wild is not always well-formed, so every document is
//! read twice over: a structured parse when possible and a textual fallback
//! when not. Either way the result carries the identity, version and the
//! asset list; only a parsed document can be rewritten structurally.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use krepo_schema::{AddonId, AddonVersion, METADATA_POINT};
use regex::Regex;
use xmltree::{Element, EmitterConfig, XMLNode};

/// Assets every add-on is assumed to ship, declared or not.
pub const DEFAULT_ASSETS: [&str; 4] = ["icon.png", "fanart.jpg", "icon.gif", "fanart.png"];

static ASSETS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<assets>(.*?)</assets>").expect("valid regex"));

// The closing tag is compared in code; the regex crate has no backreferences.
static ASSET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>/\s]+)>([^<]+)</([^>]+)>").expect("valid regex"));

// Quoted values may contain `>`.
static ADDON_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<addon\b((?:[^>"]|"[^"]*")*)>"#).expect("valid regex")
});

static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:^|\s)([\w.:-]+)\s*=\s*"([^"]*)""#).expect("valid regex"));

/// A normalized metadata document.
#[derive(Debug, Clone)]
pub struct AddonMetadata {
    id: Option<AddonId>,
    version: Option<AddonVersion>,
    name: Option<String>,
    assets: BTreeSet<String>,
    text: String,
    tree: Option<Element>,
}

impl AddonMetadata {
    /// Normalize raw `addon.xml` text. Never fails; missing fields are `None`.
    pub fn normalize(text: &str) -> Self {
        let mut assets: BTreeSet<String> = DEFAULT_ASSETS.iter().map(|s| (*s).to_string()).collect();

        match parse_tree(text) {
            Some(tree) => {
                assets.extend(tree_assets(&tree));
                let attr = |key: &str| tree.attributes.get(key).cloned();
                Self {
                    id: attr("id").map(AddonId::new),
                    version: attr("version").map(AddonVersion::new),
                    name: attr("name"),
                    assets,
                    text: text.to_string(),
                    tree: Some(tree),
                }
            }
            None => {
                tracing::debug!("Metadata did not parse, using textual fallback");
                assets.extend(text_assets(text));

                let find = |key: &str| addon_attribute(text, key).map(str::to_string);

                Self {
                    id: find("id").map(AddonId::new),
                    version: find("version").map(AddonVersion::new),
                    name: find("name"),
                    assets,
                    text: text.to_string(),
                    tree: None,
                }
            }
        }
    }

    /// Identity and version, if both resolved.
    pub fn identity(&self) -> Option<(&AddonId, &AddonVersion)> {
        Some((self.id.as_ref()?, self.version.as_ref()?))
    }

    /// Identity, if resolved.
    pub fn id(&self) -> Option<&AddonId> {
        self.id.as_ref()
    }

    /// Version, if resolved.
    pub fn version(&self) -> Option<&AddonVersion> {
        self.version.as_ref()
    }

    /// Display name from the `name` attribute.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared assets plus [`DEFAULT_ASSETS`], sorted.
    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(String::as_str)
    }

    /// Whether the structured parse succeeded.
    pub fn is_parsed(&self) -> bool {
        self.tree.is_some()
    }

    /// The parsed element tree.
    pub fn tree(&self) -> Option<&Element> {
        self.tree.as_ref()
    }

    /// The raw document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The document as a catalog entry: unmodified, without declaration.
    pub fn entry_xml(&self) -> &str {
        strip_declaration(&self.text)
    }
}

/// Drop a leading `<?xml ...?>` declaration and surrounding whitespace.
pub fn strip_declaration(text: &str) -> &str {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    let body = match text.strip_prefix("<?xml") {
        Some(rest) => rest.find("?>").map_or(text, |end| &rest[end + 2..]),
        None => text,
    };
    body.trim()
}

/// Serialize an element without a declaration.
///
/// # Errors
///
/// Returns the emitter's error message if serialization fails.
pub fn write_element(element: &Element) -> Result<String, String> {
    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .perform_indent(true)
        .write_document_declaration(false);
    element
        .write_with_config(&mut buf, config)
        .map_err(|e| e.to_string())?;
    let text = String::from_utf8(buf).map_err(|e| e.to_string())?;
    Ok(strip_declaration(&text).to_string())
}

/// Value of an attribute on the opening `<addon>` tag, exactly as written.
///
/// Entities are not decoded. Empty values count as absent. A tag cut off
/// before its `>` is still searched.
pub(crate) fn addon_attribute<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    if let Some(range) = addon_attribute_range(text, key) {
        return Some(&text[range]);
    }
    let body = strip_declaration(text);
    if ADDON_TAG.is_match(body) {
        return None;
    }
    find_attribute(body, key).map(|range| &body[range])
}

/// Byte range in `text` of an attribute value on a complete `<addon>` tag.
pub(crate) fn addon_attribute_range(text: &str, key: &str) -> Option<Range<usize>> {
    let tag = ADDON_TAG.captures(text)?.get(1)?;
    let offset = tag.start();
    find_attribute(tag.as_str(), key).map(|range| offset + range.start..offset + range.end)
}

fn find_attribute(attributes: &str, key: &str) -> Option<Range<usize>> {
    ATTRIBUTE
        .captures_iter(attributes)
        .find(|caps| &caps[1] == key)
        .and_then(|caps| caps.get(2))
        .map(|value| value.range())
        .filter(|range| !range.is_empty())
}

/// Whether an element is the `xbmc.addon.metadata` extension.
pub(crate) fn is_metadata_extension(element: &Element) -> bool {
    element.name == "extension"
        && element
            .attributes
            .get("point")
            .is_some_and(|p| p == METADATA_POINT)
}

/// The first metadata extension directly under the root.
pub(crate) fn metadata_extension_mut(root: &mut Element) -> Option<&mut Element> {
    root.children.iter_mut().find_map(|node| match node {
        XMLNode::Element(el) if is_metadata_extension(el) => Some(el),
        _ => None,
    })
}

fn parse_tree(text: &str) -> Option<Element> {
    match Element::parse(text.as_bytes()) {
        Ok(tree) if tree.name == "addon" => Some(tree),
        Ok(tree) => {
            tracing::debug!("Unexpected metadata root <{}>", tree.name);
            None
        }
        Err(e) => {
            tracing::debug!("Metadata parse error: {e}");
            None
        }
    }
}

fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(XMLNode::as_element)
}

fn tree_assets(root: &Element) -> Vec<String> {
    child_elements(root)
        .filter(|el| is_metadata_extension(el))
        .flat_map(child_elements)
        .filter(|el| el.name == "assets")
        .flat_map(child_elements)
        .filter_map(|asset| asset.get_text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

fn text_assets(text: &str) -> Vec<String> {
    ASSETS_BLOCK
        .captures_iter(text)
        .flat_map(|block| {
            let inner = block.get(1).map_or("", |m| m.as_str());
            ASSET_TAG
                .captures_iter(inner)
                .filter(|caps| caps[1] == caps[3])
                .map(|caps| caps[2].trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|asset| !asset.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::addon_xml;

    #[test]
    fn test_parsed_document() {
        let xml = addon_xml(
            "plugin.video.foo",
            "1.2.3",
            "\n        <assets>\n            <icon>resources/icon.png</icon>\n            <screenshot> resources/shot1.jpg </screenshot>\n        </assets>",
        );
        let meta = AddonMetadata::normalize(&xml);

        assert!(meta.is_parsed());
        let (id, version) = meta.identity().unwrap();
        assert_eq!(id, "plugin.video.foo");
        assert_eq!(version, "1.2.3");
        assert_eq!(meta.name(), Some("plugin.video.foo add-on"));

        let assets: Vec<&str> = meta.assets().collect();
        assert!(assets.contains(&"resources/icon.png"));
        assert!(assets.contains(&"resources/shot1.jpg"));
        for default in DEFAULT_ASSETS {
            assert!(assets.contains(&default));
        }
    }

    #[test]
    fn test_missing_assets_yields_defaults() {
        let meta = AddonMetadata::normalize(&addon_xml("script.bar", "0.1", ""));
        let mut expected = DEFAULT_ASSETS.to_vec();
        expected.sort_unstable();
        assert_eq!(meta.assets().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_malformed_falls_back_to_text() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<addon id="plugin.broken" name="Broken & Co" version="3.0.1">
  <extension point="xbmc.addon.metadata">
    <assets>
      <icon>media/icon.png</icon>
      <fanart>media/fanart.jpg</fanart>
      <banner>half</bannerx>
    </assets>
  </extension>
</addon>"#;
        let meta = AddonMetadata::normalize(xml);

        assert!(!meta.is_parsed());
        let (id, version) = meta.identity().unwrap();
        assert_eq!(id, "plugin.broken");
        // the declaration's version must not win
        assert_eq!(version, "3.0.1");
        assert_eq!(meta.name(), Some("Broken & Co"));

        let assets: Vec<&str> = meta.assets().collect();
        assert!(assets.contains(&"media/icon.png"));
        assert!(assets.contains(&"media/fanart.jpg"));
        assert!(!assets.contains(&"half"));
    }

    #[test]
    fn test_fallback_reads_past_gt_in_quoted_value() {
        let xml = r#"<addon id="plugin.x" name="A > B" version="1.0.0">
  <broken></addon>"#;
        let meta = AddonMetadata::normalize(xml);

        assert!(!meta.is_parsed());
        let (id, version) = meta.identity().unwrap();
        assert_eq!(id, "plugin.x");
        assert_eq!(version, "1.0.0");
        assert_eq!(meta.name(), Some("A > B"));
    }

    #[test]
    fn test_addon_attribute_is_raw_and_exact() {
        let xml = r#"<?xml version="1.0"?>
<addon id="repo.x" provider-name="P" name="X &amp; Y" version="">"#;
        assert_eq!(addon_attribute(xml, "name"), Some("X &amp; Y"));
        assert_eq!(addon_attribute(xml, "provider-name"), Some("P"));
        assert_eq!(addon_attribute(xml, "version"), None);
        assert_eq!(addon_attribute(xml, "missing"), None);
    }

    #[test]
    fn test_unrecoverable_has_no_identity() {
        let meta = AddonMetadata::normalize("not xml at all");
        assert!(meta.identity().is_none());
        assert_eq!(meta.assets().count(), DEFAULT_ASSETS.len());

        let meta = AddonMetadata::normalize(r#"<addon id="only.id">"#);
        assert_eq!(meta.id().map(AddonId::as_str), Some("only.id"));
        assert!(meta.identity().is_none());
    }

    #[test]
    fn test_strip_declaration() {
        assert_eq!(
            strip_declaration("<?xml version=\"1.0\"?>\n<addon/>\n"),
            "<addon/>"
        );
        assert_eq!(strip_declaration("\u{feff}  <addon/>"), "<addon/>");
        assert_eq!(strip_declaration("<addon/>"), "<addon/>");
    }

    #[test]
    fn test_entry_xml_is_verbatim_body() {
        let xml = addon_xml("plugin.foo", "1.0", "");
        let meta = AddonMetadata::normalize(&xml);
        let entry = meta.entry_xml();
        assert!(entry.starts_with("<addon id=\"plugin.foo\""));
        assert!(entry.ends_with("</addon>"));
        assert!(!entry.contains("<?xml"));
    }

    #[test]
    fn test_write_element_round_trips_identity() {
        let meta = AddonMetadata::normalize(&addon_xml("plugin.foo", "1.0", ""));
        let written = write_element(meta.tree().unwrap()).unwrap();
        assert!(!written.contains("<?xml"));

        let reparsed = AddonMetadata::normalize(&written);
        assert!(reparsed.is_parsed());
        assert_eq!(reparsed.id().map(AddonId::as_str), Some("plugin.foo"));
    }
}
