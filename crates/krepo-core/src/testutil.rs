//! Fixtures shared by unit tests.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Write a zip at `path` with the given `(name, bytes)` entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// A well-formed `addon.xml`; `extra` goes inside the metadata extension.
pub fn addon_xml(id: &str, version: &str, extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<addon id="{id}" version="{version}" name="{id} add-on" provider-name="tests">
    <requires>
        <import addon="xbmc.python" version="3.0.0"/>
    </requires>
    <extension point="xbmc.python.pluginsource" library="default.py"/>
    <extension point="xbmc.addon.metadata">
        <summary lang="en_GB">Test add-on</summary>{extra}
    </extension>
</addon>
"#
    )
}

/// A package directory under `root` holding one archive per `(file, id, version)`.
pub fn package_with_archives(root: &Path, dir: &str, archives: &[(&str, &str, &str)]) {
    for (file, id, version) in archives {
        let xml = addon_xml(id, version, "");
        write_zip(
            &root.join(dir).join(file),
            &[(format!("{id}/addon.xml").as_str(), xml.as_bytes())],
        );
    }
}
