//! Manifest-derived lib/classes roots for exploded packaged archives.
//!
//! A repackaged executable archive records where it keeps dependency jars
//! and application classes in its manifest (`Spring-Boot-Lib` /
//! `Spring-Boot-Classes`). When the archive has been exploded into a store
//! directory we read those attributes back; absent a manifest, the
//! conventional `BOOT-INF` pair applies. Dedicated config keys override both.

use crate::config::AgentConfig;
use std::fs;
use std::path::Path;
use tracing::debug;

const LIB_ATTRIBUTE: &str = "Spring-Boot-Lib";
const CLASSES_ATTRIBUTE: &str = "Spring-Boot-Classes";

const DEFAULT_LIB_PATH: &str = "BOOT-INF/lib";
const DEFAULT_CLASSES_PATH: &str = "BOOT-INF/classes";

/// Archive-relative lib/classes roots read from a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveManifest {
    pub lib_path: String,
    pub classes_path: String,
}

impl Default for ArchiveManifest {
    fn default() -> Self {
        Self {
            lib_path: DEFAULT_LIB_PATH.to_string(),
            classes_path: DEFAULT_CLASSES_PATH.to_string(),
        }
    }
}

impl ArchiveManifest {
    /// Scan an exploded-archive store root for manifest files and read the
    /// lib/classes attributes from the first one that declares both.
    pub fn discover(store_root: &Path) -> Self {
        let Ok(entries) = fs::read_dir(store_root) else {
            return Self::default();
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            if name != "MANIFEST.MF" && name != "MANIFEST.SF" {
                continue;
            }
            let attributes = read_manifest_attributes(&entry.path());
            let lib = attributes.iter().find(|(k, _)| k == LIB_ATTRIBUTE);
            let classes = attributes.iter().find(|(k, _)| k == CLASSES_ATTRIBUTE);
            if let (Some((_, lib)), Some((_, classes))) = (lib, classes) {
                debug!(%lib, %classes, "archive manifest declares code roots");
                return Self {
                    lib_path: lib.clone(),
                    classes_path: classes.clone(),
                };
            }
        }

        Self::default()
    }
}

/// Lib and classes roots for an exploded archive, in lookup order
/// (classes first). Empty when no archive store exists.
pub(crate) fn derive_paths(store_root: &Path, config: &AgentConfig) -> Vec<String> {
    if !store_root.is_dir() {
        return Vec::new();
    }

    let manifest = ArchiveManifest::discover(store_root);

    let classes = match config.jar_classes_override() {
        Some(path) => path.to_string(),
        None => join_relative(store_root, &manifest.classes_path),
    };
    let lib = match config.jar_lib_override() {
        Some(path) => path.to_string(),
        None => join_relative(store_root, &manifest.lib_path),
    };

    vec![classes, lib]
}

/// `key: value` pairs from a manifest file; malformed lines are skipped
fn read_manifest_attributes(path: &Path) -> Vec<(String, String)> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            let value = value.trim();
            (!key.is_empty() && !value.is_empty())
                .then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}

/// Manifest attributes may carry a leading slash; they are store-relative
fn join_relative(root: &Path, relative: &str) -> String {
    root.join(relative.trim_start_matches('/'))
        .to_string_lossy()
        .into_owned()
}
