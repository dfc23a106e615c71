//! Agent configuration.
//!
//! Plain string key/value pairs, snapshotted once from the process
//! environment into an explicit value that is passed to every component.
//! There is no config file format; operators set environment variables on
//! the target process before attaching.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Directly names the compiled-output directory, short-circuiting discovery
pub const CLASSES_ROOT_KEY: &str = "BYTESCOPE_CLASSES_ROOT";
/// A class known to belong to the target application, used for triangulation
pub const MARKER_CLASS_KEY: &str = "BYTESCOPE_MARKER_CLASS";
/// Root directory a packaged archive has been exploded into
pub const STORE_PATH_KEY: &str = "BYTESCOPE_STORE_PATH";
/// Overrides the archive-relative library directory
pub const JAR_LIB_PATH_KEY: &str = "BYTESCOPE_JAR_LIB_PATH";
/// Overrides the archive-relative classes directory
pub const JAR_CLASSES_PATH_KEY: &str = "BYTESCOPE_JAR_CLASSES_PATH";
/// Opt-in: a line with no exact entry resolves to the next recorded line
pub const LINE_FALLBACK_KEY: &str = "BYTESCOPE_LINE_FALLBACK";

/// Immutable snapshot of the configuration key/value pairs.
///
/// Two resolutions against the same snapshot and filesystem state produce the
/// same result; nothing re-reads the environment after construction.
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    properties: BTreeMap<String, String>,
}

impl AgentConfig {
    /// Snapshot the current process environment
    pub fn from_env() -> Self {
        Self {
            properties: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            properties: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw value for a key, `None` when absent or blank
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Operator-supplied compiled-output directory, if any
    pub fn classes_root(&self) -> Option<&str> {
        self.get(CLASSES_ROOT_KEY)
    }

    /// Marker class name (dotted or slash-separated), if configured
    pub fn marker_class(&self) -> Option<&str> {
        self.get(MARKER_CLASS_KEY)
    }

    /// Where a packaged archive is exploded; defaults under the home directory
    pub fn store_path(&self) -> PathBuf {
        match self.get(STORE_PATH_KEY) {
            Some(path) => PathBuf::from(path),
            None => {
                let home = self.get("HOME").unwrap_or(".");
                PathBuf::from(home).join(".bytescope").join("webapp")
            }
        }
    }

    pub fn jar_lib_override(&self) -> Option<&str> {
        self.get(JAR_LIB_PATH_KEY)
    }

    pub fn jar_classes_override(&self) -> Option<&str> {
        self.get(JAR_CLASSES_PATH_KEY)
    }

    /// Whether the nearest-later-line lookup is enabled (off by default)
    pub fn line_fallback(&self) -> bool {
        matches!(self.get(LINE_FALLBACK_KEY), Some("1" | "true" | "on"))
    }
}
