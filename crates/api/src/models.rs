//! Value types crossing the engine boundary.
//!
//! Everything here is a plain, immutable value: queries going in
//! (`SourceLocation`), answers coming out (`ResolvedLocation`), and the
//! classified classpath entries the resource index is built from.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Opaque identity of a class loaded in the target process.
///
/// The host assigns ids; the engine never interprets them beyond equality.
/// Holding a `ClassId` does not keep the class alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassId(pub u64);

/// What kind of container a classpath entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassPathKind {
    /// Exploded directory of compiled classes
    Directory,
    /// Packaged archive (jar/war/zip/jmod, or an extensionless archive)
    Archive,
}

/// One entry of the effective classpath, classified once at index build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPathEntry {
    pub path: PathBuf,
    pub kind: ClassPathKind,
}

impl ClassPathEntry {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ClassPathKind::Directory,
        }
    }

    pub fn archive(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ClassPathKind::Archive,
        }
    }
}

/// Input query shape: a source file path plus a 1-based line number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Slash-separated source path, e.g. `com/acme/Foo.java`
    pub source_file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(source_file: impl Into<String>, line: u32) -> Self {
        Self {
            source_file: source_file.into(),
            line,
        }
    }
}

/// A resolved code location: the only structured value this engine emits.
///
/// `class_signature` uses the descriptor form (`Lcom/acme/Foo;`); the
/// method descriptor keeps the raw compiled form (`(I)V`). Downstream
/// transports serialize this however they need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub class_signature: String,
    pub line: u32,
    pub method_name: String,
    pub method_descriptor: String,
}
