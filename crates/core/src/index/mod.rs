//! Resource index over a resolved classpath.
//!
//! `build` classifies each path entry into a backing source and is total
//! over a partially-broken classpath: unreadable or missing entries are
//! logged and skipped, never aborting construction. A built index is
//! immutable and safe for unsynchronized concurrent reads.

mod source;

pub use source::{ArchiveSource, DirectorySource, RuntimeImageSource};

use crate::error::{BytescopeError, Result};
use bytescope_api::ClassPathEntry;
use indexmap::IndexSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Archive extensions recognized without sniffing the file contents
const ARCHIVE_EXTENSIONS: [&str; 4] = ["jar", "war", "zip", "jmod"];

enum ResourceSource {
    Directory(DirectorySource),
    Archive(ArchiveSource),
    RuntimeImage(RuntimeImageSource),
}

impl ResourceSource {
    fn contains(&self, resource: &str) -> bool {
        match self {
            ResourceSource::Directory(s) => s.contains(resource),
            ResourceSource::Archive(s) => s.contains(resource),
            ResourceSource::RuntimeImage(s) => s.contains(resource),
        }
    }

    fn read(&self, resource: &str) -> Result<Vec<u8>> {
        match self {
            ResourceSource::Directory(s) => s.read(resource),
            ResourceSource::Archive(s) => s.read(resource),
            ResourceSource::RuntimeImage(s) => s.read(resource),
        }
    }
}

/// Queryable index of every resource reachable from a classpath
pub struct ResourceIndex {
    sources: Vec<ResourceSource>,
    entries: Vec<ClassPathEntry>,
}

impl ResourceIndex {
    /// Build an index from resolved classpath entries.
    ///
    /// Never fails: every unusable entry is skipped with a diagnostic so one
    /// bad path cannot take down the whole index.
    pub fn build(paths: &[String]) -> Self {
        let mut sources = Vec::new();
        let mut entries = Vec::new();

        for raw in paths {
            let path = Path::new(raw);

            if path.is_dir() {
                sources.push(ResourceSource::Directory(DirectorySource::new(
                    path.to_path_buf(),
                )));
                entries.push(ClassPathEntry::directory(path));
                continue;
            }

            if !path.is_file() {
                warn!(path = %raw, "skipping missing classpath entry");
                continue;
            }

            match open_file_source(path) {
                Ok(Some(src)) => {
                    sources.push(src);
                    entries.push(ClassPathEntry::archive(path));
                }
                Ok(None) => {
                    warn!(path = %raw, "skipping classpath entry with unknown format");
                }
                Err(e) => {
                    warn!(path = %raw, error = %e, "skipping unreadable classpath entry");
                }
            }
        }

        debug!(
            sources = sources.len(),
            skipped = paths.len() - sources.len(),
            "resource index built"
        );

        Self { sources, entries }
    }

    /// Bytes of a named resource, searching sources in classpath order
    pub fn get(&self, resource: &str) -> Result<Vec<u8>> {
        for source in &self.sources {
            if source.contains(resource) {
                return source.read(resource);
            }
        }
        Err(BytescopeError::ResourceNotFound(resource.to_string()))
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.sources.iter().any(|s| s.contains(resource))
    }

    /// The classified entries this index was built from
    pub fn entries(&self) -> &[ClassPathEntry] {
        &self.entries
    }

    /// True when no classpath entry survived construction
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Every resource name reachable from this index, de-duplicated in
    /// classpath order (shadowed duplicates appear once)
    pub fn resource_names(&self) -> Vec<String> {
        let mut names = IndexSet::new();
        for source in &self.sources {
            match source {
                ResourceSource::Directory(s) => names.extend(s.names()),
                ResourceSource::Archive(s) => names.extend(s.names().iter().cloned()),
                ResourceSource::RuntimeImage(s) => {
                    names.extend(s.names().map(str::to_string));
                }
            }
        }
        names.into_iter().collect()
    }
}

/// Classify a file entry: recognized archive extension first, then the
/// runtime-image file name, then magic bytes for extensionless archives.
fn open_file_source(path: &Path) -> Result<Option<ResourceSource>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ARCHIVE_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(Some(ResourceSource::Archive(ArchiveSource::open(path)?)));
    }

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if file_name == "modules" {
        return Ok(Some(ResourceSource::RuntimeImage(RuntimeImageSource::open(
            path,
        )?)));
    }

    let mut file = File::open(path)?;
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() {
        return Ok(None);
    }

    match magic {
        // ZIP: PK\x03\x04, PK\x05\x06 (empty) or PK\x07\x08 (spanned)
        [0x50, 0x4B, _, _] => {
            drop(file);
            Ok(Some(ResourceSource::Archive(ArchiveSource::open(path)?)))
        }
        // JImage magic, either endianness
        [0xCA, 0xFE, 0xDA, 0xDA] | [0xDA, 0xDA, 0xFE, 0xCA] => {
            drop(file);
            Ok(Some(ResourceSource::RuntimeImage(RuntimeImageSource::open(
                path,
            )?)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytescope_api::ClassPathKind;
    use std::io::Write;

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, bytes) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_directory_lookup_returns_exact_bytes() {
        let temp = tempfile::tempdir().unwrap();
        let class_file = temp.path().join("a/b/C.class");
        std::fs::create_dir_all(class_file.parent().unwrap()).unwrap();
        std::fs::write(&class_file, [1, 2, 3, 4]).unwrap();

        let index = ResourceIndex::build(&[temp.path().to_string_lossy().into_owned()]);

        assert_eq!(index.get("a/b/C.class").unwrap(), std::fs::read(&class_file).unwrap());
        assert!(matches!(
            index.get("a/b/Missing.class"),
            Err(BytescopeError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_build_skips_broken_entries() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("classes");
        std::fs::create_dir_all(&good).unwrap();
        std::fs::write(good.join("A.class"), [0xCA]).unwrap();

        let bogus = temp.path().join("corrupt.jar");
        std::fs::write(&bogus, b"not actually a zip").unwrap();

        let index = ResourceIndex::build(&[
            good.to_string_lossy().into_owned(),
            bogus.to_string_lossy().into_owned(),
            "/does/not/exist".to_string(),
        ]);

        assert_eq!(index.entries().len(), 1);
        assert_eq!(index.get("A.class").unwrap(), vec![0xCA]);
    }

    #[test]
    fn test_extensionless_archive_is_recognized() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("app");
        write_jar(&archive, &[("com/acme/Foo.class", &[9, 9])]);

        let index = ResourceIndex::build(&[archive.to_string_lossy().into_owned()]);

        assert_eq!(index.entries().len(), 1);
        assert_eq!(index.entries()[0].kind, ClassPathKind::Archive);
        assert_eq!(index.get("com/acme/Foo.class").unwrap(), vec![9, 9]);
    }

    #[test]
    fn test_classpath_order_shadows_duplicates() {
        let temp = tempfile::tempdir().unwrap();
        let first = temp.path().join("first.jar");
        let second = temp.path().join("second.jar");
        write_jar(&first, &[("dup.class", &[1])]);
        write_jar(&second, &[("dup.class", &[2])]);

        let index = ResourceIndex::build(&[
            first.to_string_lossy().into_owned(),
            second.to_string_lossy().into_owned(),
        ]);

        assert_eq!(index.get("dup.class").unwrap(), vec![1]);
        assert_eq!(index.resource_names(), vec!["dup.class".to_string()]);
    }

    #[test]
    fn test_empty_index() {
        let index = ResourceIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.get("anything").is_err());
    }
}
