//! Backing sources for indexed resources.
//!
//! A source answers two questions: does it contain a named resource, and
//! what are that resource's bytes. Directory sources resolve by direct path
//! join; archive and runtime-image sources pre-index their entry names at
//! construction and re-open the backing file per fetch, so a built source
//! carries no open handles and no interior mutability.

use crate::error::{BytescopeError, Result};
use ristretto_jimage::Image;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Filesystem-directory source: lookup is a path join plus a read
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn contains(&self, resource: &str) -> bool {
        match sanitize(resource) {
            Some(relative) => self.root.join(relative).is_file(),
            None => false,
        }
    }

    pub fn read(&self, resource: &str) -> Result<Vec<u8>> {
        let relative =
            sanitize(resource).ok_or_else(|| BytescopeError::ResourceNotFound(resource.into()))?;
        std::fs::read(self.root.join(relative))
            .map_err(|_| BytescopeError::ResourceNotFound(resource.into()))
    }

    pub fn names(&self) -> Vec<String> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.root)
                    .ok()
                    .map(|relative| relative.to_string_lossy().replace('\\', "/"))
            })
            .collect()
    }
}

/// Zip-format archive source (jar/war/zip/jmod, with or without extension)
#[derive(Debug)]
pub struct ArchiveSource {
    path: PathBuf,
    entries: Vec<String>,
}

impl ArchiveSource {
    /// Index the archive's entry names. Fails when the file is not readable
    /// as a zip archive; callers skip such entries with a diagnostic.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)
            .map_err(|e| BytescopeError::Internal(format!("{}: {e}", path.display())))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| BytescopeError::Internal(format!("{}: {e}", path.display())))?;
            let name = entry.name();
            if !name.ends_with('/') {
                entries.push(name.to_string());
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.entries.iter().any(|name| name == resource)
    }

    pub fn read(&self, resource: &str) -> Result<Vec<u8>> {
        let not_found = || BytescopeError::ResourceNotFound(resource.into());

        let file = File::open(&self.path).map_err(|_| not_found())?;
        let mut archive = ZipArchive::new(file).map_err(|_| not_found())?;
        let mut entry = archive.by_name(resource).map_err(|_| not_found())?;

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes).map_err(|_| not_found())?;
        Ok(bytes)
    }

    pub fn names(&self) -> &[String] {
        &self.entries
    }
}

/// Runtime-image (`lib/modules`) source.
///
/// Image entry names carry a module prefix (`/java.base/java/lang/...`);
/// lookups use the module-less resource path, so both forms are indexed.
#[derive(Debug)]
pub struct RuntimeImageSource {
    path: PathBuf,
    // resource path (with and without module prefix) -> full image entry name
    entries: HashMap<String, String>,
}

impl RuntimeImageSource {
    pub fn open(path: &Path) -> Result<Self> {
        let image = Image::from_file(path)
            .map_err(|e| BytescopeError::Internal(format!("{}: {e}", path.display())))?;

        let mut entries = HashMap::new();
        for resource in image.iter().flatten() {
            let full = resource.name().to_string();
            let trimmed = full.trim_start_matches('/').to_string();
            if let Some((_module, rest)) = trimmed.split_once('/') {
                entries.entry(rest.to_string()).or_insert_with(|| full.clone());
            }
            entries.entry(trimmed).or_insert(full);
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.entries.contains_key(resource)
    }

    pub fn read(&self, resource: &str) -> Result<Vec<u8>> {
        let not_found = || BytescopeError::ResourceNotFound(resource.into());
        let full = self.entries.get(resource).ok_or_else(not_found)?;

        let image = Image::from_file(&self.path).map_err(|_| not_found())?;
        for entry in image.iter().flatten() {
            if entry.name() == full.as_str() {
                return Ok(entry.data().to_vec());
            }
        }
        Err(not_found())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Reject lookups that would escape the source root
fn sanitize(resource: &str) -> Option<&Path> {
    let relative = Path::new(resource);
    let escapes = relative.is_absolute()
        || relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    (!escapes).then_some(relative)
}
