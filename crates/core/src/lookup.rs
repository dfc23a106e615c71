//! Source-location and signature lookup façade.
//!
//! Composes the resource index and the line-table decoder to answer the two
//! queries this engine exists for. Line tables are memoized per compiled
//! resource: built at most once, shared thereafter.

use crate::error::{BytescopeError, Result};
use crate::index::ResourceIndex;
use crate::linemap::LineTable;
use bytescope_api::{ClassId, HostHandle, ResolvedLocation, SourceLocation};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Source extensions that compile to the class container format
const SOURCE_EXTENSIONS: [&str; 2] = [".java", ".kt"];

pub struct LocationResolver {
    index: Arc<ResourceIndex>,
    host: Arc<dyn HostHandle>,
    tables: DashMap<String, Arc<LineTable>>,
    line_fallback: bool,
}

impl LocationResolver {
    pub fn new(index: Arc<ResourceIndex>, host: Arc<dyn HostHandle>) -> Self {
        Self {
            index,
            host,
            tables: DashMap::new(),
            line_fallback: false,
        }
    }

    /// Enable the nearest-later-line lookup. Off by default; exact match is
    /// the contract.
    pub fn with_line_fallback(mut self, enabled: bool) -> Self {
        self.line_fallback = enabled;
        self
    }

    pub fn resolve(&self, query: &SourceLocation) -> Result<ResolvedLocation> {
        self.resolve_source_location(&query.source_file, query.line)
    }

    /// Map `source file, line` to the compiled method location declaring it.
    ///
    /// Only the single textually-matching top-level class is considered;
    /// source files that compile into multiple classes are a named
    /// limitation of this path.
    pub fn resolve_source_location(&self, source_file: &str, line: u32) -> Result<ResolvedLocation> {
        let resource = class_resource_for(source_file)
            .ok_or_else(|| BytescopeError::UnsupportedSourceFile(source_file.to_string()))?;

        if self.index.is_empty() {
            return Err(BytescopeError::ClassPathUnresolved);
        }

        let table = self.line_table(&resource)?;
        let location = if self.line_fallback {
            table.at_or_following(line)?
        } else {
            table.at(line)?
        };
        Ok(location.clone())
    }

    /// Decode a type signature and scan the host's loaded classes for it.
    ///
    /// Deliberately a linear scan: correct, and fast enough for a
    /// diagnostic path that runs once per instrumentation request.
    pub fn signature_to_class(&self, signature: &str) -> Result<ClassId> {
        let internal_name = decode_signature(signature);
        self.host
            .loaded_classes()
            .into_iter()
            .find(|class| class.internal_name == internal_name)
            .map(|class| class.id)
            .ok_or_else(|| BytescopeError::ClassNotLoaded(signature.to_string()))
    }

    /// Build or reuse the line table for a compiled resource
    fn line_table(&self, resource: &str) -> Result<Arc<LineTable>> {
        let entry = self
            .tables
            .entry(resource.to_string())
            .or_try_insert_with(|| {
                let bytes = self.index.get(resource)?;
                debug!(resource, size = bytes.len(), "building line table");
                LineTable::from_class_bytes([bytes]).map(Arc::new)
            })?;
        Ok(Arc::clone(entry.value()))
    }
}

/// Derive the compiled-class resource name from a source file path
fn class_resource_for(source_file: &str) -> Option<String> {
    SOURCE_EXTENSIONS.iter().find_map(|extension| {
        source_file
            .strip_suffix(extension)
            .map(|stem| format!("{stem}.class"))
    })
}

/// `Lcom/acme/Foo;` -> `com/acme/Foo`; dotted and internal names pass
/// through normalized
fn decode_signature(signature: &str) -> String {
    let inner = signature
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
        .unwrap_or(signature);
    inner.replace('.', "/")
}
