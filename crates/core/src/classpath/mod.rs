//! Effective-classpath discovery.
//!
//! The target process never tells us where its compiled code lives; we
//! probe for it. Four strategies are tried in a fixed priority order, each a
//! read-only filesystem/config probe:
//!
//! 1. Explicit operator override
//! 2. Manifest attributes of an exploded packaged archive
//! 3. Triangulation from a marker class's code source
//! 4. Well-known web-server directory conventions
//!
//! An empty result is a valid outcome, not an error: callers treat it as
//! "unresolved" and surface [`ClassPathUnresolved`] at query time.
//!
//! [`ClassPathUnresolved`]: crate::error::BytescopeError::ClassPathUnresolved

mod convention;
mod manifest;

pub use manifest::ArchiveManifest;

use crate::config::AgentConfig;
use bytescope_api::HostHandle;
use indexmap::IndexSet;
use std::sync::Arc;
use tracing::debug;

/// The closed set of discovery strategies, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassPathStrategy {
    ExplicitOverride,
    ManifestDerived,
    MarkerClassDerived,
    ConventionProbe,
}

impl ClassPathStrategy {
    /// Fixed evaluation order
    pub const ALL: [ClassPathStrategy; 4] = [
        ClassPathStrategy::ExplicitOverride,
        ClassPathStrategy::ManifestDerived,
        ClassPathStrategy::MarkerClassDerived,
        ClassPathStrategy::ConventionProbe,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ClassPathStrategy::ExplicitOverride => "explicit-override",
            ClassPathStrategy::ManifestDerived => "manifest-derived",
            ClassPathStrategy::MarkerClassDerived => "marker-class-derived",
            ClassPathStrategy::ConventionProbe => "convention-probe",
        }
    }
}

/// Discovers the effective code search path of the target process
pub struct ClassPathResolver {
    config: AgentConfig,
    host: Option<Arc<dyn HostHandle>>,
}

impl ClassPathResolver {
    pub fn new(config: AgentConfig) -> Self {
        Self { config, host: None }
    }

    /// Attach the host capability handle, enabling marker-class triangulation
    pub fn with_host(mut self, host: Arc<dyn HostHandle>) -> Self {
        self.host = Some(host);
        self
    }

    /// First matching strategy wins.
    ///
    /// Returns an ordered, de-duplicated list; empty when nothing matched.
    pub fn resolve(&self) -> Vec<String> {
        for strategy in ClassPathStrategy::ALL {
            let paths = self.probe(strategy);
            if !paths.is_empty() {
                debug!(
                    strategy = strategy.name(),
                    count = paths.len(),
                    "class path resolved"
                );
                return dedup_ordered(paths);
            }
        }
        debug!("no class path strategy matched");
        Vec::new()
    }

    /// Union of every strategy's paths, in strategy order, de-duplicated
    pub fn resolve_union(&self) -> Vec<String> {
        let mut all = Vec::new();
        for strategy in ClassPathStrategy::ALL {
            all.extend(self.probe(strategy));
        }
        dedup_ordered(all)
    }

    /// Run a single strategy. Probes never fail; no match is an empty list.
    pub fn probe(&self, strategy: ClassPathStrategy) -> Vec<String> {
        match strategy {
            ClassPathStrategy::ExplicitOverride => self.explicit_override(),
            ClassPathStrategy::ManifestDerived => {
                manifest::derive_paths(&self.config.store_path(), &self.config)
            }
            ClassPathStrategy::MarkerClassDerived => self.marker_derived(),
            ClassPathStrategy::ConventionProbe => convention::probe(&self.config),
        }
    }

    fn explicit_override(&self) -> Vec<String> {
        match self.config.classes_root() {
            Some(root) => vec![root.to_string()],
            None => Vec::new(),
        }
    }

    /// Locate the already-loaded marker class and take its containing
    /// archive's parent directory as the library root, with the sibling
    /// `classes` directory as the compiled-output root.
    fn marker_derived(&self) -> Vec<String> {
        let Some(marker) = self.config.marker_class() else {
            return Vec::new();
        };
        let Some(host) = &self.host else {
            return Vec::new();
        };

        let internal_name = marker.replace('.', "/");
        let Some(code_source) = host.class_code_source(&internal_name) else {
            debug!(marker, "marker class has no known code source");
            return Vec::new();
        };

        if code_source.is_dir() {
            // The class was loaded straight from an output directory
            return vec![code_source.to_string_lossy().into_owned()];
        }

        let mut paths = Vec::new();
        if let Some(lib_root) = code_source.parent() {
            let classes_root = lib_root.parent().map(|base| base.join("classes"));
            if let Some(classes_root) = classes_root.filter(|p| p.is_dir()) {
                paths.push(classes_root.to_string_lossy().into_owned());
            }
            paths.push(lib_root.to_string_lossy().into_owned());
        }
        paths
    }
}

fn dedup_ordered(paths: Vec<String>) -> Vec<String> {
    paths.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}
