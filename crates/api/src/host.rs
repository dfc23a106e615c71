//! The host capability handle.
//!
//! The engine never owns the target process; everything it may do to the
//! runtime flows through this trait, granted once by the external attaching
//! mechanism. Implementations wrap whatever instrumentation surface the host
//! exposes (for a JVM, the `Instrumentation` handle of an agent).

use crate::models::ClassId;
use std::path::PathBuf;

/// A class currently loaded in the target process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedClass {
    pub id: ClassId,
    /// Internal (slash-separated) name, e.g. `com/acme/Foo`
    pub internal_name: String,
}

impl LoadedClass {
    pub fn new(id: ClassId, internal_name: impl Into<String>) -> Self {
        Self {
            id,
            internal_name: internal_name.into(),
        }
    }
}

/// Live, host-granted ability to observe classes in the target process.
///
/// All methods are snapshots; the set of loaded classes may change between
/// calls. Implementations must be callable from any thread.
pub trait HostHandle: Send + Sync {
    /// Enumerate every class currently loaded in the target process
    fn loaded_classes(&self) -> Vec<LoadedClass>;

    /// Liveness oracle: is this class still loaded?
    ///
    /// Used to sweep caches keyed by [`ClassId`] so they never outlive the
    /// classes they describe.
    fn is_class_live(&self, class: ClassId) -> bool {
        self.loaded_classes().iter().any(|c| c.id == class)
    }

    /// On-disk or archive location the named class was defined from, if the
    /// host can tell. `internal_name` is slash-separated.
    fn class_code_source(&self, internal_name: &str) -> Option<PathBuf>;
}
