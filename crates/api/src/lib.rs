pub mod host;
pub mod models;

// Re-export commonly used types
pub use host::{HostHandle, LoadedClass};
pub use models::{ClassId, ClassPathEntry, ClassPathKind, ResolvedLocation, SourceLocation};
