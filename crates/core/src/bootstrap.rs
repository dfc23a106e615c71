//! Attach lifecycle.
//!
//! An external attacher hands us the process id and the host capability
//! handle (`init`), then asks for the component graph to be built (`bind`).
//! `bind` must be idempotent under concurrent invocation: whichever caller
//! wins the compare-and-set performs the one-time construction and
//! publishes the shared [`DebugContext`]; everyone else no-ops. Publication
//! through a once-cell gives later readers a happens-before edge on
//! everything the winner built. `BOUND` is terminal; there is no un-bind.

use crate::cache::ClassByteCache;
use crate::classpath::ClassPathResolver;
use crate::config::AgentConfig;
use crate::error::{BytescopeError, Result};
use crate::index::ResourceIndex;
use crate::lookup::LocationResolver;
use bytescope_api::{ClassId, HostHandle};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Where the bootstrap is in its once-only lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    Initialized,
    Bound,
}

/// Everything downstream diagnostic modules pull on demand
pub struct DebugContext {
    pid: u32,
    host: Arc<dyn HostHandle>,
    class_path: Vec<String>,
    index: Arc<ResourceIndex>,
    resolver: LocationResolver,
    byte_cache: ClassByteCache,
    transformed: Mutex<HashSet<ClassId>>,
}

impl DebugContext {
    /// Resolve the classpath, build the resource index, and wire the
    /// location resolver over them
    pub fn build(pid: u32, host: Arc<dyn HostHandle>, config: AgentConfig) -> Self {
        let class_path = ClassPathResolver::new(config.clone())
            .with_host(Arc::clone(&host))
            .resolve();
        if class_path.is_empty() {
            warn!(pid, "class path unresolved; location queries will fail until configured");
        }

        let index = Arc::new(ResourceIndex::build(&class_path));
        let resolver = LocationResolver::new(Arc::clone(&index), Arc::clone(&host))
            .with_line_fallback(config.line_fallback());

        info!(pid, entries = class_path.len(), "diagnostic context built");

        Self {
            pid,
            host,
            class_path,
            index,
            resolver,
            byte_cache: ClassByteCache::new(),
            transformed: Mutex::new(HashSet::new()),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn host(&self) -> &Arc<dyn HostHandle> {
        &self.host
    }

    /// The resolved effective classpath; empty means unresolved
    pub fn class_path(&self) -> &[String] {
        &self.class_path
    }

    pub fn index(&self) -> &Arc<ResourceIndex> {
        &self.index
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn byte_cache(&self) -> &ClassByteCache {
        &self.byte_cache
    }

    /// Remember that a class has been retransformed, so detach can restore it
    pub fn record_transformed(&self, class: ClassId) {
        let mut transformed = self
            .transformed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        transformed.insert(class);
    }

    pub fn transformed_classes(&self) -> Vec<ClassId> {
        let transformed = self
            .transformed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        transformed.iter().copied().collect()
    }
}

struct AttachTarget {
    pid: u32,
    host: Arc<dyn HostHandle>,
}

/// Once-only lifecycle entry point: `init(pid, handle)` then `bind()`
pub struct AttachBootstrap {
    target: OnceCell<AttachTarget>,
    binding: AtomicBool,
    context: OnceCell<Arc<DebugContext>>,
}

impl AttachBootstrap {
    pub fn new() -> Self {
        Self {
            target: OnceCell::new(),
            binding: AtomicBool::new(false),
            context: OnceCell::new(),
        }
    }

    /// Store the process id and capability handle. The first call wins;
    /// later calls are no-ops returning `false`.
    pub fn init(&self, pid: u32, host: Arc<dyn HostHandle>) -> bool {
        self.target.set(AttachTarget { pid, host }).is_ok()
    }

    /// Build and publish the context from environment configuration.
    ///
    /// Returns `Ok(true)` for the one invocation that performed the
    /// construction, `Ok(false)` for every concurrent or later call.
    pub fn bind(&self) -> Result<bool> {
        self.bind_with_config(AgentConfig::from_env())
    }

    pub fn bind_with_config(&self, config: AgentConfig) -> Result<bool> {
        self.bind_with(|pid, host| Ok(DebugContext::build(pid, host, config)))
    }

    /// Compare-and-set guarded bind with a caller-supplied context factory.
    /// A failed factory releases the guard so a later call may retry.
    pub fn bind_with(
        &self,
        build: impl FnOnce(u32, Arc<dyn HostHandle>) -> Result<DebugContext>,
    ) -> Result<bool> {
        let target = self
            .target
            .get()
            .ok_or_else(|| BytescopeError::Internal("bind() before init()".to_string()))?;

        if self
            .binding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        match build(target.pid, Arc::clone(&target.host)) {
            Ok(context) => {
                let _ = self.context.set(Arc::new(context));
                Ok(true)
            }
            Err(e) => {
                self.binding.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    pub fn state(&self) -> BootstrapState {
        if self.context.get().is_some() {
            BootstrapState::Bound
        } else if self.target.get().is_some() {
            BootstrapState::Initialized
        } else {
            BootstrapState::Uninitialized
        }
    }

    pub fn is_bound(&self) -> bool {
        self.context.get().is_some()
    }

    /// The published context, once some call to `bind` has completed
    pub fn context(&self) -> Option<Arc<DebugContext>> {
        self.context.get().cloned()
    }
}

impl Default for AttachBootstrap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytescope_api::LoadedClass;
    use std::path::PathBuf;

    struct NullHost;

    impl HostHandle for NullHost {
        fn loaded_classes(&self) -> Vec<LoadedClass> {
            Vec::new()
        }

        fn class_code_source(&self, _internal_name: &str) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn test_state_machine() {
        let bootstrap = AttachBootstrap::new();
        assert_eq!(bootstrap.state(), BootstrapState::Uninitialized);
        assert!(matches!(
            bootstrap.bind_with_config(AgentConfig::default()),
            Err(BytescopeError::Internal(_))
        ));

        assert!(bootstrap.init(1234, Arc::new(NullHost)));
        assert_eq!(bootstrap.state(), BootstrapState::Initialized);
        assert!(!bootstrap.init(9999, Arc::new(NullHost)));

        assert!(bootstrap.bind_with_config(AgentConfig::default()).unwrap());
        assert_eq!(bootstrap.state(), BootstrapState::Bound);
        assert_eq!(bootstrap.context().unwrap().pid(), 1234);

        // Bound is terminal; further binds are no-ops
        assert!(!bootstrap.bind_with_config(AgentConfig::default()).unwrap());
    }

    #[test]
    fn test_failed_bind_releases_the_guard() {
        let bootstrap = AttachBootstrap::new();
        bootstrap.init(1, Arc::new(NullHost));

        let failed = bootstrap.bind_with(|_, _| {
            Err(BytescopeError::Internal("construction failed".to_string()))
        });
        assert!(failed.is_err());
        assert!(!bootstrap.is_bound());

        assert!(bootstrap.bind_with_config(AgentConfig::default()).unwrap());
        assert!(bootstrap.is_bound());
    }

    #[test]
    fn test_transformed_class_registry() {
        let context = DebugContext::build(1, Arc::new(NullHost), AgentConfig::default());
        assert!(context.transformed_classes().is_empty());

        context.record_transformed(ClassId(5));
        context.record_transformed(ClassId(5));
        context.record_transformed(ClassId(9));

        let mut transformed = context.transformed_classes();
        transformed.sort_by_key(|c| c.0);
        assert_eq!(transformed, vec![ClassId(5), ClassId(9)]);
    }
}
