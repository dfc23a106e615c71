//! Cache of original class bytes.
//!
//! Instrumentation rewrites classes in place; collaborators stash the
//! pristine bytes here first so a later retransform can start from the
//! original. The cache is identity-keyed and non-owning: the host runtime
//! owns class lifetime, and a sweep against its liveness oracle reclaims
//! entries for classes that have been unloaded, so the cache never keeps a
//! class (or its defining loader) alive.

use bytescope_api::{ClassId, HostHandle};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

struct CacheEntry {
    bytes: Arc<[u8]>,
    /// Sweep generation this entry was last confirmed live in
    generation: u64,
}

/// Concurrent, identity-keyed store of original class bytes.
///
/// Plain `get` calls never touch the coarse lock; callers that need an
/// atomic check-then-set window around a mutation (two concurrent first
/// loads of the same class racing on first-write) serialize through
/// [`ClassByteCache::lock`].
pub struct ClassByteCache {
    entries: DashMap<ClassId, CacheEntry>,
    mutation_lock: Mutex<()>,
    generation: AtomicU64,
}

impl ClassByteCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            mutation_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Cached bytes for a class, or `fallback` when nothing (or an empty
    /// buffer) is cached
    pub fn get(&self, class: ClassId, fallback: &[u8]) -> Arc<[u8]> {
        match self.entries.get(&class) {
            Some(entry) if !entry.bytes.is_empty() => Arc::clone(&entry.bytes),
            _ => Arc::from(fallback),
        }
    }

    pub fn set(&self, class: ClassId, bytes: Vec<u8>) {
        self.entries.insert(
            class,
            CacheEntry {
                bytes: Arc::from(bytes),
                generation: self.generation.load(Ordering::Acquire),
            },
        );
    }

    /// Coarse lock for read-modify-write sequences around cache mutations
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutation_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop entries for classes the host no longer reports live.
    ///
    /// Surviving entries are re-stamped with the new generation. Returns the
    /// number of entries reclaimed.
    pub fn sweep(&self, host: &dyn HostHandle) -> usize {
        let _guard = self.lock();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let before = self.entries.len();
        self.entries.retain(|class, entry| {
            if host.is_class_live(*class) {
                entry.generation = generation;
                true
            } else {
                false
            }
        });

        let reclaimed = before - self.entries.len();
        if reclaimed > 0 {
            debug!(reclaimed, generation, "swept unloaded classes from byte cache");
        }
        reclaimed
    }

    /// Completed sweep count; entries stamped with an older generation have
    /// not been confirmed live since
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear everything; used on detach and in tests
    pub fn destroy(&self) {
        let _guard = self.lock();
        self.entries.clear();
    }
}

impl Default for ClassByteCache {
    fn default() -> Self {
        Self::new()
    }
}
