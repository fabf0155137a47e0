//! Process-wide registry of import resolvers.
//!
//! Lookups happen once per `@import` from inside native calls on many threads,
//! registrations once per session, so entries sit behind a readers-writer lock.

use super::pool::{Handle, HandlePool};
use super::ImportResolver;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

static GLOBAL: Lazy<ImporterRegistry> = Lazy::new(ImporterRegistry::new);

/// A registered resolver and its invocation count
#[derive(Debug)]
pub struct ResolverEntry {
    resolver: ImportResolver,
    calls: AtomicU64,
}

impl ResolverEntry {
    /// The resolver
    pub fn resolver(&self) -> &ImportResolver {
        &self.resolver
    }

    /// Record one invocation
    pub fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of invocations so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

/// Maps handles to resolvers
pub struct ImporterRegistry {
    entries: RwLock<HashMap<Handle, Arc<ResolverEntry>>>,
    pool: Mutex<HandlePool>,
}

impl ImporterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            pool: Mutex::new(HandlePool::new()),
        }
    }

    /// The process-wide registry consulted by the native importer callback
    pub fn global() -> &'static ImporterRegistry {
        &GLOBAL
    }

    /// Register a resolver under a fresh handle.
    ///
    /// The returned guard unregisters the resolver when dropped.
    pub fn register(&self, resolver: ImportResolver) -> Registration<'_> {
        let handle = self.pool.lock().acquire();
        let entry = Arc::new(ResolverEntry {
            resolver,
            calls: AtomicU64::new(0),
        });

        let previous = self.entries.write().insert(handle, Arc::clone(&entry));
        debug_assert!(previous.is_none(), "handle {} issued twice", handle);

        debug!(handle = %handle, "Registered import resolver");

        Registration {
            registry: self,
            handle,
            entry,
        }
    }

    /// Look up the resolver registered under `handle`
    pub fn lookup(&self, handle: Handle) -> Option<Arc<ResolverEntry>> {
        self.entries.read().get(&handle).cloned()
    }

    /// Number of registered resolvers
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no resolver is registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of handles currently issued
    pub fn handles_in_use(&self) -> usize {
        self.pool.lock().in_use()
    }

    fn unregister(&self, handle: Handle) {
        let removed = self.entries.write().remove(&handle);
        if removed.is_some() {
            // Only after removal: the handle may now be issued again.
            self.pool.lock().release(handle);
            debug!(handle = %handle, "Unregistered import resolver");
        }
    }
}

impl Default for ImporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A live registration; unregisters on drop
pub struct Registration<'r> {
    registry: &'r ImporterRegistry,
    handle: Handle,
    entry: Arc<ResolverEntry>,
}

impl Registration<'_> {
    /// The handle passed to the native engine
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Number of times the resolver has been invoked
    pub fn calls(&self) -> u64 {
        self.entry.calls()
    }

    /// Unregister now
    pub fn unregister(self) {
        drop(self);
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.unregister(self.handle);
    }
}

impl std::fmt::Debug for Registration<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("handle", &self.handle)
            .field("calls", &self.calls())
            .finish()
    }
}
