//! Import resolution callbacks invoked by LibSass.
//!
//! LibSass calls back into the host for every `@import` it encounters. The
//! native callback can only carry a word-sized cookie, so resolvers are kept
//! in a process-wide [`ImporterRegistry`] and the cookie is the resolver's
//! [`Handle`].

pub mod bridge;
pub mod pool;
pub mod registry;

pub use pool::{Handle, HandlePool, HANDLE_BLOCK_SIZE, MIN_HANDLE};
pub use registry::{ImporterRegistry, Registration, ResolverEntry};

use std::sync::Arc;

/// Signature of a resolver function: `(import path, parent path)`
pub type ResolveFn = dyn Fn(&str, &str) -> anyhow::Result<Option<ResolvedImport>> + Send + Sync;

/// The outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImport {
    /// Path the import resolves to
    pub path: String,
    /// Replacement content; `None` loads the content from `path`
    pub body: Option<String>,
}

impl ResolvedImport {
    /// Redirect the import to another path
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: None,
        }
    }

    /// Supply the import's content directly. An empty body is ignored.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.body = if body.is_empty() { None } else { Some(body) };
        self
    }
}

/// A caller-supplied import resolver
#[derive(Clone)]
pub struct ImportResolver(Arc<ResolveFn>);

impl ImportResolver {
    /// Wrap a resolver function
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn(&str, &str) -> anyhow::Result<Option<ResolvedImport>> + Send + Sync + 'static,
    {
        Self(Arc::new(resolver))
    }

    /// Invoke the resolver
    pub fn resolve(&self, url: &str, prev: &str) -> anyhow::Result<Option<ResolvedImport>> {
        (self.0)(url, prev)
    }
}

impl std::fmt::Debug for ImportResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportResolver").finish_non_exhaustive()
    }
}
