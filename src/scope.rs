//! Scope objects: per-target capability bags handed to a wrapped module as
//! its last dependency.
//!
//! Factories only ever read content through the loader primitives below.

use crate::engine::{Binding, ExecutionContext, ScriptEngine};
use crate::error::{Result, ScopedAmdError};
use crate::path::is_url;
use crate::server_scope::ServerScope;
use crate::shadow::shadow_bindings;
use crate::target::Target;
use crate::web_scope::WebScope;
use crate::worker_scope::WorkerScope;
use futures_lite::future::BoxedLocal;
use std::collections::HashMap;
use std::future::Future;

// ═══════════════════════════════════════════════════════════════════════════════
// CONTENT LOADERS
// ═══════════════════════════════════════════════════════════════════════════════

pub type ContentFuture = BoxedLocal<Result<String>>;

/// Asynchronous "load content at this location" primitive.
pub trait LoadContent {
    fn load(&self, url: &str) -> ContentFuture;
}

impl<F, Fut> LoadContent for F
where
    F: Fn(&str) -> Fut,
    Fut: Future<Output = Result<String>> + 'static,
{
    fn load(&self, url: &str) -> ContentFuture {
        Box::pin(self(url))
    }
}

/// Synchronous counterpart of [`LoadContent`] for worker and server runtimes.
pub trait LoadContentSync {
    fn load_sync(&self, url: &str) -> Result<String>;
}

impl<F> LoadContentSync for F
where
    F: Fn(&str) -> Result<String>,
{
    fn load_sync(&self, url: &str) -> Result<String> {
        self(url)
    }
}

/// Files served from memory, keyed by their full location.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: HashMap<String, String>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, location: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(location.into(), content.into());
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, content: impl Into<String>) {
        self.files.insert(location.into(), content.into());
    }

    fn read(&self, url: &str) -> Result<String> {
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| ScopedAmdError::load(url, "no such file"))
    }
}

impl LoadContentSync for MemoryFiles {
    fn load_sync(&self, url: &str) -> Result<String> {
        self.read(url)
    }
}

impl LoadContent for MemoryFiles {
    fn load(&self, url: &str) -> ContentFuture {
        let result = self.read(url);
        Box::pin(async move { result })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCOPE OBJECT
// ═══════════════════════════════════════════════════════════════════════════════

pub enum ScopeObject<E: ScriptEngine> {
    Web(WebScope<E>),
    WebWorker(WorkerScope<E>),
    Server(ServerScope<E>),
}

impl<E: ScriptEngine> Clone for ScopeObject<E> {
    fn clone(&self) -> Self {
        match self {
            ScopeObject::Web(scope) => ScopeObject::Web(scope.clone()),
            ScopeObject::WebWorker(scope) => ScopeObject::WebWorker(scope.clone()),
            ScopeObject::Server(scope) => ScopeObject::Server(scope.clone()),
        }
    }
}

impl<E: ScriptEngine> ScopeObject<E> {
    pub fn target(&self) -> Target {
        match self {
            ScopeObject::Web(_) => Target::Web,
            ScopeObject::WebWorker(_) => Target::WebWorker,
            ScopeObject::Server(_) => Target::Server,
        }
    }

    pub fn as_web(&self) -> Option<&WebScope<E>> {
        match self {
            ScopeObject::Web(scope) => Some(scope),
            _ => None,
        }
    }

    pub fn as_worker(&self) -> Option<&WorkerScope<E>> {
        match self {
            ScopeObject::WebWorker(scope) => Some(scope),
            _ => None,
        }
    }

    pub fn as_server(&self) -> Option<&ServerScope<E>> {
        match self {
            ScopeObject::Server(scope) => Some(scope),
            _ => None,
        }
    }

    pub fn into_binding(self) -> Binding<E> {
        Binding::Scope(self)
    }

    /// Context for chunk code loaded through this scope: every global the
    /// target shadows resolves to the scope itself, as it does inside the
    /// wrapped factory. A server scope's `require` is bound as a callable
    /// resolving against the root.
    pub fn chunk_context(&self) -> ExecutionContext<E> {
        let mut context = ExecutionContext::new();
        for binding in shadow_bindings(self.target()) {
            let value = match self {
                ScopeObject::Server(scope) => Binding::Require(scope.require_fn(scope.root())),
                _ => Binding::Scope(self.clone()),
            };
            context.push(binding.local_name, value);
        }
        context
    }
}

impl<E: ScriptEngine> From<WebScope<E>> for ScopeObject<E> {
    fn from(scope: WebScope<E>) -> Self {
        ScopeObject::Web(scope)
    }
}

impl<E: ScriptEngine> From<WorkerScope<E>> for ScopeObject<E> {
    fn from(scope: WorkerScope<E>) -> Self {
        ScopeObject::WebWorker(scope)
    }
}

impl<E: ScriptEngine> From<ServerScope<E>> for ScopeObject<E> {
    fn from(scope: ServerScope<E>) -> Self {
        ScopeObject::Server(scope)
    }
}

/// Non-URL roots must end with a separator so joins are unambiguous.
pub(crate) fn check_root(root: &str) -> Result<()> {
    if !is_url(root) && !root.ends_with('/') {
        return Err(ScopedAmdError::InvalidRoot(root.to_string()));
    }
    Ok(())
}
