//! Web-worker scope: `location` plus a synchronous `importScripts`.

use crate::engine::ScriptEngine;
use crate::error::Result;
use crate::scope::{check_root, LoadContentSync, ScopeObject};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub href: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href)
    }
}

struct WorkerScopeInner<E: ScriptEngine> {
    location: Location,
    loader: Box<dyn LoadContentSync>,
    engine: Rc<E>,
}

pub struct WorkerScope<E: ScriptEngine> {
    inner: Rc<WorkerScopeInner<E>>,
}

impl<E: ScriptEngine> Clone for WorkerScope<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Builds a web-worker scope whose `location.href` is `root`, the base for
/// any relative url in the bundle.
pub fn worker_scope<E: ScriptEngine>(
    root: &str,
    loader: impl LoadContentSync + 'static,
    engine: Rc<E>,
) -> Result<WorkerScope<E>> {
    check_root(root)?;
    Ok(WorkerScope {
        inner: Rc::new(WorkerScopeInner {
            location: Location {
                href: root.to_string(),
            },
            loader: Box::new(loader),
            engine,
        }),
    })
}

impl<E: ScriptEngine> WorkerScope<E> {
    pub fn location(&self) -> &Location {
        &self.inner.location
    }

    /// Loads `url` and evaluates it before returning.
    pub fn import_scripts(&self, url: &str) -> Result<E::Value> {
        let source = self.inner.loader.load_sync(url)?;
        let context = ScopeObject::WebWorker(self.clone()).chunk_context();
        self.inner.engine.execute(&source, &context)
    }
}
