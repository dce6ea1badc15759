//! Server-style scope: a minimal synchronous module loader behind `require`.

use crate::engine::{Binding, ExecutionContext, ModuleHandle, ScriptEngine};
use crate::error::{Result, ScopedAmdError};
use crate::path::{request_base, resolve_request};
use crate::scope::{check_root, LoadContentSync};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct ServerScopeInner<E: ScriptEngine> {
    root: String,
    loader: Box<dyn LoadContentSync>,
    engine: Rc<E>,
    modules: RefCell<HashMap<String, ModuleHandle<E::Value>>>,
}

pub struct ServerScope<E: ScriptEngine> {
    inner: Rc<ServerScopeInner<E>>,
}

impl<E: ScriptEngine> Clone for ServerScope<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Builds a server-style scope resolving requests against `root`.
pub fn server_scope<E: ScriptEngine>(
    root: &str,
    loader: impl LoadContentSync + 'static,
    engine: Rc<E>,
) -> Result<ServerScope<E>> {
    check_root(root)?;
    Ok(ServerScope {
        inner: Rc::new(ServerScopeInner {
            root: root.to_string(),
            loader: Box::new(loader),
            engine,
            modules: RefCell::new(HashMap::new()),
        }),
    })
}

impl<E: ScriptEngine> ServerScope<E> {
    pub fn root(&self) -> &str {
        &self.inner.root
    }

    /// `require` as seen by the wrapped bundle: requests resolve against the
    /// root.
    pub fn require(&self, request: &str) -> Result<E::Value> {
        self.require_from(&self.inner.root, request)
    }

    /// A `require` function bound to `base`, as handed to evaluated modules.
    pub fn require_fn(&self, base: impl Into<String>) -> Require<E> {
        Require {
            scope: self.clone(),
            base: base.into(),
        }
    }

    fn require_from(&self, base: &str, request: &str) -> Result<E::Value> {
        let location = resolve_request(base, request)?;

        let cached = self.inner.modules.borrow().get(&location).cloned();
        if let Some(module) = cached {
            return module.exports().ok_or_else(|| {
                ScopedAmdError::Script(format!(
                    "circular require of {} before it assigned module.exports",
                    location
                ))
            });
        }

        log::debug!("require {} -> {}", request, location);
        let source = self.inner.loader.load_sync(&location)?;

        let module = ModuleHandle::new(location.clone());
        self.inner
            .modules
            .borrow_mut()
            .insert(location.clone(), module.clone());

        match self.evaluate(&source, &location, &module) {
            Ok(exports) => {
                module.set_exports(exports.clone());
                Ok(exports)
            }
            Err(err) => {
                self.inner.modules.borrow_mut().remove(&location);
                Err(err)
            }
        }
    }

    /// Evaluates one module in a fresh context with its own `exports`,
    /// `module` and `require`. The module's assigned exports win over the
    /// completion value.
    fn evaluate(
        &self,
        source: &str,
        location: &str,
        module: &ModuleHandle<E::Value>,
    ) -> Result<E::Value> {
        let context = ExecutionContext::new()
            .bind("exports", Binding::Module(module.clone()))
            .bind("module", Binding::Module(module.clone()))
            .bind("require", Binding::Require(self.require_fn(request_base(location))));

        let completion = self.inner.engine.execute(source, &context)?;
        Ok(module.exports().unwrap_or(completion))
    }
}

/// `require` bound to the directory (or URL) of the module that received it.
pub struct Require<E: ScriptEngine> {
    scope: ServerScope<E>,
    base: String,
}

impl<E: ScriptEngine> Clone for Require<E> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            base: self.base.clone(),
        }
    }
}

impl<E: ScriptEngine> Require<E> {
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn call(&self, request: &str) -> Result<E::Value> {
        self.scope.require_from(&self.base, request)
    }
}
