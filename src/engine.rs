//! Script evaluation capability.
//!
//! Scope factories and the AMD loader never interpret bundle code themselves.
//! They hand source text plus an [`ExecutionContext`] to a [`ScriptEngine`]
//! supplied by the embedder, typically a binding to a real JavaScript engine.

use crate::error::Result;
use crate::scope::ScopeObject;
use crate::server_scope::Require;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub trait ScriptEngine: Sized + 'static {
    type Value: Clone + 'static;

    /// Evaluates `source` as a function body whose parameters are the
    /// bindings of `context`, returning the body's completion value.
    fn execute(&self, source: &str, context: &ExecutionContext<Self>) -> Result<Self::Value>;
}

/// A value made visible to evaluated code under a local name.
pub enum Binding<E: ScriptEngine> {
    Value(E::Value),
    Scope(ScopeObject<E>),
    Require(Require<E>),
    /// The module record behind `module` and `exports`.
    Module(ModuleHandle<E::Value>),
}

impl<E: ScriptEngine> Clone for Binding<E> {
    fn clone(&self) -> Self {
        match self {
            Binding::Value(value) => Binding::Value(value.clone()),
            Binding::Scope(scope) => Binding::Scope(scope.clone()),
            Binding::Require(require) => Binding::Require(require.clone()),
            Binding::Module(module) => Binding::Module(module.clone()),
        }
    }
}

impl<E: ScriptEngine> fmt::Debug for Binding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value(_) => f.write_str("Value(..)"),
            Binding::Scope(scope) => write!(f, "Scope({})", scope.target()),
            Binding::Require(require) => write!(f, "Require({})", require.base()),
            Binding::Module(module) => write!(f, "Module({})", module.id()),
        }
    }
}

/// Ordered bindings for one evaluation. A context is built per evaluation and
/// dropped with it; nothing is installed globally.
pub struct ExecutionContext<E: ScriptEngine> {
    bindings: Vec<(String, Binding<E>)>,
}

impl<E: ScriptEngine> Default for ExecutionContext<E> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<E: ScriptEngine> ExecutionContext<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, binding: Binding<E>) -> Self {
        self.push(name, binding);
        self
    }

    /// Later bindings shadow earlier ones with the same name.
    pub fn push(&mut self, name: impl Into<String>, binding: Binding<E>) {
        self.bindings.push((name.into(), binding));
    }

    pub fn get(&self, name: &str) -> Option<&Binding<E>> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, binding)| binding)
    }

    pub fn value(&self, name: &str) -> Option<&E::Value> {
        match self.get(name)? {
            Binding::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn scope(&self, name: &str) -> Option<&ScopeObject<E>> {
        match self.get(name)? {
            Binding::Scope(scope) => Some(scope),
            _ => None,
        }
    }

    pub fn require(&self, name: &str) -> Option<&Require<E>> {
        match self.get(name)? {
            Binding::Require(require) => Some(require),
            _ => None,
        }
    }

    pub fn module(&self, name: &str) -> Option<&ModuleHandle<E::Value>> {
        match self.get(name)? {
            Binding::Module(module) => Some(module),
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

struct ModuleRecord<V> {
    id: String,
    exports: RefCell<Option<V>>,
}

/// Shared handle to a module record whose exports the evaluated code assigns.
pub struct ModuleHandle<V> {
    record: Rc<ModuleRecord<V>>,
}

impl<V> Clone for ModuleHandle<V> {
    fn clone(&self) -> Self {
        Self {
            record: Rc::clone(&self.record),
        }
    }
}

impl<V: Clone> ModuleHandle<V> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            record: Rc::new(ModuleRecord {
                id: id.into(),
                exports: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn set_exports(&self, exports: V) {
        *self.record.exports.borrow_mut() = Some(exports);
    }

    pub fn exports(&self) -> Option<V> {
        self.record.exports.borrow().clone()
    }
}
