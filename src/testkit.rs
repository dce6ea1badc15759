//! Scripted stand-in for a JavaScript engine.
//!
//! Each known source text (compared trimmed) maps to a closure that plays the
//! part of evaluating it against the given context.

use crate::engine::{ExecutionContext, ScriptEngine};
use crate::error::{Result, ScopedAmdError};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Script = Rc<dyn Fn(&ExecutionContext<ScriptedEngine>) -> Result<Value>>;

#[derive(Default)]
pub struct ScriptedEngine {
    scripts: RefCell<HashMap<String, Script>>,
    executed: RefCell<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn script(
        &self,
        source: &str,
        run: impl Fn(&ExecutionContext<ScriptedEngine>) -> Result<Value> + 'static,
    ) {
        self.scripts
            .borrow_mut()
            .insert(source.trim().to_string(), Rc::new(run));
    }

    /// Trimmed sources in evaluation order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl ScriptEngine for ScriptedEngine {
    type Value = Value;

    fn execute(&self, source: &str, context: &ExecutionContext<Self>) -> Result<Value> {
        let key = source.trim().to_string();
        let script = self.scripts.borrow().get(&key).cloned();
        self.executed.borrow_mut().push(key.clone());
        match script {
            Some(script) => script(context),
            None => Err(ScopedAmdError::Script(format!("unknown script {:?}", key))),
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
