//! Reference AMD loader for wrapped bundles.
//!
//! Parses the single top-level `define(...)` / `require(...)` call of a
//! wrapped module with oxc, then runs the factory body through a
//! [`ScriptEngine`] with each dependency bound to its parameter. Every load
//! gets its own [`ExecutionContext`].

use crate::engine::{Binding, ExecutionContext, ScriptEngine};
use crate::error::{Result, ScopedAmdError};
use crate::scope::LoadContentSync;
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperCall {
    Define,
    /// `requireAsWrapper` output: runs immediately, registers nothing.
    Require,
}

/// A parsed wrapper call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFactory {
    pub call: WrapperCall,
    pub name: Option<String>,
    pub dependencies: Vec<String>,
    pub parameters: Vec<String>,
    /// Source of the factory body, without the surrounding braces.
    pub body: String,
}

impl ModuleFactory {
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn parse_wrapped(text: &str) -> Result<ModuleFactory> {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(false);
    let ret = Parser::new(&allocator, text, source_type).parse();

    if let Some(error) = ret.errors.first() {
        return Err(ScopedAmdError::MalformedModule(error.to_string()));
    }

    let mut calls = ret.program.body.iter().filter_map(|stmt| match stmt {
        Statement::ExpressionStatement(expr) => match &expr.expression {
            Expression::CallExpression(call) => wrapper_call(call).map(|kind| (kind, call)),
            _ => None,
        },
        _ => None,
    });

    let (kind, call) = calls.next().ok_or_else(|| {
        ScopedAmdError::MalformedModule("no top-level define or require call".into())
    })?;
    if calls.next().is_some() {
        return Err(ScopedAmdError::MalformedModule(
            "more than one top-level wrapper call".into(),
        ));
    }

    let mut factory = ModuleFactory {
        call: kind,
        name: None,
        dependencies: Vec::new(),
        parameters: Vec::new(),
        body: String::new(),
    };
    let mut has_factory = false;

    for argument in &call.arguments {
        if has_factory {
            return Err(ScopedAmdError::MalformedModule(
                "arguments after the factory function".into(),
            ));
        }
        match argument {
            Argument::StringLiteral(name) if factory.name.is_none() && kind == WrapperCall::Define => {
                factory.name = Some(name.value.to_string());
            }
            Argument::ArrayExpression(array) => {
                factory.dependencies = dependency_names(array)?;
            }
            Argument::ArrowFunctionExpression(arrow) => {
                factory.parameters = parameter_names(&arrow.params)?;
                factory.body = if arrow.expression {
                    expression_body(text, &arrow.body)?
                } else {
                    block_body(text, arrow.body.span)
                };
                has_factory = true;
            }
            Argument::FunctionExpression(func) => {
                factory.parameters = parameter_names(&func.params)?;
                let body = func.body.as_ref().ok_or_else(|| {
                    ScopedAmdError::MalformedModule("factory function has no body".into())
                })?;
                factory.body = block_body(text, body.span);
                has_factory = true;
            }
            other => {
                return Err(ScopedAmdError::MalformedModule(format!(
                    "unexpected wrapper argument `{}`",
                    other.span().source_text(text)
                )));
            }
        }
    }

    if !has_factory {
        return Err(ScopedAmdError::MalformedModule(
            "wrapper call has no factory function".into(),
        ));
    }
    if factory.parameters.len() > factory.dependencies.len() {
        return Err(ScopedAmdError::MalformedModule(format!(
            "{} parameters for {} dependencies",
            factory.parameters.len(),
            factory.dependencies.len()
        )));
    }

    Ok(factory)
}

fn wrapper_call(call: &CallExpression) -> Option<WrapperCall> {
    match &call.callee {
        Expression::Identifier(ident) if ident.name.as_str() == "define" => Some(WrapperCall::Define),
        Expression::Identifier(ident) if ident.name.as_str() == "require" => Some(WrapperCall::Require),
        _ => None,
    }
}

fn dependency_names(array: &ArrayExpression) -> Result<Vec<String>> {
    array
        .elements
        .iter()
        .map(|element| match element {
            ArrayExpressionElement::StringLiteral(lit) => Ok(lit.value.to_string()),
            _ => Err(ScopedAmdError::MalformedModule(
                "dependency names must be string literals".into(),
            )),
        })
        .collect()
}

fn parameter_names(params: &FormalParameters) -> Result<Vec<String>> {
    if params.rest.is_some() {
        return Err(ScopedAmdError::MalformedModule(
            "rest parameters are not supported in factories".into(),
        ));
    }
    params
        .items
        .iter()
        .map(|param| match &param.pattern {
            BindingPattern::BindingIdentifier(ident) => Ok(ident.name.to_string()),
            _ => Err(ScopedAmdError::MalformedModule(
                "factory parameters must be plain identifiers".into(),
            )),
        })
        .collect()
}

fn block_body(text: &str, span: oxc_span::Span) -> String {
    let start = span.start as usize + 1;
    let end = (span.end as usize).saturating_sub(1).max(start);
    text[start..end].to_string()
}

/// `(a) => expr` becomes the body `return expr;`.
fn expression_body(text: &str, body: &FunctionBody) -> Result<String> {
    match body.statements.first() {
        Some(Statement::ExpressionStatement(stmt)) => Ok(format!(
            "return {};",
            stmt.expression.span().source_text(text)
        )),
        _ => Err(ScopedAmdError::MalformedModule(
            "arrow factory has an empty expression body".into(),
        )),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOADING
// ═══════════════════════════════════════════════════════════════════════════════

pub struct AmdLoader<E: ScriptEngine> {
    engine: Rc<E>,
    factories: RefCell<HashMap<String, Rc<ModuleFactory>>>,
}

impl<E: ScriptEngine> AmdLoader<E> {
    pub fn new(engine: Rc<E>) -> Self {
        Self {
            engine,
            factories: RefCell::new(HashMap::new()),
        }
    }

    pub fn parse(text: &str) -> Result<ModuleFactory> {
        parse_wrapped(text)
    }

    /// Parses and runs a wrapped module against the named dependencies.
    pub fn load(&self, text: &str, dependencies: &HashMap<String, Binding<E>>) -> Result<E::Value> {
        let factory = parse_wrapped(text)?;
        self.run(factory.label(), &factory, dependencies)
    }

    /// Like [`AmdLoader::load`] with the module read from `url`. The parsed
    /// factory is kept per url; the body runs again on every call.
    pub fn load_module(
        &self,
        url: &str,
        loader: &dyn LoadContentSync,
        dependencies: &HashMap<String, Binding<E>>,
    ) -> Result<E::Value> {
        let cached = self.factories.borrow().get(url).cloned();
        let factory = match cached {
            Some(factory) => factory,
            None => {
                let text = loader.load_sync(url)?;
                let factory = Rc::new(parse_wrapped(&text)?);
                log::debug!(
                    "parsed {} with {} dependencies",
                    url,
                    factory.dependencies.len()
                );
                self.factories
                    .borrow_mut()
                    .insert(url.to_string(), Rc::clone(&factory));
                factory
            }
        };
        self.run(url, &factory, dependencies)
    }

    pub fn instantiate(
        &self,
        factory: &ModuleFactory,
        dependencies: &HashMap<String, Binding<E>>,
    ) -> Result<E::Value> {
        self.run(factory.label(), factory, dependencies)
    }

    /// `module` names the module in a [`ScopedAmdError::MissingDependency`].
    fn run(
        &self,
        module: &str,
        factory: &ModuleFactory,
        dependencies: &HashMap<String, Binding<E>>,
    ) -> Result<E::Value> {
        let mut context = ExecutionContext::new();
        for (index, dependency) in factory.dependencies.iter().enumerate() {
            let binding = dependencies.get(dependency).ok_or_else(|| {
                ScopedAmdError::MissingDependency {
                    module: module.to_string(),
                    dependency: dependency.clone(),
                }
            })?;
            if let Some(parameter) = factory.parameters.get(index) {
                context.push(parameter.as_str(), binding.clone());
            }
        }
        self.engine.execute(&factory.body, &context)
    }
}
