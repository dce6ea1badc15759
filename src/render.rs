//! Renderer for the scoped AMD library format.
//!
//! Wraps compiled chunk text into `define(...)`/`require(...)` factories whose
//! last parameter is the injected scope object.

use crate::analysis::{references_host_globals, references_known_host_globals};
use crate::chunk::{ChunkInput, ExternalDependency};
use crate::error::{Result, ScopedAmdError};
use crate::options::{BuildOptions, ScopedAmdOptions, LIBRARY_TYPE, PLUGIN_NAME};
use crate::shadow::create_shadow_statements;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "napi")]
use napi_derive::napi;

#[cfg_attr(feature = "napi", napi(object))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedModule {
    pub code: String,
    /// Names the loader resolves, in factory parameter order.
    pub dependencies: Vec<String>,
    pub parameters: Vec<String>,
    /// Whether shadow bindings were injected.
    pub shadowed: bool,
}

impl fmt::Display for WrappedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

#[derive(Debug, Clone)]
pub struct ScopedAmdPlugin {
    options: ScopedAmdOptions,
}

impl ScopedAmdPlugin {
    pub fn new(options: ScopedAmdOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ScopedAmdOptions {
        &self.options
    }

    /// Claims the build's library output for this format.
    ///
    /// Any other library type configured on the build is replaced so the host
    /// does not apply its own wrapper on top of ours.
    pub fn apply(&self, build: &mut BuildOptions) -> Result<()> {
        self.options.parse_library_name(&build.library)?;
        if let Some(previous) = build.library.library_type.as_deref() {
            if previous != LIBRARY_TYPE {
                log::debug!(
                    "{}: overriding library type \"{}\" with \"{}\"",
                    PLUGIN_NAME,
                    previous,
                    LIBRARY_TYPE
                );
            }
        }
        build.library.library_type = Some(LIBRARY_TYPE.to_string());
        Ok(())
    }

    /// Whether the chunk's runtime reads host globals and therefore needs the
    /// scope shadowed in.
    pub fn needs_shadowing(&self, chunk: &ChunkInput, build: &BuildOptions) -> Result<bool> {
        match chunk.runtime_glue {
            Some(runtime_glue) => Ok(runtime_glue),
            None => {
                // an unknown target only matters once host globals are in play
                let target = match build.resolve_target() {
                    Ok(target) => target,
                    Err(err) if references_known_host_globals(&chunk.source) => return Err(err),
                    Err(_) => return Ok(false),
                };
                let detected = references_host_globals(&chunk.source, target);
                log::debug!(
                    "{}: no runtime glue flag for chunk {:?}, detected host globals for {}: {}",
                    PLUGIN_NAME,
                    chunk.name.as_ref().or(chunk.id.as_ref()),
                    target,
                    detected
                );
                Ok(detected)
            }
        }
    }

    pub fn render(&self, chunk: &ChunkInput, build: &BuildOptions) -> Result<WrappedModule> {
        if let Some(library_type) = build.library.library_type.as_deref() {
            if library_type != LIBRARY_TYPE {
                return Err(ScopedAmdError::invalid_configuration(
                    "output.library.type",
                    format!(
                        "chunk is already claimed by library type \"{}\", expected \"{}\"",
                        library_type, LIBRARY_TYPE
                    ),
                ));
            }
        }

        let externals = chunk.external_dependencies()?;
        if !externals.is_empty() && !build.uses_amd_externals() {
            return Err(ScopedAmdError::ExternalsConfiguration {
                plugin: PLUGIN_NAME,
                externals_type: build
                    .externals_type
                    .clone()
                    .unwrap_or_else(|| "undefined".to_string()),
                dependencies: externals.into_iter().map(|d| d.import_name).collect(),
            });
        }

        let library_name = self.options.parse_library_name(&build.library)?;
        let shadowed = self.needs_shadowing(chunk, build)?;

        let scope_name = self.options.scope_dependency_name.as_str();
        let (scope_externals, mut externals): (Vec<_>, Vec<_>) = externals
            .into_iter()
            .partition(|dep| dep.import_name == scope_name);
        let mut scope_externals = scope_externals.into_iter();
        let provided_scope = scope_externals.next();

        let scope = match provided_scope {
            Some(scope) => Some(scope),
            None if shadowed => Some(ExternalDependency::synthetic_scope(scope_name)),
            None => None,
        };

        // Duplicates of the scope external share the kept scope argument.
        let mut prelude = String::new();
        if let Some(kept) = &scope {
            for dropped in scope_externals {
                if dropped.argument_identifier != kept.argument_identifier {
                    prelude.push_str(&format!(
                        "var {}={};",
                        dropped.argument_identifier, kept.argument_identifier
                    ));
                }
            }
        }
        if let (Some(scope), true) = (&scope, shadowed) {
            let target = build.resolve_target()?;
            prelude.push_str(&create_shadow_statements(&scope.argument_identifier, target));
        }
        externals.extend(scope);

        let (dependencies, parameters): (Vec<String>, Vec<String>) = externals
            .into_iter()
            .map(|dep| (dep.import_name, dep.argument_identifier))
            .unzip();

        let fn_start = self.factory_start(&parameters, &prelude, chunk, build);
        let fn_end = if build.output.iife { ";\n}" } else { "\n}" };
        let dependencies_json = to_json(&dependencies)?;

        let header = if self.options.require_as_wrapper {
            format!("require({}, {}", dependencies_json, fn_start)
        } else if let Some(template) = library_name {
            let name = chunk.resolve_name_template(&template)?;
            format!("define({}, {}, {}", to_json(&name)?, dependencies_json, fn_start)
        } else if !parameters.is_empty() {
            format!("define({}, {}", dependencies_json, fn_start)
        } else {
            format!("define({}", fn_start)
        };

        log::debug!(
            "{}: wrapped chunk {:?} with dependencies {:?} (shadowed: {})",
            PLUGIN_NAME,
            chunk.name.as_ref().or(chunk.id.as_ref()),
            dependencies,
            shadowed
        );

        let mut code =
            String::with_capacity(header.len() + chunk.source.len() + fn_end.len() + 2);
        code.push_str(&header);
        code.push_str(&chunk.source);
        code.push_str(fn_end);
        code.push_str(");");

        Ok(WrappedModule {
            code,
            dependencies,
            parameters,
            shadowed,
        })
    }

    /// Wraps independent chunks in parallel. Output order follows input order.
    pub fn render_all(
        &self,
        chunks: &[ChunkInput],
        build: &BuildOptions,
    ) -> Result<Vec<WrappedModule>> {
        chunks
            .par_iter()
            .map(|chunk| self.render(chunk, build))
            .collect()
    }

    fn factory_start(
        &self,
        parameters: &[String],
        prelude: &str,
        chunk: &ChunkInput,
        build: &BuildOptions,
    ) -> String {
        let arguments = parameters.join(", ");
        let mut start = if build.output.arrow_functions {
            format!("({}) => {{", arguments)
        } else {
            format!("function({}) {{", arguments)
        };
        if !prelude.is_empty() {
            start.push('\n');
            start.push_str(prelude);
            start.push('\n');
        }
        // Chunks without their own bootstrap evaluate to their exports.
        if build.output.iife || !chunk.has_runtime {
            start.push_str(" return ");
        } else {
            start.push('\n');
        }
        start
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| ScopedAmdError::MalformedModule(format!("cannot encode wrapper: {}", e)))
}
