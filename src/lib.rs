//! # Scoped AMD
//!
//! Wraps bundler chunks as AMD modules whose factory receives an injected
//! *scope* object as its last dependency, and emulates the host environment
//! behind that scope so the same bundle runs in a page, a web worker or a
//! server process without touching real globals.
//!
//! ## Wrapping Invariants
//!
//! 1. **Parameter Parity**: a factory declares exactly one parameter per entry
//!    of its dependency array, in the same order.
//!
//! 2. **Scope Last**: when the scope dependency is present it is the final
//!    dependency and parameter, wherever the chunk listed it.
//!
//! 3. **Shadowing Only With Glue**: shadow bindings for `window`, `document`,
//!    `importScripts`, `location` or `require` are emitted only when the chunk
//!    runtime carries chunk-loading glue for its target.
//!
//! 4. **Local Evaluation**: every script evaluation gets its own
//!    [`ExecutionContext`]; nothing is installed globally.
//!
//! ## Layout
//!
//! - Build side: [`ScopedAmdPlugin`] renders a [`ChunkInput`] into a
//!   [`WrappedModule`], with [`WrapCache`] and the fingerprint helpers for
//!   incremental builds.
//! - Run side: [`web_scope`], [`worker_scope`] and [`server_scope`] build
//!   scope objects over a caller-supplied loader and [`ScriptEngine`];
//!   [`AmdLoader`] runs wrapped modules against them.

mod analysis;
mod cache;
mod chunk;
mod engine;
mod error;
mod fingerprint;
mod loader;
mod options;
mod path;
mod render;
mod scope;
mod server_scope;
mod shadow;
mod target;
mod web_scope;
mod worker_scope;

#[cfg(feature = "napi")]
mod native;

#[cfg(test)]
mod testkit;

#[cfg(test)]
mod scope_tests;

pub use analysis::{references_host_globals, references_known_host_globals};
pub use cache::{CacheEntry, WrapCache};
pub use chunk::{to_identifier, ChunkInput, ExternalDependency, ExternalModule, ExternalRequest};
pub use engine::{Binding, ExecutionContext, ModuleHandle, ScriptEngine};
pub use error::{Result, ScopedAmdError};
pub use fingerprint::{content_fingerprint, wrapper_fingerprint, HashSink};
pub use loader::{parse_wrapped, AmdLoader, ModuleFactory, WrapperCall};
pub use options::{
    BuildOptions, LibraryName, LibraryOptions, OutputOptions, ScopedAmdOptions, TargetOption,
    LIBRARY_TYPE, PLUGIN_NAME,
};
pub use path::{dirname, is_url, join_path, request_base, resolve_request};
pub use render::{ScopedAmdPlugin, WrappedModule};
pub use scope::{ContentFuture, LoadContent, LoadContentSync, MemoryFiles, ScopeObject};
pub use server_scope::{server_scope, Require, ServerScope};
pub use shadow::{create_shadow_statements, shadow_bindings, ScopeAccessor, ShadowBinding};
pub use target::Target;
pub use web_scope::{web_scope, Document, Element, Head, ScriptLoad, WebScope};
pub use worker_scope::{worker_scope, Location, WorkerScope};

#[cfg(feature = "napi")]
pub use native::{
    chunk_hash_native, dirname_native, join_path_native, shadow_statements_native,
    wrap_chunk_native,
};
