//! Node bindings for bundler plugins.
//!
//! Options, build config and chunks cross the boundary as JSON values in the
//! shape the bundler already has them.

use crate::chunk::ChunkInput;
use crate::error::ScopedAmdError;
use crate::fingerprint::wrapper_fingerprint;
use crate::options::{BuildOptions, ScopedAmdOptions};
use crate::path::{dirname, join_path};
use crate::render::{ScopedAmdPlugin, WrappedModule};
use crate::shadow::create_shadow_statements;
use crate::target::Target;
use napi_derive::napi;

fn to_napi(error: ScopedAmdError) -> napi::Error {
    napi::Error::from_reason(error.to_string())
}

fn plugin_and_build(
    options: serde_json::Value,
    build: serde_json::Value,
) -> napi::Result<(ScopedAmdPlugin, BuildOptions)> {
    let plugin = ScopedAmdPlugin::new(ScopedAmdOptions::from_json(options).map_err(to_napi)?)
        .map_err(to_napi)?;
    let mut build = BuildOptions::from_json(build).map_err(to_napi)?;
    plugin.apply(&mut build).map_err(to_napi)?;
    Ok((plugin, build))
}

fn parse_chunk(chunk: serde_json::Value) -> napi::Result<ChunkInput> {
    serde_json::from_value(chunk)
        .map_err(|e| napi::Error::from_reason(format!("Chunk parse error: {}", e)))
}

#[napi]
pub fn wrap_chunk_native(
    options: serde_json::Value,
    build: serde_json::Value,
    chunk: serde_json::Value,
) -> napi::Result<WrappedModule> {
    let (plugin, build) = plugin_and_build(options, build)?;
    let chunk = parse_chunk(chunk)?;
    plugin.render(&chunk, &build).map_err(to_napi)
}

/// Hash contributions of the wrapper for one chunk, as a hex digest.
#[napi]
pub fn chunk_hash_native(
    options: serde_json::Value,
    build: serde_json::Value,
    chunk: serde_json::Value,
) -> napi::Result<String> {
    let (plugin, build) = plugin_and_build(options, build)?;
    let chunk = parse_chunk(chunk)?;
    wrapper_fingerprint(&plugin, &chunk, &build).map_err(to_napi)
}

#[napi]
pub fn shadow_statements_native(scope_argument: String, target: String) -> napi::Result<String> {
    let target: Target = Target::normalize(&target).parse().map_err(to_napi)?;
    Ok(create_shadow_statements(&scope_argument, target))
}

#[napi]
pub fn join_path_native(base: String, path: String) -> napi::Result<String> {
    join_path(&base, &path).map_err(to_napi)
}

#[napi]
pub fn dirname_native(path: String) -> String {
    dirname(&path)
}
