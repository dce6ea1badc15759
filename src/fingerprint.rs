//! Feeds the wrapper's configuration-dependent decisions into the host's chunk
//! hash, so incremental builds re-emit a chunk whenever its wrapper would change.

use crate::chunk::ChunkInput;
use crate::error::Result;
use crate::options::{BuildOptions, PLUGIN_NAME};
use crate::render::ScopedAmdPlugin;
use sha2::{Digest, Sha256};

/// Anything that accepts hash input. The host's own hasher implements this on
/// the other side of the bridge; [`Sha256`] is used otherwise.
pub trait HashSink {
    fn update(&mut self, data: &[u8]);
}

impl HashSink for Sha256 {
    fn update(&mut self, data: &[u8]) {
        Digest::update(self, data);
    }
}

impl HashSink for Vec<String> {
    fn update(&mut self, data: &[u8]) {
        self.push(String::from_utf8_lossy(data).into_owned());
    }
}

impl ScopedAmdPlugin {
    pub fn chunk_hash(
        &self,
        chunk: &ChunkInput,
        build: &BuildOptions,
        hash: &mut dyn HashSink,
    ) -> Result<()> {
        let options = self.options();
        hash.update(PLUGIN_NAME.as_bytes());

        if options.require_as_wrapper {
            hash.update(b"requireAsWrapper");
        } else if let Some(template) = options.parse_library_name(&build.library)? {
            hash.update(b"named");
            hash.update(chunk.resolve_name_template(&template)?.as_bytes());
        }

        hash.update(options.scope_dependency_name.as_bytes());

        let externals = chunk.external_dependencies()?;
        if !externals.is_empty() {
            hash.update(b"externals");
            for external in &externals {
                hash.update(external.import_name.as_bytes());
            }
        }

        if self.needs_shadowing(chunk, build)? {
            hash.update(b"shadow");
            hash.update(build.target_name().as_bytes());
        }
        Ok(())
    }
}

/// Hex digest of the wrapper decisions alone.
pub fn wrapper_fingerprint(
    plugin: &ScopedAmdPlugin,
    chunk: &ChunkInput,
    build: &BuildOptions,
) -> Result<String> {
    let mut hasher = Sha256::new();
    plugin.chunk_hash(chunk, build, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hex digest of the wrapper decisions plus the chunk source. Two chunks with
/// the same content fingerprint wrap to the same text.
pub fn content_fingerprint(
    plugin: &ScopedAmdPlugin,
    chunk: &ChunkInput,
    build: &BuildOptions,
) -> Result<String> {
    let mut hasher = Sha256::new();
    plugin.chunk_hash(chunk, build, &mut hasher)?;
    Digest::update(&mut hasher, [build.output.arrow_functions as u8, build.output.iife as u8]);
    Digest::update(&mut hasher, [chunk.has_runtime as u8]);
    Digest::update(&mut hasher, chunk.source.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
