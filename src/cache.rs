//! Incremental wrap cache.
//!
//! One JSON entry per emitted asset, valid while the chunk's content
//! fingerprint is unchanged. The cache is advisory: read and write failures
//! only cost a re-render.

use crate::chunk::ChunkInput;
use crate::error::Result;
use crate::fingerprint::content_fingerprint;
use crate::options::BuildOptions;
use crate::render::{ScopedAmdPlugin, WrappedModule};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub module: WrappedModule,
}

pub struct WrapCache {
    dir: PathBuf,
}

impl WrapCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if let Err(e) = fs::create_dir_all(&dir) {
            log::warn!("wrap cache disabled, cannot create {}: {}", dir.display(), e);
        }
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Asset names flatten into a single directory level.
    fn entry_path(&self, file_name: &str) -> PathBuf {
        let flat: String = file_name
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
                _ => '_',
            })
            .collect();
        self.dir.join(format!("{}.json", flat))
    }

    pub fn get(&self, file_name: &str, fingerprint: &str) -> Option<WrappedModule> {
        let path = self.entry_path(file_name);
        let data = fs::read_to_string(&path).ok()?;

        match serde_json::from_str::<CacheEntry>(&data) {
            Ok(entry) if entry.hash == fingerprint => Some(entry.module),
            Ok(_) => None,
            Err(e) => {
                log::warn!("wrap cache entry for {} is corrupt: {}", file_name, e);
                fs::remove_file(&path).ok();
                None
            }
        }
    }

    pub fn set(&self, file_name: &str, fingerprint: &str, module: &WrappedModule) {
        let entry = CacheEntry {
            hash: fingerprint.to_string(),
            module: module.clone(),
        };
        let written = serde_json::to_string(&entry)
            .map_err(|e| e.to_string())
            .and_then(|data| fs::write(self.entry_path(file_name), data).map_err(|e| e.to_string()));
        if let Err(e) = written {
            log::warn!("could not write wrap cache entry for {}: {}", file_name, e);
        }
    }

    /// Renders `chunk` unless an entry with the same content fingerprint is
    /// already stored under `file_name`.
    pub fn render_cached(
        &self,
        plugin: &ScopedAmdPlugin,
        file_name: &str,
        chunk: &ChunkInput,
        build: &BuildOptions,
    ) -> Result<WrappedModule> {
        let fingerprint = content_fingerprint(plugin, chunk, build)?;
        if let Some(module) = self.get(file_name, &fingerprint) {
            log::debug!("wrap cache hit for {}", file_name);
            return Ok(module);
        }
        let module = plugin.render(chunk, build)?;
        self.set(file_name, &fingerprint, &module);
        Ok(module)
    }
}
