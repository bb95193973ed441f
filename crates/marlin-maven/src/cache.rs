//! Content cache in front of a [`ContentRetriever`].
//!
//! Fetched documents are kept in memory for the life of the retriever and,
//! when a cache directory is configured, written to disk so later runs skip
//! the network. Only remote content is persisted; local repositories are
//! already on disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use marlin_util::errors::MarlinResult;
use marlin_util::hash;

use crate::repository::RepositoryArtifact;
use crate::retriever::ContentRetriever;

/// Memoizing wrapper around another retriever. Safe to share between threads.
#[derive(Debug)]
pub struct CachingRetriever<R> {
    inner: R,
    memory: Mutex<HashMap<String, String>>,
    disk: Option<PathBuf>,
}

impl<R: ContentRetriever> CachingRetriever<R> {
    /// Memory-only cache.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            memory: Mutex::new(HashMap::new()),
            disk: None,
        }
    }

    /// Memory cache backed by files under `dir`.
    pub fn with_disk_cache(inner: R, dir: &Path) -> Self {
        Self {
            inner,
            memory: Mutex::new(HashMap::new()),
            disk: Some(dir.to_path_buf()),
        }
    }

    /// The on-disk cache root, if any.
    pub fn root(&self) -> Option<&Path> {
        self.disk.as_deref()
    }

    /// Number of documents held in memory.
    pub fn len(&self) -> usize {
        self.memory.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn disk_path(&self, artifact: &RepositoryArtifact) -> Option<PathBuf> {
        if artifact.repository.is_local() {
            return None;
        }
        self.disk
            .as_ref()
            .map(|root| root.join(hash::cache_key(&artifact.url())))
    }

    fn remember(&self, url: String, content: &str) {
        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(url, content.to_string());
        }
    }
}

impl<R: ContentRetriever> ContentRetriever for CachingRetriever<R> {
    fn retrieve(&self, artifact: &RepositoryArtifact) -> MarlinResult<String> {
        let url = artifact.url();
        if let Some(hit) = self
            .memory
            .lock()
            .ok()
            .and_then(|memory| memory.get(&url).cloned())
        {
            return Ok(hit);
        }

        let disk_path = self.disk_path(artifact);
        if let Some(path) = &disk_path {
            if let Ok(content) = fs::read_to_string(path) {
                tracing::trace!("Cache hit for {url}");
                self.remember(url, &content);
                return Ok(content);
            }
        }

        let content = self.inner.retrieve(artifact)?;
        if let Some(path) = &disk_path {
            let written = path
                .parent()
                .map_or(Ok(()), fs::create_dir_all)
                .and_then(|()| fs::write(path, &content));
            if let Err(e) = written {
                tracing::warn!("Failed to cache {url} at {}: {e}", path.display());
            }
        }
        self.remember(url, &content);
        Ok(content)
    }
}
