//! Content-addressed cache
//!
//! Every entry is keyed by a SHA256 of its source: the URI a document was
//! fetched from, the checksum a bundle was advertised with, or the canonical
//! URI of a checkout. Keys never depend on mutable state, so an unchanged
//! remote is always a cache hit. Entries are written once through a
//! temporary file and renamed into place; the only ways to remove them are
//! [`ContentCache::invalidate`] and [`ContentCache::clear`].

use crate::Result;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Hex SHA256 of arbitrary bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Clone)]
pub struct ContentCache {
    root: PathBuf,
}

/// Summary of what the cache currently holds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub documents: usize,
    pub bundles: usize,
    pub checkouts: usize,
    pub total_bytes: u64,
}

impl ContentCache {
    /// Open (and create if needed) a cache rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache key for a source identifier
    pub fn key_for(source: &str) -> String {
        sha256_hex(source.as_bytes())
    }

    /// Path of the entry for `key`, with an optional extension
    pub fn entry_path(&self, key: &str, extension: Option<&str>) -> PathBuf {
        match extension {
            Some(ext) => self.root.join(format!("{}.{}", key, ext)),
            None => self.root.join(key),
        }
    }

    /// Path a JSON document fetched from `uri` is stored at
    pub fn document_path(&self, uri: &str) -> PathBuf {
        self.entry_path(&Self::key_for(uri), Some("json"))
    }

    /// Return the cached document for `uri`, running `fetch` only on a miss
    pub fn get_or_fetch<F>(&self, uri: &str, fetch: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let path = self.document_path(uri);
        self.get_or_insert_with(&path, fetch)?;
        Ok(path)
    }

    /// Populate `path` with `fetch` unless it already exists
    ///
    /// `fetch` writes into a temporary file inside the cache directory, which
    /// is renamed onto `path` only when it succeeds. A failed fetch leaves no
    /// entry behind. Returns true when `fetch` ran.
    pub fn get_or_insert_with<F>(&self, path: &Path, fetch: F) -> Result<bool>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        if path.is_file() {
            tracing::trace!(path = %path.display(), "cache hit");
            return Ok(false);
        }

        fs::create_dir_all(&self.root)?;
        let temp_path = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(&self.root)?
            .into_temp_path();

        fetch(&temp_path)?;

        temp_path.persist(path).map_err(|e| e.error)?;
        tracing::debug!(path = %path.display(), "cache entry stored");
        Ok(true)
    }

    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root) && path.exists()
    }

    /// Delete one entry (file or checkout directory); missing entries are ignored
    pub fn invalidate(&self, path: &Path) -> Result<()> {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        match result {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "cache entry invalidated");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every entry and recreate the empty cache directory
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        tracing::info!(root = %self.root.display(), "content cache cleared");
        Ok(())
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() {
                stats.checkouts += 1;
                stats.total_bytes += walkdir::WalkDir::new(&path)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum::<u64>();
                continue;
            }

            match path.extension().and_then(|s| s.to_str()) {
                Some("json") => stats.documents += 1,
                Some("zip") => stats.bundles += 1,
                _ => continue,
            }
            stats.total_bytes += fs::metadata(&path)?.len();
        }

        Ok(stats)
    }
}
