//! Cache Store Module
//!
//! Main cache engine: resolves entry files through the key encoder and
//! directory layout, frames payloads with their expiration and evicts stale
//! entries lazily on read.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, trace};

use crate::cache::codec::{JsonCodec, PayloadCodec};
use crate::cache::entry::CacheEntry;
use crate::cache::key::{escape, file_path};
use crate::cache::layout::Layout;
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::cache::FILE_EXTENSION;
use crate::config::CacheConfig;
use crate::error::{FileCacheError, Result};

// == File Cache ==
/// Filesystem-backed cache for one namespace.
///
/// All operations block on file I/O. There is no in-process locking: the
/// filesystem is the only shared state, so several instances (or processes)
/// may point at the same directory.
#[derive(Debug)]
pub struct FileCache<C: PayloadCodec = JsonCodec> {
    /// Namespace configuration
    config: CacheConfig,
    /// Resolved root directory
    root: PathBuf,
    /// Payload encoding
    codec: C,
    /// Activity counters
    stats: StatsRecorder,
}

impl FileCache<JsonCodec> {
    // == Constructor ==
    /// Creates a cache storing JSON payloads.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: PayloadCodec> FileCache<C> {
    /// Creates a cache storing payloads with `codec`.
    pub fn with_codec(config: CacheConfig, codec: C) -> Self {
        let root = config.root_directory();
        Self {
            config,
            root,
            codec,
            stats: StatsRecorder::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Directory all entries of this cache live under.
    pub fn root_directory(&self) -> &Path {
        &self.root
    }

    /// Returns the file the entry for `key` is stored in.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let dir = self.config.layout.entry_directory(&self.root, key);
        file_path(&dir, &self.config.prefix, key)
    }

    // == Get ==
    /// Retrieves the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the entry is absent or stale. A stale entry is
    /// deleted as part of the lookup.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            // Also covers a file purged between lookup and open
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(key = %key, "Retrieving key from file cache: cache miss");
                self.stats.record_miss();
                return Ok(None);
            }
            Err(e) => {
                return Err(FileCacheError::io(
                    format!("reading cache entry {}", path.display()),
                    e,
                ))
            }
        };

        let entry = CacheEntry::from_bytes(&path, bytes)?;
        if entry.is_expired() {
            self.evict_stale(&path)?;
            trace!(key = %key, "Retrieving key from file cache: key outdated, cache miss");
            self.stats.record_miss();
            return Ok(None);
        }

        let value = self.codec.decode(&entry.payload)?;
        trace!(key = %key, "Retrieving key from file cache");
        self.stats.record_hit();
        Ok(Some(value))
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// A `ttl` of `None` (or zero) falls back to the configured default TTL;
    /// a default of 0 stores the entry without expiration. Sub-second TTLs
    /// round up to the next whole second.
    pub fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        // Encode first: a rejected value must not touch the filesystem
        let payload = self.codec.encode(value)?;
        let entry = CacheEntry::new(payload, self.ttl_seconds(ttl));

        trace!(key = %key, codec = self.codec.name(), "Storing value in cache");

        let dir = self.config.layout.entry_directory(&self.root, key);
        let path = file_path(&dir, &self.config.prefix, key);
        ensure_directory(&dir)?;
        write_atomically(&dir, &path, &entry.to_bytes())?;

        self.stats.record_write();
        Ok(())
    }

    // == Purge ==
    /// Removes the entry stored under `key`. Absent entries are ignored.
    pub fn purge(&self, key: &str) -> Result<()> {
        trace!(key = %key, "Purging key from file cache");
        remove_if_exists(&self.path_for(key))?;
        Ok(())
    }

    // == Purge All ==
    /// Removes every entry of this cache.
    ///
    /// The flat layout only deletes entry files carrying this cache's prefix,
    /// leaving other instances sharing the directory intact. The sharded
    /// layout deletes the whole root directory tree.
    pub fn purge_all(&self) -> Result<()> {
        info!(root = %self.root.display(), "Purging the whole file cache");

        match self.config.layout {
            Layout::Flat => {
                let removed = self.purge_flat()?;
                debug!(removed, "Removed cache entries");
            }
            Layout::Sharded(_) => match fs::remove_dir_all(&self.root) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(FileCacheError::io(
                        format!("removing cache directory {}", self.root.display()),
                        e,
                    ))
                }
            },
        }
        Ok(())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Deletes an entry found stale on read.
    ///
    /// Not atomic with the read: a `set` renaming a fresh entry into place
    /// in between is deleted as well and reads back as a miss.
    fn evict_stale(&self, path: &Path) -> Result<()> {
        if remove_if_exists(path)? {
            self.stats.record_eviction();
        }
        Ok(())
    }

    fn ttl_seconds(&self, ttl: Option<Duration>) -> Option<u64> {
        let seconds = match ttl.filter(|ttl| !ttl.is_zero()) {
            Some(ttl) => ttl
                .as_secs()
                .saturating_add(u64::from(ttl.subsec_nanos() > 0)),
            None => self.config.default_ttl,
        };
        (seconds != 0).then_some(seconds)
    }

    fn purge_flat(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(FileCacheError::io(
                    format!("listing cache directory {}", self.root.display()),
                    e,
                ))
            }
        };

        let prefix = escape(&self.config.prefix);
        let suffix = format!(".{}", FILE_EXTENSION);
        let mut removed = 0;

        for entry in entries {
            let entry = entry.map_err(|e| FileCacheError::io("listing cache directory", e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| FileCacheError::io("inspecting cache entry", e))?
                .is_file();
            if !is_file {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(&prefix) && name.ends_with(&suffix) && remove_if_exists(&entry.path())? {
                removed += 1;
            }
        }

        Ok(removed)
    }
}

// == Filesystem Helpers ==
/// Removes `path`, reporting whether a file was actually deleted.
fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FileCacheError::io(
            format!("removing cache entry {}", path.display()),
            e,
        )),
    }
}

/// Creates `dir` and any missing parents, restricted to owner and group.
fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let missing: Vec<PathBuf> = dir
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .map(Path::to_path_buf)
        .collect();

    fs::create_dir_all(dir).map_err(|e| {
        FileCacheError::io(format!("creating cache directory {}", dir.display()), e)
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for created in &missing {
            fs::set_permissions(created, fs::Permissions::from_mode(crate::cache::DIR_MODE))
                .map_err(|e| {
                    FileCacheError::io(
                        format!("setting permissions on {}", created.display()),
                        e,
                    )
                })?;
        }
    }
    #[cfg(not(unix))]
    let _ = missing;

    Ok(())
}

/// Writes `bytes` to `path` via a temporary file in `dir` and a rename, so
/// readers see either the previous entry or the new one.
fn write_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| FileCacheError::io(format!("creating temp file in {}", dir.display()), e))?;
    tmp.write_all(bytes)
        .map_err(|e| FileCacheError::io("writing cache entry", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(crate::cache::FILE_MODE))
            .map_err(|e| FileCacheError::io("setting cache entry permissions", e))?;
    }

    tmp.persist(path).map_err(|e| {
        FileCacheError::io(format!("replacing cache entry {}", path.display()), e.error)
    })?;
    Ok(())
}
