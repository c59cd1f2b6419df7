//! Directory Layout Module
//!
//! Decides which directory an entry lives in: directly under the cache root
//! (flat) or inside a shard subdirectory named after the key's hash.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::cache::key::sha256_hex;
use crate::error::{FileCacheError, Result};

// == Hash Depth ==
/// Number of leading hex digits of a key hash used as shard name.
///
/// Bounded to 1..=4, i.e. at most 16^4 = 65 536 shard directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashDepth(u8);

impl HashDepth {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    /// Validates `depth` against the supported range.
    pub fn new(depth: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&depth) {
            Ok(Self(depth))
        } else {
            Err(FileCacheError::InvalidHashDepth(depth))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for HashDepth {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u8> for HashDepth {
    type Error = FileCacheError;

    fn try_from(depth: u8) -> Result<Self> {
        Self::new(depth)
    }
}

impl fmt::Display for HashDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// == Layout ==
/// Placement strategy for entry files under the cache root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// All entries directly under the root
    #[default]
    Flat,
    /// Entries grouped into `<hash prefix>/` subdirectories.
    ///
    /// The root directory must be dedicated to one cache instance: purging
    /// the cache removes the whole tree.
    Sharded(HashDepth),
}

impl Layout {
    /// Returns the directory the entry for `key` belongs in.
    pub fn entry_directory(&self, root: &Path, key: &str) -> PathBuf {
        match self {
            Layout::Flat => root.to_path_buf(),
            Layout::Sharded(depth) => root.join(shard_name(key, *depth)),
        }
    }
}

/// First `depth` hex characters of the SHA-256 digest of `key`.
pub fn shard_name(key: &str, depth: HashDepth) -> String {
    let mut digest = sha256_hex(key.as_bytes());
    digest.truncate(depth.get() as usize);
    digest
}
