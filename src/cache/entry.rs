//! Cache Entry Module
//!
//! Defines the on-disk entry: a decimal expiration header line followed by
//! the encoded payload.

use std::path::Path;

use crate::error::{FileCacheError, Result};

// == Cache Entry ==
/// A single cache entry as stored in its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Expiration timestamp (Unix seconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Encoded value
    pub payload: Vec<u8>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `payload` - The encoded value
    /// * `ttl_seconds` - Optional TTL in seconds
    pub fn new(payload: Vec<u8>, ttl_seconds: Option<u64>) -> Self {
        let expires_at = ttl_seconds.map(|ttl| current_timestamp().saturating_add(ttl));
        Self::with_expiry(payload, expires_at)
    }

    /// Creates an entry with an absolute expiration. `Some(0)` means none.
    pub fn with_expiry(payload: Vec<u8>, expires_at: Option<u64>) -> Self {
        Self {
            expires_at: expires_at.filter(|&ts| ts != 0),
            payload,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration
    /// timestamp.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp())
    }

    /// Checks expiration against an explicit `now` (Unix seconds).
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => expires <= now,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in seconds, or None if no expiration is set.
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp()))
    }

    // == Encoding ==
    /// Serializes the entry into its file representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let header = self.expires_at.unwrap_or(0).to_string();
        let mut bytes = Vec::with_capacity(header.len() + 1 + self.payload.len());
        bytes.extend_from_slice(header.as_bytes());
        bytes.push(b'\n');
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parses the contents of the entry file at `path`.
    ///
    /// The header must be a decimal Unix timestamp (`0` for no expiration)
    /// terminated by a newline; anything else is reported as corruption.
    pub fn from_bytes(path: &Path, mut bytes: Vec<u8>) -> Result<Self> {
        let newline = bytes
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| FileCacheError::corrupt(path, "missing expiration header"))?;

        let payload = bytes.split_off(newline + 1);
        let header = std::str::from_utf8(&bytes[..newline])
            .map_err(|_| FileCacheError::corrupt(path, "expiration header is not UTF-8"))?
            .trim_end_matches('\r');

        if header.is_empty() || !header.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FileCacheError::corrupt(
                path,
                format!("invalid expiration header '{}'", header),
            ));
        }
        let expires_at: u64 = header.parse().map_err(|_| {
            FileCacheError::corrupt(path, format!("expiration header '{}' out of range", header))
        })?;

        Ok(Self::with_expiry(payload, Some(expires_at)))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}
