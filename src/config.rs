//! Configuration Module
//!
//! Handles loading server configuration from environment variables and
//! describes a cache namespace (`CacheConfig`): where entries live, how keys
//! are prefixed, the default TTL and the directory layout.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::{HashDepth, Layout};
use crate::error::Result;

/// Directory used when no cache directory is configured.
pub const DEFAULT_CACHE_DIRECTORY: &str = "filecache/";

// == Cache Namespace ==
/// Configuration bundle for one cache instance.
///
/// The system temp directory is resolved once, when the config is built,
/// so the cache itself never consults process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Cache directory, relative to `temp_base` when that is set
    pub cache_directory: PathBuf,
    /// Base directory the cache directory is resolved against
    pub temp_base: Option<PathBuf>,
    /// Prefix prepended to every key
    pub prefix: String,
    /// Default TTL in seconds for entries stored without one, 0 = never expires
    pub default_ttl: u64,
    /// Flat or sharded directory layout
    pub layout: Layout,
}

impl CacheConfig {
    /// Creates a flat, unprefixed, non-expiring namespace rooted at `cache_directory`.
    pub fn new(cache_directory: impl Into<PathBuf>) -> Self {
        Self {
            cache_directory: cache_directory.into(),
            temp_base: None,
            prefix: String::new(),
            default_ttl: 0,
            layout: Layout::Flat,
        }
    }

    /// Resolves the cache directory against the system temp directory.
    pub fn relative_to_system_temp(self) -> Self {
        self.relative_to(env::temp_dir())
    }

    /// Resolves the cache directory against `base`.
    pub fn relative_to(mut self, base: impl Into<PathBuf>) -> Self {
        self.temp_base = Some(base.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl = seconds;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Switches to the sharded layout, validating the hash depth.
    pub fn sharded(self, hash_depth: u8) -> Result<Self> {
        let depth = HashDepth::new(hash_depth)?;
        Ok(self.with_layout(Layout::Sharded(depth)))
    }

    /// Returns the directory all entries of this namespace live under.
    pub fn root_directory(&self) -> PathBuf {
        let dir = if self.cache_directory.as_os_str().is_empty() {
            PathBuf::from(DEFAULT_CACHE_DIRECTORY)
        } else {
            self.cache_directory.clone()
        };

        match &self.temp_base {
            Some(base) => base.join(dir),
            None => dir,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIRECTORY).relative_to_system_temp()
    }
}

// == Codec Selection ==
/// Payload encoding selected for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecKind {
    /// serde_json payloads
    #[default]
    Json,
    /// Static literal documents
    Literal,
}

impl FromStr for CodecKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "literal" => Ok(Self::Literal),
            other => Err(format!("unknown codec '{}'", other)),
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache directory
    pub cache_dir: String,
    /// Whether the cache directory is relative to the system temp directory
    pub relative_to_temp: bool,
    /// Key prefix for this instance
    pub prefix: String,
    /// Default TTL in seconds for entries without explicit TTL, 0 = never expires
    pub default_ttl: u64,
    /// Shard hash depth, 0 = flat layout
    pub hash_depth: u8,
    /// Payload encoding
    pub codec: CodecKind,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Cache directory (default: filecache/)
    /// - `CACHE_RELATIVE_TO_TEMP` - Resolve against the temp directory (default: true)
    /// - `CACHE_PREFIX` - Key prefix (default: empty)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `HASH_DEPTH` - Shard depth, 0 for flat (default: 0)
    /// - `CACHE_CODEC` - `json` or `literal` (default: json)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("CACHE_DIR").unwrap_or(defaults.cache_dir),
            relative_to_temp: env::var("CACHE_RELATIVE_TO_TEMP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.relative_to_temp),
            prefix: env::var("CACHE_PREFIX").unwrap_or(defaults.prefix),
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
            hash_depth: env::var("HASH_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.hash_depth),
            codec: env::var("CACHE_CODEC")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.codec),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// Builds the cache namespace described by this configuration.
    ///
    /// Fails when `hash_depth` is neither 0 nor within 1..=4.
    pub fn cache_config(&self) -> Result<CacheConfig> {
        let mut cache = CacheConfig::new(&self.cache_dir)
            .with_prefix(self.prefix.clone())
            .with_default_ttl(self.default_ttl);
        if self.relative_to_temp {
            cache = cache.relative_to_system_temp();
        }
        if self.hash_depth != 0 {
            cache = cache.sharded(self.hash_depth)?;
        }
        Ok(cache)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: DEFAULT_CACHE_DIRECTORY.to_string(),
            relative_to_temp: true,
            prefix: String::new(),
            default_ttl: 3600,
            hash_depth: 0,
            codec: CodecKind::Json,
            server_port: 3000,
        }
    }
}
