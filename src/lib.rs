//! File Cache - A filesystem-backed key/value cache
//!
//! Stores serialized values in per-key files with an expiration header,
//! evicts stale entries lazily on read and optionally shards entries into
//! hash-named subdirectories.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{FileCache, HashDepth, JsonCodec, Layout, LiteralCodec, PayloadCodec};
pub use config::{CacheConfig, Config};
pub use error::{FileCacheError, Result};
