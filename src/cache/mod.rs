//! Cache Module
//!
//! Filesystem-backed key/value cache with lazy TTL expiration.

mod codec;
mod entry;
mod key;
mod layout;
mod stats;
mod store;


// Re-export public types
pub use codec::{JsonCodec, LiteralCodec, PayloadCodec};
pub use entry::{current_timestamp, CacheEntry};
pub use key::{escape, file_path};
pub use layout::{shard_name, HashDepth, Layout};
pub use stats::CacheStats;
pub use store::FileCache;

// == Public Constants ==
/// Extension of every entry file
pub const FILE_EXTENSION: &str = "cache";

/// Entry paths at or above this many bytes switch to a hashed file name
pub const MAX_PATH_LENGTH: usize = 160;

/// Permissions of cache directories created by `set` (owner and group only)
pub const DIR_MODE: u32 = 0o770;

/// Permissions of entry files (owner and group read-write)
pub const FILE_MODE: u32 = 0o660;
