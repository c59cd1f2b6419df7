//! Key Encoder Module
//!
//! Maps arbitrary cache keys to filesystem-safe file names.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::cache::{FILE_EXTENSION, MAX_PATH_LENGTH};

// == Escape ==
/// Escapes the path-special characters of `raw`.
///
/// Every underscore in the output starts a three-character sequence, so the
/// mapping is injective: distinct inputs always give distinct outputs.
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '_' => escaped.push_str("___"),
            '/' => escaped.push_str("_s_"),
            '\\' => escaped.push_str("_b_"),
            ':' => escaped.push_str("_d_"),
            other => escaped.push(other),
        }
    }
    escaped
}

// == File Path ==
/// Resolves the entry file for `prefix + key` inside `dir`.
///
/// When the escaped path would reach `MAX_PATH_LENGTH` bytes, the name is
/// replaced by the escaped prefix followed by a SHA-256 digest of the
/// unescaped prefixed key. Keys hitting that branch are no longer
/// guaranteed collision-free.
pub fn file_path(dir: &Path, prefix: &str, key: &str) -> PathBuf {
    let prefixed = format!("{}{}", prefix, key);
    let candidate = dir.join(format!("{}.{}", escape(&prefixed), FILE_EXTENSION));
    if candidate.as_os_str().len() < MAX_PATH_LENGTH {
        return candidate;
    }

    dir.join(format!(
        "{}{}.{}",
        escape(prefix),
        sha256_hex(prefixed.as_bytes()),
        FILE_EXTENSION
    ))
}

/// Hex-encoded SHA-256 digest of `data`.
pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_key_unchanged() {
        assert_eq!(escape("hello-world.42"), "hello-world.42");
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape("_"), "___");
        assert_eq!(escape("a/b"), "a_s_b");
        assert_eq!(escape("a\\b"), "a_b_b");
        assert_eq!(escape("c:d"), "c_d_d");
        assert_eq!(escape("x_y/z"), "x___y_s_z");
    }

    #[test]
    fn test_escape_distinguishes_lookalike_keys() {
        let keys = ["a/b", "a_b", "a_s_b", "a\\b", "a:b", "a_b_b", "a_d_b"];
        let escaped: std::collections::HashSet<String> =
            keys.iter().map(|k| escape(k)).collect();
        assert_eq!(escaped.len(), keys.len());
    }

    #[test]
    fn test_file_path_short_key() {
        let path = file_path(Path::new("/tmp/cache"), "P", "user:1");
        assert_eq!(path, PathBuf::from("/tmp/cache/Puser_d_1.cache"));
    }

    #[test]
    fn test_file_path_long_key_uses_digest() {
        let dir = Path::new("/tmp/cache");
        let key = "k".repeat(200);
        let path = file_path(dir, "my_prefix", &key);

        let expected = format!(
            "my___prefix{}.cache",
            sha256_hex(format!("my_prefix{}", key).as_bytes())
        );
        assert_eq!(path, dir.join(expected));
        assert!(path.as_os_str().len() < MAX_PATH_LENGTH);
    }

    #[test]
    fn test_file_path_long_key_is_stable() {
        let dir = Path::new("/tmp/cache");
        let key = "segment/".repeat(40);
        assert_eq!(file_path(dir, "", &key), file_path(dir, "", &key));
    }

    #[test]
    fn test_file_path_threshold_boundary() {
        // "/d/" + name + ".cache" lands exactly on the limit
        let dir = Path::new("/d");
        let fits = "a".repeat(MAX_PATH_LENGTH - 1 - "/d/".len() - ".cache".len());
        let over = format!("{}a", fits);

        assert_eq!(
            file_path(dir, "", &fits),
            dir.join(format!("{}.cache", fits))
        );
        assert_eq!(
            file_path(dir, "", &over),
            dir.join(format!("{}.cache", sha256_hex(over.as_bytes())))
        );
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
