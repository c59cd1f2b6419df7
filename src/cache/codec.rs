//! Payload Codec Module
//!
//! Pluggable encoding of cached values into the payload part of an entry.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{FileCacheError, Result};

// == Payload Codec ==
/// Encodes values into entry payloads and back.
///
/// `encode` runs before anything touches the filesystem, so a codec can
/// reject a value without leaving a partial entry behind.
pub trait PayloadCodec: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T>;
}

// == JSON ==
/// Stores payloads as serde_json documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| FileCacheError::Serialization(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        serde_json::from_slice(payload).map_err(|e| FileCacheError::Serialization(e.to_string()))
    }
}

// == Literal ==
/// Stores payloads as a static literal document, `data = <value>`.
///
/// Only values expressible as plain literals are accepted: unit and `None`,
/// maps keyed by anything but strings, and integers outside the i64 range
/// are rejected with `FileCacheError::Unrepresentable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralCodec;

const LITERAL_FIELD: &str = "data";

#[derive(Deserialize)]
struct LiteralDocument<T> {
    data: T,
}

impl PayloadCodec for LiteralCodec {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let literal = toml::Value::try_from(value)
            .map_err(|e| FileCacheError::Unrepresentable(e.to_string()))?;

        let mut document = toml::Table::new();
        document.insert(LITERAL_FIELD.to_string(), literal);
        let text = toml::to_string(&document)
            .map_err(|e| FileCacheError::Unrepresentable(e.to_string()))?;
        Ok(text.into_bytes())
    }

    fn decode<T: DeserializeOwned>(&self, payload: &[u8]) -> Result<T> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| FileCacheError::Serialization(e.to_string()))?;
        let document: LiteralDocument<T> =
            toml::from_str(text).map_err(|e| FileCacheError::Serialization(e.to_string()))?;
        Ok(document.data)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        age: u32,
        tags: Vec<String>,
    }

    fn profile() -> Profile {
        Profile {
            name: "ada".to_string(),
            age: 36,
            tags: vec!["math".to_string(), "engines".to_string()],
        }
    }

    #[test]
    fn test_json_codec_struct() {
        let codec = JsonCodec;
        let bytes = codec.encode(&profile()).unwrap();
        let decoded: Profile = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, profile());
    }

    #[test]
    fn test_json_codec_decode_type_mismatch() {
        let codec = JsonCodec;
        let bytes = codec.encode("text").unwrap();
        let result: Result<u32> = codec.decode(&bytes);
        assert!(matches!(result, Err(FileCacheError::Serialization(_))));
    }

    #[test]
    fn test_literal_codec_scalar_document() {
        let codec = LiteralCodec;
        let bytes = codec.encode("world").unwrap();
        assert_eq!(String::from_utf8(bytes.clone()).unwrap().trim(), "data = \"world\"");
        let decoded: String = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, "world");
    }

    #[test]
    fn test_literal_codec_struct() {
        let codec = LiteralCodec;
        let bytes = codec.encode(&profile()).unwrap();
        let decoded: Profile = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, profile());
    }

    #[test]
    fn test_literal_codec_rejects_unit() {
        let result = LiteralCodec.encode(&());
        assert!(matches!(result, Err(FileCacheError::Unrepresentable(_))));
    }

    #[test]
    fn test_literal_codec_rejects_none() {
        let result = LiteralCodec.encode(&None::<u32>);
        assert!(matches!(result, Err(FileCacheError::Unrepresentable(_))));
    }

    #[test]
    fn test_literal_codec_rejects_non_string_keys() {
        let map = BTreeMap::from([((1u8, 2u8), "pair")]);
        let result = LiteralCodec.encode(&map);
        assert!(matches!(result, Err(FileCacheError::Unrepresentable(_))));
    }

    #[test]
    fn test_literal_codec_rejects_json_null() {
        let result = LiteralCodec.encode(&serde_json::json!({ "a": null }));
        assert!(matches!(result, Err(FileCacheError::Unrepresentable(_))));
    }
}
