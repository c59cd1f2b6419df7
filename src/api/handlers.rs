//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. Cache operations
//! block on file I/O, so every handler runs them on the blocking pool.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{FileCache, JsonCodec, PayloadCodec};
use crate::error::{FileCacheError, Result};
use crate::models::{
    GetResponse, HealthResponse, PurgeAllResponse, PurgeResponse, SetRequest, SetResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
///
/// The cache needs no lock: it is used through `&self` and the filesystem
/// arbitrates concurrent access.
pub struct AppState<C: PayloadCodec = JsonCodec> {
    /// Shared file cache
    pub cache: Arc<FileCache<C>>,
}

impl<C: PayloadCodec> AppState<C> {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: FileCache<C>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }
}

impl<C: PayloadCodec> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

/// Runs a blocking cache operation off the async runtime.
async fn run_blocking<T, F>(op: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| FileCacheError::Internal(e.to_string()))?
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache with optional TTL.
pub async fn set_handler<C: PayloadCodec>(
    State(state): State<AppState<C>>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(FileCacheError::InvalidRequest(error_msg));
    }

    let SetRequest { key, value, ttl } = req;
    let cache = state.cache.clone();
    let stored_key = key.clone();
    run_blocking(move || cache.set(&stored_key, &value, ttl.map(Duration::from_secs))).await?;

    Ok(Json(SetResponse::new(key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler<C: PayloadCodec>(
    State(state): State<AppState<C>>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let cache = state.cache.clone();
    let lookup_key = key.clone();
    let value: Option<Value> = run_blocking(move || cache.get::<Value>(&lookup_key)).await?;

    match value {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(FileCacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Purges a key from the cache. Purging an absent key succeeds.
pub async fn purge_handler<C: PayloadCodec>(
    State(state): State<AppState<C>>,
    Path(key): Path<String>,
) -> Result<Json<PurgeResponse>> {
    let cache = state.cache.clone();
    let purged_key = key.clone();
    run_blocking(move || cache.purge(&purged_key)).await?;

    Ok(Json(PurgeResponse::new(key)))
}

/// Handler for DELETE /purge
///
/// Purges every entry of the cache.
pub async fn purge_all_handler<C: PayloadCodec>(
    State(state): State<AppState<C>>,
) -> Result<Json<PurgeAllResponse>> {
    let cache = state.cache.clone();
    run_blocking(move || cache.purge_all()).await?;

    Ok(Json(PurgeAllResponse::new()))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler<C: PayloadCodec>(
    State(state): State<AppState<C>>,
) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LiteralCodec;
    use crate::config::CacheConfig;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_state(tmp: &TempDir) -> AppState {
        AppState::new(FileCache::new(CacheConfig::new(tmp.path().join("cache"))))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        // Set a value
        let req = SetRequest {
            key: "test_key".to_string(),
            value: json!({"answer": 42}),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        // Get the value
        let result = get_handler(State(state.clone()), Path("test_key".to_string())).await;
        let response = result.unwrap();
        assert_eq!(response.value, json!({"answer": 42}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(FileCacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_purge_handler() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        let req = SetRequest {
            key: "to_purge".to_string(),
            value: json!("value"),
            ttl: None,
        };
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let result = purge_handler(State(state.clone()), Path("to_purge".to_string())).await;
        assert!(result.is_ok());

        // Verify it's gone
        let result = get_handler(State(state), Path("to_purge".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_purge_all_handler() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        for key in ["a", "b"] {
            let req = SetRequest {
                key: key.to_string(),
                value: json!(1),
                ttl: None,
            };
            set_handler(State(state.clone()), Json(req)).await.unwrap();
        }

        purge_all_handler(State(state.clone())).await.unwrap();

        assert!(get_handler(State(state.clone()), Path("a".to_string())).await.is_err());
        assert!(get_handler(State(state), Path("b".to_string())).await.is_err());
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let tmp = TempDir::new().unwrap();
        let state = test_state(&tmp);

        let req = SetRequest {
            key: "".to_string(), // Empty key is invalid
            value: json!("value"),
            ttl: None,
        };
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(FileCacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_literal_codec_rejects_null() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::new(FileCache::with_codec(
            CacheConfig::new(tmp.path().join("lit")),
            LiteralCodec,
        ));

        let req = SetRequest {
            key: "k".to_string(),
            value: json!(null),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(matches!(result, Err(FileCacheError::Unrepresentable(_))));
        assert!(!state.cache.root_directory().exists());
    }
}
