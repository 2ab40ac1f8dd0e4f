use async_trait::async_trait;
use stackpilot_types::ServiceRequest;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use thiserror::Error;
use tracing::warn;

// ═══════════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════

/// Whole-collection request storage.
///
/// Reads favor availability: a missing, unreadable, or non-array backing
/// file is an empty collection, never an error. Writes replace the entire
/// collection in one pass; per-record updates happen in memory upstream.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<ServiceRequest>, StoreError>;

    async fn save_all(&self, requests: &[ServiceRequest]) -> Result<(), StoreError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// JSON FILE STORE
// ═══════════════════════════════════════════════════════════════════════════

/// Requests persisted as one pretty-printed JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl RequestStore for JsonFileStore {
    async fn load_all(&self) -> Result<Vec<ServiceRequest>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(error) => {
                if error.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), %error, "unreadable request store, treating as empty");
                }
                return Ok(Vec::new());
            }
        };

        let parsed: serde_json::Value = match serde_json::from_str(&content) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "malformed request store, treating as empty");
                return Ok(Vec::new());
            }
        };

        let serde_json::Value::Array(records) = parsed else {
            warn!(path = %self.path.display(), "request store is not an array, treating as empty");
            return Ok(Vec::new());
        };

        Ok(records
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(request) => Some(request),
                Err(error) => {
                    warn!(path = %self.path.display(), %error, "skipping malformed request record");
                    None
                }
            })
            .collect())
    }

    async fn save_all(&self, requests: &[ServiceRequest]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_string_pretty(requests)?;
        let mut tmp = self.path.clone();
        tmp.set_extension("tmp");
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE (for testing)
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct InMemoryStore {
    requests: RwLock<Vec<ServiceRequest>>,
    saves: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(requests: Vec<ServiceRequest>) -> Self {
        Self {
            requests: RwLock::new(requests),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of persisted requests (for testing)
    pub fn len(&self) -> usize {
        self.requests.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.read().unwrap().is_empty()
    }

    /// Number of save_all calls observed (for testing)
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestStore for InMemoryStore {
    async fn load_all(&self) -> Result<Vec<ServiceRequest>, StoreError> {
        Ok(self.requests.read().unwrap().clone())
    }

    async fn save_all(&self, requests: &[ServiceRequest]) -> Result<(), StoreError> {
        *self.requests.write().unwrap() = requests.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use stackpilot_types::{ServiceRequest, ServiceRequestItem};

    fn make_test_request(request_id: &str) -> ServiceRequest {
        ServiceRequest::new(
            request_id.to_string(),
            "Avery Chen".to_string(),
            "avery@example.com".to_string(),
            "tidepool".to_string(),
            String::new(),
            vec![ServiceRequestItem {
                provider_id: "neon".to_string(),
                provider_name: "Neon".to_string(),
                service_id: "serverless-postgres".to_string(),
                service_name: "Serverless PostgreSQL".to_string(),
                plan_id: "launch".to_string(),
                plan_label: "Launch".to_string(),
                billing_cycle: "monthly".to_string(),
                unit_price: Decimal::from(19u32),
            }],
            Decimal::from(19u32),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("service-requests.json"));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service-requests.json");
        std::fs::write(&path, "{{{{").unwrap();
        let store = JsonFileStore::new(path);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_array_content_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service-requests.json");
        std::fs::write(&path, r#"{"requests": []}"#).unwrap();
        let store = JsonFileStore::new(path);
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("service-requests.json"));
        let requests = vec![make_test_request("SRV-20260801-0001")];
        store.save_all(&requests).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].request_id, "SRV-20260801-0001");
        assert_eq!(loaded[0].total, Decimal::from(19u32));
    }

    #[tokio::test]
    async fn malformed_records_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service-requests.json");
        let good = serde_json::to_value(make_test_request("SRV-20260801-0002")).unwrap();
        let payload = serde_json::Value::Array(vec![serde_json::json!({"junk": true}), good]);
        std::fs::write(&path, serde_json::to_string(&payload).unwrap()).unwrap();

        let store = JsonFileStore::new(path);
        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].request_id, "SRV-20260801-0002");
    }

    #[tokio::test]
    async fn in_memory_store_tracks_saves() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        store
            .save_all(&[make_test_request("SRV-20260801-0003")])
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.save_count(), 1);
    }
}
