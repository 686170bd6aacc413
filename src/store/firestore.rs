//! Firestore REST Store
//!
//! Appends each record through a single `documents:commit` call so the
//! document and its server timestamp are written atomically.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::types::{PriceUpdate, PriceUpdateRecord, StoredRecord};
use super::PriceStore;

/// Firestore REST API client for the price update collection
pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

/// Configuration for the Firestore client
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// REST endpoint root (e.g., "https://firestore.googleapis.com/v1")
    pub base_url: String,
    /// Google Cloud project id
    pub project_id: String,
    /// Database id, "(default)" for most projects
    pub database: String,
    /// Collection receiving one document per submission
    pub collection: String,
    /// Web API key, sent as the `key` query parameter
    pub api_key: Option<String>,
    /// OAuth2 bearer token
    pub access_token: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://firestore.googleapis.com/v1".to_string(),
            project_id: String::new(),
            database: "(default)".to_string(),
            collection: "actualizaciones_precios".to_string(),
            api_key: None,
            access_token: None,
            request_timeout_ms: 10_000,
        }
    }
}

impl FirestoreStore {
    /// Create a new Firestore client with the given configuration
    pub fn new(config: FirestoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    fn database_path(&self) -> String {
        format!(
            "projects/{}/databases/{}",
            self.config.project_id, self.config.database
        )
    }

    fn document_name(&self, id: &str) -> String {
        format!(
            "{}/documents/{}/{}",
            self.database_path(),
            self.config.collection,
            id
        )
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/{}/documents:commit",
            self.config.base_url.trim_end_matches('/'),
            self.database_path()
        )
    }

    fn commit_request(&self, id: &str, record: &PriceUpdateRecord) -> CommitRequest {
        let values = record.updates.iter().map(encode_update).collect();

        let mut fields = BTreeMap::new();
        fields.insert(
            "updates".to_string(),
            Value::ArrayValue(ArrayValue { values }),
        );

        CommitRequest {
            writes: vec![Write {
                update: Document {
                    name: self.document_name(id),
                    fields,
                },
                update_transforms: vec![FieldTransform {
                    field_path: "timestamp".to_string(),
                    set_to_server_value: "REQUEST_TIME".to_string(),
                }],
                current_document: Precondition { exists: false },
            }],
        }
    }
}

#[async_trait]
impl PriceStore for FirestoreStore {
    async fn append(&self, record: &PriceUpdateRecord) -> StoreResult<StoredRecord> {
        let id = Uuid::new_v4().simple().to_string();
        let body = self.commit_request(&id, record);

        let mut request = self.client.post(self.commit_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("key", key)]);
        }
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(StoreError::from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let result: CommitResponse = response.json().await.map_err(StoreError::Request)?;
        let submitted_at = result.server_timestamp()?;

        tracing::debug!(
            document = %id,
            updates = record.len(),
            "Appended price update to Firestore"
        );

        Ok(StoredRecord {
            id,
            updates: record.updates.clone(),
            submitted_at,
        })
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}

fn encode_update(update: &PriceUpdate) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("codigo".to_string(), Value::StringValue(update.code.clone()));
    fields.insert("servicio".to_string(), Value::StringValue(update.name.clone()));
    fields.insert(
        "monto_nuevo".to_string(),
        Value::IntegerValue(update.new_price.to_string()),
    );
    Value::MapValue(MapValue { fields })
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
struct CommitRequest {
    writes: Vec<Write>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Write {
    update: Document,
    update_transforms: Vec<FieldTransform>,
    current_document: Precondition,
}

#[derive(Debug, Serialize)]
struct Document {
    name: String,
    fields: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldTransform {
    field_path: String,
    set_to_server_value: String,
}

#[derive(Debug, Serialize)]
struct Precondition {
    exists: bool,
}

/// Firestore typed value; integers travel as decimal strings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Value {
    StringValue(String),
    IntegerValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Serialize)]
struct ArrayValue {
    values: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct MapValue {
    fields: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    #[serde(default)]
    write_results: Vec<WriteResult>,
    commit_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteResult {
    #[serde(default)]
    transform_results: Vec<TransformResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransformResult {
    timestamp_value: Option<DateTime<Utc>>,
}

impl CommitResponse {
    /// The `REQUEST_TIME` transform result, falling back to the commit time
    fn server_timestamp(&self) -> StoreResult<DateTime<Utc>> {
        self.write_results
            .first()
            .and_then(|w| w.transform_results.first())
            .and_then(|t| t.timestamp_value)
            .or(self.commit_time)
            .ok_or_else(|| StoreError::InvalidResponse("missing commit timestamp".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const COMMIT_PATH: &str = "/projects/demo/databases/(default)/documents:commit";

    fn test_config(base_url: &str) -> FirestoreConfig {
        FirestoreConfig {
            base_url: base_url.to_string(),
            project_id: "demo".to_string(),
            ..Default::default()
        }
    }

    fn sample_record() -> PriceUpdateRecord {
        PriceUpdateRecord::new(vec![PriceUpdate::new("D0120", "Examen", 25000)])
    }

    #[test]
    fn test_default_config() {
        let config = FirestoreConfig::default();
        assert_eq!(config.database, "(default)");
        assert_eq!(config.collection, "actualizaciones_precios");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_commit_request_shape() {
        let store = FirestoreStore::new(test_config("http://localhost")).unwrap();
        let body = serde_json::to_value(store.commit_request("abc", &sample_record())).unwrap();

        let write = &body["writes"][0];
        assert_eq!(
            write["update"]["name"],
            "projects/demo/databases/(default)/documents/actualizaciones_precios/abc"
        );

        let entry = &write["update"]["fields"]["updates"]["arrayValue"]["values"][0]["mapValue"]["fields"];
        assert_eq!(entry["codigo"]["stringValue"], "D0120");
        assert_eq!(entry["servicio"]["stringValue"], "Examen");
        assert_eq!(entry["monto_nuevo"]["integerValue"], "25000");

        assert_eq!(write["updateTransforms"][0]["fieldPath"], "timestamp");
        assert_eq!(write["updateTransforms"][0]["setToServerValue"], "REQUEST_TIME");
        assert_eq!(write["currentDocument"]["exists"], false);
    }

    #[tokio::test]
    async fn test_append_uses_server_timestamp() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMMIT_PATH))
            .and(query_param("key", "web-key"))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "writeResults": [{
                    "updateTime": "2025-03-01T12:00:00.5Z",
                    "transformResults": [{ "timestampValue": "2025-03-01T12:00:00.5Z" }]
                }],
                "commitTime": "2025-03-01T12:00:00.6Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config(&server.uri());
        config.api_key = Some("web-key".to_string());
        config.access_token = Some("token-1".to_string());
        let store = FirestoreStore::new(config).unwrap();

        let stored = store.append(&sample_record()).await.unwrap();
        assert_eq!(stored.updates, sample_record().updates);
        assert_eq!(stored.submitted_at.to_rfc3339(), "2025-03-01T12:00:00.500+00:00");
        assert_eq!(stored.id.len(), 32);
    }

    #[tokio::test]
    async fn test_append_falls_back_to_commit_time() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMMIT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "writeResults": [{}],
                "commitTime": "2025-03-01T12:00:00Z"
            })))
            .mount(&server)
            .await;

        let store = FirestoreStore::new(test_config(&server.uri())).unwrap();
        let stored = store.append(&sample_record()).await.unwrap();
        assert_eq!(stored.submitted_at.to_rfc3339(), "2025-03-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn test_permission_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COMMIT_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
            .expect(1)
            .mount(&server)
            .await;

        let store = FirestoreStore::new(test_config(&server.uri())).unwrap();
        let err = store.append(&sample_record()).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::ApiError { status: 403, ref message } if message == "PERMISSION_DENIED"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let store = FirestoreStore::new(test_config("http://127.0.0.1:1")).unwrap();
        let err = store.append(&sample_record()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable | StoreError::Request(_)));
    }
}
