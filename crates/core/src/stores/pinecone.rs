use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use crate::error::StoreError;
use crate::models::{QueryMatch, RecordMetadata, VectorRecord};
use crate::traits::VectorIndex;

pub const DEFAULT_CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_INDEX_NAME: &str = "course-syllabus";
pub const UPSERT_BATCH_SIZE: usize = 100;

/// Control-plane client: lists, creates and describes indexes.
pub struct PineconeClient {
    control_plane: Url,
    api_key: String,
    client: Client,
}

impl PineconeClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, StoreError> {
        Ok(Self {
            control_plane: Url::parse(base_url)?,
            api_key: api_key.into(),
            client: Client::new(),
        })
    }

    /// Creates the index when it does not exist yet (serverless,
    /// aws/us-east-1), then resolves the data-plane host and verifies that
    /// the index dimension matches `dimensions`.
    pub async fn ensure_index(
        &self,
        name: &str,
        dimensions: usize,
        metric: &str,
    ) -> Result<PineconeIndex, StoreError> {
        let names = self.index_names().await?;
        if !names.iter().any(|existing| existing == name) {
            self.create_index(name, dimensions, metric).await?;
        }

        let description = self.describe_index(name).await?;
        let (host, existing) = parse_index_description(&description)?;
        if existing != dimensions {
            return Err(StoreError::DimensionMismatch {
                existing,
                requested: dimensions,
            });
        }

        Ok(PineconeIndex {
            name: name.to_string(),
            host: Url::parse(&format!("https://{host}"))?,
            dimensions,
            api_key: self.api_key.clone(),
            client: self.client.clone(),
        })
    }

    async fn index_names(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .client
            .get(self.control_plane.join("/indexes")?)
            .header("Api-Key", &self.api_key)
            .send()
            .await?;
        let body = into_value(response).await?;
        Ok(parse_index_names(&body))
    }

    async fn create_index(
        &self,
        name: &str,
        dimensions: usize,
        metric: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.control_plane.join("/indexes")?)
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "name": name,
                "dimension": dimensions,
                "metric": metric,
                "spec": {
                    "serverless": { "cloud": "aws", "region": "us-east-1" }
                }
            }))
            .send()
            .await?;
        into_value(response).await?;
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> Result<Value, StoreError> {
        let response = self
            .client
            .get(self.control_plane.join(&format!("/indexes/{name}"))?)
            .header("Api-Key", &self.api_key)
            .send()
            .await?;
        into_value(response).await
    }
}

/// Data-plane handle for one index, produced by
/// [`PineconeClient::ensure_index`].
pub struct PineconeIndex {
    name: String,
    host: Url,
    dimensions: usize,
    api_key: String,
    client: Client,
}

impl PineconeIndex {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &Url {
        &self.host
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<(), StoreError> {
        for record in records {
            if record.values.len() != self.dimensions {
                return Err(StoreError::DimensionMismatch {
                    existing: self.dimensions,
                    requested: record.values.len(),
                });
            }
        }
        if records.is_empty() {
            return Ok(());
        }

        // Earlier batches stay committed if a later one fails; the caller
        // sees the error once and there is no rollback or retry.
        for payload in batch_payloads(records) {
            let response = self
                .client
                .post(self.host.join("/vectors/upsert")?)
                .header("Api-Key", &self.api_key)
                .json(&payload)
                .send()
                .await?;
            into_value(response).await?;
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, StoreError> {
        if vector.len() != self.dimensions {
            return Err(StoreError::DimensionMismatch {
                existing: self.dimensions,
                requested: vector.len(),
            });
        }

        let response = self
            .client
            .post(self.host.join("/query")?)
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "vector": vector,
                "topK": top_k,
                "includeMetadata": true,
            }))
            .send()
            .await?;
        let body = into_value(response).await?;
        Ok(parse_matches(&body))
    }
}

async fn into_value(response: reqwest::Response) -> Result<Value, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let details = response.text().await.unwrap_or_default();
        return Err(StoreError::BackendResponse {
            backend: "pinecone".to_string(),
            details: format!("{status}: {details}"),
        });
    }
    Ok(response.json().await?)
}

fn batch_payloads(records: &[VectorRecord]) -> Vec<Value> {
    records
        .chunks(UPSERT_BATCH_SIZE)
        .map(|batch| json!({ "vectors": batch }))
        .collect()
}

fn parse_index_names(body: &Value) -> Vec<String> {
    body.pointer("/indexes")
        .and_then(Value::as_array)
        .map(|indexes| {
            indexes
                .iter()
                .filter_map(|index| index.pointer("/name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_index_description(body: &Value) -> Result<(String, usize), StoreError> {
    let host = body
        .pointer("/host")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::BackendResponse {
            backend: "pinecone".to_string(),
            details: "index description has no host".to_string(),
        })?;
    let dimensions = body
        .pointer("/dimension")
        .and_then(Value::as_u64)
        .ok_or_else(|| StoreError::BackendResponse {
            backend: "pinecone".to_string(),
            details: "index description has no dimension".to_string(),
        })?;
    Ok((host.to_string(), dimensions as usize))
}

fn parse_matches(body: &Value) -> Vec<QueryMatch> {
    let hits = body
        .pointer("/matches")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut matches = Vec::new();
    for hit in hits {
        let id = hit
            .pointer("/id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
        let text = hit
            .pointer("/metadata/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        matches.push(QueryMatch {
            id,
            score,
            metadata: RecordMetadata { text },
        });
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, dimensions: usize) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            values: vec![0.5; dimensions],
            metadata: RecordMetadata {
                text: format!("text for {id}"),
            },
        }
    }

    fn test_index(dimensions: usize) -> PineconeIndex {
        PineconeIndex {
            name: DEFAULT_INDEX_NAME.to_string(),
            host: Url::parse("https://unit-test.invalid").expect("static url"),
            dimensions,
            api_key: "test-key".to_string(),
            client: Client::new(),
        }
    }

    #[test]
    fn index_names_come_from_the_listing() {
        let body = json!({
            "indexes": [
                { "name": "course-syllabus", "dimension": 384 },
                { "name": "other", "dimension": 1536 },
            ]
        });
        assert_eq!(parse_index_names(&body), vec!["course-syllabus", "other"]);
        assert!(parse_index_names(&json!({})).is_empty());
    }

    #[test]
    fn index_description_needs_host_and_dimension() {
        let body = json!({
            "name": "course-syllabus",
            "host": "course-syllabus-abc123.svc.pinecone.io",
            "dimension": 384,
        });
        let (host, dimensions) =
            parse_index_description(&body).expect("description should parse");
        assert_eq!(host, "course-syllabus-abc123.svc.pinecone.io");
        assert_eq!(dimensions, 384);

        let missing = parse_index_description(&json!({ "dimension": 384 }));
        assert!(matches!(missing, Err(StoreError::BackendResponse { .. })));
    }

    #[test]
    fn matches_parse_in_response_order() {
        let body = json!({
            "matches": [
                { "id": "doc-0", "score": 0.92, "metadata": { "text": "Office hours: Mon 3-5pm." } },
                { "id": "doc-3", "score": 0.41, "metadata": { "text": "Grading policy." } },
            ]
        });
        let matches = parse_matches(&body);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "doc-0");
        assert_eq!(matches[0].metadata.text, "Office hours: Mon 3-5pm.");
        assert!(matches[0].score > matches[1].score);
    }

    #[test]
    fn missing_match_fields_fall_back_to_defaults() {
        let body = json!({ "matches": [ { "id": "doc-1" } ] });
        let matches = parse_matches(&body);
        assert_eq!(matches[0].score, 0.0);
        assert_eq!(matches[0].metadata.text, "");
    }

    #[test]
    fn upserts_split_into_batches_of_one_hundred() {
        let records: Vec<VectorRecord> = (0..250)
            .map(|position| record(&format!("doc-{position}"), 3))
            .collect();
        let payloads = batch_payloads(&records);

        assert_eq!(payloads.len(), 3);
        assert_eq!(payloads[0]["vectors"].as_array().map(Vec::len), Some(100));
        assert_eq!(payloads[2]["vectors"].as_array().map(Vec::len), Some(50));
        assert_eq!(payloads[0]["vectors"][0]["id"], "doc-0");
        assert_eq!(
            payloads[0]["vectors"][0]["metadata"]["text"],
            "text for doc-0"
        );
    }

    #[tokio::test]
    async fn upsert_rejects_wrong_dimension_before_sending() {
        let index = test_index(384);
        let result = index.upsert(&[record("doc-0", 3)]).await;
        assert!(matches!(
            result,
            Err(StoreError::DimensionMismatch {
                existing: 384,
                requested: 3
            })
        ));
    }

    #[tokio::test]
    async fn query_rejects_wrong_dimension_before_sending() {
        let index = test_index(384);
        let result = index.query(&[0.1, 0.2], 5).await;
        assert!(matches!(
            result,
            Err(StoreError::DimensionMismatch {
                existing: 384,
                requested: 2
            })
        ));
    }
}
