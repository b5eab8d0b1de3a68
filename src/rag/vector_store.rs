use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use qdrant_client::{Qdrant, QdrantError};
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::embedder::EMBEDDING_DIM;
use crate::error::{RagError, Result};

/// One chunk ready for storage: a point id, its embedding, and the payload
/// that lets retrieval cite the source.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub source: String,
}

/// A similarity-search hit, in the store's descending-score order.
#[derive(Debug, Clone)]
pub struct RetrievedMatch {
    pub text: String,
    pub source: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    pub total_vector_count: u64,
    pub capacity: Option<u64>,
}

pub struct VectorStore {
    client: Qdrant,
    collection: String,
}

impl VectorStore {
    pub async fn connect(url: &str, api_key: Option<String>, collection: &str) -> Result<Self> {
        tracing::info!("Connecting to vector store at {}", url);
        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .build()
            .map_err(|e| RagError::VectorStoreUnavailable(format!("client build failed: {e}")))?;

        let store = Self { client, collection: collection.to_string() };
        store.ensure_collection().await?;
        tracing::info!("Vector store collection '{}' ready", store.collection);
        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(classify_error)?;
        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(EMBEDDING_DIM as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(classify_error)?;
        }
        Ok(())
    }

    /// Upsert all records in one batched call. Re-upserting an id overwrites
    /// the prior point, so ingesting the same file twice does not grow the
    /// corpus.
    pub async fn upsert(&self, records: Vec<ChunkRecord>) -> Result<()> {
        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let mut payload = JsonMap::new();
                payload.insert("text".to_string(), JsonValue::String(record.text));
                payload.insert("source".to_string(), JsonValue::String(record.source));
                PointStruct::new(record.id, record.vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
            .await
            .map_err(classify_error)?;
        Ok(())
    }

    /// Top-k nearest neighbors, ordered by descending similarity score.
    pub async fn query(&self, vector: Vec<f32>, top_k: u64) -> Result<Vec<RetrievedMatch>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true),
            )
            .await
            .map_err(classify_error)?;

        let matches = response
            .result
            .into_iter()
            .filter_map(|point| {
                let text = point.payload.get("text")?.as_str()?.to_string();
                let source = point
                    .payload
                    .get("source")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                Some(RetrievedMatch { text, source, score: point.score })
            })
            .collect();
        Ok(matches)
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(classify_error)?;
        let total_vector_count = info.result.and_then(|r| r.points_count).unwrap_or(0);
        // Qdrant reports no quota; capacity stays unknown.
        Ok(StoreStats { total_vector_count, capacity: None })
    }
}

fn classify_error(err: QdrantError) -> RagError {
    classify_message(err.to_string())
}

/// Quota exhaustion must read differently from a connectivity failure: the
/// user can fix the former by pruning the corpus or upgrading the plan.
fn classify_message(message: String) -> RagError {
    let lower = message.to_lowercase();
    let capacity = ["quota", "capacity", "storage limit", "limit exceeded", "payment"]
        .iter()
        .any(|needle| lower.contains(needle));
    if capacity {
        RagError::VectorStoreCapacity(message)
    } else {
        RagError::VectorStoreUnavailable(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_failures_are_capacity_errors() {
        let err = classify_message("write rejected: cluster quota exceeded".to_string());
        assert!(matches!(err, RagError::VectorStoreCapacity(_)));
        assert!(err.to_string().contains("free tier"));
    }

    #[test]
    fn transport_failures_are_unavailability() {
        let err = classify_message("transport error: connection refused".to_string());
        assert!(matches!(err, RagError::VectorStoreUnavailable(_)));
    }
}
