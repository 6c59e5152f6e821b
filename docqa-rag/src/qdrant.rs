//! Qdrant vector index backend.
//!
//! Provides [`QdrantIndex`] which implements [`VectorIndex`] using the
//! [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::qdrant::QdrantIndex;
//!
//! let index = QdrantIndex::new("http://localhost:6334", "documents", 384)?;
//! index.upsert(entries).await?;
//! let hits = index.query(&query_embedding, 5).await?;
//! ```

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{RagError, Result};
use crate::vectorstore::{IndexEntry, ScoredEntry, VectorIndex};

/// A [`VectorIndex`] backed by [Qdrant](https://qdrant.tech/).
///
/// Manages one named collection with cosine distance. The collection is
/// created lazily, exactly once per index instance, on the first operation
/// that needs it; concurrent first operations do not race the creation.
/// Points use the numeric `chunk_id` as their id, so upserts stay
/// idempotent across re-ingestion runs.
///
/// Qdrant reports cosine *similarity* for search hits; the adapter converts
/// it to the cosine distance in `[0, 2]` that the engine's score mapping
/// expects.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    dimensions: usize,
    ready: OnceCell<()>,
}

impl QdrantIndex {
    /// Create an index over the collection at the given URL.
    pub fn new(url: &str, collection: impl Into<String>, dimensions: usize) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self::from_client(client, collection, dimensions))
    }

    /// Create an index from an existing client.
    pub fn from_client(client: Qdrant, collection: impl Into<String>, dimensions: usize) -> Self {
        Self { client, collection: collection.into(), dimensions, ready: OnceCell::new() }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::IndexUnavailable { backend: "qdrant".to_string(), message: e.to_string() }
    }

    /// Create the collection if it does not exist yet, at most once per
    /// index instance. A failed creation leaves the cell empty so the next
    /// operation retries.
    async fn ensure_collection(&self) -> Result<()> {
        self.ready.get_or_try_init(|| self.create_collection_if_missing()).await.map(|_| ())
    }

    async fn create_collection_if_missing(&self) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        let exists = collections.collections.iter().any(|c| c.name == self.collection);
        if exists {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(self.collection.as_str()).vectors_config(
                    VectorParamsBuilder::new(self.dimensions as u64, Distance::Cosine),
                ),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(
            collection = %self.collection,
            dimensions = self.dimensions,
            "created qdrant collection"
        );
        Ok(())
    }

    /// Extract a string from a Qdrant payload value.
    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Extract a non-negative integer from a Qdrant payload value.
    fn extract_u64(value: &QdrantValue) -> Option<u64> {
        match &value.kind {
            Some(Kind::IntegerValue(i)) => u64::try_from(*i).ok(),
            _ => None,
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        self.ensure_collection().await?;

        let count = entries.len();
        let points: Vec<PointStruct> = entries
            .into_iter()
            .map(|entry| {
                let mut payload_map = serde_json::Map::new();
                payload_map.insert("id".to_string(), serde_json::Value::String(entry.id));
                payload_map
                    .insert("content".to_string(), serde_json::Value::String(entry.content));
                payload_map
                    .insert("doc_name".to_string(), serde_json::Value::String(entry.doc_name));
                payload_map.insert("page".to_string(), serde_json::Value::from(entry.page));
                payload_map
                    .insert("chunk_id".to_string(), serde_json::Value::from(entry.chunk_id));

                let payload =
                    Payload::try_from(serde_json::Value::Object(payload_map)).unwrap_or_default();

                PointStruct::new(entry.chunk_id, entry.embedding, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(self.collection.as_str(), points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, count, "upserted entries to qdrant");
        Ok(count)
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        self.ensure_collection().await?;

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(self.collection.as_str(), embedding.to_vec(), k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let hits = response
            .result
            .into_iter()
            .map(|scored| {
                let chunk_id = scored
                    .id
                    .as_ref()
                    .and_then(|pid| match &pid.point_id_options {
                        Some(PointIdOptions::Num(n)) => Some(*n),
                        _ => None,
                    })
                    .unwrap_or_default();

                let id = scored
                    .payload
                    .get("id")
                    .and_then(Self::extract_string)
                    .unwrap_or_else(|| format!("chunk_{chunk_id}"));
                let content =
                    scored.payload.get("content").and_then(Self::extract_string).unwrap_or_default();
                let doc_name = scored
                    .payload
                    .get("doc_name")
                    .and_then(Self::extract_string)
                    .unwrap_or_default();
                let page =
                    scored.payload.get("page").and_then(Self::extract_u64).unwrap_or(0) as u32;

                ScoredEntry {
                    entry: IndexEntry {
                        id,
                        embedding: Vec::new(),
                        content,
                        doc_name,
                        page,
                        chunk_id,
                    },
                    distance: 1.0 - scored.score,
                }
            })
            .collect();

        Ok(hits)
    }

    async fn clear(&self) -> Result<()> {
        self.ensure_collection().await?;

        self.client
            .delete_points(
                DeletePointsBuilder::new(self.collection.as_str())
                    .points(Filter::default())
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, "cleared qdrant collection");
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        self.ensure_collection().await?;

        let response = self
            .client
            .count(CountPointsBuilder::new(self.collection.as_str()).exact(true))
            .await
            .map_err(Self::map_err)?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}
