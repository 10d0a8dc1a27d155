//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! Concentrates all Qdrant interactions behind [`VectorIndex`],
//! hiding the verbose builder pattern from the rest of the crate.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointId, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QValue, Vector, VectorParamsBuilder,
    Vectors, value, vectors,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::StoreFuture;
use crate::config::Config;
use crate::corpus::EntryMetadata;
use crate::errors::StoreError;
use crate::index::{SearchHit, VectorIndex, VectorRecord};

/// Qdrant-backed [`VectorIndex`].
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
}

impl QdrantIndex {
    /// Creates a new index handle from the given configuration.
    ///
    /// Uses the builder-based API of `qdrant-client` and supports
    /// optional API key authentication.
    pub fn new(cfg: &Config) -> Result<Self, StoreError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
        })
    }
}

impl VectorIndex for QdrantIndex {
    fn count(&self) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let exists = self
                .client
                .collection_exists(&self.collection)
                .await
                .map_err(|e| StoreError::Qdrant(e.to_string()))?;
            if !exists {
                debug!("Collection '{}' does not exist yet", self.collection);
                return Ok(0);
            }

            let res = self
                .client
                .count(CountPointsBuilder::new(&self.collection).exact(true))
                .await
                .map_err(|e| StoreError::Qdrant(e.to_string()))?;

            Ok(res.result.map(|r| r.count).unwrap_or(0))
        })
    }

    fn ensure_ready(&self, dim: usize) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            info!(
                "Ensuring collection '{}' with size={} distance=Cosine",
                self.collection, dim
            );

            match self.client.collection_info(&self.collection).await {
                Ok(_) => {
                    debug!("Collection '{}' already exists", self.collection);
                    return Ok(());
                }
                Err(err) => {
                    warn!(
                        "Collection '{}' not found, will be created (error={})",
                        self.collection, err
                    );
                }
            }

            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(VectorParamsBuilder::new(dim as u64, Distance::Cosine)),
                )
                .await
                .map_err(|e| StoreError::Qdrant(e.to_string()))?;

            info!("Collection '{}' created successfully", self.collection);
            Ok(())
        })
    }

    fn upsert(&self, records: Vec<VectorRecord>) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            if records.is_empty() {
                debug!("No records provided for upsert");
                return Ok(0);
            }

            let submitted = records.len() as u64;
            info!(
                "Upserting {} points into collection '{}'",
                submitted, self.collection
            );

            let points: Vec<PointStruct> = records.into_iter().map(to_point).collect();
            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
                .await
                .map_err(|e| StoreError::Qdrant(e.to_string()))?;

            Ok(submitted)
        })
    }

    fn search(&self, vector: Vec<f32>, top_k: u64) -> StoreFuture<'_, Vec<SearchHit>> {
        Box::pin(async move {
            info!("Searching in '{}' with top_k={}", self.collection, top_k);

            let builder =
                SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);

            let res = self
                .client
                .search_points(builder)
                .await
                .map_err(|e| StoreError::Qdrant(e.to_string()))?;

            // Qdrant returns hits best-first; preserve that order.
            let mut out = Vec::with_capacity(res.result.len());
            for r in res.result {
                out.push(hit_from_payload(r.score, r.payload));
            }

            debug!("Search completed: {} hits returned", out.len());
            Ok(out)
        })
    }
}

/// Deterministic UUIDv5 from the corpus entry id. Qdrant point ids
/// must be UUIDs or integers; v5 keeps the mapping stable so upserts
/// by the same entry id always land on the same point.
fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

/// Builds the Qdrant point for one record: vector + compact payload
/// (text + `{id, category}` metadata).
fn to_point(r: VectorRecord) -> PointStruct {
    let mut payload: HashMap<String, QValue> = HashMap::new();
    payload.insert("text".into(), qstring(&r.text));
    payload.insert("id".into(), qstring(&r.metadata.id));
    payload.insert("category".into(), qstring(&r.metadata.category));

    let pid: PointId = stable_uuid(&r.id).to_string().into();
    let vectors = Vectors {
        vectors_options: Some(vectors::VectorsOptions::Vector(Vector {
            data: r.vector,
            indices: None,
            vectors_count: None,
            vector: None,
        })),
    };

    PointStruct {
        id: Some(pid),
        payload,
        vectors: Some(vectors),
        ..Default::default()
    }
}

/// Wraps a string into a Qdrant `Value`.
fn qstring(s: &str) -> QValue {
    QValue {
        kind: Some(value::Kind::StringValue(s.to_string())),
    }
}

fn hit_from_payload(score: f32, payload: HashMap<String, QValue>) -> SearchHit {
    let get = |key: &str| -> String {
        payload
            .get(key)
            .and_then(|v| match &v.kind {
                Some(value::Kind::StringValue(s)) => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_default()
    };

    SearchHit {
        content: get("text"),
        metadata: EntryMetadata {
            id: get("id"),
            category: get("category"),
        },
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_uuid_is_deterministic() {
        assert_eq!(stable_uuid("vg_001"), stable_uuid("vg_001"));
        assert_ne!(stable_uuid("vg_001"), stable_uuid("vg_002"));
    }

    #[test]
    fn hit_reconstruction_reads_payload_fields() {
        let mut payload = HashMap::new();
        payload.insert("text".to_string(), qstring("Category: Art\nInfo: x"));
        payload.insert("id".to_string(), qstring("vg_001"));
        payload.insert("category".to_string(), qstring("Art"));

        let hit = hit_from_payload(0.9, payload);
        assert_eq!(hit.content, "Category: Art\nInfo: x");
        assert_eq!(
            hit.metadata,
            EntryMetadata {
                id: "vg_001".into(),
                category: "Art".into()
            }
        );
    }
}
