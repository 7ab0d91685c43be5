// Tenant-scoped vector index. Storage is namespaced by tenant at the top
// level, so a query is structurally unable to observe another tenant's
// vectors; there is no post-query filtering anywhere.

pub mod embeddings;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Nearest-neighbour index over candidate embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts or replaces the vector for `(tenant_id, profile_id)`.
    /// Re-indexing the same profile is last-write-wins.
    async fn upsert(&self, tenant_id: &str, profile_id: Uuid, embedding: Vec<f32>) -> Result<()>;

    /// Top `top_k` entries for the tenant by similarity, descending.
    /// Ties are broken toward the most recently indexed entry.
    async fn query(&self, tenant_id: &str, embedding: &[f32], top_k: usize)
        -> Result<Vec<(Uuid, f32)>>;

    /// Removes one entry. Returns whether it existed.
    async fn remove(&self, tenant_id: &str, profile_id: Uuid) -> Result<bool>;

    fn backend_name(&self) -> &'static str;
}

/// Cosine similarity rescaled from [-1, 1] onto [0, 1] and clamped, so a
/// provider that emits negative components cannot push scores out of range.
/// Mismatched lengths and zero-magnitude vectors score 0.
pub fn cosine_unit_interval(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let cosine = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
    ((cosine + 1.0) / 2.0).clamp(0.0, 1.0)
}

struct StoredEmbedding {
    vector: Vec<f32>,
    seq: u64,
}

/// In-memory backend: per-tenant map of profile id to vector plus an
/// insertion sequence used for tie-breaking.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    tenants: RwLock<HashMap<String, HashMap<Uuid, StoredEmbedding>>>,
    seq: AtomicU64,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, tenant_id: &str, profile_id: Uuid, embedding: Vec<f32>) -> Result<()> {
        let seq = self.seq.fetch_add(1, AtomicOrdering::Relaxed);
        let mut tenants = self.tenants.write().await;
        tenants
            .entry(tenant_id.to_string())
            .or_default()
            .insert(profile_id, StoredEmbedding { vector: embedding, seq });
        Ok(())
    }

    async fn query(
        &self,
        tenant_id: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<(Uuid, f32)>> {
        let tenants = self.tenants.read().await;
        let Some(namespace) = tenants.get(tenant_id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(Uuid, f32, u64)> = namespace
            .iter()
            .map(|(id, stored)| (*id, cosine_unit_interval(embedding, &stored.vector), stored.seq))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(b.2.cmp(&a.2))
        });
        scored.truncate(top_k);

        Ok(scored.into_iter().map(|(id, similarity, _)| (id, similarity)).collect())
    }

    async fn remove(&self, tenant_id: &str, profile_id: Uuid) -> Result<bool> {
        let mut tenants = self.tenants.write().await;
        Ok(tenants
            .get_mut(tenant_id)
            .map(|namespace| namespace.remove(&profile_id).is_some())
            .unwrap_or(false))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![0.5, 0.2, 0.8];
        assert!((cosine_unit_interval(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors_land_midscale() {
        let similarity = cosine_unit_interval(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((similarity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite_vectors_clamp_to_zero() {
        let similarity = cosine_unit_interval(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!(similarity.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs_score_zero() {
        assert_eq!(cosine_unit_interval(&[], &[]), 0.0);
        assert_eq!(cosine_unit_interval(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_unit_interval(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_upsert_and_query_ranks_by_similarity() {
        let index = InMemoryVectorIndex::new();
        let close = Uuid::new_v4();
        let far = Uuid::new_v4();
        index.upsert("tenant-a", close, vec![1.0, 0.0, 0.0]).await.unwrap();
        index.upsert("tenant-a", far, vec![0.0, 1.0, 0.0]).await.unwrap();

        let hits = index.query("tenant-a", &[1.0, 0.1, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, close);
        assert!(hits[0].1 > hits[1].1);
    }

    #[tokio::test]
    async fn test_top_k_truncates() {
        let index = InMemoryVectorIndex::new();
        for _ in 0..5 {
            index.upsert("tenant-a", Uuid::new_v4(), vec![1.0, 0.0]).await.unwrap();
        }
        let hits = index.query("tenant-a", &[1.0, 0.0], 3).await.unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let index = InMemoryVectorIndex::new();
        let ours = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        // Near-identical vectors under different tenants.
        index.upsert("tenant-a", ours, vec![1.0, 0.0]).await.unwrap();
        index.upsert("tenant-b", theirs, vec![1.0, 0.001]).await.unwrap();

        let hits = index.query("tenant-a", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, ours);

        let empty = index.query("tenant-c", &[1.0, 0.0], 10).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_reindex_is_last_write_wins() {
        let index = InMemoryVectorIndex::new();
        let id = Uuid::new_v4();
        index.upsert("tenant-a", id, vec![1.0, 0.0]).await.unwrap();
        index.upsert("tenant-a", id, vec![0.0, 1.0]).await.unwrap();

        let hits = index.query("tenant-a", &[0.0, 1.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_equal_similarity_prefers_most_recent() {
        let index = InMemoryVectorIndex::new();
        let older = Uuid::new_v4();
        let newer = Uuid::new_v4();
        index.upsert("tenant-a", older, vec![1.0, 0.0]).await.unwrap();
        index.upsert("tenant-a", newer, vec![1.0, 0.0]).await.unwrap();

        let hits = index.query("tenant-a", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].0, newer);
        assert_eq!(hits[1].0, older);
    }

    #[tokio::test]
    async fn test_remove_reports_existence() {
        let index = InMemoryVectorIndex::new();
        let id = Uuid::new_v4();
        index.upsert("tenant-a", id, vec![1.0]).await.unwrap();

        assert!(index.remove("tenant-a", id).await.unwrap());
        assert!(!index.remove("tenant-a", id).await.unwrap());
        assert!(index.query("tenant-a", &[1.0], 10).await.unwrap().is_empty());
    }
}
