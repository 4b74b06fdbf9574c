//! Shared knowledge index with copy-on-write reloads

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{info, instrument};

use super::builder::build_snapshot;
use super::snapshot::{KnowledgeSnapshot, Neighbor, NeighborQuery};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::ingredient::{IngredientRecord, KnowledgeBaseFile, RecordId};
use crate::domain::DomainError;

/// Knowledge index handle shared by all query sessions.
///
/// Holds the current snapshot behind a lock that is only taken long enough
/// to clone or replace an `Arc`. Snapshots are built outside the lock, so
/// a reload never blocks readers and a session keeps the snapshot it
/// started with.
#[derive(Debug)]
pub struct KnowledgeIndex {
    current: RwLock<Option<Arc<KnowledgeSnapshot>>>,
    next_version: AtomicU64,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl KnowledgeIndex {
    /// Create an empty index; queries fail with `IndexUnavailable` until loaded
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            current: RwLock::new(None),
            next_version: AtomicU64::new(1),
            embedder,
        }
    }

    /// Build and install the first snapshot
    pub async fn load(&self, file: KnowledgeBaseFile) -> Result<Arc<KnowledgeSnapshot>, DomainError> {
        self.install(file).await
    }

    /// Build a new snapshot and atomically swap it in.
    ///
    /// On failure the previous snapshot stays in place.
    #[instrument(skip(self, file), fields(records = file.len()))]
    pub async fn reload(&self, file: KnowledgeBaseFile) -> Result<Arc<KnowledgeSnapshot>, DomainError> {
        let previous = self.version();
        let snapshot = self.install(file).await?;
        info!(previous, current = snapshot.version(), "Knowledge index reloaded");
        Ok(snapshot)
    }

    async fn install(&self, file: KnowledgeBaseFile) -> Result<Arc<KnowledgeSnapshot>, DomainError> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::new(build_snapshot(file, self.embedder.as_ref(), version).await?);

        let mut current = self
            .current
            .write()
            .map_err(|_| DomainError::internal("Failed to acquire lock"))?;

        // A slower concurrent reload must not replace a newer snapshot
        if current.as_ref().is_none_or(|c| c.version() < version) {
            *current = Some(Arc::clone(&snapshot));
        }

        Ok(snapshot)
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Result<Arc<KnowledgeSnapshot>, DomainError> {
        self.current
            .read()
            .map_err(|_| DomainError::internal("Failed to acquire lock"))?
            .clone()
            .ok_or(DomainError::IndexUnavailable)
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_ok()
    }

    /// Version of the current snapshot (0 when nothing is loaded)
    pub fn version(&self) -> u64 {
        self.snapshot().map(|s| s.version()).unwrap_or(0)
    }

    /// Exact lookup against the current snapshot
    pub fn get(&self, id: &RecordId) -> Result<Option<Arc<IngredientRecord>>, DomainError> {
        Ok(self.snapshot()?.get(id))
    }

    /// Nearest-neighbour lookup against the current snapshot
    pub fn nearest(&self, query: &NeighborQuery) -> Result<Vec<Neighbor>, DomainError> {
        Ok(self.snapshot()?.nearest(query))
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::ingredient::{GlutenStatus, IngredientRecord};
    use crate::domain::script::Language;

    fn id(value: &str) -> RecordId {
        RecordId::new(value).unwrap()
    }

    fn file(extra: Option<&str>) -> KnowledgeBaseFile {
        let mut ingredients = vec![
            IngredientRecord::new(id("wheat"), GlutenStatus::Contains)
                .with_name(Language::English, "wheat"),
            IngredientRecord::new(id("rice"), GlutenStatus::Free).with_name(Language::English, "rice"),
        ];
        if let Some(extra) = extra {
            ingredients.push(
                IngredientRecord::new(id(extra), GlutenStatus::Free).with_name(Language::English, extra),
            );
        }
        KnowledgeBaseFile::new(ingredients, Vec::new())
    }

    fn index() -> KnowledgeIndex {
        KnowledgeIndex::new(Arc::new(MockEmbeddingProvider::new(32)))
    }

    #[tokio::test]
    async fn test_unloaded_index_is_unavailable() {
        let index = index();

        assert!(matches!(index.snapshot(), Err(DomainError::IndexUnavailable)));
        assert!(matches!(index.get(&id("wheat")), Err(DomainError::IndexUnavailable)));
        assert_eq!(index.version(), 0);
    }

    #[tokio::test]
    async fn test_read_after_load() {
        let index = index();
        let input = file(None);
        let ids: Vec<RecordId> = input.ingredients.iter().map(|r| r.id.clone()).collect();

        index.load(input).await.unwrap();

        for id in ids {
            assert_eq!(index.get(&id).unwrap().unwrap().id, id);
        }
    }

    #[tokio::test]
    async fn test_reload_keeps_old_snapshot_for_readers() {
        let index = index();
        index.load(file(None)).await.unwrap();

        let held = index.snapshot().unwrap();
        index.reload(file(Some("millet"))).await.unwrap();

        assert!(held.get(&id("millet")).is_none());
        assert!(index.get(&id("millet")).unwrap().is_some());
        assert!(index.version() > held.version());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let index = index();
        index.load(file(None)).await.unwrap();
        let version = index.version();

        let result = index.reload(KnowledgeBaseFile::default()).await;

        assert!(result.is_err());
        assert_eq!(index.version(), version);
    }

    #[tokio::test]
    async fn test_nearest_against_current_snapshot() {
        let index = index();
        index.load(file(None)).await.unwrap();

        let vector = index.embedder().embed_text("rice").await.unwrap();
        let neighbors = index.nearest(&NeighborQuery::new(vector).with_top_k(1)).unwrap();

        assert_eq!(neighbors[0].record.id.as_str(), "rice");
    }
}
