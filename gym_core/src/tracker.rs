//! The store wired to a blob store.
//!
//! Every mutation runs inside one async mutex together with the write of the
//! resulting snapshot, so writes never interleave and readers never see a
//! half-applied mutation. In-memory state is the source of truth: a failed
//! write is logged and retried on the next mutation or `flush`.

use crate::catalog::Catalog;
use crate::persist::{load_state, save_state, BlobStore};
use crate::transfer::ImportMode;
use crate::{GymStore, IdSupplier, Result, UuidSupplier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Owns the store and mirrors its state into blob `name`
pub struct Tracker<B: BlobStore> {
    store: Mutex<GymStore>,
    blobs: B,
    name: String,
    dirty: AtomicBool,
}

impl<B: BlobStore> Tracker<B> {
    /// Load the saved state from `blobs` (empty if absent or unreadable)
    pub async fn open(catalog: Arc<Catalog>, blobs: B, name: impl Into<String>) -> Self {
        Self::open_with_ids(catalog, Box::new(UuidSupplier), blobs, name).await
    }

    pub async fn open_with_ids(
        catalog: Arc<Catalog>,
        ids: Box<dyn IdSupplier>,
        blobs: B,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let state = load_state(&blobs, &name).await;
        tracing::info!(
            "Opened tracker '{}' with {} logs and {} weigh-ins",
            name,
            state.exercise_logs.len(),
            state.weight_entries.len()
        );

        Self {
            store: Mutex::new(GymStore::from_state(catalog, ids, state)),
            blobs,
            name,
            dirty: AtomicBool::new(false),
        }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// True while the last write failed and has not been retried successfully
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Run a read-only query against the store
    pub async fn read<T>(&self, f: impl FnOnce(&GymStore) -> T) -> T {
        let store = self.store.lock().await;
        f(&*store)
    }

    /// Apply a mutation and persist the resulting state
    ///
    /// Persistence failures do not undo the mutation.
    pub async fn mutate<T>(&self, f: impl FnOnce(&mut GymStore) -> T) -> T {
        let mut store = self.store.lock().await;
        let out = f(&mut *store);
        if let Err(e) = self.persist(&store).await {
            tracing::warn!("Keeping changes in memory, failed to save '{}': {}", self.name, e);
        }
        out
    }

    /// Write the current state now, surfacing any error
    pub async fn flush(&self) -> Result<()> {
        let store = self.store.lock().await;
        self.persist(&store).await
    }

    /// Export the current state as a JSON document
    pub async fn export_data(&self, pretty: bool) -> Result<String> {
        let store = self.store.lock().await;
        store.export_data_with(pretty)
    }

    /// Import an export document and persist the result
    ///
    /// A document that fails to parse leaves state and storage untouched.
    pub async fn import_data(&self, text: &str, mode: ImportMode) -> Result<()> {
        let mut store = self.store.lock().await;
        store.import_data(text, mode)?;
        if let Err(e) = self.persist(&store).await {
            tracing::warn!("Imported data kept in memory, failed to save '{}': {}", self.name, e);
        }
        Ok(())
    }

    /// Clear all state and delete the saved blob
    pub async fn reset(&self) -> Result<()> {
        let mut store = self.store.lock().await;
        store.reset();
        self.blobs.remove(&self.name).await?;
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn persist(&self, store: &GymStore) -> Result<()> {
        match save_state(&self.blobs, &self.name, store.state()).await {
            Ok(()) => {
                self.dirty.store(false, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                self.dirty.store(true, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryBlobStore;
    use crate::{build_default_catalog, Error, MuscleGroup};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    const BLOB: &str = "gym-tracker-test";

    /// Blob store whose writes fail while `failing` is set
    #[derive(Default)]
    struct FlakyBlobStore {
        inner: MemoryBlobStore,
        failing: AtomicBool,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl BlobStore for FlakyBlobStore {
        async fn get(&self, name: &str) -> Result<Option<String>> {
            self.inner.get(name).await
        }

        async fn set(&self, name: &str, value: &str) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Error::Persistence("disk full".into()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(name, value).await
        }

        async fn remove(&self, name: &str) -> Result<()> {
            self.inner.remove(name).await
        }
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(build_default_catalog())
    }

    #[tokio::test]
    async fn test_mutations_are_persisted_and_reloaded() {
        let tracker = Tracker::open(catalog(), MemoryBlobStore::new(), BLOB).await;
        tracker.mutate(|s| s.add_weight(80.0, None)).await.unwrap();
        tracker
            .mutate(|s| s.log_exercise("ex_squat", 5, 5, 100.0, None))
            .await
            .unwrap();

        let saved = tracker.blobs().get(BLOB).await.unwrap().unwrap();
        let reopened_blobs = MemoryBlobStore::new();
        reopened_blobs.set(BLOB, &saved).await.unwrap();

        let reopened = Tracker::open(catalog(), reopened_blobs, BLOB).await;
        let (weights, rating) = reopened
            .read(|s| {
                (
                    s.weight_entries().len(),
                    s.muscle_rating(MuscleGroup::Quads).cloned(),
                )
            })
            .await;
        assert_eq!(weights, 1);
        assert_eq!(rating.unwrap().total_volume, 2500.0);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_and_retries() {
        let blobs = FlakyBlobStore::default();
        blobs.failing.store(true, Ordering::SeqCst);
        let tracker = Tracker::open(catalog(), blobs, BLOB).await;

        tracker.mutate(|s| s.add_weight(75.0, None)).await.unwrap();
        assert!(tracker.is_dirty());
        assert_eq!(tracker.read(|s| s.weight_entries().len()).await, 1);
        assert!(tracker.flush().await.is_err());

        tracker.blobs().failing.store(false, Ordering::SeqCst);
        tracker.flush().await.unwrap();
        assert!(!tracker.is_dirty());

        let saved = tracker.blobs().get(BLOB).await.unwrap().unwrap();
        assert!(saved.contains("75"));
    }

    #[tokio::test]
    async fn test_failed_import_writes_nothing() {
        let tracker = Tracker::open(catalog(), FlakyBlobStore::default(), BLOB).await;
        tracker.mutate(|s| s.add_weight(70.0, None)).await;
        let writes = tracker.blobs().writes.load(Ordering::SeqCst);

        let err = tracker.import_data("][", ImportMode::Replace).await.unwrap_err();
        assert!(matches!(err, Error::InvalidDataFormat(_)));
        assert_eq!(tracker.blobs().writes.load(Ordering::SeqCst), writes);
        assert_eq!(tracker.read(|s| s.weight_entries().len()).await, 1);
    }

    #[tokio::test]
    async fn test_export_import_between_trackers() {
        let source = Tracker::open(catalog(), MemoryBlobStore::new(), BLOB).await;
        source.mutate(|s| s.add_weight(90.0, None)).await;
        source.mutate(|s| s.set_height(Some(190.0))).await;
        let exported = source.export_data(true).await.unwrap();

        let target = Tracker::open(catalog(), MemoryBlobStore::new(), BLOB).await;
        target.import_data(&exported, ImportMode::Replace).await.unwrap();
        let source_state = source.read(|s| s.state().clone()).await;
        let target_state = target.read(|s| s.state().clone()).await;
        assert_eq!(source_state, target_state);

        target.import_data(&exported, ImportMode::Merge).await.unwrap();
        assert_eq!(target.read(|s| s.weight_entries().len()).await, 2);
        assert!(target.blobs().get(BLOB).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_mutations_all_land() {
        let tracker = Arc::new(Tracker::open(catalog(), MemoryBlobStore::new(), BLOB).await);

        let mut handles = Vec::new();
        for i in 0..8 {
            let tracker = Arc::clone(&tracker);
            let weight = 20.0 + f64::from(i);
            handles.push(tokio::spawn(async move {
                tracker
                    .mutate(|s| s.log_exercise("ex_bench_press", 3, 10, weight, None))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let (logs, count) = tracker
            .read(|s| {
                (
                    s.exercise_logs().len(),
                    s.muscle_rating(MuscleGroup::Chest).map(|r| r.workout_count),
                )
            })
            .await;
        assert_eq!(logs, 8);
        assert_eq!(count, Some(8));

        let saved = tracker.blobs().get(BLOB).await.unwrap().unwrap();
        let state: crate::PersistedState = serde_json::from_str(&saved).unwrap();
        assert_eq!(state.exercise_logs.len(), 8);
    }

    #[tokio::test]
    async fn test_reset_clears_state_and_blob() {
        let tracker = Tracker::open(catalog(), MemoryBlobStore::new(), BLOB).await;
        tracker.mutate(|s| s.add_weight(88.0, None)).await;

        tracker.reset().await.unwrap();
        assert!(tracker.read(|s| s.weight_entries().is_empty()).await);
        assert!(tracker.blobs().get(BLOB).await.unwrap().is_none());
    }
}
