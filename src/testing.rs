//! Test doubles shared by the unit tests.

use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_document::DocumentRelationshipStore;
use crate::infra_memory::MemoryDocumentStore;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create_edge: usize,
    pub delete_edge: usize,
    pub count_edges_to: usize,
    pub edge_exists: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.create_edge + self.delete_edge + self.count_edges_to + self.edge_exists
    }
}

#[derive(Default)]
struct Failures {
    exists: Option<StoreError>,
    /// successes left before counts start failing
    count: Option<(usize, StoreError)>,
    create: Option<StoreError>,
    delete: Option<StoreError>,
    race_create: bool,
    race_delete: bool,
}

/// [`RelationshipStore`] over an in-memory collection that counts calls,
/// can add latency, and can inject failures.
pub struct RecordingStore {
    inner: DocumentRelationshipStore,
    latency: Option<Duration>,
    create_edge: AtomicUsize,
    delete_edge: AtomicUsize,
    count_edges_to: AtomicUsize,
    edge_exists: AtomicUsize,
    failures: Mutex<Failures>,
}

impl RecordingStore {
    fn over(documents: MemoryDocumentStore) -> Self {
        Self {
            inner: DocumentRelationshipStore::new(
                Arc::new(documents),
                Self::collection(),
                Duration::from_secs(5),
            ),
            latency: None,
            create_edge: AtomicUsize::new(0),
            delete_edge: AtomicUsize::new(0),
            count_edges_to: AtomicUsize::new(0),
            edge_exists: AtomicUsize::new(0),
            failures: Mutex::new(Failures::default()),
        }
    }

    fn collection() -> CollectionId {
        CollectionId("followers".into())
    }

    /// Backing store without a uniqueness constraint.
    pub fn memory() -> Self {
        Self::over(MemoryDocumentStore::new())
    }

    /// Backing store that rejects duplicate `(followerId, followedId)`.
    pub fn memory_unique() -> Self {
        Self::over(
            MemoryDocumentStore::new()
                .with_unique_index(Self::collection(), &[FOLLOWER_FIELD, FOLLOWED_FIELD]),
        )
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            create_edge: self.create_edge.load(Ordering::SeqCst),
            delete_edge: self.delete_edge.load(Ordering::SeqCst),
            count_edges_to: self.count_edges_to.load(Ordering::SeqCst),
            edge_exists: self.edge_exists.load(Ordering::SeqCst),
        }
    }

    /// Insert an edge without touching counters or failure injection.
    pub async fn seed(&self, follower: &str, followed: &str) {
        self.inner
            .create_edge(&follower.into(), &followed.into())
            .await
            .expect("seed edge");
    }

    /// Edges stored for `followed`, read around counters and injection.
    pub async fn stored_edges_to(&self, followed: &str) -> u64 {
        self.inner
            .count_edges_to(&followed.into())
            .await
            .expect("count stored edges")
    }

    pub fn fail_exists_with(&self, err: StoreError) {
        self.failures.lock().unwrap().exists = Some(err);
    }

    pub fn fail_counts_with(&self, err: StoreError) {
        self.fail_counts_after(0, err);
    }

    pub fn fail_counts_after(&self, successes: usize, err: StoreError) {
        self.failures.lock().unwrap().count = Some((successes, err));
    }

    pub fn fail_creates_with(&self, err: StoreError) {
        self.failures.lock().unwrap().create = Some(err);
    }

    pub fn fail_deletes_with(&self, err: StoreError) {
        self.failures.lock().unwrap().delete = Some(err);
    }

    /// The next `create_edge` finds that another writer inserted the same
    /// edge just before it.
    pub fn race_next_create(&self) {
        self.failures.lock().unwrap().race_create = true;
    }

    /// The next `delete_edge` finds that another writer removed the edge
    /// just before it.
    pub fn race_next_delete(&self) {
        self.failures.lock().unwrap().race_delete = true;
    }

    pub fn clear_failures(&self) {
        *self.failures.lock().unwrap() = Failures::default();
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn count_failure(&self) -> Option<StoreError> {
        let mut failures = self.failures.lock().unwrap();
        match failures.count.as_mut() {
            Some((0, err)) => Some(err.clone()),
            Some((left, _)) => {
                *left -= 1;
                None
            }
            None => None,
        }
    }
}

#[async_trait::async_trait]
impl RelationshipStore for RecordingStore {
    async fn create_edge(&self, follower: &UserId, followed: &UserId) -> Result<(), StoreError> {
        self.create_edge.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        let (injected, race) = {
            let mut failures = self.failures.lock().unwrap();
            let race = std::mem::take(&mut failures.race_create);
            (failures.create.clone(), race)
        };
        if let Some(err) = injected {
            return Err(err);
        }
        if race {
            let _ = self.inner.create_edge(follower, followed).await;
        }
        self.inner.create_edge(follower, followed).await
    }

    async fn delete_edge(&self, follower: &UserId, followed: &UserId) -> Result<(), StoreError> {
        self.delete_edge.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        let (injected, race) = {
            let mut failures = self.failures.lock().unwrap();
            let race = std::mem::take(&mut failures.race_delete);
            (failures.delete.clone(), race)
        };
        if let Some(err) = injected {
            return Err(err);
        }
        if race {
            let _ = self.inner.delete_edge(follower, followed).await;
        }
        self.inner.delete_edge(follower, followed).await
    }

    async fn count_edges_to(&self, followed: &UserId) -> Result<u64, StoreError> {
        self.count_edges_to.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if let Some(err) = self.count_failure() {
            return Err(err);
        }
        self.inner.count_edges_to(followed).await
    }

    async fn edge_exists(&self, follower: &UserId, followed: &UserId) -> Result<bool, StoreError> {
        self.edge_exists.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        let injected = self.failures.lock().unwrap().exists.clone();
        if let Some(err) = injected {
            return Err(err);
        }
        self.inner.edge_exists(follower, followed).await
    }
}
