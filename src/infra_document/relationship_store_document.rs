use crate::domain_model::*;
use crate::domain_port::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// [`RelationshipStore`] over a single document collection holding
/// [`FollowEdge`] documents.
pub struct DocumentRelationshipStore {
    documents: Arc<dyn DocumentStore>,
    collection: CollectionId,
    request_timeout: Duration,
}

impl DocumentRelationshipStore {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        collection: CollectionId,
        request_timeout: Duration,
    ) -> Self {
        Self {
            documents,
            collection,
            request_timeout,
        }
    }

    fn pair_filters(follower: &UserId, followed: &UserId) -> Vec<Filter> {
        vec![
            Filter::equal(FOLLOWER_FIELD, follower.as_str()),
            Filter::equal(FOLLOWED_FIELD, followed.as_str()),
        ]
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, DocumentStoreError>>,
    {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(res) => res.map_err(|e| {
                warn!(collection = %self.collection, op, "document store call failed: {e}");
                StoreError::from(e)
            }),
            Err(_) => Err(StoreError::Timeout {
                origin: format!(
                    "{op} on {} exceeded {:?}",
                    self.collection, self.request_timeout
                ),
            }),
        }
    }
}

#[async_trait::async_trait]
impl RelationshipStore for DocumentRelationshipStore {
    async fn create_edge(&self, follower: &UserId, followed: &UserId) -> Result<(), StoreError> {
        let fields = FollowEdge::new(follower.clone(), followed.clone()).to_fields();
        let doc = self
            .bounded("insert", self.documents.insert(&self.collection, fields))
            .await?;
        debug!(collection = %self.collection, document = %doc.id, %follower, %followed, "edge created");
        Ok(())
    }

    async fn delete_edge(&self, follower: &UserId, followed: &UserId) -> Result<(), StoreError> {
        let query = DocumentQuery::page(Self::pair_filters(follower, followed));
        let mut deleted = 0usize;
        // duplicates can outnumber one page; drain until a page comes back empty
        loop {
            let matches = self
                .bounded("query", self.documents.query(&self.collection, &query))
                .await?;
            if matches.documents.is_empty() {
                break;
            }

            let mut removed = 0usize;
            for doc in &matches.documents {
                match self
                    .bounded("delete", self.documents.delete(&self.collection, &doc.id))
                    .await
                {
                    Ok(()) => removed += 1,
                    // removed by a concurrent writer between query and delete
                    Err(StoreError::NotFound { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
            if removed == 0 {
                break;
            }
            deleted += removed;
        }

        if deleted == 0 {
            return Err(StoreError::NotFound {
                origin: format!("no edge {follower}->{followed} in {}", self.collection),
            });
        }
        debug!(collection = %self.collection, deleted, %follower, %followed, "edge deleted");
        Ok(())
    }

    async fn count_edges_to(&self, followed: &UserId) -> Result<u64, StoreError> {
        let query = DocumentQuery::count_only(vec![Filter::equal(FOLLOWED_FIELD, followed.as_str())]);
        let list = self
            .bounded("query", self.documents.query(&self.collection, &query))
            .await?;
        Ok(list.total)
    }

    async fn edge_exists(&self, follower: &UserId, followed: &UserId) -> Result<bool, StoreError> {
        let query = DocumentQuery::count_only(Self::pair_filters(follower, followed));
        let list = self
            .bounded("query", self.documents.query(&self.collection, &query))
            .await?;
        Ok(list.total > 0)
    }
}
