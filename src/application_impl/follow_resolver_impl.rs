use crate::application_port::FollowResolver;
use crate::domain_model::*;
use crate::domain_port::*;
use futures_util::future::try_join_all;
use std::sync::Arc;

pub struct RealFollowResolver {
    store: Arc<dyn RelationshipStore>,
}

impl RealFollowResolver {
    pub fn new(store: Arc<dyn RelationshipStore>) -> Self {
        Self { store }
    }
}

/// `false` without a store call when there is no viewer or the viewer is
/// looking at their own profile.
async fn is_following(
    store: &dyn RelationshipStore,
    viewer: Option<&UserId>,
    target: &UserId,
) -> Result<bool, StoreError> {
    match viewer {
        Some(viewer) if viewer != target => store.edge_exists(viewer, target).await,
        _ => Ok(false),
    }
}

#[async_trait::async_trait]
impl FollowResolver for RealFollowResolver {
    async fn resolve(
        &self,
        viewer: Option<&UserId>,
        target: &UserId,
    ) -> Result<RelationshipView, StoreError> {
        let (is_following, follower_count) = tokio::try_join!(
            is_following(self.store.as_ref(), viewer, target),
            self.store.count_edges_to(target),
        )?;

        Ok(RelationshipView {
            is_following,
            follower_count,
        })
    }

    async fn resolve_many(
        &self,
        viewer: Option<&UserId>,
        targets: &[UserId],
    ) -> Result<Vec<RelationshipView>, StoreError> {
        try_join_all(targets.iter().map(|target| self.resolve(viewer, target))).await
    }
}
