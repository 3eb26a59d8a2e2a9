use super::pair_guard::PairGuards;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct RealFollowCommandHandler {
    store: Arc<dyn RelationshipStore>,
    count_strategy: CountStrategy,
    guards: PairGuards,
}

impl RealFollowCommandHandler {
    pub fn new(store: Arc<dyn RelationshipStore>, count_strategy: CountStrategy) -> Self {
        Self {
            store,
            count_strategy,
            guards: PairGuards::new(),
        }
    }

    /// Pairs with a command currently running or queued.
    pub fn in_flight(&self) -> usize {
        self.guards.in_flight()
    }

    async fn current(&self, pair: &FollowPair) -> Result<(bool, u64), StoreError> {
        tokio::try_join!(
            self.store.edge_exists(pair.follower(), pair.followed()),
            self.store.count_edges_to(pair.followed()),
        )
    }

    /// Count after a committed mutation. A failed re-query falls back to the
    /// optimistic value because the edge change itself already happened.
    async fn count_after(&self, pair: &FollowPair, optimistic: u64) -> u64 {
        match self.count_strategy {
            CountStrategy::Optimistic => optimistic,
            CountStrategy::Requery => self.recount(pair, optimistic).await,
        }
    }

    async fn recount(&self, pair: &FollowPair, optimistic: u64) -> u64 {
        match self.store.count_edges_to(pair.followed()).await {
            Ok(count) => count,
            Err(e) => {
                warn!(%pair, "follower re-count failed, using {optimistic}: {e}");
                optimistic
            }
        }
    }

    async fn follow(&self, pair: &FollowPair) -> Result<RelationshipView, CommandError> {
        let (exists, previous) = self.current(pair).await?;
        if exists {
            debug!(%pair, "already following");
            return Ok(RelationshipView::new(true, previous));
        }

        match self.store.create_edge(pair.follower(), pair.followed()).await {
            Ok(()) => {}
            Err(StoreError::Conflict { origin }) => {
                // another writer created the edge after our existence check
                debug!(%pair, "create conflicted, edge already present: {origin}");
                let count = self.recount(pair, previous.saturating_add(1)).await;
                return Ok(RelationshipView::new(true, count));
            }
            Err(e) => return Err(e.into()),
        }

        info!(%pair, "followed");
        let follower_count = self.count_after(pair, previous.saturating_add(1)).await;
        Ok(RelationshipView::new(true, follower_count))
    }

    async fn unfollow(&self, pair: &FollowPair) -> Result<RelationshipView, CommandError> {
        let (exists, previous) = self.current(pair).await?;
        if !exists {
            debug!(%pair, "already not following");
            return Ok(RelationshipView::new(false, previous));
        }

        match self.store.delete_edge(pair.follower(), pair.followed()).await {
            Ok(()) => {}
            Err(StoreError::NotFound { origin }) => {
                debug!(%pair, "delete found nothing, edge already gone: {origin}");
                let count = self.recount(pair, previous.saturating_sub(1)).await;
                return Ok(RelationshipView::new(false, count));
            }
            Err(e) => return Err(e.into()),
        }

        info!(%pair, "unfollowed");
        let follower_count = self.count_after(pair, previous.saturating_sub(1)).await;
        Ok(RelationshipView::new(false, follower_count))
    }
}

#[async_trait::async_trait]
impl FollowCommandHandler for RealFollowCommandHandler {
    async fn execute(
        &self,
        actor: &UserId,
        target: &UserId,
        intent: FollowIntent,
    ) -> Result<RelationshipView, CommandError> {
        let pair = FollowPair::new(actor.clone(), target.clone());
        if pair.is_self_loop() {
            debug!(%actor, "rejected self {intent}");
            return Err(CommandError::SelfFollowRejected);
        }

        let _lease = self.guards.acquire(pair.clone()).await;
        let result = match intent {
            FollowIntent::Follow => self.follow(&pair).await,
            FollowIntent::Unfollow => self.unfollow(&pair).await,
        };

        if let Err(e) = &result {
            warn!(%pair, %intent, "follow command failed: {e}");
        }
        result
    }
}
