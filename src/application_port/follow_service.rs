use crate::domain_model::*;
use crate::domain_port::StoreError;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("a user cannot follow themselves")]
    SelfFollowRejected,
    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

/// How the command handler derives the follower count after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountStrategy {
    /// `previous ± 1` from the pre-mutation read. Best effort under
    /// concurrent writers on other pairs.
    #[default]
    Optimistic,
    /// Re-run `count_edges_to` after the mutation.
    Requery,
}

#[async_trait::async_trait]
pub trait FollowResolver: Send + Sync {
    async fn resolve(
        &self,
        viewer: Option<&UserId>,
        target: &UserId,
    ) -> Result<RelationshipView, StoreError>;

    /// Views for a listing of user cards, in `targets` order.
    async fn resolve_many(
        &self,
        viewer: Option<&UserId>,
        targets: &[UserId],
    ) -> Result<Vec<RelationshipView>, StoreError>;
}

#[async_trait::async_trait]
pub trait FollowCommandHandler: Send + Sync {
    async fn execute(
        &self,
        actor: &UserId,
        target: &UserId,
        intent: FollowIntent,
    ) -> Result<RelationshipView, CommandError>;
}
