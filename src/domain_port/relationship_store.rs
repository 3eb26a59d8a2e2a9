use crate::domain_model::*;
use crate::domain_port::DocumentStoreError;

/// Edge-level operations over the follow collection. Every call is exactly
/// one logical round trip; nothing is cached or deduplicated here.
#[async_trait::async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the backing store enforces
    /// uniqueness and the edge is already present.
    async fn create_edge(&self, follower: &UserId, followed: &UserId) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] when no edge matches.
    async fn delete_edge(&self, follower: &UserId, followed: &UserId) -> Result<(), StoreError>;

    async fn count_edges_to(&self, followed: &UserId) -> Result<u64, StoreError>;

    async fn edge_exists(&self, follower: &UserId, followed: &UserId) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store timed out: {origin}")]
    Timeout { origin: String },
    #[error("store rejected credentials: {origin}")]
    AuthFailure { origin: String },
    #[error("edge already exists: {origin}")]
    Conflict { origin: String },
    #[error("edge not found: {origin}")]
    NotFound { origin: String },
    #[error("store error: {origin}")]
    Unknown { origin: String },
}

impl StoreError {
    pub fn origin(&self) -> &str {
        match self {
            StoreError::Timeout { origin }
            | StoreError::AuthFailure { origin }
            | StoreError::Conflict { origin }
            | StoreError::NotFound { origin }
            | StoreError::Unknown { origin } => origin,
        }
    }
}

impl From<DocumentStoreError> for StoreError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::Timeout(origin) => StoreError::Timeout { origin },
            DocumentStoreError::Unauthorized(origin) => StoreError::AuthFailure { origin },
            DocumentStoreError::Conflict(origin) => StoreError::Conflict { origin },
            DocumentStoreError::NotFound(origin) => StoreError::NotFound { origin },
            DocumentStoreError::Validation(e) => StoreError::Unknown {
                origin: format!("validation: {e}"),
            },
            DocumentStoreError::Transport(e) => StoreError::Unknown {
                origin: format!("transport: {e}"),
            },
        }
    }
}
