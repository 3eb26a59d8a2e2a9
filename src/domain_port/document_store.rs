use crate::domain_model::*;

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(
        &self,
        collection: &CollectionId,
        query: &DocumentQuery,
    ) -> Result<DocumentList, DocumentStoreError>;

    async fn insert(
        &self,
        collection: &CollectionId,
        fields: Fields,
    ) -> Result<Document, DocumentStoreError>;

    async fn delete(
        &self,
        collection: &CollectionId,
        document_id: &DocumentId,
    ) -> Result<(), DocumentStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("invalid query: {0}")]
    Validation(String),
    #[error("transport error: {0}")]
    Transport(String),
}
