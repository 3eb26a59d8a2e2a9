use crate::domain_model::UserId;

/// Source of the current viewer. `Ok(None)` means the caller is
/// unauthenticated, which is not an error for read paths.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_viewer(&self, credential: Option<&str>)
    -> Result<Option<UserId>, IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("malformed credential: {0}")]
    Malformed(String),
}
