use crate::domain_model::UserId;
use crate::domain_port::{IdentityError, IdentityProvider};

/// Takes the viewer id verbatim from a header set by an authenticating
/// gateway in front of this service.
#[derive(Debug, Default)]
pub struct TrustedHeaderIdentity;

impl TrustedHeaderIdentity {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl IdentityProvider for TrustedHeaderIdentity {
    async fn current_viewer(
        &self,
        credential: Option<&str>,
    ) -> Result<Option<UserId>, IdentityError> {
        let Some(raw) = credential else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        if raw.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(IdentityError::Malformed(format!("{raw:?}")));
        }
        Ok(Some(UserId::from(raw)))
    }
}
