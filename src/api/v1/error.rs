use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use crate::domain_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<warp::reject::PayloadTooLarge>().is_some()
        || err.find::<warp::reject::LengthRequired>().is_some()
        || err.find::<warp::reject::UnsupportedMediaType>().is_some()
    {
        ApiErrorCode::InvalidRequest
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else {
        warn!("unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
    Ok(warp::reply::with_status(json, code.status()))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Users cannot follow themselves")]
    SelfFollowRejected,
    #[error("A signed-in viewer is required")]
    Unauthenticated,
    #[error("Malformed request")]
    InvalidRequest,
    #[error("Relationship store is unavailable, retry later")]
    StoreUnavailable,
    #[error("Route not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::SelfFollowRejected => StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<StoreError> for ApiErrorCode {
    fn from(error: StoreError) -> Self {
        warn!("store error: {}", error);
        ApiErrorCode::StoreUnavailable
    }
}

impl From<CommandError> for ApiErrorCode {
    fn from(error: CommandError) -> Self {
        match error {
            CommandError::SelfFollowRejected => ApiErrorCode::SelfFollowRejected,
            CommandError::StoreFailure(e) => ApiErrorCode::from(e),
        }
    }
}

impl From<IdentityError> for ApiErrorCode {
    fn from(error: IdentityError) -> Self {
        warn!("identity rejected: {}", error);
        ApiErrorCode::Unauthenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_errors_map_to_codes() {
        assert_eq!(
            ApiErrorCode::from(CommandError::SelfFollowRejected),
            ApiErrorCode::SelfFollowRejected
        );
        let store = CommandError::StoreFailure(StoreError::Timeout {
            origin: "query".into(),
        });
        assert_eq!(ApiErrorCode::from(store), ApiErrorCode::StoreUnavailable);
        assert_eq!(
            ApiErrorCode::StoreUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
