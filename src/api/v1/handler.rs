use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

/// Upper bound on targets per batch lookup; one user-card page.
pub const MAX_BATCH_TARGETS: usize = 100;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

pub async fn get_relationship(
    target: UserId,
    viewer: Option<UserId>,
    resolver: Arc<dyn FollowResolver>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let view = resolver
        .resolve(viewer.as_ref(), &target)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(view)))
}

#[derive(Debug, Deserialize)]
pub struct RelationshipsRequest {
    pub targets: Vec<UserId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRelationship {
    pub user_id: UserId,
    #[serde(flatten)]
    pub view: RelationshipView,
}

pub async fn get_relationships(
    body: RelationshipsRequest,
    viewer: Option<UserId>,
    resolver: Arc<dyn FollowResolver>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if body.targets.len() > MAX_BATCH_TARGETS {
        return Err(reject::custom(ApiErrorCode::InvalidRequest));
    }

    let views = resolver
        .resolve_many(viewer.as_ref(), &body.targets)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response: Vec<TargetRelationship> = body
        .targets
        .into_iter()
        .zip(views)
        .map(|(user_id, view)| TargetRelationship { user_id, view })
        .collect();
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

pub async fn follow(
    target: UserId,
    actor: UserId,
    commands: Arc<dyn FollowCommandHandler>,
) -> Result<impl warp::Reply, warp::Rejection> {
    execute(actor, target, FollowIntent::Follow, commands).await
}

pub async fn unfollow(
    target: UserId,
    actor: UserId,
    commands: Arc<dyn FollowCommandHandler>,
) -> Result<impl warp::Reply, warp::Rejection> {
    execute(actor, target, FollowIntent::Unfollow, commands).await
}

async fn execute(
    actor: UserId,
    target: UserId,
    intent: FollowIntent,
    commands: Arc<dyn FollowCommandHandler>,
) -> Result<warp::reply::Json, warp::Rejection> {
    let view = commands
        .execute(&actor, &target, intent)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(view)))
}
