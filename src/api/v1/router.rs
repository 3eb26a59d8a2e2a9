use super::error::*;
use super::handler;
use crate::domain_model::UserId;
use crate::domain_port::IdentityProvider;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::HeaderMap;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let viewer = with_viewer(server.identity.clone(), server.identity_header.clone());

    let relationship = warp::path!("users" / UserId / "relationship")
        .and(warp::get())
        .and(viewer.clone())
        .and(with(server.resolver.clone()))
        .and_then(handler::get_relationship);

    let relationships = warp::path!("relationships")
        .and(warp::post())
        .and(warp::body::content_length_limit(64 * 1024))
        .and(warp::body::json())
        .and(viewer.clone())
        .and(with(server.resolver.clone()))
        .and_then(handler::get_relationships);

    let follow = warp::path!("users" / UserId / "follow")
        .and(warp::post())
        .and(with_actor(viewer.clone()))
        .and(with(server.commands.clone()))
        .and_then(handler::follow);

    let unfollow = warp::path!("users" / UserId / "follow")
        .and(warp::delete())
        .and(with_actor(viewer))
        .and(with(server.commands.clone()))
        .and_then(handler::unfollow);

    relationship.or(relationships).or(follow).or(unfollow)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_viewer(
    identity: Arc<dyn IdentityProvider>,
    header: String,
) -> impl Filter<Extract = (Option<UserId>,), Error = warp::Rejection> + Clone {
    warp::header::headers_cloned().and_then(move |headers: HeaderMap| {
        let identity = identity.clone();
        let header = header.clone();
        async move {
            let credential = match headers.get(header.as_str()) {
                Some(value) => Some(
                    value
                        .to_str()
                        .map_err(|_| reject::custom(ApiErrorCode::Unauthenticated))?
                        .to_owned(),
                ),
                None => None,
            };
            identity
                .current_viewer(credential.as_deref())
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)
        }
    })
}

fn with_actor(
    viewer: impl Filter<Extract = (Option<UserId>,), Error = warp::Rejection> + Clone,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    viewer.and_then(|viewer: Option<UserId>| async move {
        viewer.ok_or_else(|| reject::custom(ApiErrorCode::Unauthenticated))
    })
}
