//! Walks one viewer through following and unfollowing a profile against the
//! in-memory backend, printing the relationship after every step.

use followgraph::application_port::*;
use followgraph::domain_model::*;
use followgraph::logger::*;
use followgraph::server::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "follow_demo=info,followgraph=debug".to_string(),
    })?;

    let server = Server::in_memory(CoreOptions::default());
    let viewer = UserId::from("u2");
    let target = UserId::from("u1");

    let view = server.resolver.resolve(Some(&viewer), &target).await?;
    info!(?view, "before follow");

    let view = server
        .commands
        .execute(&viewer, &target, FollowIntent::Follow)
        .await?;
    info!(?view, "after follow");

    let view = server
        .commands
        .execute(&viewer, &target, FollowIntent::Follow)
        .await?;
    info!(?view, "after repeated follow");

    let view = server.resolver.resolve(None, &target).await?;
    info!(?view, "seen anonymously");

    match server
        .commands
        .execute(&viewer, &viewer, FollowIntent::Follow)
        .await
    {
        Ok(view) => warn!(?view, "self follow was accepted"),
        Err(e) => info!("self follow rejected: {e}"),
    }

    let view = server
        .commands
        .execute(&viewer, &target, FollowIntent::Unfollow)
        .await?;
    info!(?view, "after unfollow");

    server.shutdown().await;
    Ok(())
}
