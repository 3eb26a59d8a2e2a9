use followgraph::api;
use followgraph::logger::*;
use followgraph::server::*;
use followgraph::settings::*;
use std::fs;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;
    let tls = match (&project_settings.http.cert_path, &project_settings.http.key_path) {
        (Some(cert), Some(key)) => {
            for (what, path) in [("cert", cert), ("key", key)] {
                if !fs::metadata(path)?.is_file() {
                    return Err(anyhow::anyhow!("TLS {what} is not a regular file: {path:?}"));
                }
            }
            Some((cert.clone(), key.clone()))
        }
        (None, None) => None,
        _ => return Err(anyhow::anyhow!("http.cert_path and http.key_path must be set together")),
    };

    let server = Arc::new(Server::try_new(&project_settings).await?);
    let routes = api::routes(server.clone());

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("could not listen for SIGINT: {e}");
        }
    };

    info!(%address, tls = tls.is_some(), "listening");
    match tls {
        Some((cert, key)) => {
            warp::serve(routes)
                .tls()
                .cert_path(cert)
                .key_path(key)
                .bind_with_graceful_shutdown(address, shutdown)
                .1
                .await
        }
        None => {
            warp::serve(routes)
                .bind_with_graceful_shutdown(address, shutdown)
                .1
                .await
        }
    }

    let shutdown_timeout = std::time::Duration::from_secs(30);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => info!("server shutdown successfully"),
        Err(_) => error!("server shutdown timed out"),
    }

    Ok(())
}
