use clap::Parser;
use tracing::{error, info};

use userbox::{Config, ConnectionLimits, Router, Server, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,userbox=debug".into()),
        )
        .init();

    let config = Config::parse();
    config.validate()?;
    info!(?config, "userbox starting");

    let store = Store::new(config.capacity).into_shared();
    let router = Router::users(store, config.router_options());
    let server = Server::bind(&config.bind).await?.with_limits(ConnectionLimits {
        max_request_bytes: config.max_request_bytes,
        read_timeout: config.read_timeout(),
    });

    server
        .run_until(router, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("userbox stopped");
    Ok(())
}
