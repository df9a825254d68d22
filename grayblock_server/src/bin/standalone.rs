use grayblock_server::{ServerConfig, start_server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG wins; otherwise info, with engine detail.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,grayblock=debug,grayblock_server=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::load()?;

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down");
    };

    let (_addr, handle) = start_server(config, shutdown).await?;
    handle.await??;
    Ok(())
}
