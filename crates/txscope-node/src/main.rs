mod cli;
mod config;

use clap::Parser;
use config::Config;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;
use txscope_bitcoind::{BitcoindClient, CachingNodeClient};
use txscope_explorer::{Explorer, NodeClient};
use txscope_rpc::{ExplorerRpc, RestApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::resolve(&cli::Cli::parse())?;

    tracing::info!(
        "Using Bitcoin Core at {}:{}",
        config.bitcoin_core_addr,
        config.bitcoin_core_port
    );
    let bitcoind = BitcoindClient::new(
        &config.bitcoin_core_addr,
        config.bitcoin_core_port,
        config.bitcoin_core_username.clone(),
        config.bitcoin_core_password.clone(),
        config.network,
    );
    let client: Box<dyn NodeClient> = if config.caching {
        tracing::info!("In-memory result caching enabled");
        Box::new(CachingNodeClient::new(bitcoind))
    } else {
        Box::new(bitcoind)
    };

    if !config.no_web {
        tracing::warn!("This build ships no web front end; serving the JSON API only");
    }

    let addr: SocketAddr = format!("{}:{}", config.addr, config.port).parse()?;
    let rpc = ExplorerRpc::new(RestApi::new(Explorer::new(client)));
    let handle = txscope_rpc::start(addr, rpc).await?;
    tracing::info!("Explorer available at http://{}", config.base_url);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    let _ = handle.stop();
    handle.stopped().await;

    Ok(())
}
