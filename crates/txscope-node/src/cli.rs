use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

/// Bitcoin transaction and script explorer.
#[derive(Debug, Parser)]
#[command(name = "txscope", version)]
pub struct Cli {
    /// Path to a key=value configuration file.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Bitcoin Core RPC address.
    #[arg(long)]
    pub bitcoin_core_addr: Option<String>,

    /// Bitcoin Core RPC port.
    #[arg(long)]
    pub bitcoin_core_port: Option<u16>,

    /// Bitcoin Core RPC username.
    #[arg(long)]
    pub bitcoin_core_username: Option<String>,

    /// Bitcoin Core RPC password.
    #[arg(long)]
    pub bitcoin_core_password: Option<String>,

    /// Listen address for the query API.
    #[arg(long)]
    pub addr: Option<String>,

    /// Listen port for the query API.
    #[arg(long)]
    pub port: Option<u16>,

    /// Externally visible base URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Cache block and transaction results in memory.
    #[arg(long, value_enum)]
    pub caching: Option<Switch>,

    /// Serve the JSON API only, without the web front end.
    #[arg(long, value_enum)]
    pub no_web: Option<Switch>,

    /// Network used for address encoding (bitcoin, testnet, signet,
    /// regtest).
    #[arg(long)]
    pub network: Option<String>,
}
