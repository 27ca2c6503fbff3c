use crate::cli::Cli;
use bitcoin::Network;
use std::path::{Path, PathBuf};

/// Immutable settings resolved from the command line and the optional
/// config file. Command-line options win.
#[derive(Debug, Clone)]
pub struct Config {
    pub bitcoin_core_addr: String,
    pub bitcoin_core_port: u16,
    pub bitcoin_core_username: String,
    pub bitcoin_core_password: String,
    pub addr: String,
    pub port: u16,
    pub base_url: String,
    pub caching: bool,
    pub no_web: bool,
    pub network: Network,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config file line {line}: expected key=value")]
    Malformed { line: usize },
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value}")]
    BadValue { key: String, value: String },
    #[error("missing bitcoin core connection settings ({0})")]
    MissingNodeSettings(&'static str),
}

impl Config {
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config_file {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let bitcoin_core_addr = cli
            .bitcoin_core_addr
            .clone()
            .or(file.bitcoin_core_addr)
            .ok_or(ConfigError::MissingNodeSettings("bitcoin-core-addr"))?;
        let bitcoin_core_username = cli
            .bitcoin_core_username
            .clone()
            .or(file.bitcoin_core_username)
            .ok_or(ConfigError::MissingNodeSettings("bitcoin-core-username"))?;
        let bitcoin_core_password = cli
            .bitcoin_core_password
            .clone()
            .or(file.bitcoin_core_password)
            .ok_or(ConfigError::MissingNodeSettings("bitcoin-core-password"))?;

        let addr = cli
            .addr
            .clone()
            .or(file.addr)
            .unwrap_or_else(|| "127.0.0.1".to_owned());
        let port = cli.port.or(file.port).unwrap_or(8080);

        let network = match cli.network.clone().or(file.network) {
            Some(value) => value
                .parse::<Network>()
                .map_err(|_| ConfigError::BadValue {
                    key: "network".to_owned(),
                    value,
                })?,
            None => Network::Bitcoin,
        };

        Ok(Self {
            bitcoin_core_addr,
            bitcoin_core_port: cli.bitcoin_core_port.or(file.bitcoin_core_port).unwrap_or(8332),
            bitcoin_core_username,
            bitcoin_core_password,
            base_url: cli
                .base_url
                .clone()
                .or(file.base_url)
                .unwrap_or_else(|| format!("{addr}:{port}")),
            addr,
            port,
            caching: cli.caching.map(|s| s.is_on()).or(file.caching).unwrap_or(false),
            no_web: cli.no_web.map(|s| s.is_on()).or(file.no_web).unwrap_or(false),
            network,
        })
    }
}

/// Raw `key=value` settings from a config file; `#` begins a comment.
#[derive(Debug, Default)]
struct ConfigFile {
    bitcoin_core_addr: Option<String>,
    bitcoin_core_port: Option<u16>,
    bitcoin_core_username: Option<String>,
    bitcoin_core_password: Option<String>,
    addr: Option<String>,
    port: Option<u16>,
    base_url: Option<String>,
    caching: Option<bool>,
    no_web: Option<bool>,
    network: Option<String>,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut file = Self::default();
        for (index, raw_line) in contents.lines().enumerate() {
            let line = match raw_line.split_once('#') {
                Some((before_comment, _)) => before_comment,
                None => raw_line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or(ConfigError::Malformed { line: index + 1 })?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "bitcoin-core-addr" => file.bitcoin_core_addr = Some(value.to_owned()),
                "bitcoin-core-port" => file.bitcoin_core_port = Some(parse_port(key, value)?),
                "bitcoin-core-username" => file.bitcoin_core_username = Some(value.to_owned()),
                "bitcoin-core-password" => file.bitcoin_core_password = Some(value.to_owned()),
                "addr" => file.addr = Some(value.to_owned()),
                "port" => file.port = Some(parse_port(key, value)?),
                "base-url" => file.base_url = Some(value.to_owned()),
                "caching" => file.caching = Some(parse_switch(key, value)?),
                "no-web" => file.no_web = Some(parse_switch(key, value)?),
                "network" => file.network = Some(value.to_owned()),
                unknown => return Err(ConfigError::UnknownKey(unknown.to_owned())),
            }
        }
        Ok(file)
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::BadValue {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_switch(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(ConfigError::BadValue {
            key: key.to_owned(),
            value: other.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("txscope").chain(args.iter().copied()))
    }

    #[test]
    fn file_settings_with_comments() {
        let file = ConfigFile::parse(
            "# node connection\n\
             bitcoin-core-addr=127.0.0.1\n\
             bitcoin-core-port=18443  # regtest\n\
             bitcoin-core-username=user\n\
             bitcoin-core-password=hunter2\n\
             \n\
             caching=on\n",
        )
        .unwrap();
        assert_eq!(file.bitcoin_core_addr.as_deref(), Some("127.0.0.1"));
        assert_eq!(file.bitcoin_core_port, Some(18443));
        assert_eq!(file.caching, Some(true));
        assert_eq!(file.no_web, None);
    }

    #[test]
    fn malformed_lines_are_errors_not_panics() {
        assert!(matches!(
            ConfigFile::parse("bitcoin-core-addr\n"),
            Err(ConfigError::Malformed { line: 1 })
        ));
        assert!(matches!(
            ConfigFile::parse("port=eighty\n"),
            Err(ConfigError::BadValue { .. })
        ));
        assert!(matches!(
            ConfigFile::parse("bitcoind-host=x\n"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn command_line_wins_over_defaults() {
        let config = Config::resolve(&cli(&[
            "--bitcoin-core-addr=10.0.0.5",
            "--bitcoin-core-username=user",
            "--bitcoin-core-password=pass",
            "--port=9000",
            "--caching=on",
        ]))
        .unwrap();
        assert_eq!(config.bitcoin_core_addr, "10.0.0.5");
        assert_eq!(config.bitcoin_core_port, 8332);
        assert_eq!(config.addr, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.base_url, "127.0.0.1:9000");
        assert!(config.caching);
        assert!(!config.no_web);
        assert_eq!(config.network, Network::Bitcoin);
    }

    #[test]
    fn missing_node_settings_are_fatal() {
        assert!(matches!(
            Config::resolve(&cli(&["--bitcoin-core-addr=10.0.0.5"])),
            Err(ConfigError::MissingNodeSettings(_))
        ));
    }

    #[test]
    fn bad_network_is_a_config_error() {
        let result = Config::resolve(&cli(&[
            "--bitcoin-core-addr=10.0.0.5",
            "--bitcoin-core-username=user",
            "--bitcoin-core-password=pass",
            "--network=mainnnet",
        ]));
        assert!(matches!(result, Err(ConfigError::BadValue { .. })));
    }
}
