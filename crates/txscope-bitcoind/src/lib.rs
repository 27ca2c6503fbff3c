//! Bitcoin Core JSON-RPC client implementing the explorer's [`NodeClient`]
//! capability.
//!
//! The adapter fetches raw block and transaction bytes (`getblock`
//! verbosity 0, `getrawtransaction`) and lets the core decode them itself;
//! only chain context that raw bytes cannot carry (height, next block hash)
//! comes from verbose header calls.

mod cache;
mod error;
mod types;

pub use cache::CachingNodeClient;
pub use error::Error;
pub use types::{GetBlockHeader, GetRawTransaction};

use bitcoin::{BlockHash, Network, Txid};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use txscope_explorer::{Block, NodeClient, NodeError, Output, Tx};

/// Client for a Bitcoin Core node's JSON-RPC interface.
pub struct BitcoindClient {
    http: Client,
    url: String,
    username: String,
    password: String,
    network: Network,
}

impl BitcoindClient {
    /// Creates a new instance of [`BitcoindClient`].
    pub fn new(
        addr: &str,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        network: Network,
    ) -> Self {
        Self {
            http: Client::new(),
            url: format!("http://{addr}:{port}"),
            username: username.into(),
            password: password.into(),
            network,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, Error> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "txscope",
            "method": method,
            "params": params,
        });
        tracing::trace!(method, "node RPC call");

        let response = self
            .http
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await?;

        #[derive(serde::Deserialize)]
        struct Envelope<T> {
            result: Option<T>,
            error: Option<RpcErrorObject>,
        }
        #[derive(serde::Deserialize)]
        struct RpcErrorObject {
            code: i64,
            message: String,
        }

        let envelope: Envelope<T> = response.json().await?;
        if let Some(error) = envelope.error {
            return Err(Error::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        envelope.result.ok_or(Error::Rpc {
            code: 0,
            message: "empty result".to_owned(),
        })
    }

    /// Like [`Self::call`], with the node's "no such entity" errors folded
    /// into `None`.
    async fn call_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, NodeError> {
        match self.call(method, params).await {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

#[async_trait::async_trait]
impl NodeClient for BitcoindClient {
    async fn best_block_hash(&self) -> Result<BlockHash, NodeError> {
        self.call("getbestblockhash", json!([]))
            .await
            .map_err(NodeError::from)
    }

    async fn block_hash(&self, height: u32) -> Result<Option<BlockHash>, NodeError> {
        self.call_optional("getblockhash", json!([height])).await
    }

    async fn block(&self, hash: BlockHash) -> Result<Option<Block>, NodeError> {
        let Some(raw_hex) = self
            .call_optional::<String>("getblock", json!([hash, 0]))
            .await?
        else {
            return Ok(None);
        };
        let Some(header) = self
            .call_optional::<GetBlockHeader>("getblockheader", json!([hash, true]))
            .await?
        else {
            return Ok(None);
        };

        let raw = hex::decode(raw_hex).map_err(Error::from)?;
        let mut block = Block::decode(&raw, self.network).map_err(Error::from)?;
        block.set_chain_context(header.height, header.nextblockhash);
        Ok(Some(block))
    }

    async fn tx(&self, txid: Txid) -> Result<Option<Tx>, NodeError> {
        let Some(verbose) = self
            .call_optional::<GetRawTransaction>("getrawtransaction", json!([txid, true]))
            .await?
        else {
            return Ok(None);
        };

        let raw = hex::decode(verbose.hex).map_err(Error::from)?;
        let mut tx = Tx::decode(&raw, self.network).map_err(Error::from)?;

        if let Some(block_hash) = verbose.blockhash {
            let height = self
                .call_optional::<GetBlockHeader>("getblockheader", json!([block_hash, true]))
                .await?
                .map(|header| header.height);
            tx.set_block_context(block_hash, height, verbose.blocktime);
        }
        Ok(Some(tx))
    }

    async fn previous_output(&self, txid: Txid, index: u32) -> Result<Option<Output>, NodeError> {
        let Some(raw_hex) = self
            .call_optional::<String>("getrawtransaction", json!([txid]))
            .await?
        else {
            return Ok(None);
        };
        let raw = hex::decode(raw_hex).map_err(Error::from)?;
        let tx = Tx::decode(&raw, self.network).map_err(Error::from)?;
        Ok(tx.outputs().get(index as usize).cloned())
    }
}
