//! jsonrpsee module exposing the query surface.
//!
//! Method-level semantics (shapes, error envelopes) live in the transport-
//! independent [`RestApi`]; `HumanReadable` only affects rendered string
//! bodies, which the RPC transport re-encodes anyway.

use crate::handler::RestApi;
use crate::types::{
    BlockRequest, Envelope, OutputTypesRequest, PreviousOutputRequest, TxRequest,
};
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use txscope_explorer::NodeClient;

#[rpc(server)]
pub trait ExplorerApi {
    /// A block with every transaction decoded and classified.
    #[method(name = "block")]
    async fn block(&self, request: BlockRequest) -> RpcResult<Value>;

    /// A transaction with every input classified.
    #[method(name = "tx")]
    async fn tx(&self, request: TxRequest) -> RpcResult<Value>;

    /// Height of the chain tip.
    #[method(name = "current_block_height")]
    async fn current_block_height(&self) -> RpcResult<Value>;

    /// Output types for a batch of outpoints.
    #[method(name = "output_types")]
    async fn output_types(&self, request: OutputTypesRequest) -> RpcResult<Value>;

    /// A single previous output, echoing the requesting input.
    #[method(name = "previous_output")]
    async fn previous_output(&self, request: PreviousOutputRequest) -> RpcResult<Value>;
}

pub struct ExplorerRpc<C> {
    api: RestApi<C>,
}

impl<C> ExplorerRpc<C> {
    pub fn new(api: RestApi<C>) -> Self {
        Self { api }
    }
}

fn to_value<T: Serialize>(envelope: Envelope<T>) -> Value {
    serde_json::to_value(&envelope)
        .unwrap_or_else(|error| json!({ "Error": format!("serialization failed: {error}") }))
}

#[jsonrpsee::core::async_trait]
impl<C: NodeClient + 'static> ExplorerApiServer for ExplorerRpc<C> {
    async fn block(&self, request: BlockRequest) -> RpcResult<Value> {
        Ok(to_value(self.api.block(request).await))
    }

    async fn tx(&self, request: TxRequest) -> RpcResult<Value> {
        Ok(to_value(self.api.tx(request).await))
    }

    async fn current_block_height(&self) -> RpcResult<Value> {
        Ok(to_value(self.api.current_block_height().await))
    }

    async fn output_types(&self, request: OutputTypesRequest) -> RpcResult<Value> {
        Ok(to_value(self.api.output_types(request).await))
    }

    async fn previous_output(&self, request: PreviousOutputRequest) -> RpcResult<Value> {
        Ok(to_value(self.api.previous_output(request).await))
    }
}

/// Starts the JSON query server on the given address.
pub async fn start<C: NodeClient + 'static>(
    addr: SocketAddr,
    rpc: ExplorerRpc<C>,
) -> Result<ServerHandle, std::io::Error> {
    let server = Server::builder().build(addr).await?;
    tracing::info!(%addr, "query API listening");
    Ok(server.start(rpc.into_rpc()))
}
