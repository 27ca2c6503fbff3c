//! Endpoint handlers, independent of any transport.

use crate::types::{
    BlockData, BlockRequest, CurrentBlockHeightData, Envelope, OutputTypesRequest,
    PrevOutResponse, PreviousOutputData, PreviousOutputRequest, TxData, TxRequest,
};
use bitcoin::{BlockHash, Txid};
use serde::Serialize;
use std::collections::HashMap;
use txscope_explorer::{Explorer, NodeClient, NodeError};

/// The five query operations, each returning its response inside an
/// [`Envelope`].
pub struct RestApi<C> {
    explorer: Explorer<C>,
}

impl<C: NodeClient> RestApi<C> {
    pub fn new(explorer: Explorer<C>) -> Self {
        Self { explorer }
    }

    pub async fn block(&self, request: BlockRequest) -> Envelope<BlockData> {
        let hash = match self.resolve_block_hash(&request).await {
            Ok(Some(hash)) => hash,
            Ok(None) => return Envelope::error("block not found"),
            Err(envelope) => return envelope,
        };

        match self.explorer.block(hash).await {
            Ok(Some(block)) => Envelope::Ok(BlockData::from(&block)),
            Ok(None) => Envelope::error("block not found"),
            Err(error) => Envelope::error(error.to_string()),
        }
    }

    pub async fn tx(&self, request: TxRequest) -> Envelope<TxData> {
        let Ok(txid) = request.tx_id.parse::<Txid>() else {
            return Envelope::error(format!("invalid transaction id: {}", request.tx_id));
        };
        match self.explorer.tx(txid).await {
            Ok(Some(tx)) => Envelope::Ok(TxData::from(&tx)),
            Ok(None) => Envelope::error("transaction not found"),
            Err(error) => Envelope::error(error.to_string()),
        }
    }

    pub async fn current_block_height(&self) -> Envelope<CurrentBlockHeightData> {
        match self.explorer.current_block_height().await {
            Ok(Some(block_height)) => Envelope::Ok(CurrentBlockHeightData { block_height }),
            Ok(None) => Envelope::error("chain tip not available"),
            Err(error) => Envelope::error(error.to_string()),
        }
    }

    /// Output types for a batch of outpoints, keyed `"txid:index"` in the
    /// response.
    pub async fn output_types(
        &self,
        request: OutputTypesRequest,
    ) -> Envelope<HashMap<String, PreviousOutputData>> {
        let mut resolved = HashMap::new();
        for (tx_id, output_indexes) in request.previous_outputs {
            let Ok(txid) = tx_id.parse::<Txid>() else {
                return Envelope::error(format!("invalid transaction id: {tx_id}"));
            };
            for output_index in output_indexes {
                match self.explorer.previous_output(txid, output_index).await {
                    Ok(Some(output)) => {
                        resolved.insert(
                            format!("{txid}:{output_index}"),
                            PreviousOutputData::from(&output),
                        );
                    }
                    Ok(None) => {
                        return Envelope::error(format!("output {txid}:{output_index} not found"))
                    }
                    Err(error) => return Envelope::error(error.to_string()),
                }
            }
        }
        Envelope::Ok(resolved)
    }

    pub async fn previous_output(
        &self,
        request: PreviousOutputRequest,
    ) -> Envelope<PrevOutResponse> {
        let Ok(txid) = request.prev_out_tx_id.parse::<Txid>() else {
            return Envelope::error(format!(
                "invalid transaction id: {}",
                request.prev_out_tx_id
            ));
        };
        match self
            .explorer
            .previous_output(txid, request.prev_out_index)
            .await
        {
            Ok(Some(output)) => Envelope::Ok(PrevOutResponse {
                input_tx_id: request.input_tx_id,
                input_index: request.input_index,
                prev_out: PreviousOutputData::from(&output),
            }),
            Ok(None) => Envelope::error("previous output not found"),
            Err(error) => Envelope::error(error.to_string()),
        }
    }

    async fn resolve_block_hash(
        &self,
        request: &BlockRequest,
    ) -> Result<Option<BlockHash>, Envelope<BlockData>> {
        if let Some(hash) = &request.hash {
            return hash
                .parse::<BlockHash>()
                .map(Some)
                .map_err(|_| Envelope::error(format!("invalid block hash: {hash}")));
        }
        if let Some(height) = request.height {
            return self
                .explorer
                .block_hash(height)
                .await
                .map_err(|error: NodeError| Envelope::error(error.to_string()));
        }
        // Neither hash nor height: serve the tip.
        self.explorer
            .best_block_hash()
            .await
            .map(Some)
            .map_err(|error| Envelope::error(error.to_string()))
    }
}

/// Renders a response body, indented when the request asked for a
/// human-readable document.
pub fn render<T: Serialize>(envelope: &Envelope<T>, human_readable: bool) -> String {
    let rendered = if human_readable {
        serde_json::to_string_pretty(envelope)
    } else {
        serde_json::to_string(envelope)
    };
    rendered.unwrap_or_else(|error| format!(r#"{{"Error": "serialization failed: {error}"}}"#))
}
