use crate::error::NodeError;
use crate::node::NodeClient;
use crate::output::Output;
use crate::tx::Tx;
use crate::Block;
use bitcoin::{BlockHash, Txid};
use std::collections::HashMap;

/// Orchestrates fetching and classification.
///
/// Decoding itself is CPU-bound and synchronous; the only suspension points
/// are the [`NodeClient`] calls, and each input's previous-output fetch
/// completes before that input's spend-type dispatch runs.
pub struct Explorer<C> {
    client: C,
}

impl<C: NodeClient> Explorer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn best_block_hash(&self) -> Result<BlockHash, NodeError> {
        self.client.best_block_hash().await
    }

    pub async fn block_hash(&self, height: u32) -> Result<Option<BlockHash>, NodeError> {
        self.client.block_hash(height).await
    }

    /// Height of the chain tip.
    pub async fn current_block_height(&self) -> Result<Option<u32>, NodeError> {
        let tip = self.client.best_block_hash().await?;
        Ok(self.client.block(tip).await?.map(|block| block.height()))
    }

    /// Fetches a block and classifies every transaction in it.
    ///
    /// Previous outputs are resolved from the block itself where possible,
    /// so intra-block spends cost no extra node round trips.
    pub async fn block(&self, hash: BlockHash) -> Result<Option<Block>, NodeError> {
        let Some(mut block) = self.client.block(hash).await? else {
            return Ok(None);
        };

        let mut local_outputs: HashMap<(Txid, u32), Output> = HashMap::new();
        for tx in block.txs() {
            for (index, output) in tx.outputs().iter().enumerate() {
                local_outputs.insert((tx.id(), index as u32), output.clone());
            }
        }

        for tx in block.txs_mut() {
            Self::classify_tx(&self.client, tx, &local_outputs).await?;
        }
        Ok(Some(block))
    }

    /// Fetches a transaction and classifies its inputs.
    pub async fn tx(&self, txid: Txid) -> Result<Option<Tx>, NodeError> {
        let Some(mut tx) = self.client.tx(txid).await? else {
            return Ok(None);
        };
        Self::classify_tx(&self.client, &mut tx, &HashMap::new()).await?;
        Ok(Some(tx))
    }

    pub async fn previous_output(
        &self,
        txid: Txid,
        index: u32,
    ) -> Result<Option<Output>, NodeError> {
        self.client.previous_output(txid, index).await
    }

    async fn classify_tx(
        client: &C,
        tx: &mut Tx,
        local_outputs: &HashMap<(Txid, u32), Output>,
    ) -> Result<(), NodeError> {
        for index in 0..tx.inputs().len() {
            let input = &tx.inputs()[index];
            if input.is_coinbase() {
                tx.classify_input(index, None);
                continue;
            }

            let outpoint = (input.prev_txid(), input.prev_index());
            let prev_output = match local_outputs.get(&outpoint) {
                Some(output) => Some(output.clone()),
                None => client.previous_output(outpoint.0, outpoint.1).await?,
            };
            // A missing previous output downgrades this input to
            // NonStandard; it never aborts the transaction.
            tx.classify_input(index, prev_output.as_ref());
        }
        Ok(())
    }
}
