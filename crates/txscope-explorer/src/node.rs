use crate::error::NodeError;
use crate::{Block, Output, Tx};
use bitcoin::{BlockHash, Txid};

/// The node capability the decoding core consumes.
///
/// Implementations may talk to a real node, serve from a cache, or replay
/// fixtures; the core only assumes that a previous-output fetch completes
/// before the owning input's classification runs. Missing entities are
/// `Ok(None)`, not errors.
#[async_trait::async_trait]
pub trait NodeClient: Send + Sync {
    /// Hash of the current chain tip.
    async fn best_block_hash(&self) -> Result<BlockHash, NodeError>;

    /// Hash of the block at the given height.
    async fn block_hash(&self, height: u32) -> Result<Option<BlockHash>, NodeError>;

    /// A block with its transactions decoded but not classified.
    async fn block(&self, hash: BlockHash) -> Result<Option<Block>, NodeError>;

    /// A transaction with raw fields only; spend-type classification is the
    /// core's job, not the adapter's.
    async fn tx(&self, txid: Txid) -> Result<Option<Tx>, NodeError>;

    /// A single output of a confirmed transaction.
    async fn previous_output(&self, txid: Txid, index: u32) -> Result<Option<Output>, NodeError>;
}

#[async_trait::async_trait]
impl NodeClient for Box<dyn NodeClient> {
    async fn best_block_hash(&self) -> Result<BlockHash, NodeError> {
        (**self).best_block_hash().await
    }

    async fn block_hash(&self, height: u32) -> Result<Option<BlockHash>, NodeError> {
        (**self).block_hash(height).await
    }

    async fn block(&self, hash: BlockHash) -> Result<Option<Block>, NodeError> {
        (**self).block(hash).await
    }

    async fn tx(&self, txid: Txid) -> Result<Option<Tx>, NodeError> {
        (**self).tx(txid).await
    }

    async fn previous_output(&self, txid: Txid, index: u32) -> Result<Option<Output>, NodeError> {
        (**self).previous_output(txid, index).await
    }
}
