use bitcoin::{BlockHash, Txid};
use std::collections::HashMap;
use std::sync::Mutex;
use txscope_explorer::{Block, NodeClient, NodeError, Output, Tx};

const MAX_CACHED_BLOCKS: usize = 64;
const MAX_CACHED_TXS: usize = 4096;

/// Wraps a [`NodeClient`] with an in-memory result cache keyed by block
/// hash and txid.
///
/// Both entities are immutable once confirmed, so entries never expire;
/// the maps are simply cleared when they hit their size caps.
pub struct CachingNodeClient<C> {
    inner: C,
    blocks: Mutex<HashMap<BlockHash, Block>>,
    txs: Mutex<HashMap<Txid, Tx>>,
}

impl<C> CachingNodeClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            blocks: Mutex::new(HashMap::new()),
            txs: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl<C: NodeClient> NodeClient for CachingNodeClient<C> {
    async fn best_block_hash(&self) -> Result<BlockHash, NodeError> {
        // The tip moves; never cached.
        self.inner.best_block_hash().await
    }

    async fn block_hash(&self, height: u32) -> Result<Option<BlockHash>, NodeError> {
        self.inner.block_hash(height).await
    }

    async fn block(&self, hash: BlockHash) -> Result<Option<Block>, NodeError> {
        if let Some(hit) = self.blocks.lock().expect("lock poisoned").get(&hash) {
            tracing::debug!(%hash, "block cache hit");
            return Ok(Some(hit.clone()));
        }

        let block = self.inner.block(hash).await?;
        if let Some(block) = &block {
            let mut blocks = self.blocks.lock().expect("lock poisoned");
            if blocks.len() >= MAX_CACHED_BLOCKS {
                blocks.clear();
            }
            blocks.insert(hash, block.clone());
        }
        Ok(block)
    }

    async fn tx(&self, txid: Txid) -> Result<Option<Tx>, NodeError> {
        if let Some(hit) = self.txs.lock().expect("lock poisoned").get(&txid) {
            tracing::debug!(%txid, "tx cache hit");
            return Ok(Some(hit.clone()));
        }

        let tx = self.inner.tx(txid).await?;
        if let Some(tx) = &tx {
            let mut txs = self.txs.lock().expect("lock poisoned");
            if txs.len() >= MAX_CACHED_TXS {
                txs.clear();
            }
            txs.insert(txid, tx.clone());
        }
        Ok(tx)
    }

    async fn previous_output(&self, txid: Txid, index: u32) -> Result<Option<Output>, NodeError> {
        let cached = self
            .txs
            .lock()
            .expect("lock poisoned")
            .get(&txid)
            .and_then(|tx| tx.outputs().get(index as usize).cloned());
        if let Some(output) = cached {
            return Ok(Some(output));
        }
        self.inner.previous_output(txid, index).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash;
    use bitcoin::Network;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingNode {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl NodeClient for CountingNode {
        async fn best_block_hash(&self) -> Result<BlockHash, NodeError> {
            Ok(BlockHash::all_zeros())
        }

        async fn block_hash(&self, _height: u32) -> Result<Option<BlockHash>, NodeError> {
            Ok(None)
        }

        async fn block(&self, _hash: BlockHash) -> Result<Option<Block>, NodeError> {
            Ok(None)
        }

        async fn tx(&self, _txid: Txid) -> Result<Option<Tx>, NodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let raw = hex::decode(
                "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff04deadbeefffffffff0100f2052a010000001976a914000102030405060708090a0b0c0d0e0f1011121388ac00000000",
            )
            .unwrap();
            Ok(Some(Tx::decode(&raw, Network::Bitcoin).unwrap()))
        }

        async fn previous_output(
            &self,
            _txid: Txid,
            _index: u32,
        ) -> Result<Option<Output>, NodeError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn repeated_tx_fetches_hit_the_cache() {
        let node = CachingNodeClient::new(CountingNode {
            calls: AtomicUsize::new(0),
        });
        let txid = Txid::all_zeros();

        let first = node.tx(txid).await.unwrap().unwrap();
        let second = node.tx(txid).await.unwrap().unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(node.inner.calls.load(Ordering::SeqCst), 1);

        // Previous outputs are served from the cached transaction.
        let output = node.previous_output(txid, 0).await.unwrap();
        assert!(output.is_some());
    }
}
