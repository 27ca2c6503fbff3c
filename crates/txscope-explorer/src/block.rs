use crate::error::DecodeError;
use crate::tx::Tx;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::{BlockHash, Network};
use txscope_script::ByteReader;

const HEADER_LEN: usize = 80;

/// A decoded block: header fields plus every transaction.
///
/// Height and the next block's hash are chain context a raw block does not
/// carry; the node adapter attaches them via [`Block::set_chain_context`].
#[derive(Debug, Clone)]
pub struct Block {
    hash: BlockHash,
    prev_hash: Option<BlockHash>,
    next_hash: Option<BlockHash>,
    height: u32,
    timestamp: i64,
    txs: Vec<Tx>,
}

impl Block {
    /// Decodes a block from its wire serialization.
    pub fn decode(raw: &[u8], network: Network) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(raw);

        let header = reader.read_bytes(HEADER_LEN)?;
        let hash = BlockHash::from_raw_hash(sha256d::Hash::hash(header));

        let mut header_reader = ByteReader::new(header);
        let _version = header_reader.read_u32()?;
        let prev_hash = BlockHash::from_raw_hash(header_reader.read_reversed_hash()?);
        let _merkle_root = header_reader.read_reversed_hash()?;
        let timestamp = i64::from(header_reader.read_u32()?);

        let tx_count = reader.read_var_int()?;
        let mut txs = Vec::with_capacity(tx_count as usize);
        for _ in 0..tx_count {
            let mut tx = Tx::decode_from(&mut reader, network)?;
            tx.set_block_context(hash, None, Some(timestamp));
            txs.push(tx);
        }
        if !reader.is_exhausted() {
            return Err(DecodeError::TrailingBytes(reader.remaining()));
        }

        let prev_hash = (prev_hash != BlockHash::all_zeros()).then_some(prev_hash);

        Ok(Self {
            hash,
            prev_hash,
            next_hash: None,
            height: 0,
            timestamp,
            txs,
        })
    }

    pub fn hash(&self) -> BlockHash {
        self.hash
    }

    pub fn prev_hash(&self) -> Option<BlockHash> {
        self.prev_hash
    }

    pub fn next_hash(&self) -> Option<BlockHash> {
        self.next_hash
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn tx_count(&self) -> u16 {
        self.txs.len() as u16
    }

    pub fn txs(&self) -> &[Tx] {
        &self.txs
    }

    pub fn txs_mut(&mut self) -> &mut [Tx] {
        &mut self.txs
    }

    /// Attaches chain context from the node and propagates it to the
    /// contained transactions.
    pub fn set_chain_context(&mut self, height: u32, next_hash: Option<BlockHash>) {
        self.height = height;
        self.next_hash = next_hash;
        let (hash, timestamp) = (self.hash, self.timestamp);
        for tx in &mut self.txs {
            tx.set_block_context(hash, Some(height), Some(timestamp));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mainnet genesis block.
    const GENESIS: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

    #[test]
    fn decodes_the_genesis_block() {
        let raw = hex::decode(GENESIS).unwrap();
        let block = Block::decode(&raw, Network::Bitcoin).unwrap();

        assert_eq!(
            block.hash().to_string(),
            "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f"
        );
        assert_eq!(block.prev_hash(), None);
        assert_eq!(block.timestamp(), 1231006505);
        assert_eq!(block.tx_count(), 1);
        assert!(block.txs()[0].is_coinbase());
        assert_eq!(
            block.txs()[0].id().to_string(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
        assert_eq!(block.txs()[0].block_hash(), Some(block.hash()));
    }

    #[test]
    fn chain_context_reaches_transactions() {
        let raw = hex::decode(GENESIS).unwrap();
        let mut block = Block::decode(&raw, Network::Bitcoin).unwrap();
        let next = "00000000839a8e6886ab5951d76f411475428afc90947ee320161bbf18eb6048"
            .parse()
            .unwrap();
        block.set_chain_context(0, Some(next));
        assert_eq!(block.txs()[0].block_height(), Some(0));
        assert_eq!(block.next_hash(), Some(next));
    }
}
