//! Subsets of Bitcoin Core's JSON-RPC response shapes, limited to the
//! fields the explorer consumes.

use bitcoin::BlockHash;
use serde::Deserialize;

/// Response for `getblockheader` with verbose=true.
#[derive(Debug, Clone, Deserialize)]
pub struct GetBlockHeader {
    /// The block height.
    pub height: u32,
    /// The block time in UNIX epoch time.
    pub time: i64,
    /// The hash of the next block, absent at the tip.
    pub nextblockhash: Option<BlockHash>,
}

/// Response for `getrawtransaction` with verbose=true.
#[derive(Debug, Clone, Deserialize)]
pub struct GetRawTransaction {
    /// The serialized transaction as hex.
    pub hex: String,
    /// Hash of the containing block, absent for mempool transactions.
    pub blockhash: Option<BlockHash>,
    /// The block time in UNIX epoch time.
    pub blocktime: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_subset_deserializes() {
        let json = r#"{
            "hash": "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
            "confirmations": 100,
            "height": 0,
            "version": 1,
            "time": 1231006505,
            "mediantime": 1231006505,
            "nonce": 2083236893,
            "nextblockhash": "00000000839a8e6886ab5951d76f411475428afc90947ee320161bbf18eb6048"
        }"#;
        let header: GetBlockHeader = serde_json::from_str(json).unwrap();
        assert_eq!(header.height, 0);
        assert_eq!(header.time, 1231006505);
        assert!(header.nextblockhash.is_some());

        // The tip has no next block.
        let tip: GetBlockHeader =
            serde_json::from_str(r#"{"height": 1, "time": 1}"#).unwrap();
        assert_eq!(tip.nextblockhash, None);
    }

    #[test]
    fn raw_transaction_subset_deserializes() {
        let json = r#"{"hex": "0100", "blockhash": null, "confirmations": 0}"#;
        let tx: GetRawTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.hex, "0100");
        assert_eq!(tx.blockhash, None);
        assert_eq!(tx.blocktime, None);
    }
}
