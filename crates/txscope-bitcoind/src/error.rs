use txscope_explorer::NodeError;

/// Errors from talking JSON-RPC to Bitcoin Core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("node RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed RPC response: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error(transparent)]
    Decode(#[from] txscope_explorer::DecodeError),
}

// Bitcoin Core error codes for entities that simply do not exist.
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;
const RPC_INVALID_PARAMETER: i64 = -8;

impl Error {
    /// True when the node is saying "no such block/transaction" rather than
    /// failing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Rpc { code, .. }
                if *code == RPC_INVALID_ADDRESS_OR_KEY || *code == RPC_INVALID_PARAMETER
        )
    }
}

impl From<Error> for NodeError {
    fn from(error: Error) -> Self {
        match error {
            Error::Http(e) => NodeError::Unavailable(e.to_string()),
            other => NodeError::BadResponse(other.to_string()),
        }
    }
}
