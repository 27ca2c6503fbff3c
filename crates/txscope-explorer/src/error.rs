use txscope_script::ReadError;

/// Errors from decoding raw transaction or block bytes.
///
/// These mean the byte stream itself is unusable, which only happens when a
/// node hands back corrupt data. Script-level truncation inside an otherwise
/// well-formed transaction is not an error here; it surfaces as a
/// `parse_error` flag on the affected script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("invalid segwit marker flag 0x{0:02x}")]
    WitnessFlag(u8),
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),
}

/// Errors from the node capability boundary.
///
/// "Not found" is not an error: the [`crate::NodeClient`] operations return
/// `Ok(None)` for missing blocks, transactions and outputs.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("bitcoin node unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected node response: {0}")]
    BadResponse(String),
}
