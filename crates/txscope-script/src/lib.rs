//! Bitcoin script decoding and classification.
//!
//! This crate turns raw script bytes, witness stacks and output templates
//! into typed, display-ready structures: every field is tagged as an opcode
//! or data push, every push is named (signatures, public keys, witness
//! programs, serialized scripts), and the spend type of an input is resolved
//! across the legacy, P2SH-wrapped, native SegWit and Taproot layers.
//!
//! Nothing here executes a script or verifies a signature; the crate
//! recognizes encodings, it does not validate consensus rules.

mod error;
pub mod opcodes;
mod reader;
mod script;
mod segwit;
pub mod solver;
pub mod spend;
mod stack_item;

pub use error::ReadError;
pub use reader::ByteReader;
pub use script::{FieldKind, MultisigLayout, PushEncoding, Script, ScriptField};
pub use segwit::{Segwit, SegwitField, TapScriptRef, TAPROOT_ANNEX_PREFIX, TAPROOT_LEAF_MASK};
pub use solver::OutputType;
pub use spend::SpendType;
pub use stack_item::{
    is_ecdsa_signature, is_public_key, is_schnorr_signature, is_sighash_byte,
    is_x_only_public_key, stack_item_type, StackItemContext,
};
