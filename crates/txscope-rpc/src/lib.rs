//! JSON query surface for the explorer.
//!
//! The endpoint handlers are plain async functions over an
//! [`txscope_explorer::Explorer`] and can be exercised without a server;
//! [`server`] mounts them as a jsonrpsee module.

pub mod handler;
pub mod server;
pub mod types;

pub use handler::{render, RestApi};
pub use server::{start, ExplorerRpc, ExplorerApiServer};
