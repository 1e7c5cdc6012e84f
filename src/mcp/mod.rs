//! Model Context Protocol server
//!
//! JSON-RPC 2.0 over line-delimited stdio. The server answers
//! `initialize`, `ping`, `tools/list` and `tools/call`, and accepts
//! notifications without replying. Tool calls go through
//! [`crate::tools::Registry`].

pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use transport::{McpError, StdioTransport};
