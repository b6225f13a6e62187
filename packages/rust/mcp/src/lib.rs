//! Model Context Protocol server for a loaded documentation bundle.
//!
//! Built on `rmcp` with the stdio transport and exposes two tools:
//! `search_frc_docs` and `read_documentation`. Bad arguments become an
//! `isError` tool result and an unknown tool an invalid-params error, so
//! the session survives every bad request.

pub mod server;
pub mod tools;

pub use server::{McpServer, SERVER_NAME};
