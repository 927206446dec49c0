//! Agent Tool Gateway
//!
//! Single entry point through which agents and the user invoke calendar
//! tools. Routes each call to the caller's branch, records it in the
//! activity ledger and persists the main view.

#![warn(missing_docs)]

pub mod config;
pub mod demo;
pub mod dispatcher;
pub mod mcp_server;
pub mod session;

pub use config::GatewayConfig;
pub use dispatcher::{Gateway, GatewayError, ToolCall};
pub use mcp_server::{McpServer, McpTool, MCP_VERSION};
pub use session::{
    AgentSession, BranchCoordinator, BranchDiff, MergeOutcome, SessionCoordinator, SessionError,
    ViewTarget,
};
