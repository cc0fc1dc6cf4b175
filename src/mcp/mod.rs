//! MCP protocol surface: server wiring, tools, resources and prompts.

pub mod prompts;
pub mod resources;
pub mod server;
pub mod tools;

pub use server::{create_mcp_server, McpServer};
pub use tools::ToolRegistry;
