//! # BugBacon MCP
//!
//! A Model Context Protocol (MCP) server for the BugBacon bug-bounty
//! platform: issues, contributors, repositories, workflows, leaderboards and
//! bacon point rewards, exposed as MCP resources, tools and prompts.
//!
//! ## Architecture
//!
//! - [`api`]: authenticated HTTP client and the failure taxonomy
//! - [`mcp`]: MCP catalogs, dispatch and the pmcp server wiring
//! - [`utils`]: argument and identifier validation
//! - [`config`]: configuration management
//!
//! Each inbound request flows one way: validation, at most one outbound API
//! call, response shaping. Nothing is cached and nothing is retried; the only
//! state shared between requests is the immutable configuration and the
//! static catalogs.

pub mod api;
pub mod config;
pub mod mcp;
pub mod utils;

// Re-export commonly used types
pub use api::{ApiClient, ApiError};
pub use config::Config;
pub use mcp::McpServer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
