//! MCP server implementation using pmcp (Pragmatic AI's rust-mcp-sdk).
//!
//! This is the handler registry: it binds the resource router, tool
//! dispatcher and prompt renderer to pmcp's JSON-RPC handling over stdio or
//! HTTP/SSE. All protocol framing lives in pmcp; this module only adapts
//! between the crate's own types and pmcp's.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use pmcp::types::{
    Content, GetPromptResult, ListResourcesResult, MessageContent, PromptArgument, PromptInfo,
    PromptMessage, ReadResourceResult, ResourceInfo, Role,
};
use pmcp::{
    server::streamable_http_server::{StreamableHttpServer, StreamableHttpServerConfig},
    Error, PromptHandler, RequestHandlerExtra, ResourceHandler, Server, ServerCapabilities,
    ToolHandler, ToolInfo,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::config::Config;
use crate::mcp::prompts::{self, PromptEntry};
use crate::mcp::resources;
use crate::mcp::tools::ToolRegistry;

/// The MCP server for BugBacon
///
/// Exposes the platform's data as resources, its actions as tools and its
/// triage guidance as prompts, over stdio or HTTP/SSE transports.
#[derive(Debug, Clone)]
pub struct McpServer {
    server: Arc<Mutex<Server>>,
}

impl McpServer {
    /// Create a new MCP server from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, pmcp::Error> {
        let client = Arc::new(
            ApiClient::new(config).map_err(|e| Error::internal(e.to_string()))?,
        );
        let server = Self::build_server_impl(client)?;
        Ok(Self {
            server: Arc::new(Mutex::new(server)),
        })
    }

    /// Build the MCP server with all handlers (internal implementation)
    fn build_server_impl(client: Arc<ApiClient>) -> Result<Server, pmcp::Error> {
        let registry = ToolRegistry::new(client.clone());

        let mut builder = Server::builder()
            .name("bugbacon-mcp")
            .version(env!("CARGO_PKG_VERSION"))
            .capabilities(ServerCapabilities::default());

        // Tools: one wrapper per catalog entry, all dispatching through the
        // shared registry so the never-throws boundary stays in one place.
        for tool in registry.all() {
            let wrapper = ToolWrapper {
                name: tool.name,
                description: tool.description,
                input_schema: tool.input_schema.clone(),
                registry: registry.clone(),
            };
            builder = builder.tool(tool.name, wrapper);
        }

        // Resources: catalog plus URI routing.
        builder = builder.resources(ResourcesWrapper {
            client: client.clone(),
        });

        // Prompts: one wrapper per template.
        for entry in prompts::list_prompts() {
            let wrapper = PromptWrapper {
                entry: entry.clone(),
                client: client.clone(),
            };
            builder = builder.prompt(entry.name, wrapper);
        }

        builder.build()
    }

    /// Run the server in stdio mode (for Claude Desktop and other MCP clients)
    ///
    /// Consumes the server: `run_stdio` needs the `Server` by value, so this
    /// must hold the only reference to it.
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!("Starting MCP server in stdio mode");

        let server = Arc::try_unwrap(self.server)
            .map_err(|_| Error::internal("Cannot unwrap Arc - multiple references exist"))?
            .into_inner();

        tracing::info!("MCP server initialized");

        server.run_stdio().await
    }

    /// Run the server in HTTP/SSE mode
    pub async fn run_http(&self, addr: &str) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        tracing::info!("Starting MCP server in HTTP/SSE mode on {}", addr);

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::invalid_params(format!("Invalid address: {}", e)))?;

        let http_server = StreamableHttpServer::new(socket_addr, self.server.clone());
        http_server.start().await
    }

    /// Run the server in HTTP/SSE mode with custom configuration
    pub async fn run_http_with_config(
        &self,
        addr: &str,
        config: StreamableHttpServerConfig,
    ) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        tracing::info!(
            "Starting MCP server in HTTP/SSE mode on {} (with custom config)",
            addr
        );

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::invalid_params(format!("Invalid address: {}", e)))?;

        let http_server =
            StreamableHttpServer::with_config(socket_addr, self.server.clone(), config);
        http_server.start().await
    }
}

/// Adapts the tool dispatcher to pmcp's ToolHandler
#[derive(Clone)]
struct ToolWrapper {
    name: &'static str,
    description: &'static str,
    input_schema: Value,
    registry: ToolRegistry,
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> Result<Value, Error> {
        // dispatch() is infallible: failures come back as isError content.
        Ok(self.registry.dispatch(self.name, Some(&args)).await)
    }

    fn metadata(&self) -> Option<ToolInfo> {
        Some(ToolInfo::new(
            self.name.to_string(),
            Some(self.description.to_string()),
            self.input_schema.clone(),
        ))
    }
}

/// Adapts the resource router to pmcp's ResourceHandler
struct ResourcesWrapper {
    client: Arc<ApiClient>,
}

#[async_trait]
impl ResourceHandler for ResourcesWrapper {
    async fn read(
        &self,
        uri: &str,
        _extra: RequestHandlerExtra,
    ) -> Result<ReadResourceResult, Error> {
        // Read failures are re-raised here; pmcp turns them into a
        // protocol-level error response.
        let contents = resources::read_resource(&self.client, uri)
            .await
            .map_err(|e| Error::internal(e.to_string()))?;

        Ok(ReadResourceResult::new(vec![Content::Resource {
            uri: contents.uri,
            mime_type: Some(contents.mime_type),
            text: Some(contents.text),
            meta: None,
        }]))
    }

    async fn list(
        &self,
        _cursor: Option<String>,
        _extra: RequestHandlerExtra,
    ) -> Result<ListResourcesResult, Error> {
        let resources = resources::list_resources()
            .into_iter()
            .map(|entry| ResourceInfo {
                uri: entry.uri.to_string(),
                name: entry.name.to_string(),
                description: Some(entry.description.to_string()),
                mime_type: Some(entry.mime_type.to_string()),
                meta: None,
            })
            .collect();

        Ok(ListResourcesResult::new(resources))
    }
}

/// Adapts one prompt template to pmcp's PromptHandler
struct PromptWrapper {
    entry: PromptEntry,
    client: Arc<ApiClient>,
}

#[async_trait]
impl PromptHandler for PromptWrapper {
    async fn handle(
        &self,
        args: HashMap<String, String>,
        _extra: RequestHandlerExtra,
    ) -> Result<GetPromptResult, Error> {
        let rendered = prompts::get_prompt(&self.client, self.entry.name, &args)
            .await
            .map_err(|e| Error::internal(e.to_string()))?;

        Ok(GetPromptResult::new(
            vec![PromptMessage {
                role: Role::User,
                content: MessageContent::Text {
                    text: rendered.text,
                },
            }],
            Some(rendered.description.to_string()),
        ))
    }

    fn metadata(&self) -> Option<PromptInfo> {
        Some(PromptInfo {
            name: self.entry.name.to_string(),
            description: Some(self.entry.description.to_string()),
            arguments: Some(
                self.entry
                    .arguments
                    .iter()
                    .map(|a| PromptArgument {
                        name: a.name.to_string(),
                        description: Some(a.description.to_string()),
                        required: a.required,
                        completion: None,
                        arg_type: None,
                    })
                    .collect(),
            ),
        })
    }
}

/// Create a new MCP server instance
pub fn create_mcp_server(config: &Config) -> Result<McpServer, pmcp::Error> {
    McpServer::new(config)
}
