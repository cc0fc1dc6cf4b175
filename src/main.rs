use anyhow::Result;
use bugbacon_mcp::config::{find_config_file, get_config, load_config, Config};
use bugbacon_mcp::mcp::server::McpServer;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// BugBacon MCP - expose the BugBacon bug-bounty platform to MCP clients
#[derive(Parser, Debug)]
#[command(name = "bugbacon-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server for the BugBacon bug-bounty platform", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server (default)
    Serve {
        /// Serve over stdio (default transport)
        #[arg(long, default_value_t = true)]
        stdio: bool,

        /// Serve over HTTP/SSE instead of stdio
        #[arg(long)]
        http: bool,

        /// Host to bind in HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind in HTTP mode
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },

    /// Check the effective configuration without starting the server
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    // Logs go to stderr: stdout belongs to the stdio transport.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("bugbacon_mcp={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Safety net: a panic that escapes a handler is logged, not fatal to the
    // log stream, and never reaches stdout.
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("unhandled panic: {}", info);
    }));

    let config = resolve_config(&cli)?;
    config.validate()?;

    // Configuration values stay out of the logs; only the key's presence is
    // ever reported.
    tracing::info!(
        api_key_configured = config.key_configured(),
        "configuration loaded"
    );

    match cli.command {
        Some(Commands::Check) => {
            println!("configuration ok");
            println!("api key configured: {}", config.key_configured());
        }

        Some(Commands::Serve {
            stdio,
            http,
            host,
            port,
        }) => {
            let server = McpServer::new(&config)?;

            let use_http = http || !stdio;
            if use_http {
                let addr = format!("{}:{}", host, port);
                tracing::info!("Running MCP server in HTTP/SSE mode on {}", addr);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                tracing::info!("Running MCP server in stdio mode");
                server.run().await?;
            }
        }

        None => {
            // Bare invocation serves stdio, matching how MCP clients spawn us.
            let server = McpServer::new(&config)?;
            server.run().await?;
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    if let Some(config_path) = &cli.config {
        Ok(load_config(config_path)?)
    } else if let Some(config_path) = find_config_file() {
        tracing::info!("Using config file: {}", config_path.display());
        Ok(load_config(&config_path)?)
    } else {
        Ok(get_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["bugbacon-mcp", "serve"]);
        match &cli.command {
            Some(Commands::Serve {
                stdio, port, host, ..
            }) => {
                assert!(*stdio);
                assert_eq!(*port, 3000);
                assert_eq!(host, "127.0.0.1");
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_serve_http_mode() {
        let cli = Cli::parse_from(["bugbacon-mcp", "serve", "--http", "--port", "8080"]);
        match &cli.command {
            Some(Commands::Serve { http, port, .. }) => {
                assert!(*http);
                assert_eq!(*port, 8080);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_defaults_to_no_subcommand() {
        let cli = Cli::parse_from(["bugbacon-mcp"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }
}
