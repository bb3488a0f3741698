// SeaTable MCP Gateway - Main Entry Point
// Copyright 2026 Joseph Stone - All Rights Reserved
//
// CLI and MCP stdio server.
// Usage:
//   seatable-mcp [--config <json>] serve     # Run MCP server (stdio, default)
//   seatable-mcp [--config <json>] bases     # Show configured bases
//   seatable-mcp tools                       # Print tool definitions
//
// Environment:
//   SEATABLE_CONFIG_PATH   base list JSON (default ./seatable_config.json)
//   SEATABLE_API_TOKEN     default API token
//   SEATABLE_SERVER_URL    server (default https://table.nju.edu.cn)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seatable_mcp::{
    config::{self, Defaults, JsonFileConfig},
    mcp::{self, McpServer},
    seatable::HttpConnector,
    tools::{tool_definitions, ToolHost},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "seatable-mcp")]
#[command(author = "Joseph Stone")]
#[command(version)]
#[command(about = "SeaTable MCP Gateway - base CRUD and schema tools over MCP stdio")]
struct Cli {
    /// Base list JSON file (overrides SEATABLE_CONFIG_PATH)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run MCP server (stdio JSON-RPC)
    Serve,

    /// Show configured bases (names and token fingerprints only)
    Bases,

    /// Print registered tool definitions as JSON
    Tools,
}

fn main() -> Result<()> {
    // Logs on stderr; stdout belongs to JSON-RPC
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

    let cli = Cli::parse();

    let config_path = config::config_path(cli.config, std::env::var(config::ENV_CONFIG_PATH).ok());
    let defaults = Defaults::from_env();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&tool_definitions())?);
        }

        Commands::Bases => {
            let host = build_host(config_path, defaults)?;
            println!("Server: {}", host.cache().server_url());
            println!("{}", host.call("list_bases", &serde_json::json!({})).text);
        }

        Commands::Serve => {
            let server = McpServer::new(build_host(config_path, defaults)?);
            mcp::run(&server).context("MCP stdio loop failed")?;
        }
    }

    Ok(())
}

fn build_host(config_path: PathBuf, defaults: Defaults) -> Result<ToolHost<HttpConnector>> {
    let connector = HttpConnector::new().context("Failed to initialize SeaTable HTTP client")?;
    Ok(ToolHost::new(connector, Box::new(JsonFileConfig::new(config_path)), defaults))
}
