//! qbridge command-line entry point.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use qbridge_core::FunctionCall;
use qbridge_server::{AppState, Config, McpServer, bootstrap, create_router, mcp, server, tracing_config};

/// Quantum circuit tools over HTTP and MCP
#[derive(Parser)]
#[command(name = "qbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "QBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Http {
        /// Bind address, overriding the configuration
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Serve MCP tools on stdin/stdout
    Mcp,

    /// Dispatch a single function call and print the result
    Call {
        /// Function name (tool identifier or display name)
        name: String,

        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },

    /// Print the IBM Quantum token status
    Token,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    tracing_config::init_tracing(&config.logging)?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Http { address } => {
            if let Some(address) = address {
                config.http.address = address;
            }
            let addr = config.http_address()?;
            let dispatcher = bootstrap::build_dispatcher(&config);
            bootstrap::log_startup(&config, &dispatcher).await;

            let state = AppState::new(dispatcher, config.schema_path.clone())
                .with_cors_origins(config.http.cors_origins.clone());
            server::serve(addr, create_router(Arc::new(state))).await?;
        }

        Commands::Mcp => {
            let dispatcher = bootstrap::build_dispatcher(&config);
            bootstrap::log_startup(&config, &dispatcher).await;
            mcp::serve_stdio(&McpServer::new(dispatcher)).await?;
        }

        Commands::Call { name, params } => {
            let parameters: Map<String, Value> =
                serde_json::from_str(&params).context("--params must be a JSON object")?;
            let dispatcher = bootstrap::build_dispatcher(&config);
            let response = dispatcher
                .dispatch(&FunctionCall::new(name, parameters))
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Token => {
            let status = bootstrap::credential_store(&config.backends).load_token();
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
