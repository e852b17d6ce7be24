//! Transport shells for qbridge.
//!
//! Two surfaces share one [`Dispatcher`](qbridge_core::Dispatcher):
//!
//! | Surface | Module | Protocol |
//! |---------|--------|----------|
//! | HTTP | [`server`], [`api`] | `GET /schema`, `POST /function`, `GET /health` |
//! | MCP tools | [`mcp`] | JSON-RPC 2.0, one message per line on stdio |
//!
//! Startup reads [`config::Config`], installs logging via [`tracing_config`],
//! and acquires provider capabilities once in [`bootstrap`].

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod mcp;
pub mod server;
pub mod state;
pub mod tracing_config;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use mcp::McpServer;
pub use server::create_router;
pub use state::AppState;
