//! ops-bridge - MCP server for GitHub, Slack and ZenTao
//!
//! 設定を読み込み、各プラットフォームのクライアントを生成してツールを登録し、
//! 選択されたトランスポートで MCP サーバーを起動します。

mod cli;
mod registry;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ops_core::Config;
use ops_mcp::{OpsServer, serve_http, serve_stdio, server_instructions};

use cli::{Args, Transport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG や OPS_BRIDGE_CONFIG を .env から拾えるよう最初に読む
    let filter = load_env_and_filter(None);
    let args = Args::parse();

    // stdout は stdio トランスポート専用なのでログは stderr へ
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(args.config.as_deref())?;
    let tools = registry::build_tool_manager(&config)?;

    info!(
        tools = tools.len(),
        owner = %config.github.owner,
        default_channel = %config.slack.default_channel,
        "Starting ops-bridge"
    );

    let instructions = server_instructions(&config.github.owner, config.zentao.is_enabled());
    let server = OpsServer::new(Arc::new(tools), instructions);

    match args.transport {
        Transport::Stdio => serve_stdio(server).await?,
        Transport::Http => serve_http(server, &args.host, args.port).await?,
    }

    Ok(())
}

/// Load `.env` (or `dotenv` when given), then build the log filter from `RUST_LOG`
fn load_env_and_filter(dotenv: Option<&Path>) -> EnvFilter {
    match dotenv {
        Some(path) => dotenvy::from_path(path).ok(),
        None => dotenvy::dotenv().ok().map(|_| ()),
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
