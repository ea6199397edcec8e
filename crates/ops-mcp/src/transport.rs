//! Transports: stdio for a single local agent, streamable HTTP for remote ones

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use rmcp::{
    ServiceExt,
    transport::{
        stdio,
        streamable_http_server::{
            StreamableHttpService, session::local::LocalSessionManager,
        },
    },
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::server::OpsServer;

/// Path the MCP endpoint is mounted at
pub const MCP_PATH: &str = "/mcp";

/// Serve one client over stdin/stdout until it disconnects
pub async fn serve_stdio(server: OpsServer) -> Result<()> {
    info!(tools = server.tool_count(), "MCP server listening on stdio");
    let service = server
        .serve(stdio())
        .await
        .context("failed to start stdio transport")?;
    let reason = service.waiting().await?;
    info!(?reason, "stdio client disconnected");
    Ok(())
}

/// Router with the streamable HTTP endpoint at [`MCP_PATH`] and `/health`
///
/// Every MCP session gets its own clone of `server`; the tool catalog
/// behind it is shared.
pub fn http_router(server: OpsServer) -> Router {
    let mcp = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        Default::default(),
    );

    Router::new()
        .nest_service(MCP_PATH, mcp)
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
}

/// Bind `host:port` and serve streamable HTTP until Ctrl-C
pub async fn serve_http(server: OpsServer, host: &str, port: u16) -> Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))?;
    let addr = listener.local_addr()?;
    info!(
        tools = server.tool_count(),
        "MCP server listening on http://{}{}", addr, MCP_PATH
    );

    axum::serve(listener, http_router(server))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("HTTP transport stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ops_core::ToolManager;
    use serde_json::{Value as JsonValue, json};
    use std::time::Duration;

    fn test_server() -> OpsServer {
        OpsServer::new(Arc::new(ToolManager::new()), "test instructions")
    }

    async fn spawn_router(router: Router) -> String {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Pull JSON-RPC messages out of a JSON or SSE body
    fn messages(body: &str) -> Vec<JsonValue> {
        if let Ok(value) = serde_json::from_str::<JsonValue>(body) {
            return vec![value];
        }
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .filter_map(|data| serde_json::from_str(data.trim()).ok())
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_over_http() {
        let base = spawn_router(http_router(test_server())).await;
        let client = reqwest::Client::new();

        let mut response = client
            .post(format!("{}{}", base, MCP_PATH))
            .header("Accept", "application/json, text/event-stream")
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": {"name": "transport-test", "version": "0.0.1"}
                }
            }))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success(), "{}", response.status());
        assert!(response.headers().contains_key("mcp-session-id"));

        // the SSE stream may stay open, so read until the reply arrives
        let mut body = String::new();
        let reply = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(reply) = messages(&body).into_iter().find(|m| m["id"] == 1) {
                    return reply;
                }
                let chunk = response.chunk().await.unwrap().expect("stream ended early");
                body.push_str(&String::from_utf8_lossy(&chunk));
            }
        })
        .await
        .unwrap();

        assert_eq!(reply["result"]["serverInfo"]["name"], "ops-bridge");
        assert_eq!(reply["result"]["instructions"], "test instructions");
        assert!(reply["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let base = spawn_router(http_router(test_server())).await;
        let body = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_serve_http_reports_bind_failure() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = serve_http(test_server(), "127.0.0.1", port).await.unwrap_err();
        assert!(err.to_string().contains("failed to bind"));
    }
}
