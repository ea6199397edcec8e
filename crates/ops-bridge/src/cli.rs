//! Command line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// One agent over stdin/stdout
    Stdio,
    /// Any number of agents over MCP streamable HTTP at `/mcp`
    Http,
}

#[derive(Debug, Parser)]
#[command(name = "ops-bridge")]
#[command(version, about = "MCP server bridging an AI agent to GitHub, Slack and ZenTao")]
#[command(
    long_about = "ops-bridge exposes GitHub, Slack and ZenTao operations as MCP tools.\n\n\
Environment Variables (override the config file):\n\
  GITHUB_TOKEN           GitHub personal access token (required)\n\
  GITHUB_OWNER           Default owner for short repository names\n\
  SLACK_BOT_TOKEN        Slack bot token (required)\n\
  SLACK_DEFAULT_CHANNEL  Default channel (default #general)\n\
  ZENTAO_URL             ZenTao base URL (optional)\n\
  ZENTAO_ACCOUNT         ZenTao account (optional)\n\
  ZENTAO_PASSWORD        ZenTao password (optional)\n\
  RUST_LOG               Log filter (default info; logs go to stderr)\n\n\
With --transport http the MCP endpoint is http://HOST:PORT/mcp."
)]
pub struct Args {
    /// Transport to serve on
    #[arg(short, long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Listen address for the http transport
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Listen port for the http transport
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Config file (defaults to ./ops-bridge.toml when present)
    #[arg(short, long, env = "OPS_BRIDGE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["ops-bridge"]).unwrap();
        assert_eq!(args.transport, Transport::Stdio);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8000);
    }

    #[test]
    fn test_http_transport() {
        let args = Args::try_parse_from([
            "ops-bridge",
            "--transport",
            "http",
            "--host",
            "0.0.0.0",
            "--port",
            "9100",
            "--config",
            "/etc/ops-bridge.toml",
        ])
        .unwrap();
        assert_eq!(args.transport, Transport::Http);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 9100);
        assert_eq!(args.config, Some(PathBuf::from("/etc/ops-bridge.toml")));
    }

    #[test]
    fn test_rejects_unknown_transport() {
        assert!(Args::try_parse_from(["ops-bridge", "--transport", "tcp"]).is_err());
    }
}
