//! Startup wiring: one client per platform, one shared tool catalog

use std::sync::Arc;

use tracing::info;

use ops_core::{Config, ToolManager};
use ops_github::{GitHubClient, register_github_tools};
use ops_slack::{SlackClient, register_slack_tools};
use ops_zentao::{ZentaoClient, register_zentao_tools};

/// Build every configured client and register its tools
pub fn build_tool_manager(config: &Config) -> ops_core::Result<ToolManager> {
    let mut manager = ToolManager::new();

    register_github_tools(&mut manager, Arc::new(GitHubClient::new(&config.github)?));
    register_slack_tools(&mut manager, Arc::new(SlackClient::new(&config.slack)?));

    if config.zentao.is_enabled() {
        register_zentao_tools(&mut manager, Arc::new(ZentaoClient::new(&config.zentao)?));
        info!(url = %config.zentao.url, "ZenTao integration enabled");
    } else {
        info!("ZenTao not configured, skipping its tools");
    }

    Ok(manager)
}
