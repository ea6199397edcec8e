//! ops-slack: Slack adapter and tools for ops-bridge
//!
//! Slack Web API を使用してメッセージ送信とタスクカードの管理を行います。

pub mod client;
pub mod tools;
pub mod types;

pub use client::{SlackClient, map_slack_error, match_member};
pub use tools::{SlackOp, SlackTool, register_slack_tools};
pub use types::{ChannelPage, ChannelSummary, Member, MessageReceipt, TaskCard, TaskReceipt, TaskStatus};
