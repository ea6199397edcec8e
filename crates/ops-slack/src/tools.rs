//! Slack tool catalog

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use ops_core::tool::{parse_args, to_json};
use ops_core::{ApiError, SchemaBuilder, Tool, ToolManager, ToolResult};

use crate::client::SlackClient;
use crate::types::{TaskCard, TaskStatus};

const PRIORITY_DESC: &str = "Priority: 紧急 / 高 / 普通 / 低";

/// Every Slack operation exposed as a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlackOp {
    SendMessage,
    CreateTask,
    UpdateTask,
    ListChannels,
}

impl SlackOp {
    pub const ALL: [SlackOp; 4] = [
        Self::SendMessage,
        Self::CreateTask,
        Self::UpdateTask,
        Self::ListChannels,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SendMessage => "slack_send_message",
            Self::CreateTask => "slack_create_task",
            Self::UpdateTask => "slack_update_task",
            Self::ListChannels => "slack_list_channels",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SendMessage => {
                "Send a message to a Slack channel. Supports mrkdwn (*bold*, `code`, > quote)."
            }
            Self::CreateTask => {
                "Create a task card in a Slack channel with status 📋 待处理. Assignee names are \
                 matched against workspace members and @mentioned. Keep the returned channel \
                 and ts (card_id) to update the card later with slack_update_task."
            }
            Self::UpdateTask => {
                "Update an existing task card. Needs the channel and ts returned when the card \
                 was created. Status: pending / in_progress / done / cancelled \
                 (or 待处理 / 进行中 / 已完成 / 已取消)."
            }
            Self::ListChannels => "List public channels of the Slack workspace, one page at a time.",
        }
    }

    pub fn schema(&self) -> JsonValue {
        let builder = SchemaBuilder::new();
        let builder = match self {
            Self::SendMessage => builder
                .required("text", "string", "Message text (Slack mrkdwn)")
                .with_default("channel", "string", "Target channel, e.g. #general; empty uses the default channel", json!("")),
            Self::CreateTask => builder
                .required("title", "string", "Task title")
                .with_default("description", "string", "Task description", json!(""))
                .with_default("assignee", "string", "Assignee names, comma-separated; empty means unassigned", json!(""))
                .with_default("priority", "string", PRIORITY_DESC, json!("普通"))
                .with_default("channel", "string", "Target channel, e.g. #general; empty uses the default channel", json!("")),
            Self::UpdateTask => builder
                .required("channel", "string", "Channel of the task card (as returned on creation)")
                .required("ts", "string", "Message ts of the task card (as returned on creation)")
                .required("title", "string", "Task title")
                .required("status", "string", "New status: pending, in_progress, done, cancelled")
                .with_default("description", "string", "Task description", json!(""))
                .with_default("assignee", "string", "Assignee names, comma-separated", json!(""))
                .with_default("priority", "string", PRIORITY_DESC, json!("普通")),
            Self::ListChannels => builder
                .with_default("limit", "integer", "Channels per page (1-1000)", json!(100))
                .with_default("cursor", "string", "next_cursor from the previous page; empty starts over", json!("")),
        };
        builder.build()
    }

    pub fn mutating(&self) -> bool {
        !matches!(self, Self::ListChannels)
    }
}

fn default_priority() -> String {
    "普通".to_string()
}

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Deserialize)]
struct SendMessageParams {
    text: String,
    #[serde(default)]
    channel: String,
}

#[derive(Debug, Deserialize)]
struct CreateTaskParams {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    assignee: String,
    #[serde(default = "default_priority")]
    priority: String,
    #[serde(default)]
    channel: String,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskParams {
    channel: String,
    ts: String,
    title: String,
    status: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    assignee: String,
    #[serde(default = "default_priority")]
    priority: String,
}

#[derive(Debug, Deserialize)]
struct ListChannelsParams {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    cursor: String,
}

fn optional(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

/// One Slack catalog entry bound to the shared client
pub struct SlackTool {
    op: SlackOp,
    client: Arc<SlackClient>,
}

impl SlackTool {
    pub fn new(op: SlackOp, client: Arc<SlackClient>) -> Self {
        Self { op, client }
    }

    async fn run(&self, input: JsonValue) -> Result<JsonValue, ApiError> {
        let client = &self.client;
        match self.op {
            SlackOp::SendMessage => {
                let p: SendMessageParams = parse_args(input)?;
                to_json(client.send_message(&p.text, optional(&p.channel)).await?)
            }
            SlackOp::CreateTask => {
                let p: CreateTaskParams = parse_args(input)?;
                let card = TaskCard {
                    title: p.title,
                    description: p.description,
                    assignee: p.assignee,
                    status: TaskStatus::Pending,
                    priority: p.priority,
                };
                to_json(client.create_task(card, optional(&p.channel)).await?)
            }
            SlackOp::UpdateTask => {
                let p: UpdateTaskParams = parse_args(input)?;
                let card = TaskCard {
                    title: p.title,
                    description: p.description,
                    assignee: p.assignee,
                    status: p.status.parse()?,
                    priority: p.priority,
                };
                to_json(client.update_task(&p.channel, &p.ts, card).await?)
            }
            SlackOp::ListChannels => {
                let p: ListChannelsParams = parse_args(input)?;
                to_json(client.list_channels(p.limit, optional(&p.cursor)).await?)
            }
        }
    }
}

#[async_trait]
impl Tool for SlackTool {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn description(&self) -> &str {
        self.op.description()
    }

    fn input_schema(&self) -> JsonValue {
        self.op.schema()
    }

    fn is_mutating(&self) -> bool {
        self.op.mutating()
    }

    async fn execute(&self, input: JsonValue) -> ToolResult {
        ToolResult::from_outcome(self.run(input).await)
    }
}

/// Register every Slack tool against one shared client
pub fn register_slack_tools(manager: &mut ToolManager, client: Arc<SlackClient>) {
    for op in SlackOp::ALL {
        manager.register(Arc::new(SlackTool::new(op, Arc::clone(&client))));
    }
}
