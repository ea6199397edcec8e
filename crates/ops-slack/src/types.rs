//! Slack API types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ops_core::ApiError;

/// API response wrapper
///
/// Slack answers HTTP 200 even on failure; `ok` and `error` carry the outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct SlackResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> SlackResponse<T> {
    /// Cursor for the next page; Slack sends an empty string on the last one
    pub fn next_cursor(&self) -> Option<String> {
        self.response_metadata
            .as_ref()
            .and_then(|m| m.next_cursor.clone())
            .filter(|c| !c.is_empty())
    }
}

/// Response metadata (for pagination, etc.)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Slack channel info
#[derive(Debug, Clone, Deserialize)]
pub struct SlackChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
}

/// Conversations list response
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationsListResponse {
    #[serde(default)]
    pub channels: Vec<SlackChannel>,
}

/// Slack user info
#[derive(Debug, Clone, Deserialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

/// User profile details
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
}

/// Users list response
#[derive(Debug, Clone, Deserialize)]
pub struct UsersListResponse {
    #[serde(default)]
    pub members: Vec<SlackUser>,
}

/// Posted or updated message
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageResponse {
    pub channel: String,
    pub ts: String,
}

// ============================================================================
// Normalized records
// ============================================================================

/// Receipt for a sent or updated message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReceipt {
    pub ok: bool,
    pub channel: String,
    pub ts: String,
}

impl From<PostMessageResponse> for MessageReceipt {
    fn from(r: PostMessageResponse) -> Self {
        Self {
            ok: true,
            channel: r.channel,
            ts: r.ts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
}

/// One page of `conversations.list`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelPage {
    pub channels: Vec<ChannelSummary>,
    /// Pass back as `cursor` to get the next page
    pub next_cursor: Option<String>,
}

/// Workspace member as used for assignee lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub real_name: String,
    pub display_name: String,
}

impl Member {
    /// `<@U123>` mention, rendered by Slack as @name and notifying the user
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

impl From<SlackUser> for Member {
    fn from(u: SlackUser) -> Self {
        let profile = u.profile.unwrap_or_default();
        Self {
            id: u.id,
            name: u.name,
            real_name: u.real_name.or(profile.real_name).unwrap_or_default(),
            display_name: profile.display_name.unwrap_or_default(),
        }
    }
}

// ============================================================================
// Task cards
// ============================================================================

/// Status of a task card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Label shown on the card
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "📋 待处理",
            Self::InProgress => "🔄 进行中",
            Self::Done => "✅ 已完成",
            Self::Cancelled => "❌ 已取消",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = ApiError;

    /// Accepts English tokens or the Chinese labels, with or without emoji
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase().replace(['-', ' '], "_");
        let status = match token.as_str() {
            "pending" | "todo" | "to_do" | "open" => Self::Pending,
            "in_progress" | "doing" | "started" | "wip" => Self::InProgress,
            "done" | "completed" | "complete" | "finished" => Self::Done,
            "cancelled" | "canceled" | "cancel" => Self::Cancelled,
            _ if s.contains("待处理") => Self::Pending,
            _ if s.contains("进行中") => Self::InProgress,
            _ if s.contains("已完成") => Self::Done,
            _ if s.contains("已取消") => Self::Cancelled,
            _ => {
                return Err(ApiError::validation(format!(
                    "unknown task status '{}': use pending, in_progress, done or cancelled",
                    s.trim()
                )));
            }
        };
        Ok(status)
    }
}

/// Content of one task card
#[derive(Debug, Clone, PartialEq)]
pub struct TaskCard {
    pub title: String,
    pub description: String,
    /// Already rendered, e.g. `<@U123>` or a plain name
    pub assignee: String,
    pub status: TaskStatus,
    pub priority: String,
}

/// Result of creating or updating a task card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskReceipt {
    /// Message ts; pass back with `channel` to update the card
    pub card_id: String,
    pub channel: String,
    pub ts: String,
    pub title: String,
    pub status: TaskStatus,
    pub status_label: String,
    pub assignee: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope_has_no_data() {
        let resp: SlackResponse<PostMessageResponse> =
            serde_json::from_value(json!({"ok": false, "error": "channel_not_found"})).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("channel_not_found"));
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_next_cursor_empty_is_none() {
        let resp: SlackResponse<ConversationsListResponse> = serde_json::from_value(json!({
            "ok": true,
            "channels": [],
            "response_metadata": {"next_cursor": ""}
        }))
        .unwrap();
        assert_eq!(resp.next_cursor(), None);
    }

    #[test]
    fn test_member_from_user_profile_fallback() {
        let user: SlackUser = serde_json::from_value(json!({
            "id": "U1",
            "name": "wangzm",
            "profile": {"display_name": "zhiming", "real_name": "王志明"}
        }))
        .unwrap();
        let member = Member::from(user);
        assert_eq!(member.real_name, "王志明");
        assert_eq!(member.display_name, "zhiming");
        assert_eq!(member.mention(), "<@U1>");
    }

    #[test]
    fn test_task_status_parsing() {
        assert_eq!("pending".parse::<TaskStatus>().unwrap(), TaskStatus::Pending);
        assert_eq!("In Progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("✅ 已完成".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert_eq!("已取消".parse::<TaskStatus>().unwrap(), TaskStatus::Cancelled);
        assert_eq!("canceled".parse::<TaskStatus>().unwrap(), TaskStatus::Cancelled);

        let err = "blocked".parse::<TaskStatus>().unwrap_err();
        assert_eq!(err.kind(), ops_core::ErrorKind::Validation);
    }

    #[test]
    fn test_task_status_labels() {
        assert_eq!(TaskStatus::default().label(), "📋 待处理");
        assert_eq!(TaskStatus::InProgress.to_string(), "🔄 进行中");
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), json!("in_progress"));
    }
}
