//! Slack Web API client
//!
//! Communicates with the Slack Web API using a bot token.

use std::fmt;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, info, warn};

use ops_core::http::{build_client, check_status, decode_json, retry_after};
use ops_core::{ApiError, SlackConfig};

use crate::types::*;

const USER_AGENT: &str = concat!("ops-bridge/", env!("CARGO_PKG_VERSION"));

/// Page size used for member lookup
const USERS_PAGE_LIMIT: u32 = 200;

/// Page size used when resolving a channel name
const CHANNEL_LOOKUP_LIMIT: u32 = 1000;

/// Slack's upper bound for `conversations.list`
pub const MAX_CHANNEL_LIMIT: u32 = 1000;

const CARD_FOOTER: &str = "创建自 DevOps Agent | ops-bridge";

/// Slack Web API client
#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    bot_token: String,
    default_channel: String,
    base_url: String,
}

impl fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackClient")
            .field("default_channel", &self.default_channel)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SlackClient {
    /// Create a new Slack API client
    pub fn new(config: &SlackConfig) -> ops_core::Result<Self> {
        Ok(Self {
            client: build_client(USER_AGENT)?,
            bot_token: config.bot_token.clone(),
            default_channel: config.default_channel.trim().to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn default_channel(&self) -> &str {
        &self.default_channel
    }

    fn post(&self, method: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, method);
        debug!(url = %url, "Building Slack request");
        self.client.post(url).bearer_auth(&self.bot_token)
    }

    fn get(&self, method: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, method);
        debug!(url = %url, "Building Slack request");
        self.client.get(url).bearer_auth(&self.bot_token)
    }

    /// Send one Web API call and unwrap Slack's `ok` envelope
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> Result<(T, Option<String>), ApiError> {
        let response = check_status(request.send().await?).await?;
        let hint = retry_after(response.headers());
        let envelope: SlackResponse<T> = decode_json(response).await?;

        if !envelope.ok {
            let code = envelope.error.as_deref().unwrap_or("unknown_error");
            let err = map_slack_error(code, hint);
            warn!(method = method, code = code, kind = err.kind().as_str(), "Slack API call failed");
            return Err(err);
        }

        let cursor = envelope.next_cursor();
        let data = envelope
            .data
            .ok_or_else(|| ApiError::upstream(None, format!("{} returned an unexpected payload", method)))?;
        Ok((data, cursor))
    }

    /// Explicit channel is resolved to an ID; absent means the default channel
    async fn target_channel(&self, channel: Option<&str>) -> Result<String, ApiError> {
        match channel.map(str::trim).filter(|c| !c.is_empty()) {
            Some(channel) => self.resolve_channel(channel).await,
            None => Ok(self.default_channel.clone()),
        }
    }

    // ==================== Messages ====================

    /// Post a plain text message
    pub async fn send_message(
        &self,
        text: &str,
        channel: Option<&str>,
    ) -> Result<MessageReceipt, ApiError> {
        if text.trim().is_empty() {
            return Err(ApiError::validation("text must not be empty"));
        }
        let channel = self.target_channel(channel).await?;

        let body = json!({ "channel": channel, "text": text });
        let (posted, _): (PostMessageResponse, _) = self
            .call("chat.postMessage", self.post("chat.postMessage").json(&body))
            .await?;
        info!(channel = %posted.channel, ts = %posted.ts, "Message sent");
        Ok(posted.into())
    }

    /// Post a Block Kit message; `text` is the notification fallback
    pub async fn send_blocks(
        &self,
        blocks: &[JsonValue],
        text: &str,
        channel: Option<&str>,
    ) -> Result<MessageReceipt, ApiError> {
        if blocks.is_empty() {
            return Err(ApiError::validation("blocks must not be empty"));
        }
        let channel = self.target_channel(channel).await?;
        self.post_blocks(&channel, blocks, text).await
    }

    async fn post_blocks(
        &self,
        channel: &str,
        blocks: &[JsonValue],
        text: &str,
    ) -> Result<MessageReceipt, ApiError> {
        let body = json!({ "channel": channel, "text": text, "blocks": blocks });
        let (posted, _): (PostMessageResponse, _) = self
            .call("chat.postMessage", self.post("chat.postMessage").json(&body))
            .await?;
        info!(channel = %posted.channel, ts = %posted.ts, "Block message sent");
        Ok(posted.into())
    }

    /// Replace the content of an existing message
    pub async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        text: &str,
        blocks: Option<&[JsonValue]>,
    ) -> Result<MessageReceipt, ApiError> {
        let ts = ts.trim();
        if channel.trim().is_empty() || ts.is_empty() {
            return Err(ApiError::validation("channel and ts are required"));
        }
        let channel = self.resolve_channel(channel).await?;

        let mut body = json!({ "channel": channel, "ts": ts, "text": text });
        if let Some(blocks) = blocks.filter(|b| !b.is_empty()) {
            body["blocks"] = json!(blocks);
        }
        let (updated, _): (PostMessageResponse, _) = self
            .call("chat.update", self.post("chat.update").json(&body))
            .await?;
        info!(channel = %updated.channel, ts = %updated.ts, "Message updated");
        Ok(updated.into())
    }

    // ==================== Channels ====================

    /// One page of public channels
    pub async fn list_channels(
        &self,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<ChannelPage, ApiError> {
        if !(1..=MAX_CHANNEL_LIMIT).contains(&limit) {
            return Err(ApiError::validation(format!(
                "limit must be between 1 and {}, got {}",
                MAX_CHANNEL_LIMIT, limit
            )));
        }

        let mut query = vec![
            ("types", "public_channel".to_string()),
            ("exclude_archived", "true".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(cursor) = cursor.filter(|c| !c.trim().is_empty()) {
            query.push(("cursor", cursor.trim().to_string()));
        }

        let (list, next_cursor): (ConversationsListResponse, _) = self
            .call("conversations.list", self.get("conversations.list").query(&query))
            .await?;
        debug!(count = list.channels.len(), "Fetched channel page");

        Ok(ChannelPage {
            channels: list
                .channels
                .into_iter()
                .map(|c| ChannelSummary { id: c.id, name: c.name })
                .collect(),
            next_cursor,
        })
    }

    /// Turn `#name`, `name` or an ID into a channel ID
    ///
    /// IDs pass through without a request. Names are looked up in one page of
    /// public channels; a name not on it is `NotFound`.
    pub async fn resolve_channel(&self, channel: &str) -> Result<String, ApiError> {
        let channel = channel.trim();
        if channel.is_empty() {
            return Err(ApiError::validation("channel must not be empty"));
        }
        if is_channel_id(channel) {
            return Ok(channel.to_string());
        }

        let name = channel.trim_start_matches('#').to_lowercase();
        let page = self.list_channels(CHANNEL_LOOKUP_LIMIT, None).await?;
        match page.channels.into_iter().find(|c| c.name.to_lowercase() == name) {
            Some(found) => {
                debug!(channel = channel, id = %found.id, "Resolved channel");
                Ok(found.id)
            }
            None => Err(ApiError::not_found(format!(
                "channel '{}' not found; use slack_list_channels to see available channels",
                channel
            ))),
        }
    }

    // ==================== Users ====================

    /// Active human members from one `users.list` page
    pub async fn list_members(&self) -> Result<Vec<Member>, ApiError> {
        let (list, _): (UsersListResponse, _) = self
            .call(
                "users.list",
                self.get("users.list")
                    .query(&[("limit", USERS_PAGE_LIMIT.to_string())]),
            )
            .await?;
        let members: Vec<Member> = list
            .members
            .into_iter()
            .filter(|u| !u.deleted && !u.is_bot && u.id != "USLACKBOT")
            .map(Member::from)
            .collect();
        debug!(count = members.len(), "Loaded workspace members");
        Ok(members)
    }

    /// 名前でユーザーを検索する（実名・表示名・ユーザー名）
    pub async fn find_user_by_name(&self, name: &str) -> Result<Option<Member>, ApiError> {
        if name.trim().trim_start_matches('@').is_empty() {
            return Err(ApiError::validation("name must not be empty"));
        }
        let members = self.list_members().await?;
        Ok(match_member(&members, name).cloned())
    }

    /// Render a comma-separated assignee list as Slack mentions
    ///
    /// Names that match no member are kept as typed. A failed member lookup
    /// leaves every name as typed instead of failing the card.
    async fn render_assignees(&self, raw: &str) -> String {
        let names: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return String::new();
        }
        if names.iter().all(|n| n.starts_with("<@")) {
            return names.join(", ");
        }

        let members = match self.list_members().await {
            Ok(members) => members,
            Err(e) => {
                warn!(error = %e, "Member lookup failed, assignees left as typed");
                return names.join(", ");
            }
        };

        names
            .iter()
            .map(|name| {
                if name.starts_with("<@") {
                    return name.to_string();
                }
                match match_member(&members, name) {
                    Some(member) => {
                        info!(name = *name, id = %member.id, "Matched assignee");
                        member.mention()
                    }
                    None => {
                        warn!(name = *name, "No Slack member matches assignee");
                        name.to_string()
                    }
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    // ==================== Task cards ====================

    /// Post a new task card; the status is always pending
    ///
    /// `card.assignee` may hold comma-separated names, they are turned into
    /// mentions before posting.
    pub async fn create_task(
        &self,
        card: TaskCard,
        channel: Option<&str>,
    ) -> Result<TaskReceipt, ApiError> {
        let card = self
            .prepare_card(TaskCard {
                status: TaskStatus::Pending,
                ..card
            })
            .await?;
        let channel = self.target_channel(channel).await?;

        let blocks = Self::build_task_blocks(&card);
        let fallback = format!("📌 新任务: {}", card.title);
        let receipt = self.post_blocks(&channel, &blocks, &fallback).await?;
        info!(channel = %receipt.channel, ts = %receipt.ts, "Task card created");
        Ok(task_receipt(receipt, card))
    }

    /// Re-render an existing task card identified by `channel` and `ts`
    pub async fn update_task(
        &self,
        channel: &str,
        ts: &str,
        card: TaskCard,
    ) -> Result<TaskReceipt, ApiError> {
        if channel.trim().is_empty() || ts.trim().is_empty() {
            return Err(ApiError::validation("channel and ts of the card are required"));
        }
        let card = self.prepare_card(card).await?;

        let blocks = Self::build_task_blocks(&card);
        let fallback = format!("📌 任务更新: {} - {}", card.title, card.status.label());
        let receipt = self.update_message(channel, ts, &fallback, Some(&blocks)).await?;
        info!(channel = %receipt.channel, ts = %receipt.ts, status = card.status.as_str(), "Task card updated");
        Ok(task_receipt(receipt, card))
    }

    async fn prepare_card(&self, card: TaskCard) -> Result<TaskCard, ApiError> {
        let title = card.title.trim();
        if title.is_empty() {
            return Err(ApiError::validation("title must not be empty"));
        }
        Ok(TaskCard {
            title: title.to_string(),
            description: card.description.trim().to_string(),
            assignee: self.render_assignees(&card.assignee).await,
            status: card.status,
            priority: priority_or_default(&card.priority),
        })
    }

    /// Block Kit layout of a task card
    pub fn build_task_blocks(card: &TaskCard) -> Vec<JsonValue> {
        let mut blocks = vec![
            json!({
                "type": "header",
                "text": {"type": "plain_text", "text": format!("📌 {}", card.title), "emoji": true}
            }),
            json!({"type": "divider"}),
        ];

        let mut fields = vec![
            json!({"type": "mrkdwn", "text": format!("*状态:*\n{}", card.status.label())}),
            json!({"type": "mrkdwn", "text": format!("*优先级:*\n{}", card.priority)}),
        ];
        if !card.assignee.is_empty() {
            fields.push(json!({"type": "mrkdwn", "text": format!("*负责人:*\n{}", card.assignee)}));
        }
        blocks.push(json!({"type": "section", "fields": fields}));

        if !card.description.is_empty() {
            blocks.push(json!({
                "type": "section",
                "text": {"type": "mrkdwn", "text": format!("*描述:*\n{}", card.description)}
            }));
        }

        blocks.push(json!({
            "type": "context",
            "elements": [{"type": "mrkdwn", "text": CARD_FOOTER}]
        }));
        blocks
    }
}

fn task_receipt(receipt: MessageReceipt, card: TaskCard) -> TaskReceipt {
    TaskReceipt {
        card_id: receipt.ts.clone(),
        channel: receipt.channel,
        ts: receipt.ts,
        title: card.title,
        status: card.status,
        status_label: card.status.label().to_string(),
        assignee: card.assignee,
    }
}

fn priority_or_default(priority: &str) -> String {
    match priority.trim() {
        "" => "普通".to_string(),
        given => given.to_string(),
    }
}

/// `C…`, `G…` or `D…` followed by upper-case alphanumerics
fn is_channel_id(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some('C' | 'G' | 'D'))
        && value.len() >= 9
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

fn name_fields(m: &Member) -> [String; 3] {
    [
        m.real_name.to_lowercase(),
        m.display_name.to_lowercase(),
        m.name.to_lowercase(),
    ]
}

/// Exact match on any name field wins over a substring match
pub fn match_member<'a>(members: &'a [Member], name: &str) -> Option<&'a Member> {
    let needle = name.trim().trim_start_matches('@').to_lowercase();
    if needle.is_empty() {
        return None;
    }

    members
        .iter()
        .find(|m| name_fields(m).iter().any(|f| *f == needle))
        .or_else(|| {
            members.iter().find(|m| {
                name_fields(m)
                    .iter()
                    .any(|f| !f.is_empty() && f.contains(needle.as_str()))
            })
        })
}

/// Map a Slack `error` code to exactly one kind
pub fn map_slack_error(code: &str, retry_after: Option<u64>) -> ApiError {
    let message = format!("Slack API error: {}", code);
    match code {
        "not_authed" | "invalid_auth" | "account_inactive" | "token_revoked"
        | "token_expired" | "missing_scope" | "not_allowed_token_type" => {
            ApiError::Authentication {
                status: None,
                message,
            }
        }
        "channel_not_found" | "message_not_found" | "user_not_found" | "not_in_channel"
        | "users_not_found" => ApiError::NotFound {
            status: None,
            message,
        },
        "ratelimited" | "rate_limited" => ApiError::RateLimited {
            status: None,
            message,
            retry_after,
        },
        "invalid_arguments" | "no_text" | "msg_too_long" | "invalid_blocks"
        | "invalid_cursor" | "cant_update_message" | "edit_window_closed" => {
            ApiError::Validation {
                status: None,
                message,
            }
        }
        _ => ApiError::Upstream {
            status: None,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ops_core::ErrorKind;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SlackClient {
        SlackClient::new(&SlackConfig {
            bot_token: "xoxb-test".into(),
            default_channel: "#general".into(),
            base_url: server.uri(),
        })
        .unwrap()
    }

    fn members_json() -> JsonValue {
        json!({
            "ok": true,
            "members": [
                {"id": "U0BOT", "name": "deploybot", "is_bot": true},
                {"id": "U0OLD", "name": "alice.old", "real_name": "Alice Old", "deleted": true},
                {"id": "U123", "name": "alice", "real_name": "Alice Chen", "profile": {"display_name": "alice"}},
                {"id": "U456", "name": "wangzm", "real_name": "王志明", "profile": {"display_name": "zhiming"}}
            ]
        })
    }

    fn card(title: &str, assignee: &str, priority: &str) -> TaskCard {
        TaskCard {
            title: title.into(),
            description: String::new(),
            assignee: assignee.into(),
            status: TaskStatus::Done,
            priority: priority.into(),
        }
    }

    fn member(id: &str, name: &str, real: &str, display: &str) -> Member {
        Member {
            id: id.into(),
            name: name.into(),
            real_name: real.into(),
            display_name: display.into(),
        }
    }

    #[test]
    fn test_match_member_exact_before_substring() {
        let members = vec![
            member("U1", "alexander", "Alexander Wu", "alex.w"),
            member("U2", "alex", "Alex Li", "alex"),
        ];
        assert_eq!(match_member(&members, "@Alex").unwrap().id, "U2");
        assert_eq!(match_member(&members, "wu").unwrap().id, "U1");
        assert!(match_member(&members, "bob").is_none());
        assert!(match_member(&members, "@").is_none());
    }

    #[test]
    fn test_map_slack_error_codes() {
        assert_eq!(map_slack_error("invalid_auth", None).kind(), ErrorKind::Authentication);
        assert_eq!(map_slack_error("channel_not_found", None).kind(), ErrorKind::NotFound);
        assert_eq!(map_slack_error("no_text", None).kind(), ErrorKind::Validation);
        assert_eq!(map_slack_error("fatal_error", None).kind(), ErrorKind::Upstream);
        let err = map_slack_error("ratelimited", Some(12));
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.retry_after(), Some(12));
    }

    #[test]
    fn test_channel_id_detection() {
        assert!(is_channel_id("C0123ABCD"));
        assert!(is_channel_id("G9ZZZZZZZ"));
        assert!(!is_channel_id("#general"));
        assert!(!is_channel_id("general"));
        assert!(!is_channel_id("Cabcdefgh"));
    }

    #[test]
    fn test_task_blocks_layout() {
        let card = TaskCard {
            title: "Fix login bug".into(),
            description: String::new(),
            assignee: "<@U123>".into(),
            status: TaskStatus::Pending,
            priority: "高".into(),
        };
        let blocks = SlackClient::build_task_blocks(&card);
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0]["text"]["text"], "📌 Fix login bug");
        assert_eq!(blocks[1]["type"], "divider");
        let fields = blocks[2]["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0]["text"], "*状态:*\n📋 待处理");
        assert_eq!(fields[2]["text"], "*负责人:*\n<@U123>");
        assert_eq!(blocks[3]["type"], "context");
    }

    #[tokio::test]
    async fn test_create_task_card_for_alice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(members_json()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(header("authorization", "Bearer xoxb-test"))
            .and(body_partial_json(json!({"channel": "#general", "text": "📌 新任务: Fix login bug"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "C0GENERAL", "ts": "1772000000.000100"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = client_for(&server)
            .create_task(card("Fix login bug", "@alice", ""), None)
            .await
            .unwrap();

        assert_eq!(receipt.card_id, "1772000000.000100");
        assert_eq!(receipt.channel, "C0GENERAL");
        assert_eq!(receipt.status, TaskStatus::Pending);
        assert_eq!(receipt.status_label, "📋 待处理");
        assert_eq!(receipt.assignee, "<@U123>");

        let requests = server.received_requests().await.unwrap();
        let post = requests.iter().find(|r| r.url.path() == "/chat.postMessage").unwrap();
        let body: JsonValue = serde_json::from_slice(&post.body).unwrap();
        let card_text = body["blocks"].to_string();
        assert!(card_text.contains("<@U123>"));
        assert!(card_text.contains("普通"));
    }

    #[tokio::test]
    async fn test_create_task_keeps_unknown_assignee() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "missing_scope"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "C0GENERAL", "ts": "1.2"
            })))
            .mount(&server)
            .await;

        let receipt = client_for(&server)
            .create_task(card("Ship it", "bob", "高"), None)
            .await
            .unwrap();
        assert_eq!(receipt.assignee, "bob");
    }

    #[tokio::test]
    async fn test_send_message_resolves_channel_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .and(query_param("types", "public_channel"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channels": [{"id": "C0DEVOPS1", "name": "devops"}, {"id": "C0GENERAL", "name": "general"}],
                "response_metadata": {"next_cursor": ""}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(body_partial_json(json!({"channel": "C0DEVOPS1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channel": "C0DEVOPS1", "ts": "1.5"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = client_for(&server)
            .send_message("deploy done", Some("#DevOps"))
            .await
            .unwrap();
        assert!(receipt.ok);
        assert_eq!(receipt.ts, "1.5");
    }

    #[tokio::test]
    async fn test_unknown_channel_is_not_found_without_posting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "channels": [{"id": "C0GENERAL", "name": "general"}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_message("hello", Some("#nowhere"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
    }

    #[tokio::test]
    async fn test_ok_false_maps_error_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.update"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false, "error": "message_not_found"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .update_message("C0GENERAL1", "1.1", "x", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.message().contains("message_not_found"));
    }

    #[tokio::test]
    async fn test_http_429_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = client_for(&server).send_message("hi", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.retry_after(), Some(7));
    }

    #[tokio::test]
    async fn test_list_channels_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .and(query_param("cursor", "dGVhbTpDMDYx"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channels": [{"id": "C3", "name": "random"}],
                "response_metadata": {"next_cursor": "bmV4dA=="}
            })))
            .mount(&server)
            .await;

        let page = client_for(&server)
            .list_channels(2, Some("dGVhbTpDMDYx"))
            .await
            .unwrap();
        assert_eq!(page.channels, vec![ChannelSummary { id: "C3".into(), name: "random".into() }]);
        assert_eq!(page.next_cursor.as_deref(), Some("bmV4dA=="));
    }

    #[tokio::test]
    async fn test_find_user_skips_deleted_and_bots() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users.list"))
            .and(query_param("limit", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(members_json()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.find_user_by_name("王志明").await.unwrap().unwrap().id, "U456");
        assert!(client.find_user_by_name("deploybot").await.unwrap().is_none());
        assert!(client.find_user_by_name("Alice Old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_validation_before_network() {
        let server = MockServer::start().await;
        let client = client_for(&server);

        assert_eq!(client.send_message("  ", None).await.unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            client.create_task(card(" ", "", ""), None).await.unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(client.list_channels(0, None).await.unwrap_err().kind(), ErrorKind::Validation);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
