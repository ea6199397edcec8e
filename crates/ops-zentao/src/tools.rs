//! ZenTao tool catalog

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use ops_core::tool::{parse_args, to_json};
use ops_core::{ApiError, SchemaBuilder, Tool, ToolManager, ToolResult};

use crate::client::ZentaoClient;
use crate::types::{BUG_TYPES, BugUpdate, NewBug, NewTask};

/// Every ZenTao operation exposed as a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZentaoOp {
    ListProducts,
    ListProjects,
    ListBugs,
    GetBug,
    CreateBug,
    UpdateBug,
    ListTasks,
    GetTask,
    CreateTask,
    ListStories,
}

impl ZentaoOp {
    pub const ALL: [ZentaoOp; 10] = [
        Self::ListProducts,
        Self::ListProjects,
        Self::ListBugs,
        Self::GetBug,
        Self::CreateBug,
        Self::UpdateBug,
        Self::ListTasks,
        Self::GetTask,
        Self::CreateTask,
        Self::ListStories,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListProducts => "zentao_list_products",
            Self::ListProjects => "zentao_list_projects",
            Self::ListBugs => "zentao_list_bugs",
            Self::GetBug => "zentao_get_bug",
            Self::CreateBug => "zentao_create_bug",
            Self::UpdateBug => "zentao_update_bug",
            Self::ListTasks => "zentao_list_tasks",
            Self::GetTask => "zentao_get_task",
            Self::CreateTask => "zentao_create_task",
            Self::ListStories => "zentao_list_stories",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ListProducts => "List ZenTao products with their bug counts.",
            Self::ListProjects => "List ZenTao projects with dates and project manager.",
            Self::ListBugs => {
                "List bugs of a ZenTao product (product_id from zentao_list_products)."
            }
            Self::GetBug => "Get the full record of one ZenTao bug.",
            Self::CreateBug => {
                "Create a bug in ZenTao. severity: 1=fatal 2=serious 3=normal 4=minor; \
                 pri: 1=urgent 2=high 3=medium 4=low. Returns the new bug id."
            }
            Self::UpdateBug => {
                "Update fields of an existing ZenTao bug. Give at least one field to change."
            }
            Self::ListTasks => "List tasks of a ZenTao execution (iteration).",
            Self::GetTask => "Get the full record of one ZenTao task.",
            Self::CreateTask => {
                "Create a task in a ZenTao execution (iteration). Returns the new task id."
            }
            Self::ListStories => {
                "List requirements (stories) of a ZenTao product (product_id from zentao_list_products)."
            }
        }
    }

    pub fn schema(&self) -> JsonValue {
        let builder = SchemaBuilder::new();
        let builder = match self {
            Self::ListProducts | Self::ListProjects => {
                builder.with_default("limit", "integer", "Number of results (1-1000)", json!(50))
            }
            Self::ListBugs => builder
                .required("product_id", "integer", "Product id")
                .with_default("status", "string", "active, resolved or closed; empty returns all", json!(""))
                .with_default("assigned_to", "string", "Assignee account; empty returns all", json!(""))
                .with_default("limit", "integer", "Number of results (1-1000)", json!(20)),
            Self::GetBug => builder.required("bug_id", "integer", "Bug id"),
            Self::CreateBug => builder
                .required("product_id", "integer", "Product id")
                .required("title", "string", "Bug title")
                .with_default("steps", "string", "Steps to reproduce (HTML allowed)", json!(""))
                .with_default("severity", "integer", "1=fatal, 2=serious, 3=normal, 4=minor", json!(3))
                .with_default("pri", "integer", "1=urgent, 2=high, 3=medium, 4=low", json!(3))
                .string_enum("bug_type", BUG_TYPES, "Bug type", Some("codeerror"))
                .with_default("assigned_to", "string", "Assignee account", json!("")),
            Self::UpdateBug => builder
                .required("bug_id", "integer", "Bug id")
                .optional("title", "string", "New title")
                .optional("steps", "string", "New steps to reproduce")
                .optional("severity", "integer", "New severity (1-4)")
                .optional("pri", "integer", "New priority (1-4)")
                .optional("bug_type", "string", "New bug type")
                .optional("assigned_to", "string", "New assignee account"),
            Self::ListTasks => builder
                .required("execution_id", "integer", "Execution (iteration) id")
                .with_default("status", "string", "wait, doing, done or closed; empty returns all", json!(""))
                .with_default("limit", "integer", "Number of results (1-1000)", json!(20)),
            Self::GetTask => builder.required("task_id", "integer", "Task id"),
            Self::CreateTask => builder
                .required("execution_id", "integer", "Execution (iteration) id")
                .required("name", "string", "Task name")
                .with_default("assigned_to", "string", "Assignee account", json!(""))
                .with_default("estimate", "number", "Estimated hours", json!(0))
                .with_default("pri", "integer", "1=urgent, 2=high, 3=medium, 4=low", json!(3))
                .with_default("desc", "string", "Task description", json!(""))
                .with_default("task_type", "string", "devel, test, design, ...", json!("devel")),
            Self::ListStories => builder
                .required("product_id", "integer", "Product id")
                .with_default("status", "string", "draft, active, closed or changed; empty returns all", json!(""))
                .with_default("limit", "integer", "Number of results (1-1000)", json!(20)),
        };
        builder.build()
    }

    pub fn mutating(&self) -> bool {
        matches!(self, Self::CreateBug | Self::UpdateBug | Self::CreateTask)
    }
}

fn default_list_limit() -> u32 {
    50
}

fn default_limit() -> u32 {
    20
}

fn default_level() -> u8 {
    3
}

fn default_bug_type() -> String {
    "codeerror".to_string()
}

fn default_task_type() -> String {
    "devel".to_string()
}

#[derive(Debug, Deserialize)]
struct LimitParams {
    #[serde(default = "default_list_limit")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct ListBugsParams {
    #[serde(default)]
    product_id: u64,
    #[serde(default)]
    status: String,
    #[serde(default, alias = "assignedTo")]
    assigned_to: String,
    #[serde(default = "default_limit", alias = "per_page")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct BugIdParams {
    bug_id: u64,
}

#[derive(Debug, Deserialize)]
struct CreateBugParams {
    #[serde(default)]
    product_id: u64,
    title: String,
    #[serde(default)]
    steps: String,
    #[serde(default = "default_level")]
    severity: u8,
    #[serde(default = "default_level")]
    pri: u8,
    #[serde(default = "default_bug_type")]
    bug_type: String,
    #[serde(default, alias = "assignedTo")]
    assigned_to: String,
}

#[derive(Debug, Deserialize)]
struct UpdateBugParams {
    bug_id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    steps: Option<String>,
    #[serde(default)]
    severity: Option<u8>,
    #[serde(default)]
    pri: Option<u8>,
    #[serde(default)]
    bug_type: Option<String>,
    #[serde(default, alias = "assignedTo")]
    assigned_to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListTasksParams {
    execution_id: u64,
    #[serde(default)]
    status: String,
    #[serde(default = "default_limit", alias = "per_page")]
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct TaskIdParams {
    task_id: u64,
}

#[derive(Debug, Deserialize)]
struct CreateTaskParams {
    execution_id: u64,
    name: String,
    #[serde(default, alias = "assignedTo")]
    assigned_to: String,
    #[serde(default)]
    estimate: f64,
    #[serde(default = "default_level")]
    pri: u8,
    #[serde(default)]
    desc: String,
    #[serde(default = "default_task_type")]
    task_type: String,
}

#[derive(Debug, Deserialize)]
struct ListStoriesParams {
    #[serde(default)]
    product_id: u64,
    #[serde(default)]
    status: String,
    #[serde(default = "default_limit", alias = "per_page")]
    limit: u32,
}

fn optional(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// One ZenTao catalog entry bound to the shared client
pub struct ZentaoTool {
    op: ZentaoOp,
    client: Arc<ZentaoClient>,
}

impl ZentaoTool {
    pub fn new(op: ZentaoOp, client: Arc<ZentaoClient>) -> Self {
        Self { op, client }
    }

    async fn run(&self, input: JsonValue) -> Result<JsonValue, ApiError> {
        let client = &self.client;
        match self.op {
            ZentaoOp::ListProducts => {
                let p: LimitParams = parse_args(input)?;
                to_json(client.list_products(p.limit).await?)
            }
            ZentaoOp::ListProjects => {
                let p: LimitParams = parse_args(input)?;
                to_json(client.list_projects(p.limit).await?)
            }
            ZentaoOp::ListBugs => {
                let p: ListBugsParams = parse_args(input)?;
                to_json(
                    client
                        .list_bugs(p.product_id, optional(&p.status), optional(&p.assigned_to), p.limit)
                        .await?,
                )
            }
            ZentaoOp::GetBug => {
                let p: BugIdParams = parse_args(input)?;
                client.get_bug(p.bug_id).await
            }
            ZentaoOp::CreateBug => {
                let p: CreateBugParams = parse_args(input)?;
                let bug = NewBug {
                    product_id: p.product_id,
                    title: p.title,
                    steps: p.steps,
                    severity: p.severity,
                    pri: p.pri,
                    bug_type: p.bug_type,
                    assigned_to: optional(&p.assigned_to).map(str::to_string),
                };
                to_json(client.create_bug(&bug).await?)
            }
            ZentaoOp::UpdateBug => {
                let p: UpdateBugParams = parse_args(input)?;
                let update = BugUpdate {
                    title: non_empty(p.title),
                    steps: non_empty(p.steps),
                    severity: p.severity,
                    pri: p.pri,
                    bug_type: non_empty(p.bug_type),
                    assigned_to: non_empty(p.assigned_to),
                };
                client.update_bug(p.bug_id, &update).await
            }
            ZentaoOp::ListTasks => {
                let p: ListTasksParams = parse_args(input)?;
                to_json(
                    client
                        .list_tasks(p.execution_id, optional(&p.status), p.limit)
                        .await?,
                )
            }
            ZentaoOp::GetTask => {
                let p: TaskIdParams = parse_args(input)?;
                client.get_task(p.task_id).await
            }
            ZentaoOp::CreateTask => {
                let p: CreateTaskParams = parse_args(input)?;
                let task = NewTask {
                    execution_id: p.execution_id,
                    name: p.name,
                    assigned_to: optional(&p.assigned_to).map(str::to_string),
                    estimate: p.estimate,
                    pri: p.pri,
                    desc: p.desc,
                    task_type: p.task_type,
                };
                to_json(client.create_task(&task).await?)
            }
            ZentaoOp::ListStories => {
                let p: ListStoriesParams = parse_args(input)?;
                to_json(
                    client
                        .list_stories(p.product_id, optional(&p.status), p.limit)
                        .await?,
                )
            }
        }
    }
}

#[async_trait]
impl Tool for ZentaoTool {
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

/// Register every ZenTao tool against one shared client
pub fn register_zentao_tools(manager: &mut ToolManager, client: Arc<ZentaoClient>) {
    for op in ZentaoOp::ALL {
        manager.register(Arc::new(ZentaoTool::new(op, Arc::clone(&client))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ops_core::ZentaoConfig;
    use wiremock::MockServer;

    fn manager_for(url: String) -> ToolManager {
        let client = ZentaoClient::new(&ZentaoConfig {
            url,
            account: "admin".into(),
            password: "secret".into(),
        })
        .unwrap();
        let mut manager = ToolManager::new();
        register_zentao_tools(&mut manager, Arc::new(client));
        manager
    }

    #[test]
    fn test_catalog() {
        let manager = manager_for("http://127.0.0.1:9".into());
        assert_eq!(manager.len(), 10);
        for op in ZentaoOp::ALL {
            assert!(manager.contains(op.name()));
            assert!(op.name().starts_with("zentao_"));
        }
        let writes: Vec<_> = ZentaoOp::ALL.iter().filter(|op| op.mutating()).collect();
        assert_eq!(writes.len(), 3);
    }

    #[tokio::test]
    async fn test_create_bug_without_product_is_validation() {
        let server = MockServer::start().await;
        let manager = manager_for(server.uri());

        let result = manager
            .execute("zentao_create_bug", json!({"title": "Checkout fails"}))
            .await
            .unwrap();

        assert!(result.is_error);
        let value = result.json().unwrap();
        assert_eq!(value["error"]["kind"], "validation");
        assert!(value["error"]["message"].as_str().unwrap().contains("product_id"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ill_typed_ids_make_no_request() {
        let server = MockServer::start().await;
        let manager = manager_for(server.uri());

        for (name, args) in [
            ("zentao_get_bug", json!({"bug_id": "seven"})),
            ("zentao_list_tasks", json!({})),
            ("zentao_create_task", json!({"execution_id": 3})),
            ("zentao_update_bug", json!({"bug_id": 3, "title": "  "})),
            ("zentao_create_bug", json!({"product_id": 1, "title": "x", "bug_type": "feature"})),
        ] {
            let result = manager.execute(name, args).await.unwrap();
            assert!(result.is_error, "{}", name);
            assert_eq!(result.json().unwrap()["error"]["kind"], "validation", "{}", name);
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
