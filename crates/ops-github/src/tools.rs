//! GitHub tool catalog
//!
//! Each [`GitHubOp`] maps one tool name and parameter schema onto a single
//! [`GitHubClient`] call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use ops_core::tool::{parse_args, split_csv, to_json};
use ops_core::{ApiError, SchemaBuilder, Tool, ToolManager, ToolResult};

use crate::client::{CommitQuery, GitHubClient, IssueUpdate, NewIssue};
use crate::types::{IssueState, StateFilter};

const REPO_DESC: &str = "Repository as owner/repo, or a short name that gets the default owner";
const STATE_VALUES: &[&str] = &["open", "closed", "all"];

/// Every GitHub operation exposed as a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubOp {
    ListRepos,
    GetRepo,
    GetCommits,
    GetCommitDiff,
    GetPullRequests,
    GetIssues,
    CreateIssue,
    UpdateIssue,
    GetFile,
    ListDirectory,
    SearchCode,
    GetActions,
    ListProjects,
    AddToProject,
}

impl GitHubOp {
    pub const ALL: [GitHubOp; 14] = [
        Self::ListRepos,
        Self::GetRepo,
        Self::GetCommits,
        Self::GetCommitDiff,
        Self::GetPullRequests,
        Self::GetIssues,
        Self::CreateIssue,
        Self::UpdateIssue,
        Self::GetFile,
        Self::ListDirectory,
        Self::SearchCode,
        Self::GetActions,
        Self::ListProjects,
        Self::AddToProject,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListRepos => "github_list_repos",
            Self::GetRepo => "github_get_repo",
            Self::GetCommits => "github_get_commits",
            Self::GetCommitDiff => "github_get_commit_diff",
            Self::GetPullRequests => "github_get_pull_requests",
            Self::GetIssues => "github_get_issues",
            Self::CreateIssue => "github_create_issue",
            Self::UpdateIssue => "github_update_issue",
            Self::GetFile => "github_get_file",
            Self::ListDirectory => "github_list_directory",
            Self::SearchCode => "github_search_code",
            Self::GetActions => "github_get_actions",
            Self::ListProjects => "github_list_projects",
            Self::AddToProject => "github_add_to_project",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ListRepos => {
                "List GitHub repositories. With `search` empty, returns your most recently \
                 updated repositories; otherwise searches all repositories by keyword."
            }
            Self::GetRepo => {
                "Get repository metadata: description, default branch, language, stars, \
                 forks, open issue count and topics."
            }
            Self::GetCommits => {
                "Get the commit history of a repository, optionally for one branch and a \
                 time window (ISO 8601, e.g. 2026-02-26T00:00:00+08:00)."
            }
            Self::GetCommitDiff => {
                "Show the files changed by one commit with additions, deletions and a patch excerpt."
            }
            Self::GetPullRequests => "List pull requests of a repository.",
            Self::GetIssues => {
                "List issues of a repository (pull requests excluded), optionally filtered by labels."
            }
            Self::CreateIssue => {
                "Create a new issue. Returns the issue number assigned by GitHub."
            }
            Self::UpdateIssue => {
                "Update an existing issue. Empty fields are left unchanged; give at least one."
            }
            Self::GetFile => "Read a file from a repository at a branch, tag or commit.",
            Self::ListDirectory => {
                "List the entries of a directory in a repository; empty path lists the root."
            }
            Self::SearchCode => "Search code inside one repository by keyword.",
            Self::GetActions => "List recent GitHub Actions workflow runs of a repository.",
            Self::ListProjects => {
                "List the Projects (v2) boards of a user or organization. The returned `id` \
                 is what github_add_to_project expects."
            }
            Self::AddToProject => {
                "Add an existing issue to a Projects (v2) board. Returns the new project item id."
            }
        }
    }

    pub fn schema(&self) -> JsonValue {
        let builder = SchemaBuilder::new();
        let builder = match self {
            Self::ListRepos => builder
                .with_default("search", "string", "Search keywords; empty lists your own repositories", json!(""))
                .with_default("per_page", "integer", "Number of results (1-100)", json!(20)),
            Self::GetRepo => builder.required("repo", "string", REPO_DESC),
            Self::GetCommits => builder
                .required("repo", "string", REPO_DESC)
                .with_default("branch", "string", "Branch name; empty uses the default branch", json!(""))
                .with_default("since", "string", "Start time (ISO 8601); empty means unbounded", json!(""))
                .with_default("until", "string", "End time (ISO 8601); empty means unbounded", json!(""))
                .with_default("per_page", "integer", "Number of results (1-100)", json!(20)),
            Self::GetCommitDiff => builder
                .required("repo", "string", REPO_DESC)
                .required("sha", "string", "Commit SHA"),
            Self::GetPullRequests => builder
                .required("repo", "string", REPO_DESC)
                .string_enum("state", STATE_VALUES, "State filter", Some("open"))
                .with_default("per_page", "integer", "Number of results (1-100)", json!(20)),
            Self::GetIssues => builder
                .required("repo", "string", REPO_DESC)
                .string_enum("state", STATE_VALUES, "State filter", Some("open"))
                .with_default("labels", "string", "Comma-separated labels; empty means any", json!(""))
                .with_default("per_page", "integer", "Number of results (1-100)", json!(20)),
            Self::CreateIssue => builder
                .required("repo", "string", REPO_DESC)
                .required("title", "string", "Issue title")
                .with_default("body", "string", "Issue body (Markdown)", json!(""))
                .with_default("labels", "string", "Comma-separated labels, e.g. \"bug,urgent\"", json!(""))
                .with_default("assignees", "string", "Comma-separated GitHub usernames", json!("")),
            Self::UpdateIssue => builder
                .required("repo", "string", REPO_DESC)
                .required("issue_number", "integer", "Issue number")
                .with_default("title", "string", "New title; empty keeps it", json!(""))
                .with_default("body", "string", "New body; empty keeps it", json!(""))
                .with_default("state", "string", "open or closed; empty keeps it", json!(""))
                .with_default("labels", "string", "Comma-separated labels replacing the current ones; empty keeps them", json!("")),
            Self::GetFile => builder
                .required("repo", "string", REPO_DESC)
                .required("file_path", "string", "File path, e.g. src/main.rs")
                .with_default("ref", "string", "Branch, tag or commit SHA; empty uses the default branch", json!("")),
            Self::ListDirectory => builder
                .required("repo", "string", REPO_DESC)
                .with_default("path", "string", "Directory path; empty lists the root", json!(""))
                .with_default("ref", "string", "Branch, tag or commit SHA; empty uses the default branch", json!("")),
            Self::SearchCode => builder
                .required("repo", "string", REPO_DESC)
                .required("query", "string", "Search keywords"),
            Self::GetActions => builder
                .required("repo", "string", REPO_DESC)
                .with_default("status", "string", "completed, in_progress or queued; empty returns all", json!(""))
                .with_default("per_page", "integer", "Number of results (1-100)", json!(10)),
            Self::ListProjects => builder
                .with_default("owner", "string", "User or organization login; empty uses the default owner", json!(""))
                .with_default("first", "integer", "Number of boards (1-100)", json!(20)),
            Self::AddToProject => builder
                .required("project_id", "string", "Project node id from github_list_projects")
                .required("repo", "string", REPO_DESC)
                .required("issue_number", "integer", "Issue number"),
        };
        builder.build()
    }

    pub fn mutating(&self) -> bool {
        matches!(self, Self::CreateIssue | Self::UpdateIssue | Self::AddToProject)
    }
}

// ==================== Parameters ====================

fn default_per_page() -> u32 {
    20
}

fn default_actions_per_page() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
struct ListReposParams {
    #[serde(default)]
    search: String,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct CommitsParams {
    repo: String,
    #[serde(default)]
    branch: String,
    #[serde(default)]
    since: String,
    #[serde(default)]
    until: String,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct CommitDiffParams {
    repo: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    repo: String,
    #[serde(default)]
    state: StateFilter,
    #[serde(default)]
    labels: String,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct RepoParams {
    repo: String,
}

#[derive(Debug, Deserialize)]
struct CreateIssueParams {
    repo: String,
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    labels: String,
    #[serde(default)]
    assignees: String,
}

#[derive(Debug, Deserialize)]
struct UpdateIssueParams {
    repo: String,
    issue_number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    labels: String,
}

#[derive(Debug, Deserialize)]
struct ContentsParams {
    repo: String,
    #[serde(default, alias = "file_path")]
    path: String,
    #[serde(default, rename = "ref")]
    git_ref: String,
}

#[derive(Debug, Deserialize)]
struct SearchCodeParams {
    repo: String,
    query: String,
}

#[derive(Debug, Deserialize)]
struct ActionsParams {
    repo: String,
    #[serde(default)]
    status: String,
    #[serde(default = "default_actions_per_page")]
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct ListProjectsParams {
    #[serde(default)]
    owner: String,
    #[serde(default = "default_per_page")]
    first: u32,
}

#[derive(Debug, Deserialize)]
struct AddToProjectParams {
    project_id: String,
    repo: String,
    issue_number: u64,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

fn parse_issue_state(value: &str) -> Result<Option<IssueState>, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "open" => Ok(Some(IssueState::Open)),
        "closed" => Ok(Some(IssueState::Closed)),
        other => Err(ApiError::validation(format!(
            "state must be open or closed, got '{}'",
            other
        ))),
    }
}

// ==================== Tool ====================

/// One GitHub catalog entry bound to the shared client
pub struct GitHubTool {
    op: GitHubOp,
    client: Arc<GitHubClient>,
}

impl GitHubTool {
    pub fn new(op: GitHubOp, client: Arc<GitHubClient>) -> Self {
        Self { op, client }
    }

    async fn run(&self, input: JsonValue) -> Result<JsonValue, ApiError> {
        let client = &self.client;
        match self.op {
            GitHubOp::ListRepos => {
                let p: ListReposParams = parse_args(input)?;
                let repos = match non_empty(p.search) {
                    Some(query) => client.search_repos(&query, p.per_page).await?,
                    None => client.list_repos(p.per_page).await?,
                };
                to_json(repos)
            }
            GitHubOp::GetRepo => {
                let p: RepoParams = parse_args(input)?;
                to_json(client.get_repo(&p.repo).await?)
            }
            GitHubOp::GetCommits => {
                let p: CommitsParams = parse_args(input)?;
                let query = CommitQuery {
                    branch: p.branch,
                    since: non_empty(p.since),
                    until: non_empty(p.until),
                    per_page: p.per_page,
                };
                to_json(client.get_commits(&p.repo, &query).await?)
            }
            GitHubOp::GetCommitDiff => {
                let p: CommitDiffParams = parse_args(input)?;
                to_json(client.get_commit_detail(&p.repo, &p.sha).await?)
            }
            GitHubOp::GetPullRequests => {
                let p: ListParams = parse_args(input)?;
                to_json(client.get_pull_requests(&p.repo, p.state, p.per_page).await?)
            }
            GitHubOp::GetIssues => {
                let p: ListParams = parse_args(input)?;
                let labels = non_empty(p.labels);
                to_json(
                    client
                        .get_issues(&p.repo, p.state, labels.as_deref(), p.per_page)
                        .await?,
                )
            }
            GitHubOp::CreateIssue => {
                let p: CreateIssueParams = parse_args(input)?;
                let issue = NewIssue {
                    title: p.title,
                    body: p.body,
                    labels: split_csv(&p.labels),
                    assignees: split_csv(&p.assignees),
                };
                to_json(client.create_issue(&p.repo, &issue).await?)
            }
            GitHubOp::UpdateIssue => {
                let p: UpdateIssueParams = parse_args(input)?;
                let update = IssueUpdate {
                    title: non_empty(p.title),
                    body: non_empty(p.body),
                    state: parse_issue_state(&p.state)?,
                    labels: split_csv(&p.labels),
                };
                to_json(client.update_issue(&p.repo, p.issue_number, &update).await?)
            }
            GitHubOp::GetFile => {
                let p: ContentsParams = parse_args(input)?;
                to_json(client.get_file(&p.repo, &p.path, &p.git_ref).await?)
            }
            GitHubOp::ListDirectory => {
                let p: ContentsParams = parse_args(input)?;
                to_json(client.list_directory(&p.repo, &p.path, &p.git_ref).await?)
            }
            GitHubOp::SearchCode => {
                let p: SearchCodeParams = parse_args(input)?;
                to_json(client.search_code(&p.repo, &p.query).await?)
            }
            GitHubOp::GetActions => {
                let p: ActionsParams = parse_args(input)?;
                let status = non_empty(p.status);
                to_json(
                    client
                        .get_workflow_runs(&p.repo, status.as_deref(), p.per_page)
                        .await?,
                )
            }
            GitHubOp::ListProjects => {
                let p: ListProjectsParams = parse_args(input)?;
                to_json(client.list_projects(&p.owner, p.first).await?)
            }
            GitHubOp::AddToProject => {
                let p: AddToProjectParams = parse_args(input)?;
                to_json(
                    client
                        .add_issue_to_project(&p.project_id, &p.repo, p.issue_number)
                        .await?,
                )
            }
        }
    }
}

#[async_trait]
impl Tool for GitHubTool {
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

/// Register every GitHub tool against one shared client
pub fn register_github_tools(manager: &mut ToolManager, client: Arc<GitHubClient>) {
    for op in GitHubOp::ALL {
        manager.register(Arc::new(GitHubTool::new(op, Arc::clone(&client))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ops_core::GitHubConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager_for(base_url: String) -> ToolManager {
        let client = GitHubClient::new(&GitHubConfig {
            token: "test-token".into(),
            owner: "acme".into(),
            base_url,
        })
        .unwrap();
        let mut manager = ToolManager::new();
        register_github_tools(&mut manager, Arc::new(client));
        manager
    }

    #[test]
    fn test_catalog_is_complete() {
        let manager = manager_for("http://127.0.0.1:9".into());
        assert_eq!(manager.len(), 14);
        for op in GitHubOp::ALL {
            assert!(op.name().starts_with("github_"));
            assert!(manager.contains(op.name()));
            assert_eq!(op.schema()["type"], "object");
            assert!(!op.description().is_empty());
        }
    }

    #[test]
    fn test_mutating_flags() {
        let mutating: Vec<&str> = GitHubOp::ALL
            .iter()
            .filter(|op| op.mutating())
            .map(|op| op.name())
            .collect();
        assert_eq!(
            mutating,
            vec!["github_create_issue", "github_update_issue", "github_add_to_project"]
        );
    }

    #[test]
    fn test_required_fields_in_schema() {
        let schema = GitHubOp::CreateIssue.schema();
        assert_eq!(schema["required"], json!(["repo", "title"]));
        let schema = GitHubOp::ListRepos.schema();
        assert_eq!(schema["required"], json!([]));
    }

    #[tokio::test]
    async fn test_get_repo_tool() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "full_name": "acme/widgets",
                "default_branch": "main",
                "stargazers_count": 5
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(server.uri());
        let result = manager
            .execute("github_get_repo", json!({"repo": "acme/widgets"}))
            .await
            .unwrap();
        assert!(!result.is_error, "{}", result.output);
        let value = result.json().unwrap();
        assert_eq!(value["full_name"], "acme/widgets");
        assert_eq!(value["stars"], 5);
        assert!(!GitHubOp::GetRepo.mutating());
    }

    #[tokio::test]
    async fn test_missing_arguments_make_no_request() {
        let server = MockServer::start().await;
        let manager = manager_for(server.uri());

        let cases = [
            ("github_get_repo", json!({})),
            ("github_get_commits", json!({})),
            ("github_create_issue", json!({"repo": "acme/widgets"})),
            ("github_update_issue", json!({"repo": "acme/widgets"})),
            ("github_get_file", json!({"repo": "acme/widgets"})),
            ("github_add_to_project", json!({"repo": "acme/widgets", "issue_number": 1})),
            ("github_get_issues", json!({"repo": "acme/widgets", "state": "merged"})),
            ("github_update_issue", json!({"repo": "acme/widgets", "issue_number": 1, "state": "reopened"})),
        ];
        for (name, args) in cases {
            let result = manager.execute(name, args).await.unwrap();
            assert!(result.is_error, "{} should fail", name);
            assert_eq!(result.json().unwrap()["error"]["kind"], "validation", "{}", name);
        }

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_issue_tool_splits_labels() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/issues"))
            .and(wiremock::matchers::body_partial_json(json!({
                "labels": ["bug", "urgent"],
                "assignees": ["alice"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 12, "title": "Crash on start", "state": "open"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(server.uri());
        let result = manager
            .execute(
                "github_create_issue",
                json!({"repo": "widgets", "title": "Crash on start", "labels": "bug, urgent", "assignees": "alice"}),
            )
            .await
            .unwrap();

        assert!(!result.is_error, "{}", result.output);
        assert_eq!(result.json().unwrap()["number"], 12);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_structured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/gone/pulls"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let manager = manager_for(server.uri());
        let result = manager
            .execute("github_get_pull_requests", json!({"repo": "gone"}))
            .await
            .unwrap();

        assert!(result.is_error);
        let value = result.json().unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"]["kind"], "not_found");
        assert_eq!(value["error"]["status"], 404);
    }

    #[test]
    fn test_parse_issue_state() {
        assert_eq!(parse_issue_state("").unwrap(), None);
        assert_eq!(parse_issue_state("Closed").unwrap(), Some(IssueState::Closed));
        assert!(parse_issue_state("merged").is_err());
    }
}
