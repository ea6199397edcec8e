//! GitHub REST/GraphQL client
//!
//! One instance owns one pooled [`reqwest::Client`] and is shared across all
//! tool calls. Read methods only issue GET requests, except
//! [`GitHubClient::list_projects`] whose GraphQL query travels as a POST but
//! does not mutate anything.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, info};

use ops_core::http::{build_client, read_json};
use ops_core::{ApiError, GitHubConfig};

use crate::types::*;

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("ops-bridge/", env!("CARGO_PKG_VERSION"));

/// GitHub allows at most 100 items per page
pub const MAX_PER_PAGE: u32 = 100;

/// Results per page for code search
const CODE_SEARCH_PER_PAGE: u32 = 20;

const LIST_PROJECTS_QUERY: &str = r#"
query($login: String!, $first: Int!) {
  repositoryOwner(login: $login) {
    ... on ProjectV2Owner {
      projectsV2(first: $first, orderBy: {field: UPDATED_AT, direction: DESC}) {
        nodes { id number title url closed }
      }
    }
  }
}"#;

const ADD_PROJECT_ITEM_MUTATION: &str = r#"
mutation($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) {
    item { id }
  }
}"#;

/// Filters for [`GitHubClient::get_commits`]
#[derive(Debug, Clone, Default)]
pub struct CommitQuery {
    /// Branch name or sha; empty means the default branch
    pub branch: String,
    /// ISO 8601 lower bound
    pub since: Option<String>,
    /// ISO 8601 upper bound
    pub until: Option<String>,
    pub per_page: u32,
}

/// Fields for a new issue
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Option<Vec<String>>,
    pub assignees: Option<Vec<String>>,
}

/// Fields to change on an existing issue; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub state: Option<IssueState>,
    pub labels: Option<Vec<String>>,
}

impl IssueUpdate {
    fn to_body(&self) -> JsonValue {
        let mut body = json!({});
        if let Some(title) = &self.title {
            body["title"] = json!(title);
        }
        if let Some(text) = &self.body {
            body["body"] = json!(text);
        }
        if let Some(state) = self.state {
            body["state"] = json!(state);
        }
        if let Some(labels) = &self.labels {
            body["labels"] = json!(labels);
        }
        body
    }
}

/// GitHub API client
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    token: String,
    owner: String,
    base_url: String,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("owner", &self.owner)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create the client and its connection pool
    pub fn new(config: &GitHubConfig) -> ops_core::Result<Self> {
        Ok(Self {
            client: build_client(USER_AGENT)?,
            token: config.token.clone(),
            owner: config.owner.trim().to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Default owner for short repository names
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Authenticated request builder
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "Building GitHub request");
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        read_json(response).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: JsonValue,
    ) -> Result<T, ApiError> {
        let body = json!({ "query": query, "variables": variables });
        let response: GraphQlResponse<T> = self
            .send(self.request(Method::POST, "/graphql").json(&body))
            .await?;

        if let Some(first) = response.errors.first() {
            return Err(map_graphql_error(first));
        }
        response
            .data
            .ok_or_else(|| ApiError::upstream(None, "GraphQL response carried no data"))
    }

    /// リポジトリ名を owner/repo 形式に補完する
    ///
    /// A short name gets the default owner prepended. Anything that does not
    /// end up as exactly `owner/repo` is rejected before a request is made.
    pub fn full_repo(&self, repo: &str) -> Result<String, ApiError> {
        let repo = repo.trim();
        if repo.is_empty() {
            return Err(ApiError::validation("repo must not be empty"));
        }

        let full = if repo.contains('/') {
            repo.to_string()
        } else if !self.owner.is_empty() {
            format!("{}/{}", self.owner, repo)
        } else {
            return Err(ApiError::validation(format!(
                "repo '{}' has no owner and no default owner is configured; use owner/repo",
                repo
            )));
        };

        let mut parts = full.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(full),
            _ => Err(ApiError::validation(format!(
                "repo '{}' is not of the form owner/repo",
                full
            ))),
        }
    }

    // ==================== Repositories ====================

    /// Repositories of the authenticated user, most recently updated first
    pub async fn list_repos(&self, per_page: u32) -> Result<Vec<Repository>, ApiError> {
        let per_page = check_per_page(per_page)?;
        let repos: Vec<RawRepo> = self
            .get(
                "/user/repos",
                &[
                    ("per_page", per_page.to_string()),
                    ("sort", "updated".to_string()),
                    ("direction", "desc".to_string()),
                ],
            )
            .await?;
        info!(count = repos.len(), "Listed repositories");
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    /// Metadata of one repository
    pub async fn get_repo(&self, repo: &str) -> Result<RepositoryDetail, ApiError> {
        let full = self.full_repo(repo)?;
        let raw: RawRepo = self.get(&format!("/repos/{}", full), &[]).await?;
        info!(repo = %full, "Fetched repository");
        Ok(RepositoryDetail::from(raw))
    }

    pub async fn search_repos(
        &self,
        query: &str,
        per_page: u32,
    ) -> Result<Vec<Repository>, ApiError> {
        let query = require("query", query)?;
        let per_page = check_per_page(per_page)?;
        let result: SearchResponse<RawRepo> = self
            .get(
                "/search/repositories",
                &[
                    ("q", query.to_string()),
                    ("per_page", per_page.to_string()),
                    ("sort", "updated".to_string()),
                ],
            )
            .await?;
        info!(count = result.items.len(), query = query, "Searched repositories");
        Ok(result.items.into_iter().map(Repository::from).collect())
    }

    // ==================== Commits ====================

    /// Commit history, newest first as returned by GitHub
    pub async fn get_commits(
        &self,
        repo: &str,
        filter: &CommitQuery,
    ) -> Result<Vec<Commit>, ApiError> {
        let full = self.full_repo(repo)?;
        let per_page = check_per_page(filter.per_page)?;

        let mut query = vec![("per_page", per_page.to_string())];
        if !filter.branch.trim().is_empty() {
            query.push(("sha", filter.branch.trim().to_string()));
        }
        if let Some(since) = filter.since.as_deref().filter(|s| !s.is_empty()) {
            query.push(("since", since.to_string()));
        }
        if let Some(until) = filter.until.as_deref().filter(|s| !s.is_empty()) {
            query.push(("until", until.to_string()));
        }

        let commits: Vec<RawCommit> = self
            .get(&format!("/repos/{}/commits", full), &query)
            .await?;
        info!(repo = %full, count = commits.len(), "Fetched commits");
        Ok(commits.into_iter().map(Commit::from).collect())
    }

    /// One commit with its changed files
    pub async fn get_commit_detail(&self, repo: &str, sha: &str) -> Result<CommitDetail, ApiError> {
        let full = self.full_repo(repo)?;
        let sha = require("sha", sha)?;
        let commit: RawCommit = self
            .get(&format!("/repos/{}/commits/{}", full, encode_path(sha)), &[])
            .await?;
        info!(repo = %full, sha = sha, files = commit.files.len(), "Fetched commit detail");
        Ok(CommitDetail::from(commit))
    }

    // ==================== Pull requests ====================

    pub async fn get_pull_requests(
        &self,
        repo: &str,
        state: StateFilter,
        per_page: u32,
    ) -> Result<Vec<PullRequest>, ApiError> {
        let full = self.full_repo(repo)?;
        let per_page = check_per_page(per_page)?;
        let pulls: Vec<RawPull> = self
            .get(
                &format!("/repos/{}/pulls", full),
                &[
                    ("state", state.as_str().to_string()),
                    ("per_page", per_page.to_string()),
                    ("sort", "updated".to_string()),
                ],
            )
            .await?;
        info!(repo = %full, state = state.as_str(), count = pulls.len(), "Fetched pull requests");
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    // ==================== Issues ====================

    /// Issues only; GitHub also returns pull requests here, those are dropped
    pub async fn get_issues(
        &self,
        repo: &str,
        state: StateFilter,
        labels: Option<&str>,
        per_page: u32,
    ) -> Result<Vec<Issue>, ApiError> {
        let full = self.full_repo(repo)?;
        let per_page = check_per_page(per_page)?;

        let mut query = vec![
            ("state", state.as_str().to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(labels) = labels.filter(|l| !l.trim().is_empty()) {
            query.push(("labels", labels.trim().to_string()));
        }

        let raw: Vec<RawIssue> = self
            .get(&format!("/repos/{}/issues", full), &query)
            .await?;
        let issues: Vec<Issue> = raw
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(Issue::from)
            .collect();
        info!(repo = %full, state = state.as_str(), count = issues.len(), "Fetched issues");
        Ok(issues)
    }

    /// Create an issue (mutating)
    pub async fn create_issue(&self, repo: &str, issue: &NewIssue) -> Result<Issue, ApiError> {
        let full = self.full_repo(repo)?;
        let title = require("title", &issue.title)?;

        let mut body = json!({ "title": title });
        if !issue.body.is_empty() {
            body["body"] = json!(issue.body);
        }
        if let Some(labels) = issue.labels.as_ref().filter(|l| !l.is_empty()) {
            body["labels"] = json!(labels);
        }
        if let Some(assignees) = issue.assignees.as_ref().filter(|a| !a.is_empty()) {
            body["assignees"] = json!(assignees);
        }

        let created: RawIssue = self
            .send(
                self.request(Method::POST, &format!("/repos/{}/issues", full))
                    .json(&body),
            )
            .await?;
        info!(repo = %full, number = created.number, "Created issue");
        Ok(Issue::from(created))
    }

    /// Update an issue (mutating)
    pub async fn update_issue(
        &self,
        repo: &str,
        number: u64,
        update: &IssueUpdate,
    ) -> Result<Issue, ApiError> {
        let full = self.full_repo(repo)?;
        if number == 0 {
            return Err(ApiError::validation("issue_number must be positive"));
        }
        let body = update.to_body();
        if body.as_object().is_none_or(|o| o.is_empty()) {
            return Err(ApiError::validation(
                "nothing to update: give at least one of title, body, state, labels",
            ));
        }

        let updated: RawIssue = self
            .send(
                self.request(Method::PATCH, &format!("/repos/{}/issues/{}", full, number))
                    .json(&body),
            )
            .await?;
        info!(repo = %full, number = number, "Updated issue");
        Ok(Issue::from(updated))
    }

    // ==================== Contents ====================

    /// Read one file, decoding GitHub's base64 payload
    pub async fn get_file(
        &self,
        repo: &str,
        file_path: &str,
        git_ref: &str,
    ) -> Result<FileContent, ApiError> {
        let full = self.full_repo(repo)?;
        let file_path = require("file_path", file_path)?.trim_start_matches('/');

        let value: JsonValue = self
            .get(
                &format!("/repos/{}/contents/{}", full, encode_path(file_path)),
                &ref_query(git_ref),
            )
            .await?;
        if value.is_array() {
            return Err(ApiError::validation(format!(
                "'{}' is a directory; list it instead",
                file_path
            )));
        }

        let raw: RawContent = serde_json::from_value(value)
            .map_err(|e| ApiError::upstream(None, format!("unexpected contents payload: {}", e)))?;
        let content = decode_content(raw.content.as_deref(), raw.encoding.as_deref())?;
        info!(repo = %full, path = file_path, "Read file");

        Ok(FileContent {
            name: raw.name,
            path: raw.path,
            size: raw.size,
            content,
        })
    }

    /// List a directory; the repository root when `path` is empty
    pub async fn list_directory(
        &self,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<DirectoryEntry>, ApiError> {
        let full = self.full_repo(repo)?;
        let path = path.trim().trim_matches('/');
        let api_path = if path.is_empty() {
            format!("/repos/{}/contents", full)
        } else {
            format!("/repos/{}/contents/{}", full, encode_path(path))
        };

        let value: JsonValue = self.get(&api_path, &ref_query(git_ref)).await?;
        let raw: Vec<RawContent> = if value.is_array() {
            serde_json::from_value(value)
        } else {
            // a file path yields a single object
            serde_json::from_value::<RawContent>(value).map(|c| vec![c])
        }
        .map_err(|e| ApiError::upstream(None, format!("unexpected contents payload: {}", e)))?;

        info!(repo = %full, path = path, count = raw.len(), "Listed directory");
        Ok(raw.into_iter().map(DirectoryEntry::from).collect())
    }

    pub async fn search_code(&self, repo: &str, query: &str) -> Result<Vec<CodeSearchHit>, ApiError> {
        let full = self.full_repo(repo)?;
        let query = require("query", query)?;
        let result: SearchResponse<RawSearchHit> = self
            .get(
                "/search/code",
                &[
                    ("q", format!("{} repo:{}", query, full)),
                    ("per_page", CODE_SEARCH_PER_PAGE.to_string()),
                ],
            )
            .await?;
        info!(repo = %full, query = query, count = result.items.len(), "Searched code");
        Ok(result.items.into_iter().map(CodeSearchHit::from).collect())
    }

    // ==================== Actions ====================

    pub async fn get_workflow_runs(
        &self,
        repo: &str,
        status: Option<&str>,
        per_page: u32,
    ) -> Result<Vec<WorkflowRun>, ApiError> {
        let full = self.full_repo(repo)?;
        let per_page = check_per_page(per_page)?;

        let mut query = vec![("per_page", per_page.to_string())];
        if let Some(status) = status.filter(|s| !s.trim().is_empty()) {
            query.push(("status", status.trim().to_string()));
        }

        let result: WorkflowRunsResponse = self
            .get(&format!("/repos/{}/actions/runs", full), &query)
            .await?;
        info!(repo = %full, count = result.workflow_runs.len(), "Fetched workflow runs");
        Ok(result.workflow_runs.into_iter().map(WorkflowRun::from).collect())
    }

    // ==================== Projects (v2) ====================

    /// Project boards of a user or organization (GraphQL query, read-only)
    pub async fn list_projects(&self, owner: &str, first: u32) -> Result<Vec<ProjectBoard>, ApiError> {
        let owner = match owner.trim() {
            "" if self.owner.is_empty() => {
                return Err(ApiError::validation(
                    "owner must be given when no default owner is configured",
                ));
            }
            "" => self.owner.as_str(),
            given => given,
        };
        let first = check_per_page(first)?;

        let data: ProjectsData = self
            .graphql(LIST_PROJECTS_QUERY, json!({ "login": owner, "first": first }))
            .await?;
        let owner_node = data
            .repository_owner
            .ok_or_else(|| ApiError::not_found(format!("owner '{}' not found", owner)))?;

        let boards: Vec<ProjectBoard> = owner_node
            .projects
            .map(|c| c.nodes.into_iter().flatten().collect())
            .unwrap_or_default();
        info!(owner = owner, count = boards.len(), "Listed project boards");
        Ok(boards)
    }

    /// Insert an existing issue into a board (mutating)
    pub async fn add_issue_to_project(
        &self,
        project_id: &str,
        repo: &str,
        issue_number: u64,
    ) -> Result<ProjectItem, ApiError> {
        let project_id = require("project_id", project_id)?;
        let full = self.full_repo(repo)?;
        if issue_number == 0 {
            return Err(ApiError::validation("issue_number must be positive"));
        }

        let issue: RawIssue = self
            .get(&format!("/repos/{}/issues/{}", full, issue_number), &[])
            .await?;
        if issue.node_id.is_empty() {
            return Err(ApiError::upstream(None, "issue payload carried no node_id"));
        }

        let data: AddItemData = self
            .graphql(
                ADD_PROJECT_ITEM_MUTATION,
                json!({ "projectId": project_id, "contentId": issue.node_id }),
            )
            .await?;
        let item_id = data
            .add_item
            .and_then(|p| p.item)
            .map(|i| i.id)
            .ok_or_else(|| ApiError::upstream(None, "mutation returned no project item"))?;

        info!(repo = %full, issue = issue_number, project = project_id, "Added issue to project");
        Ok(ProjectItem {
            item_id,
            project_id: project_id.to_string(),
            issue_number,
            issue_url: issue.html_url,
        })
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ApiError::validation(format!("{} must not be empty", field)))
    } else {
        Ok(value)
    }
}

fn check_per_page(per_page: u32) -> Result<u32, ApiError> {
    if (1..=MAX_PER_PAGE).contains(&per_page) {
        Ok(per_page)
    } else {
        Err(ApiError::validation(format!(
            "per_page must be between 1 and {}, got {}",
            MAX_PER_PAGE, per_page
        )))
    }
}

/// パスの各セグメントをパーセントエンコードする（`/` は区切りとして残す）
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn ref_query(git_ref: &str) -> Vec<(&'static str, String)> {
    let git_ref = git_ref.trim();
    if git_ref.is_empty() {
        Vec::new()
    } else {
        vec![("ref", git_ref.to_string())]
    }
}

/// GitHub's base64 may contain line breaks
fn decode_content(content: Option<&str>, encoding: Option<&str>) -> Result<String, ApiError> {
    let content = content.unwrap_or_default();
    if encoding != Some("base64") {
        return Ok(content.to_string());
    }
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(cleaned)
        .map_err(|e| ApiError::upstream(None, format!("invalid base64 content: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn map_graphql_error(error: &GraphQlError) -> ApiError {
    let message = error.message.clone();
    match error.kind.as_deref() {
        Some("NOT_FOUND") => ApiError::NotFound {
            status: None,
            message,
        },
        Some("FORBIDDEN") | Some("INSUFFICIENT_SCOPES") => ApiError::Authentication {
            status: None,
            message,
        },
        Some("RATE_LIMITED") => ApiError::RateLimited {
            status: None,
            message,
            retry_after: None,
        },
        _ => ApiError::Upstream {
            status: None,
            message,
        },
    }
}
