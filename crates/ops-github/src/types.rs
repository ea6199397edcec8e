//! GitHub API types
//!
//! `Raw*` types mirror the upstream payloads (only the fields we read);
//! the public record types are the normalized shapes returned to the agent.

use serde::{Deserialize, Serialize};

/// Longest patch excerpt kept per changed file
pub const PATCH_EXCERPT_LEN: usize = 500;

/// State filter for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Target state when updating an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

// ============================================================================
// Normalized records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Repository {
    pub full_name: String,
    pub description: String,
    pub html_url: String,
    pub default_branch: String,
    pub language: String,
    pub updated_at: String,
    pub private: bool,
}

/// Repository metadata as returned by `get_repo`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryDetail {
    #[serde(flatten)]
    pub summary: Repository,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub topics: Vec<String>,
    pub archived: bool,
    pub created_at: String,
    pub pushed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commit {
    pub sha: String,
    pub author: String,
    pub message: String,
    pub timestamp: String,
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitFile {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    /// Truncated to [`PATCH_EXCERPT_LEN`] characters
    pub patch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitDetail {
    pub sha: String,
    pub author: String,
    pub message: String,
    pub timestamp: String,
    pub files: Vec<CommitFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub user: String,
    pub head: String,
    pub base: String,
    pub created_at: String,
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub user: String,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    pub created_at: String,
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileContent {
    pub name: String,
    pub path: String,
    pub size: u64,
    /// Decoded text (lossy UTF-8)
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    /// `file`, `dir`, `symlink` or `submodule`
    #[serde(rename = "type")]
    pub kind: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeSearchHit {
    pub name: String,
    pub path: String,
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub conclusion: String,
    pub branch: String,
    pub created_at: String,
    pub html_url: String,
}

/// A Projects (v2) board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBoard {
    /// GraphQL node id, used when adding items
    pub id: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub closed: bool,
}

/// Result of inserting an issue into a board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectItem {
    pub item_id: String,
    pub project_id: String,
    pub issue_number: u64,
    pub issue_url: String,
}

// ============================================================================
// Raw upstream payloads
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawUser {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawRepo {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<String>,
}

impl From<RawRepo> for RepositoryDetail {
    fn from(mut r: RawRepo) -> Self {
        let topics = std::mem::take(&mut r.topics);
        let (stars, forks, open_issues, archived) =
            (r.stargazers_count, r.forks_count, r.open_issues_count, r.archived);
        let created_at = r.created_at.take().unwrap_or_default();
        let pushed_at = r.pushed_at.take().unwrap_or_default();
        Self {
            summary: Repository::from(r),
            stars,
            forks,
            open_issues,
            topics,
            archived,
            created_at,
            pushed_at,
        }
    }
}

impl From<RawRepo> for Repository {
    fn from(r: RawRepo) -> Self {
        Self {
            full_name: r.full_name,
            description: r.description.unwrap_or_default(),
            html_url: r.html_url,
            default_branch: r.default_branch.unwrap_or_else(|| "main".to_string()),
            language: r.language.unwrap_or_default(),
            updated_at: r.updated_at.unwrap_or_default(),
            private: r.private,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawGitActor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawCommitInfo {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<RawGitActor>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCommitFile {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub patch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCommit {
    pub sha: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub commit: RawCommitInfo,
    #[serde(default)]
    pub files: Vec<RawCommitFile>,
}

impl From<RawCommit> for Commit {
    fn from(c: RawCommit) -> Self {
        let author = c.commit.author.unwrap_or_default();
        Self {
            sha: c.sha,
            author: author.name,
            message: c.commit.message.trim().to_string(),
            timestamp: author.date,
            html_url: c.html_url,
        }
    }
}

impl From<RawCommitFile> for CommitFile {
    fn from(f: RawCommitFile) -> Self {
        let patch = f.patch.unwrap_or_default();
        Self {
            filename: f.filename,
            status: f.status,
            additions: f.additions,
            deletions: f.deletions,
            patch: truncate_chars(&patch, PATCH_EXCERPT_LEN),
        }
    }
}

impl From<RawCommit> for CommitDetail {
    fn from(c: RawCommit) -> Self {
        let author = c.commit.author.unwrap_or_default();
        Self {
            sha: c.sha,
            author: author.name,
            message: c.commit.message.trim().to_string(),
            timestamp: author.date,
            files: c.files.into_iter().map(CommitFile::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawRef {
    #[serde(default, rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPull {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub head: RawRef,
    #[serde(default)]
    pub base: RawRef,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub html_url: String,
}

impl From<RawPull> for PullRequest {
    fn from(p: RawPull) -> Self {
        Self {
            number: p.number,
            title: p.title,
            state: p.state,
            user: p.user.unwrap_or_default().login,
            head: p.head.git_ref,
            base: p.base.git_ref,
            created_at: p.created_at,
            html_url: p.html_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawLabel {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawIssue {
    pub number: u64,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub assignees: Vec<RawUser>,
    #[serde(default)]
    pub labels: Vec<RawLabel>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub html_url: String,
    /// Present when the "issue" is really a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl From<RawIssue> for Issue {
    fn from(i: RawIssue) -> Self {
        Self {
            number: i.number,
            title: i.title,
            state: i.state,
            user: i.user.unwrap_or_default().login,
            assignees: i.assignees.into_iter().map(|a| a.login).collect(),
            labels: i.labels.into_iter().map(|l| l.name).collect(),
            created_at: i.created_at,
            html_url: i.html_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawContent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl From<RawContent> for DirectoryEntry {
    fn from(c: RawContent) -> Self {
        Self {
            name: c.name,
            path: c.path,
            kind: c.kind,
            size: c.size,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawSearchHit {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub html_url: String,
}

impl From<RawSearchHit> for CodeSearchHit {
    fn from(h: RawSearchHit) -> Self {
        Self {
            name: h.name,
            path: h.path,
            html_url: h.html_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawWorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub head_branch: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub html_url: String,
}

impl From<RawWorkflowRun> for WorkflowRun {
    fn from(r: RawWorkflowRun) -> Self {
        Self {
            id: r.id,
            name: r.name.unwrap_or_default(),
            status: r.status.unwrap_or_default(),
            conclusion: r.conclusion.unwrap_or_default(),
            branch: r.head_branch.unwrap_or_default(),
            created_at: r.created_at,
            html_url: r.html_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WorkflowRunsResponse {
    #[serde(default)]
    pub workflow_runs: Vec<RawWorkflowRun>,
}

// ============================================================================
// GraphQL
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphQlError {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectsData {
    #[serde(rename = "repositoryOwner")]
    pub repository_owner: Option<ProjectsOwner>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectsOwner {
    #[serde(rename = "projectsV2")]
    pub projects: Option<ProjectConnection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectConnection {
    #[serde(default)]
    pub nodes: Vec<Option<ProjectBoard>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddItemData {
    #[serde(rename = "addProjectV2ItemById")]
    pub add_item: Option<AddItemPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddItemPayload {
    pub item: Option<NodeId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeId {
    pub id: String,
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_commit_normalization() {
        let raw: RawCommit = serde_json::from_value(json!({
            "sha": "0123456789abcdef",
            "html_url": "https://github.com/acme/widgets/commit/0123456789abcdef",
            "commit": {
                "message": "Fix login bug\n\n",
                "author": {"name": "Alice", "date": "2026-02-26T08:00:00Z"}
            }
        }))
        .unwrap();

        let commit = Commit::from(raw);
        assert_eq!(commit.sha, "0123456789abcdef");
        assert_eq!(commit.author, "Alice");
        assert_eq!(commit.message, "Fix login bug");
        assert_eq!(commit.timestamp, "2026-02-26T08:00:00Z");
    }

    #[test]
    fn test_commit_file_patch_is_truncated() {
        let raw = RawCommitFile {
            filename: "src/lib.rs".into(),
            status: "modified".into(),
            additions: 3,
            deletions: 1,
            patch: Some("é".repeat(PATCH_EXCERPT_LEN + 10)),
        };
        let file = CommitFile::from(raw);
        assert_eq!(file.patch.chars().count(), PATCH_EXCERPT_LEN);
    }

    #[test]
    fn test_repo_nullable_fields() {
        let raw: RawRepo = serde_json::from_value(json!({
            "full_name": "acme/widgets",
            "description": null,
            "html_url": "https://github.com/acme/widgets",
            "language": null,
            "private": true
        }))
        .unwrap();
        let repo = Repository::from(raw);
        assert_eq!(repo.description, "");
        assert_eq!(repo.default_branch, "main");
        assert!(repo.private);
    }

    #[test]
    fn test_state_filter_serde() {
        let state: StateFilter = serde_json::from_value(json!("all")).unwrap();
        assert_eq!(state, StateFilter::All);
        assert!(serde_json::from_value::<StateFilter>(json!("merged")).is_err());
        assert_eq!(StateFilter::default().as_str(), "open");
    }
}
