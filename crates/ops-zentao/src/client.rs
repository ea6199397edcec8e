//! ZenTao REST API (v1) client
//!
//! Every operation logs in with `POST /tokens` and sends the returned token
//! in the `Token` header of its own request. No token is kept between calls.

use std::fmt;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use tracing::{debug, info};

use ops_core::http::{build_client, read_json};
use ops_core::{ApiError, ZentaoConfig};

use crate::types::*;

const USER_AGENT: &str = concat!("ops-bridge/", env!("CARGO_PKG_VERSION"));

pub const MAX_LIMIT: u32 = 1000;

/// ZenTao API client
#[derive(Clone)]
pub struct ZentaoClient {
    client: Client,
    api_url: String,
    account: String,
    password: String,
}

impl fmt::Debug for ZentaoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZentaoClient")
            .field("api_url", &self.api_url)
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl ZentaoClient {
    /// `config.url` is the instance root, e.g. `http://host/zentao`
    pub fn new(config: &ZentaoConfig) -> ops_core::Result<Self> {
        Ok(Self {
            client: build_client(USER_AGENT)?,
            api_url: format!("{}/api.php/v1", config.url.trim().trim_end_matches('/')),
            account: config.account.trim().to_string(),
            password: config.password.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// 禅道にログインしてトークンを取得する
    async fn login(&self) -> Result<String, ApiError> {
        let body = json!({ "account": self.account, "password": self.password });
        let response = self
            .client
            .post(format!("{}/tokens", self.api_url))
            .json(&body)
            .send()
            .await?;

        let token: TokenResponse = read_json(response).await.map_err(login_error)?;
        let token = token
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::authentication("ZenTao login returned no token"))?;
        debug!(account = %self.account, "ZenTao login succeeded");
        Ok(token)
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.login().await?;
        let url = format!("{}{}", self.api_url, path);
        debug!(method = %method, url = %url, "Building ZenTao request");
        Ok(self.client.request(method, url).header("Token", token))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path).await?.query(query).send().await?;
        read_json(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &JsonValue,
    ) -> Result<T, ApiError> {
        let response = self.request(method, path).await?.json(body).send().await?;
        read_json(response).await
    }

    // ==================== Products & projects ====================

    pub async fn list_products(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        let limit = check_limit(limit)?;
        let list: ProductList = self.get("/products", &[("limit", limit.to_string())]).await?;
        info!(count = list.products.len(), "Listed ZenTao products");
        Ok(list.products.into_iter().map(Product::from).collect())
    }

    pub async fn list_projects(&self, limit: u32) -> Result<Vec<Project>, ApiError> {
        let limit = check_limit(limit)?;
        let list: ProjectList = self.get("/projects", &[("limit", limit.to_string())]).await?;
        info!(count = list.projects.len(), "Listed ZenTao projects");
        Ok(list.projects.into_iter().map(Project::from).collect())
    }

    // ==================== Bugs ====================

    pub async fn list_bugs(
        &self,
        product_id: u64,
        status: Option<&str>,
        assigned_to: Option<&str>,
        limit: u32,
    ) -> Result<Vec<BugSummary>, ApiError> {
        check_id("product_id", product_id)?;
        let limit = check_limit(limit)?;

        let mut query = vec![("limit", limit.to_string())];
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        if let Some(assigned_to) = assigned_to {
            query.push(("assignedTo", assigned_to.to_string()));
        }

        let list: BugList = self
            .get(&format!("/products/{}/bugs", product_id), &query)
            .await?;
        info!(product = product_id, count = list.bugs.len(), "Listed ZenTao bugs");
        Ok(list.bugs.into_iter().map(BugSummary::from).collect())
    }

    /// Full bug record with person fields flattened to names
    pub async fn get_bug(&self, bug_id: u64) -> Result<JsonValue, ApiError> {
        check_id("bug_id", bug_id)?;
        let bug: JsonValue = self.get(&format!("/bugs/{}", bug_id), &[]).await?;
        info!(bug = bug_id, "Fetched ZenTao bug");
        Ok(normalize_people(bug))
    }

    /// Create a bug (mutating); the summary carries the new id
    pub async fn create_bug(&self, bug: &NewBug) -> Result<BugSummary, ApiError> {
        check_id("product_id", bug.product_id)?;
        let title = bug.title.trim();
        if title.is_empty() {
            return Err(ApiError::validation("title must not be empty"));
        }
        check_level("severity", bug.severity)?;
        check_level("pri", bug.pri)?;
        check_bug_type(&bug.bug_type)?;

        let mut body = json!({
            "product": bug.product_id,
            "title": title,
            "steps": bug.steps,
            "severity": bug.severity,
            "pri": bug.pri,
            "type": bug.bug_type,
        });
        if let Some(assigned_to) = bug.assigned_to.as_deref().filter(|a| !a.trim().is_empty()) {
            body["assignedTo"] = json!(assigned_to.trim());
        }

        let created: RawRecord = self
            .send_json(Method::POST, &format!("/products/{}/bugs", bug.product_id), &body)
            .await?;
        let summary = created_with_id(BugSummary::from(created), |b| b.id)?;
        info!(product = bug.product_id, bug = summary.id, "Created ZenTao bug");
        Ok(summary)
    }

    /// Update a bug (mutating)
    pub async fn update_bug(&self, bug_id: u64, update: &BugUpdate) -> Result<JsonValue, ApiError> {
        check_id("bug_id", bug_id)?;
        if let Some(severity) = update.severity {
            check_level("severity", severity)?;
        }
        if let Some(pri) = update.pri {
            check_level("pri", pri)?;
        }
        if let Some(bug_type) = update.bug_type.as_deref() {
            check_bug_type(bug_type)?;
        }
        let body = update.to_body();
        if body.is_empty() {
            return Err(ApiError::validation(
                "nothing to update: give at least one of title, steps, severity, pri, type, assigned_to",
            ));
        }

        let updated: JsonValue = self
            .send_json(Method::PUT, &format!("/bugs/{}", bug_id), &JsonValue::Object(body))
            .await?;
        info!(bug = bug_id, "Updated ZenTao bug");
        Ok(normalize_people(updated))
    }

    // ==================== Tasks ====================

    pub async fn list_tasks(
        &self,
        execution_id: u64,
        status: Option<&str>,
        limit: u32,
    ) -> Result<Vec<TaskSummary>, ApiError> {
        check_id("execution_id", execution_id)?;
        let limit = check_limit(limit)?;

        let mut query = vec![("limit", limit.to_string())];
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }

        let list: TaskList = self
            .get(&format!("/executions/{}/tasks", execution_id), &query)
            .await?;
        info!(execution = execution_id, count = list.tasks.len(), "Listed ZenTao tasks");
        Ok(list.tasks.into_iter().map(TaskSummary::from).collect())
    }

    pub async fn get_task(&self, task_id: u64) -> Result<JsonValue, ApiError> {
        check_id("task_id", task_id)?;
        let task: JsonValue = self.get(&format!("/tasks/{}", task_id), &[]).await?;
        info!(task = task_id, "Fetched ZenTao task");
        Ok(normalize_people(task))
    }

    /// Create a task (mutating); the summary carries the new id
    pub async fn create_task(&self, task: &NewTask) -> Result<TaskSummary, ApiError> {
        check_id("execution_id", task.execution_id)?;
        let name = task.name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("name must not be empty"));
        }
        check_level("pri", task.pri)?;
        if !task.estimate.is_finite() || task.estimate < 0.0 {
            return Err(ApiError::validation("estimate must be a non-negative number of hours"));
        }

        let mut body = json!({
            "name": name,
            "type": task.task_type,
            "pri": task.pri,
            "estimate": task.estimate,
        });
        if let Some(assigned_to) = task.assigned_to.as_deref().filter(|a| !a.trim().is_empty()) {
            body["assignedTo"] = json!(assigned_to.trim());
        }
        if !task.desc.trim().is_empty() {
            body["desc"] = json!(task.desc);
        }

        let created: RawRecord = self
            .send_json(
                Method::POST,
                &format!("/executions/{}/tasks", task.execution_id),
                &body,
            )
            .await?;
        let summary = created_with_id(TaskSummary::from(created), |t| t.id)?;
        info!(execution = task.execution_id, task = summary.id, "Created ZenTao task");
        Ok(summary)
    }

    // ==================== Stories ====================

    /// Requirements (stories) of a product
    pub async fn list_stories(
        &self,
        product_id: u64,
        status: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Story>, ApiError> {
        check_id("product_id", product_id)?;
        let limit = check_limit(limit)?;

        let mut query = vec![("limit", limit.to_string())];
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }

        let list: StoryList = self
            .get(&format!("/products/{}/stories", product_id), &query)
            .await?;
        info!(product = product_id, count = list.stories.len(), "Listed ZenTao stories");
        Ok(list.stories.into_iter().map(Story::from).collect())
    }
}

/// Any rejected login is an authentication failure; transport and 5xx stay upstream
fn login_error(err: ApiError) -> ApiError {
    match err {
        ApiError::Validation { status, message }
        | ApiError::NotFound { status, message }
        | ApiError::Authentication { status, message } => ApiError::Authentication {
            status,
            message: format!("ZenTao login failed: {}", message),
        },
        other => other,
    }
}

fn created_with_id<T>(record: T, id: impl Fn(&T) -> u64) -> Result<T, ApiError> {
    if id(&record) == 0 {
        Err(ApiError::upstream(None, "ZenTao did not return the id of the created record"))
    } else {
        Ok(record)
    }
}

fn check_id(field: &str, id: u64) -> Result<(), ApiError> {
    if id == 0 {
        Err(ApiError::validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

fn check_level(field: &str, level: u8) -> Result<(), ApiError> {
    if (1..=4).contains(&level) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "{} must be between 1 and 4, got {}",
            field, level
        )))
    }
}

fn check_bug_type(bug_type: &str) -> Result<(), ApiError> {
    if BUG_TYPES.contains(&bug_type) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "type must be one of {}, got '{}'",
            BUG_TYPES.join("/"),
            bug_type
        )))
    }
}

fn check_limit(limit: u32) -> Result<u32, ApiError> {
    if (1..=MAX_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(ApiError::validation(format!(
            "limit must be between 1 and {}, got {}",
            MAX_LIMIT, limit
        )))
    }
}
