//! ZenTao API types
//!
//! 禅道の数値フィールドは数値と文字列のどちらでも返ることがあるため、
//! raw 型は `JsonValue` で受けてから正規化します。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Fields of a bug or task record that hold a person
const PERSON_FIELDS: &[&str] = &[
    "assignedTo",
    "openedBy",
    "resolvedBy",
    "closedBy",
    "lastEditedBy",
    "finishedBy",
    "canceledBy",
    "PM",
    "PO",
    "QD",
    "RD",
];

/// Bug types accepted by `create_bug`
pub const BUG_TYPES: &[&str] = &[
    "codeerror",
    "designdefect",
    "config",
    "install",
    "security",
    "performance",
    "standard",
    "automation",
    "other",
];

/// Normalize a person field
///
/// ZenTao sends either `{"account": "...", "realname": "..."}` or a plain
/// account string; both become a display string.
pub fn person_name(value: &JsonValue) -> String {
    match value {
        JsonValue::Object(obj) => obj
            .get("realname")
            .and_then(JsonValue::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| obj.get("account").and_then(JsonValue::as_str))
            .unwrap_or_default()
            .to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Replace every known person field of a record with its display string
pub fn normalize_people(mut record: JsonValue) -> JsonValue {
    if let Some(obj) = record.as_object_mut() {
        for field in PERSON_FIELDS {
            if let Some(value) = obj.get_mut(*field) {
                *value = JsonValue::String(person_name(value));
            }
        }
    }
    record
}

fn lenient_u64(value: &JsonValue) -> u64 {
    match value {
        JsonValue::Number(n) => n.as_u64().unwrap_or_default(),
        JsonValue::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

fn lenient_f64(value: &JsonValue) -> f64 {
    match value {
        JsonValue::Number(n) => n.as_f64().unwrap_or_default(),
        JsonValue::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

fn lenient_str(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Normalized records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub bugs: u64,
    pub unresolved: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub begin: String,
    pub end: String,
    pub pm: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BugSummary {
    pub id: u64,
    pub title: String,
    pub status: String,
    pub severity: u64,
    pub pri: u64,
    pub assigned_to: String,
    pub opened_by: String,
    pub opened_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSummary {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub pri: u64,
    pub assigned_to: String,
    pub deadline: String,
    /// Estimated hours
    pub estimate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub status: String,
    pub pri: u64,
    pub stage: String,
    pub assigned_to: String,
}

// ============================================================================
// Raw upstream payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawRecord {
    #[serde(default)]
    pub id: JsonValue,
    #[serde(default)]
    pub name: JsonValue,
    #[serde(default)]
    pub title: JsonValue,
    #[serde(default)]
    pub status: JsonValue,
    #[serde(default)]
    pub severity: JsonValue,
    #[serde(default)]
    pub pri: JsonValue,
    #[serde(default)]
    pub bugs: JsonValue,
    #[serde(default, rename = "unResolved")]
    pub unresolved: JsonValue,
    #[serde(default)]
    pub begin: JsonValue,
    #[serde(default)]
    pub end: JsonValue,
    #[serde(default, rename = "PM")]
    pub pm: JsonValue,
    #[serde(default, rename = "assignedTo")]
    pub assigned_to: JsonValue,
    #[serde(default, rename = "openedBy")]
    pub opened_by: JsonValue,
    #[serde(default, rename = "openedDate")]
    pub opened_date: JsonValue,
    #[serde(default)]
    pub deadline: JsonValue,
    #[serde(default)]
    pub estimate: JsonValue,
    #[serde(default)]
    pub stage: JsonValue,
}

impl RawRecord {
    pub fn id(&self) -> u64 {
        lenient_u64(&self.id)
    }
}

impl From<RawRecord> for Product {
    fn from(r: RawRecord) -> Self {
        Self {
            id: r.id(),
            name: lenient_str(&r.name),
            status: lenient_str(&r.status),
            bugs: lenient_u64(&r.bugs),
            unresolved: lenient_u64(&r.unresolved),
        }
    }
}

impl From<RawRecord> for Project {
    fn from(r: RawRecord) -> Self {
        Self {
            id: r.id(),
            name: lenient_str(&r.name),
            status: lenient_str(&r.status),
            begin: lenient_str(&r.begin),
            end: lenient_str(&r.end),
            pm: person_name(&r.pm),
        }
    }
}

impl From<RawRecord> for BugSummary {
    fn from(r: RawRecord) -> Self {
        Self {
            id: r.id(),
            title: lenient_str(&r.title),
            status: lenient_str(&r.status),
            severity: lenient_u64(&r.severity),
            pri: lenient_u64(&r.pri),
            assigned_to: person_name(&r.assigned_to),
            opened_by: person_name(&r.opened_by),
            opened_date: lenient_str(&r.opened_date),
        }
    }
}

impl From<RawRecord> for TaskSummary {
    fn from(r: RawRecord) -> Self {
        Self {
            id: r.id(),
            name: lenient_str(&r.name),
            status: lenient_str(&r.status),
            pri: lenient_u64(&r.pri),
            assigned_to: person_name(&r.assigned_to),
            deadline: lenient_str(&r.deadline),
            estimate: lenient_f64(&r.estimate),
        }
    }
}

impl From<RawRecord> for Story {
    fn from(r: RawRecord) -> Self {
        Self {
            id: r.id(),
            title: lenient_str(&r.title),
            status: lenient_str(&r.status),
            pri: lenient_u64(&r.pri),
            stage: lenient_str(&r.stage),
            assigned_to: person_name(&r.assigned_to),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductList {
    #[serde(default)]
    pub products: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectList {
    #[serde(default)]
    pub projects: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BugList {
    #[serde(default)]
    pub bugs: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskList {
    #[serde(default)]
    pub tasks: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoryList {
    #[serde(default)]
    pub stories: Vec<RawRecord>,
}

// ============================================================================
// Write payloads
// ============================================================================

/// Fields for a new bug
#[derive(Debug, Clone, PartialEq)]
pub struct NewBug {
    pub product_id: u64,
    pub title: String,
    /// Reproduction steps (HTML allowed)
    pub steps: String,
    /// 1 = fatal .. 4 = minor
    pub severity: u8,
    /// 1 = urgent .. 4 = low
    pub pri: u8,
    pub bug_type: String,
    /// Account name
    pub assigned_to: Option<String>,
}

impl Default for NewBug {
    fn default() -> Self {
        Self {
            product_id: 0,
            title: String::new(),
            steps: String::new(),
            severity: 3,
            pri: 3,
            bug_type: "codeerror".to_string(),
            assigned_to: None,
        }
    }
}

/// Fields to change on a bug; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BugUpdate {
    pub title: Option<String>,
    pub steps: Option<String>,
    pub severity: Option<u8>,
    pub pri: Option<u8>,
    pub bug_type: Option<String>,
    pub assigned_to: Option<String>,
}

impl BugUpdate {
    pub(crate) fn to_body(&self) -> Map<String, JsonValue> {
        let mut body = Map::new();
        if let Some(title) = &self.title {
            body.insert("title".into(), title.clone().into());
        }
        if let Some(steps) = &self.steps {
            body.insert("steps".into(), steps.clone().into());
        }
        if let Some(severity) = self.severity {
            body.insert("severity".into(), severity.into());
        }
        if let Some(pri) = self.pri {
            body.insert("pri".into(), pri.into());
        }
        if let Some(bug_type) = &self.bug_type {
            body.insert("type".into(), bug_type.clone().into());
        }
        if let Some(assigned_to) = &self.assigned_to {
            body.insert("assignedTo".into(), assigned_to.clone().into());
        }
        body
    }
}

/// Fields for a new task
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub execution_id: u64,
    pub name: String,
    pub assigned_to: Option<String>,
    /// Estimated hours
    pub estimate: f64,
    pub pri: u8,
    pub desc: String,
    /// devel, test, design, ...
    pub task_type: String,
}

impl Default for NewTask {
    fn default() -> Self {
        Self {
            execution_id: 0,
            name: String::new(),
            assigned_to: None,
            estimate: 0.0,
            pri: 3,
            desc: String::new(),
            task_type: "devel".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_person_name_shapes() {
        assert_eq!(person_name(&json!({"account": "alice", "realname": "爱丽丝"})), "爱丽丝");
        assert_eq!(person_name(&json!({"account": "alice", "realname": ""})), "alice");
        assert_eq!(person_name(&json!("bob")), "bob");
        assert_eq!(person_name(&JsonValue::Null), "");
    }

    #[test]
    fn test_normalize_people_in_record() {
        let record = normalize_people(json!({
            "id": 5,
            "assignedTo": {"account": "alice", "realname": "Alice"},
            "openedBy": "admin",
            "title": "登录失败"
        }));
        assert_eq!(record["assignedTo"], "Alice");
        assert_eq!(record["openedBy"], "admin");
        assert_eq!(record["title"], "登录失败");
    }

    #[test]
    fn test_bug_summary_lenient_numbers() {
        let raw: RawRecord = serde_json::from_value(json!({
            "id": "12",
            "title": "Crash",
            "status": "active",
            "severity": "2",
            "pri": 1,
            "assignedTo": {"account": "alice", "realname": "Alice"},
            "openedBy": "admin",
            "openedDate": "2026-02-26 10:00:00"
        }))
        .unwrap();
        let bug = BugSummary::from(raw);
        assert_eq!(bug.id, 12);
        assert_eq!(bug.severity, 2);
        assert_eq!(bug.pri, 1);
        assert_eq!(bug.assigned_to, "Alice");
        assert_eq!(bug.opened_by, "admin");
    }

    #[test]
    fn test_project_pm() {
        let raw: RawRecord = serde_json::from_value(json!({
            "id": 3, "name": "Website", "status": "doing",
            "begin": "2026-01-01", "end": "2026-06-30",
            "PM": {"account": "pm1", "realname": "Li Lei"}
        }))
        .unwrap();
        assert_eq!(Project::from(raw).pm, "Li Lei");
    }

    #[test]
    fn test_bug_update_body_uses_zentao_keys() {
        let body = BugUpdate {
            assigned_to: Some("alice".into()),
            bug_type: Some("config".into()),
            ..Default::default()
        }
        .to_body();
        assert_eq!(body.get("assignedTo"), Some(&json!("alice")));
        assert_eq!(body.get("type"), Some(&json!("config")));
        assert_eq!(body.len(), 2);
        assert!(BugUpdate::default().to_body().is_empty());
    }
}
