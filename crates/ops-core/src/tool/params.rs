//! Argument helpers for catalog entries

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::ApiError;

/// Deserialize a tool's argument object into its typed parameter struct
///
/// Missing or ill-typed arguments become [`ApiError::Validation`] before any
/// network call is made.
pub fn parse_args<T: DeserializeOwned>(input: JsonValue) -> Result<T, ApiError> {
    let input = match input {
        JsonValue::Null => JsonValue::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(input).map_err(|e| ApiError::validation(e.to_string()))
}

/// Split a comma-separated argument; empty input means "not given"
pub fn split_csv(value: &str) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() { None } else { Some(items) }
}

pub fn to_json<T: Serialize>(value: T) -> Result<JsonValue, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::upstream(None, format!("failed to encode result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Params {
        repo: String,
        #[serde(default = "default_per_page")]
        per_page: u32,
    }

    fn default_per_page() -> u32 {
        20
    }

    #[test]
    fn test_parse_args_defaults() {
        let p: Params = parse_args(json!({"repo": "acme/widgets"})).unwrap();
        assert_eq!(p.repo, "acme/widgets");
        assert_eq!(p.per_page, 20);
    }

    #[test]
    fn test_parse_args_missing_required() {
        let err = parse_args::<Params>(json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("repo"));

        let err = parse_args::<Params>(JsonValue::Null).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_parse_args_wrong_type() {
        let err = parse_args::<Params>(json!({"repo": "a/b", "per_page": "many"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_split_csv() {
        assert_eq!(
            split_csv(" bug, urgent ,,"),
            Some(vec!["bug".to_string(), "urgent".to_string()])
        );
        assert_eq!(split_csv(""), None);
        assert_eq!(split_csv(" , "), None);
    }
}
