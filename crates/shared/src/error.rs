use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a GraphQL response's `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl GraphqlErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            error_type: None,
        }
    }
}

/// Joins a batch of GraphQL errors into a single log-friendly line.
pub fn summarize_errors(errors: &[GraphqlErrorPayload]) -> String {
    errors
        .iter()
        .map(|err| match &err.error_type {
            Some(kind) => format!("{kind}: {}", err.message),
            None => err.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
