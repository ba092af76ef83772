use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{CreateTalkInput, Talk},
    error::GraphqlErrorPayload,
};

/// WebSocket subprotocol spoken by the realtime endpoint.
pub const GRAPHQL_TRANSPORT_WS: &str = "graphql-transport-ws";

pub const LIST_TALKS: &str = r#"query ListTalks($nextToken: String) {
  listTalks(nextToken: $nextToken) {
    items {
      id
      clientId
      name
      description
      speakerName
      speakerBio
      createdAt
    }
    nextToken
  }
}"#;

pub const CREATE_TALK: &str = r#"mutation CreateTalk($input: CreateTalkInput!) {
  createTalk(input: $input) {
    id
    clientId
    name
    description
    speakerName
    speakerBio
    createdAt
  }
}"#;

pub const ON_CREATE_TALK: &str = r#"subscription OnCreateTalk {
  onCreateTalk {
    id
    clientId
    name
    description
    speakerName
    speakerBio
    createdAt
  }
}"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub variables: Value,
}

impl GraphqlRequest {
    pub fn new(query: &str, operation_name: &str) -> Self {
        Self {
            query: query.to_string(),
            operation_name: Some(operation_name.to_string()),
            variables: Value::Null,
        }
    }

    /// One page of `listTalks`; pass the previous page's `nextToken` to continue.
    pub fn list_talks(next_token: Option<&str>) -> Self {
        let mut request = Self::new(LIST_TALKS, "ListTalks");
        if let Some(token) = next_token {
            request.variables = serde_json::json!({ "nextToken": token });
        }
        request
    }

    pub fn create_talk(input: &CreateTalkInput) -> Self {
        let mut request = Self::new(CREATE_TALK, "CreateTalk");
        request.variables = serde_json::json!({ "input": input });
        request
    }

    pub fn on_create_talk() -> Self {
        Self::new(ON_CREATE_TALK, "OnCreateTalk")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlErrorPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalkConnection {
    pub items: Vec<Talk>,
    #[serde(default, rename = "nextToken", skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTalksData {
    pub list_talks: TalkConnection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTalkData {
    pub create_talk: Talk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnCreateTalkData {
    pub on_create_talk: Talk,
}

/// Client-to-server frames of the `graphql-transport-ws` protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsClientMessage {
    ConnectionInit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Subscribe {
        id: String,
        payload: GraphqlRequest,
    },
    Complete {
        id: String,
    },
    Ping,
    Pong,
}

/// Server-to-client frames of the `graphql-transport-ws` protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsServerMessage {
    ConnectionAck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Next {
        id: String,
        payload: GraphqlResponse<Value>,
    },
    Error {
        id: String,
        payload: Vec<GraphqlErrorPayload>,
    },
    Complete {
        id: String,
    },
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    #[serde(rename = "ka")]
    KeepAlive,
    /// Any frame type this client does not handle.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
