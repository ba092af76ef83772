//! GraphQL-over-HTTP client for the talk query and mutation.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared::{
    domain::{CreateTalkInput, Talk},
    protocol::{CreateTalkData, GraphqlRequest, GraphqlResponse, ListTalksData},
};
use tracing::{debug, info};
use url::Url;

use crate::{error::GraphqlError, TalkMutation, TalkQuery};

/// Credential forwarded with every request. Obtaining it is the caller's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credential {
    #[default]
    Anonymous,
    ApiKey(String),
    Bearer(String),
}

impl Credential {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credential::Anonymous => request,
            Credential::ApiKey(key) => request.header("x-api-key", key),
            Credential::Bearer(token) => request.bearer_auth(token),
        }
    }

    /// Payload for the realtime `connection_init` frame.
    pub fn connection_payload(&self) -> Option<Value> {
        match self {
            Credential::Anonymous => None,
            Credential::ApiKey(key) => Some(json!({ "x-api-key": key })),
            Credential::Bearer(token) => Some(json!({ "Authorization": format!("Bearer {token}") })),
        }
    }
}

pub(crate) fn parse_endpoint(endpoint: &str, schemes: &[&str]) -> Result<Url, GraphqlError> {
    let url = Url::parse(endpoint).map_err(|err| GraphqlError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(GraphqlError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("scheme must be one of {}", schemes.join(", ")),
        });
    }
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: Client,
    endpoint: Url,
    credential: Credential,
}

impl GraphqlClient {
    pub fn new(endpoint: &str, credential: Credential) -> Result<Self, GraphqlError> {
        Ok(Self {
            http: Client::new(),
            endpoint: parse_endpoint(endpoint, &["http", "https"])?,
            credential,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: &GraphqlRequest,
    ) -> Result<T, GraphqlError> {
        let res = self
            .credential
            .apply(self.http.post(self.endpoint.clone()))
            .json(request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GraphqlError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GraphqlResponse<T> = res.json().await?;
        if !body.errors.is_empty() {
            return Err(GraphqlError::Graphql(body.errors));
        }
        body.data.ok_or(GraphqlError::MissingData { operation })
    }
}

#[async_trait]
impl TalkQuery for GraphqlClient {
    async fn list_talks(&self) -> Result<Vec<Talk>> {
        let mut talks = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page: ListTalksData = self
                .execute(
                    "listTalks",
                    &GraphqlRequest::list_talks(next_token.as_deref()),
                )
                .await?;
            debug!(items = page.list_talks.items.len(), "received listTalks page");
            talks.extend(page.list_talks.items);
            match page.list_talks.next_token {
                Some(token) if next_token.as_deref() == Some(token.as_str()) => {
                    return Err(GraphqlError::Protocol(format!(
                        "listTalks returned the same nextToken {token:?} twice"
                    ))
                    .into());
                }
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        Ok(talks)
    }
}

#[async_trait]
impl TalkMutation for GraphqlClient {
    async fn create_talk(&self, input: CreateTalkInput) -> Result<Talk> {
        let data: CreateTalkData = self
            .execute("createTalk", &GraphqlRequest::create_talk(&input))
            .await?;
        info!(id = ?data.create_talk.id, "createTalk acknowledged");
        Ok(data.create_talk)
    }
}

#[cfg(test)]
#[path = "tests/graphql_tests.rs"]
mod tests;
