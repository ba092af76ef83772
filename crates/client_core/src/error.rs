use shared::error::{summarize_errors, GraphqlErrorPayload};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphqlError {
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("graphql request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("graphql endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("graphql errors: {}", summarize_errors(.0))]
    Graphql(Vec<GraphqlErrorPayload>),
    #[error("graphql response for {operation} carried no data")]
    MissingData { operation: &'static str },
    #[error("unexpected realtime frame: {0}")]
    Protocol(String),
    #[error("realtime connection failed: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
