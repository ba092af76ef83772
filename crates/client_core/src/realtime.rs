//! `graphql-transport-ws` subscription to `onCreateTalk`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use shared::{
    domain::Talk,
    protocol::{
        GraphqlRequest, OnCreateTalkData, WsClientMessage, WsServerMessage, GRAPHQL_TRANSPORT_WS,
    },
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::SEC_WEBSOCKET_PROTOCOL, HeaderValue},
        Error as WsError, Message,
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info};
use url::Url;

use crate::{
    error::GraphqlError,
    graphql::{parse_endpoint, Credential},
    TalkSubscriber, TalkSubscription,
};

const SUBSCRIPTION_ID: &str = "1";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Derives the realtime URL from a GraphQL HTTP endpoint (`http` -> `ws`, `https` -> `wss`).
pub fn realtime_url_for(endpoint: &Url) -> Result<Url, GraphqlError> {
    let scheme = match endpoint.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => {
            return Err(GraphqlError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: format!("cannot derive realtime url from scheme '{other}'"),
            })
        }
    };
    let mut url = endpoint.clone();
    url.set_scheme(scheme)
        .map_err(|()| GraphqlError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("cannot switch scheme to '{scheme}'"),
        })?;
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct WsTalkSubscriber {
    url: Url,
    credential: Credential,
}

impl WsTalkSubscriber {
    pub fn new(realtime_url: &str, credential: Credential) -> Result<Self, GraphqlError> {
        Ok(Self {
            url: parse_endpoint(realtime_url, &["ws", "wss"])?,
            credential,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl TalkSubscriber for WsTalkSubscriber {
    async fn subscribe_created(&self) -> Result<Box<dyn TalkSubscription>> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(GraphqlError::from)?;
        request.headers_mut().insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(GRAPHQL_TRANSPORT_WS),
        );
        let (mut ws, _) = connect_async(request)
            .await
            .with_context(|| format!("failed to connect realtime endpoint: {}", self.url))?;

        send_frame(
            &mut ws,
            &WsClientMessage::ConnectionInit {
                payload: self.credential.connection_payload(),
            },
        )
        .await?;

        loop {
            match read_frame(&mut ws).await.map_err(GraphqlError::from)? {
                Frame::Message(WsServerMessage::ConnectionAck { .. }) => break,
                Frame::Message(WsServerMessage::Ping { .. }) => {
                    send_frame(&mut ws, &WsClientMessage::Pong).await?;
                }
                Frame::Message(
                    WsServerMessage::KeepAlive
                    | WsServerMessage::Pong { .. }
                    | WsServerMessage::Unknown,
                ) => {}
                Frame::Message(other) => {
                    return Err(GraphqlError::Protocol(format!(
                        "expected connection_ack, got {other:?}"
                    ))
                    .into())
                }
                Frame::Malformed(err) => return Err(err.into()),
                Frame::Closed => {
                    return Err(GraphqlError::Protocol(
                        "connection closed before connection_ack".to_string(),
                    )
                    .into())
                }
            }
        }

        send_frame(
            &mut ws,
            &WsClientMessage::Subscribe {
                id: SUBSCRIPTION_ID.to_string(),
                payload: GraphqlRequest::on_create_talk(),
            },
        )
        .await?;
        info!(url = %self.url, "subscribed to onCreateTalk");

        Ok(Box::new(WsTalkSubscription {
            ws,
            finished: false,
            closed: false,
        }))
    }
}

pub struct WsTalkSubscription {
    ws: Socket,
    // The server has ended the operation or the socket failed. A frame that
    // fails to decode does neither.
    finished: bool,
    closed: bool,
}

impl WsTalkSubscription {
    fn finish_with(&mut self, err: GraphqlError) -> Option<Result<Talk>> {
        self.finished = true;
        Some(Err(err.into()))
    }
}

#[async_trait]
impl TalkSubscription for WsTalkSubscription {
    async fn next_talk(&mut self) -> Option<Result<Talk>> {
        if self.finished || self.closed {
            return None;
        }
        loop {
            let frame = match read_frame(&mut self.ws).await {
                Ok(Frame::Message(frame)) => frame,
                Ok(Frame::Malformed(err)) => return Some(Err(err.into())),
                Ok(Frame::Closed) => {
                    self.finished = true;
                    return None;
                }
                Err(err) => return self.finish_with(err.into()),
            };

            match frame {
                WsServerMessage::Next { id, payload } if id == SUBSCRIPTION_ID => {
                    if !payload.errors.is_empty() {
                        return Some(Err(GraphqlError::Graphql(payload.errors).into()));
                    }
                    let Some(data) = payload.data else {
                        return Some(Err(GraphqlError::MissingData {
                            operation: "onCreateTalk",
                        }
                        .into()));
                    };
                    return Some(
                        serde_json::from_value::<OnCreateTalkData>(data)
                            .map(|data| data.on_create_talk)
                            .map_err(|err| {
                                GraphqlError::Protocol(format!("invalid onCreateTalk payload: {err}"))
                                    .into()
                            }),
                    );
                }
                WsServerMessage::Error { id, payload } if id == SUBSCRIPTION_ID => {
                    return self.finish_with(GraphqlError::Graphql(payload));
                }
                WsServerMessage::Complete { id } if id == SUBSCRIPTION_ID => {
                    self.finished = true;
                    return None;
                }
                WsServerMessage::Ping { .. } => {
                    if let Err(err) = send_frame(&mut self.ws, &WsClientMessage::Pong).await {
                        return self.finish_with(err);
                    }
                }
                other => debug!(?other, "ignoring realtime frame"),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let complete = if self.finished {
            Ok(())
        } else {
            send_frame(
                &mut self.ws,
                &WsClientMessage::Complete {
                    id: SUBSCRIPTION_ID.to_string(),
                },
            )
            .await
        };
        self.finished = true;

        match self.ws.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {}
            Err(err) => return Err(GraphqlError::from(err).into()),
        }
        complete.map_err(Into::into)
    }
}

async fn send_frame(ws: &mut Socket, frame: &WsClientMessage) -> Result<(), GraphqlError> {
    let text = serde_json::to_string(frame)
        .map_err(|err| GraphqlError::Protocol(format!("failed to encode frame: {err}")))?;
    ws.send(Message::Text(text)).await?;
    Ok(())
}

enum Frame {
    Message(WsServerMessage),
    /// A text frame that is not valid `graphql-transport-ws`; the socket stays usable.
    Malformed(GraphqlError),
    Closed,
}

/// Reads the next protocol frame. Only socket failures are errors.
async fn read_frame(ws: &mut Socket) -> Result<Frame, WsError> {
    while let Some(msg) = ws.next().await {
        match msg? {
            Message::Text(text) => {
                return Ok(match serde_json::from_str(&text) {
                    Ok(frame) => Frame::Message(frame),
                    Err(err) => Frame::Malformed(GraphqlError::Protocol(format!(
                        "invalid frame {text}: {err}"
                    ))),
                });
            }
            Message::Close(_) => return Ok(Frame::Closed),
            _ => {}
        }
    }
    Ok(Frame::Closed)
}

#[cfg(test)]
#[path = "tests/realtime_tests.rs"]
mod tests;
