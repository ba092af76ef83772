use super::*;
use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use shared::domain::ClientId;
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct WsState {
    acknowledge: bool,
    script: Arc<Vec<Value>>,
    received: Arc<Mutex<Vec<Value>>>,
}

async fn handle_upgrade(ws: WebSocketUpgrade, State(state): State<WsState>) -> impl IntoResponse {
    ws.protocols([GRAPHQL_TRANSPORT_WS])
        .on_upgrade(move |socket| run_session(socket, state))
}

async fn recv_json(socket: &mut WebSocket) -> Option<Value> {
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            AxumMessage::Text(text) => return serde_json::from_str(&text).ok(),
            AxumMessage::Close(_) => return None,
            _ => {}
        }
    }
    None
}

async fn run_session(mut socket: WebSocket, state: WsState) {
    let Some(init) = recv_json(&mut socket).await else {
        return;
    };
    state.received.lock().await.push(init);
    if !state.acknowledge {
        let _ = socket.close().await;
        return;
    }
    let _ = socket
        .send(AxumMessage::Text(json!({"type": "ka"}).to_string()))
        .await;
    let _ = socket
        .send(AxumMessage::Text(json!({"type": "connection_ack"}).to_string()))
        .await;

    let Some(subscribe) = recv_json(&mut socket).await else {
        return;
    };
    state.received.lock().await.push(subscribe);

    for frame in state.script.iter() {
        let _ = socket.send(AxumMessage::Text(frame.to_string())).await;
    }
    while let Some(frame) = recv_json(&mut socket).await {
        state.received.lock().await.push(frame);
    }
}

async fn spawn_realtime_server(
    acknowledge: bool,
    script: Vec<Value>,
) -> anyhow::Result<(String, Arc<Mutex<Vec<Value>>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = WsState {
        acknowledge,
        script: Arc::new(script),
        received: Arc::clone(&received),
    };
    let app = Router::new()
        .route("/graphql/realtime", get(handle_upgrade))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("ws://{addr}/graphql/realtime"), received))
}

async fn wait_for_frames(received: &Mutex<Vec<Value>>, count: usize) -> Vec<Value> {
    for _ in 0..100 {
        {
            let frames = received.lock().await;
            if frames.len() >= count {
                return frames.clone();
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    received.lock().await.clone()
}

fn next_frame(client_id: &str, name: &str) -> Value {
    json!({
        "type": "next",
        "id": "1",
        "payload": {"data": {"onCreateTalk": {
            "id": format!("id-{name}"),
            "clientId": client_id,
            "name": name,
            "description": "d",
            "speakerName": "s",
            "speakerBio": "b"
        }}}
    })
}

#[test]
fn realtime_url_swaps_http_scheme() {
    let https = Url::parse("https://api.example.com/graphql").unwrap();
    assert_eq!(
        realtime_url_for(&https).unwrap().as_str(),
        "wss://api.example.com/graphql"
    );
    let http = Url::parse("http://127.0.0.1:4000/graphql").unwrap();
    assert_eq!(
        realtime_url_for(&http).unwrap().as_str(),
        "ws://127.0.0.1:4000/graphql"
    );
    let ftp = Url::parse("ftp://example.com").unwrap();
    assert!(realtime_url_for(&ftp).is_err());
    assert!(WsTalkSubscriber::new("http://example.com", Credential::Anonymous).is_err());
}

#[tokio::test]
async fn delivers_every_pushed_talk_and_answers_pings() -> anyhow::Result<()> {
    let (url, received) = spawn_realtime_server(
        true,
        vec![
            next_frame("other-session", "T2"),
            json!({"type": "ping"}),
            next_frame("self", "Mine"),
            json!({"type": "complete", "id": "1"}),
        ],
    )
    .await?;
    let subscriber = WsTalkSubscriber::new(&url, Credential::ApiKey("secret".into()))?;

    let mut subscription = subscriber.subscribe_created().await?;

    let first = subscription.next_talk().await.expect("first talk")?;
    assert_eq!(first.name, "T2");
    assert_eq!(first.client_id, Some(ClientId::from("other-session")));
    let second = subscription.next_talk().await.expect("second talk")?;
    assert_eq!(second.client_id, Some(ClientId::from("self")));
    assert!(subscription.next_talk().await.is_none());
    assert!(subscription.next_talk().await.is_none());

    let frames = wait_for_frames(&received, 3).await;
    assert_eq!(frames[0]["type"], "connection_init");
    assert_eq!(frames[0]["payload"]["x-api-key"], "secret");
    assert_eq!(frames[1]["type"], "subscribe");
    assert_eq!(frames[1]["id"], "1");
    assert_eq!(frames[1]["payload"]["operationName"], "OnCreateTalk");
    assert_eq!(frames[2]["type"], "pong");

    subscription.close().await?;
    Ok(())
}

#[tokio::test]
async fn close_completes_operation_once() -> anyhow::Result<()> {
    let (url, received) =
        spawn_realtime_server(true, vec![next_frame("other-session", "T2")]).await?;
    let subscriber = WsTalkSubscriber::new(&url, Credential::Anonymous)?;
    let mut subscription = subscriber.subscribe_created().await?;
    subscription.next_talk().await.expect("talk")?;

    subscription.close().await?;
    subscription.close().await?;
    assert!(subscription.next_talk().await.is_none());

    let frames = wait_for_frames(&received, 3).await;
    assert!(frames[0].get("payload").is_none());
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[2], json!({"type": "complete", "id": "1"}));
    Ok(())
}

#[tokio::test]
async fn error_frame_ends_the_stream() -> anyhow::Result<()> {
    let (url, _received) = spawn_realtime_server(
        true,
        vec![json!({"type": "error", "id": "1", "payload": [{"message": "Unauthorized"}]})],
    )
    .await?;
    let subscriber = WsTalkSubscriber::new(&url, Credential::Anonymous)?;
    let mut subscription = subscriber.subscribe_created().await?;

    let err = subscription
        .next_talk()
        .await
        .expect("error item")
        .expect_err("error frame fails");
    assert!(err.to_string().contains("Unauthorized"));
    assert!(subscription.next_talk().await.is_none());

    subscription.close().await?;
    Ok(())
}

#[tokio::test]
async fn handshake_without_ack_fails() -> anyhow::Result<()> {
    let (url, _received) = spawn_realtime_server(false, Vec::new()).await?;
    let subscriber = WsTalkSubscriber::new(&url, Credential::Anonymous)?;

    let result = subscriber.subscribe_created().await;

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn unrecognized_frames_do_not_end_the_stream() -> anyhow::Result<()> {
    let (url, _received) = spawn_realtime_server(
        true,
        vec![
            json!({"type": "connection_keep_alive"}),
            next_frame("other-session", "T2"),
        ],
    )
    .await?;
    let subscriber = WsTalkSubscriber::new(&url, Credential::Anonymous)?;
    let mut subscription = subscriber.subscribe_created().await?;

    let talk = subscription.next_talk().await.expect("talk after unknown frame")?;
    assert_eq!(talk.name, "T2");

    subscription.close().await?;
    Ok(())
}

#[tokio::test]
async fn malformed_frame_is_reported_and_stream_continues() -> anyhow::Result<()> {
    let (url, _received) = spawn_realtime_server(
        true,
        vec![
            json!({"type": "next", "id": "1", "payload": "oops"}),
            next_frame("other-session", "T3"),
        ],
    )
    .await?;
    let subscriber = WsTalkSubscriber::new(&url, Credential::Anonymous)?;
    let mut subscription = subscriber.subscribe_created().await?;

    let err = subscription
        .next_talk()
        .await
        .expect("malformed item")
        .expect_err("malformed frame fails");
    assert!(matches!(
        err.downcast_ref::<GraphqlError>(),
        Some(GraphqlError::Protocol(_))
    ));
    let talk = subscription.next_talk().await.expect("talk after malformed frame")?;
    assert_eq!(talk.name, "T3");

    subscription.close().await?;
    Ok(())
}
