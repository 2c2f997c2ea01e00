//! End-to-end tests over a real socket.
//!
//! The router is served on an ephemeral port and driven with a
//! tungstenite client, covering the handshake gate, the welcome frame and
//! a round trip between two sockets.

use futures::{SinkExt, StreamExt};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use channel_relay::adapters::http::app_router;
use channel_relay::config::{
    AppConfig, PipelineConfig, RateLimitSettings, ServerConfig, WebSocketConfig,
};
use channel_relay::context::ServerContext;

// =============================================================================
// Test Infrastructure
// =============================================================================

const SECRET: &str = "test-secret";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (SocketAddr, Arc<ServerContext>) {
    let config = AppConfig {
        server: ServerConfig::default(),
        websocket: WebSocketConfig {
            secret_key: SecretString::new(SECRET.to_string()),
            ..Default::default()
        },
        rate_limit: RateLimitSettings {
            messages_per_window: 100,
            window_secs: 10,
            connections_per_minute: 100,
        },
        pipeline: PipelineConfig::default(),
    };
    let context = Arc::new(ServerContext::from_config(&config).unwrap());
    let app = app_router(context.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    (addr, context)
}

async fn connect(addr: SocketAddr, protocol: &str) -> Result<Socket, WsError> {
    let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
    request
        .headers_mut()
        .insert("sec-websocket-protocol", protocol.parse().unwrap());
    connect_async(request).await.map(|(socket, _)| socket)
}

async fn next_event(socket: &mut Socket) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send(socket: &mut Socket, frame: Value) {
    socket.send(Message::Text(frame.to_string())).await.unwrap();
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn accepted_socket_receives_welcome() {
    let (addr, _) = spawn_server().await;
    let mut socket = connect(addr, SECRET).await.unwrap();

    let welcome = next_event(&mut socket).await;
    assert_eq!(welcome["event"], "connection_established");
    assert!(welcome["data"]["socket_id"].is_u64());
    assert!(welcome["data"]["activity_timeout"].is_u64());
}

#[tokio::test]
async fn wrong_secret_is_refused_before_upgrade() {
    let (addr, context) = spawn_server().await;

    match connect(addr, "not-the-secret").await {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 401),
        other => panic!("expected an HTTP refusal, got {:?}", other.map(|_| ())),
    }
    assert_eq!(context.lifecycle.connection_count().await.unwrap(), 0);
}

#[tokio::test]
async fn publish_reaches_the_other_socket() {
    let (addr, _) = spawn_server().await;
    let mut a = connect(addr, SECRET).await.unwrap();
    let mut b = connect(addr, SECRET).await.unwrap();
    next_event(&mut a).await;
    next_event(&mut b).await;

    for socket in [&mut a, &mut b] {
        send(socket, json!({"event": "subscribe", "channel": "chat"})).await;
        assert_eq!(next_event(socket).await["event"], "subscription_succeeded");
    }

    send(
        &mut a,
        json!({"event": "message", "channel": "chat", "name": "said", "data": {"text": "hi"}}),
    )
    .await;

    assert_eq!(
        next_event(&mut b).await,
        json!({"event": "said", "channel": "chat", "data": {"text": "hi"}})
    );
}

#[tokio::test]
async fn malformed_frame_gets_an_error_and_the_socket_stays_open() {
    let (addr, _) = spawn_server().await;
    let mut socket = connect(addr, SECRET).await.unwrap();
    next_event(&mut socket).await;

    socket
        .send(Message::Text("not json".to_string()))
        .await
        .unwrap();
    let error = next_event(&mut socket).await;
    assert_eq!(error["event"], "error");
    assert_eq!(error["data"]["code"], 400);

    send(&mut socket, json!({"event": "subscribe", "channel": "chat"})).await;
    assert_eq!(next_event(&mut socket).await["event"], "subscription_succeeded");
}

#[tokio::test]
async fn closing_the_socket_unregisters_it() {
    let (addr, context) = spawn_server().await;
    let mut socket = connect(addr, SECRET).await.unwrap();
    next_event(&mut socket).await;
    send(&mut socket, json!({"event": "subscribe", "channel": "chat"})).await;
    next_event(&mut socket).await;

    socket.close(None).await.unwrap();

    for _ in 0..50 {
        if context.lifecycle.connection_count().await.unwrap() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(context.lifecycle.connection_count().await.unwrap(), 0);
    assert!(!context.client.channel_exists("chat").await.unwrap());
}
