//! Integration tests for channel flows through the full server context.
//!
//! These tests drive connections through the lifecycle controller exactly
//! as the socket loop does, and read what each connection would receive
//! from its outbound queue:
//! 1. Presence join/leave announcements between two connections
//! 2. Frame rate limiting in the message pipeline
//! 3. Teardown on disconnect

use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use channel_relay::adapters::clock::ManualClock;
use channel_relay::application::pipeline::MessageOutcome;
use channel_relay::application::Connection;
use channel_relay::config::{
    AppConfig, PipelineConfig, RateLimitSettings, ServerConfig, WebSocketConfig,
};
use channel_relay::context::ServerContext;
use channel_relay::domain::channel::ChannelError;
use channel_relay::ports::ConnectionSink;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn config(messages_per_window: u32) -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        websocket: WebSocketConfig {
            secret_key: SecretString::new("test-secret".to_string()),
            ..Default::default()
        },
        rate_limit: RateLimitSettings {
            messages_per_window,
            window_secs: 10,
            connections_per_minute: 100,
        },
        pipeline: PipelineConfig::default(),
    }
}

fn context(messages_per_window: u32) -> (Arc<ServerContext>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let context = ServerContext::with_clock(&config(messages_per_window), clock.clone()).unwrap();
    (Arc::new(context), clock)
}

struct Client {
    connection: Connection,
    rx: UnboundedReceiver<String>,
}

impl Client {
    async fn open(context: &ServerContext) -> Self {
        let (connection, mut rx) = context.lifecycle.open().await.unwrap();
        let welcome: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(welcome["event"], "connection_established");
        assert_eq!(welcome["data"]["socket_id"], connection.id().as_u64());
        Self { connection, rx }
    }

    fn socket_id(&self) -> String {
        self.connection.id().to_string()
    }

    async fn send(&self, context: &ServerContext, frame: Value) -> MessageOutcome {
        context
            .lifecycle
            .handle_text(&self.connection, frame.to_string())
            .await
            .unwrap()
    }

    /// Everything queued for this client so far.
    fn drain(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(text) = self.rx.try_recv() {
            frames.push(serde_json::from_str(&text).unwrap());
        }
        frames
    }
}

async fn join_presence(context: &ServerContext, client: &Client, channel: &str, user: Value) {
    let grant = context.codec.sign_presence(&client.socket_id(), channel, &user);
    client
        .send(
            context,
            json!({
                "event": "subscribe",
                "channel": channel,
                "data": {"auth": grant.auth, "channel_data": grant.channel_data}
            }),
        )
        .await;
}

// =============================================================================
// Presence
// =============================================================================

#[tokio::test]
async fn presence_members_see_each_other_join_and_leave() {
    let (context, _) = context(100);
    let mut a = Client::open(&context).await;
    let mut b = Client::open(&context).await;

    join_presence(&context, &a, "presence-room1", json!({"user_id": "7"})).await;
    let a_frames = a.drain();
    assert_eq!(
        a_frames,
        vec![json!({"event": "subscription_succeeded", "data": {"channel": "presence-room1"}})]
    );

    join_presence(&context, &b, "presence-room1", json!({"user_id": "8"})).await;
    let b_frames = b.drain();
    assert_eq!(b_frames.len(), 2);
    assert_eq!(b_frames[0]["event"], "member_added");
    assert_eq!(b_frames[0]["channel"], "presence-room1");
    assert_eq!(b_frames[0]["data"]["user_id"], "7");
    assert_eq!(b_frames[1]["event"], "subscription_succeeded");

    let a_frames = a.drain();
    assert_eq!(a_frames.len(), 1);
    assert_eq!(a_frames[0]["event"], "member_added");
    assert_eq!(a_frames[0]["data"]["user_id"], "8");

    context.lifecycle.close(&mut a.connection).await;

    let b_frames = b.drain();
    assert_eq!(b_frames.len(), 1);
    assert_eq!(b_frames[0]["event"], "member_removed");
    assert_eq!(b_frames[0]["data"]["user_id"], "7");

    let members = context.presence.members_of("presence-room1").await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].0, b.connection.id());
}

#[tokio::test]
async fn presence_grant_for_another_socket_is_refused() {
    let (context, _) = context(100);
    let mut a = Client::open(&context).await;
    let b = Client::open(&context).await;

    let grant = context
        .codec
        .sign_presence(&b.socket_id(), "presence-room1", &json!({"user_id": "7"}));
    a.send(
        &context,
        json!({"event": "subscribe", "channel": "presence-room1", "data": {"auth": grant.auth}}),
    )
    .await;

    let frames = a.drain();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["event"], "subscription_error");
    assert!(context
        .presence
        .members_of("presence-room1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn presence_client_event_carries_sender_identity() {
    let (context, _) = context(100);
    let mut a = Client::open(&context).await;
    let mut b = Client::open(&context).await;
    join_presence(&context, &a, "presence-room1", json!({"user_id": "7", "user_info": {"name": "Ann"}})).await;
    join_presence(&context, &b, "presence-room1", json!({"user_id": "8"})).await;
    a.drain();
    b.drain();

    a.send(
        &context,
        json!({"event": "typing", "channel": "presence-room1", "data": {"on": true}}),
    )
    .await;

    assert!(a.drain().is_empty());
    assert_eq!(
        b.drain(),
        vec![json!({
            "event": "client-typing",
            "channel": "presence-room1",
            "data": {"on": true, "user_id": "7", "user_info": {"name": "Ann"}}
        })]
    );
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn frame_over_the_ceiling_is_answered_once_and_never_dispatched() {
    let (context, clock) = context(3);
    let mut a = Client::open(&context).await;
    let mut b = Client::open(&context).await;
    b.send(&context, json!({"event": "subscribe", "channel": "chat"})).await;
    b.drain();

    let publish = |n: u32| json!({"event": "message", "channel": "chat", "data": {"n": n}});

    assert_eq!(
        a.send(&context, json!({"event": "subscribe", "channel": "chat"})).await,
        MessageOutcome::Handled
    );
    assert_eq!(a.send(&context, publish(1)).await, MessageOutcome::Handled);
    assert_eq!(a.send(&context, publish(2)).await, MessageOutcome::Handled);
    assert_eq!(a.send(&context, publish(3)).await, MessageOutcome::Dropped);

    let a_frames = a.drain();
    let errors: Vec<_> = a_frames.iter().filter(|f| f["event"] == "error").collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["data"]["code"], 429);
    assert_eq!(
        errors[0]["data"]["message"],
        "Rate limit exceeded. Please slow down."
    );

    let delivered: Vec<_> = b.drain().into_iter().map(|f| f["data"]["n"].clone()).collect();
    assert_eq!(delivered, vec![json!(1), json!(2)]);

    clock.advance_secs(10);
    assert_eq!(a.send(&context, publish(4)).await, MessageOutcome::Handled);
    assert_eq!(b.drain()[0]["data"]["n"], 4);
}

#[tokio::test]
async fn rate_limits_are_per_connection() {
    let (context, _) = context(1);
    let mut a = Client::open(&context).await;
    let mut b = Client::open(&context).await;

    a.send(&context, json!({"event": "subscribe", "channel": "x"})).await;
    b.send(&context, json!({"event": "subscribe", "channel": "x"})).await;

    assert_eq!(a.drain()[0]["event"], "subscription_succeeded");
    assert_eq!(b.drain()[0]["event"], "subscription_succeeded");
}

// =============================================================================
// Disconnect
// =============================================================================

#[tokio::test]
async fn disconnect_purges_every_trace_of_the_connection() {
    let (context, _) = context(100);
    let mut a = Client::open(&context).await;
    let id = a.connection.id();
    a.send(&context, json!({"event": "subscribe", "channel": "news"})).await;
    let auth = context.codec.sign_private(&a.socket_id(), "private-orders");
    a.send(
        &context,
        json!({"event": "subscribe", "channel": "private-orders", "data": {"auth": auth}}),
    )
    .await;
    assert_eq!(context.registry.count().await.unwrap(), 1);

    context.lifecycle.close(&mut a.connection).await;
    context.lifecycle.close(&mut a.connection).await;

    assert!(!a.connection.is_open());
    assert!(!context.registry.exists(id).await.unwrap());
    assert!(context.subscriptions.channels_of(id).await.unwrap().is_empty());
    assert!(context.client.channels().await.unwrap().is_empty());
    assert_eq!(
        context.client.publish("news", "tick", &Default::default()).await,
        Err(ChannelError::NotFound("news".to_string()))
    );
    assert!(!context.outbound.is_live(id));
}

#[tokio::test]
async fn frames_after_close_are_dropped() {
    let (context, _) = context(100);
    let mut a = Client::open(&context).await;
    context.lifecycle.close(&mut a.connection).await;

    assert_eq!(
        a.send(&context, json!({"event": "subscribe", "channel": "news"})).await,
        MessageOutcome::Dropped
    );
    assert!(!context.client.channel_exists("news").await.unwrap());
}

#[tokio::test]
async fn registry_capacity_refuses_extra_connections() {
    let mut config = config(100);
    config.websocket.max_connections = 1;
    let context = ServerContext::from_config(&config).unwrap();

    let _first = context.lifecycle.open().await.unwrap();
    assert!(context.lifecycle.open().await.is_err());
    assert_eq!(context.outbound.len(), 1);
}

#[tokio::test]
async fn presence_capacity_is_counted_per_channel_joined() {
    let mut config = config(100);
    config.websocket.max_connections = 1;
    config.websocket.max_presence_members = 3;
    let context = ServerContext::from_config(&config).unwrap();
    let mut a = Client::open(&context).await;

    for room in ["presence-a", "presence-b", "presence-c"] {
        join_presence(&context, &a, room, json!({"user_id": "7"})).await;
        assert_eq!(context.presence.members_of(room).await.unwrap().len(), 1);
    }
    let frames = a.drain();
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|f| f["event"] == "subscription_succeeded"));

    join_presence(&context, &a, "presence-d", json!({"user_id": "7"})).await;
    assert_eq!(a.drain()[0]["event"], "subscription_error");
    assert!(!context.client.channel_exists("presence-d").await.unwrap());
}
