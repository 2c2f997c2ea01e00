//! WebSocket upgrade handler and per-socket loop.
//!
//! Handles the HTTP → WebSocket upgrade and drives one connection:
//! 1. Run the handshake pipeline; a refusal answers with its status and no upgrade
//! 2. Upgrade, echoing the accepted sub-protocol
//! 3. Register the connection and send `connection_established`
//! 4. Route text frames through the message pipeline until disconnect
//! 5. Tear down channels, rate-limit state and the registry entry

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};

use crate::application::lifecycle::LifecycleController;
use crate::application::pipeline::{HandshakeOutcome, HandshakeRequest};
use crate::context::ServerContext;

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /` and `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(context): State<Arc<ServerContext>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let lifecycle = context.lifecycle.clone();
    let request = HandshakeRequest::new(headers, connect_info.map(|ConnectInfo(addr)| addr));

    match lifecycle.pipelines().run_handshake(request).await {
        Ok(HandshakeOutcome::Accepted(request)) => {
            let ws = match request.selected_protocol {
                Some(protocol) => ws.protocols([protocol]),
                None => ws,
            };
            ws.on_upgrade(move |socket| handle_socket(socket, lifecycle))
        }
        Ok(HandshakeOutcome::Rejected { status, reason }) => (status, reason).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Handshake pipeline failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Handle an established WebSocket connection.
///
/// The outbound queue is drained by a writer task so broadcasts from other
/// connections never wait on this socket. Protocol pings are answered by
/// the transport and never reach the pipeline.
async fn handle_socket(mut socket: WebSocket, lifecycle: Arc<LifecycleController>) {
    let (mut connection, mut outbound) = match lifecycle.open().await {
        Ok(opened) => opened,
        Err(e) => {
            tracing::warn!(error = %e, "Closing socket that could not be registered");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::AGAIN,
                    reason: "Server is at capacity".into(),
                })))
                .await;
            return;
        }
    };
    let connection_id = connection.id();
    let (mut sender, mut receiver) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = sender.send(Message::Text(frame)).await {
                tracing::debug!(%connection_id, "Send error, closing connection: {}", e);
                break;
            }
        }
        let _ = sender.close().await;
    });

    loop {
        tokio::select! {
            _ = &mut writer => break,
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = lifecycle.handle_text(&connection, text).await {
                        tracing::error!(%connection_id, error = %e, "Frame handling failed");
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::warn!(%connection_id, "Received unsupported binary message");
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) => {
                    tracing::debug!(%connection_id, "Client sent close frame");
                    break;
                }
                Some(Err(e)) => {
                    tracing::debug!(%connection_id, "Receive error: {}", e);
                    break;
                }
                None => break,
            },
        }
    }

    // Detaches the outbound queue, which lets the writer flush and exit.
    lifecycle.close(&mut connection).await;
}

/// Routes that accept WebSocket upgrades.
pub fn websocket_router() -> Router<Arc<ServerContext>> {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
}
