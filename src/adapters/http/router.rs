//! Axum router for the whole server.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::websocket_router;
use crate::context::ServerContext;

use super::broadcasting_auth::authorize_channel;
use super::channels_api::{broadcast, get_channel, get_channel_users, list_channels};
use super::middleware::{api_key_middleware, identity_middleware};

/// Create the complete application router.
///
/// # Routes
///
/// ## WebSocket
/// - `GET /`, `GET /ws` - Upgrade to a channel connection
///
/// ## Channel grants (forwarded user required)
/// - `POST /broadcasting/auth` - Sign a private or presence grant
///
/// ## Server API (`x-api-key` required)
/// - `POST /api/broadcast` - Publish to one or more channels
/// - `GET /api/channels` - List channels
/// - `GET /api/channels/:name` - One channel
/// - `GET /api/channels/:name/users` - Presence members
pub fn app_router(context: Arc<ServerContext>) -> Router {
    let grants = Router::new()
        .route("/broadcasting/auth", post(authorize_channel))
        .route_layer(middleware::from_fn(identity_middleware));

    let api = Router::new()
        .route("/broadcast", post(broadcast))
        .route("/channels", get(list_channels))
        .route("/channels/:name", get(get_channel))
        .route("/channels/:name/users", get(get_channel_users))
        .route_layer(middleware::from_fn_with_state(
            context.clone(),
            api_key_middleware,
        ));

    Router::new()
        .merge(websocket_router())
        .merge(grants)
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}
