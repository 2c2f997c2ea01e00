//! ServerContext - Every shared component, built once at startup.
//!
//! Handlers receive the context by `Arc`; nothing is reachable through
//! globals.

use secrecy::SecretString;
use std::sync::Arc;

use crate::adapters::clock::SystemClock;
use crate::adapters::rate_limiter::{FixedWindowRateLimiter, RateLimitConfig};
use crate::adapters::storage::{InMemoryTable, TableConnectionRegistry};
use crate::adapters::websocket::OutboundConnections;
use crate::application::broadcaster::Broadcaster;
use crate::application::channel_manager::ChannelManager;
use crate::application::channels::{
    ChannelHandlers, PresenceChannelHandler, PrivateChannelHandler, PublicChannelHandler,
};
use crate::application::client::ChannelClient;
use crate::application::lifecycle::LifecycleController;
use crate::application::pipeline::stages::{build_pipelines, StageDependencies};
use crate::application::presence::PresenceTable;
use crate::application::subscriptions::SubscriptionIndex;
use crate::config::{AppConfig, ConfigError};
use crate::domain::auth::TokenCodec;
use crate::ports::{Clock, ConnectionRegistry, RateLimiter};

pub struct ServerContext {
    pub secret: SecretString,
    pub codec: Arc<TokenCodec>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub subscriptions: SubscriptionIndex,
    pub presence: PresenceTable,
    pub broadcaster: Broadcaster,
    pub manager: ChannelManager,
    pub client: ChannelClient,
    pub limiter: Arc<dyn RateLimiter>,
    pub outbound: Arc<OutboundConnections>,
    pub lifecycle: Arc<LifecycleController>,
}

impl ServerContext {
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build the context with an explicit clock for the rate limiter.
    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let ws = &config.websocket;
        let secret = ws.secret_key.clone();

        let registry: Arc<dyn ConnectionRegistry> = Arc::new(TableConnectionRegistry::new(
            Arc::new(InMemoryTable::new("connections", ws.max_connections)),
        ));
        let subscriptions = SubscriptionIndex::new(
            Arc::new(InMemoryTable::new("subscriptions", ws.max_connections)),
            Arc::new(InMemoryTable::new("channels", ws.max_channels)),
        );
        let presence = PresenceTable::new(Arc::new(InMemoryTable::new(
            "presence",
            ws.max_presence_members,
        )));
        let limiter: Arc<dyn RateLimiter> = Arc::new(
            FixedWindowRateLimiter::new(
                Arc::new(InMemoryTable::new("rate_limits", ws.max_connections)),
                RateLimitConfig::from(&config.rate_limit),
                clock,
            )
            .with_ip_windows(Arc::new(InMemoryTable::new(
                "handshake_limits",
                ws.max_connections,
            ))),
        );

        let outbound = Arc::new(OutboundConnections::new());
        let codec = Arc::new(TokenCodec::new(secret.clone()));
        let broadcaster = Broadcaster::new(subscriptions.clone(), outbound.clone());
        let handlers = ChannelHandlers::new(
            Arc::new(PublicChannelHandler::new(broadcaster.clone())),
            Arc::new(PrivateChannelHandler::new(codec.clone(), broadcaster.clone())),
            Arc::new(PresenceChannelHandler::new(
                codec.clone(),
                presence.clone(),
                broadcaster.clone(),
            )),
        );
        let manager = ChannelManager::new(
            subscriptions.clone(),
            handlers,
            broadcaster.clone(),
            ws.max_channel_name_len,
        );
        let client = ChannelClient::new(subscriptions.clone(), broadcaster.clone());

        let pipelines = build_pipelines(
            &config.pipeline,
            &StageDependencies {
                secret: secret.clone(),
                limiter: limiter.clone(),
                broadcaster: broadcaster.clone(),
            },
        )?;
        tracing::info!(
            handshake = ?pipelines.handshake_stage_names(),
            message = ?pipelines.message_stage_names(),
            "Pipelines built"
        );

        let lifecycle = Arc::new(LifecycleController::new(
            registry.clone(),
            outbound.clone(),
            broadcaster.clone(),
            manager.clone(),
            limiter.clone(),
            pipelines,
            ws.activity_timeout_secs,
        ));

        Ok(Self {
            secret,
            codec,
            registry,
            subscriptions,
            presence,
            broadcaster,
            manager,
            client,
            limiter,
            outbound,
            lifecycle,
        })
    }
}
