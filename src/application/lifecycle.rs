//! Connection lifecycle: `Connecting -> Open -> Closed`.
//!
//! The socket task owns a [`Connection`] and drives it through the shared
//! [`LifecycleController`]. Closing runs channel teardown before the
//! registry entry is removed, and is a no-op the second time.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::domain::foundation::{ConnectionId, ConnectionIdSequence};
use crate::domain::protocol::ServerEvent;
use crate::ports::{ConnectionRegistry, ConnectionSink, RateLimitKey, RateLimiter, StoreError};

use super::broadcaster::Broadcaster;
use super::channel_manager::ChannelManager;
use super::pipeline::{MessageContext, MessageOutcome, PipelineError, Pipelines};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// One socket's view of its own lifecycle.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    state: ConnectionState,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }
}

pub struct LifecycleController {
    ids: ConnectionIdSequence,
    registry: Arc<dyn ConnectionRegistry>,
    outbound: Arc<dyn ConnectionSink>,
    broadcaster: Broadcaster,
    manager: ChannelManager,
    limiter: Arc<dyn RateLimiter>,
    pipelines: Pipelines,
    activity_timeout_secs: u64,
}

impl LifecycleController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        outbound: Arc<dyn ConnectionSink>,
        broadcaster: Broadcaster,
        manager: ChannelManager,
        limiter: Arc<dyn RateLimiter>,
        pipelines: Pipelines,
        activity_timeout_secs: u64,
    ) -> Self {
        Self {
            ids: ConnectionIdSequence::new(),
            registry,
            outbound,
            broadcaster,
            manager,
            limiter,
            pipelines,
            activity_timeout_secs,
        }
    }

    /// Register an upgraded socket and send its welcome.
    ///
    /// Returns the connection and the queue its writer must drain.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` when the registry is full. Nothing is left behind.
    pub async fn open(&self) -> Result<(Connection, mpsc::UnboundedReceiver<String>), StoreError> {
        let mut connection = Connection {
            id: self.ids.next_id(),
            state: ConnectionState::Connecting,
        };
        let id = connection.id;
        let outbound = self.outbound.attach(id);

        if let Err(e) = self.registry.register(id, &id.label()).await {
            self.outbound.detach(id);
            tracing::warn!(connection_id = %id, error = %e, "Connection refused");
            return Err(e);
        }
        connection.state = ConnectionState::Open;

        self.broadcaster.notify(
            id,
            &ServerEvent::ConnectionEstablished {
                socket_id: id,
                activity_timeout: self.activity_timeout_secs,
            },
        );
        tracing::info!(connection_id = %id, label = %id.label(), "Connection opened");
        Ok((connection, outbound))
    }

    /// Run one text frame through the message pipeline.
    ///
    /// Frames on a connection that is not open are dropped.
    pub async fn handle_text(
        &self,
        connection: &Connection,
        text: String,
    ) -> Result<MessageOutcome, PipelineError> {
        if !connection.is_open() {
            return Ok(MessageOutcome::Dropped);
        }
        self.pipelines
            .run_message(MessageContext::new(connection.id, text), &self.manager)
            .await
    }

    /// Tear the connection down. Safe to call more than once.
    pub async fn close(&self, connection: &mut Connection) {
        if connection.state == ConnectionState::Closed {
            return;
        }
        let was_open = connection.is_open();
        connection.state = ConnectionState::Closed;
        let id = connection.id;

        if let Err(e) = self.manager.disconnect(id).await {
            tracing::warn!(connection_id = %id, error = %e, "Channel teardown failed");
        }
        if let Err(e) = self.limiter.reset(&RateLimitKey::connection(id)).await {
            tracing::warn!(connection_id = %id, error = %e, "Rate limit reset failed");
        }
        if was_open {
            if let Err(e) = self.registry.unregister(id).await {
                tracing::warn!(connection_id = %id, error = %e, "Unregister failed");
            }
        }
        self.outbound.detach(id);
        tracing::info!(connection_id = %id, "Connection closed");
    }

    pub fn pipelines(&self) -> &Pipelines {
        &self.pipelines
    }

    pub async fn connection_count(&self) -> Result<usize, StoreError> {
        self.registry.count().await
    }
}
