//! Interceptor pipelines for handshakes and inbound frames.
//!
//! A pipeline is an ordered list of [`PipelineStage`]s. Each stage receives
//! the request and a `next` continuation; it may call through, do work and
//! call through, or stop the chain by returning without calling `next`.
//!
//! ```text
//! handshake: stage 1 ──► stage 2 ──► ... ──► Accepted (upgrade proceeds)
//!                 └── Rejected { status } (no upgrade)
//!
//! message:   stage 1 ──► stage 2 ──► ... ──► MessageHandler (dispatch)
//!                 └── Dropped (frame discarded)
//! ```
//!
//! A stage that fails is logged with its name at its own boundary and the
//! error is returned to the caller.

mod manager;
pub mod stages;

pub use manager::{PipelineManager, Pipelines};

use async_trait::async_trait;
use futures::future::BoxFuture;
use http::{HeaderMap, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::ConnectionId;

/// An upgrade request before the socket is opened.
#[derive(Debug, Clone)]
pub struct HandshakeRequest {
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
    /// Sub-protocol to echo in the upgrade response.
    pub selected_protocol: Option<String>,
}

impl HandshakeRequest {
    pub fn new(headers: HeaderMap, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            headers,
            remote_addr,
            selected_protocol: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum HandshakeOutcome {
    Accepted(HandshakeRequest),
    Rejected { status: StatusCode, reason: String },
}

impl HandshakeOutcome {
    pub fn rejected(status: StatusCode, reason: impl Into<String>) -> Self {
        HandshakeOutcome::Rejected {
            status,
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, HandshakeOutcome::Accepted(_))
    }
}

/// One inbound text frame from an open connection.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageContext {
    pub connection: ConnectionId,
    pub text: String,
}

impl MessageContext {
    pub fn new(connection: ConnectionId, text: impl Into<String>) -> Self {
        Self {
            connection,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The frame reached the handler.
    Handled,
    /// A stage discarded the frame.
    Dropped,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Raised by a stage or handler, not yet attributed.
    #[error("{0}")]
    Fault(String),

    #[error("pipeline stage '{stage}' failed: {message}")]
    Stage { stage: &'static str, message: String },
}

/// One interceptor. Both phases pass through unless overridden.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process_handshake(
        &self,
        request: HandshakeRequest,
        next: HandshakeNext<'_>,
    ) -> Result<HandshakeOutcome, PipelineError> {
        next.run(request).await
    }

    async fn process_message(
        &self,
        message: MessageContext,
        next: MessageNext<'_>,
    ) -> Result<MessageOutcome, PipelineError> {
        next.run(message).await
    }
}

/// Terminal of the message pipeline.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: MessageContext) -> Result<(), PipelineError>;
}

pub type StageList = Arc<[Arc<dyn PipelineStage>]>;

/// Continuation into the rest of the handshake pipeline.
pub struct HandshakeNext<'a> {
    stages: &'a [Arc<dyn PipelineStage>],
}

impl<'a> HandshakeNext<'a> {
    pub(crate) fn new(stages: &'a [Arc<dyn PipelineStage>]) -> Self {
        Self { stages }
    }

    pub fn run(self, request: HandshakeRequest) -> BoxFuture<'a, Result<HandshakeOutcome, PipelineError>> {
        Box::pin(async move {
            match self.stages.split_first() {
                Some((stage, rest)) => {
                    let result = stage
                        .process_handshake(request, HandshakeNext::new(rest))
                        .await;
                    attribute(stage.name(), result)
                }
                None => Ok(HandshakeOutcome::Accepted(request)),
            }
        })
    }
}

/// Continuation into the rest of the message pipeline.
pub struct MessageNext<'a> {
    stages: &'a [Arc<dyn PipelineStage>],
    handler: &'a dyn MessageHandler,
}

impl<'a> MessageNext<'a> {
    pub(crate) fn new(stages: &'a [Arc<dyn PipelineStage>], handler: &'a dyn MessageHandler) -> Self {
        Self { stages, handler }
    }

    pub fn run(self, message: MessageContext) -> BoxFuture<'a, Result<MessageOutcome, PipelineError>> {
        Box::pin(async move {
            match self.stages.split_first() {
                Some((stage, rest)) => {
                    let result = stage
                        .process_message(message, MessageNext::new(rest, self.handler))
                        .await;
                    attribute(stage.name(), result)
                }
                None => {
                    self.handler.handle(message).await?;
                    Ok(MessageOutcome::Handled)
                }
            }
        })
    }
}

/// Log a fault raised by `stage` itself and tag it with the stage name.
/// Faults already tagged by an inner stage pass through untouched.
fn attribute<T>(stage: &'static str, result: Result<T, PipelineError>) -> Result<T, PipelineError> {
    match result {
        Err(PipelineError::Fault(message)) => {
            tracing::error!(stage, error = %message, "Pipeline stage failed");
            Err(PipelineError::Stage { stage, message })
        }
        other => other,
    }
}
