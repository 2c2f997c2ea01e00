//! PipelineManager - Stage registration and the built, immutable pipelines.

use std::sync::Arc;

use super::{
    HandshakeNext, HandshakeOutcome, HandshakeRequest, MessageContext, MessageHandler,
    MessageNext, MessageOutcome, PipelineError, PipelineStage, StageList,
};

/// Collects stages in registration order.
///
/// # Example
///
/// ```ignore
/// let pipelines = PipelineManager::new()
///     .add_global(Arc::new(LoggingStage))
///     .add_handshake(Arc::new(AuthenticationStage::new(secret)))
///     .add_message(Arc::new(RateLimitStage::new(limiter, broadcaster)))
///     .build();
/// ```
#[derive(Default)]
pub struct PipelineManager {
    handshake: Vec<Arc<dyn PipelineStage>>,
    message: Vec<Arc<dyn PipelineStage>>,
}

impl PipelineManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handshake(mut self, stage: Arc<dyn PipelineStage>) -> Self {
        self.handshake.push(stage);
        self
    }

    pub fn add_message(mut self, stage: Arc<dyn PipelineStage>) -> Self {
        self.message.push(stage);
        self
    }

    /// Register a stage in both phases.
    pub fn add_global(self, stage: Arc<dyn PipelineStage>) -> Self {
        self.add_handshake(stage.clone()).add_message(stage)
    }

    pub fn build(self) -> Pipelines {
        Pipelines {
            handshake: self.handshake.into(),
            message: self.message.into(),
        }
    }
}

/// The composed pipelines. Cheap to clone; never changes after build.
#[derive(Clone)]
pub struct Pipelines {
    handshake: StageList,
    message: StageList,
}

impl Pipelines {
    pub async fn run_handshake(&self, request: HandshakeRequest) -> Result<HandshakeOutcome, PipelineError> {
        HandshakeNext::new(&self.handshake).run(request).await
    }

    pub async fn run_message(
        &self,
        message: MessageContext,
        handler: &dyn MessageHandler,
    ) -> Result<MessageOutcome, PipelineError> {
        MessageNext::new(&self.message, handler).run(message).await
    }

    pub fn handshake_stage_names(&self) -> Vec<&'static str> {
        self.handshake.iter().map(|s| s.name()).collect()
    }

    pub fn message_stage_names(&self) -> Vec<&'static str> {
        self.message.iter().map(|s| s.name()).collect()
    }
}
