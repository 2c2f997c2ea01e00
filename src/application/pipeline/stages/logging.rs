use async_trait::async_trait;
use std::time::Instant;
use uuid::Uuid;

use super::super::{
    HandshakeNext, HandshakeOutcome, HandshakeRequest, MessageContext, MessageNext,
    MessageOutcome, PipelineError, PipelineStage,
};

/// Logs each handshake and frame with a trace id and elapsed time.
pub struct LoggingStage;

#[async_trait]
impl PipelineStage for LoggingStage {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn process_handshake(
        &self,
        request: HandshakeRequest,
        next: HandshakeNext<'_>,
    ) -> Result<HandshakeOutcome, PipelineError> {
        let trace_id = Uuid::new_v4();
        let started = Instant::now();
        let remote = request.remote_addr.map(|a| a.to_string()).unwrap_or_default();
        tracing::info!(%trace_id, remote = %remote, "Handshake started");

        let outcome = next.run(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(HandshakeOutcome::Accepted(_)) => {
                tracing::info!(%trace_id, elapsed_ms, "Handshake accepted");
            }
            Ok(HandshakeOutcome::Rejected { status, reason }) => {
                tracing::info!(%trace_id, elapsed_ms, status = status.as_u16(), reason = %reason, "Handshake rejected");
            }
            Err(e) => tracing::warn!(%trace_id, elapsed_ms, error = %e, "Handshake failed"),
        }
        outcome
    }

    async fn process_message(
        &self,
        message: MessageContext,
        next: MessageNext<'_>,
    ) -> Result<MessageOutcome, PipelineError> {
        let trace_id = Uuid::new_v4();
        let started = Instant::now();
        let connection_id = message.connection;
        tracing::debug!(%trace_id, %connection_id, bytes = message.text.len(), "Frame received");

        let outcome = next.run(message).await;
        tracing::debug!(
            %trace_id,
            %connection_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            outcome = ?outcome,
            "Frame processed"
        );
        outcome
    }
}
