use async_trait::async_trait;
use std::sync::Arc;

use crate::application::broadcaster::Broadcaster;
use crate::domain::foundation::ErrorCode;
use crate::domain::protocol::ServerEvent;
use crate::ports::{RateLimitKey, RateLimitResult, RateLimiter};

use super::super::{MessageContext, MessageNext, MessageOutcome, PipelineError, PipelineStage};

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please slow down.";

/// Per-connection fixed-window limit on inbound frames.
///
/// A frame over the ceiling is answered with a 429 `error` event and
/// dropped before dispatch. Limiter outages fail open.
pub struct RateLimitStage {
    limiter: Arc<dyn RateLimiter>,
    broadcaster: Broadcaster,
}

impl RateLimitStage {
    pub fn new(limiter: Arc<dyn RateLimiter>, broadcaster: Broadcaster) -> Self {
        Self {
            limiter,
            broadcaster,
        }
    }
}

#[async_trait]
impl PipelineStage for RateLimitStage {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn process_message(
        &self,
        message: MessageContext,
        next: MessageNext<'_>,
    ) -> Result<MessageOutcome, PipelineError> {
        let key = RateLimitKey::connection(message.connection);
        match self.limiter.check(&key).await {
            Ok(RateLimitResult::Denied(denied)) => {
                tracing::info!(
                    connection_id = %message.connection,
                    limit = denied.limit,
                    retry_after_secs = denied.retry_after_secs,
                    "Frame rate limited"
                );
                self.broadcaster.notify(
                    message.connection,
                    &ServerEvent::error(ErrorCode::RateLimited, RATE_LIMIT_MESSAGE),
                );
                return Ok(MessageOutcome::Dropped);
            }
            Ok(RateLimitResult::Allowed(status)) => {
                tracing::trace!(
                    connection_id = %message.connection,
                    count = status.count,
                    limit = status.limit,
                    "Frame within rate limit"
                );
            }
            Err(e) => {
                tracing::warn!(connection_id = %message.connection, error = %e, "Rate limiter unavailable");
            }
        }
        next.run(message).await
    }
}
