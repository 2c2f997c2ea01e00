use async_trait::async_trait;
use http::StatusCode;
use std::sync::Arc;

use crate::ports::{RateLimitKey, RateLimitResult, RateLimiter};

use super::super::{HandshakeNext, HandshakeOutcome, HandshakeRequest, PipelineError, PipelineStage};

/// Per-address limit on handshakes.
pub struct ConnectionRateLimitStage {
    limiter: Arc<dyn RateLimiter>,
}

impl ConnectionRateLimitStage {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

/// Client address, preferring proxy headers over the socket peer.
fn client_ip(request: &HandshakeRequest) -> Option<String> {
    if let Some(forwarded) = request
        .headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            return Some(first.trim().to_string());
        }
    }
    if let Some(real_ip) = request.headers.get("x-real-ip").and_then(|h| h.to_str().ok()) {
        return Some(real_ip.to_string());
    }
    request.remote_addr.map(|addr| addr.ip().to_string())
}

#[async_trait]
impl PipelineStage for ConnectionRateLimitStage {
    fn name(&self) -> &'static str {
        "connection_rate_limit"
    }

    async fn process_handshake(
        &self,
        request: HandshakeRequest,
        next: HandshakeNext<'_>,
    ) -> Result<HandshakeOutcome, PipelineError> {
        if let Some(ip) = client_ip(&request) {
            match self.limiter.check(&RateLimitKey::ip(&ip)).await {
                Ok(RateLimitResult::Denied(denied)) => {
                    tracing::info!(ip = %ip, retry_after_secs = denied.retry_after_secs, "Handshake rate limited");
                    return Ok(HandshakeOutcome::rejected(
                        StatusCode::TOO_MANY_REQUESTS,
                        "Too many connection attempts",
                    ));
                }
                Ok(RateLimitResult::Allowed(_)) => {}
                Err(e) => tracing::warn!(ip = %ip, error = %e, "Rate limiter unavailable"),
            }
        }
        next.run(request).await
    }
}
