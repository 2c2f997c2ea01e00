//! Built-in pipeline stages and their construction from configuration.

mod authentication;
mod connection_rate_limit;
mod logging;
mod rate_limit;

pub use authentication::AuthenticationStage;
pub use connection_rate_limit::ConnectionRateLimitStage;
pub use logging::LoggingStage;
pub use rate_limit::{RateLimitStage, RATE_LIMIT_MESSAGE};

use secrecy::SecretString;
use std::sync::Arc;

use crate::application::broadcaster::Broadcaster;
use crate::config::{PipelineConfig, StageKind, ValidationError};
use crate::ports::RateLimiter;

use super::{PipelineManager, PipelineStage, Pipelines};

/// What the built-in stages need from the server.
#[derive(Clone)]
pub struct StageDependencies {
    pub secret: SecretString,
    pub limiter: Arc<dyn RateLimiter>,
    pub broadcaster: Broadcaster,
}

pub fn build_stage(kind: StageKind, deps: &StageDependencies) -> Arc<dyn PipelineStage> {
    match kind {
        StageKind::Logging => Arc::new(LoggingStage),
        StageKind::Authentication => Arc::new(AuthenticationStage::new(deps.secret.clone())),
        StageKind::RateLimit => Arc::new(RateLimitStage::new(
            deps.limiter.clone(),
            deps.broadcaster.clone(),
        )),
        StageKind::ConnectionRateLimit => {
            Arc::new(ConnectionRateLimitStage::new(deps.limiter.clone()))
        }
    }
}

/// Register the configured stages: globals first, then each phase's own.
pub fn build_pipelines(
    config: &PipelineConfig,
    deps: &StageDependencies,
) -> Result<Pipelines, ValidationError> {
    config.validate()?;
    let mut manager = PipelineManager::new();
    for kind in config.global_stages()? {
        manager = manager.add_global(build_stage(kind, deps));
    }
    for kind in config.handshake_stages()? {
        manager = manager.add_handshake(build_stage(kind, deps));
    }
    for kind in config.message_stages()? {
        manager = manager.add_message(build_stage(kind, deps));
    }
    Ok(manager.build())
}
