use async_trait::async_trait;
use http::{header, StatusCode};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::auth::constant_time_compare;

use super::super::{HandshakeNext, HandshakeOutcome, HandshakeRequest, PipelineError, PipelineStage};

/// Admits a handshake only if one of the offered sub-protocols is the
/// shared secret. The matching value is echoed back on upgrade.
pub struct AuthenticationStage {
    secret: SecretString,
}

impl AuthenticationStage {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn matching_protocol(&self, request: &HandshakeRequest) -> Option<String> {
        let expected = self.secret.expose_secret().as_bytes();
        request
            .headers
            .get_all(header::SEC_WEBSOCKET_PROTOCOL)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .find(|offered| constant_time_compare(offered.as_bytes(), expected))
            .map(str::to_string)
    }
}

#[async_trait]
impl PipelineStage for AuthenticationStage {
    fn name(&self) -> &'static str {
        "authentication"
    }

    async fn process_handshake(
        &self,
        mut request: HandshakeRequest,
        next: HandshakeNext<'_>,
    ) -> Result<HandshakeOutcome, PipelineError> {
        match self.matching_protocol(&request) {
            Some(protocol) => {
                request.selected_protocol = Some(protocol);
                next.run(request).await
            }
            None => {
                tracing::warn!(remote = ?request.remote_addr, "Handshake secret mismatch");
                Ok(HandshakeOutcome::rejected(StatusCode::UNAUTHORIZED, "Unauthorized"))
            }
        }
    }
}
