//! Pipeline stage registration order

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use super::error::ValidationError;

/// Ordered stage lists for each pipeline phase.
///
/// Each list is a comma-separated string of stage names, for example
/// `CHANNEL_RELAY__PIPELINE__HANDSHAKE=connection_rate_limit,authentication`.
/// Stages in `global` run first in both phases.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_global")]
    pub global: String,

    #[serde(default = "default_handshake")]
    pub handshake: String,

    #[serde(default = "default_message")]
    pub message: String,
}

/// A stage that can be named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Logging,
    Authentication,
    RateLimit,
    ConnectionRateLimit,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Logging => "logging",
            StageKind::Authentication => "authentication",
            StageKind::RateLimit => "rate_limit",
            StageKind::ConnectionRateLimit => "connection_rate_limit",
        }
    }

    fn runs_on_handshake(&self) -> bool {
        !matches!(self, StageKind::RateLimit)
    }

    fn runs_on_message(&self) -> bool {
        !matches!(self, StageKind::ConnectionRateLimit)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logging" => Ok(StageKind::Logging),
            "authentication" => Ok(StageKind::Authentication),
            "rate_limit" => Ok(StageKind::RateLimit),
            "connection_rate_limit" => Ok(StageKind::ConnectionRateLimit),
            other => Err(ValidationError::UnknownStage(other.to_string())),
        }
    }
}

impl PipelineConfig {
    pub fn global_stages(&self) -> Result<Vec<StageKind>, ValidationError> {
        parse_list(&self.global)
    }

    pub fn handshake_stages(&self) -> Result<Vec<StageKind>, ValidationError> {
        parse_list(&self.handshake)
    }

    pub fn message_stages(&self) -> Result<Vec<StageKind>, ValidationError> {
        parse_list(&self.message)
    }

    /// Validate pipeline configuration
    ///
    /// Every name must be known, and every stage must be able to run in
    /// each phase it is registered for.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for stage in self.global_stages()? {
            check_phase(stage, "handshake", stage.runs_on_handshake())?;
            check_phase(stage, "message", stage.runs_on_message())?;
        }
        for stage in self.handshake_stages()? {
            check_phase(stage, "handshake", stage.runs_on_handshake())?;
        }
        for stage in self.message_stages()? {
            check_phase(stage, "message", stage.runs_on_message())?;
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            global: default_global(),
            handshake: default_handshake(),
            message: default_message(),
        }
    }
}

fn parse_list(raw: &str) -> Result<Vec<StageKind>, ValidationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(StageKind::from_str)
        .collect()
}

fn check_phase(stage: StageKind, phase: &'static str, allowed: bool) -> Result<(), ValidationError> {
    if allowed {
        Ok(())
    } else {
        Err(ValidationError::StageNotApplicable {
            stage: stage.to_string(),
            phase,
        })
    }
}

fn default_global() -> String {
    "logging".to_string()
}

fn default_handshake() -> String {
    "authentication".to_string()
}

fn default_message() -> String {
    "rate_limit".to_string()
}
