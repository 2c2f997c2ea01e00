//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid host address: {0}")]
    InvalidHost(String),

    #[error("Worker count must be between 1 and 256")]
    InvalidWorkerCount,

    #[error("Table capacity must be greater than zero: {0}")]
    InvalidCapacity(&'static str),

    #[error("Rate limit window and ceiling must be greater than zero")]
    InvalidRateLimit,

    #[error("Unknown pipeline stage: {0}")]
    UnknownStage(String),

    #[error("Stage {stage} cannot run in the {phase} pipeline")]
    StageNotApplicable { stage: String, phase: &'static str },
}
