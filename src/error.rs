// src/error.rs
use thiserror::Error;

/// Failures at the output boundary. None of these stop the frame loop.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("input injection failed: {0}")]
    Injection(String),

    #[error("system control failed: {0}")]
    System(String),

    #[error("unknown key '{0}'")]
    InvalidKey(String),

    #[error("no action registered for command '{0}'")]
    UnmappedCommand(String),

    #[error("failed to launch program: {0}")]
    Spawn(#[from] std::io::Error),
}
