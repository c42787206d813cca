//! Core error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("failed to parse numeric value: {0}")]
    ParseValue(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
