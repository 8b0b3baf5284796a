//! Error types for Stepwright.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid image reference: {0}")]
    InvalidReference(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
