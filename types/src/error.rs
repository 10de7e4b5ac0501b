//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("failed to read parameters file: {0}")]
    Io(String),

    #[error("failed to parse parameters: {0}")]
    Parse(String),

    #[error("invalid parameter `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
