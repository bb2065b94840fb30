//! Error types for Vestry

use thiserror::Error;

use crate::lifecycle::WorkflowOp;
use crate::types::PostStatus;

pub type Result<T> = std::result::Result<T, VestryError>;

#[derive(Error, Debug)]
pub enum VestryError {
    #[error("Post not found: {0}")]
    PostNotFound(String),

    #[error("Revision not found: {0}")]
    RevisionNotFound(String),

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Invalid transition: cannot {operation} a post in status {status}")]
    InvalidTransition {
        status: PostStatus,
        operation: WorkflowOp,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Media upload failed: {0}")]
    MediaUpload(String),

    #[error("Stale write: expected version {expected}, post is at version {actual}")]
    StaleWrite { expected: u64, actual: u64 },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
