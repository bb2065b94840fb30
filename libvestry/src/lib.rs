//! Vestry - a content lifecycle engine for collaborative publishing
//!
//! This library manages posts from draft through review, approval, scheduling
//! and publication, with per-revision history and threaded spatial comments.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod media;
pub mod scheduling;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::VestryConfig;
pub use error::{Result, VestryError};
pub use lifecycle::{next_status, WorkflowOp};
pub use service::VestryService;
pub use store::PostStore;
pub use types::{Post, PostRevision, PostSchedule, PostStatus, SocialPlatform};
