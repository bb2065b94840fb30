//! Lifecycle state machine for posts
//!
//! Encodes the legal transitions between the six post statuses. Callers (UI
//! layers) are expected to disable illegal actions, but every operation is
//! still checked here; the table is enforced, not advisory.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VestryError};
use crate::types::PostStatus;

/// A workflow operation that may move a post between statuses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowOp {
    SubmitForReview,
    Approve,
    Reject,
    Schedule,
    Publish,
}

impl std::fmt::Display for WorkflowOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubmitForReview => write!(f, "submit_for_review"),
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
            Self::Schedule => write!(f, "schedule"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

/// Resolve the status an operation moves a post to
///
/// | From              | Operation         | To        |
/// |-------------------|-------------------|-----------|
/// | draft, rejected   | submit_for_review | in_review |
/// | in_review         | approve           | approved  |
/// | in_review         | reject            | rejected  |
/// | approved          | schedule          | scheduled |
/// | approved, scheduled | publish         | published |
///
/// # Errors
///
/// Any (status, operation) pair outside the table is `InvalidTransition`,
/// identifying the current status and the attempted operation. The caller's
/// status is left untouched; this is a pure function.
pub fn next_status(current: PostStatus, operation: WorkflowOp) -> Result<PostStatus> {
    use PostStatus::*;
    use WorkflowOp::*;

    match (current, operation) {
        (Draft, SubmitForReview) | (Rejected, SubmitForReview) => Ok(InReview),
        (InReview, Approve) => Ok(Approved),
        (InReview, Reject) => Ok(Rejected),
        (Approved, Schedule) => Ok(Scheduled),
        (Approved, Publish) | (Scheduled, Publish) => Ok(Published),
        (status, operation) => Err(VestryError::InvalidTransition { status, operation }),
    }
}
