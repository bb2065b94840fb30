//! Workflow service
//!
//! Drives posts through the approval lifecycle. Every operation resolves its
//! transition through [`crate::lifecycle::next_status`] first, so an illegal
//! call fails before any state is touched.

use std::sync::Arc;

use tracing::info;

use super::events::{Event, EventBus};
use crate::error::{Result, VestryError};
use crate::lifecycle::{next_status, WorkflowOp};
use crate::store::PostStore;
use crate::types::{Attribution, Comment, Post, PostStatus, SocialPlatform};

#[derive(Clone)]
pub struct WorkflowService {
    store: Arc<PostStore>,
    events: EventBus,
}

impl WorkflowService {
    pub fn new(store: Arc<PostStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Move a draft or rejected post into review
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside draft/rejected, `Validation` when the
    /// trimmed content is empty.
    pub async fn submit_for_review(
        &self,
        post_id: &str,
        expected_version: Option<u64>,
    ) -> Result<Post> {
        let (from, post) = self
            .store
            .update_post(post_id, expected_version, |post| {
                let to = next_status(post.status, WorkflowOp::SubmitForReview)?;
                if post.content.trim().is_empty() {
                    return Err(VestryError::Validation(
                        "Cannot submit a post with empty content".to_string(),
                    ));
                }
                let from = post.status;
                post.status = to;
                Ok((from, post.clone()))
            })
            .await?;

        self.log_and_emit(&post, from);
        Ok(post)
    }

    /// Approve a post under review
    pub async fn approve(&self, post_id: &str, expected_version: Option<u64>) -> Result<Post> {
        let (from, post) = self
            .store
            .update_post(post_id, expected_version, |post| {
                let to = next_status(post.status, WorkflowOp::Approve)?;
                let from = post.status;
                post.status = to;
                Ok((from, post.clone()))
            })
            .await?;

        self.log_and_emit(&post, from);
        Ok(post)
    }

    /// Reject a post under review
    ///
    /// Appends a synthetic `Rejected: {reason}` comment to the current
    /// revision, attributed to the reviewer. The comment starts unresolved
    /// and counts in unresolved totals like any other.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside in_review, `Validation` for an empty
    /// reason.
    pub async fn reject(
        &self,
        post_id: &str,
        reason: &str,
        reviewed_by: &Attribution,
        expected_version: Option<u64>,
    ) -> Result<Post> {
        if reason.trim().is_empty() {
            return Err(VestryError::Validation(
                "Rejection requires a reason".to_string(),
            ));
        }

        let (from, post, comment_id) = self
            .store
            .update_post(post_id, expected_version, |post| {
                let to = next_status(post.status, WorkflowOp::Reject)?;
                let from = post.status;

                let comment = Comment::new(
                    reviewed_by,
                    format!("Rejected: {}", reason),
                    None,
                    None,
                );
                let comment_id = comment.id.clone();
                let current_id = post.current_revision_id.clone();
                let revision = post
                    .revision_mut(&current_id)
                    .ok_or_else(|| VestryError::RevisionNotFound(current_id.clone()))?;
                revision.comments.push(comment);

                post.status = to;
                Ok((from, post.clone(), comment_id))
            })
            .await?;

        self.log_and_emit(&post, from);
        self.events.emit(Event::CommentAdded {
            post_id: post.id.clone(),
            revision_id: post.current_revision_id.clone(),
            comment_id,
        });
        Ok(post)
    }

    /// Publish an approved or scheduled post
    ///
    /// `platform_ids` defaults to the attached schedule's platforms, or to
    /// the timeline when the post was never scheduled. Returns the post and
    /// the platforms it went out to.
    pub async fn publish(
        &self,
        post_id: &str,
        platform_ids: Option<Vec<SocialPlatform>>,
        expected_version: Option<u64>,
    ) -> Result<(Post, Vec<SocialPlatform>)> {
        let (from, post, platforms) = self
            .store
            .update_post(post_id, expected_version, |post| {
                let to = next_status(post.status, WorkflowOp::Publish)?;
                let from = post.status;

                let platforms = platform_ids
                    .clone()
                    .or_else(|| post.schedule.as_ref().map(|s| s.platforms.clone()))
                    .unwrap_or_else(|| vec![SocialPlatform::Timeline]);

                post.status = to;
                Ok((from, post.clone(), platforms))
            })
            .await?;

        self.log_and_emit(&post, from);
        self.events.emit(Event::PostPublished {
            post_id: post.id.clone(),
            platforms: platforms.clone(),
        });
        Ok((post, platforms))
    }

    fn log_and_emit(&self, post: &Post, from: PostStatus) {
        info!(post_id = %post.id, from = %from, to = %post.status, "status changed");
        self.events.emit(Event::StatusChanged {
            post_id: post.id.clone(),
            from,
            to: post.status,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentType;

    fn author() -> Attribution {
        Attribution {
            user_id: "user-1".to_string(),
            user_name: "Ada".to_string(),
            user_avatar: "ada.png".to_string(),
        }
    }

    fn reviewer() -> Attribution {
        Attribution {
            user_id: "user-2".to_string(),
            user_name: "Grace".to_string(),
            user_avatar: "grace.png".to_string(),
        }
    }

    async fn setup(content: &str) -> (WorkflowService, Arc<PostStore>, String) {
        let store = Arc::new(PostStore::new());
        let post = Post::new(
            "Launch".to_string(),
            content.to_string(),
            ContentType::Text,
            author(),
        );
        let id = post.id.clone();
        store.create_post(post).await.unwrap();

        let service = WorkflowService::new(Arc::clone(&store), EventBus::new(10));
        (service, store, id)
    }

    #[tokio::test]
    async fn test_submit_for_review() {
        let (service, _store, post_id) = setup("Announcement body").await;

        let post = service.submit_for_review(&post_id, None).await.unwrap();
        assert_eq!(post.status, PostStatus::InReview);
    }

    #[tokio::test]
    async fn test_submit_requires_content() {
        let (service, store, post_id) = setup("   ").await;

        let result = service.submit_for_review(&post_id, None).await;
        assert!(matches!(result, Err(VestryError::Validation(_))));

        // Status untouched by the failed submit
        let post = store.fetch_post(&post_id).await.unwrap();
        assert_eq!(post.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn test_approve_requires_review() {
        let (service, store, post_id) = setup("Body").await;

        let result = service.approve(&post_id, None).await;
        match result {
            Err(VestryError::InvalidTransition { status, operation }) => {
                assert_eq!(status, PostStatus::Draft);
                assert_eq!(operation, WorkflowOp::Approve);
            }
            other => panic!("Expected InvalidTransition, got {:?}", other),
        }

        let post = store.fetch_post(&post_id).await.unwrap();
        assert_eq!(post.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn test_reject_appends_synthetic_comment() {
        let (service, _store, post_id) = setup("Announcement body").await;

        service.submit_for_review(&post_id, None).await.unwrap();
        let post = service
            .reject(&post_id, "needs edits", &reviewer(), None)
            .await
            .unwrap();

        assert_eq!(post.status, PostStatus::Rejected);
        let revision = post.current_revision().unwrap();
        assert_eq!(revision.comments.len(), 1);
        assert_eq!(revision.comments[0].content, "Rejected: needs edits");
        assert_eq!(revision.comments[0].user_name, "Grace");
        assert!(!revision.comments[0].resolved);
        assert_eq!(revision.unresolved_comment_count(), 1);
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let (service, _store, post_id) = setup("Body").await;

        service.submit_for_review(&post_id, None).await.unwrap();
        let result = service.reject(&post_id, "  ", &reviewer(), None).await;
        assert!(matches!(result, Err(VestryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejected_post_can_resubmit() {
        let (service, _store, post_id) = setup("Body").await;

        service.submit_for_review(&post_id, None).await.unwrap();
        service
            .reject(&post_id, "needs edits", &reviewer(), None)
            .await
            .unwrap();

        let post = service.submit_for_review(&post_id, None).await.unwrap();
        assert_eq!(post.status, PostStatus::InReview);
    }

    #[tokio::test]
    async fn test_publish_defaults_to_timeline_without_schedule() {
        let (service, _store, post_id) = setup("Body").await;

        service.submit_for_review(&post_id, None).await.unwrap();
        service.approve(&post_id, None).await.unwrap();

        let (post, platforms) = service.publish(&post_id, None, None).await.unwrap();
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(platforms, vec![SocialPlatform::Timeline]);
    }

    #[tokio::test]
    async fn test_publish_with_explicit_platforms() {
        let (service, _store, post_id) = setup("Body").await;

        service.submit_for_review(&post_id, None).await.unwrap();
        service.approve(&post_id, None).await.unwrap();

        let (_, platforms) = service
            .publish(
                &post_id,
                Some(vec![SocialPlatform::Facebook, SocialPlatform::Twitter]),
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            platforms,
            vec![SocialPlatform::Facebook, SocialPlatform::Twitter]
        );
    }

    #[tokio::test]
    async fn test_publish_is_terminal() {
        let (service, _store, post_id) = setup("Body").await;

        service.submit_for_review(&post_id, None).await.unwrap();
        service.approve(&post_id, None).await.unwrap();
        service.publish(&post_id, None, None).await.unwrap();

        let result = service.submit_for_review(&post_id, None).await;
        assert!(matches!(
            result,
            Err(VestryError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_status_change_emits_event() {
        let (service, _store, post_id) = setup("Body").await;
        let mut receiver = service.events.subscribe();

        service.submit_for_review(&post_id, None).await.unwrap();

        match receiver.recv().await.unwrap() {
            Event::StatusChanged { from, to, .. } => {
                assert_eq!(from, PostStatus::Draft);
                assert_eq!(to, PostStatus::InReview);
            }
            other => panic!("Wrong event: {:?}", other),
        }
    }
}
