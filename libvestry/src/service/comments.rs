//! Comment service
//!
//! Owns the comments attached to revisions. Storage is a flat list per
//! revision with `parent_id` back-references; threaded and count views are
//! derived on read via the projections on [`PostRevision`].

use std::sync::Arc;

use tracing::{debug, info};

use super::events::{Event, EventBus};
use crate::error::{Result, VestryError};
use crate::store::PostStore;
use crate::types::{Attribution, Comment, CommentNode, Coordinates, PostRevision};

/// Input for a new comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub author: Attribution,
    pub content: String,
    /// Percentage position for pinned comments
    pub coordinates: Option<Coordinates>,
    /// Id of the comment being replied to; must live in the same revision
    pub parent_id: Option<String>,
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<PostStore>,
    events: EventBus,
}

impl CommentService {
    pub fn new(store: Arc<PostStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Append a comment to a revision
    ///
    /// Generates the id and timestamp; the comment starts unresolved.
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound`/`RevisionNotFound` for unknown ids, and
    /// `Validation` when `parent_id` does not reference a comment in the same
    /// revision.
    pub async fn add(
        &self,
        post_id: &str,
        revision_id: &str,
        new_comment: NewComment,
    ) -> Result<Comment> {
        let comment = self
            .store
            .update_post(post_id, None, |post| {
                let revision = post
                    .revision_mut(revision_id)
                    .ok_or_else(|| VestryError::RevisionNotFound(revision_id.to_string()))?;

                if let Some(parent_id) = &new_comment.parent_id {
                    if !revision.comments.iter().any(|c| &c.id == parent_id) {
                        return Err(VestryError::Validation(format!(
                            "Parent comment {} is not in revision {}",
                            parent_id, revision_id
                        )));
                    }
                }

                let comment = Comment::new(
                    &new_comment.author,
                    new_comment.content.clone(),
                    new_comment.coordinates,
                    new_comment.parent_id.clone(),
                );
                revision.comments.push(comment.clone());
                Ok(comment)
            })
            .await?;

        debug!(post_id = %post_id, revision_id = %revision_id, "comment added");
        self.events.emit(Event::CommentAdded {
            post_id: post_id.to_string(),
            revision_id: revision_id.to_string(),
            comment_id: comment.id.clone(),
        });

        Ok(comment)
    }

    /// Mark a comment resolved
    ///
    /// Idempotent: resolving an already-resolved comment is a no-op returning
    /// `true` without writing anything. Replies are unaffected either way.
    ///
    /// # Errors
    ///
    /// Returns `CommentNotFound` when no revision of the post holds the id.
    pub async fn resolve(&self, post_id: &str, comment_id: &str) -> Result<bool> {
        let post = self.store.fetch_post(post_id).await?;
        let already_resolved = post
            .revisions
            .iter()
            .flat_map(|r| r.comments.iter())
            .find(|c| c.id == comment_id)
            .map(|c| c.resolved);

        match already_resolved {
            Some(true) => return Ok(true),
            Some(false) => {}
            None => return Err(VestryError::CommentNotFound(comment_id.to_string())),
        }

        self.store
            .update_post(post_id, None, |post| {
                let comment = post
                    .revisions
                    .iter_mut()
                    .flat_map(|r| r.comments.iter_mut())
                    .find(|c| c.id == comment_id)
                    .ok_or_else(|| VestryError::CommentNotFound(comment_id.to_string()))?;
                comment.resolved = true;
                Ok(())
            })
            .await?;

        info!(post_id = %post_id, comment_id = %comment_id, "comment resolved");
        self.events.emit(Event::CommentResolved {
            post_id: post_id.to_string(),
            comment_id: comment_id.to_string(),
        });

        Ok(true)
    }

    /// Comments with no parent in the given revision
    pub async fn top_level(&self, post_id: &str, revision_id: &str) -> Result<Vec<Comment>> {
        let revision = self.revision(post_id, revision_id).await?;
        Ok(revision
            .top_level_comments()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Direct replies to a comment in the given revision
    pub async fn replies(
        &self,
        post_id: &str,
        revision_id: &str,
        comment_id: &str,
    ) -> Result<Vec<Comment>> {
        let revision = self.revision(post_id, revision_id).await?;
        Ok(revision
            .replies_for(comment_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Derived threaded view of a revision's comments
    pub async fn thread(&self, post_id: &str, revision_id: &str) -> Result<Vec<CommentNode>> {
        let revision = self.revision(post_id, revision_id).await?;
        Ok(revision.thread())
    }

    /// Total comments in the revision, replies included
    pub async fn count(&self, post_id: &str, revision_id: &str) -> Result<usize> {
        let revision = self.revision(post_id, revision_id).await?;
        Ok(revision.comment_count())
    }

    /// Comments not yet resolved in the revision, replies included
    pub async fn unresolved_count(&self, post_id: &str, revision_id: &str) -> Result<usize> {
        let revision = self.revision(post_id, revision_id).await?;
        Ok(revision.unresolved_comment_count())
    }

    async fn revision(&self, post_id: &str, revision_id: &str) -> Result<PostRevision> {
        let post = self.store.fetch_post(post_id).await?;
        post.revision(revision_id)
            .cloned()
            .ok_or_else(|| VestryError::RevisionNotFound(revision_id.to_string()))
    }
}
