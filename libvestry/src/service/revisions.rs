//! Revision service
//!
//! Owns the append-only revision history of each post. Editing is
//! copy-on-write: a prior revision is never mutated, and only `create` moves
//! the post's `current_revision_id`.

use std::sync::Arc;

use tracing::info;

use super::events::{Event, EventBus};
use crate::error::{Result, VestryError};
use crate::store::PostStore;
use crate::types::{Attribution, MediaItem, PostRevision};

#[derive(Clone)]
pub struct RevisionService {
    store: Arc<PostStore>,
    events: EventBus,
}

impl RevisionService {
    pub fn new(store: Arc<PostStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Append a new revision snapshot
    ///
    /// The new revision's number is the previous maximum plus one, it becomes
    /// the post's current revision, and the post's working copy is refreshed
    /// from the snapshot. Prior revisions are untouched.
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound` for unknown ids, or `StaleWrite` when
    /// `expected_version` no longer matches.
    pub async fn create(
        &self,
        post_id: &str,
        content: String,
        media_items: Vec<MediaItem>,
        created_by: &Attribution,
        expected_version: Option<u64>,
    ) -> Result<PostRevision> {
        let revision = self
            .store
            .update_post(post_id, expected_version, |post| {
                let number = post.revisions.len() as u32 + 1;
                let revision =
                    PostRevision::new(number, content, media_items, created_by.clone());

                post.current_revision_id = revision.id.clone();
                post.content = revision.content.clone();
                post.media_items = revision.media_items.clone();
                post.revisions.push(revision.clone());

                Ok(revision)
            })
            .await?;

        info!(
            post_id = %post_id,
            revision_number = revision.revision_number,
            "created revision"
        );
        self.events.emit(Event::RevisionCreated {
            post_id: post_id.to_string(),
            revision_id: revision.id.clone(),
            revision_number: revision.revision_number,
        });

        Ok(revision)
    }

    /// Revision history, newest first
    ///
    /// A read-only projection; the stored order is untouched.
    pub async fn history(&self, post_id: &str) -> Result<Vec<PostRevision>> {
        let post = self.store.fetch_post(post_id).await?;
        Ok(post.revisions.iter().rev().cloned().collect())
    }

    /// Read a single revision by id
    pub async fn get(&self, post_id: &str, revision_id: &str) -> Result<PostRevision> {
        let post = self.store.fetch_post(post_id).await?;
        post.revision(revision_id)
            .cloned()
            .ok_or_else(|| VestryError::RevisionNotFound(revision_id.to_string()))
    }
}
