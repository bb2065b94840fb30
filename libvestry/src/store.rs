//! In-memory post store
//!
//! Simulates the durable persistence collaborator: an async map keyed by post
//! id with the same surface a backing API would offer (create, fetch, list,
//! update, delete). Mutations are applied to a clone and committed only on
//! success, so a failed operation leaves the stored post exactly as it was.
//!
//! Every committed mutation bumps the post's optimistic `version`; callers
//! may pass the version they read to detect a concurrent edit from another
//! session (`StaleWrite`).

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{Result, VestryError};
use crate::types::Post;

#[derive(Default)]
pub struct PostStore {
    posts: RwLock<HashMap<String, Post>>,
}

impl PostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new post
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a post with the same id already exists.
    pub async fn create_post(&self, post: Post) -> Result<()> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(VestryError::Validation(format!(
                "Post already exists: {}",
                post.id
            )));
        }
        posts.insert(post.id.clone(), post);
        Ok(())
    }

    /// Get a post by id
    pub async fn get_post(&self, post_id: &str) -> Option<Post> {
        self.posts.read().await.get(post_id).cloned()
    }

    /// Get a post by id, failing when it is absent
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound` for unknown ids.
    pub async fn fetch_post(&self, post_id: &str) -> Result<Post> {
        self.get_post(post_id)
            .await
            .ok_or_else(|| VestryError::PostNotFound(post_id.to_string()))
    }

    /// All posts, newest first
    pub async fn list_posts(&self) -> Vec<Post> {
        let mut posts: Vec<Post> = self.posts.read().await.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    pub async fn count(&self) -> usize {
        self.posts.read().await.len()
    }

    /// Remove a post, returning it
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound` for unknown ids.
    pub async fn delete_post(&self, post_id: &str) -> Result<Post> {
        self.posts
            .write()
            .await
            .remove(post_id)
            .ok_or_else(|| VestryError::PostNotFound(post_id.to_string()))
    }

    /// Apply a mutation to a post atomically
    ///
    /// The mutation runs against a clone; on success the clone replaces the
    /// stored post with `version` incremented and `updated_at` refreshed. On
    /// failure nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound` for unknown ids, `StaleWrite` when
    /// `expected_version` does not match the stored version, or whatever the
    /// mutation itself returns.
    pub async fn update_post<T, F>(
        &self,
        post_id: &str,
        expected_version: Option<u64>,
        mutate: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut Post) -> Result<T>,
    {
        let mut posts = self.posts.write().await;
        let stored = posts
            .get(post_id)
            .ok_or_else(|| VestryError::PostNotFound(post_id.to_string()))?;

        if let Some(expected) = expected_version {
            if expected != stored.version {
                return Err(VestryError::StaleWrite {
                    expected,
                    actual: stored.version,
                });
            }
        }

        let mut working = stored.clone();
        let value = mutate(&mut working)?;

        working.version += 1;
        working.updated_at = Utc::now();
        posts.insert(post_id.to_string(), working);

        Ok(value)
    }
}
