//! Service layer for Vestry
//!
//! This module provides a clean, testable API for the content lifecycle that
//! can be consumed by multiple interfaces without code duplication.
//!
//! # Architecture
//!
//! The service layer follows a facade pattern with `VestryService` as the
//! main entry point, coordinating specialized sub-services:
//!
//! - `RevisionService`: Append-only revision history
//! - `CommentService`: Threaded and spatial comments on revisions
//! - `WorkflowService`: The approval lifecycle state machine
//! - `ScheduleService`: Multi-platform scheduling with overrides
//! - `EventBus`: Change event distribution
//!
//! The facade also owns the per-session editor state (selection, mode,
//! pending comment, loading and error slots) behind a `RwLock`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use libvestry::media::MockMediaStore;
//! use libvestry::service::{NewPost, VestryService};
//! use libvestry::types::{Attribution, ContentType};
//!
//! # async fn example() -> libvestry::Result<()> {
//! let service = VestryService::new(Arc::new(MockMediaStore::new()));
//!
//! let post = service
//!     .create_post(NewPost {
//!         title: "Launch".to_string(),
//!         content: "We are live".to_string(),
//!         content_type: ContentType::Text,
//!         created_by: Attribution {
//!             user_id: "user-1".to_string(),
//!             user_name: "Ada".to_string(),
//!             user_avatar: "ada.png".to_string(),
//!         },
//!     })
//!     .await?;
//!
//! service.submit_for_review(&post.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod comments;
pub mod events;
pub mod revisions;
pub mod schedule;
pub mod session;
pub mod workflow;

pub use comments::NewComment;
pub use events::{Event, EventBus, EventReceiver};
pub use schedule::ScheduleRequest;
pub use session::{EditorMode, PendingComment, PointerEvent, SurfaceBounds};

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::RwLock;
use tracing::info;

use self::comments::CommentService;
use self::revisions::RevisionService;
use self::schedule::ScheduleService;
use self::session::SessionState;
use self::workflow::WorkflowService;
use crate::config::VestryConfig;
use crate::error::Result;
use crate::media::{MediaStore, MediaUpload};
use crate::store::PostStore;
use crate::types::{
    Attribution, Comment, CommentNode, ContentType, MediaItem, Post, PostRevision, PostSchedule,
    SocialPlatform,
};

/// Input for creating a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    pub created_by: Attribution,
}

/// Partial update applied to a post's working copy
///
/// `None` fields are left as they are. Editing the working copy does not
/// touch revision history; call `create_revision` to snapshot it.
#[derive(Debug, Clone, Default)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_type: Option<ContentType>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub expected_version: Option<u64>,
}

/// Main service facade coordinating all sub-services
///
/// All sub-services share the same `Arc<PostStore>` and `EventBus`, so a
/// mutation through any of them is observable through all the others.
pub struct VestryService {
    store: Arc<PostStore>,
    media: Arc<dyn MediaStore>,
    config: Arc<VestryConfig>,
    revisions: RevisionService,
    comments: CommentService,
    workflow: WorkflowService,
    schedule: ScheduleService,
    event_bus: EventBus,
    session: RwLock<SessionState>,
}

impl VestryService {
    /// Create a service with default configuration
    ///
    /// Falls back to built-in defaults when no config file exists.
    pub fn new(media: Arc<dyn MediaStore>) -> Self {
        let config = VestryConfig::load().unwrap_or_default();
        Self::from_config(config, media)
    }

    /// Create a service with custom configuration
    pub fn from_config(config: VestryConfig, media: Arc<dyn MediaStore>) -> Self {
        let store = Arc::new(PostStore::new());
        let config = Arc::new(config);
        let event_bus = EventBus::new(100);

        Self {
            revisions: RevisionService::new(Arc::clone(&store), event_bus.clone()),
            comments: CommentService::new(Arc::clone(&store), event_bus.clone()),
            workflow: WorkflowService::new(Arc::clone(&store), event_bus.clone()),
            schedule: ScheduleService::new(
                Arc::clone(&store),
                event_bus.clone(),
                Arc::clone(&config),
            ),
            store,
            media,
            config,
            event_bus,
            session: RwLock::new(SessionState::default()),
        }
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }

    // ---- posts ----

    /// Create a draft post with its initial revision and select it
    pub async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        self.begin().await;
        let result = async {
            let post = Post::new(
                new_post.title,
                new_post.content,
                new_post.content_type,
                new_post.created_by,
            );
            self.store.create_post(post.clone()).await?;

            info!(post_id = %post.id, "post created");
            self.event_bus.emit(Event::PostCreated {
                post_id: post.id.clone(),
            });

            self.session.write().await.set_current(Some(post.clone()));
            Ok(post)
        }
        .await;
        self.finish(result).await
    }

    /// Edit a post's working copy
    ///
    /// Revision history is untouched; `create_revision` snapshots the working
    /// copy when the edit is worth keeping.
    pub async fn update_post(&self, post_id: &str, update: UpdatePost) -> Result<Post> {
        self.begin().await;
        let result = async {
            let post = self
                .store
                .update_post(post_id, update.expected_version, |post| {
                    if let Some(title) = update.title.clone() {
                        post.title = title;
                    }
                    if let Some(content) = update.content.clone() {
                        post.content = content;
                    }
                    if let Some(content_type) = update.content_type {
                        post.content_type = content_type;
                    }
                    if let Some(tags) = update.tags.clone() {
                        post.tags = tags;
                    }
                    if let Some(categories) = update.categories.clone() {
                        post.categories = categories;
                    }
                    Ok(post.clone())
                })
                .await?;

            self.event_bus.emit(Event::PostUpdated {
                post_id: post.id.clone(),
            });
            self.refresh_session(&post, None).await;
            Ok(post)
        }
        .await;
        self.finish(result).await
    }

    /// Delete a post, clearing the selection if it was current
    pub async fn delete_post(&self, post_id: &str) -> Result<()> {
        self.begin().await;
        let result = async {
            self.store.delete_post(post_id).await?;

            info!(post_id = %post_id, "post deleted");
            self.event_bus.emit(Event::PostDeleted {
                post_id: post_id.to_string(),
            });

            let mut session = self.session.write().await;
            if session
                .current_post
                .as_ref()
                .is_some_and(|p| p.id == post_id)
            {
                session.set_current(None);
            }
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    /// All posts, newest first
    pub async fn posts(&self) -> Vec<Post> {
        self.store.list_posts().await
    }

    /// Read a single post
    pub async fn post(&self, post_id: &str) -> Result<Post> {
        self.store.fetch_post(post_id).await
    }

    // ---- session ----

    /// Select a post for the session; `None` clears the selection
    pub async fn set_current_post(&self, post_id: Option<&str>) -> Result<()> {
        let post = match post_id {
            Some(id) => Some(self.store.fetch_post(id).await?),
            None => None,
        };
        self.session.write().await.set_current(post);
        Ok(())
    }

    /// The selected post, if any
    pub async fn current_post(&self) -> Option<Post> {
        self.session.read().await.current_post.clone()
    }

    /// The revision the session is looking at
    pub async fn active_revision(&self) -> Option<PostRevision> {
        self.session.read().await.active_revision.clone()
    }

    pub async fn set_mode(&self, mode: EditorMode) {
        self.session.write().await.mode = mode;
    }

    pub async fn mode(&self) -> EditorMode {
        self.session.read().await.mode
    }

    pub async fn is_loading(&self) -> bool {
        self.session.read().await.loading
    }

    /// The last operation error, mirrored for UI display
    pub async fn last_error(&self) -> Option<String> {
        self.session.read().await.error.clone()
    }

    /// Browse an older revision without moving the post's current revision
    pub async fn view_revision(&self, revision_id: &str) -> Result<()> {
        self.session.write().await.view_revision(revision_id)
    }

    // ---- revisions ----

    /// Snapshot content into a new revision and make it active
    pub async fn create_revision(
        &self,
        post_id: &str,
        content: String,
        media_items: Vec<MediaItem>,
        created_by: &Attribution,
        expected_version: Option<u64>,
    ) -> Result<PostRevision> {
        self.begin().await;
        let result = async {
            let revision = self
                .revisions
                .create(post_id, content, media_items, created_by, expected_version)
                .await?;
            self.refresh_selected(post_id, Some(&revision.id)).await?;
            Ok(revision)
        }
        .await;
        self.finish(result).await
    }

    /// Revision history, newest first
    pub async fn revision_history(&self, post_id: &str) -> Result<Vec<PostRevision>> {
        self.revisions.history(post_id).await
    }

    // ---- comments ----

    /// Add a comment to a revision
    pub async fn add_comment(
        &self,
        post_id: &str,
        revision_id: &str,
        new_comment: NewComment,
    ) -> Result<Comment> {
        self.begin().await;
        let result = async {
            let comment = self.comments.add(post_id, revision_id, new_comment).await?;
            self.refresh_selected(post_id, None).await?;
            Ok(comment)
        }
        .await;
        self.finish(result).await
    }

    /// Resolve a comment; idempotent
    pub async fn resolve_comment(&self, post_id: &str, comment_id: &str) -> Result<bool> {
        self.begin().await;
        let result = async {
            let resolved = self.comments.resolve(post_id, comment_id).await?;
            self.refresh_selected(post_id, None).await?;
            Ok(resolved)
        }
        .await;
        self.finish(result).await
    }

    /// Threaded comment view of a revision
    pub async fn comment_thread(
        &self,
        post_id: &str,
        revision_id: &str,
    ) -> Result<Vec<CommentNode>> {
        self.comments.thread(post_id, revision_id).await
    }

    /// Total comments on the active revision, replies included
    pub async fn comment_count(&self) -> usize {
        self.session
            .read()
            .await
            .active_revision
            .as_ref()
            .map(PostRevision::comment_count)
            .unwrap_or(0)
    }

    /// Unresolved comments on the active revision, replies included
    pub async fn unresolved_comment_count(&self) -> usize {
        self.session
            .read()
            .await
            .active_revision
            .as_ref()
            .map(PostRevision::unresolved_comment_count)
            .unwrap_or(0)
    }

    // ---- spatial comments ----

    /// Anchor a pending spatial comment at the pointer position
    pub async fn start_adding_comment(
        &self,
        pointer: PointerEvent,
        bounds: SurfaceBounds,
        parent_id: Option<String>,
    ) -> Result<()> {
        self.session
            .write()
            .await
            .start_adding_comment(pointer, bounds, parent_id)?;
        Ok(())
    }

    /// Submit the pending spatial comment against the active revision
    ///
    /// The pending anchor is consumed on success and kept on failure, so a
    /// transient error does not lose the pin.
    pub async fn submit_comment(&self, author: &Attribution, content: String) -> Result<Comment> {
        let (post_id, revision_id, pending) = {
            let session = self.session.read().await;
            let post = session
                .current_post
                .as_ref()
                .ok_or_else(|| crate::error::VestryError::Validation(
                    "No post selected".to_string(),
                ))?;
            let revision = session
                .active_revision
                .as_ref()
                .ok_or_else(|| crate::error::VestryError::Validation(
                    "No active revision".to_string(),
                ))?;
            let pending = session.pending_comment.clone().ok_or_else(|| {
                crate::error::VestryError::Validation("No pending comment".to_string())
            })?;
            (post.id.clone(), revision.id.clone(), pending)
        };

        let comment = self
            .add_comment(
                &post_id,
                &revision_id,
                NewComment {
                    author: author.clone(),
                    content,
                    coordinates: Some(pending.coordinates),
                    parent_id: pending.parent_id,
                },
            )
            .await?;

        self.session.write().await.cancel_adding_comment();
        Ok(comment)
    }

    /// Discard the pending spatial comment
    pub async fn cancel_adding_comment(&self) {
        self.session.write().await.cancel_adding_comment();
    }

    pub async fn pending_comment(&self) -> Option<PendingComment> {
        self.session.read().await.pending_comment.clone()
    }

    // ---- workflow ----

    pub async fn submit_for_review(&self, post_id: &str) -> Result<Post> {
        self.begin().await;
        let result = async {
            let post = self.workflow.submit_for_review(post_id, None).await?;
            self.refresh_session(&post, None).await;
            Ok(post)
        }
        .await;
        self.finish(result).await
    }

    pub async fn approve(&self, post_id: &str) -> Result<Post> {
        self.begin().await;
        let result = async {
            let post = self.workflow.approve(post_id, None).await?;
            self.refresh_session(&post, None).await;
            Ok(post)
        }
        .await;
        self.finish(result).await
    }

    pub async fn reject(
        &self,
        post_id: &str,
        reason: &str,
        reviewed_by: &Attribution,
    ) -> Result<Post> {
        self.begin().await;
        let result = async {
            let post = self.workflow.reject(post_id, reason, reviewed_by, None).await?;
            self.refresh_session(&post, None).await;
            Ok(post)
        }
        .await;
        self.finish(result).await
    }

    /// Publish an approved or scheduled post, returning the platforms it
    /// went out to
    pub async fn publish_post(
        &self,
        post_id: &str,
        platform_ids: Option<Vec<SocialPlatform>>,
    ) -> Result<Vec<SocialPlatform>> {
        self.begin().await;
        let result = async {
            let (post, platforms) = self.workflow.publish(post_id, platform_ids, None).await?;
            self.refresh_session(&post, None).await;
            Ok(platforms)
        }
        .await;
        self.finish(result).await
    }

    // ---- scheduling ----

    pub async fn schedule_post(&self, post_id: &str, request: ScheduleRequest) -> Result<Post> {
        self.begin().await;
        let result = async {
            let post = self.schedule.schedule(post_id, request, None).await?;
            self.refresh_session(&post, None).await;
            Ok(post)
        }
        .await;
        self.finish(result).await
    }

    /// Replace one platform's overrides on the selected schedule
    pub async fn update_platform_settings(
        &self,
        post_id: &str,
        platform: SocialPlatform,
        settings: crate::types::PlatformSettings,
    ) -> Result<PostSchedule> {
        self.begin().await;
        let result = async {
            let post = self
                .schedule
                .update_platform_settings(post_id, platform, settings, None)
                .await?;
            let schedule = post.schedule.clone().ok_or_else(|| {
                crate::error::VestryError::Validation("Post has no schedule".to_string())
            })?;
            self.refresh_session(&post, None).await;
            Ok(schedule)
        }
        .await;
        self.finish(result).await
    }

    /// The top of the next hour, at least 24 hours out
    pub fn suggest_next_available_slot(&self) -> DateTime<Local> {
        crate::scheduling::suggest_next_available_slot(Local::now())
    }

    /// Platforms preselected for new schedules, from configuration
    pub fn default_platforms(&self) -> Vec<SocialPlatform> {
        self.schedule.default_platforms()
    }

    pub fn config(&self) -> &VestryConfig {
        &self.config
    }

    // ---- media ----

    /// Upload media through the configured store and attach it to the post's
    /// working copy
    pub async fn upload_media(&self, post_id: &str, upload: MediaUpload) -> Result<MediaItem> {
        self.begin().await;
        let result = async {
            let item = self.media.upload(&upload).await?;
            let post = self
                .store
                .update_post(post_id, None, |post| {
                    post.media_items.push(item.clone());
                    Ok(post.clone())
                })
                .await?;

            info!(post_id = %post_id, media_id = %item.id, "media uploaded");
            self.event_bus.emit(Event::MediaUploaded {
                post_id: post_id.to_string(),
                media_id: item.id.clone(),
            });
            self.refresh_session(&post, None).await;
            Ok(item)
        }
        .await;
        self.finish(result).await
    }

    // ---- internals ----

    async fn begin(&self) {
        let mut session = self.session.write().await;
        session.loading = true;
        session.error = None;
    }

    /// Clear the loading flag and mirror the outcome into the error slot
    async fn finish<T>(&self, result: Result<T>) -> Result<T> {
        let mut session = self.session.write().await;
        session.loading = false;
        if let Err(err) = &result {
            session.error = Some(err.to_string());
        }
        result
    }

    /// Refresh the session when the mutated post is the selected one
    async fn refresh_session(&self, post: &Post, active_override: Option<&str>) {
        let mut session = self.session.write().await;
        if session
            .current_post
            .as_ref()
            .is_some_and(|p| p.id == post.id)
        {
            session.refresh(post.clone(), active_override);
        }
    }

    async fn refresh_selected(&self, post_id: &str, active_override: Option<&str>) -> Result<()> {
        let needs_refresh = {
            let session = self.session.read().await;
            session
                .current_post
                .as_ref()
                .is_some_and(|p| p.id == post_id)
        };
        if needs_refresh {
            let post = self.store.fetch_post(post_id).await?;
            self.refresh_session(&post, active_override).await;
        }
        Ok(())
    }
}
