//! Core types for Vestry

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VestryError};

/// Lifecycle status of a post
///
/// `Draft` is the initial status, `Published` is terminal. Legal transitions
/// are encoded in [`crate::lifecycle::next_status`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    InReview,
    Approved,
    Scheduled,
    Published,
    Rejected,
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::InReview => write!(f, "in_review"),
            Self::Approved => write!(f, "approved"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Published => write!(f, "published"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Kind of content a post carries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Image,
    Video,
    Mixed,
}

/// Kind of a stored media asset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
}

/// A stored media descriptor returned by the media collaborator
///
/// The URL is opaque to the core; it is carried through revisions and
/// schedules without interpretation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: String,
    pub media_type: MediaType,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role of a user, trusted input used for attribution only
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Creator,
    Approver,
    Viewer,
}

/// A user of the console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub email: String,
    pub role: Role,
}

/// Identity attribution attached to revisions and comments
///
/// Supplied by the identity collaborator; never authenticated here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attribution {
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: String,
}

impl From<&User> for Attribution {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            user_avatar: user.avatar.clone(),
        }
    }
}

/// Percentage position of a pinned comment on rendered content
///
/// Both axes are clamped to the 0-100 range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.clamp(0.0, 100.0),
            y: y.clamp(0.0, 100.0),
        }
    }
}

/// A comment attached to a revision
///
/// Comments are stored flat per revision; threading is carried by `parent_id`
/// back-references and the nested view is derived on read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
    pub coordinates: Option<Coordinates>,
    pub parent_id: Option<String>,
}

impl Comment {
    pub fn new(
        author: &Attribution,
        content: String,
        coordinates: Option<Coordinates>,
        parent_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: author.user_id.clone(),
            user_name: author.user_name.clone(),
            user_avatar: author.user_avatar.clone(),
            content,
            timestamp: Utc::now(),
            resolved: false,
            coordinates,
            parent_id,
        }
    }
}

/// A comment with its nested replies, derived from the flat list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// An immutable, numbered snapshot of a post's content and media
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRevision {
    pub id: String,
    pub revision_number: u32,
    pub content: String,
    pub media_items: Vec<MediaItem>,
    pub created_by: Attribution,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<Comment>,
}

impl PostRevision {
    pub fn new(
        revision_number: u32,
        content: String,
        media_items: Vec<MediaItem>,
        created_by: Attribution,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            revision_number,
            content,
            media_items,
            created_by,
            created_at: Utc::now(),
            comments: Vec::new(),
        }
    }

    /// Comments with no parent, in insertion order
    pub fn top_level_comments(&self) -> Vec<&Comment> {
        self.comments
            .iter()
            .filter(|c| c.parent_id.is_none())
            .collect()
    }

    /// Direct replies to the given comment, in insertion order
    pub fn replies_for(&self, comment_id: &str) -> Vec<&Comment> {
        self.comments
            .iter()
            .filter(|c| c.parent_id.as_deref() == Some(comment_id))
            .collect()
    }

    /// Total number of comments, replies included
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Number of comments not yet resolved, replies included
    pub fn unresolved_comment_count(&self) -> usize {
        self.comments.iter().filter(|c| !c.resolved).count()
    }

    /// Derived threaded view of the flat comment list
    pub fn thread(&self) -> Vec<CommentNode> {
        self.top_level_comments()
            .into_iter()
            .map(|c| self.node_for(c))
            .collect()
    }

    fn node_for(&self, comment: &Comment) -> CommentNode {
        let replies = self
            .replies_for(&comment.id)
            .into_iter()
            .map(|c| self.node_for(c))
            .collect();
        CommentNode {
            comment: comment.clone(),
            replies,
        }
    }
}

/// A publishing target platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Facebook,
    Instagram,
    Twitter,
    Youtube,
    Tiktok,
    /// The in-house feed, the default publish target
    Timeline,
}

impl SocialPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Twitter => "twitter",
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
            Self::Timeline => "timeline",
        }
    }
}

impl std::fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SocialPlatform {
    type Err = VestryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "facebook" => Ok(Self::Facebook),
            "instagram" => Ok(Self::Instagram),
            "twitter" => Ok(Self::Twitter),
            "youtube" => Ok(Self::Youtube),
            "tiktok" => Ok(Self::Tiktok),
            "timeline" => Ok(Self::Timeline),
            _ => Err(VestryError::Validation(format!(
                "Unknown platform: {}",
                s
            ))),
        }
    }
}

/// Per-platform overrides applied when publishing to that platform
///
/// Each platform's entry is an independent value; editing one never touches
/// another platform's settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlatformSettings {
    pub audiences: Vec<String>,
    pub custom_text: Option<String>,
    pub hashtags: Vec<String>,
}

/// The time, timezone, platform set and per-platform overrides for
/// future publishing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSchedule {
    pub id: String,
    pub scheduled_for: DateTime<Utc>,
    /// IANA timezone name, validated at construction
    pub timezone: String,
    pub platforms: Vec<SocialPlatform>,
    pub platform_settings: HashMap<SocialPlatform, PlatformSettings>,
}

impl PostSchedule {
    /// Build a validated schedule
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the platform set is empty, the timezone is not
    /// a known IANA name, or a settings key names a platform outside the set.
    pub fn new(
        scheduled_for: DateTime<Utc>,
        timezone: String,
        platforms: Vec<SocialPlatform>,
        platform_settings: HashMap<SocialPlatform, PlatformSettings>,
    ) -> Result<Self> {
        if platforms.is_empty() {
            return Err(VestryError::Validation(
                "Schedule requires at least one platform".to_string(),
            ));
        }

        crate::scheduling::validate_timezone(&timezone)?;

        for platform in platform_settings.keys() {
            if !platforms.contains(platform) {
                return Err(VestryError::Validation(format!(
                    "Settings reference platform {} which is not in the schedule's platform set",
                    platform
                )));
            }
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            scheduled_for,
            timezone,
            platforms,
            platform_settings,
        })
    }
}

/// A unit of content moving through the creation, approval and
/// publishing workflow
///
/// `revisions` is append-only and never reordered; `current_revision_id`
/// always references one of its elements. `version` is an optimistic counter
/// bumped on every committed mutation and checked against caller-supplied
/// expectations by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    pub status: PostStatus,
    pub media_items: Vec<MediaItem>,
    pub created_by: Attribution,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub current_revision_id: String,
    pub revisions: Vec<PostRevision>,
    pub schedule: Option<PostSchedule>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub version: u64,
}

impl Post {
    /// Create a draft post with its initial revision snapshot
    pub fn new(
        title: String,
        content: String,
        content_type: ContentType,
        created_by: Attribution,
    ) -> Self {
        let now = Utc::now();
        let revision = PostRevision::new(1, content.clone(), Vec::new(), created_by.clone());
        let current_revision_id = revision.id.clone();

        Self {
            id: Uuid::new_v4().to_string(),
            title,
            content,
            content_type,
            status: PostStatus::Draft,
            media_items: Vec::new(),
            created_by,
            created_at: now,
            updated_at: now,
            current_revision_id,
            revisions: vec![revision],
            schedule: None,
            tags: Vec::new(),
            categories: Vec::new(),
            version: 0,
        }
    }

    /// The revision referenced by `current_revision_id`
    pub fn current_revision(&self) -> Option<&PostRevision> {
        self.revisions
            .iter()
            .find(|r| r.id == self.current_revision_id)
    }

    pub fn revision(&self, revision_id: &str) -> Option<&PostRevision> {
        self.revisions.iter().find(|r| r.id == revision_id)
    }

    pub(crate) fn revision_mut(&mut self, revision_id: &str) -> Option<&mut PostRevision> {
        self.revisions.iter_mut().find(|r| r.id == revision_id)
    }
}
