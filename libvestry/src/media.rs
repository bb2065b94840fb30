//! Media collaborator seam
//!
//! The core never stores file bytes; it hands them to a [`MediaStore`] and
//! carries the returned [`MediaItem`] descriptor around as opaque data. The
//! mock implementation backs tests and local simulation, with injectable
//! failure so collaborator errors can be exercised end to end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{Result, VestryError};
use crate::types::{MediaItem, MediaType};

/// A raw file handed to the media collaborator
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    /// MIME type, e.g. "image/png" or "video/mp4"
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    /// Classify the upload from its MIME type
    ///
    /// # Errors
    ///
    /// Returns `Validation` for anything that is not an image or a video.
    pub fn media_type(&self) -> Result<MediaType> {
        let mime = self.content_type.to_lowercase();
        if mime.starts_with("image/") {
            Ok(MediaType::Image)
        } else if mime.starts_with("video/") {
            Ok(MediaType::Video)
        } else {
            Err(VestryError::Validation(format!(
                "Unsupported media type: {}",
                self.content_type
            )))
        }
    }
}

/// Storage collaborator for raw media files
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store a file and return its descriptor
    ///
    /// # Errors
    ///
    /// Returns `MediaUpload` when the collaborator fails; the message is
    /// surfaced to callers unchanged.
    async fn upload(&self, upload: &MediaUpload) -> Result<MediaItem>;
}

/// In-process media store for tests and local simulation
///
/// Generates `mock://media/{id}` URLs and thumbnails for images. A failure
/// message can be injected to make every subsequent upload fail until
/// cleared.
#[derive(Default)]
pub struct MockMediaStore {
    fail_with: Mutex<Option<String>>,
    uploads: AtomicUsize,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make all subsequent uploads fail with the given message
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    /// Let uploads succeed again
    pub fn clear_failure(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    /// Number of successful uploads so far
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn upload(&self, upload: &MediaUpload) -> Result<MediaItem> {
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(VestryError::MediaUpload(message));
        }

        let media_type = upload.media_type()?;
        let id = Uuid::new_v4().to_string();
        let url = format!("mock://media/{}/{}", id, upload.file_name);
        let thumbnail_url = match media_type {
            MediaType::Image => Some(format!("mock://media/{}/thumb/{}", id, upload.file_name)),
            MediaType::Video => None,
        };

        self.uploads.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();

        Ok(MediaItem {
            id,
            media_type,
            url,
            thumbnail_url,
            size: upload.bytes.len() as u64,
            created_at: now,
            updated_at: now,
        })
    }
}
