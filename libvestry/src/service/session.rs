//! Per-session editor state
//!
//! Tracks which post and revision the session is looking at, the active
//! editor mode, the pending spatial comment, and the loading/error slots the
//! UI reads. The mode is a single enum, so two modes can never be active at
//! once.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VestryError};
use crate::types::{Coordinates, Post, PostRevision};

/// The single active UI mode
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EditorMode {
    #[default]
    Edit,
    Review,
    Comment,
    Schedule,
    Preview,
}

/// Pointer position in pixels, relative to the page
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
}

/// Bounding box of the rendered content surface, in pixels
#[derive(Debug, Clone, Copy)]
pub struct SurfaceBounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A spatial comment that has been anchored but not yet submitted
#[derive(Debug, Clone)]
pub struct PendingComment {
    pub coordinates: Coordinates,
    pub parent_id: Option<String>,
}

/// Session state owned by the service facade
///
/// `current_post` and `active_revision` are snapshots refreshed by the facade
/// after every mutating operation, so reads never observe a selection that
/// diverges from the store.
#[derive(Default)]
pub struct SessionState {
    pub(crate) current_post: Option<Post>,
    pub(crate) active_revision: Option<PostRevision>,
    pub(crate) mode: EditorMode,
    pub(crate) pending_comment: Option<PendingComment>,
    pub(crate) loading: bool,
    pub(crate) error: Option<String>,
}

impl SessionState {
    /// Select a post, recomputing the active revision from its
    /// `current_revision_id`; `None` clears the selection
    pub(crate) fn set_current(&mut self, post: Option<Post>) {
        self.active_revision = post.as_ref().and_then(|p| p.current_revision().cloned());
        self.current_post = post;
        self.pending_comment = None;
    }

    /// Point the active revision at an older snapshot for history browsing
    ///
    /// Does not move the post's `current_revision_id`; only `create_revision`
    /// does that.
    pub(crate) fn view_revision(&mut self, revision_id: &str) -> Result<()> {
        let post = self
            .current_post
            .as_ref()
            .ok_or_else(|| VestryError::Validation("No post selected".to_string()))?;

        let revision = post
            .revision(revision_id)
            .ok_or_else(|| VestryError::RevisionNotFound(revision_id.to_string()))?;

        self.active_revision = Some(revision.clone());
        Ok(())
    }

    /// Refresh the selection after a mutation committed
    ///
    /// Keeps the browsed revision when it still exists; otherwise falls back
    /// to the post's current revision. `active_override` pins the active
    /// revision explicitly (used when a new revision was just created).
    pub(crate) fn refresh(&mut self, post: Post, active_override: Option<&str>) {
        let active_id = active_override
            .map(str::to_string)
            .or_else(|| self.active_revision.as_ref().map(|r| r.id.clone()));

        self.active_revision = active_id
            .and_then(|id| post.revision(&id).cloned())
            .or_else(|| post.current_revision().cloned());
        self.current_post = Some(post);
    }

    /// Anchor a pending spatial comment at the pointer position
    ///
    /// Coordinates become percentages of the surface's bounding box, clamped
    /// to 0-100. A previously pending comment is replaced; at most one pending
    /// comment exists per session.
    pub(crate) fn start_adding_comment(
        &mut self,
        pointer: PointerEvent,
        bounds: SurfaceBounds,
        parent_id: Option<String>,
    ) -> Result<Coordinates> {
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return Err(VestryError::Validation(
                "Content surface has no area".to_string(),
            ));
        }

        let coordinates = Coordinates::new(
            (pointer.x - bounds.left) / bounds.width * 100.0,
            (pointer.y - bounds.top) / bounds.height * 100.0,
        );

        self.pending_comment = Some(PendingComment {
            coordinates,
            parent_id,
        });
        Ok(coordinates)
    }

    /// Discard the pending comment without creating anything
    pub(crate) fn cancel_adding_comment(&mut self) {
        self.pending_comment = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attribution, ContentType};

    fn author() -> Attribution {
        Attribution {
            user_id: "user-1".to_string(),
            user_name: "Ada".to_string(),
            user_avatar: "ada.png".to_string(),
        }
    }

    fn sample_post() -> Post {
        Post::new(
            "Title".to_string(),
            "Body".to_string(),
            ContentType::Text,
            author(),
        )
    }

    #[test]
    fn test_default_mode_is_edit() {
        let session = SessionState::default();
        assert_eq!(session.mode, EditorMode::Edit);
        assert!(!session.loading);
        assert!(session.error.is_none());
    }

    #[test]
    fn test_set_current_recomputes_active_revision() {
        let mut session = SessionState::default();
        let post = sample_post();
        let revision_id = post.current_revision_id.clone();

        session.set_current(Some(post));
        assert_eq!(
            session.active_revision.as_ref().unwrap().id,
            revision_id
        );

        session.set_current(None);
        assert!(session.current_post.is_none());
        assert!(session.active_revision.is_none());
    }

    #[test]
    fn test_view_revision_requires_selection() {
        let mut session = SessionState::default();
        let result = session.view_revision("any");
        assert!(matches!(result, Err(VestryError::Validation(_))));
    }

    #[test]
    fn test_view_revision_unknown_id() {
        let mut session = SessionState::default();
        session.set_current(Some(sample_post()));

        let result = session.view_revision("missing");
        assert!(matches!(result, Err(VestryError::RevisionNotFound(_))));
    }

    #[test]
    fn test_start_adding_comment_computes_percentages() {
        let mut session = SessionState::default();
        let coords = session
            .start_adding_comment(
                PointerEvent { x: 140.0, y: 260.0 },
                SurfaceBounds {
                    left: 100.0,
                    top: 200.0,
                    width: 100.0,
                    height: 100.0,
                },
                None,
            )
            .unwrap();

        assert_eq!(coords.x, 40.0);
        assert_eq!(coords.y, 60.0);
        assert!(session.pending_comment.is_some());
    }

    #[test]
    fn test_start_adding_comment_clamps_outside_surface() {
        let mut session = SessionState::default();
        let coords = session
            .start_adding_comment(
                PointerEvent { x: 500.0, y: -40.0 },
                SurfaceBounds {
                    left: 0.0,
                    top: 0.0,
                    width: 200.0,
                    height: 200.0,
                },
                None,
            )
            .unwrap();

        assert_eq!(coords.x, 100.0);
        assert_eq!(coords.y, 0.0);
    }

    #[test]
    fn test_start_adding_comment_zero_area_surface() {
        let mut session = SessionState::default();
        let result = session.start_adding_comment(
            PointerEvent { x: 10.0, y: 10.0 },
            SurfaceBounds {
                left: 0.0,
                top: 0.0,
                width: 0.0,
                height: 100.0,
            },
            None,
        );
        assert!(result.is_err());
        assert!(session.pending_comment.is_none());
    }

    #[test]
    fn test_second_start_replaces_pending() {
        let mut session = SessionState::default();
        let bounds = SurfaceBounds {
            left: 0.0,
            top: 0.0,
            width: 100.0,
            height: 100.0,
        };

        session
            .start_adding_comment(PointerEvent { x: 10.0, y: 10.0 }, bounds, None)
            .unwrap();
        session
            .start_adding_comment(PointerEvent { x: 90.0, y: 90.0 }, bounds, None)
            .unwrap();

        let pending = session.pending_comment.as_ref().unwrap();
        assert_eq!(pending.coordinates.x, 90.0);
        assert_eq!(pending.coordinates.y, 90.0);
    }

    #[test]
    fn test_cancel_adding_comment() {
        let mut session = SessionState::default();
        session
            .start_adding_comment(
                PointerEvent { x: 10.0, y: 10.0 },
                SurfaceBounds {
                    left: 0.0,
                    top: 0.0,
                    width: 100.0,
                    height: 100.0,
                },
                None,
            )
            .unwrap();

        session.cancel_adding_comment();
        assert!(session.pending_comment.is_none());
    }
}
