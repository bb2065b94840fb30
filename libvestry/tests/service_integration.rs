//! Integration tests for VestryService
//!
//! Tests the service layer as a whole, including interactions between
//! sub-services sharing one store and event bus.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use libvestry::media::{MediaStore, MediaUpload, MockMediaStore};
use libvestry::service::{
    EditorMode, Event, NewComment, NewPost, PointerEvent, ScheduleRequest, SurfaceBounds,
    UpdatePost, VestryService,
};
use libvestry::types::{
    Attribution, ContentType, PlatformSettings, PostStatus, SocialPlatform,
};
use libvestry::{VestryConfig, VestryError};

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

fn setup_service() -> VestryService {
    VestryService::from_config(VestryConfig::default(), Arc::new(MockMediaStore::new()))
}

fn new_post(title: &str, content: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: content.to_string(),
        content_type: ContentType::Text,
        created_by: author(),
    }
}

#[tokio::test]
async fn test_service_initialization() {
    let service = setup_service();

    assert!(service.posts().await.is_empty());
    assert_eq!(service.mode().await, EditorMode::Edit);
    let mut _receiver = service.subscribe();
}

#[tokio::test]
async fn test_posts_listed_newest_first() {
    let service = setup_service();

    service.create_post(new_post("First", "Body")).await.unwrap();
    service.create_post(new_post("Second", "Body")).await.unwrap();
    service.create_post(new_post("Third", "Body")).await.unwrap();

    let posts = service.posts().await;
    let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Third", "Second", "First"]);
}

#[tokio::test]
async fn test_revision_history_across_services() {
    let service = setup_service();
    let post = service.create_post(new_post("Post", "First body")).await.unwrap();

    service
        .create_revision(&post.id, "Second body".to_string(), vec![], &author(), None)
        .await
        .unwrap();
    let third = service
        .create_revision(&post.id, "Third body".to_string(), vec![], &author(), None)
        .await
        .unwrap();

    let history = service.revision_history(&post.id).await.unwrap();
    let numbers: Vec<u32> = history.iter().map(|r| r.revision_number).collect();
    assert_eq!(numbers, vec![3, 2, 1]);

    // The post's working copy follows the newest snapshot
    let stored = service.post(&post.id).await.unwrap();
    assert_eq!(stored.content, "Third body");
    assert_eq!(stored.current_revision_id, third.id);
}

#[tokio::test]
async fn test_comments_survive_new_revisions() {
    let service = setup_service();
    let post = service.create_post(new_post("Post", "Body")).await.unwrap();
    let first_revision = post.current_revision_id.clone();

    service
        .add_comment(
            &post.id,
            &first_revision,
            NewComment {
                author: reviewer(),
                content: "On the first draft".to_string(),
                coordinates: None,
                parent_id: None,
            },
        )
        .await
        .unwrap();

    service
        .create_revision(&post.id, "Reworked".to_string(), vec![], &author(), None)
        .await
        .unwrap();

    // Comments belong to their revision, not the post
    let stored = service.post(&post.id).await.unwrap();
    assert_eq!(stored.revision(&first_revision).unwrap().comments.len(), 1);
    assert!(stored.current_revision().unwrap().comments.is_empty());
}

#[tokio::test]
async fn test_stale_write_detected() {
    let service = setup_service();
    let post = service.create_post(new_post("Post", "Body")).await.unwrap();

    // First write bumps the version
    service
        .update_post(
            &post.id,
            UpdatePost {
                content: Some("Edit one".to_string()),
                expected_version: Some(post.version),
                ..UpdatePost::default()
            },
        )
        .await
        .unwrap();

    // Second writer still holds the old version
    let result = service
        .update_post(
            &post.id,
            UpdatePost {
                content: Some("Edit two".to_string()),
                expected_version: Some(post.version),
                ..UpdatePost::default()
            },
        )
        .await;

    match result {
        Err(VestryError::StaleWrite { expected, actual }) => {
            assert_eq!(expected, post.version);
            assert!(actual > expected);
        }
        other => panic!("Expected StaleWrite, got {:?}", other.map(|p| p.id)),
    }

    // The losing write changed nothing
    let stored = service.post(&post.id).await.unwrap();
    assert_eq!(stored.content, "Edit one");
}

#[tokio::test]
async fn test_events_flow_across_subservices() {
    let service = setup_service();
    let mut receiver = service.subscribe();

    let post = service.create_post(new_post("Post", "Body")).await.unwrap();
    service.submit_for_review(&post.id).await.unwrap();
    service.approve(&post.id).await.unwrap();

    match receiver.recv().await.unwrap() {
        Event::PostCreated { post_id } => assert_eq!(post_id, post.id),
        other => panic!("Wrong event: {:?}", other),
    }
    match receiver.recv().await.unwrap() {
        Event::StatusChanged { from, to, .. } => {
            assert_eq!(from, PostStatus::Draft);
            assert_eq!(to, PostStatus::InReview);
        }
        other => panic!("Wrong event: {:?}", other),
    }
    match receiver.recv().await.unwrap() {
        Event::StatusChanged { from, to, .. } => {
            assert_eq!(from, PostStatus::InReview);
            assert_eq!(to, PostStatus::Approved);
        }
        other => panic!("Wrong event: {:?}", other),
    }
}

#[tokio::test]
async fn test_schedule_then_publish_uses_schedule_platforms() {
    let service = setup_service();
    let post = service.create_post(new_post("Post", "Body")).await.unwrap();

    service.submit_for_review(&post.id).await.unwrap();
    service.approve(&post.id).await.unwrap();

    let mut settings = HashMap::new();
    settings.insert(
        SocialPlatform::Facebook,
        PlatformSettings {
            audiences: vec![],
            custom_text: Some("Hi".to_string()),
            hashtags: vec![],
        },
    );
    service
        .schedule_post(
            &post.id,
            ScheduleRequest {
                scheduled_for: Utc::now() + Duration::hours(48),
                timezone: Some("America/Chicago".to_string()),
                platforms: vec![SocialPlatform::Facebook, SocialPlatform::Instagram],
                platform_settings: settings,
            },
        )
        .await
        .unwrap();

    let platforms = service.publish_post(&post.id, None).await.unwrap();
    assert_eq!(
        platforms,
        vec![SocialPlatform::Facebook, SocialPlatform::Instagram]
    );
    assert_eq!(
        service.post(&post.id).await.unwrap().status,
        PostStatus::Published
    );
}

#[tokio::test]
async fn test_schedule_settings_for_foreign_platform_rejected() {
    let service = setup_service();
    let post = service.create_post(new_post("Post", "Body")).await.unwrap();

    service.submit_for_review(&post.id).await.unwrap();
    service.approve(&post.id).await.unwrap();

    let mut settings = HashMap::new();
    settings.insert(SocialPlatform::Youtube, PlatformSettings::default());

    let result = service
        .schedule_post(
            &post.id,
            ScheduleRequest {
                scheduled_for: Utc::now() + Duration::hours(48),
                timezone: None,
                platforms: vec![SocialPlatform::Facebook],
                platform_settings: settings,
            },
        )
        .await;

    assert!(matches!(result, Err(VestryError::Validation(_))));
    // The failed schedule left the post approved with no schedule
    let stored = service.post(&post.id).await.unwrap();
    assert_eq!(stored.status, PostStatus::Approved);
    assert!(stored.schedule.is_none());
}

#[tokio::test]
async fn test_media_upload_count_and_types() {
    let media = Arc::new(MockMediaStore::new());
    let service = VestryService::from_config(
        VestryConfig::default(),
        Arc::clone(&media) as Arc<dyn MediaStore>,
    );
    let post = service.create_post(new_post("Post", "Body")).await.unwrap();

    service
        .upload_media(
            &post.id,
            MediaUpload {
                file_name: "banner.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: vec![0; 16],
            },
        )
        .await
        .unwrap();
    service
        .upload_media(
            &post.id,
            MediaUpload {
                file_name: "teaser.mp4".to_string(),
                content_type: "video/mp4".to_string(),
                bytes: vec![0; 16],
            },
        )
        .await
        .unwrap();

    assert_eq!(media.upload_count(), 2);
    let stored = service.post(&post.id).await.unwrap();
    assert_eq!(stored.media_items.len(), 2);

    let result = service
        .upload_media(
            &post.id,
            MediaUpload {
                file_name: "notes.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: vec![],
            },
        )
        .await;
    assert!(matches!(result, Err(VestryError::Validation(_))));
}

#[tokio::test]
async fn test_loading_flag_settles_after_each_operation() {
    let service = setup_service();

    let post = service.create_post(new_post("Post", "Body")).await.unwrap();
    assert!(!service.is_loading().await);

    let _ = service.update_post("missing", UpdatePost::default()).await;
    assert!(!service.is_loading().await);

    service.submit_for_review(&post.id).await.unwrap();
    assert!(!service.is_loading().await);
}

#[tokio::test]
async fn test_spatial_comment_against_browsed_revision() {
    let service = setup_service();
    let post = service.create_post(new_post("Post", "Body")).await.unwrap();
    let first_revision = post.current_revision_id.clone();

    service
        .create_revision(&post.id, "Second".to_string(), vec![], &author(), None)
        .await
        .unwrap();

    // Browse back and pin a comment on the old snapshot
    service.view_revision(&first_revision).await.unwrap();
    service
        .start_adding_comment(
            PointerEvent { x: 25.0, y: 75.0 },
            SurfaceBounds {
                left: 0.0,
                top: 0.0,
                width: 100.0,
                height: 100.0,
            },
            None,
        )
        .await
        .unwrap();

    let comment = service
        .submit_comment(&reviewer(), "Old draft note".to_string())
        .await
        .unwrap();

    let stored = service.post(&post.id).await.unwrap();
    let revision = stored.revision(&first_revision).unwrap();
    assert_eq!(revision.comments.len(), 1);
    assert_eq!(revision.comments[0].id, comment.id);
    assert!(stored.current_revision().unwrap().comments.is_empty());
}
