//! Walks a post through the full approval workflow
//!
//! Usage:
//!   cargo run --example approval_workflow

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use libvestry::media::MockMediaStore;
use libvestry::service::{NewComment, NewPost, ScheduleRequest, VestryService};
use libvestry::types::{Attribution, ContentType, PlatformSettings, SocialPlatform};
use libvestry::VestryConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    libvestry::logging::init_default();

    let writer = Attribution {
        user_id: "writer".to_string(),
        user_name: "Ada".to_string(),
        user_avatar: "ada.png".to_string(),
    };
    let editor = Attribution {
        user_id: "editor".to_string(),
        user_name: "Grace".to_string(),
        user_avatar: "grace.png".to_string(),
    };

    let service =
        VestryService::from_config(VestryConfig::default(), Arc::new(MockMediaStore::new()));

    let post = service
        .create_post(NewPost {
            title: "Launch announcement".to_string(),
            content: "We are launching next week".to_string(),
            content_type: ContentType::Text,
            created_by: writer.clone(),
        })
        .await?;
    println!("created {} ({})", post.title, post.status);

    service.submit_for_review(&post.id).await?;
    let rejected = service.reject(&post.id, "needs edits", &editor).await?;
    println!(
        "rejected with note: {}",
        rejected.current_revision().map(|r| r.comments[0].content.as_str()).unwrap_or("")
    );

    let revision = service
        .create_revision(
            &post.id,
            "We are launching next week, with details".to_string(),
            vec![],
            &writer,
            None,
        )
        .await?;
    println!("reworked into revision {}", revision.revision_number);

    service
        .add_comment(
            &post.id,
            &revision.id,
            NewComment {
                author: editor.clone(),
                content: "Much better".to_string(),
                coordinates: None,
                parent_id: None,
            },
        )
        .await?;

    service.submit_for_review(&post.id).await?;
    service.approve(&post.id).await?;

    let mut settings = HashMap::new();
    settings.insert(
        SocialPlatform::Facebook,
        PlatformSettings {
            audiences: vec!["members".to_string()],
            custom_text: Some("Big news".to_string()),
            hashtags: vec!["launch".to_string()],
        },
    );
    service
        .schedule_post(
            &post.id,
            ScheduleRequest {
                scheduled_for: Utc::now() + Duration::hours(48),
                timezone: Some("America/Chicago".to_string()),
                platforms: vec![SocialPlatform::Facebook, SocialPlatform::Timeline],
                platform_settings: settings,
            },
        )
        .await?;
    println!("scheduled for {}", service.post(&post.id).await?.schedule.map(|s| s.scheduled_for.to_rfc3339()).unwrap_or_default());

    let platforms = service.publish_post(&post.id, None).await?;
    println!(
        "published to {}",
        platforms
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}
