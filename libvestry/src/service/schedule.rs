//! Schedule service
//!
//! Attaches validated schedules to approved posts and edits per-platform
//! overrides afterwards. Timezone and platform defaults come from the loaded
//! configuration.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::events::{Event, EventBus};
use crate::config::VestryConfig;
use crate::error::{Result, VestryError};
use crate::lifecycle::{next_status, WorkflowOp};
use crate::store::PostStore;
use crate::types::{PlatformSettings, Post, PostSchedule, SocialPlatform};

/// Input for scheduling a post
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub scheduled_for: DateTime<Utc>,
    /// IANA timezone name; the configured default applies when unset
    pub timezone: Option<String>,
    pub platforms: Vec<SocialPlatform>,
    pub platform_settings: HashMap<SocialPlatform, PlatformSettings>,
}

#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<PostStore>,
    events: EventBus,
    config: Arc<VestryConfig>,
}

impl ScheduleService {
    pub fn new(store: Arc<PostStore>, events: EventBus, config: Arc<VestryConfig>) -> Self {
        Self {
            store,
            events,
            config,
        }
    }

    /// Attach a schedule to an approved post and move it to scheduled
    ///
    /// The schedule is validated before any state changes: an invalid request
    /// leaves the post approved with no schedule attached.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the post is not approved, `Validation` when
    /// the request fails schedule validation or the time is in the past.
    pub async fn schedule(
        &self,
        post_id: &str,
        request: ScheduleRequest,
        expected_version: Option<u64>,
    ) -> Result<Post> {
        if request.scheduled_for <= Utc::now() {
            return Err(VestryError::Validation(
                "Scheduled time must be in the future".to_string(),
            ));
        }

        let timezone = request
            .timezone
            .clone()
            .unwrap_or_else(|| self.config.defaults.timezone.clone());

        let (from, post) = self
            .store
            .update_post(post_id, expected_version, |post| {
                let to = next_status(post.status, WorkflowOp::Schedule)?;
                let from = post.status;

                let schedule = PostSchedule::new(
                    request.scheduled_for,
                    timezone.clone(),
                    request.platforms.clone(),
                    request.platform_settings.clone(),
                )?;

                post.schedule = Some(schedule);
                post.status = to;
                Ok((from, post.clone()))
            })
            .await?;

        info!(
            post_id = %post.id,
            scheduled_for = %request.scheduled_for,
            "post scheduled"
        );
        self.events.emit(Event::StatusChanged {
            post_id: post.id.clone(),
            from,
            to: post.status,
        });
        self.events.emit(Event::PostScheduled {
            post_id: post.id.clone(),
            scheduled_for: request.scheduled_for,
        });
        Ok(post)
    }

    /// Replace the overrides for one platform on an existing schedule
    ///
    /// Other platforms' settings are untouched.
    ///
    /// # Errors
    ///
    /// `Validation` when the post has no schedule or the platform is not in
    /// the schedule's platform set.
    pub async fn update_platform_settings(
        &self,
        post_id: &str,
        platform: SocialPlatform,
        settings: PlatformSettings,
        expected_version: Option<u64>,
    ) -> Result<Post> {
        let post = self
            .store
            .update_post(post_id, expected_version, |post| {
                let schedule = post.schedule.as_mut().ok_or_else(|| {
                    VestryError::Validation("Post has no schedule".to_string())
                })?;

                if !schedule.platforms.contains(&platform) {
                    return Err(VestryError::Validation(format!(
                        "Platform {} is not in the schedule's platform set",
                        platform
                    )));
                }

                schedule.platform_settings.insert(platform, settings.clone());
                Ok(post.clone())
            })
            .await?;

        info!(post_id = %post.id, platform = %platform, "platform settings updated");
        self.events.emit(Event::PostUpdated {
            post_id: post.id.clone(),
        });
        Ok(post)
    }

    /// Platforms preselected for new schedules, from configuration
    ///
    /// Unrecognized names are skipped with a warning.
    pub fn default_platforms(&self) -> Vec<SocialPlatform> {
        self.config
            .defaults
            .platforms
            .iter()
            .filter_map(|name| match name.parse::<SocialPlatform>() {
                Ok(platform) => Some(platform),
                Err(_) => {
                    warn!(platform = %name, "unknown platform in configuration, skipping");
                    None
                }
            })
            .collect()
    }
}
