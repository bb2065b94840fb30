//! Event system for change notification
//!
//! An in-process event bus distributing lifecycle events to subscribers
//! without blocking the emitting operation. Uses `tokio::sync::broadcast`
//! for multi-subscriber support: if no subscribers exist events are dropped
//! immediately, and lagging subscribers never block emitters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{PostStatus, SocialPlatform};

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<Event>;

/// Event bus for distributing lifecycle events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the specified per-subscriber capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted after this call
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers, non-blocking
    pub fn emit(&self, event: Event) {
        // send() errs when nobody is listening, which is fine
        let _ = self.sender.send(event);
    }

    /// Number of active subscribers, for debugging and metrics only
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Events emitted as posts move through the lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    PostCreated {
        post_id: String,
    },
    PostUpdated {
        post_id: String,
    },
    PostDeleted {
        post_id: String,
    },
    RevisionCreated {
        post_id: String,
        revision_id: String,
        revision_number: u32,
    },
    StatusChanged {
        post_id: String,
        from: PostStatus,
        to: PostStatus,
    },
    CommentAdded {
        post_id: String,
        revision_id: String,
        comment_id: String,
    },
    CommentResolved {
        post_id: String,
        comment_id: String,
    },
    PostScheduled {
        post_id: String,
        scheduled_for: DateTime<Utc>,
    },
    PostPublished {
        post_id: String,
        platforms: Vec<SocialPlatform>,
    },
    MediaUploaded {
        post_id: String,
        media_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.emit(Event::PostCreated {
            post_id: "post-1".to_string(),
        });

        match receiver.recv().await.unwrap() {
            Event::PostCreated { post_id } => assert_eq!(post_id, "post-1"),
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        event_bus.emit(Event::StatusChanged {
            post_id: "post-2".to_string(),
            from: PostStatus::Draft,
            to: PostStatus::InReview,
        });

        for receiver in [&mut receiver1, &mut receiver2] {
            match receiver.recv().await.unwrap() {
                Event::StatusChanged { post_id, from, to } => {
                    assert_eq!(post_id, "post-2");
                    assert_eq!(from, PostStatus::Draft);
                    assert_eq!(to, PostStatus::InReview);
                }
                other => panic!("Wrong event type received: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let event_bus = EventBus::new(10);

        // Should not panic or block with nobody listening
        event_bus.emit(Event::PostDeleted {
            post_id: "post-3".to_string(),
        });

        assert_eq!(event_bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_serialization() {
        let event = Event::PostPublished {
            post_id: "post-4".to_string(),
            platforms: vec![SocialPlatform::Timeline, SocialPlatform::Facebook],
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("post_published"));
        assert!(json.contains("timeline"));

        let deserialized: Event = serde_json::from_str(&json).unwrap();
        match deserialized {
            Event::PostPublished { post_id, platforms } => {
                assert_eq!(post_id, "post-4");
                assert_eq!(platforms.len(), 2);
            }
            other => panic!("Deserialization failed: {:?}", other),
        }
    }
}
