//! Story gateway: network collaborators at the engine boundary
//!
//! All gateway calls are fire-and-forget from the engine's point of view:
//! they run on spawned tasks, never block a playback transition, and their
//! failures are logged and swallowed. Insights are fetched lazily, only
//! when the owner opens the overlay.

mod http;

pub use http::HttpStoryGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ReactionKind;

/// Errors from gateway requests
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No endpoint configured; remote calls cannot be made
    #[error("story gateway endpoint not configured")]
    NotConfigured,

    /// Building the HTTP client failed
    #[error("failed to build gateway client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed in transit or returned an error status
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One viewer row in an insights report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightViewer {
    /// Viewer's user id
    pub user_id: String,

    /// Reaction this viewer left, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<ReactionKind>,
}

/// Owner-only aggregate view of a story's reach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsReport {
    /// Individual viewers, most recent first
    pub viewers: Vec<InsightViewer>,

    /// Total view count
    pub views_count: u32,

    /// Total reaction count
    pub reactions_count: u32,
}

/// Network collaborator the engine notifies and queries
///
/// Implementations must be cheap to share across spawned tasks; the engine
/// holds one behind an `Arc`.
#[async_trait]
pub trait StoryGateway: Send + Sync {
    /// Record that the viewer saw a story. Called at most once per story
    /// per session.
    async fn mark_story_viewed(&self, story_id: &str) -> Result<(), GatewayError>;

    /// Submit the viewer's reaction; returns the kind the service
    /// accepted (which may differ from the submitted one).
    async fn submit_reaction(
        &self,
        story_id: &str,
        kind: ReactionKind,
    ) -> Result<ReactionKind, GatewayError>;

    /// Fetch the owner-only insights report for a story
    async fn fetch_insights(&self, story_id: &str) -> Result<InsightsReport, GatewayError>;
}

/// Gateway that accepts everything locally; for tests and offline runs
#[derive(Debug, Default)]
pub struct NoopGateway;

#[async_trait]
impl StoryGateway for NoopGateway {
    async fn mark_story_viewed(&self, _story_id: &str) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn submit_reaction(
        &self,
        _story_id: &str,
        kind: ReactionKind,
    ) -> Result<ReactionKind, GatewayError> {
        Ok(kind)
    }

    async fn fetch_insights(&self, _story_id: &str) -> Result<InsightsReport, GatewayError> {
        Ok(InsightsReport {
            viewers: Vec::new(),
            views_count: 0,
            reactions_count: 0,
        })
    }
}
