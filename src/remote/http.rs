//! HTTP-backed story gateway
//!
//! Talks to the story service's REST endpoints. Requests carry a short
//! timeout so a slow service can never hold up the caller's task for
//! long; the engine treats every call as best-effort regardless.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::model::ReactionKind;

use super::{GatewayError, InsightsReport, StoryGateway};

/// Body of a view notification
#[derive(Debug, Serialize)]
struct ViewedRequest {
    viewed_at: DateTime<Utc>,
}

/// Body of a reaction submission
#[derive(Debug, Serialize)]
struct ReactionRequest {
    reaction: ReactionKind,
}

/// Response to a reaction submission
#[derive(Debug, Deserialize)]
struct ReactionResponse {
    accepted_reaction: ReactionKind,
}

/// Story gateway speaking JSON over HTTP
pub struct HttpStoryGateway {
    client: Client,
    base_url: String,
}

impl HttpStoryGateway {
    /// Build a gateway from configuration; fails when no endpoint is set
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let base_url = config
            .endpoint
            .clone()
            .ok_or(GatewayError::NotConfigured)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(GatewayError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn story_url(&self, story_id: &str, suffix: &str) -> String {
        format!("{}/stories/{}/{}", self.base_url, story_id, suffix)
    }
}

#[async_trait]
impl StoryGateway for HttpStoryGateway {
    async fn mark_story_viewed(&self, story_id: &str) -> Result<(), GatewayError> {
        let body = ViewedRequest {
            viewed_at: Utc::now(),
        };

        self.client
            .post(self.story_url(story_id, "view"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        debug!("marked story {} viewed", story_id);
        Ok(())
    }

    async fn submit_reaction(
        &self,
        story_id: &str,
        kind: ReactionKind,
    ) -> Result<ReactionKind, GatewayError> {
        let body = ReactionRequest { reaction: kind };

        let response: ReactionResponse = self
            .client
            .post(self.story_url(story_id, "reactions"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(
            "reaction for story {} accepted as {:?}",
            story_id, response.accepted_reaction
        );
        Ok(response.accepted_reaction)
    }

    async fn fetch_insights(&self, story_id: &str) -> Result<InsightsReport, GatewayError> {
        let report: InsightsReport = self
            .client
            .get(self.story_url(story_id, "insights"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(
            "insights for story {}: {} viewers",
            story_id,
            report.viewers.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_endpoint() {
        let config = GatewayConfig::default();
        assert!(matches!(
            HttpStoryGateway::new(&config),
            Err(GatewayError::NotConfigured)
        ));
    }

    #[test]
    fn test_story_url_joins_cleanly() {
        let config = GatewayConfig {
            endpoint: Some("https://stories.example.com/api/".to_string()),
            ..GatewayConfig::default()
        };
        let gateway = HttpStoryGateway::new(&config).unwrap();
        assert_eq!(
            gateway.story_url("s42", "view"),
            "https://stories.example.com/api/stories/s42/view"
        );
    }

    #[test]
    fn test_reaction_request_serialization() {
        let body = ReactionRequest {
            reaction: ReactionKind::Fire,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"reaction":"fire"}"#);
    }

    #[test]
    fn test_reaction_response_deserialization() {
        let response: ReactionResponse =
            serde_json::from_str(r#"{"accepted_reaction":"love"}"#).unwrap();
        assert_eq!(response.accepted_reaction, ReactionKind::Love);
    }
}
