//! Story collection data model
//!
//! The engine receives the collection whole from the upstream feed and
//! treats it as session-local state: the only field it mutates is each
//! story's viewed flag, which guards the once-per-session view emission.

use serde::{Deserialize, Serialize};

/// Kind of media backing a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image, displayed for a fixed default duration
    Image,

    /// Video, displayed for its own duration (with a fallback when unknown)
    Video,
}

/// Reaction a viewer can attach to a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Laugh,
    Surprised,
    Sad,
    Fire,
}

/// A single ephemeral media item belonging to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    /// Story identifier assigned by the upstream service
    pub id: String,

    /// Kind of media backing this story
    pub media_type: MediaType,

    /// Playback duration in seconds; required for video, ignored for images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_duration_seconds: Option<f64>,

    /// Whether the viewer has already seen this story
    #[serde(default)]
    pub is_viewed: bool,

    /// Total view count reported by the upstream service
    #[serde(default)]
    pub views_count: u32,

    /// Total reaction count reported by the upstream service
    #[serde(default)]
    pub reactions_count: u32,

    /// The viewer's own reaction, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_reaction: Option<ReactionKind>,
}

/// A user entry in the story tray with their ordered stories
///
/// Ordering is insertion order from the upstream feed (chronological by
/// latest story).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryUser {
    /// User identifier assigned by the upstream service
    pub user_id: String,

    /// Whether this user has stories the viewer has not seen yet
    #[serde(default)]
    pub has_unviewed: bool,

    /// This user's stories, oldest first
    pub stories: Vec<Story>,
}

impl Story {
    /// Create an image story with upstream defaults
    pub fn image(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            media_type: MediaType::Image,
            media_duration_seconds: None,
            is_viewed: false,
            views_count: 0,
            reactions_count: 0,
            user_reaction: None,
        }
    }

    /// Create a video story of the given duration
    pub fn video(id: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            id: id.into(),
            media_type: MediaType::Video,
            media_duration_seconds: Some(duration_seconds),
            is_viewed: false,
            views_count: 0,
            reactions_count: 0,
            user_reaction: None,
        }
    }
}

impl StoryUser {
    /// Create a user entry from its stories
    pub fn new(user_id: impl Into<String>, stories: Vec<Story>) -> Self {
        let has_unviewed = stories.iter().any(|s| !s.is_viewed);
        Self {
            user_id: user_id.into(),
            has_unviewed,
            stories,
        }
    }
}
