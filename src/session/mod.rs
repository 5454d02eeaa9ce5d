//! Playback session - the engine, its command surface, and its events

mod engine;

pub use engine::{PlaybackEngine, SessionSpec, create_engine_channels};

use crate::cursor::Cursor;
use crate::gesture::TouchSample;
use crate::model::{MediaType, ReactionKind};
use crate::remote::InsightsReport;

/// Commands that can be sent to the playback engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// A raw touch sample from the presentation layer
    Touch(TouchSample),
    /// Open the owner-only insights overlay for the current story
    OpenInsights,
    /// Close the insights overlay
    CloseInsights,
    /// Submit the viewer's reaction to the current story
    React(ReactionKind),
    /// Close the session (external close, not a gesture)
    Close,
}

/// Events emitted by the playback engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Derived render state; emitted on every state transition
    Frame(RenderFrame),
    /// A story was seen for the first time this session
    StoryViewed {
        /// Story that was viewed
        story_id: String,
    },
    /// The gateway accepted a reaction submission
    ReactionAccepted {
        /// Story the reaction belongs to
        story_id: String,
        /// The kind the service settled on
        reaction: ReactionKind,
    },
    /// An insights report arrived for the overlay
    InsightsReady {
        /// Story the report describes
        story_id: String,
        /// The fetched report
        report: InsightsReport,
    },
    /// The session ended; terminal, fired exactly once
    SessionClosed,
}

/// Everything the presentation layer needs to draw one state
#[derive(Debug, Clone)]
pub struct RenderFrame {
    /// Position of the displayed story
    pub cursor: Cursor,
    /// Id of the displayed story
    pub story_id: String,
    /// Media kind of the displayed story
    pub media_type: MediaType,
    /// Whether a long-press hold is suspending playback
    pub paused: bool,
    /// Whether the insights overlay is open
    pub overlay_open: bool,
    /// The viewer's reaction to the displayed story
    pub reaction: Option<ReactionKind>,
    /// Normalized [0, 1] playback progress at emission time
    pub progress: f32,
    /// Insights report for the overlay, when open and loaded
    pub insights: Option<InsightsReport>,
    /// Whether the session has ended
    pub ended: bool,
}
