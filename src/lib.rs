//! storyreel
//!
//! Sequential story playback and navigation engine: autonomous timed
//! advancement through a two-level `users -> stories` collection,
//! interruptible by gestures (tap, long-press, swipe), with pause/resume,
//! reaction capture, and an owner-only insights overlay.
//!
//! The engine renders nothing and owns no persistence. The presentation
//! layer feeds it raw touch samples and media signals over channels and
//! draws whatever [`session::RenderFrame`] it broadcasts; network side
//! effects go through the [`remote::StoryGateway`] seam, fire-and-forget.

pub mod clock;
pub mod config;
pub mod cursor;
pub mod gesture;
pub mod logging;
pub mod media;
pub mod model;
pub mod remote;
pub mod session;

pub use config::Config;
pub use cursor::Cursor;
pub use model::{MediaType, ReactionKind, Story, StoryUser};
pub use session::{
    create_engine_channels, EngineCommand, EngineEvent, PlaybackEngine, RenderFrame, SessionSpec,
};
