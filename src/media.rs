//! Media handle seam
//!
//! The engine never decodes or renders media; it only tells an opaque
//! player to play or pause and listens for "ended" signals on a channel.
//! The clock remains the authoritative advancement trigger, so a player
//! that never reports "ended" only loses its backup path.

use tokio::sync::mpsc;

use tracing::debug;

/// Signals emitted by the media player
#[derive(Debug, Clone)]
pub enum MediaSignal {
    /// Playback of a video story reached its end.
    ///
    /// Carries the story id the player was showing so the engine can drop
    /// signals that arrive after the cursor has already moved on.
    Ended { story_id: String },
}

/// Opaque play/pause-capable unit for the currently displayed story
pub trait MediaHandle: Send {
    /// Begin or resume playback of the current story's media
    fn play(&mut self);

    /// Suspend playback of the current story's media
    fn pause(&mut self);
}

/// Media handle that does nothing; for image-only sessions, tests, and
/// headless runs.
#[derive(Debug, Default)]
pub struct NullMediaHandle;

impl MediaHandle for NullMediaHandle {
    fn play(&mut self) {
        debug!("media: play (null handle)");
    }

    fn pause(&mut self) {
        debug!("media: pause (null handle)");
    }
}

/// Create the channel a player uses to deliver media signals to the engine
pub fn media_signal_channel() -> (
    mpsc::UnboundedSender<MediaSignal>,
    mpsc::UnboundedReceiver<MediaSignal>,
) {
    mpsc::unbounded_channel()
}
