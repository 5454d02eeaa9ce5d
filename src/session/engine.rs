//! Playback engine
//!
//! Coordinates the progress clock, gesture arbitration, and navigation
//! cursor into a single serialized state machine. Three independent event
//! sources (gesture intents, clock completion, media "ended" signals) feed
//! one `tokio::select!` loop; the engine is the only writer of cursor and
//! playback state and the only caller into the media handle.
//!
//! Suspension is expressed as clock cancellation: pause and the insights
//! overlay each stop the clock, and resume starts a fresh one from zero.
//! Gateway calls run on spawned tasks and never block a transition.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::clock::{story_duration, ProgressClock};
use crate::config::{Config, PlaybackConfig};
use crate::cursor::{self, Cursor, Step};
use crate::gesture::{GestureArbiter, GestureIntent};
use crate::media::{MediaHandle, MediaSignal};
use crate::model::{ReactionKind, Story, StoryUser};
use crate::remote::{InsightsReport, StoryGateway};

use super::{EngineCommand, EngineEvent, RenderFrame};

/// What triggered an advance request
#[derive(Debug, Clone, Copy)]
enum AdvanceReason {
    /// The progress clock ran out
    ClockElapsed,
    /// The media player reported the end of the current video
    MediaEnded,
}

/// Replies from spawned gateway tasks, fed back into the engine loop
#[derive(Debug)]
enum GatewayReply {
    ReactionAccepted {
        story_id: String,
        reaction: ReactionKind,
    },
    Insights {
        story_id: String,
        report: InsightsReport,
    },
}

/// Inputs that define one viewing session
#[derive(Debug, Clone)]
pub struct SessionSpec {
    /// The ordered user/story collection, supplied whole by the feed
    pub users: Vec<StoryUser>,

    /// The viewer's own user id (injected; the engine never reads
    /// ambient session state)
    pub viewer_id: String,

    /// Requested starting position; clamped if the collection changed
    /// since selection
    pub initial: Cursor,
}

/// The playback engine drives one viewing session
pub struct PlaybackEngine {
    /// Playback timing configuration
    playback: PlaybackConfig,
    /// Session identifier for log correlation
    session_id: String,
    /// The viewer's own user id
    viewer_id: String,
    /// Session-local copy of the collection; viewed flags mutate here
    users: Vec<StoryUser>,
    /// Authoritative position of the displayed story
    cursor: Cursor,
    /// Progress clock for timed advancement
    clock: ProgressClock,
    /// Raw-touch classifier
    arbiter: GestureArbiter,
    /// Opaque media player for the displayed story
    media: Box<dyn MediaHandle>,
    /// Network collaborator for views, reactions, insights
    gateway: Arc<dyn StoryGateway>,
    /// Whether a long-press hold is suspending playback
    paused_by_user: bool,
    /// Whether the insights overlay is suspending playback
    overlay_open: bool,
    /// Terminal flag; set once, never cleared
    ended: bool,
    /// The viewer's reaction to the displayed story
    reaction: Option<ReactionKind>,
    /// Insights report for the displayed story, when fetched
    insights: Option<InsightsReport>,
    /// Last observed progress, retained across suspension
    progress_at_suspend: f32,
    /// Command receiver
    cmd_rx: mpsc::Receiver<EngineCommand>,
    /// Event broadcaster
    event_tx: broadcast::Sender<EngineEvent>,
    /// Media signal receiver
    media_rx: mpsc::UnboundedReceiver<MediaSignal>,
    /// Sender handed to spawned gateway tasks
    reply_tx: mpsc::UnboundedSender<GatewayReply>,
    /// Reply receiver (taken once when run() starts)
    reply_rx: Option<mpsc::UnboundedReceiver<GatewayReply>>,
}

impl PlaybackEngine {
    /// Create a new playback engine for one session
    pub fn new(
        config: Config,
        spec: SessionSpec,
        media: Box<dyn MediaHandle>,
        gateway: Arc<dyn StoryGateway>,
        cmd_rx: mpsc::Receiver<EngineCommand>,
        event_tx: broadcast::Sender<EngineEvent>,
        media_rx: mpsc::UnboundedReceiver<MediaSignal>,
    ) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();

        Self {
            playback: config.playback,
            session_id: uuid::Uuid::new_v4().to_string(),
            viewer_id: spec.viewer_id,
            users: spec.users,
            cursor: spec.initial,
            clock: ProgressClock::new(),
            arbiter: GestureArbiter::new(config.gesture),
            media,
            gateway,
            paused_by_user: false,
            overlay_open: false,
            ended: false,
            reaction: None,
            insights: None,
            progress_at_suspend: 0.0,
            cmd_rx,
            event_tx,
            media_rx,
            reply_tx,
            reply_rx: Some(reply_rx),
        }
    }

    /// Run the engine main loop until the session ends
    pub async fn run(&mut self) {
        let mut reply_rx = match self.reply_rx.take() {
            Some(rx) => rx,
            None => {
                warn!("playback engine run() called twice");
                return;
            }
        };

        // An unusable initial position is clamped; a collection with
        // nothing to play declines the session outright.
        let Some(initial) = cursor::clamp_initial(&self.users, self.cursor) else {
            warn!(
                "session {}: collection has no playable stories, declining to start",
                self.session_id
            );
            self.ended = true;
            let _ = self.event_tx.send(EngineEvent::SessionClosed);
            return;
        };

        if initial != self.cursor {
            debug!(
                "session {}: initial position {:?} clamped to {:?}",
                self.session_id, self.cursor, initial
            );
        }

        info!(
            "session {} starting: {} users, viewer {}",
            self.session_id,
            self.users.len(),
            self.viewer_id
        );

        self.enter_story(initial);

        loop {
            if self.ended {
                break;
            }

            let clock_deadline = self.clock.deadline();
            let gesture_deadline = self.arbiter.deadline();

            tokio::select! {
                // Handle commands from the presentation layer
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            debug!("command channel closed, closing session");
                            self.close_session();
                        }
                    }
                }

                // Apply gateway replies from spawned tasks
                Some(reply) = reply_rx.recv() => {
                    self.handle_gateway_reply(reply);
                }

                // Media "ended" signals (backup advancement trigger)
                Some(signal) = self.media_rx.recv() => {
                    self.handle_media_signal(signal);
                }

                // Timed advancement: the clock is the source of truth
                _ = async {
                    match clock_deadline {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                } => {
                    self.handle_clock_elapsed();
                }

                // A held touch crossing the long-press threshold
                _ = async {
                    match gesture_deadline {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                } => {
                    if let Some(intent) = self.arbiter.fire_deadline(Instant::now()) {
                        self.handle_intent(intent);
                    }
                }
            }
        }

        info!("session {} ended", self.session_id);
    }

    /// Dispatch one command
    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Touch(sample) => {
                if let Some(intent) = self.arbiter.handle(sample, Instant::now()) {
                    self.handle_intent(intent);
                }
            }
            EngineCommand::OpenInsights => self.open_insights(),
            EngineCommand::CloseInsights => self.close_insights(),
            EngineCommand::React(kind) => self.submit_reaction(kind),
            EngineCommand::Close => {
                debug!("close requested by caller");
                self.close_session();
            }
        }
    }

    /// Apply one resolved gesture intent
    fn handle_intent(&mut self, intent: GestureIntent) {
        if self.ended {
            return;
        }
        debug!("gesture intent: {:?}", intent);

        match intent {
            GestureIntent::LongPressStart => self.pause_by_user(),
            GestureIntent::LongPressEnd => self.resume_from_pause(),
            GestureIntent::Dismiss => self.close_session(),
            GestureIntent::TapRight => self.navigate(cursor::advance),
            GestureIntent::TapLeft => self.navigate(cursor::retreat),
            GestureIntent::SwipeNext => self.navigate(cursor::next_user),
            GestureIntent::SwipePrev => self.navigate(cursor::prev_user),
        }
    }

    /// Run a cursor transition for a navigation intent
    ///
    /// Navigation is defined from the playing state only; while suspended
    /// (long-press hold or overlay) taps and swipes are dropped.
    fn navigate(&mut self, transition: fn(&[StoryUser], &str, Cursor) -> Step) {
        if self.is_suspended() {
            debug!("navigation intent ignored while suspended");
            return;
        }
        let step = transition(&self.users, &self.viewer_id, self.cursor);
        self.apply_step(step);
    }

    fn apply_step(&mut self, step: Step) {
        match step {
            Step::Moved(next) => self.enter_story(next),
            Step::End => self.close_session(),
            // Boundary no-op (cannot retreat past the first user); the
            // running clock is untouched.
            Step::Stay => {}
        }
    }

    /// Make `at` the displayed story: reset per-story state, emit the
    /// viewed notification, restart the clock, and start the media.
    fn enter_story(&mut self, at: Cursor) {
        self.cursor = at;
        self.insights = None;
        self.progress_at_suspend = 0.0;

        let (story_id, duration, reaction) = {
            let story = self.current_story();
            (
                story.id.clone(),
                story_duration(story, &self.playback),
                story.user_reaction,
            )
        };
        self.reaction = reaction;

        debug!(
            "session {}: entering story {} at {:?} ({:?})",
            self.session_id, story_id, at, duration
        );

        self.mark_viewed();
        self.clock.start(duration);
        self.media.play();
        self.emit_frame();
    }

    /// Emit the viewed notification for the displayed story, at most once
    /// per story per session (guarded by the story's own viewed flag).
    fn mark_viewed(&mut self) {
        let story = &mut self.users[self.cursor.user].stories[self.cursor.story];
        if story.is_viewed {
            return;
        }
        story.is_viewed = true;
        let story_id = story.id.clone();

        let gateway = self.gateway.clone();
        let id = story_id.clone();
        tokio::spawn(async move {
            if let Err(e) = gateway.mark_story_viewed(&id).await {
                warn!("failed to mark story {} viewed: {}", id, e);
            }
        });

        let _ = self.event_tx.send(EngineEvent::StoryViewed { story_id });
    }

    /// Advance the cursor; clock completion and media "ended" unify here
    fn request_advance(&mut self, reason: AdvanceReason) {
        debug!("advance requested: {:?}", reason);
        let step = cursor::advance(&self.users, &self.viewer_id, self.cursor);
        self.apply_step(step);
    }

    fn handle_clock_elapsed(&mut self) {
        if !self.clock.complete(Instant::now()) {
            return;
        }
        self.request_advance(AdvanceReason::ClockElapsed);
    }

    fn handle_media_signal(&mut self, signal: MediaSignal) {
        if self.ended {
            return;
        }
        match signal {
            MediaSignal::Ended { story_id } => {
                // A signal for a story the cursor already left is late;
                // the clock-driven advance won the race.
                if story_id != self.current_story().id {
                    debug!("stale media-ended for story {} ignored", story_id);
                    return;
                }
                if self.is_suspended() {
                    debug!("media ended while suspended; ignoring");
                    return;
                }
                self.request_advance(AdvanceReason::MediaEnded);
            }
        }
    }

    fn pause_by_user(&mut self) {
        if self.ended || self.paused_by_user {
            // Pause is idempotent.
            return;
        }
        let was_suspended = self.is_suspended();
        self.paused_by_user = true;
        if !was_suspended {
            self.suspend_playback();
        }
        self.emit_frame();
    }

    fn resume_from_pause(&mut self) {
        if self.ended || !self.paused_by_user {
            // Resume without a pause is a no-op.
            return;
        }
        self.paused_by_user = false;
        if !self.is_suspended() {
            self.resume_playback();
        }
        self.emit_frame();
    }

    /// Open the insights overlay; only the story owner may
    fn open_insights(&mut self) {
        if self.ended || self.overlay_open {
            return;
        }
        if self.users[self.cursor.user].user_id != self.viewer_id {
            debug!("insights requested for another user's story, ignoring");
            return;
        }

        let was_suspended = self.is_suspended();
        self.overlay_open = true;
        if !was_suspended {
            self.suspend_playback();
        }

        // Lazy fetch: only when the overlay actually opens.
        let story_id = self.current_story().id.clone();
        let gateway = self.gateway.clone();
        let reply_tx = self.reply_tx.clone();
        tokio::spawn(async move {
            match gateway.fetch_insights(&story_id).await {
                Ok(report) => {
                    let _ = reply_tx.send(GatewayReply::Insights { story_id, report });
                }
                Err(e) => {
                    warn!("failed to fetch insights for story {}: {}", story_id, e);
                }
            }
        });

        self.emit_frame();
    }

    /// Close the insights overlay; playback resumes only if no
    /// independent long-press hold remains.
    fn close_insights(&mut self) {
        if self.ended || !self.overlay_open {
            return;
        }
        self.overlay_open = false;
        if !self.is_suspended() {
            self.resume_playback();
        }
        self.emit_frame();
    }

    /// Submit a reaction for the displayed story, applied optimistically
    /// and reconciled when the gateway replies.
    fn submit_reaction(&mut self, kind: ReactionKind) {
        if self.ended {
            return;
        }

        let story = &mut self.users[self.cursor.user].stories[self.cursor.story];
        story.user_reaction = Some(kind);
        let story_id = story.id.clone();
        self.reaction = Some(kind);

        let gateway = self.gateway.clone();
        let reply_tx = self.reply_tx.clone();
        tokio::spawn(async move {
            match gateway.submit_reaction(&story_id, kind).await {
                Ok(accepted) => {
                    let _ = reply_tx.send(GatewayReply::ReactionAccepted {
                        story_id,
                        reaction: accepted,
                    });
                }
                Err(e) => {
                    warn!("failed to submit reaction for story {}: {}", story_id, e);
                }
            }
        });

        self.emit_frame();
    }

    fn handle_gateway_reply(&mut self, reply: GatewayReply) {
        match reply {
            GatewayReply::ReactionAccepted { story_id, reaction } => {
                if let Some(story) = self.find_story_mut(&story_id) {
                    story.user_reaction = Some(reaction);
                }
                if !self.ended && self.current_story().id == story_id {
                    self.reaction = Some(reaction);
                    self.emit_frame();
                }
                let _ = self
                    .event_tx
                    .send(EngineEvent::ReactionAccepted { story_id, reaction });
            }
            GatewayReply::Insights { story_id, report } => {
                if !self.ended && self.overlay_open && self.current_story().id == story_id {
                    self.insights = Some(report.clone());
                    self.emit_frame();
                }
                let _ = self
                    .event_tx
                    .send(EngineEvent::InsightsReady { story_id, report });
            }
        }
    }

    /// End the session. The clock is cancelled and the media paused
    /// synchronously before anyone hears about the close, so no orphaned
    /// timer fires into a torn-down view.
    fn close_session(&mut self) {
        if self.ended {
            return;
        }
        self.clock.cancel();
        self.media.pause();
        self.ended = true;

        info!("session {} closing", self.session_id);
        self.emit_frame();
        let _ = self.event_tx.send(EngineEvent::SessionClosed);
    }

    fn suspend_playback(&mut self) {
        if let Some(progress) = self.clock.progress(Instant::now()) {
            self.progress_at_suspend = progress;
        }
        self.clock.cancel();
        self.media.pause();
    }

    /// Resume with a fresh full-length clock (restart from zero, not from
    /// the paused fraction).
    fn resume_playback(&mut self) {
        let duration = story_duration(self.current_story(), &self.playback);
        self.progress_at_suspend = 0.0;
        self.clock.start(duration);
        self.media.play();
    }

    fn is_suspended(&self) -> bool {
        self.paused_by_user || self.overlay_open
    }

    fn current_story(&self) -> &Story {
        &self.users[self.cursor.user].stories[self.cursor.story]
    }

    fn find_story_mut(&mut self, story_id: &str) -> Option<&mut Story> {
        self.users
            .iter_mut()
            .flat_map(|u| u.stories.iter_mut())
            .find(|s| s.id == story_id)
    }

    fn emit_frame(&mut self) {
        let progress = self
            .clock
            .progress(Instant::now())
            .unwrap_or(self.progress_at_suspend);
        let story = self.current_story();

        let frame = RenderFrame {
            cursor: self.cursor,
            story_id: story.id.clone(),
            media_type: story.media_type,
            paused: self.paused_by_user,
            overlay_open: self.overlay_open,
            reaction: self.reaction,
            progress,
            insights: if self.overlay_open {
                self.insights.clone()
            } else {
                None
            },
            ended: self.ended,
        };

        let _ = self.event_tx.send(EngineEvent::Frame(frame));
    }
}

/// Create command and event channels for the engine
pub fn create_engine_channels() -> (
    mpsc::Sender<EngineCommand>,
    mpsc::Receiver<EngineCommand>,
    broadcast::Sender<EngineEvent>,
    broadcast::Receiver<EngineEvent>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, event_rx) = broadcast::channel(16);
    (cmd_tx, cmd_rx, event_tx, event_rx)
}
