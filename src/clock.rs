//! Progress clock driving timed story advancement
//!
//! A one-shot deadline the engine's select loop sleeps on. The clock is
//! started when a story is entered and cancelled whenever playback is
//! suspended; resume starts a fresh clock from zero rather than resuming
//! the paused fraction. Exactly one completion is observed per start:
//! `complete` clears the deadline as it reports it.

use tokio::time::{Duration, Instant};

use crate::config::PlaybackConfig;
use crate::model::{MediaType, Story};

#[derive(Debug, Clone, Copy)]
struct ClockState {
    started_at: Instant,
    deadline: Instant,
    duration: Duration,
}

/// Suspendable playback deadline with a normalized progress query
#[derive(Debug, Default)]
pub struct ProgressClock {
    state: Option<ClockState>,
}

impl ProgressClock {
    pub fn new() -> Self {
        Self { state: None }
    }

    /// Arm the clock for `duration` from now, replacing any running clock
    pub fn start(&mut self, duration: Duration) {
        let now = Instant::now();
        self.state = Some(ClockState {
            started_at: now,
            deadline: now + duration,
            duration,
        });
    }

    /// Disarm the clock; idempotent
    pub fn cancel(&mut self) {
        self.state = None;
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    /// Deadline for the engine loop to sleep on, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.state.map(|s| s.deadline)
    }

    /// Consume a completion: returns true exactly once per start, when the
    /// deadline has been reached, and disarms the clock.
    pub fn complete(&mut self, now: Instant) -> bool {
        match self.state {
            Some(s) if now >= s.deadline => {
                self.state = None;
                true
            }
            _ => false,
        }
    }

    /// Normalized [0, 1] completion of the running clock
    pub fn progress(&self, now: Instant) -> Option<f32> {
        self.state.map(|s| {
            let elapsed = now.saturating_duration_since(s.started_at).as_secs_f32();
            let total = s.duration.as_secs_f32();
            if total <= f32::EPSILON {
                1.0
            } else {
                (elapsed / total).clamp(0.0, 1.0)
            }
        })
    }
}

/// Display duration for a story.
///
/// Images use the fixed configured duration. Videos use their own media
/// duration, falling back to the configured default when it is missing or
/// not a positive number.
pub fn story_duration(story: &Story, playback: &PlaybackConfig) -> Duration {
    match story.media_type {
        MediaType::Image => Duration::from_millis(playback.image_duration_ms),
        MediaType::Video => match story.media_duration_seconds {
            Some(secs) if secs > 0.0 => Duration::from_secs_f64(secs),
            _ => Duration::from_millis(playback.video_fallback_duration_ms),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Story;

    #[test]
    fn test_image_duration_uses_fixed_default() {
        let playback = PlaybackConfig::default();
        let story = Story::image("s1");
        assert_eq!(
            story_duration(&story, &playback),
            Duration::from_millis(playback.image_duration_ms)
        );
    }

    #[test]
    fn test_video_duration_uses_media_duration() {
        let playback = PlaybackConfig::default();
        let story = Story::video("s1", 8.0);
        assert_eq!(story_duration(&story, &playback), Duration::from_secs(8));
    }

    #[test]
    fn test_video_without_duration_falls_back() {
        let playback = PlaybackConfig::default();
        let mut story = Story::video("s1", 8.0);
        story.media_duration_seconds = None;
        assert_eq!(
            story_duration(&story, &playback),
            Duration::from_millis(playback.video_fallback_duration_ms)
        );

        story.media_duration_seconds = Some(0.0);
        assert_eq!(
            story_duration(&story, &playback),
            Duration::from_millis(playback.video_fallback_duration_ms)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_normalized() {
        let mut clock = ProgressClock::new();
        clock.start(Duration::from_secs(10));

        assert_eq!(clock.progress(Instant::now()), Some(0.0));

        tokio::time::advance(Duration::from_secs(5)).await;
        let mid = clock.progress(Instant::now()).unwrap();
        assert!((mid - 0.5).abs() < 0.01, "expected ~0.5, got {mid}");

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(clock.progress(Instant::now()), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_fires_exactly_once() {
        let mut clock = ProgressClock::new();
        clock.start(Duration::from_secs(1));

        assert!(!clock.complete(Instant::now()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(clock.complete(Instant::now()));
        assert!(!clock.complete(Instant::now()));
        assert!(!clock.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let mut clock = ProgressClock::new();
        clock.start(Duration::from_secs(1));

        clock.cancel();
        clock.cancel();
        assert!(!clock.is_running());
        assert_eq!(clock.deadline(), None);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!clock.complete(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_deadline() {
        let mut clock = ProgressClock::new();
        clock.start(Duration::from_secs(8));

        tokio::time::advance(Duration::from_secs(2)).await;
        clock.cancel();
        clock.start(Duration::from_secs(8));

        // A fresh full-length clock, not a 6s remainder.
        assert_eq!(clock.progress(Instant::now()), Some(0.0));
        assert_eq!(
            clock.deadline(),
            Some(Instant::now() + Duration::from_secs(8))
        );
    }
}
