//! Gesture classification state machine
//!
//! Classification priority: long-press (hold past the threshold without
//! leaving the touch slop) beats pan, pan beats tap. A release that fits
//! nothing else resolves to tap semantics, so every gesture yields at most
//! one navigation intent. The paired start/end intents of a long-press are
//! the only intents forwarded before the finger lifts.

use tokio::time::{Duration, Instant};

use crate::config::GestureConfig;

use super::{GestureIntent, TouchPhase, TouchSample};

/// Portion of the viewport width that maps a tap to "go back"
const TAP_LEFT_FRACTION: f32 = 1.0 / 3.0;

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    /// Finger down, still inside the touch slop, long-press arming
    Pending {
        origin: (f32, f32),
        started_at: Instant,
    },
    /// Long-press threshold crossed; classification is locked
    LongPress,
    /// Slop exceeded before the long-press threshold; pan in progress
    Panning {
        origin: (f32, f32),
        started_at: Instant,
        last: (f32, f32),
    },
}

/// Turns a raw touch stream into high-level gesture intents
#[derive(Debug)]
pub struct GestureArbiter {
    config: GestureConfig,
    phase: Phase,
}

impl GestureArbiter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
        }
    }

    /// Feed one raw sample; returns an intent when the gesture resolves
    pub fn handle(&mut self, sample: TouchSample, now: Instant) -> Option<GestureIntent> {
        match sample.phase {
            TouchPhase::Began => {
                // A Began while mid-gesture means the previous Ended was
                // lost; start over from the new touch.
                self.phase = Phase::Pending {
                    origin: (sample.x, sample.y),
                    started_at: now,
                };
                None
            }
            TouchPhase::Moved => {
                match self.phase {
                    Phase::Pending { origin, started_at } => {
                        if distance(origin, (sample.x, sample.y)) > self.config.touch_slop_px {
                            self.phase = Phase::Panning {
                                origin,
                                started_at,
                                last: (sample.x, sample.y),
                            };
                        }
                    }
                    Phase::Panning {
                        origin, started_at, ..
                    } => {
                        self.phase = Phase::Panning {
                            origin,
                            started_at,
                            last: (sample.x, sample.y),
                        };
                    }
                    // Movement after long-press lock or without a touch
                    // down carries no meaning.
                    Phase::LongPress | Phase::Idle => {}
                }
                None
            }
            TouchPhase::Ended => {
                let phase = std::mem::replace(&mut self.phase, Phase::Idle);
                match phase {
                    Phase::Idle => None,
                    Phase::Pending { .. } => Some(self.classify_tap(sample.x)),
                    Phase::LongPress => Some(GestureIntent::LongPressEnd),
                    Phase::Panning {
                        origin, started_at, ..
                    } => Some(self.resolve_pan(origin, (sample.x, sample.y), now - started_at)),
                }
            }
        }
    }

    /// Deadline at which a held touch becomes a long-press
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Pending { started_at, .. } => {
                Some(started_at + Duration::from_millis(self.config.long_press_ms))
            }
            _ => None,
        }
    }

    /// Fire the long-press deadline; returns the start intent when a held
    /// touch crosses the threshold.
    pub fn fire_deadline(&mut self, now: Instant) -> Option<GestureIntent> {
        if let Phase::Pending { started_at, .. } = self.phase {
            if now >= started_at + Duration::from_millis(self.config.long_press_ms) {
                self.phase = Phase::LongPress;
                return Some(GestureIntent::LongPressStart);
            }
        }
        None
    }

    fn classify_tap(&self, x: f32) -> GestureIntent {
        if x < self.config.viewport_width_px * TAP_LEFT_FRACTION {
            GestureIntent::TapLeft
        } else {
            GestureIntent::TapRight
        }
    }

    fn resolve_pan(
        &self,
        origin: (f32, f32),
        end: (f32, f32),
        elapsed: Duration,
    ) -> GestureIntent {
        let tx = end.0 - origin.0;
        let ty = end.1 - origin.1;
        let secs = elapsed.as_secs_f32().max(0.001);
        let vx = tx / secs;
        let vy = ty / secs;

        // Downward drag dismisses, overriding any horizontal component.
        if ty > self.config.dismiss_distance_px || vy > self.config.dismiss_velocity_px_s {
            return GestureIntent::Dismiss;
        }

        if tx.abs() > self.config.swipe_distance_px || vx.abs() > self.config.swipe_velocity_px_s {
            // Finger moving left reveals the next user.
            return if tx < 0.0 {
                GestureIntent::SwipeNext
            } else {
                GestureIntent::SwipePrev
            };
        }

        // Sub-threshold pan: fall back to tap semantics at the release
        // position.
        self.classify_tap(end.0)
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arbiter() -> GestureArbiter {
        GestureArbiter::new(GestureConfig::default())
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_buckets_by_viewport_third() {
        let mut arb = arbiter();
        let width = GestureConfig::default().viewport_width_px;
        let t0 = Instant::now();

        assert_eq!(arb.handle(TouchSample::began(10.0, 200.0), t0), None);
        assert_eq!(
            arb.handle(TouchSample::ended(10.0, 200.0), t0 + ms(50)),
            Some(GestureIntent::TapLeft)
        );

        assert_eq!(arb.handle(TouchSample::began(width * 0.5, 200.0), t0), None);
        assert_eq!(
            arb.handle(TouchSample::ended(width * 0.5, 200.0), t0 + ms(50)),
            Some(GestureIntent::TapRight)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_press_start_and_end() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.handle(TouchSample::began(100.0, 200.0), t0);
        let deadline = arb.deadline().expect("long-press should be arming");
        assert_eq!(deadline, t0 + ms(200));

        assert_eq!(arb.fire_deadline(deadline), Some(GestureIntent::LongPressStart));
        assert_eq!(arb.deadline(), None);

        assert_eq!(
            arb.handle(TouchSample::ended(100.0, 200.0), t0 + ms(1500)),
            Some(GestureIntent::LongPressEnd)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_before_threshold_is_a_tap_not_both() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.handle(TouchSample::began(300.0, 200.0), t0);
        // Released at 150ms, before the 200ms long-press threshold.
        assert_eq!(
            arb.handle(TouchSample::ended(300.0, 200.0), t0 + ms(150)),
            Some(GestureIntent::TapRight)
        );
        // The stale deadline must not fire after the release.
        assert_eq!(arb.fire_deadline(t0 + ms(250)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pan_beyond_slop_cancels_long_press() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.handle(TouchSample::began(200.0, 200.0), t0);
        arb.handle(TouchSample::moved(160.0, 200.0), t0 + ms(50));
        assert_eq!(arb.deadline(), None);
        assert_eq!(arb.fire_deadline(t0 + ms(250)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_horizontal_swipe_by_translation() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.handle(TouchSample::began(300.0, 200.0), t0);
        arb.handle(TouchSample::moved(150.0, 205.0), t0 + ms(100));
        assert_eq!(
            arb.handle(TouchSample::ended(150.0, 205.0), t0 + ms(400)),
            Some(GestureIntent::SwipeNext)
        );

        arb.handle(TouchSample::began(100.0, 200.0), t0 + ms(500));
        arb.handle(TouchSample::moved(260.0, 195.0), t0 + ms(600));
        assert_eq!(
            arb.handle(TouchSample::ended(260.0, 195.0), t0 + ms(900)),
            Some(GestureIntent::SwipePrev)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_short_swipe_resolves_by_velocity() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        // 80px in 60ms is under the distance threshold but well over the
        // velocity threshold.
        arb.handle(TouchSample::began(300.0, 200.0), t0);
        arb.handle(TouchSample::moved(220.0, 200.0), t0 + ms(30));
        assert_eq!(
            arb.handle(TouchSample::ended(220.0, 200.0), t0 + ms(60)),
            Some(GestureIntent::SwipeNext)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_vertical_drag_dismisses_and_overrides_horizontal() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.handle(TouchSample::began(200.0, 100.0), t0);
        arb.handle(TouchSample::moved(60.0, 350.0), t0 + ms(200));
        assert_eq!(
            arb.handle(TouchSample::ended(60.0, 350.0), t0 + ms(500)),
            Some(GestureIntent::Dismiss)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_upward_drag_does_not_dismiss() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.handle(TouchSample::began(200.0, 400.0), t0);
        arb.handle(TouchSample::moved(200.0, 100.0), t0 + ms(300));
        // Upward drag resolves to tap semantics, not dismissal.
        assert_eq!(
            arb.handle(TouchSample::ended(200.0, 100.0), t0 + ms(600)),
            Some(GestureIntent::TapRight)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_threshold_pan_falls_back_to_tap() {
        let mut arb = arbiter();
        let t0 = Instant::now();

        arb.handle(TouchSample::began(50.0, 200.0), t0);
        arb.handle(TouchSample::moved(80.0, 210.0), t0 + ms(200));
        assert_eq!(
            arb.handle(TouchSample::ended(80.0, 210.0), t0 + ms(700)),
            Some(GestureIntent::TapLeft)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_without_began_is_ignored() {
        let mut arb = arbiter();
        assert_eq!(
            arb.handle(TouchSample::ended(100.0, 100.0), Instant::now()),
            None
        );
    }
}
