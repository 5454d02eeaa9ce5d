//! storyreel demo driver
//!
//! Runs a scripted viewing session headlessly: builds a small sample
//! collection, spawns the playback engine, feeds it a sequence of
//! gestures, and logs every event the engine emits. Useful for watching
//! the state machine work without a presentation layer.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use storyreel::gesture::TouchSample;
use storyreel::media::{media_signal_channel, NullMediaHandle};
use storyreel::remote::{HttpStoryGateway, NoopGateway, StoryGateway};
use storyreel::session::{
    create_engine_channels, EngineCommand, EngineEvent, PlaybackEngine, SessionSpec,
};
use storyreel::{Config, Cursor, ReactionKind, Story, StoryUser};

fn main() -> Result<()> {
    let _log_guard = storyreel::logging::init_logging()?;

    info!("storyreel demo starting...");

    let config = Config::load()?;
    info!("Configuration loaded from {:?}", config.config_path()?);

    // Fall back to the no-op gateway when no endpoint is configured.
    let gateway: Arc<dyn StoryGateway> = match HttpStoryGateway::new(&config.gateway) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            info!("running offline: {}", e);
            Arc::new(NoopGateway)
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;

    let (cmd_tx, cmd_rx, event_tx, mut event_rx) = create_engine_channels();
    let (_media_tx, media_rx) = media_signal_channel();

    let mut engine = PlaybackEngine::new(
        config,
        SessionSpec {
            users: sample_collection(),
            viewer_id: "me".to_string(),
            initial: Cursor::ORIGIN,
        },
        Box::new(NullMediaHandle),
        gateway,
        cmd_rx,
        event_tx,
        media_rx,
    );

    // Ctrl+C closes the session cleanly instead of killing the process.
    let ctrl_c_tx = cmd_tx.clone();
    let ctrl_c_handle = runtime.handle().clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, closing session...");
        let tx = ctrl_c_tx.clone();
        ctrl_c_handle.spawn(async move {
            let _ = tx.send(EngineCommand::Close).await;
        });
    })?;

    runtime.block_on(async move {
        let engine_task = tokio::spawn(async move { engine.run().await });
        let script_task = tokio::spawn(run_script(cmd_tx));

        loop {
            match event_rx.recv().await {
                Ok(EngineEvent::Frame(frame)) => {
                    info!(
                        "frame: story {} at ({}, {}) progress {:.2} paused={} overlay={}",
                        frame.story_id,
                        frame.cursor.user,
                        frame.cursor.story,
                        frame.progress,
                        frame.paused,
                        frame.overlay_open
                    );
                }
                Ok(EngineEvent::StoryViewed { story_id }) => {
                    info!("viewed: {}", story_id);
                }
                Ok(EngineEvent::ReactionAccepted { story_id, reaction }) => {
                    info!("reaction on {}: {:?}", story_id, reaction);
                }
                Ok(EngineEvent::InsightsReady { story_id, report }) => {
                    info!(
                        "insights for {}: {} viewers, {} reactions",
                        story_id,
                        report.views_count,
                        report.reactions_count
                    );
                }
                Ok(EngineEvent::SessionClosed) => {
                    info!("session closed");
                    break;
                }
                Err(e) => {
                    warn!("event stream ended: {}", e);
                    break;
                }
            }
        }

        script_task.abort();
        let _ = engine_task.await;
    });

    info!("demo finished");
    Ok(())
}

/// Feed the engine a scripted gesture sequence
async fn run_script(cmd_tx: mpsc::Sender<EngineCommand>) {
    let sleep = |ms: u64| tokio::time::sleep(Duration::from_millis(ms));

    // Let the first story play for a bit, then react to it.
    sleep(1_500).await;
    let _ = cmd_tx.send(EngineCommand::React(ReactionKind::Fire)).await;

    // Tap forward.
    sleep(1_000).await;
    tap(&cmd_tx, 300.0).await;

    // Hold to pause, release after a second.
    sleep(800).await;
    let _ = cmd_tx
        .send(EngineCommand::Touch(TouchSample::began(200.0, 400.0)))
        .await;
    sleep(1_000).await;
    let _ = cmd_tx
        .send(EngineCommand::Touch(TouchSample::ended(200.0, 400.0)))
        .await;

    // Swipe to the next user, then let the session play out.
    sleep(1_200).await;
    swipe_left(&cmd_tx).await;
}

async fn tap(cmd_tx: &mpsc::Sender<EngineCommand>, x: f32) {
    let _ = cmd_tx
        .send(EngineCommand::Touch(TouchSample::began(x, 400.0)))
        .await;
    let _ = cmd_tx
        .send(EngineCommand::Touch(TouchSample::ended(x, 400.0)))
        .await;
}

async fn swipe_left(cmd_tx: &mpsc::Sender<EngineCommand>) {
    let _ = cmd_tx
        .send(EngineCommand::Touch(TouchSample::began(320.0, 400.0)))
        .await;
    let _ = cmd_tx
        .send(EngineCommand::Touch(TouchSample::moved(140.0, 405.0)))
        .await;
    let _ = cmd_tx
        .send(EngineCommand::Touch(TouchSample::ended(140.0, 405.0)))
        .await;
}

/// A small fixed collection: the viewer's own story followed by two
/// other users.
fn sample_collection() -> Vec<StoryUser> {
    vec![
        StoryUser::new("ana", vec![Story::image("ana-1"), Story::video("ana-2", 6.0)]),
        StoryUser::new("me", vec![Story::image("me-1")]),
        StoryUser::new("luis", vec![Story::image("luis-1"), Story::image("luis-2")]),
    ]
}
