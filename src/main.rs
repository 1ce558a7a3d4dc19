// Example runner: drives a session with scripted landmarks instead of a camera.
// The eye stays open for a while, then closes for one frame.

use blink_unlock::synthetic::{ScriptedCamera, ScriptedVision};
use blink_unlock::{telemetry, LogSurface, Session, UnlockConfig};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> blink_unlock::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => UnlockConfig::load(path)?,
        None => UnlockConfig::from_env()?,
    };
    telemetry::init_tracing(&config.log_level);

    let layout = config.landmark_layout()?;
    let mut openings = vec![0.021, 0.019, 0.020, 0.018, 0.015, 0.011];
    openings.push(config.blink_threshold / 2.0);
    openings.push(0.020);

    let vision = ScriptedVision::from_openings_at(layout, config.eyelid_pair()?, &openings);
    let camera = ScriptedCamera::new(config.camera.width, config.camera.height, openings.len() as u64);
    let mut session = Session::new(config, vision, camera, LogSurface)?;

    if let Err(err) = session.boot().await {
        println!("Startup failed: {err}");
    }

    // No button in this runner; closing the channel lets `run` finish with the frames.
    let (control_tx, mut control_rx) = mpsc::unbounded_channel();
    drop(control_tx);
    let summary = session.run(&mut control_rx).await;

    println!(
        "Processed {} frames, unlocked: {}",
        summary.frames_processed,
        session.is_unlocked()
    );
    Ok(())
}
