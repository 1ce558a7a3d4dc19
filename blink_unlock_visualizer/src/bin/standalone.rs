use std::time::Duration;

use blink_unlock::synthetic::{ScriptedCamera, ScriptedVision};
use blink_unlock::{telemetry, CameraProvider, Frame, CameraError, Session, UnlockConfig, VideoMetadata};
use blink_unlock::config::CameraOptions;
use blink_unlock_visualizer::{serve_session, start_server, ControlHandle, FrameBus, ServerConfig, WebSurface};
use tokio::sync::mpsc;

/// Paces an inner camera to a fixed frame rate.
struct PacedCamera<C> {
    inner: C,
    ticker: tokio::time::Interval,
}

impl<C: CameraProvider> CameraProvider for PacedCamera<C> {
    async fn start(&mut self, options: &CameraOptions) -> Result<VideoMetadata, CameraError> {
        self.inner.start(options).await
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        self.ticker.tick().await;
        self.inner.next_frame().await
    }
}

// Serves the page over a scripted session with the eyes always open, so the
// manual button is the only way to unlock. Useful to try the page without a camera.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = UnlockConfig::from_env()?;
    telemetry::init_tracing(&config.log_level);

    // Bind address from env or default
    let bind = std::env::var("BU_BIND").unwrap_or_else(|_| "127.0.0.1:3001".to_string());

    let bus = FrameBus::new(2);
    let (unlock_tx, mut unlock_rx) = mpsc::unbounded_channel();
    let server = start_server(bus.clone(), ServerConfig { bind_addr: bind }, ControlHandle { unlock_tx }).await?;

    let frames = 15 * 60 * 10;
    let openings = vec![0.02; frames];
    let vision = ScriptedVision::from_openings_at(config.landmark_layout()?, config.eyelid_pair()?, &openings);
    let camera = PacedCamera {
        inner: ScriptedCamera::new(config.camera.width, config.camera.height, frames as u64),
        ticker: tokio::time::interval(Duration::from_millis(66)),
    };
    let mut session = Session::new(config, vision, camera, WebSurface::new(bus))?;

    let summary = serve_session(&mut session, &mut unlock_rx).await;
    tracing::info!(?summary, "session finished");

    server.await.ok();
    Ok(())
}
