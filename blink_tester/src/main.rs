mod camera;
mod convert;
mod vision;
#[cfg(not(feature = "web"))]
mod window;

use std::env;

use blink_unlock::{telemetry, CameraProvider, ControlEvent, Session, UiSurface, UnlockConfig, VisionProvider};
use camera::{CameraSource, OpenCvCamera};
use tokio::sync::mpsc;
use vision::LbfFaceVision;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: blink_tester <face_cascade.xml> <lbfmodel.yaml> [camera_index|video_path]");
        return Ok(());
    }
    let source = CameraSource::parse(args.get(3).map(String::as_str));

    let mut config = UnlockConfig::from_env()?;
    if env::var("BU_LAYOUT").is_err() {
        // LBF emits the 68-point annotation.
        config.layout = "ibug_68".to_string();
    }
    config.validate()?;
    telemetry::init_tracing(&config.log_level);

    // --- 2. Providers ---
    let vision = LbfFaceVision::new(&args[1], &args[2]);
    let camera = OpenCvCamera::new(source);
    let (control_tx, control_rx) = mpsc::unbounded_channel();

    // --- 3. Surface & Session ---
    #[cfg(feature = "web")]
    {
        use blink_unlock_visualizer::{start_server, ControlHandle, FrameBus, ServerConfig, WebSurface};

        let bind = env::var("BU_BIND").unwrap_or_else(|_| "127.0.0.1:3001".to_string());
        let bus = FrameBus::new(2);
        let _server = start_server(bus.clone(), ServerConfig { bind_addr: bind }, ControlHandle { unlock_tx: control_tx }).await?;
        return drive(config, vision, camera, WebSurface::new(bus), control_rx).await;
    }

    #[cfg(not(feature = "web"))]
    {
        // The window polls keys on its own thread, so `u` works even if the camera never starts.
        let (surface, window) = window::spawn(control_tx);
        tokio::select! {
            result = drive(config, vision, camera, surface, control_rx) => result,
            closed = window => {
                closed??;
                Ok(())
            }
        }
    }
}

async fn drive<V, C, U>(
    config: UnlockConfig,
    vision: V,
    camera: C,
    surface: U,
    mut control_rx: mpsc::UnboundedReceiver<ControlEvent>,
) -> anyhow::Result<()>
where
    V: VisionProvider,
    C: CameraProvider,
    U: UiSurface,
{
    let mut session = Session::new(config, vision, camera, surface)?;
    if let Err(err) = session.boot().await {
        // The manual path keeps working, so keep serving control events.
        tracing::error!(error = %err, "automatic gesture detection unavailable");
    }

    // --- 4. Main Processing Loop ---
    tokio::select! {
        summary = session.run(&mut control_rx) => {
            tracing::info!(?summary, unlocked = session.is_unlocked(), "session finished");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(unlocked = session.is_unlocked(), "interrupted");
        }
    }
    Ok(())
}
