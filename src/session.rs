// THEORY:
// A `Session` owns the two external providers and the `GestureController`, and runs
// the startup sequence in a strict order:
//
//   Loading  -> the landmark provider is configured with the fixed vision options
//   Ready    -> the controller is bound as the per-frame callback, camera requested
//   Active   -> frames flow, the video is shown, the canvas matches the native size
//   Failed   -> the camera or provider refused; the reason is on the status line
//
// Binding the controller happens by construction: a `Session` cannot exist without
// one, so no frame can ever reach the landmark provider before the callback is in
// place.
//
// A camera that cannot tell its size up front still reaches `Active`; the canvas is
// then sized from the first frame that arrives.
//
// Once booted, `run` drives the frame loop. Exactly one frame is in flight: the next
// frame is requested only after the previous one has been processed and handed to
// the controller. Manual control events are raced against the camera wait and take
// priority. A failed session keeps servicing manual events so the fallback button
// still works without a camera.

use crate::config::UnlockConfig;
use crate::controller::{GestureController, MANUAL_REASON};
use crate::core_modules::status::StatusMessage;
use crate::error::{BootError, CameraError, Result};
use crate::providers::{CameraProvider, Frame, VideoMetadata, VisionProvider};
use crate::ui::UiSurface;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// User actions delivered from outside the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// The fallback button was pressed.
    ManualUnlock,
}

/// The linear startup state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootPhase {
    Loading,
    Ready,
    Active(VideoMetadata),
    Failed(BootError),
}

/// Totals for a finished `run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub control_events: u64,
}

pub struct Session<V, C, U> {
    config: UnlockConfig,
    vision: V,
    camera: C,
    controller: GestureController<U>,
    phase: BootPhase,
}

impl<V, C, U> Session<V, C, U>
where
    V: VisionProvider,
    C: CameraProvider,
    U: UiSurface,
{
    pub fn new(config: UnlockConfig, vision: V, camera: C, surface: U) -> Result<Self> {
        let controller = GestureController::new(&config, surface)?;
        Ok(Self { config, vision, camera, controller, phase: BootPhase::Loading })
    }

    /// Configures the landmark provider and starts the camera.
    ///
    /// On failure the phase becomes `Failed`, the status line explains why and the
    /// controller stays usable through `manual_unlock`.
    pub async fn boot(&mut self) -> std::result::Result<VideoMetadata, BootError> {
        self.phase = BootPhase::Loading;
        self.controller.surface_mut().set_status(&StatusMessage::Loading);

        if let Err(err) = self.vision.configure(&self.config.vision) {
            return Err(self.fail(err.into()));
        }
        self.phase = BootPhase::Ready;
        self.controller.surface_mut().set_status(&StatusMessage::Ready);
        info!(options = ?self.config.vision, "landmark provider configured");

        match self.camera.start(&self.config.camera).await {
            Ok(metadata) => {
                self.controller.surface_mut().show_video();
                if metadata.is_known() {
                    self.controller.resize_canvas(metadata.width, metadata.height);
                } else {
                    warn!("camera did not report its resolution, sizing the canvas from the first frame");
                }
                self.controller.surface_mut().set_status(&StatusMessage::CameraActive);
                self.phase = BootPhase::Active(metadata);
                info!(width = metadata.width, height = metadata.height, "camera active");
                Ok(metadata)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Drives the session until there is nothing left to react to.
    ///
    /// While `Active` this processes frames and control events. It leaves the frame
    /// loop when the camera source is exhausted or fails, and then keeps handling
    /// control events until the channel closes.
    pub async fn run(&mut self, control: &mut mpsc::UnboundedReceiver<ControlEvent>) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut control_open = true;

        while matches!(self.phase, BootPhase::Active(_)) {
            tokio::select! {
                biased;
                event = control.recv(), if control_open => match event {
                    Some(event) => {
                        summary.control_events += 1;
                        self.handle_control(event);
                    }
                    None => control_open = false,
                },
                frame = self.camera.next_frame() => match frame {
                    Ok(Some(frame)) => {
                        self.adopt_frame_size(&frame);
                        match self.vision.process_frame(&frame).await {
                            Ok(results) => {
                                self.controller.on_frame(&results);
                                summary.frames_processed += 1;
                            }
                            Err(err) => {
                                warn!(frame_id = frame.frame_id, error = %err, "frame skipped");
                                summary.frames_skipped += 1;
                            }
                        }
                    }
                    Ok(None) => {
                        info!(frames = summary.frames_processed, "frame source exhausted");
                        break;
                    }
                    Err(err) => {
                        self.fail(err.into());
                    }
                },
            }
        }

        while control_open {
            match control.recv().await {
                Some(event) => {
                    summary.control_events += 1;
                    self.handle_control(event);
                }
                None => control_open = false,
            }
        }
        summary
    }

    pub fn handle_control(&mut self, event: ControlEvent) -> bool {
        match event {
            ControlEvent::ManualUnlock => self.manual_unlock(),
        }
    }

    /// The fallback button. Works in every phase.
    pub fn manual_unlock(&mut self) -> bool {
        self.controller.unlock(MANUAL_REASON)
    }

    pub fn phase(&self) -> &BootPhase {
        &self.phase
    }

    pub fn controller(&self) -> &GestureController<U> {
        &self.controller
    }

    pub fn is_unlocked(&self) -> bool {
        self.controller.is_unlocked()
    }

    pub fn into_parts(self) -> (V, C, GestureController<U>) {
        (self.vision, self.camera, self.controller)
    }

    fn adopt_frame_size(&mut self, frame: &Frame) {
        let BootPhase::Active(metadata) = &mut self.phase else {
            return;
        };
        let (width, height) = frame.image.dimensions();
        if metadata.is_known() || width == 0 || height == 0 {
            return;
        }
        *metadata = VideoMetadata { width, height };
        self.controller.resize_canvas(width, height);
        info!(width, height, "canvas sized from the first frame");
    }

    fn fail(&mut self, err: BootError) -> BootError {
        let streaming = matches!(self.phase, BootPhase::Active(_));
        if streaming {
            error!(error = %err, "camera stopped while running");
        } else {
            error!(error = %err, "camera/vision startup failed");
        }
        let status = match &err {
            BootError::Camera(CameraError::Unsupported) => StatusMessage::Unsupported,
            other if streaming => StatusMessage::CameraLost { message: other.to_string() },
            other => StatusMessage::CameraError { message: other.to_string() },
        };
        self.controller.surface_mut().set_status(&status);
        self.phase = BootPhase::Failed(err.clone());
        err
    }
}
