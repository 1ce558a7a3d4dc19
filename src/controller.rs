// THEORY:
// The `GestureController` is the per-frame callback of the system and the sole owner
// of the unlock state. For every frame it:
// 1.  redraws the debug canvas and hands it to the UI surface,
// 2.  measures the vertical gap between the watched eyelid landmarks,
// 3.  publishes that measurement next to the threshold so a person can calibrate,
// 4.  unlocks when the gap is strictly below the threshold.
//
// The check is memoryless. Nothing is carried across frames, so a single closed-eye
// frame is enough and a noisy frame can trigger it just the same.
//
// `unlock` is the only path to the `Unlocked` state. It is shared by the gesture
// check and the manual button, and only its first call has any effect.

use crate::config::{UnlockConfig, UnlockedContent};
use crate::core_modules::landmark::FrameResults;
use crate::core_modules::layout::{EyelidPair, LandmarkLayout};
use crate::core_modules::overlay::DebugCanvas;
use crate::core_modules::status::StatusMessage;
use crate::core_modules::unlock_state::{UnlockCell, UnlockState};
use crate::error::Result;
use crate::ui::UiSurface;
use image::RgbaImage;
use tracing::{debug, info, warn};

pub const GESTURE_REASON: &str = "gesture";
pub const MANUAL_REASON: &str = "manual";

pub struct GestureController<U> {
    threshold: f64,
    eyelids: EyelidPair,
    layout: &'static LandmarkLayout,
    max_faces: usize,
    content: UnlockedContent,
    cell: UnlockCell,
    canvas: DebugCanvas,
    surface: U,
}

impl<U: UiSurface> GestureController<U> {
    pub fn new(config: &UnlockConfig, surface: U) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            threshold: config.blink_threshold,
            eyelids: config.eyelid_pair()?,
            layout: config.landmark_layout()?,
            max_faces: config.vision.max_faces,
            content: config.content.clone(),
            cell: UnlockCell::new(),
            canvas: DebugCanvas::new(config.camera.width, config.camera.height),
            surface,
        })
    }

    /// Handles one frame of provider output.
    ///
    /// Returns the last eye opening measured this frame, or `None` when no
    /// measurement was taken.
    pub fn on_frame(&mut self, results: &FrameResults) -> Option<f64> {
        self.canvas.render(results, self.layout);
        self.surface.present_frame(self.canvas.image());

        let mut measured = None;
        for (face, landmarks) in results.landmark_sets.iter().take(self.max_faces).enumerate() {
            if self.cell.is_unlocked() {
                break;
            }
            let Some(eye_opening) = self.eyelids.opening(landmarks) else {
                warn!(
                    face,
                    points = landmarks.len(),
                    upper = self.eyelids.upper,
                    lower = self.eyelids.lower,
                    "landmark set is missing the eyelid points, skipping"
                );
                continue;
            };
            debug!(face, eye_opening, threshold = self.threshold, "eye opening measured");
            measured = Some(eye_opening);

            self.surface.set_status(&StatusMessage::Calibration { eye_opening, threshold: self.threshold });
            if eye_opening < self.threshold {
                self.unlock(GESTURE_REASON);
            }
        }
        measured
    }

    /// Reveals the hidden content. Only the first call has an effect; it returns
    /// `true`, every later call returns `false`.
    pub fn unlock(&mut self, reason: &str) -> bool {
        if !self.cell.unlock(reason) {
            debug!(reason, "already unlocked, ignoring");
            return false;
        }
        info!(reason, "content unlocked");
        self.surface.reveal_content(&self.content);
        self.surface.set_status(&StatusMessage::Unlocked { reason: reason.to_string() });
        true
    }

    pub fn is_unlocked(&self) -> bool {
        self.cell.is_unlocked()
    }

    pub fn unlock_state(&self) -> &UnlockState {
        self.cell.state()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Matches the debug canvas to the native video size.
    pub fn resize_canvas(&mut self, width: u32, height: u32) {
        self.canvas.resize(width, height);
        self.surface.resize_canvas(width, height);
    }

    pub fn canvas(&self) -> &RgbaImage {
        self.canvas.image()
    }

    pub fn surface(&self) -> &U {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut U {
        &mut self.surface
    }

    pub fn into_surface(self) -> U {
        self.surface
    }
}
