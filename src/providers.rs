// THEORY:
// The camera and the landmark model are external collaborators. This module names
// the two capabilities the session needs from them and nothing more, so the rest of
// the crate can be driven by a real device, a video file, or a scripted sequence.
//
// Both traits are async. A provider is free to block on a device inside the future,
// but the session awaits each step before moving on: one frame is requested, handed
// to the vision provider, and fully processed before the next one is requested.

use crate::config::{CameraOptions, VisionOptions};
use crate::core_modules::landmark::FrameResults;
use crate::error::{CameraError, VisionError};
use image::RgbaImage;

/// One captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Monotonic index assigned by the camera provider.
    pub frame_id: u64,
    pub image: RgbaImage,
}

impl Frame {
    pub fn new(frame_id: u64, image: RgbaImage) -> Self {
        Self { frame_id, image }
    }
}

/// Native stream properties reported once the camera is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    /// Some backends report 0x0 until the first frame has been decoded.
    pub fn is_known(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Supplies frames. Implementations decide how a device is opened.
#[allow(async_fn_in_trait)]
pub trait CameraProvider {
    /// Acquires the device at (or near) the requested resolution.
    async fn start(&mut self, options: &CameraOptions) -> Result<VideoMetadata, CameraError>;

    /// Waits for the next frame. `Ok(None)` means the source is exhausted.
    ///
    /// Must be cancel safe: the session races it against manual control events.
    async fn next_frame(&mut self) -> Result<Option<Frame>, CameraError>;
}

/// Turns frames into facial landmarks.
#[allow(async_fn_in_trait)]
pub trait VisionProvider {
    fn configure(&mut self, options: &VisionOptions) -> Result<(), VisionError>;

    async fn process_frame(&mut self, frame: &Frame) -> Result<FrameResults, VisionError>;
}
