// THEORY:
// Scripted stand-ins for the camera and the landmark provider. They let the full
// session run without a device or a model: the camera hands out blank frames of a
// fixed size, and the vision provider replays a queue of landmark sets, one entry per
// frame. Both can be told to fail at specific points to exercise error paths.

use crate::config::{CameraOptions, VisionOptions};
use crate::core_modules::landmark::{FrameResults, Landmark, LandmarkSet};
use crate::core_modules::layout::{EyelidPair, LandmarkLayout};
use crate::error::{CameraError, VisionError};
use crate::providers::{CameraProvider, Frame, VideoMetadata, VisionProvider};
use image::{Rgba, RgbaImage};
use std::collections::VecDeque;

/// Builds a face in `layout` whose default eyelids are `eye_opening` apart.
pub fn synthetic_face(layout: &LandmarkLayout, eye_opening: f64) -> LandmarkSet {
    synthetic_face_at(layout, layout.eyelids, eye_opening)
}

/// Like `synthetic_face`, with the gap placed on `eyelids` instead.
/// Indices past the layout size grow the set so the pair is always present.
pub fn synthetic_face_at(layout: &LandmarkLayout, eyelids: EyelidPair, eye_opening: f64) -> LandmarkSet {
    let len = layout.landmark_count.max(eyelids.upper + 1).max(eyelids.lower + 1);
    let mut points = vec![Landmark::planar(0.5, 0.5); len];
    points[eyelids.upper] = Landmark::planar(0.375, 0.25);
    points[eyelids.lower] = Landmark::planar(0.375, 0.25 + eye_opening);
    LandmarkSet::new(points)
}

/// A camera that produces `frame_count` flat gray frames.
#[derive(Debug)]
pub struct ScriptedCamera {
    start_result: Result<VideoMetadata, CameraError>,
    remaining: u64,
    next_id: u64,
    stream_error: Option<(u64, CameraError)>,
    reported: Option<VideoMetadata>,
    started: bool,
    pub start_calls: u32,
    pub requested: Option<CameraOptions>,
}

impl ScriptedCamera {
    pub fn new(width: u32, height: u32, frame_count: u64) -> Self {
        Self {
            start_result: Ok(VideoMetadata { width, height }),
            remaining: frame_count,
            next_id: 0,
            stream_error: None,
            reported: None,
            started: false,
            start_calls: 0,
            requested: None,
        }
    }

    /// A camera whose `start` is rejected with `err`.
    pub fn failing(err: CameraError) -> Self {
        Self { start_result: Err(err), ..Self::new(0, 0, 0) }
    }

    /// Makes `start` report this size while frames keep their real one.
    pub fn with_reported_size(mut self, width: u32, height: u32) -> Self {
        self.reported = Some(VideoMetadata { width, height });
        self
    }

    /// Fails the stream once `after` frames have been delivered.
    pub fn with_stream_error(mut self, after: u64, err: CameraError) -> Self {
        self.stream_error = Some((after, err));
        self
    }
}

impl CameraProvider for ScriptedCamera {
    async fn start(&mut self, options: &CameraOptions) -> Result<VideoMetadata, CameraError> {
        self.start_calls += 1;
        self.requested = Some(options.clone());
        let metadata = self.start_result.clone()?;
        self.started = true;
        Ok(self.reported.unwrap_or(metadata))
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        tokio::task::yield_now().await;
        if !self.started {
            return Err(CameraError::Stream("camera was not started".into()));
        }
        if let Some((after, err)) = &self.stream_error {
            if self.next_id >= *after {
                return Err(err.clone());
            }
        }
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let (width, height) = match &self.start_result {
            Ok(meta) => (meta.width, meta.height),
            Err(_) => (0, 0),
        };
        let frame = Frame::new(self.next_id, RgbaImage::from_pixel(width, height, Rgba([96, 96, 96, 255])));
        self.next_id += 1;
        Ok(Some(frame))
    }
}

/// A landmark provider that replays one scripted entry per processed frame.
/// Once the script runs out every frame reports no faces.
#[derive(Debug, Default)]
pub struct ScriptedVision {
    script: VecDeque<Result<Vec<LandmarkSet>, VisionError>>,
    configure_error: Option<VisionError>,
    pub configured: Option<VisionOptions>,
    pub frames_seen: u64,
}

impl ScriptedVision {
    pub fn new() -> Self {
        Self::default()
    }

    /// One frame per opening, each with a single face.
    pub fn from_openings(layout: &LandmarkLayout, openings: &[f64]) -> Self {
        Self::from_openings_at(layout, layout.eyelids, openings)
    }

    /// `from_openings` measured on an explicit eyelid pair.
    pub fn from_openings_at(layout: &LandmarkLayout, eyelids: EyelidPair, openings: &[f64]) -> Self {
        let mut vision = Self::new();
        for &opening in openings {
            vision.push_faces(vec![synthetic_face_at(layout, eyelids, opening)]);
        }
        vision
    }

    pub fn push_faces(&mut self, faces: Vec<LandmarkSet>) -> &mut Self {
        self.script.push_back(Ok(faces));
        self
    }

    pub fn push_error(&mut self, err: VisionError) -> &mut Self {
        self.script.push_back(Err(err));
        self
    }

    /// Makes `configure` reject with `err`.
    pub fn failing_configuration(err: VisionError) -> Self {
        Self { configure_error: Some(err), ..Self::default() }
    }
}

impl VisionProvider for ScriptedVision {
    fn configure(&mut self, options: &VisionOptions) -> Result<(), VisionError> {
        if let Some(err) = &self.configure_error {
            return Err(err.clone());
        }
        self.configured = Some(options.clone());
        Ok(())
    }

    async fn process_frame(&mut self, frame: &Frame) -> Result<FrameResults, VisionError> {
        if self.configured.is_none() {
            return Err(VisionError::Configuration("frame received before configure".into()));
        }
        self.frames_seen += 1;
        let faces = self.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))?;
        Ok(FrameResults::new(frame.image.clone(), faces))
    }
}
