use std::fmt;

use blink_unlock::config::CameraOptions;
use blink_unlock::{CameraError, CameraProvider, Frame, VideoMetadata};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};

use crate::convert::bgr_to_rgba;

#[derive(Debug, Clone, PartialEq)]
pub enum CameraSource {
    Device(i32),
    File(String),
}

impl CameraSource {
    /// A bare number selects a device index, anything else is a video path.
    pub fn parse(arg: Option<&str>) -> Self {
        match arg {
            None => CameraSource::Device(0),
            Some(s) => s.parse::<i32>().map(CameraSource::Device).unwrap_or_else(|_| CameraSource::File(s.to_string())),
        }
    }
}

impl fmt::Display for CameraSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraSource::Device(index) => write!(f, "camera #{index}"),
            CameraSource::File(path) => write!(f, "{path}"),
        }
    }
}

/// `CameraProvider` over an OpenCV `VideoCapture`.
pub struct OpenCvCamera {
    source: CameraSource,
    cap: Option<VideoCapture>,
    next_id: u64,
}

impl OpenCvCamera {
    pub fn new(source: CameraSource) -> Self {
        Self { source, cap: None, next_id: 0 }
    }
}

fn unavailable(err: opencv::Error) -> CameraError {
    CameraError::Unavailable(err.to_string())
}

fn stream(err: opencv::Error) -> CameraError {
    CameraError::Stream(err.to_string())
}

impl CameraProvider for OpenCvCamera {
    async fn start(&mut self, options: &CameraOptions) -> Result<VideoMetadata, CameraError> {
        let mut cap = match &self.source {
            CameraSource::Device(index) => VideoCapture::new(*index, videoio::CAP_ANY),
            CameraSource::File(path) => VideoCapture::from_file(path, videoio::CAP_ANY),
        }
        .map_err(unavailable)?;
        if !cap.is_opened().map_err(unavailable)? {
            return Err(CameraError::Unavailable(format!("could not open {}", self.source)));
        }

        if let CameraSource::Device(_) = self.source {
            // Drivers are free to ignore these, the real size is read back below.
            cap.set(videoio::CAP_PROP_FRAME_WIDTH, options.width as f64).map_err(unavailable)?;
            cap.set(videoio::CAP_PROP_FRAME_HEIGHT, options.height as f64).map_err(unavailable)?;
        }
        let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH).map_err(unavailable)? as u32;
        let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT).map_err(unavailable)? as u32;

        self.cap = Some(cap);
        Ok(VideoMetadata { width, height })
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        let Some(cap) = self.cap.as_mut() else {
            return Err(CameraError::Stream("camera was not started".into()));
        };
        let mut frame = Mat::default();
        let grabbed = tokio::task::block_in_place(|| cap.read(&mut frame)).map_err(stream)?;
        if !grabbed || frame.empty() {
            return Ok(None);
        }
        let image = bgr_to_rgba(&frame)
            .map_err(stream)?
            .ok_or_else(|| CameraError::Stream("frame buffer size mismatch".into()))?;

        let id = self.next_id;
        self.next_id += 1;
        Ok(Some(Frame::new(id, image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_picks_device_or_file() {
        assert_eq!(CameraSource::parse(None), CameraSource::Device(0));
        assert_eq!(CameraSource::parse(Some("2")), CameraSource::Device(2));
        assert_eq!(CameraSource::parse(Some("clip.mp4")), CameraSource::File("clip.mp4".into()));
    }
}
