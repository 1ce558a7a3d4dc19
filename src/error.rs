use thiserror::Error;

/// Failures reported by a camera provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The platform has no camera API at all.
    #[error("camera API is not supported")]
    Unsupported,
    #[error("permission to use the camera was denied")]
    PermissionDenied,
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    /// The device started but stopped delivering frames.
    #[error("camera stream failed: {0}")]
    Stream(String),
}

/// Failures reported by a landmark provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisionError {
    #[error("landmark provider configuration failed: {0}")]
    Configuration(String),
    #[error("landmark inference failed: {0}")]
    Inference(String),
}

/// Why the camera/vision bootstrap did not reach the active phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Vision(#[from] VisionError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Boot(#[from] BootError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
