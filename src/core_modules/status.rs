// THEORY:
// Everything the user reads in the status region is one of a handful of messages.
// Modelling them as an enum, instead of formatting strings at every call site,
// lets tests assert on the message kind and keeps the wording in one place.

use std::fmt;

/// A message for the human-readable status region.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusMessage {
    /// The landmark model is being configured.
    Loading,
    /// The model is configured and the camera is about to be requested.
    Ready,
    /// Frames are flowing.
    CameraActive,
    /// Per-frame readout used to calibrate the threshold.
    Calibration { eye_opening: f64, threshold: f64 },
    /// The platform exposes no camera API at all.
    Unsupported,
    /// The camera or the landmark provider failed during startup.
    CameraError { message: String },
    /// The camera started but stopped delivering frames.
    CameraLost { message: String },
    /// The content has been unlocked.
    Unlocked { reason: String },
}

impl StatusMessage {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StatusMessage::Unsupported | StatusMessage::CameraError { .. } | StatusMessage::CameraLost { .. }
        )
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::Loading => write!(f, "Loading face landmark model..."),
            StatusMessage::Ready => write!(f, "Model loaded. Ready to start camera..."),
            StatusMessage::CameraActive => write!(f, "Camera active. Now wink!"),
            StatusMessage::Calibration { eye_opening, threshold } => {
                write!(f, "Eye opening: {eye_opening:.4}. Threshold: {threshold}.")
            }
            StatusMessage::Unsupported => write!(f, "Camera API is not supported on this device."),
            StatusMessage::CameraError { message } => write!(f, "Error starting camera: {message}."),
            StatusMessage::CameraLost { message } => write!(f, "Camera stopped: {message}."),
            StatusMessage::Unlocked { reason } => {
                write!(f, "{reason} detected! Special content unlocked.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_readout_uses_four_decimals() {
        let msg = StatusMessage::Calibration { eye_opening: 0.02, threshold: 0.008 };
        assert_eq!(msg.to_string(), "Eye opening: 0.0200. Threshold: 0.008.");
    }

    #[test]
    fn unlocked_message_names_the_reason() {
        let msg = StatusMessage::Unlocked { reason: "manual".into() };
        let text = msg.to_string();
        assert!(text.starts_with("manual"));
        assert!(text.contains("detected"));
    }

    #[test]
    fn only_failures_are_errors() {
        assert!(StatusMessage::Unsupported.is_error());
        assert!(StatusMessage::CameraError { message: "denied".into() }.is_error());
        assert!(StatusMessage::CameraLost { message: "unplugged".into() }.is_error());
        assert!(!StatusMessage::Ready.is_error());
        assert!(!StatusMessage::Unlocked { reason: "gesture".into() }.is_error());
    }
}
