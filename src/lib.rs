// THEORY:
// `blink_unlock` watches a stream of facial landmarks for a wink and reveals a hidden
// content section the first time it sees one. The landmark model and the camera are
// external collaborators reached through the `providers` traits; the crate itself owns
// the decision logic, the startup ordering and the observable UI state.
//
// The public surface is the `Session` (startup and frame loop), the
// `GestureController` (per-frame callback and single-writer unlock state), the
// `UiSurface` trait, and `UnlockConfig`. The `synthetic` providers drive all of it
// without a camera.

pub mod config;
pub mod controller;
pub mod core_modules;
pub mod error;
pub mod providers;
pub mod session;
pub mod synthetic;
pub mod telemetry;
pub mod ui;

pub use config::UnlockConfig;
pub use controller::GestureController;
pub use core_modules::landmark::{FrameResults, Landmark, LandmarkSet};
pub use core_modules::layout::{EyelidPair, LandmarkLayout, FACE_MESH, IBUG_68};
pub use core_modules::status::StatusMessage;
pub use core_modules::unlock_state::UnlockState;
pub use error::{BootError, CameraError, Error, Result, VisionError};
pub use providers::{CameraProvider, Frame, VideoMetadata, VisionProvider};
pub use session::{BootPhase, ControlEvent, RunSummary, Session};
pub use ui::{LogSurface, RecordingSurface, UiSurface};
