// THEORY:
// The UI surface is everything the user can observe: a status line, a video element
// that starts hidden, a debug canvas, and a content section that is revealed exactly
// once. The controller and the session only ever talk to the `UiSurface` trait, so the
// same logic can update a web page, a log, or an in-memory recorder used by tests.

use crate::config::UnlockedContent;
use crate::core_modules::status::StatusMessage;
use image::RgbaImage;
use tracing::info;

pub trait UiSurface {
    fn set_status(&mut self, status: &StatusMessage);

    /// Reveals the hidden section. Called at most once per session.
    fn reveal_content(&mut self, content: &UnlockedContent);

    fn show_video(&mut self);

    /// Sizes the debug canvas to the native video resolution.
    fn resize_canvas(&mut self, width: u32, height: u32);

    /// Publishes the freshly drawn debug canvas.
    fn present_frame(&mut self, _canvas: &RgbaImage) {}
}

/// Keeps every observable change in memory.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub statuses: Vec<StatusMessage>,
    pub revealed: Option<UnlockedContent>,
    pub reveal_count: usize,
    pub video_visible: bool,
    pub canvas_size: Option<(u32, u32)>,
    pub frames_presented: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_status(&self) -> Option<&StatusMessage> {
        self.statuses.last()
    }

    /// The status line as the user would currently read it.
    pub fn status_text(&self) -> String {
        self.last_status().map(ToString::to_string).unwrap_or_default()
    }
}

impl UiSurface for RecordingSurface {
    fn set_status(&mut self, status: &StatusMessage) {
        self.statuses.push(status.clone());
    }

    fn reveal_content(&mut self, content: &UnlockedContent) {
        self.revealed = Some(content.clone());
        self.reveal_count += 1;
    }

    fn show_video(&mut self) {
        self.video_visible = true;
    }

    fn resize_canvas(&mut self, width: u32, height: u32) {
        self.canvas_size = Some((width, height));
    }

    fn present_frame(&mut self, _canvas: &RgbaImage) {
        self.frames_presented += 1;
    }
}

/// Writes status changes to the tracing log. Useful for headless runs.
#[derive(Debug, Default)]
pub struct LogSurface;

impl UiSurface for LogSurface {
    fn set_status(&mut self, status: &StatusMessage) {
        info!(target: "blink_unlock::ui", "{status}");
    }

    fn reveal_content(&mut self, content: &UnlockedContent) {
        info!(target: "blink_unlock::ui", heading = %content.heading, "{}", content.body);
    }

    fn show_video(&mut self) {}

    fn resize_canvas(&mut self, width: u32, height: u32) {
        info!(target: "blink_unlock::ui", width, height, "canvas sized to video");
    }
}
