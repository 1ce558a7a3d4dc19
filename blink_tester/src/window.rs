// THEORY:
// HighGUI only processes keys and repaints while someone calls `wait_key`, and it
// wants every call from one thread. The preview therefore runs on its own blocking
// thread that polls the keyboard continuously, independent of whether the camera
// ever started. The session side only publishes what should be on screen through a
// `watch` channel; the pump repaints when that view changes.
//
// Keys: `u` sends the manual unlock, `q` or Esc closes the window. Closing the
// window (by key or by the window manager) drops the control sender, which lets the
// session finish once the frame source is done.

use blink_unlock::config::UnlockedContent;
use blink_unlock::{ControlEvent, StatusMessage, UiSurface};
use image::{Rgba, RgbaImage};
use opencv::{
    core::{Mat, Point, Scalar},
    highgui, imgproc,
    prelude::*,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::convert::rgba_to_mat;

const WINDOW_NAME: &str = "blink_tester";
const POLL_MS: i32 = 30;
const UNLOCK_KEY: i32 = 'u' as i32;
const QUIT_KEY: i32 = 'q' as i32;
const ESC_KEY: i32 = 27;
const IDLE_SIZE: (u32, u32) = (640, 480);

/// What the preview window should currently show.
#[derive(Debug, Clone, Default)]
pub struct WindowView {
    pub status: String,
    pub status_is_error: bool,
    pub unlocked_heading: Option<String>,
    pub canvas: Option<RgbaImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Idle,
    Unlock,
    Quit,
}

fn key_action(key: i32) -> KeyAction {
    match key {
        UNLOCK_KEY => KeyAction::Unlock,
        QUIT_KEY | ESC_KEY => KeyAction::Quit,
        _ => KeyAction::Idle,
    }
}

/// Applies one key press. Returns `false` once the window should close.
fn handle_key(key: i32, control: &mpsc::UnboundedSender<ControlEvent>) -> bool {
    match key_action(key) {
        KeyAction::Idle => true,
        KeyAction::Unlock => {
            info!("manual unlock requested from the preview window");
            control.send(ControlEvent::ManualUnlock).is_ok()
        }
        KeyAction::Quit => false,
    }
}

/// The session-side half of the preview. Publishes into the pump's view.
pub struct WindowSurface {
    view: watch::Sender<WindowView>,
}

impl WindowSurface {
    pub fn new(view: watch::Sender<WindowView>) -> Self {
        Self { view }
    }
}

/// Opens the preview window on a blocking thread and returns the surface feeding it.
/// The handle resolves when the window is closed or the surface is dropped.
pub fn spawn(control: mpsc::UnboundedSender<ControlEvent>) -> (WindowSurface, JoinHandle<opencv::Result<()>>) {
    let (view_tx, view_rx) = watch::channel(WindowView::default());
    let pump = tokio::task::spawn_blocking(move || pump(view_rx, control));
    (WindowSurface::new(view_tx), pump)
}

fn pump(mut view_rx: watch::Receiver<WindowView>, control: mpsc::UnboundedSender<ControlEvent>) -> opencv::Result<()> {
    highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;
    repaint(&view_rx.borrow_and_update());

    loop {
        if !handle_key(highgui::wait_key(POLL_MS)?, &control) {
            break;
        }
        if highgui::get_window_property(WINDOW_NAME, highgui::WND_PROP_VISIBLE)? < 1.0 {
            break;
        }
        match view_rx.has_changed() {
            Ok(true) => repaint(&view_rx.borrow_and_update()),
            Ok(false) => {}
            // Session is gone.
            Err(_) => break,
        }
    }

    info!("preview window closed");
    highgui::destroy_window(WINDOW_NAME)
}

fn repaint(view: &WindowView) {
    if let Err(err) = draw(view) {
        warn!(error = %err, "preview window update failed");
    }
}

fn draw(view: &WindowView) -> opencv::Result<()> {
    let idle;
    let canvas = match &view.canvas {
        Some(canvas) if canvas.width() > 0 && canvas.height() > 0 => canvas,
        _ => {
            idle = RgbaImage::from_pixel(IDLE_SIZE.0, IDLE_SIZE.1, Rgba([24, 24, 24, 255]));
            &idle
        }
    };
    let rgba = rgba_to_mat(canvas)?;
    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgba, &mut bgr, imgproc::COLOR_RGBA2BGR, 0)?;

    let color = if view.status_is_error {
        Scalar::new(0.0, 0.0, 255.0, 0.0)
    } else {
        Scalar::new(255.0, 255.0, 255.0, 0.0)
    };
    imgproc::put_text(&mut bgr, &view.status, Point::new(10, 24), imgproc::FONT_HERSHEY_SIMPLEX, 0.6, color, 1, imgproc::LINE_8, false)?;
    if let Some(heading) = &view.unlocked_heading {
        // #d4edda
        let accent = Scalar::new(218.0, 237.0, 212.0, 0.0);
        imgproc::put_text(&mut bgr, heading, Point::new(10, 52), imgproc::FONT_HERSHEY_SIMPLEX, 0.8, accent, 2, imgproc::LINE_8, false)?;
    }
    let hint_y = canvas.height() as i32 - 12;
    let grey = Scalar::new(180.0, 180.0, 180.0, 0.0);
    imgproc::put_text(&mut bgr, "u: unlock   q: quit", Point::new(10, hint_y), imgproc::FONT_HERSHEY_SIMPLEX, 0.5, grey, 1, imgproc::LINE_8, false)?;

    highgui::imshow(WINDOW_NAME, &bgr)
}

impl UiSurface for WindowSurface {
    fn set_status(&mut self, status: &StatusMessage) {
        info!(target: "blink_tester::ui", "{status}");
        self.view.send_modify(|view| {
            view.status = status.to_string();
            view.status_is_error = status.is_error();
        });
    }

    fn reveal_content(&mut self, content: &UnlockedContent) {
        info!(target: "blink_tester::ui", heading = %content.heading, "{}", content.body);
        self.view.send_modify(|view| view.unlocked_heading = Some(content.heading.clone()));
    }

    fn show_video(&mut self) {}

    fn resize_canvas(&mut self, width: u32, height: u32) {
        info!(target: "blink_tester::ui", width, height, "canvas sized to video");
    }

    fn present_frame(&mut self, canvas: &RgbaImage) {
        self.view.send_modify(|view| view.canvas = Some(canvas.clone()));
    }
}
