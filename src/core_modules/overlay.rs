// THEORY:
// The debug overlay is purely cosmetic: it shows the frame the provider analyzed and
// draws the landmark topology on top of it so a person can see what the tracker sees.
// Nothing in the unlock decision depends on it.
//
// The canvas is an RGBA buffer sized to the native video resolution. Each frame it
// is cleared, the analyzed image is scaled into it, and the layout's connection sets
// are stroked with simple Bresenham lines. Colors with an alpha below 255 are
// blended onto what is already there.
//
// Providers occasionally emit points far outside the frame. Segments are clipped to
// the canvas before stepping, so the cost of a line is bounded by the canvas size
// and not by how wild the landmark is. Non-finite points are never drawn.

use crate::core_modules::landmark::{FrameResults, LandmarkSet};
use crate::core_modules::layout::{Connection, LandmarkLayout};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Stroke parameters for a set of connections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    pub color: Rgba<u8>,
    pub line_width: u32,
}

impl DrawStyle {
    pub const fn new(color: Rgba<u8>, line_width: u32) -> Self {
        Self { color, line_width }
    }
}

pub const MESH_STYLE: DrawStyle = DrawStyle::new(Rgba([0xC0, 0xC0, 0xC0, 0x70]), 1);
pub const RIGHT_EYE_STYLE: DrawStyle = DrawStyle::new(Rgba([0xFF, 0x30, 0x30, 0xFF]), 2);
pub const LEFT_EYE_STYLE: DrawStyle = DrawStyle::new(Rgba([0x30, 0xFF, 0x30, 0xFF]), 2);
pub const OUTLINE_STYLE: DrawStyle = DrawStyle::new(Rgba([0xE0, 0xE0, 0xE0, 0xFF]), 2);

/// An RGBA drawing surface for the per-frame debug view.
#[derive(Debug, Clone)]
pub struct DebugCanvas {
    buffer: RgbaImage,
}

impl DebugCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { buffer: RgbaImage::new(width, height) }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Re-allocates the buffer, typically once the native video size is known.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.buffer.dimensions() != (width, height) {
            self.buffer = RgbaImage::new(width, height);
        }
    }

    pub fn clear(&mut self) {
        for pixel in self.buffer.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// Copies `image` into the canvas, scaling it to fill when sizes differ.
    pub fn draw_image(&mut self, image: &RgbaImage) {
        if image.dimensions() == self.buffer.dimensions() {
            self.buffer.copy_from_slice(image.as_raw());
        } else if self.width() > 0 && self.height() > 0 {
            self.buffer = imageops::resize(image, self.width(), self.height(), FilterType::Triangle);
        }
    }

    /// Strokes a line between every pair of landmarks named in `edges`.
    /// Edges pointing at indices the set does not contain are skipped.
    pub fn draw_connections(&mut self, landmarks: &LandmarkSet, edges: &[Connection], style: &DrawStyle) {
        let (w, h) = self.buffer.dimensions();
        let bounds = self.clip_bounds(style);
        for &(from, to) in edges {
            let (Some(a), Some(b)) = (landmarks.get(from), landmarks.get(to)) else {
                continue;
            };
            let Some(((x0, y0), (x1, y1))) = clip_segment(a.to_pixel(w, h), b.to_pixel(w, h), bounds) else {
                continue;
            };
            self.stroke_line(x0.round() as i64, y0.round() as i64, x1.round() as i64, y1.round() as i64, style);
        }
    }

    /// Marks every landmark as a single dot. Stands in for a full tessellation.
    pub fn draw_landmarks(&mut self, landmarks: &LandmarkSet, style: &DrawStyle) {
        let (w, h) = self.buffer.dimensions();
        let bounds = self.clip_bounds(style);
        for point in landmarks.iter() {
            let (x, y) = point.to_pixel(w, h);
            if !bounds.contains(x, y) {
                continue;
            }
            self.stamp(x.round() as i64, y.round() as i64, style);
        }
    }

    /// Clears the canvas and draws one frame worth of debug output.
    pub fn render(&mut self, results: &FrameResults, layout: &LandmarkLayout) {
        self.clear();
        self.draw_image(&results.image);
        for landmarks in &results.landmark_sets {
            self.draw_landmarks(landmarks, &MESH_STYLE);
            self.draw_connections(landmarks, layout.right_eye, &RIGHT_EYE_STYLE);
            self.draw_connections(landmarks, layout.left_eye, &LEFT_EYE_STYLE);
            self.draw_connections(landmarks, layout.face_oval, &OUTLINE_STYLE);
            self.draw_connections(landmarks, layout.lips, &OUTLINE_STYLE);
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.buffer
    }

    /// The canvas grown by one stroke width, so thick lines still reach the edges.
    fn clip_bounds(&self, style: &DrawStyle) -> ClipBounds {
        let pad = style.line_width.max(1) as f64;
        ClipBounds {
            min_x: -pad,
            min_y: -pad,
            max_x: self.width() as f64 - 1.0 + pad,
            max_y: self.height() as f64 - 1.0 + pad,
        }
    }

    fn stroke_line(&mut self, mut x0: i64, mut y0: i64, x1: i64, y1: i64, style: &DrawStyle) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.stamp(x0, y0, style);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Paints a `line_width` square centered on the point.
    fn stamp(&mut self, x: i64, y: i64, style: &DrawStyle) {
        let size = style.line_width.max(1) as i64;
        let start = -(size - 1) / 2;
        for oy in start..start + size {
            for ox in start..start + size {
                self.blend(x + ox, y + oy, style.color);
            }
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let dst = self.buffer.get_pixel_mut(x as u32, y as u32);
        let alpha = color[3] as u32;
        if alpha == 255 {
            *dst = color;
            return;
        }
        let inv = 255 - alpha;
        for c in 0..3 {
            dst[c] = ((color[c] as u32 * alpha + dst[c] as u32 * inv) / 255) as u8;
        }
        dst[3] = (alpha + dst[3] as u32 * inv / 255).min(255) as u8;
    }
}

#[derive(Debug, Clone, Copy)]
struct ClipBounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl ClipBounds {
    fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

type Point = (f64, f64);

/// Liang-Barsky clipping. `None` when the segment misses the bounds entirely or
/// either end is not a finite point.
fn clip_segment(p0: Point, p1: Point, bounds: ClipBounds) -> Option<(Point, Point)> {
    if ![p0.0, p0.1, p1.0, p1.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let dx = p1.0 - p0.0;
    let dy = p1.1 - p0.1;
    let mut t_enter = 0.0_f64;
    let mut t_exit = 1.0_f64;
    for (p, q) in [
        (-dx, p0.0 - bounds.min_x),
        (dx, bounds.max_x - p0.0),
        (-dy, p0.1 - bounds.min_y),
        (dy, bounds.max_y - p0.1),
    ] {
        if p == 0.0 {
            // Parallel to this edge: either fully inside it or fully outside.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t_enter = t_enter.max(t);
        } else {
            t_exit = t_exit.min(t);
        }
        if t_enter > t_exit {
            return None;
        }
    }
    Some((
        (p0.0 + t_enter * dx, p0.1 + t_enter * dy),
        (p0.0 + t_exit * dx, p0.1 + t_exit * dy),
    ))
}
