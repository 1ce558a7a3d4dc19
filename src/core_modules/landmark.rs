// THEORY:
// The `landmark` module holds the raw vocabulary handed to us by a face-landmark
// provider. A `Landmark` is a single normalized point, a `LandmarkSet` is every
// point the provider located on one face, and `FrameResults` is what one frame
// produced: the image that was analyzed plus one `LandmarkSet` per detected face.
//
// Key architectural principles:
// 1.  **Read-only Snapshots**: Landmark data is created fresh for every frame and
//     is never mutated by the controller. Nothing here outlives a single frame.
// 2.  **Index Addressing**: Providers publish a fixed topology, so points are
//     addressed by their index. Looking up an index the provider did not emit is
//     not a panic, it is an `Option::None` the caller has to handle.
// 3.  **Normalized Space**: Coordinates live in [0, 1] relative to the image, so
//     thresholds stay meaningful regardless of camera resolution.

use image::RgbaImage;

/// A single facial feature point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// Horizontal position, 0.0 is the left edge of the image.
    pub x: f64,
    /// Vertical position, 0.0 is the top edge of the image.
    pub y: f64,
    /// Relative depth. Providers without depth report 0.0.
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convenience constructor for providers that only emit 2D points.
    pub fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Maps the normalized point onto a pixel grid of the given size.
    pub fn to_pixel(&self, width: u32, height: u32) -> (f64, f64) {
        (self.x * width as f64, self.y * height as f64)
    }
}

/// Every landmark located on a single face, in the provider's topology order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.points.iter()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(points: Vec<Landmark>) -> Self {
        Self::new(points)
    }
}

/// The output of the vision provider for one frame.
#[derive(Debug, Clone)]
pub struct FrameResults {
    /// The frame as the provider analyzed it.
    pub image: RgbaImage,
    /// One entry per detected face. Empty when no face was found.
    pub landmark_sets: Vec<LandmarkSet>,
}

impl FrameResults {
    pub fn new(image: RgbaImage, landmark_sets: Vec<LandmarkSet>) -> Self {
        Self { image, landmark_sets }
    }

    /// A frame in which the provider found no faces.
    pub fn empty(image: RgbaImage) -> Self {
        Self { image, landmark_sets: Vec::new() }
    }

    pub fn has_faces(&self) -> bool {
        !self.landmark_sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_past_the_end_is_none() {
        let set = LandmarkSet::new(vec![Landmark::planar(0.1, 0.2); 3]);
        assert_eq!(set.len(), 3);
        assert!(set.get(2).is_some());
        assert!(set.get(3).is_none());
    }

    #[test]
    fn to_pixel_scales_by_image_size() {
        let point = Landmark::planar(0.5, 0.25);
        assert_eq!(point.to_pixel(640, 480), (320.0, 120.0));
    }

    #[test]
    fn empty_results_report_no_faces() {
        let results = FrameResults::empty(RgbaImage::new(4, 4));
        assert!(!results.has_faces());
    }
}
