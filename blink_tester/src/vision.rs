use blink_unlock::config::VisionOptions;
use blink_unlock::{Frame, FrameResults, Landmark, LandmarkSet, VisionError, VisionProvider};
use opencv::{
    core::{Mat, Point2f, Ptr, Rect, Size, Vector},
    face::{self, Facemark},
    imgproc,
    objdetect::CascadeClassifier,
    prelude::*,
};
use tracing::debug;

use crate::convert::rgba_to_mat;

const MIN_FACE_SIZE: i32 = 60;

/// Haar cascade face detection followed by the 68-point LBF facemark model.
pub struct LbfFaceVision {
    cascade_path: String,
    model_path: String,
    detector: Option<CascadeClassifier>,
    facemark: Option<Ptr<Facemark>>,
    max_faces: usize,
    min_neighbors: i32,
}

impl LbfFaceVision {
    pub fn new(cascade_path: impl Into<String>, model_path: impl Into<String>) -> Self {
        Self {
            cascade_path: cascade_path.into(),
            model_path: model_path.into(),
            detector: None,
            facemark: None,
            max_faces: 1,
            min_neighbors: 3,
        }
    }

    fn detect(&mut self, frame: &Frame) -> opencv::Result<Vec<LandmarkSet>> {
        let (Some(detector), Some(facemark)) = (self.detector.as_mut(), self.facemark.as_mut()) else {
            return Ok(Vec::new());
        };

        let rgba = rgba_to_mat(&frame.image)?;
        let mut gray = Mat::default();
        imgproc::cvt_color(&rgba, &mut gray, imgproc::COLOR_RGBA2GRAY, 0)?;
        let mut equalized = Mat::default();
        imgproc::equalize_hist(&gray, &mut equalized)?;

        let mut found = Vector::<Rect>::new();
        detector.detect_multi_scale(
            &equalized,
            &mut found,
            1.1,
            self.min_neighbors,
            0,
            Size::new(MIN_FACE_SIZE, MIN_FACE_SIZE),
            Size::new(0, 0),
        )?;
        if found.is_empty() {
            return Ok(Vec::new());
        }

        // Largest faces first, the tracked face is the one closest to the camera.
        let mut rects: Vec<Rect> = found.to_vec();
        rects.sort_by_key(|r| std::cmp::Reverse(r.area()));
        rects.truncate(self.max_faces);
        let faces = Vector::<Rect>::from_iter(rects);

        let mut shapes = Vector::<Vector<Point2f>>::new();
        if !facemark.fit(&gray, &faces, &mut shapes)? {
            return Ok(Vec::new());
        }

        let (w, h) = (frame.image.width() as f64, frame.image.height() as f64);
        Ok(shapes
            .iter()
            .map(|shape| {
                shape
                    .iter()
                    .map(|p| Landmark::planar(p.x as f64 / w, p.y as f64 / h))
                    .collect::<Vec<_>>()
                    .into()
            })
            .collect())
    }
}

impl VisionProvider for LbfFaceVision {
    fn configure(&mut self, options: &VisionOptions) -> Result<(), VisionError> {
        let config_err = |e: opencv::Error| VisionError::Configuration(e.to_string());

        let detector = CascadeClassifier::new(&self.cascade_path).map_err(config_err)?;
        if detector.empty().map_err(config_err)? {
            return Err(VisionError::Configuration(format!("no cascade loaded from {}", self.cascade_path)));
        }
        let mut facemark = face::create_facemark_lbf().map_err(config_err)?;
        facemark.load_model(&self.model_path).map_err(config_err)?;

        // Lower confidence means a more permissive detector.
        self.min_neighbors = 1 + (options.min_detection_confidence * 10.0).round() as i32;
        self.max_faces = options.max_faces;
        if options.refine_landmarks {
            debug!("LBF has no refined landmark mode, using the 68-point shape");
        }
        self.detector = Some(detector);
        self.facemark = Some(facemark);
        Ok(())
    }

    async fn process_frame(&mut self, frame: &Frame) -> Result<FrameResults, VisionError> {
        let landmark_sets = tokio::task::block_in_place(|| self.detect(frame))
            .map_err(|e| VisionError::Inference(e.to_string()))?;
        Ok(FrameResults::new(frame.image.clone(), landmark_sets))
    }
}
