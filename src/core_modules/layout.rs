// THEORY:
// A `LandmarkLayout` describes the topology a particular landmark provider emits:
// how many points a face has, which pair of points bounds the eyelid we watch, and
// which point-to-point connections draw the debug overlay. The controller never
// hard-codes indices; it asks the layout.
//
// Two layouts ship with the crate:
// - `FACE_MESH`: the 478-point refined face mesh. The watched eyelid is the
//   subject's right eye, upper lid 159 and lower lid 145.
// - `IBUG_68`: the classic 68-point annotation produced by LBF/dlib style
//   models. The watched eyelid is the same eye, upper lid 37 and lower lid 41.

use crate::core_modules::landmark::LandmarkSet;
use serde::{Deserialize, Serialize};

/// A directed edge between two landmark indices, drawn as a line segment.
pub type Connection = (usize, usize);

/// The two landmarks whose vertical gap measures how open the eye is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyelidPair {
    pub upper: usize,
    pub lower: usize,
}

impl EyelidPair {
    pub const fn new(upper: usize, lower: usize) -> Self {
        Self { upper, lower }
    }

    /// Absolute vertical distance between the upper and lower eyelid.
    /// Returns `None` when the set does not contain either index.
    pub fn opening(&self, landmarks: &LandmarkSet) -> Option<f64> {
        let upper = landmarks.get(self.upper)?;
        let lower = landmarks.get(self.lower)?;
        Some((lower.y - upper.y).abs())
    }
}

/// Describes the landmark topology of one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkLayout {
    pub name: &'static str,
    /// Number of points the provider emits per face.
    pub landmark_count: usize,
    pub eyelids: EyelidPair,
    pub right_eye: &'static [Connection],
    pub left_eye: &'static [Connection],
    pub face_oval: &'static [Connection],
    pub lips: &'static [Connection],
}

impl LandmarkLayout {
    /// Looks up a shipped layout by its configuration name.
    pub fn by_name(name: &str) -> Option<&'static LandmarkLayout> {
        match name.to_ascii_lowercase().as_str() {
            "face_mesh" | "facemesh" => Some(&FACE_MESH),
            "ibug_68" | "ibug68" | "lbf" => Some(&IBUG_68),
            _ => None,
        }
    }
}

pub const FACE_MESH: LandmarkLayout = LandmarkLayout {
    name: "face_mesh",
    landmark_count: 478,
    eyelids: EyelidPair::new(159, 145),
    right_eye: FACE_MESH_RIGHT_EYE,
    left_eye: FACE_MESH_LEFT_EYE,
    face_oval: FACE_MESH_FACE_OVAL,
    lips: FACE_MESH_LIPS,
};

pub const IBUG_68: LandmarkLayout = LandmarkLayout {
    name: "ibug_68",
    landmark_count: 68,
    eyelids: EyelidPair::new(37, 41),
    right_eye: IBUG_RIGHT_EYE,
    left_eye: IBUG_LEFT_EYE,
    face_oval: IBUG_JAW,
    lips: IBUG_LIPS,
};

const FACE_MESH_RIGHT_EYE: &[Connection] = &[
    (33, 7), (7, 163), (163, 144), (144, 145), (145, 153), (153, 154), (154, 155), (155, 133),
    (33, 246), (246, 161), (161, 160), (160, 159), (159, 158), (158, 157), (157, 173), (173, 133),
];

const FACE_MESH_LEFT_EYE: &[Connection] = &[
    (263, 249), (249, 390), (390, 373), (373, 374), (374, 380), (380, 381), (381, 382), (382, 362),
    (263, 466), (466, 388), (388, 387), (387, 386), (386, 385), (385, 384), (384, 398), (398, 362),
];

const FACE_MESH_FACE_OVAL: &[Connection] = &[
    (10, 338), (338, 297), (297, 332), (332, 284), (284, 251), (251, 389), (389, 356), (356, 454),
    (454, 323), (323, 361), (361, 288), (288, 397), (397, 365), (365, 379), (379, 378), (378, 400),
    (400, 377), (377, 152), (152, 148), (148, 176), (176, 149), (149, 150), (150, 136), (136, 172),
    (172, 58), (58, 132), (132, 93), (93, 234), (234, 127), (127, 162), (162, 21), (21, 54),
    (54, 103), (103, 67), (67, 109), (109, 10),
];

const FACE_MESH_LIPS: &[Connection] = &[
    // outer, lower then upper
    (61, 146), (146, 91), (91, 181), (181, 84), (84, 17), (17, 314), (314, 405), (405, 321),
    (321, 375), (375, 291), (61, 185), (185, 40), (40, 39), (39, 37), (37, 0), (0, 267),
    (267, 269), (269, 270), (270, 409), (409, 291),
    // inner, lower then upper
    (78, 95), (95, 88), (88, 178), (178, 87), (87, 14), (14, 317), (317, 402), (402, 318),
    (318, 324), (324, 308), (78, 191), (191, 80), (80, 81), (81, 82), (82, 13), (13, 312),
    (312, 311), (311, 310), (310, 415), (415, 308),
];

const IBUG_RIGHT_EYE: &[Connection] = &[(36, 37), (37, 38), (38, 39), (39, 40), (40, 41), (41, 36)];

const IBUG_LEFT_EYE: &[Connection] = &[(42, 43), (43, 44), (44, 45), (45, 46), (46, 47), (47, 42)];

const IBUG_JAW: &[Connection] = &[
    (0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (6, 7), (7, 8),
    (8, 9), (9, 10), (10, 11), (11, 12), (12, 13), (13, 14), (14, 15), (15, 16),
];

const IBUG_LIPS: &[Connection] = &[
    (48, 49), (49, 50), (50, 51), (51, 52), (52, 53), (53, 54), (54, 55), (55, 56),
    (56, 57), (57, 58), (58, 59), (59, 48),
    (60, 61), (61, 62), (62, 63), (63, 64), (64, 65), (65, 66), (66, 67), (67, 60),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::landmark::Landmark;

    fn set_with_eyelids(count: usize, pair: EyelidPair, upper_y: f64, lower_y: f64) -> LandmarkSet {
        let mut points = vec![Landmark::planar(0.5, 0.5); count];
        points[pair.upper] = Landmark::planar(0.4, upper_y);
        points[pair.lower] = Landmark::planar(0.4, lower_y);
        LandmarkSet::new(points)
    }

    #[test]
    fn opening_is_absolute_vertical_gap() {
        let pair = FACE_MESH.eyelids;
        let set = set_with_eyelids(478, pair, 0.420, 0.440);
        let opening = pair.opening(&set).unwrap();
        assert!((opening - 0.02).abs() < 1e-12);

        // Swapped lids still yield a positive distance.
        let flipped = set_with_eyelids(478, pair, 0.440, 0.420);
        assert!((pair.opening(&flipped).unwrap() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn opening_is_none_when_index_missing() {
        let short = LandmarkSet::new(vec![Landmark::planar(0.5, 0.5); 68]);
        assert_eq!(FACE_MESH.eyelids.opening(&short), None);
        assert!(IBUG_68.eyelids.opening(&short).is_some());
    }

    #[test]
    fn every_connection_fits_its_layout() {
        for layout in [&FACE_MESH, &IBUG_68] {
            let edges = layout
                .right_eye
                .iter()
                .chain(layout.left_eye)
                .chain(layout.face_oval)
                .chain(layout.lips);
            for &(a, b) in edges {
                assert!(a < layout.landmark_count && b < layout.landmark_count, "{} edge {a}-{b}", layout.name);
            }
        }
    }

    #[test]
    fn layouts_resolve_by_name() {
        assert_eq!(LandmarkLayout::by_name("FACE_MESH").unwrap().name, "face_mesh");
        assert_eq!(LandmarkLayout::by_name("lbf").unwrap().eyelids, EyelidPair::new(37, 41));
        assert!(LandmarkLayout::by_name("hand").is_none());
    }
}
