// THEORY:
// All tunable behavior lives in `UnlockConfig`. Defaults reproduce the demo as it
// was calibrated: a single tracked face, permissive detection confidences that
// favor recall, a 640x480 camera and a blink threshold of 0.008 in normalized
// units. A JSON file can override any subset of fields, and `BU_*` environment
// variables override the file.

use crate::core_modules::layout::{EyelidPair, LandmarkLayout};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BLINK_THRESHOLD: f64 = 0.008;

/// Options handed to the landmark provider before the first frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionOptions {
    pub max_faces: usize,
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for VisionOptions {
    fn default() -> Self {
        Self {
            max_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.2,
            min_tracking_confidence: 0.2,
        }
    }
}

/// Requested capture resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self { width: 640, height: 480 }
    }
}

/// What the hidden section shows once unlocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockedContent {
    pub heading: String,
    pub body: String,
    /// CSS color applied to the section background.
    pub accent: String,
}

impl Default for UnlockedContent {
    fn default() -> Self {
        Self {
            heading: "Guide Unlocked!".to_string(),
            body: "The chatbot will now tell you the museum's secret. Head back up!".to_string(),
            accent: "#d4edda".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockConfig {
    /// The eye counts as closed when its opening is strictly below this value.
    pub blink_threshold: f64,
    /// Name of the landmark layout the provider emits, see `LandmarkLayout::by_name`.
    pub layout: String,
    /// Overrides the layout's eyelid indices.
    pub eyelids: Option<EyelidPair>,
    pub vision: VisionOptions,
    pub camera: CameraOptions,
    pub content: UnlockedContent,
    pub log_level: String,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            blink_threshold: DEFAULT_BLINK_THRESHOLD,
            layout: "face_mesh".to_string(),
            eyelids: None,
            vision: VisionOptions::default(),
            camera: CameraOptions::default(),
            content: UnlockedContent::default(),
            log_level: "info".to_string(),
        }
    }
}

impl UnlockConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: UnlockConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `BU_*` overrides fetched through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BU_BLINK_THRESHOLD") {
            self.blink_threshold = parse_var("BU_BLINK_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("BU_CAMERA_WIDTH") {
            self.camera.width = parse_var("BU_CAMERA_WIDTH", &v)?;
        }
        if let Some(v) = lookup("BU_CAMERA_HEIGHT") {
            self.camera.height = parse_var("BU_CAMERA_HEIGHT", &v)?;
        }
        if let Some(v) = lookup("BU_LAYOUT") {
            if !v.is_empty() {
                self.layout = v;
            }
        }
        if let Some(v) = lookup("BU_LOG") {
            if !v.is_empty() {
                self.log_level = v;
            }
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.blink_threshold.is_finite() || self.blink_threshold <= 0.0 {
            return Err(Error::Config(format!("blink_threshold must be positive, got {}", self.blink_threshold)));
        }
        if self.vision.max_faces == 0 {
            return Err(Error::Config("vision.max_faces must be at least 1".into()));
        }
        for (name, value) in [
            ("min_detection_confidence", self.vision.min_detection_confidence),
            ("min_tracking_confidence", self.vision.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("vision.{name} must be within [0, 1], got {value}")));
            }
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(Error::Config("camera resolution must be non-zero".into()));
        }
        let layout = self.landmark_layout()?;
        if let Some(pair) = self.eyelids {
            for (name, index) in [("upper", pair.upper), ("lower", pair.lower)] {
                if index >= layout.landmark_count {
                    return Err(Error::Config(format!(
                        "eyelids.{name} = {index} is outside the `{}` layout ({} landmarks)",
                        layout.name, layout.landmark_count
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn landmark_layout(&self) -> Result<&'static LandmarkLayout> {
        LandmarkLayout::by_name(&self.layout)
            .ok_or_else(|| Error::Config(format!("unknown landmark layout `{}`", self.layout)))
    }

    /// The eyelid pair in effect: the explicit override, else the layout's own.
    pub fn eyelid_pair(&self) -> Result<EyelidPair> {
        match self.eyelids {
            Some(pair) => Ok(pair),
            None => Ok(self.landmark_layout()?.eyelids),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} has an invalid value `{value}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_calibrated_demo() {
        let config = UnlockConfig::default();
        assert_eq!(config.blink_threshold, 0.008);
        assert_eq!(config.vision.max_faces, 1);
        assert!(config.vision.refine_landmarks);
        assert_eq!(config.vision.min_detection_confidence, 0.2);
        assert_eq!(config.camera, CameraOptions { width: 640, height: 480 });
        assert_eq!(config.eyelid_pair().unwrap(), EyelidPair::new(159, 145));
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = UnlockConfig::from_json_str(r#"{ "blink_threshold": 0.01, "camera": { "width": 1280 } }"#).unwrap();
        assert_eq!(config.blink_threshold, 0.01);
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.camera.height, 480);
        assert_eq!(config.layout, "face_mesh");
    }

    #[test]
    fn json_eyelid_override_wins_over_layout() {
        let config = UnlockConfig::from_json_str(r#"{ "layout": "ibug_68", "eyelids": { "upper": 38, "lower": 40 } }"#).unwrap();
        assert_eq!(config.eyelid_pair().unwrap(), EyelidPair::new(38, 40));
    }

    #[test]
    fn eyelid_override_must_fit_the_layout() {
        let result = UnlockConfig::from_json_str(r#"{ "eyelids": { "upper": 600, "lower": 601 } }"#);
        assert!(matches!(result, Err(Error::Config(_))));

        let result = UnlockConfig::from_json_str(r#"{ "layout": "ibug_68", "eyelids": { "upper": 37, "lower": 68 } }"#);
        assert!(matches!(result, Err(Error::Config(_))));

        UnlockConfig::from_json_str(r#"{ "eyelids": { "upper": 386, "lower": 374 } }"#).unwrap();
    }

    #[test]
    fn rejects_non_positive_threshold_and_unknown_layout() {
        assert!(matches!(UnlockConfig::from_json_str(r#"{ "blink_threshold": 0.0 }"#), Err(Error::Config(_))));
        assert!(matches!(UnlockConfig::from_json_str(r#"{ "layout": "hands" }"#), Err(Error::Config(_))));
        assert!(matches!(UnlockConfig::from_json_str("not json"), Err(Error::Json(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("BU_BLINK_THRESHOLD", "0.012"), ("BU_CAMERA_HEIGHT", "720"), ("BU_LAYOUT", "lbf")]);
        let mut config = UnlockConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.blink_threshold, 0.012);
        assert_eq!(config.camera.height, 720);
        assert_eq!(config.eyelid_pair().unwrap(), EyelidPair::new(37, 41));
    }

    #[test]
    fn env_override_with_garbage_is_an_error() {
        let mut config = UnlockConfig::default();
        let result = config.apply_env(|k| (k == "BU_CAMERA_WIDTH").then(|| "wide".to_string()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn load_reads_a_file() {
        let path = std::env::temp_dir().join(format!("blink_unlock_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "log_level": "debug" }"#).unwrap();
        let config = UnlockConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.log_level, "debug");
    }
}
