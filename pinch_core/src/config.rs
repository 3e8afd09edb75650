//! Pipeline configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! canonical behaviour: 0.7 smoothing weight, 0.05 click pinch, 0.1 label
//! pinch, 500 ms dwell, 2000 ms marker lifetime, mirrored 1280×720 canvas.
//!
//! ```toml
//! [click]
//! dwell_ms = 650
//!
//! [mapping]
//! canvas_width  = 1920
//! canvas_height = 1080
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PinchError;
use crate::landmark::RawHand;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub pinch: PinchConfig,
    #[serde(default)]
    pub click: ClickConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub detector: DetectorOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Weight of the previous smoothed value (raw weight is `1 - this`).
    #[serde(default = "default_previous_weight")]
    pub previous_weight: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinchConfig {
    /// Normalized thumb/index distance below which a pinch can click.
    #[serde(default = "default_click_threshold")]
    pub click_threshold: f32,
    /// Looser distance used only for the on-screen gesture readout.
    #[serde(default = "default_label_threshold")]
    pub label_threshold: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClickConfig {
    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_marker_lifetime_ms")]
    pub marker_lifetime_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f32,
    /// Page offset of the canvas' top-left corner.
    #[serde(default)]
    pub origin_x: f32,
    #[serde(default)]
    pub origin_y: f32,
    /// The video is shown selfie-style; screen X must be flipped.
    #[serde(default = "default_true")]
    pub mirrored: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Also deliver a `PointerMove` to the hovered element every frame.
    #[serde(default)]
    pub pointer_move: bool,
}

/// Options handed to the external landmark detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorOptions {
    #[serde(default = "default_max_hands")]
    pub max_hands: usize,
    #[serde(default = "default_model_complexity")]
    pub model_complexity: u8,
    #[serde(default = "default_confidence")]
    pub min_detection_confidence: f32,
    #[serde(default = "default_confidence")]
    pub min_tracking_confidence: f32,
}

fn default_previous_weight() -> f32 { 0.7 }
fn default_click_threshold() -> f32 { 0.05 }
fn default_label_threshold() -> f32 { 0.1 }
fn default_dwell_ms() -> u64 { 500 }
fn default_marker_lifetime_ms() -> u64 { 2000 }
fn default_canvas_width() -> f32 { 1280.0 }
fn default_canvas_height() -> f32 { 720.0 }
fn default_true() -> bool { true }
fn default_max_hands() -> usize { 2 }
fn default_model_complexity() -> u8 { 1 }
fn default_confidence() -> f32 { 0.5 }

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { previous_weight: default_previous_weight() }
    }
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            click_threshold: default_click_threshold(),
            label_threshold: default_label_threshold(),
        }
    }
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self { dwell_ms: default_dwell_ms() }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self { marker_lifetime_ms: default_marker_lifetime_ms() }
    }
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            origin_x: 0.0,
            origin_y: 0.0,
            mirrored: default_true(),
        }
    }
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_hands: default_max_hands(),
            model_complexity: default_model_complexity(),
            min_detection_confidence: default_confidence(),
            min_tracking_confidence: default_confidence(),
        }
    }
}

impl DetectorOptions {
    /// Apply the detector's own admission rules to a frame's hands: drop
    /// low-confidence hands and keep at most `max_hands`, in detector order.
    pub fn admit(&self, hands: Vec<RawHand>) -> Vec<RawHand> {
        hands
            .into_iter()
            .filter(|h| h.confidence >= self.min_detection_confidence)
            .take(self.max_hands)
            .collect()
    }
}

impl GestureConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PinchError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| PinchError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`load`](Self::load) but falls back to defaults.  A missing file
    /// is normal; an unreadable or invalid one is logged.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(cfg) => {
                info!(path = %path.display(), "loaded gesture config");
                cfg
            }
            Err(PinchError::Io(e)) if e.kind() == ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring gesture config, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::HandLabel;

    #[test]
    fn empty_document_gives_canonical_values() {
        let cfg: GestureConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, GestureConfig::default());
        assert_eq!(cfg.smoothing.previous_weight, 0.7);
        assert_eq!(cfg.pinch.click_threshold, 0.05);
        assert_eq!(cfg.pinch.label_threshold, 0.1);
        assert_eq!(cfg.click.dwell_ms, 500);
        assert_eq!(cfg.feedback.marker_lifetime_ms, 2000);
        assert!(cfg.mapping.mirrored);
        assert_eq!(cfg.detector.max_hands, 2);
        assert_eq!(cfg.detector.min_tracking_confidence, 0.5);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: GestureConfig = toml::from_str(
            "[click]\ndwell_ms = 650\n[mapping]\ncanvas_width = 1920.0\n",
        )
        .unwrap();
        assert_eq!(cfg.click.dwell_ms, 650);
        assert_eq!(cfg.mapping.canvas_width, 1920.0);
        assert_eq!(cfg.mapping.canvas_height, 720.0);
        assert_eq!(cfg.pinch.click_threshold, 0.05);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = GestureConfig::load_or_default("/nonexistent/pinch/config.toml");
        assert_eq!(cfg, GestureConfig::default());
        assert!(matches!(
            GestureConfig::load("/nonexistent/pinch/config.toml"),
            Err(PinchError::Io(_))
        ));
    }

    #[test]
    fn invalid_file_reports_path() {
        let path = std::env::temp_dir().join(format!("pinch_core_bad_{}.toml", std::process::id()));
        fs::write(&path, "[click]\ndwell_ms = \"soon\"\n").unwrap();
        let err = GestureConfig::load(&path).unwrap_err();
        assert!(matches!(err, PinchError::Config { .. }));
        assert_eq!(GestureConfig::load_or_default(&path), GestureConfig::default());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn admit_filters_confidence_and_caps_count() {
        let opts = DetectorOptions::default();
        let hands = vec![
            RawHand::new(HandLabel::Left, vec![], 0.9),
            RawHand::new(HandLabel::Right, vec![], 0.2),
            RawHand::new(HandLabel::Right, vec![], 0.6),
            RawHand::new(HandLabel::Left, vec![], 0.7),
        ];
        let admitted = opts.admit(hands);
        assert_eq!(admitted.len(), 2);
        assert_eq!(admitted[0].confidence, 0.9);
        assert_eq!(admitted[1].confidence, 0.6);
    }
}
