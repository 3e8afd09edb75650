//! Pinch recognition from the thumb-tip / index-tip distance.
//!
//! Two thresholds exist on purpose:
//!
//! | Threshold | Default | Used for |
//! |---|---|---|
//! | `click_threshold` | 0.05 | arming the click state machine |
//! | `label_threshold` | 0.1  | the "Pinch"/"None" readout only |
//!
//! Both are in normalized detector units, so they hold at any resolution.
//! Never scale landmarks to pixels before measuring.

use std::fmt;

use serde::Serialize;

use crate::config::PinchConfig;
use crate::landmark::{Landmark, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP};

/// Text shown next to each hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum GestureLabel {
    Pinch,
    Neutral,
}

impl GestureLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            GestureLabel::Pinch   => "Pinch",
            GestureLabel::Neutral => "None",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame's measurement for one hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchReading {
    pub distance: f32,
    /// Below the click threshold.
    pub pinching: bool,
    pub label:    GestureLabel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchDetector {
    click_threshold: f32,
    label_threshold: f32,
}

impl Default for PinchDetector {
    fn default() -> Self {
        Self::new(Self::CLICK_THRESHOLD, Self::LABEL_THRESHOLD)
    }
}

impl PinchDetector {
    pub const CLICK_THRESHOLD: f32 = 0.05;
    pub const LABEL_THRESHOLD: f32 = 0.1;

    pub fn new(click_threshold: f32, label_threshold: f32) -> Self {
        Self { click_threshold, label_threshold }
    }

    pub fn from_config(config: &PinchConfig) -> Self {
        Self::new(config.click_threshold, config.label_threshold)
    }

    pub fn click_threshold(&self) -> f32 { self.click_threshold }
    pub fn label_threshold(&self) -> f32 { self.label_threshold }

    pub fn distance(thumb_tip: &Landmark, index_tip: &Landmark) -> f32 {
        thumb_tip.distance_2d(index_tip)
    }

    pub fn is_pinching(&self, thumb_tip: &Landmark, index_tip: &Landmark) -> bool {
        Self::distance(thumb_tip, index_tip) < self.click_threshold
    }

    pub fn label_for(&self, distance: f32) -> GestureLabel {
        if distance < self.label_threshold {
            GestureLabel::Pinch
        } else {
            GestureLabel::Neutral
        }
    }

    /// Measure a full (smoothed) hand.
    pub fn measure(&self, landmarks: &[Landmark; LANDMARK_COUNT]) -> PinchReading {
        let distance = Self::distance(&landmarks[THUMB_TIP], &landmarks[INDEX_TIP]);
        PinchReading {
            distance,
            pinching: distance < self.click_threshold,
            label: self.label_for(distance),
        }
    }
}
