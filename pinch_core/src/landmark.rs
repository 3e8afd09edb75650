//! Hand landmarks as delivered by the external detector.
//!
//! The detector is a black box.  Each frame it produces zero or more
//! [`RawHand`]s, each carrying 21 normalized points plus a handedness label.
//! [`HandObservation::parse`] turns a raw hand into a validated observation
//! with a fixed-size landmark array; anything malformed is rejected for that
//! frame only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PinchError;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (MediaPipe hand model convention)
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One tracked point.  `x`, `y` are normalized to the detector's input frame
/// (`[0,1]`, origin top-left, NOT mirrored).  `z` is relative depth and is
/// passed through untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Planar (x, y) Euclidean distance.
    pub fn distance_2d(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLabel
// ════════════════════════════════════════════════════════════════════════════

/// Detector-assigned handedness.  This is the only identity a hand has
/// across frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandLabel {
    Left,
    Right,
}

impl HandLabel {
    pub const ALL: [HandLabel; 2] = [HandLabel::Left, HandLabel::Right];

    pub fn name(self) -> &'static str {
        match self {
            HandLabel::Left  => "Left",
            HandLabel::Right => "Right",
        }
    }
}

impl fmt::Display for HandLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HandLabel {
    type Err = PinchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left"  => Ok(HandLabel::Left),
            "right" => Ok(HandLabel::Right),
            _       => Err(PinchError::UnknownLabel(s.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RawHand / HandObservation
// ════════════════════════════════════════════════════════════════════════════

fn default_confidence() -> f32 { 1.0 }

/// A hand exactly as the detector reported it.  Nothing is guaranteed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHand {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    /// Why the detector's entry for this hand could not be decoded.  The
    /// hand keeps its slot so it is rejected on its own.
    #[serde(skip)]
    pub undecodable: Option<String>,
}

impl RawHand {
    pub fn new(label: HandLabel, landmarks: Vec<Landmark>, confidence: f32) -> Self {
        RawHand {
            label: Some(label.name().to_string()),
            landmarks,
            confidence,
            undecodable: None,
        }
    }

    /// Placeholder for an entry that did not have the shape of a hand.
    pub fn undecodable(reason: impl Into<String>) -> Self {
        RawHand {
            label: None,
            landmarks: Vec::new(),
            confidence: default_confidence(),
            undecodable: Some(reason.into()),
        }
    }
}

/// Decode `hands` entry by entry, so one malformed hand cannot take the
/// rest of the frame down with it.
fn decode_hands<'de, D>(deserializer: D) -> Result<Vec<RawHand>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|entry| RawHand::deserialize(entry).unwrap_or_else(|e| RawHand::undecodable(e.to_string())))
        .collect())
}

/// A validated hand: known label, exactly 21 finite landmarks.
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    pub label:      HandLabel,
    pub landmarks:  [Landmark; LANDMARK_COUNT],
    pub confidence: f32,
}

impl HandObservation {
    /// Validate a raw detector hand.
    pub fn parse(raw: &RawHand) -> Result<Self, PinchError> {
        if let Some(reason) = &raw.undecodable {
            return Err(PinchError::Undecodable(reason.clone()));
        }

        let label: HandLabel = raw
            .label
            .as_deref()
            .ok_or(PinchError::MissingLabel)?
            .parse()?;

        let landmarks: [Landmark; LANDMARK_COUNT] = raw
            .landmarks
            .as_slice()
            .try_into()
            .map_err(|_| PinchError::LandmarkCount { label, found: raw.landmarks.len() })?;

        if let Some(index) = landmarks.iter().position(|lm| !lm.is_finite()) {
            return Err(PinchError::NonFiniteLandmark { label, index });
        }

        Ok(HandObservation { label, landmarks, confidence: raw.confidence })
    }

    pub fn thumb_tip(&self) -> Landmark { self.landmarks[THUMB_TIP] }
    pub fn index_tip(&self) -> Landmark { self.landmarks[INDEX_TIP] }
}

// ════════════════════════════════════════════════════════════════════════════
// VideoFrame / DetectorFrame
// ════════════════════════════════════════════════════════════════════════════

/// The camera image reduced to 8-bit luma, for the grayscale background.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VideoFrame {
    pub width:  usize,
    pub height: usize,
    pub luma:   Vec<u8>,
}

impl VideoFrame {
    /// Sample at normalized coordinates (nearest neighbour, clamped).
    pub fn sample(&self, nx: f32, ny: f32) -> u8 {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let x = ((nx.clamp(0.0, 1.0) * self.width as f32) as usize).min(self.width - 1);
        let y = ((ny.clamp(0.0, 1.0) * self.height as f32) as usize).min(self.height - 1);
        self.luma.get(y * self.width + x).copied().unwrap_or(0)
    }
}

/// Everything the detector produced for one processed video frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorFrame {
    /// Monotonic milliseconds since the frame source started.
    pub timestamp_ms: u64,
    #[serde(default, deserialize_with = "decode_hands")]
    pub hands: Vec<RawHand>,
    #[serde(skip)]
    pub image: Option<VideoFrame>,
}

impl DetectorFrame {
    pub fn new(timestamp_ms: u64, hands: Vec<RawHand>) -> Self {
        DetectorFrame { timestamp_ms, hands, image: None }
    }

    pub fn with_image(mut self, image: VideoFrame) -> Self {
        self.image = Some(image);
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
