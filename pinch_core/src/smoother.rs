//! Fixed-weight exponential smoothing of landmark positions, per hand.
//!
//! `smoothed = w * previous + (1 - w) * raw` on x and y, with `w = 0.7` by
//! default.  The first observation of a label passes through unchanged and
//! seeds that label's buffer.

use crate::config::SmoothingConfig;
use crate::landmark::{HandLabel, Landmark, LANDMARK_COUNT};
use crate::per_hand::PerHand;

/// The last smoothed pose of one hand.
pub type SmoothingBuffer = [Landmark; LANDMARK_COUNT];

pub struct LandmarkSmoother {
    previous_weight: f32,
    buffers: PerHand<SmoothingBuffer>,
}

impl Default for LandmarkSmoother {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREVIOUS_WEIGHT)
    }
}

impl LandmarkSmoother {
    pub const DEFAULT_PREVIOUS_WEIGHT: f32 = 0.7;

    /// `previous_weight` is clamped to `[0, 0.99]`; 1.0 would freeze the
    /// output at the first frame forever.
    pub fn new(previous_weight: f32) -> Self {
        Self {
            previous_weight: previous_weight.clamp(0.0, 0.99),
            buffers: PerHand::new(),
        }
    }

    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self::new(config.previous_weight)
    }

    pub fn previous_weight(&self) -> f32 {
        self.previous_weight
    }

    pub fn smooth(&mut self, label: HandLabel, raw: &[Landmark; LANDMARK_COUNT]) -> SmoothingBuffer {
        let w = self.previous_weight;
        if let Some(buffer) = self.buffers.get_mut(label) {
            for (prev, cur) in buffer.iter_mut().zip(raw.iter()) {
                prev.x = w * prev.x + (1.0 - w) * cur.x;
                prev.y = w * prev.y + (1.0 - w) * cur.y;
                prev.z = cur.z;
            }
            return *buffer;
        }

        self.buffers.insert(label, *raw);
        *raw
    }

    pub fn buffer(&self, label: HandLabel) -> Option<&SmoothingBuffer> {
        self.buffers.get(label)
    }

    pub fn forget(&mut self, label: HandLabel) {
        self.buffers.remove(label);
    }

    pub fn clear(&mut self) {
        self.buffers.clear();
    }

    pub fn tracked(&self) -> Vec<HandLabel> {
        self.buffers.labels()
    }
}
