//! Error types for the landmark pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::landmark::HandLabel;

/// Everything that can go wrong inside `pinch_core`.
///
/// Observation errors (`Undecodable` … `NonFiniteLandmark`) reject a single
/// hand for a single frame; they never abort the frame loop.
#[derive(Debug, Error)]
pub enum PinchError {
    #[error("hand entry is not a hand observation: {0}")]
    Undecodable(String),

    #[error("hand observation has no handedness label")]
    MissingLabel,

    #[error("unknown handedness label {0:?} (expected \"Left\" or \"Right\")")]
    UnknownLabel(String),

    #[error("{label} hand has {found} landmarks, expected 21")]
    LandmarkCount { label: HandLabel, found: usize },

    #[error("{label} hand landmark {index} is not a finite coordinate")]
    NonFiniteLandmark { label: HandLabel, index: usize },

    #[error("invalid configuration in {path:?}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
