//! # pinch_core
//!
//! Turns a per-frame hand-landmark stream into synthetic pointer input.
//! Each detector frame (0–2 hands, 21 normalized points each) runs through
//! six stages, synchronously, once per hand:
//!
//! | Stage | Type | Per-hand state |
//! |---|---|---|
//! | Smoothing | [`LandmarkSmoother`] | last smoothed pose |
//! | Pinch recognition | [`PinchDetector`] | none |
//! | Dwell click | [`ClickStateMachine`] | pinch start, clicked flag |
//! | Hover | [`HoverTracker`] | hovered element |
//! | Mirror mapping | [`CoordinateMapper`] | none |
//! | Dispatch + feedback | [`SyntheticInputDispatcher`] | click markers |
//!
//! [`GestureSession`] owns all of it.  The UI is reached only through the
//! [`UiHost`] trait (hit test + dispatch), so any toolkit can sit behind it.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pinch_core::{DetectorFrame, GestureConfig, GestureSession, PointerEvent, ScreenPoint, UiHost};
//!
//! struct Button;
//!
//! impl UiHost for Button {
//!     type Element = u32;
//!     fn hit_test(&self, p: ScreenPoint) -> Option<u32> { (p.x < 200.0).then_some(1) }
//!     fn dispatch(&mut self, target: &u32, event: &PointerEvent) {
//!         println!("{:?} → element {}", event.kind, target);
//!     }
//! }
//!
//! let mut session = GestureSession::new(&GestureConfig::default());
//! let frame = DetectorFrame::new(0, vec![]);
//! let report = session.process_frame(&frame, &mut Button);
//! assert_eq!(report.clicks(), 0);
//! ```

pub mod click;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod hover;
pub mod landmark;
pub mod mapper;
pub mod per_hand;
pub mod pinch;
pub mod session;
pub mod smoother;

pub use click::{ClickPhase, ClickStateMachine, ClickTransition, GestureState};
pub use config::{
    ClickConfig, DetectorOptions, DispatchConfig, FeedbackConfig, GestureConfig, MappingConfig,
    PinchConfig, SmoothingConfig,
};
pub use dispatch::{ClickMarker, EventKind, PointerEvent, SyntheticInputDispatcher, UiHost};
pub use error::PinchError;
pub use hover::{HoverChange, HoverState, HoverTracker};
pub use landmark::{DetectorFrame, HandLabel, HandObservation, Landmark, RawHand, VideoFrame, LANDMARK_COUNT};
pub use mapper::{to_screen, CoordinateMapper, ScreenPoint, Viewport};
pub use per_hand::PerHand;
pub use pinch::{GestureLabel, PinchDetector, PinchReading};
pub use session::{FrameReport, GestureSession, HandOutcome, HandReadout, RejectedHand};
pub use smoother::{LandmarkSmoother, SmoothingBuffer};
