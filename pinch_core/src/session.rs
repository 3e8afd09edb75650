//! `GestureSession`: the owner of every piece of per-hand state.
//!
//! One session lives for as long as frames are being requested.  Each
//! detector callback hands its frame to [`GestureSession::process_frame`],
//! which runs the whole pipeline synchronously for every hand:
//!
//! ```text
//! RawHand ─parse─▶ smooth ─▶ pinch ─▶ map ─▶ hover ─▶ click ─▶ dispatch
//! ```
//!
//! Hands are keyed by label only.  A hand missing from a frame keeps its
//! state untouched until it shows up again or the session is torn down.

use std::fmt;

use tracing::{debug, warn};

use crate::click::{ClickPhase, ClickStateMachine, ClickTransition};
use crate::config::GestureConfig;
use crate::dispatch::{ClickMarker, SyntheticInputDispatcher, UiHost};
use crate::error::PinchError;
use crate::hover::{HoverChange, HoverTracker};
use crate::landmark::{DetectorFrame, HandLabel, HandObservation, RawHand, INDEX_TIP, LANDMARK_COUNT};
use crate::mapper::{CoordinateMapper, ScreenPoint};
use crate::pinch::{GestureLabel, PinchDetector};
use crate::smoother::{LandmarkSmoother, SmoothingBuffer};

// ════════════════════════════════════════════════════════════════════════════
// Per-frame results
// ════════════════════════════════════════════════════════════════════════════

/// What the renderer needs to draw one hand this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HandReadout {
    pub label:          HandLabel,
    pub gesture:        GestureLabel,
    pub pinch_distance: f32,
    pub pointer:        ScreenPoint,
    pub dots:           [ScreenPoint; LANDMARK_COUNT],
    pub phase:          ClickPhase,
}

/// Outcome for one accepted hand.
#[derive(Clone, Debug, PartialEq)]
pub struct HandOutcome<E> {
    pub label:        HandLabel,
    pub gesture:      GestureLabel,
    pub pointer:      ScreenPoint,
    pub transition:   ClickTransition,
    pub hover:        HoverChange<E>,
    /// `Some(target)` when a click fired this frame; the target itself is
    /// `None` if the click landed on empty space.
    pub click:        Option<Option<E>>,
}

impl<E> HandOutcome<E> {
    pub fn fired(&self) -> bool {
        self.click.is_some()
    }
}

#[derive(Debug)]
pub struct RejectedHand {
    /// Position of the hand in the detector's list.
    pub index: usize,
    pub error: PinchError,
}

#[derive(Debug)]
pub struct FrameReport<E> {
    pub timestamp_ms: u64,
    pub hands:        Vec<HandOutcome<E>>,
    pub rejected:     Vec<RejectedHand>,
}

impl<E> FrameReport<E> {
    pub fn clicks(&self) -> usize {
        self.hands.iter().filter(|h| h.fired()).count()
    }

    pub fn hand(&self, label: HandLabel) -> Option<&HandOutcome<E>> {
        self.hands.iter().find(|h| h.label == label)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSession
// ════════════════════════════════════════════════════════════════════════════

pub struct GestureSession<E> {
    smoother:   LandmarkSmoother,
    pinch:      PinchDetector,
    clicks:     ClickStateMachine,
    hover:      HoverTracker<E>,
    mapper:     CoordinateMapper,
    dispatcher: SyntheticInputDispatcher,
    readouts:   Vec<HandReadout>,
    frames:     u64,
}

impl<E: Clone + PartialEq + fmt::Debug> Default for GestureSession<E> {
    fn default() -> Self {
        Self::new(&GestureConfig::default())
    }
}

impl<E: Clone + PartialEq + fmt::Debug> GestureSession<E> {
    pub fn new(config: &GestureConfig) -> Self {
        GestureSession {
            smoother:   LandmarkSmoother::from_config(&config.smoothing),
            pinch:      PinchDetector::from_config(&config.pinch),
            clicks:     ClickStateMachine::from_config(&config.click),
            hover:      HoverTracker::new(),
            mapper:     CoordinateMapper::from_config(&config.mapping),
            dispatcher: SyntheticInputDispatcher::from_config(&config.feedback, &config.dispatch),
            readouts:   Vec::new(),
            frames:     0,
        }
    }

    /// Run the full pipeline on one detector frame.
    pub fn process_frame<H>(&mut self, frame: &DetectorFrame, host: &mut H) -> FrameReport<E>
    where
        H: UiHost<Element = E>,
    {
        let now = frame.timestamp_ms;
        self.frames += 1;
        self.readouts.clear();

        let mut report = FrameReport { timestamp_ms: now, hands: Vec::new(), rejected: Vec::new() };

        for (index, raw) in frame.hands.iter().enumerate() {
            match self.process_hand(raw, now, host) {
                Ok(outcome) => report.hands.push(outcome),
                Err(error) => {
                    warn!(index, %error, "rejected hand observation");
                    report.rejected.push(RejectedHand { index, error });
                }
            }
        }

        self.dispatcher.prune(now);
        report
    }

    fn process_hand<H>(&mut self, raw: &RawHand, now: u64, host: &mut H) -> Result<HandOutcome<E>, PinchError>
    where
        H: UiHost<Element = E>,
    {
        let obs = HandObservation::parse(raw)?;
        let label = obs.label;

        let smoothed = self.smoother.smooth(label, &obs.landmarks);
        let reading = self.pinch.measure(&smoothed);
        let pointer = self.mapper.map(&smoothed[INDEX_TIP]);

        let hover = self.hover.update(label, host.hit_test(pointer));
        self.dispatcher.dispatch_hover(host, &hover, pointer, label, now);
        self.dispatcher.dispatch_move(host, self.hover.hovered(label), pointer, label, now);

        let transition = self.clicks.update(label, reading.pinching, now);
        let click = match transition {
            ClickTransition::Fire => Some(self.dispatcher.dispatch_click(host, pointer, label, now)),
            ClickTransition::Started => {
                debug!(%label, distance = reading.distance, "pinch started");
                None
            }
            ClickTransition::Released => {
                debug!(%label, "pinch released");
                None
            }
            _ => None,
        };

        self.readouts.push(HandReadout {
            label,
            gesture: reading.label,
            pinch_distance: reading.distance,
            pointer,
            dots: self.mapper.map_all(&smoothed),
            phase: self.clicks.phase(label),
        });

        Ok(HandOutcome { label, gesture: reading.label, pointer, transition, hover, click })
    }

    /// Release every piece of per-hand state.  Called when frames stop being
    /// requested, so nothing leaks into a restarted session.
    pub fn teardown(&mut self) {
        self.smoother.clear();
        self.clicks.clear();
        self.hover.clear();
        self.dispatcher.clear();
        self.readouts.clear();
        debug!(frames = self.frames, "gesture session torn down");
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    /// Hands seen in the most recent frame.
    pub fn readouts(&self) -> &[HandReadout] {
        &self.readouts
    }

    pub fn markers(&self, now_ms: u64) -> impl Iterator<Item = (&ClickMarker, f32)> + '_ {
        self.dispatcher.markers(now_ms)
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn click_phase(&self, label: HandLabel) -> ClickPhase {
        self.clicks.phase(label)
    }

    pub fn hovered(&self, label: HandLabel) -> Option<&E> {
        self.hover.hovered(label)
    }

    pub fn smoothing_buffer(&self, label: HandLabel) -> Option<&SmoothingBuffer> {
        self.smoother.buffer(label)
    }

    /// Labels holding any per-hand state.
    pub fn tracked_hands(&self) -> Vec<HandLabel> {
        HandLabel::ALL
            .into_iter()
            .filter(|&l| {
                self.smoother.buffer(l).is_some()
                    || self.clicks.state(l).is_some()
                    || self.hover.tracked().contains(&l)
            })
            .collect()
    }

    pub fn marker_count(&self) -> usize {
        self.dispatcher.marker_count()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{EventKind, PointerEvent};
    use crate::landmark::{Landmark, THUMB_TIP};

    #[derive(Default)]
    struct Recorder {
        events: Vec<(&'static str, EventKind)>,
    }

    /// Left half of the 1280-wide screen is "a", right half is "b".
    impl UiHost for Recorder {
        type Element = &'static str;

        fn hit_test(&self, p: ScreenPoint) -> Option<&'static str> {
            Some(if p.x < 640.0 { "a" } else { "b" })
        }

        fn dispatch(&mut self, target: &&'static str, event: &PointerEvent) {
            self.events.push((*target, event.kind));
        }
    }

    fn hand(label: HandLabel, x: f32, gap: f32) -> RawHand {
        let mut lms = vec![Landmark::new(x, 0.5, 0.0); LANDMARK_COUNT];
        lms[THUMB_TIP] = Landmark::new(x - gap, 0.5, 0.0);
        RawHand::new(label, lms, 0.9)
    }

    #[test]
    fn empty_frame_leaves_state_alone() {
        let mut s: GestureSession<&'static str> = GestureSession::default();
        let mut host = Recorder::default();
        s.process_frame(&DetectorFrame::new(0, vec![hand(HandLabel::Right, 0.25, 0.01)]), &mut host);
        let buf = *s.smoothing_buffer(HandLabel::Right).unwrap();

        let report = s.process_frame(&DetectorFrame::new(100, vec![]), &mut host);
        assert!(report.hands.is_empty());
        assert!(s.readouts().is_empty());
        assert_eq!(s.smoothing_buffer(HandLabel::Right), Some(&buf));
        assert_eq!(s.click_phase(HandLabel::Right), ClickPhase::Pinching { since_ms: 0 });
        assert_eq!(s.hovered(HandLabel::Right), Some(&"b"));
    }

    #[test]
    fn hover_enters_then_switches() {
        let mut s: GestureSession<&'static str> = GestureSession::default();
        let mut host = Recorder::default();
        // x = 0.25 mirrors to screen 960 → "b"
        s.process_frame(&DetectorFrame::new(0, vec![hand(HandLabel::Left, 0.25, 0.3)]), &mut host);
        assert_eq!(host.events, vec![("b", EventKind::PointerEnter)]);

        // Jump far enough that even smoothed x crosses to the left half.
        for t in 1..20 {
            s.process_frame(&DetectorFrame::new(t * 33, vec![hand(HandLabel::Left, 0.9, 0.3)]), &mut host);
        }
        assert_eq!(
            host.events,
            vec![("b", EventKind::PointerEnter), ("b", EventKind::PointerLeave), ("a", EventKind::PointerEnter)]
        );
    }

    #[test]
    fn malformed_hand_is_rejected_alone() {
        let mut s: GestureSession<&'static str> = GestureSession::default();
        let mut host = Recorder::default();
        let mut bad = hand(HandLabel::Left, 0.5, 0.01);
        bad.landmarks.truncate(20);
        let report = s.process_frame(
            &DetectorFrame::new(0, vec![bad, hand(HandLabel::Right, 0.5, 0.01)]),
            &mut host,
        );
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 0);
        assert_eq!(report.hands.len(), 1);
        assert!(s.smoothing_buffer(HandLabel::Left).is_none());
        assert_eq!(s.tracked_hands(), vec![HandLabel::Right]);
    }

    #[test]
    fn teardown_releases_everything() {
        let mut s: GestureSession<&'static str> = GestureSession::new(&GestureConfig {
            click: crate::config::ClickConfig { dwell_ms: 0 },
            ..GestureConfig::default()
        });
        let mut host = Recorder::default();
        let r = s.process_frame(
            &DetectorFrame::new(0, vec![hand(HandLabel::Left, 0.2, 0.01), hand(HandLabel::Right, 0.8, 0.01)]),
            &mut host,
        );
        assert_eq!(r.clicks(), 2);
        assert_eq!(s.marker_count(), 2);

        s.teardown();
        assert!(s.tracked_hands().is_empty());
        assert_eq!(s.marker_count(), 0);
        assert!(s.readouts().is_empty());
    }

    #[test]
    fn readout_reports_gesture_and_dots() {
        let mut s: GestureSession<&'static str> = GestureSession::default();
        let mut host = Recorder::default();
        s.process_frame(&DetectorFrame::new(0, vec![hand(HandLabel::Right, 0.25, 0.08)]), &mut host);
        let r = &s.readouts()[0];
        assert_eq!(r.gesture, GestureLabel::Pinch);
        assert_eq!(r.phase, ClickPhase::Idle);
        assert_eq!(r.pointer, ScreenPoint::new(960.0, 360.0));
        assert_eq!(r.dots[INDEX_TIP], r.pointer);
    }
}
