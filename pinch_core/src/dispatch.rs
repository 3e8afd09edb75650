//! Synthetic pointer dispatch and click feedback.
//!
//! The pipeline never talks to a concrete UI toolkit.  It only needs a
//! [`UiHost`]: something that can say which element occupies a screen point
//! and can deliver a pointer event to that element.  Bubbling through the
//! host's own element tree is the host's business, exactly as it would be for
//! a real mouse click.
//!
//! Click markers fade by wall-clock age, recomputed whenever they are read;
//! there are no timers.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::{DispatchConfig, FeedbackConfig};
use crate::hover::HoverChange;
use crate::landmark::HandLabel;
use crate::mapper::ScreenPoint;

// ════════════════════════════════════════════════════════════════════════════
// Events
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Click,
    PointerEnter,
    PointerLeave,
    PointerMove,
}

impl EventKind {
    /// Enter/leave are delivered to one element only; click and move
    /// propagate to ancestors.
    pub fn bubbles(self) -> bool {
        matches!(self, EventKind::Click | EventKind::PointerMove)
    }
}

/// What a host receives.  Carries the same coordinates a real pointer event
/// would (`client_x`, `client_y`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PointerEvent {
    pub kind:         EventKind,
    pub client_x:     f32,
    pub client_y:     f32,
    pub hand:         HandLabel,
    pub bubbles:      bool,
    pub timestamp_ms: u64,
}

impl PointerEvent {
    pub fn new(kind: EventKind, at: ScreenPoint, hand: HandLabel, timestamp_ms: u64) -> Self {
        PointerEvent {
            kind,
            client_x: at.x,
            client_y: at.y,
            hand,
            bubbles: kind.bubbles(),
            timestamp_ms,
        }
    }

    pub fn position(&self) -> ScreenPoint {
        ScreenPoint::new(self.client_x, self.client_y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// UiHost: the only capability the pipeline needs from the UI
// ════════════════════════════════════════════════════════════════════════════

pub trait UiHost {
    /// Opaque handle to a UI element.
    type Element: Clone + PartialEq + fmt::Debug;

    /// Topmost element at `point`, or `None` over empty space.
    fn hit_test(&self, point: ScreenPoint) -> Option<Self::Element>;

    /// Deliver `event` to `target` (and its ancestors when it bubbles).
    fn dispatch(&mut self, target: &Self::Element, event: &PointerEvent);
}

// ════════════════════════════════════════════════════════════════════════════
// ClickMarker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ClickMarker {
    pub x:             f32,
    pub y:             f32,
    pub created_at_ms: u64,
    pub hand:          HandLabel,
}

impl ClickMarker {
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at_ms)
    }

    /// 1.0 when fresh, linearly down to 0.0 at `lifetime_ms`.
    pub fn opacity(&self, now_ms: u64, lifetime_ms: u64) -> f32 {
        if lifetime_ms == 0 {
            return 0.0;
        }
        (1.0 - self.age_ms(now_ms) as f32 / lifetime_ms as f32).max(0.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SyntheticInputDispatcher
// ════════════════════════════════════════════════════════════════════════════

pub struct SyntheticInputDispatcher {
    marker_lifetime_ms: u64,
    pointer_move:       bool,
    markers:            Vec<ClickMarker>,
}

impl Default for SyntheticInputDispatcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARKER_LIFETIME_MS, false)
    }
}

impl SyntheticInputDispatcher {
    pub const DEFAULT_MARKER_LIFETIME_MS: u64 = 2000;

    pub fn new(marker_lifetime_ms: u64, pointer_move: bool) -> Self {
        Self { marker_lifetime_ms, pointer_move, markers: Vec::new() }
    }

    pub fn from_config(feedback: &FeedbackConfig, dispatch: &DispatchConfig) -> Self {
        Self::new(feedback.marker_lifetime_ms, dispatch.pointer_move)
    }

    pub fn marker_lifetime_ms(&self) -> u64 {
        self.marker_lifetime_ms
    }

    /// Click whatever is topmost at `at`.  A marker is left at `at` even
    /// when nothing was hit.
    pub fn dispatch_click<H: UiHost>(
        &mut self,
        host: &mut H,
        at: ScreenPoint,
        hand: HandLabel,
        now_ms: u64,
    ) -> Option<H::Element> {
        let target = host.hit_test(at);
        if let Some(ref element) = target {
            host.dispatch(element, &PointerEvent::new(EventKind::Click, at, hand, now_ms));
        }
        debug!(%hand, x = at.x, y = at.y, target = ?target, "synthetic click");

        self.markers.push(ClickMarker { x: at.x, y: at.y, created_at_ms: now_ms, hand });
        target
    }

    /// Deliver a hover transition: leave first, then enter.
    pub fn dispatch_hover<H: UiHost>(
        &mut self,
        host: &mut H,
        change: &HoverChange<H::Element>,
        at: ScreenPoint,
        hand: HandLabel,
        now_ms: u64,
    ) {
        if let Some(ref old) = change.left {
            host.dispatch(old, &PointerEvent::new(EventKind::PointerLeave, at, hand, now_ms));
            debug!(%hand, element = ?old, "pointer leave");
        }
        if let Some(ref new) = change.entered {
            host.dispatch(new, &PointerEvent::new(EventKind::PointerEnter, at, hand, now_ms));
            debug!(%hand, element = ?new, "pointer enter");
        }
    }

    /// Per-frame move to the hovered element, when enabled.
    pub fn dispatch_move<H: UiHost>(
        &mut self,
        host: &mut H,
        hovered: Option<&H::Element>,
        at: ScreenPoint,
        hand: HandLabel,
        now_ms: u64,
    ) {
        if !self.pointer_move {
            return;
        }
        if let Some(element) = hovered {
            host.dispatch(element, &PointerEvent::new(EventKind::PointerMove, at, hand, now_ms));
        }
    }

    /// Live markers with their current opacity.
    pub fn markers(&self, now_ms: u64) -> impl Iterator<Item = (&ClickMarker, f32)> + '_ {
        let lifetime = self.marker_lifetime_ms;
        self.markers
            .iter()
            .filter(move |m| m.age_ms(now_ms) < lifetime)
            .map(move |m| (m, m.opacity(now_ms, lifetime)))
    }

    /// Discard markers whose age reached the lifetime.
    pub fn prune(&mut self, now_ms: u64) {
        let lifetime = self.marker_lifetime_ms;
        self.markers.retain(|m| m.age_ms(now_ms) < lifetime);
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }
}
