//! Dwell-time click state machine, one instance per hand.
//!
//! ```text
//!            pinch                 held ≥ dwell
//!   Idle ───────────▶ Pinching ─────────────────▶ Clicked
//!    ▲                   │                           │
//!    └──── release ──────┴───────── release ─────────┘
//! ```
//!
//! A click fires exactly once per uninterrupted pinch episode, however long
//! the pinch is held afterwards.  Only a release re-arms the hand.

use serde::Serialize;

use crate::config::ClickConfig;
use crate::landmark::HandLabel;
use crate::per_hand::PerHand;

/// Mutable per-hand state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GestureState {
    pub pinch_start: Option<u64>,
    pub has_clicked: bool,
}

impl GestureState {
    pub fn phase(&self) -> ClickPhase {
        if self.has_clicked {
            ClickPhase::Clicked
        } else if let Some(since_ms) = self.pinch_start {
            ClickPhase::Pinching { since_ms }
        } else {
            ClickPhase::Idle
        }
    }
}

/// Read-only view of a [`GestureState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ClickPhase {
    Idle,
    Pinching { since_ms: u64 },
    Clicked,
}

/// What one `update` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTransition {
    /// Not pinching, nothing to release.
    Idle,
    /// Pinch began this frame.
    Started,
    /// Still inside the dwell window.
    Dwelling { elapsed_ms: u64 },
    /// Dwell reached: deliver one click now.
    Fire,
    /// Pinch held after its click; ignored.
    Holding,
    /// Pinch ended; state reset.
    Released,
}

pub struct ClickStateMachine {
    dwell_ms: u64,
    states: PerHand<GestureState>,
}

impl Default for ClickStateMachine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DWELL_MS)
    }
}

impl ClickStateMachine {
    pub const DEFAULT_DWELL_MS: u64 = 500;

    pub fn new(dwell_ms: u64) -> Self {
        Self { dwell_ms, states: PerHand::new() }
    }

    pub fn from_config(config: &ClickConfig) -> Self {
        Self::new(config.dwell_ms)
    }

    pub fn dwell_ms(&self) -> u64 {
        self.dwell_ms
    }

    /// Advance `label`'s machine with this frame's pinch reading.
    pub fn update(&mut self, label: HandLabel, pinching: bool, now_ms: u64) -> ClickTransition {
        let state = self.states.get_or_insert_with(label, GestureState::default);

        if !pinching {
            let was_active = state.pinch_start.is_some() || state.has_clicked;
            *state = GestureState::default();
            return if was_active { ClickTransition::Released } else { ClickTransition::Idle };
        }

        if state.has_clicked {
            return ClickTransition::Holding;
        }

        let (start, fresh) = match state.pinch_start {
            Some(start) => (start, false),
            None => {
                state.pinch_start = Some(now_ms);
                (now_ms, true)
            }
        };

        // A replayed clock may step backwards; treat that as no time passing.
        let elapsed_ms = now_ms.saturating_sub(start);
        if elapsed_ms >= self.dwell_ms {
            state.has_clicked = true;
            state.pinch_start = None;
            ClickTransition::Fire
        } else if fresh {
            ClickTransition::Started
        } else {
            ClickTransition::Dwelling { elapsed_ms }
        }
    }

    pub fn state(&self, label: HandLabel) -> Option<&GestureState> {
        self.states.get(label)
    }

    pub fn phase(&self, label: HandLabel) -> ClickPhase {
        self.states.get(label).map(GestureState::phase).unwrap_or(ClickPhase::Idle)
    }

    pub fn forget(&mut self, label: HandLabel) {
        self.states.remove(label);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn tracked(&self) -> Vec<HandLabel> {
        self.states.labels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HandLabel::{Left, Right};

    /// Feed a pinch/no-pinch schedule every 33 ms and count clicks.
    fn run(m: &mut ClickStateMachine, label: HandLabel, from_ms: u64, to_ms: u64, pinching: bool) -> usize {
        let mut clicks = 0;
        let mut t = from_ms;
        while t <= to_ms {
            if m.update(label, pinching, t) == ClickTransition::Fire {
                clicks += 1;
            }
            t += 33;
        }
        clicks
    }

    #[test]
    fn fires_once_at_dwell() {
        let mut m = ClickStateMachine::default();
        assert_eq!(m.update(Right, true, 0), ClickTransition::Started);
        assert_eq!(m.update(Right, true, 400), ClickTransition::Dwelling { elapsed_ms: 400 });
        assert_eq!(m.phase(Right), ClickPhase::Pinching { since_ms: 0 });
        assert_eq!(m.update(Right, true, 500), ClickTransition::Fire);
        assert_eq!(m.phase(Right), ClickPhase::Clicked);
        assert_eq!(m.update(Right, true, 600), ClickTransition::Holding);
    }

    #[test]
    fn long_hold_yields_exactly_one_click() {
        let mut m = ClickStateMachine::default();
        assert_eq!(run(&mut m, Right, 0, 5000, true), 1);
    }

    #[test]
    fn short_pinch_never_clicks() {
        let mut m = ClickStateMachine::default();
        assert_eq!(run(&mut m, Left, 0, 450, true), 0);
        assert_eq!(m.update(Left, false, 480), ClickTransition::Released);
        assert_eq!(m.phase(Left), ClickPhase::Idle);
    }

    #[test]
    fn release_then_repinch_clicks_twice() {
        let mut m = ClickStateMachine::default();
        let mut clicks = run(&mut m, Right, 0, 700, true);
        clicks += run(&mut m, Right, 733, 900, false);
        clicks += run(&mut m, Right, 933, 1600, true);
        assert_eq!(clicks, 2);
    }

    #[test]
    fn release_clears_state() {
        let mut m = ClickStateMachine::default();
        m.update(Left, true, 0);
        m.update(Left, true, 600);
        m.update(Left, false, 700);
        assert_eq!(m.state(Left), Some(&GestureState::default()));
        assert_eq!(m.update(Left, false, 733), ClickTransition::Idle);
    }

    #[test]
    fn hands_do_not_interfere() {
        let mut m = ClickStateMachine::default();
        m.update(Left, true, 0);
        m.update(Right, true, 200);
        assert_eq!(m.update(Left, true, 500), ClickTransition::Fire);
        assert_eq!(m.update(Right, true, 500), ClickTransition::Dwelling { elapsed_ms: 300 });
        assert_eq!(m.update(Right, true, 700), ClickTransition::Fire);
        assert_eq!(m.phase(Left), ClickPhase::Clicked);
        m.update(Left, false, 800);
        assert_eq!(m.phase(Right), ClickPhase::Clicked);
    }

    #[test]
    fn zero_dwell_fires_on_first_frame() {
        let mut m = ClickStateMachine::new(0);
        assert_eq!(m.update(Right, true, 10), ClickTransition::Fire);
    }

    #[test]
    fn backwards_clock_does_not_fire() {
        let mut m = ClickStateMachine::default();
        m.update(Right, true, 1000);
        assert_eq!(m.update(Right, true, 200), ClickTransition::Dwelling { elapsed_ms: 0 });
        assert_eq!(m.update(Right, true, 1500), ClickTransition::Fire);
    }
}
