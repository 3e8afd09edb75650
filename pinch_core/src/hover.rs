//! Per-hand hover tracking: which element is under each fingertip.

use crate::landmark::HandLabel;
use crate::per_hand::PerHand;

/// Transition produced by one hover update.  Leave (if any) is delivered
/// before enter (if any).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverChange<E> {
    pub left:    Option<E>,
    pub entered: Option<E>,
}

impl<E> Default for HoverChange<E> {
    fn default() -> Self {
        HoverChange { left: None, entered: None }
    }
}

impl<E> HoverChange<E> {
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.entered.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverState<E> {
    pub hovered: Option<E>,
}

pub struct HoverTracker<E> {
    states: PerHand<HoverState<E>>,
}

impl<E> Default for HoverTracker<E> {
    fn default() -> Self {
        HoverTracker { states: PerHand::new() }
    }
}

impl<E: Clone + PartialEq> HoverTracker<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what the host resolved under `label`'s pointer this frame.
    pub fn update(&mut self, label: HandLabel, resolved: Option<E>) -> HoverChange<E> {
        let state = self.states.get_or_insert_with(label, || HoverState { hovered: None });
        if state.hovered == resolved {
            return HoverChange::default();
        }
        let left = std::mem::replace(&mut state.hovered, resolved.clone());
        HoverChange { left, entered: resolved }
    }

    pub fn hovered(&self, label: HandLabel) -> Option<&E> {
        self.states.get(label).and_then(|s| s.hovered.as_ref())
    }

    /// Drop one hand's hover state, returning what it was hovering so the
    /// caller can send a final leave.
    pub fn forget(&mut self, label: HandLabel) -> Option<E> {
        self.states.remove(label).and_then(|s| s.hovered)
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn tracked(&self) -> Vec<HandLabel> {
        self.states.labels()
    }
}
