//! `PerHand<T>`: one optional slot per [`HandLabel`].
//!
//! Every per-hand map in the pipeline is a `PerHand`, so the label set can
//! never grow beyond `{Left, Right}` and each label owns at most one value.

use crate::landmark::HandLabel;

#[derive(Clone, Debug, PartialEq)]
pub struct PerHand<T> {
    left:  Option<T>,
    right: Option<T>,
}

impl<T> Default for PerHand<T> {
    fn default() -> Self {
        PerHand { left: None, right: None }
    }
}

impl<T> PerHand<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, label: HandLabel) -> &Option<T> {
        match label {
            HandLabel::Left  => &self.left,
            HandLabel::Right => &self.right,
        }
    }

    fn slot_mut(&mut self, label: HandLabel) -> &mut Option<T> {
        match label {
            HandLabel::Left  => &mut self.left,
            HandLabel::Right => &mut self.right,
        }
    }

    pub fn get(&self, label: HandLabel) -> Option<&T> {
        self.slot(label).as_ref()
    }

    pub fn get_mut(&mut self, label: HandLabel) -> Option<&mut T> {
        self.slot_mut(label).as_mut()
    }

    /// Lazily create the slot for `label`.
    pub fn get_or_insert_with(&mut self, label: HandLabel, init: impl FnOnce() -> T) -> &mut T {
        self.slot_mut(label).get_or_insert_with(init)
    }

    pub fn insert(&mut self, label: HandLabel, value: T) -> Option<T> {
        self.slot_mut(label).replace(value)
    }

    pub fn remove(&mut self, label: HandLabel) -> Option<T> {
        self.slot_mut(label).take()
    }

    pub fn clear(&mut self) {
        self.left = None;
        self.right = None;
    }

    pub fn len(&self) -> usize {
        self.left.is_some() as usize + self.right.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Occupied slots, Left first.
    pub fn iter(&self) -> impl Iterator<Item = (HandLabel, &T)> {
        HandLabel::ALL
            .into_iter()
            .filter_map(move |label| self.get(label).map(|v| (label, v)))
    }

    pub fn labels(&self) -> Vec<HandLabel> {
        self.iter().map(|(label, _)| label).collect()
    }
}
