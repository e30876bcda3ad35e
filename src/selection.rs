//! Transect click tracking.
//!
//! Each transect file has one tracker. The host reports the indices of the
//! segments currently selected on that file's path layer; evaluation reads
//! them and always leaves the tracker empty again.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::layer::Layer;

/// Result of evaluating a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Nothing was selected.
    Idle,
    /// Exactly one segment was selected.
    Clicked(usize),
    /// Several segments were selected at once; carries the count.
    Invalid(usize),
}

/// Selection state of one transect file.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    selected: BTreeSet<usize>,
    source: Option<Arc<Layer>>,
}

impl SelectionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the path layer whose segments the indices refer to.
    pub fn set_source(&mut self, layer: Arc<Layer>) {
        self.source = Some(layer);
    }

    #[must_use]
    pub fn source(&self) -> Option<&Arc<Layer>> {
        self.source.as_ref()
    }

    /// Replace the selection with `indices`.
    pub fn select(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.selected = indices.into_iter().collect();
    }

    #[must_use]
    pub fn selected(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.selected.is_empty()
    }

    /// Read and clear the selection.
    pub fn evaluate(&mut self) -> SelectionOutcome {
        let selected = std::mem::take(&mut self.selected);
        match selected.len() {
            0 => SelectionOutcome::Idle,
            1 => selected
                .into_iter()
                .next()
                .map_or(SelectionOutcome::Idle, SelectionOutcome::Clicked),
            n => SelectionOutcome::Invalid(n),
        }
    }
}
