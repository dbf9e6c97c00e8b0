use std::collections::BTreeMap;
use std::ops::Bound;

use crate::belief_state::BeliefState;

/// Scores of belief states the search has already explored
///
/// Keys are compared with [`BeliefState`]'s tolerant ordering, so a score
/// stored for one belief answers for any belief holding the same members in
/// the same proportions. The returned score is rescaled by the ratio of the
/// total weights.
#[derive(Clone, Debug, Default)]
pub struct ExploredSet {
    entries: BTreeMap<BeliefState, f64>,
}

impl ExploredSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, state: &BeliefState) -> Option<f64> {
        // smallest stored key not below the query
        let (key, value) = self
            .entries
            .range((Bound::Included(state), Bound::Unbounded))
            .next()?;
        if key != state {
            return None;
        }
        let key_sum = key.proba_sum();
        if key_sum > 0.0 {
            Some(value * state.proba_sum() / key_sum)
        } else {
            Some(*value)
        }
    }

    pub fn put(&mut self, state: BeliefState, value: f64) {
        self.entries.insert(state, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
