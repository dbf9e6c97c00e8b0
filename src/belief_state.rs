//! Weighted sets of positions the engine cannot tell apart

use std::cmp::Ordering;
use std::collections::{btree_map, BTreeMap};
use std::fmt;

use crate::{
    game_state::{GameState, Player},
    opponent::OpponentModel,
    selector::RandomSelector,
    visibility::{PerceptKey, Visibility},
    WIDTH,
};

/// Normalized weights closer than this compare equal
pub const WEIGHT_TOLERANCE: f64 = 1e-3;

/// Canonical weights are rounded to this many decimals
const CANONICAL_SCALE: f64 = 1e6;

/// A set of positions consistent with everything the engine has observed
///
/// Every member shares the same visibility mask and the same side to move.
/// Member weights are proportional rather than normalized; divide by
/// [`proba_sum`](Self::proba_sum) for the actual distribution.
#[derive(Clone, Debug, Default)]
pub struct BeliefState {
    states: BTreeMap<GameState, f64>,
    visibility: Visibility,
    played: usize,
}

impl BeliefState {
    /// An empty belief with every cell hidden and nothing played
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visibility(visibility: Visibility, played: usize) -> Self {
        Self {
            states: BTreeMap::new(),
            visibility,
            played,
        }
    }

    /// Takes over the members, mask and ply count of `other`
    pub fn set_states(&mut self, other: BeliefState) {
        *self = other;
    }

    /// Adds a member, summing its weight into an identical member if present
    pub fn add(&mut self, state: GameState, weight: f64) {
        *self.states.entry(state).or_insert(0.0) += weight;
    }

    /// Forgets everything, as at the start of a new game
    pub fn restart(&mut self) {
        *self = Self::new();
    }

    pub fn contains(&self, state: &GameState) -> bool {
        self.states.contains_key(state)
    }

    pub fn size(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn played(&self) -> usize {
        self.played
    }

    /// Members in order, with their weights
    pub fn states(&self) -> impl Iterator<Item = (&GameState, f64)> + '_ {
        self.states.iter().map(|(state, &weight)| (state, weight))
    }

    pub fn weight(&self, state: &GameState) -> Option<f64> {
        self.states.get(state).copied()
    }

    pub fn proba_sum(&self) -> f64 {
        self.states.values().sum()
    }

    /// Weights divided by their sum, uniform when they sum to zero
    fn normalized_weights(&self) -> impl Iterator<Item = f64> + '_ {
        let sum = self.proba_sum();
        let size = self.states.len() as f64;
        self.states.values().map(move |&weight| {
            if sum > 0.0 {
                weight / sum
            } else {
                1.0 / size
            }
        })
    }

    /// The side to move in every member, `None` for an empty belief
    pub fn turn(&self) -> Option<Player> {
        self.states.keys().next().map(GameState::turn)
    }

    pub fn is_game_over(&self) -> bool {
        self.states.keys().all(GameState::is_game_over)
    }

    pub fn is_full(&self) -> bool {
        self.states.keys().next().map_or(false, GameState::is_full)
    }

    /// The side that has won in every member, if there is one
    pub fn winner(&self) -> Option<Player> {
        let mut members = self.states.keys();
        let winner = members.next()?.winner()?;
        if members.all(|state| state.winner() == Some(winner)) {
            Some(winner)
        } else {
            None
        }
    }

    /// Columns that can still be played
    pub fn get_moves(&self) -> Vec<usize> {
        match self.states.keys().next() {
            Some(state) if !self.is_game_over() => {
                (0..WIDTH).filter(|&c| !state.is_column_full(c)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Expands every member by the opponent's possible replies
    ///
    /// Each member's weight is split over its replies as given by `model`,
    /// and successors are grouped by what the engine observes afterwards.
    /// Returns `None` unless the opponent is to move.
    pub fn predict<M: OpponentModel + ?Sized>(&self, model: &M) -> Option<Results> {
        if self.turn() != Some(Player::Opponent) {
            return None;
        }
        let mut results = Results::new();
        for (state, &weight) in self.states.iter() {
            let (columns, selector) = model.reply_distribution(state);
            for (index, &column) in columns.iter().enumerate() {
                let mut next = *state;
                next.put_piece(column);
                let visibility = self.visibility.after_move(&next, column);
                results.insert(
                    visibility,
                    self.played + 1,
                    next,
                    weight * selector.probability(index),
                );
            }
        }
        Some(results)
    }

    /// Plays the engine's move in `column` in every member
    ///
    /// Members where `column` is already full have no successor. Returns
    /// `None` unless the engine is to move.
    pub fn put_piece_player(&self, column: usize) -> Option<Results> {
        if self.turn() != Some(Player::Engine) {
            return None;
        }
        let mut results = Results::new();
        for (state, &weight) in self.states.iter() {
            if state.is_column_full(column) {
                continue;
            }
            let mut next = *state;
            next.put_piece(column);
            let visibility = self.visibility.after_move(&next, column);
            results.insert(visibility, self.played + 1, next, weight);
        }
        Some(results)
    }

    /// Picks the outcome of an expansion that matches the observed `state`,
    /// with its weights normalized to sum to one
    pub fn filter(mut results: Results, state: &GameState) -> Option<BeliefState> {
        let key = Visibility::from_state(state).percept_key();
        let mut belief = results.remove(&key)?;

        let mut selector = RandomSelector::new();
        for weight in belief.states.values() {
            selector.add(*weight);
        }
        for (index, weight) in belief.states.values_mut().enumerate() {
            *weight = selector.probability(index);
        }
        Some(belief)
    }

    /// Copy with weights normalized and rounded, the form used as a cache key
    pub fn canonicalize(&self) -> BeliefState {
        let weights: Vec<f64> = self
            .normalized_weights()
            .map(|weight| (weight * CANONICAL_SCALE).round() / CANONICAL_SCALE)
            .collect();
        let mut canonical = self.clone();
        for (slot, weight) in canonical.states.values_mut().zip(weights) {
            *slot = weight;
        }
        canonical
    }

    /// Drops members whose normalized weight is below `threshold` and
    /// renormalizes the rest
    ///
    /// The most likely member always survives.
    pub fn prune(&mut self, threshold: f64) {
        let weights: Vec<f64> = self.normalized_weights().collect();
        let best = weights.iter().copied().fold(0.0, f64::max);
        let mut kept = weights.into_iter();
        self.states
            .retain(|_, _| kept.next().map_or(false, |w| w >= threshold || w >= best));

        let sum = self.proba_sum();
        if sum > 0.0 {
            for weight in self.states.values_mut() {
                *weight /= sum;
            }
        }
    }

    fn compare_weights(&self, other: &Self) -> Ordering {
        for (mine, theirs) in self.normalized_weights().zip(other.normalized_weights()) {
            if (mine - theirs).abs() > WEIGHT_TOLERANCE {
                return mine.partial_cmp(&theirs).unwrap_or(Ordering::Equal);
            }
        }
        Ordering::Equal
    }
}

impl Ord for BeliefState {
    /// Orders by ply count, visibility, size, members, then normalized
    /// weights compared within [`WEIGHT_TOLERANCE`]
    fn cmp(&self, other: &Self) -> Ordering {
        self.played
            .cmp(&other.played)
            .then_with(|| self.visibility.cmp(&other.visibility))
            .then_with(|| self.states.len().cmp(&other.states.len()))
            .then_with(|| self.states.keys().cmp(other.states.keys()))
            .then_with(|| self.compare_weights(other))
    }
}

impl PartialOrd for BeliefState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BeliefState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BeliefState {}

impl fmt::Display for BeliefState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "BeliefState: size = {} played = {}",
            self.states.len(),
            self.played
        )?;
        write!(f, "{}", self.visibility)?;
        for (state, weight) in self.states.iter() {
            writeln!(f, "{}, weight {:.6}", state, weight)?;
        }
        Ok(())
    }
}

/// The belief states an expansion can lead to, keyed by what the engine
/// would observe
#[derive(Clone, Debug, Default)]
pub struct Results {
    results: BTreeMap<PerceptKey, BeliefState>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a successor to the bucket of its percept, creating the bucket on
    /// first use
    pub fn insert(&mut self, visibility: Visibility, played: usize, state: GameState, weight: f64) {
        self.results
            .entry(visibility.percept_key())
            .or_insert_with(|| BeliefState::with_visibility(visibility, played))
            .add(state, weight);
    }

    /// Unions the buckets of `other` into these, summing identical members
    pub fn merge(&mut self, other: Results) {
        for (key, belief) in other.results {
            match self.results.entry(key) {
                btree_map::Entry::Vacant(entry) => {
                    entry.insert(belief);
                }
                btree_map::Entry::Occupied(mut entry) => {
                    for (state, weight) in belief.states {
                        entry.get_mut().add(state, weight);
                    }
                }
            }
        }
    }

    pub fn get(&self, percept: &PerceptKey) -> Option<&BeliefState> {
        self.results.get(percept)
    }

    pub fn remove(&mut self, percept: &PerceptKey) -> Option<BeliefState> {
        self.results.remove(percept)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BeliefState> + '_ {
        self.results.values()
    }
}

impl IntoIterator for Results {
    type Item = BeliefState;
    type IntoIter = btree_map::IntoValues<PerceptKey, BeliefState>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_values()
    }
}
