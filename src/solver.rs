//! An AND/OR search over belief states

use tracing::{debug, trace};

use std::collections::BTreeSet;

use crate::{
    belief_state::BeliefState,
    evaluation::{evaluate_non_terminal, evaluate_terminal},
    game_state::Player,
    opponent::{OpponentModel, ProbabilisticOpponent},
    transposition_table::ExploredSet,
    WIDTH,
};

/// Plies searched below each candidate move
pub const DEPTH: usize = 6;

/// Normalized weight below which a belief member may be dropped
pub const PROBA_THRESHOLD: f64 = 1e-5;

/// Share of belief members in which the opponent must threaten a column
/// before it is blocked without searching
pub const THREAT_THRESHOLD: f64 = 0.30;

/// Scores are rounded to this many decimals before they are cached
const SCORE_SCALE: f64 = 1e4;

/// Returns the columns ordered from the middle outwards, left before right,
/// as the middle columns are often better moves
pub const fn move_order() -> [usize; WIDTH] {
    let mut move_order = [0; WIDTH];
    let mut i = 0;
    while i < WIDTH {
        move_order[i] = (WIDTH / 2) + (1 - i % 2) * (i / 2) - (i % 2) * (i / 2 + 1);
        i += 1;
    }
    move_order
}

/// The order candidate moves are tried in at the root
pub const PREFERRED_ORDER: [usize; WIDTH] = move_order();

fn round_score(score: f64) -> f64 {
    (score * SCORE_SCALE).round() / SCORE_SCALE
}

/// Chooses the engine's column from a belief state
///
/// # Notes
/// Obvious moves are caught by two one-ply probes: a column that wins in
/// some outcome is played at once, and a column where the opponent threatens
/// to win in enough members is blocked. Anything else is decided by an
/// alpha-beta AND/OR search, where the engine maximizes over its own moves
/// and the opponent minimizes over the percepts its replies produce.
///
/// Scores are memoized in an [`ExploredSet`] that lives as long as the
/// engine, so keeping one engine across games keeps its cache warm.
#[derive(Clone, Debug)]
pub struct SearchEngine<M = ProbabilisticOpponent> {
    opponent: M,
    depth: usize,
    threat_threshold: f64,
    cache: ExploredSet,

    /// The number of belief states searched by this engine so far (for diagnostics only)
    pub node_count: usize,
    /// The number of searches answered from the cache (for diagnostics only)
    pub cache_hits: usize,
}

impl SearchEngine<ProbabilisticOpponent> {
    /// Creates an engine playing against the default opponent model
    pub fn new() -> Self {
        Self::with_opponent(ProbabilisticOpponent)
    }
}

impl Default for SearchEngine<ProbabilisticOpponent> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: OpponentModel> SearchEngine<M> {
    /// Creates an engine that expects the opponent to play like `opponent`
    pub fn with_opponent(opponent: M) -> Self {
        Self {
            opponent,
            depth: DEPTH,
            threat_threshold: THREAT_THRESHOLD,
            cache: ExploredSet::new(),
            node_count: 0,
            cache_hits: 0,
        }
    }

    /// Changes the number of plies searched below each candidate move
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Changes the threat share above which a column is blocked outright
    pub fn with_threat_threshold(mut self, threat_threshold: f64) -> Self {
        self.threat_threshold = threat_threshold;
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn opponent(&self) -> &M {
        &self.opponent
    }

    pub fn cache(&self) -> &ExploredSet {
        &self.cache
    }

    /// Returns the column to play, or `None` when no column is open
    pub fn find_next_move(&mut self, belief: &BeliefState) -> Option<usize> {
        let available_moves = belief.get_moves();

        if let Some(column) = self.find_immediate_win(belief) {
            debug!(column, "winning move");
            return Some(column);
        }

        if let Some(column) = self.find_immediate_threat(belief) {
            debug!(column, "blocking immediate threat");
            return Some(column);
        }

        if available_moves.is_empty() {
            debug!("no available moves");
            return None;
        }

        let mut best_move = None;
        let mut best_score = f64::NEG_INFINITY;
        for &column in PREFERRED_ORDER.iter() {
            if !available_moves.contains(&column) {
                continue;
            }
            let results = match belief.put_piece_player(column) {
                Some(results) if !results.is_empty() => results,
                _ => continue,
            };

            let mut move_score = f64::NEG_INFINITY;
            for next in results.iter() {
                let score = self.and_or_search(
                    next,
                    self.depth,
                    f64::NEG_INFINITY,
                    f64::INFINITY,
                    &mut BTreeSet::new(),
                );
                move_score = move_score.max(score);
            }
            trace!(column, score = move_score, "evaluated move");

            if move_score > best_score {
                best_score = move_score;
                best_move = Some(column);
            }
        }

        match best_move {
            Some(column) => {
                debug!(
                    column,
                    score = best_score,
                    nodes = self.node_count,
                    cached = self.cache.len(),
                    "selected move"
                );
                Some(column)
            }
            None => {
                debug!("no move improves on the worst case, falling back to the first column");
                available_moves.first().copied()
            }
        }
    }

    /// Searches `belief` to `depth` plies and returns its score
    ///
    /// `path` holds the canonical forms of the belief states on the current
    /// descent; a belief state already on it scores negative infinity.
    pub fn and_or_search(
        &mut self,
        belief: &BeliefState,
        depth: usize,
        mut alpha: f64,
        mut beta: f64,
        path: &mut BTreeSet<BeliefState>,
    ) -> f64 {
        self.node_count += 1;

        let canonical = belief.canonicalize();
        if path.contains(&canonical) {
            return f64::NEG_INFINITY;
        }
        if let Some(score) = self.cache.get(&canonical) {
            self.cache_hits += 1;
            return score;
        }

        if belief.is_game_over() {
            return evaluate_terminal(belief);
        }
        if depth == 0 {
            return evaluate_non_terminal(belief);
        }

        path.insert(canonical.clone());
        let mut best_score;
        if belief.turn() == Some(Player::Opponent) {
            // AND node: the opponent picks the worst outcome for us
            best_score = f64::INFINITY;
            if let Some(results) = belief.predict(&self.opponent) {
                for next in results.iter() {
                    let score = self.and_or_search(next, depth - 1, alpha, beta, path);
                    best_score = best_score.min(score);
                    beta = beta.min(score);
                    if beta <= alpha {
                        break;
                    }
                }
            }
        } else {
            // OR node: any outcome of any of our moves will do
            best_score = f64::NEG_INFINITY;
            'moves: for column in belief.get_moves() {
                let results = match belief.put_piece_player(column) {
                    Some(results) => results,
                    None => continue,
                };
                for next in results.iter() {
                    let score = self.and_or_search(next, depth - 1, alpha, beta, path);
                    best_score = best_score.max(score);
                    alpha = alpha.max(score);
                    if alpha >= beta {
                        break 'moves;
                    }
                }
            }
        }
        path.remove(&canonical);

        let best_score = round_score(best_score);
        self.cache.put(canonical, best_score);
        best_score
    }

    /// A column after which some outcome is a won game for the engine
    pub fn find_immediate_win(&self, belief: &BeliefState) -> Option<usize> {
        belief.get_moves().into_iter().find(|&column| {
            belief.put_piece_player(column).map_or(false, |results| {
                results.iter().any(|next| {
                    next.is_game_over()
                        && next.turn() == Some(Player::Opponent)
                        && next.winner() == Some(Player::Engine)
                })
            })
        })
    }

    /// The column the opponent would most often win with if it were to move,
    /// provided its share of belief members exceeds the threat threshold
    pub fn find_immediate_threat(&self, belief: &BeliefState) -> Option<usize> {
        if belief.is_empty() {
            return None;
        }
        let moves = belief.get_moves();

        let mut threats = [0usize; WIDTH];
        for (state, _) in belief.states() {
            for &column in moves.iter() {
                if state.is_column_full(column) {
                    continue;
                }
                let mut probe = *state;
                probe.change_turn();
                probe.put_piece(column);
                probe.change_turn();
                if probe.is_game_over() {
                    threats[column] += 1;
                }
            }
        }

        let mut most_probable = None;
        let mut highest = 0.0;
        for &column in PREFERRED_ORDER.iter() {
            let probability = threats[column] as f64 / belief.size() as f64;
            if probability > 0.0 {
                trace!(column, probability, "threat");
            }
            if probability > self.threat_threshold && probability > highest {
                most_probable = Some(column);
                highest = probability;
            }
        }
        most_probable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_order_is_center_first() {
        assert_eq!(PREFERRED_ORDER, [3, 2, 4, 1, 5, 0, 6]);
    }

    #[test]
    fn rounding_keeps_infinities() {
        assert_eq!(round_score(f64::NEG_INFINITY), f64::NEG_INFINITY);
        assert_eq!(round_score(1.234_56), 1.2346);
    }
}
