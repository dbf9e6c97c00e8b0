//! Games between the search engine and a simulated opponent

use anyhow::{anyhow, Result};
use rand::Rng;
use tracing::debug;

use crate::{
    belief_state::BeliefState,
    game_state::{GameState, Player},
    opponent::OpponentModel,
    solver::{SearchEngine, PROBA_THRESHOLD},
    visibility::Visibility,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    EngineWin,
    OpponentWin,
    Draw,
}

/// How a finished game went
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub outcome: Outcome,
    /// The true final position
    pub final_state: GameState,
    /// What the engine could see just before the final move
    pub visibility: Visibility,
    /// Columns played, as digits
    pub moves: String,
    /// Largest number of positions the engine held at once
    pub max_belief_size: usize,
}

/// Running totals over a series of games
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub engine_wins: usize,
    pub opponent_wins: usize,
    pub draws: usize,
}

impl MatchSummary {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::EngineWin => self.engine_wins += 1,
            Outcome::OpponentWin => self.opponent_wins += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.engine_wins + self.opponent_wins + self.draws
    }
}

/// Plays one game of `engine` against its own opponent model
///
/// The true position is tracked alongside the engine's belief state. After
/// every move the belief is expanded, collapsed onto what the engine
/// actually observes, and stripped of negligible members.
pub fn play_game<M: OpponentModel, R: Rng>(
    engine: &mut SearchEngine<M>,
    rng: &mut R,
    first: Player,
) -> Result<GameRecord> {
    let mut state = GameState::new();
    if first == Player::Opponent {
        state.change_turn();
    }
    let mut belief = BeliefState::new();
    belief.add(state, 1.0);

    let mut moves = String::new();
    let mut visibility = *belief.visibility();
    let mut max_belief_size = belief.size();

    while !state.is_game_over() {
        visibility = *belief.visibility();
        let (column, results) = match state.turn() {
            Player::Engine => {
                let column = engine
                    .find_next_move(&belief)
                    .ok_or_else(|| anyhow!("engine found no move on an open board"))?;
                if state.is_column_full(column) {
                    return Err(anyhow!("Invalid move, column {} full", column));
                }
                (column, belief.put_piece_player(column))
            }
            Player::Opponent => {
                let column = engine
                    .opponent()
                    .choose_column(&state, rng)
                    .ok_or_else(|| anyhow!("opponent found no move on an open board"))?;
                (column, belief.predict(engine.opponent()))
            }
        };
        let results =
            results.ok_or_else(|| anyhow!("belief state out of step with the side to move"))?;

        state.put_piece(column);
        moves.push_str(&column.to_string());

        belief.set_states(BeliefState::filter(results, &state).ok_or_else(|| {
            anyhow!("no belief state matches the observed board after {}", moves)
        })?);
        belief.prune(PROBA_THRESHOLD);
        max_belief_size = max_belief_size.max(belief.size());
        debug!(column, belief_size = belief.size(), "played");
    }

    let outcome = match state.winner() {
        Some(Player::Engine) => Outcome::EngineWin,
        Some(Player::Opponent) => Outcome::OpponentWin,
        None => Outcome::Draw,
    };
    Ok(GameRecord {
        outcome,
        final_state: state,
        visibility,
        moves,
        max_belief_size,
    })
}
