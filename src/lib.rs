//! A decision engine for a partially observable variant of 'Connect 4'
//!
//! The engine cannot see every tile on the board. It tracks a
//! [`BeliefState`](belief_state::BeliefState), a weighted set of the
//! positions consistent with what it has observed, and picks its column with
//! an AND/OR search over belief states.
//!
//! # Basic Usage
//!
//! ```
//! use hidden_connect4::{belief_state::BeliefState, game_state::GameState, solver::SearchEngine};
//!
//!# fn main() -> hidden_connect4::anyhow::Result<()> {
//! // three engine tiles stacked in column 3, engine to move
//! let mut belief = BeliefState::new();
//! belief.add(GameState::from_moves("323232")?, 1.0);
//!
//! let mut engine = SearchEngine::new();
//! assert_eq!(engine.find_next_move(&belief), Some(3));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod bitboard;

pub mod game_state;

pub mod visibility;

pub mod selector;

pub mod opponent;

pub mod belief_state;

pub mod transposition_table;

pub mod evaluation;

pub mod solver;

pub mod self_play;

mod test;

pub use belief_state::{BeliefState, Results};
pub use game_state::{GameState, Player};
pub use opponent::{OpponentModel, ProbabilisticOpponent};
pub use solver::{SearchEngine, DEPTH, PROBA_THRESHOLD, THREAT_THRESHOLD};
pub use transposition_table::ExploredSet;
pub use visibility::{PerceptKey, Visibility};

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);

// ensure that a visibility mask fits in its six bytes
const_assert!(WIDTH * HEIGHT <= 8 * visibility::MASK_BYTES);
