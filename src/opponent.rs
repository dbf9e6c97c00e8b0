//! Models of how the opponent picks its column

use rand::Rng;

use crate::{
    evaluation::POSITIONAL_SCORE, game_state::GameState, selector::RandomSelector, WIDTH,
};

/// A stochastic model of the opponent's move choice
pub trait OpponentModel {
    /// How attractive `column` is to the side to move in `state`; always
    /// strictly positive
    fn heuristic_value(&self, state: &GameState, column: usize) -> f64;

    /// The columns the opponent may play from `state` and their weights
    ///
    /// A winning column is played outright. Otherwise every column that does
    /// not hand over an immediate game over is weighted by
    /// [`heuristic_value`](Self::heuristic_value); when no such column
    /// exists, the columns allowing the fewest immediate game overs share
    /// the probability evenly.
    fn reply_distribution(&self, state: &GameState) -> (Vec<usize>, RandomSelector) {
        let mut selector = RandomSelector::new();
        let mut columns = Vec::new();
        let mut least_losing = Vec::new();
        let mut min_game_overs = usize::MAX;

        for column in (0..WIDTH).filter(|&c| !state.is_column_full(c)) {
            let mut next = *state;
            next.put_piece(column);
            if next.is_game_over() {
                let mut winning = RandomSelector::new();
                winning.add(1.0);
                return (vec![column], winning);
            }

            let game_overs = (0..WIDTH)
                .filter(|&reply| !next.is_column_full(reply))
                .filter(|&reply| {
                    let mut after = next;
                    after.put_piece(reply);
                    after.is_game_over()
                })
                .count();

            if game_overs == 0 {
                selector.add(self.heuristic_value(state, column));
                columns.push(column);
            } else if game_overs < min_game_overs {
                min_game_overs = game_overs;
                least_losing.clear();
                least_losing.push(column);
            } else if game_overs == min_game_overs {
                least_losing.push(column);
            }
        }

        if columns.is_empty() {
            selector = RandomSelector::new();
            for _ in least_losing.iter() {
                selector.add(1.0);
            }
            columns = least_losing;
        }
        (columns, selector)
    }

    /// Samples a column from [`reply_distribution`](Self::reply_distribution)
    fn choose_column<R: Rng>(&self, state: &GameState, rng: &mut R) -> Option<usize>
    where
        Self: Sized,
    {
        let (columns, selector) = self.reply_distribution(state);
        selector.select(rng).map(|index| columns[index])
    }
}

/// Prefers central cells, building open threes, and sitting on the other
/// side's open threes
#[derive(Copy, Clone, Debug, Default)]
pub struct ProbabilisticOpponent;

impl OpponentModel for ProbabilisticOpponent {
    fn heuristic_value(&self, state: &GameState, column: usize) -> f64 {
        let board = state.board();
        let candidate = board.move_bitmap(column);
        let row = board.column_height(column);

        // how many open ends of 3-alignments the move creates
        let threats = (board.winning_positions(board.player_mask() | candidate) & !candidate)
            .count_ones();
        let blocks = board.winning_positions(board.opponent_mask()) & candidate != 0;

        1.0 + POSITIONAL_SCORE[row][column] as f64 + 4.0 * threats as f64 + 2.0 * blocks as u8 as f64
    }
}
