//! Static scoring of belief states at the leaves of the search

use crate::{
    belief_state::BeliefState,
    game_state::{GameState, Player},
    HEIGHT, WIDTH,
};

/// Score of a member the engine has won, negated for a loss
pub const WIN_SCORE: f64 = 10000.0;

/// Bonus for occupying a cell, indexed by row (bottom first) then column
pub const POSITIONAL_SCORE: [[i32; WIDTH]; HEIGHT] = [
    [1, 2, 3, 5, 3, 2, 1],
    [2, 4, 6, 8, 6, 4, 2],
    [5, 8, 11, 13, 11, 8, 5],
    [5, 8, 11, 13, 11, 8, 5],
    [4, 6, 8, 10, 8, 6, 4],
    [3, 4, 5, 7, 5, 4, 3],
];

/// Sums the outcome of every finished member: a win for either side counts
/// fully, a draw counts nothing
pub fn evaluate_terminal(belief: &BeliefState) -> f64 {
    belief
        .states()
        .filter(|(state, _)| state.is_game_over())
        .map(|(state, _)| match state.winner() {
            Some(Player::Engine) => WIN_SCORE,
            Some(Player::Opponent) => -WIN_SCORE,
            None => 0.0,
        })
        .sum()
}

/// Heuristic value of an unfinished belief state from the engine's side
pub fn evaluate_non_terminal(belief: &BeliefState) -> f64 {
    belief
        .states()
        .map(|(state, _)| evaluate_state(state))
        .sum()
}

fn evaluate_state(state: &GameState) -> f64 {
    let mut score = 0.0;
    for row in 0..HEIGHT {
        for column in 0..WIDTH {
            let bonus = POSITIONAL_SCORE[row][column] as f64;
            match state.content(row, column) {
                Some(Player::Engine) => {
                    score += bonus;
                    score += evaluate_line(state, row, column, 0, 1, Player::Engine);
                    score += evaluate_line(state, row, column, 1, 0, Player::Engine);
                }
                Some(Player::Opponent) => {
                    score -= bonus;
                    score -= evaluate_line(state, row, column, 0, 1, Player::Opponent);
                }
                None => {}
            }
        }
    }
    score
}

fn within_bounds(row: isize, column: isize) -> bool {
    row >= 0 && row < HEIGHT as isize && column >= 0 && column < WIDTH as isize
}

fn is_open(state: &GameState, row: isize, column: isize) -> bool {
    within_bounds(row, column) && state.content(row as usize, column as usize).is_none()
}

/// Scores the window of four cells starting at `(row, column)` along
/// `(delta_row, delta_column)`, positive for the engine and negative for the
/// opponent
pub fn evaluate_line(
    state: &GameState,
    row: usize,
    column: usize,
    delta_row: isize,
    delta_column: isize,
    player: Player,
) -> f64 {
    let (row, column) = (row as isize, column as isize);
    let mut count = 0;
    for i in 0..4 {
        let (r, c) = (row + i * delta_row, column + i * delta_column);
        if !within_bounds(r, c) {
            return 0.0;
        }
        match state.content(r as usize, c as usize) {
            Some(owner) if owner == player => count += 1,
            Some(_) => return 0.0,
            None => {}
        }
    }

    let open_start = is_open(state, row - delta_row, column - delta_column);
    let open_end = is_open(state, row + 4 * delta_row, column + 4 * delta_column);
    let open_ends = open_start as i32 + open_end as i32;

    let magnitude = match (count, open_ends) {
        (3, 1..=2) => 1000.0,
        (2, 1..=2) => 300.0,
        _ => (count * open_ends) as f64,
    };
    match player {
        Player::Engine => magnitude,
        Player::Opponent => -magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn open_three_scores_high() -> Result<()> {
        let state = GameState::from_rows(
            &[
                ".......",
                ".......",
                ".......",
                ".......",
                ".OOO...",
                "XXXO...",
            ],
            Player::Engine,
        )?;
        // X X X O from the corner: blocked by the opponent tile
        assert_eq!(evaluate_line(&state, 0, 0, 0, 1, Player::Engine), 0.0);
        // _ O O O with an empty cell after the window
        assert_eq!(evaluate_line(&state, 1, 0, 0, 1, Player::Opponent), -1000.0);
        // runs off the board
        assert_eq!(evaluate_line(&state, 1, 5, 0, 1, Player::Opponent), 0.0);
        Ok(())
    }

    #[test]
    fn partial_lines_count_open_ends() -> Result<()> {
        let state = GameState::from_moves("3")?;
        // window (0,1)..(0,4) holds one engine tile, open on both sides
        assert_eq!(evaluate_line(&state, 0, 1, 0, 1, Player::Engine), 2.0);
        // window (0,3) upwards: nothing below the floor, open above
        assert_eq!(evaluate_line(&state, 0, 3, 1, 0, Player::Engine), 1.0);
        Ok(())
    }

    #[test]
    fn terminal_members_score_by_winner() -> Result<()> {
        let won = GameState::from_moves("0101010")?;
        let mut belief = BeliefState::new();
        belief.add(won, 1.0);
        assert_eq!(evaluate_terminal(&belief), WIN_SCORE);

        let lost = GameState::from_moves("60101010")?;
        belief.add(lost, 1.0);
        assert_eq!(evaluate_terminal(&belief), 0.0);
        Ok(())
    }

    #[test]
    fn opponent_lines_are_subtracted() -> Result<()> {
        let state = GameState::from_rows(
            &[
                ".......",
                ".......",
                ".......",
                ".......",
                "......X",
                ".OOO..X",
            ],
            Player::Engine,
        )?;
        let mut belief = BeliefState::new();
        belief.add(state, 1.0);

        // X at (0,6): 1 positional, vertical pair open above scores 300
        // X at (1,6): 2 positional, vertical single open above scores 1
        let engine = 1.0 + 300.0 + 2.0 + 1.0;
        // O tiles: 2 + 3 + 5 positional; only the open three from (0,1)
        // scores, at -1000, and both are taken off the engine's score
        let opponent = -(2.0 + 3.0 + 5.0) - (-1000.0);
        assert_eq!(evaluate_line(&state, 0, 1, 0, 1, Player::Opponent), -1000.0);
        assert_eq!(evaluate_line(&state, 0, 2, 0, 1, Player::Opponent), 0.0);
        assert_eq!(evaluate_non_terminal(&belief), engine + opponent);
        assert_eq!(evaluate_non_terminal(&belief), 1294.0);
        Ok(())
    }

    #[test]
    fn center_is_preferred() -> Result<()> {
        let mut center = BeliefState::new();
        center.add(GameState::from_moves("3")?, 1.0);
        let mut edge = BeliefState::new();
        edge.add(GameState::from_moves("0")?, 1.0);
        assert!(evaluate_non_terminal(&center) > evaluate_non_terminal(&edge));
        Ok(())
    }
}
