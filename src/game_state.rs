//! A single concrete position of the hidden game

use anyhow::{anyhow, Result};

use std::fmt;

use crate::{bitboard::BitBoard, HEIGHT, WIDTH};

/// One of the two sides of the game
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Player {
    /// The side the search engine plays for, moving first from the empty board
    Engine,
    Opponent,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::Engine => Player::Opponent,
            Player::Opponent => Player::Engine,
        }
    }
}

/// A fully specified board with the side to move
///
/// The ordering compares tiles first and the side to move second, which is
/// the order belief states iterate their members in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameState {
    board: BitBoard,
    opponent_to_move: bool,
}

impl GameState {
    /// The empty board with the engine to move
    pub fn new() -> Self {
        Self {
            board: BitBoard::new(),
            opponent_to_move: false,
        }
    }

    /// Plays a sequence of 0-indexed column digits from the empty board,
    /// starting with the engine
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let board = BitBoard::from_moves(moves)?;
        Ok(Self {
            opponent_to_move: board.num_moves() % 2 == 1,
            board,
        })
    }

    /// Builds a position from a textual grid, top row first
    ///
    /// `X` marks an engine tile, `O` an opponent tile and `.` an empty cell.
    pub fn from_rows(rows: &[&str], to_move: Player) -> Result<Self> {
        if rows.len() != HEIGHT {
            return Err(anyhow!("expected {} rows, found {}", HEIGHT, rows.len()));
        }
        let mut engine_mask = 0;
        let mut board_mask = 0;
        for (index, line) in rows.iter().enumerate() {
            let row = HEIGHT - 1 - index;
            let cells: Vec<char> = line.chars().collect();
            if cells.len() != WIDTH {
                return Err(anyhow!("row {} should have {} cells: '{}'", row, WIDTH, line));
            }
            for (column, cell) in cells.into_iter().enumerate() {
                let tile = BitBoard::cell_mask(row, column);
                match cell {
                    'X' => {
                        engine_mask |= tile;
                        board_mask |= tile;
                    }
                    'O' => board_mask |= tile,
                    '.' => {}
                    other => return Err(anyhow!("could not parse '{}' as a cell", other)),
                }
            }
        }
        // every tile needs a tile or the floor below it
        for column in 0..WIDTH {
            let stack = board_mask & BitBoard::column_mask(column);
            if stack & (stack + BitBoard::bottom_mask(column)) != 0 {
                return Err(anyhow!("Invalid position, floating tile in column {}", column));
            }
        }
        let player_mask = match to_move {
            Player::Engine => engine_mask,
            Player::Opponent => board_mask ^ engine_mask,
        };
        Ok(Self {
            board: BitBoard::from_masks(
                player_mask,
                board_mask,
                board_mask.count_ones() as usize,
            ),
            opponent_to_move: to_move == Player::Opponent,
        })
    }

    pub fn board(&self) -> &BitBoard {
        &self.board
    }

    /// The side whose tile the next `put_piece` drops
    pub fn turn(&self) -> Player {
        if self.opponent_to_move {
            Player::Opponent
        } else {
            Player::Engine
        }
    }

    /// Bitmap of the tiles owned by `player`
    pub fn stones(&self, player: Player) -> u64 {
        if player == self.turn() {
            self.board.player_mask()
        } else {
            self.board.opponent_mask()
        }
    }

    pub fn content(&self, row: usize, column: usize) -> Option<Player> {
        self.board.cell(row, column).map(|to_move| {
            if to_move {
                self.turn()
            } else {
                self.turn().other()
            }
        })
    }

    pub fn is_column_full(&self, column: usize) -> bool {
        !self.board.playable(column)
    }

    pub fn is_full(&self) -> bool {
        self.board.is_full()
    }

    pub fn num_pieces(&self) -> usize {
        self.board.num_moves()
    }

    /// The side with four tiles aligned, if any
    pub fn winner(&self) -> Option<Player> {
        [Player::Engine, Player::Opponent]
            .iter()
            .copied()
            .find(|&player| self.board.is_aligned(self.stones(player)))
    }

    pub fn is_game_over(&self) -> bool {
        self.is_full() || self.winner().is_some()
    }

    /// Drops a tile of the side to move into `column` and hands the move over
    pub fn put_piece(&mut self, column: usize) {
        self.board.play(column);
        self.opponent_to_move = !self.opponent_to_move;
    }

    pub fn change_turn(&mut self) {
        self.board.switch_player();
        self.opponent_to_move = !self.opponent_to_move;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            for column in 0..WIDTH {
                let cell = match self.content(row, column) {
                    Some(Player::Engine) => 'X',
                    Some(Player::Opponent) => 'O',
                    None => '.',
                };
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }
        write!(f, "{:?} to move", self.turn())
    }
}
