use anyhow::{anyhow, Result};

use crate::{HEIGHT, WIDTH};

mod static_masks {
    use crate::{HEIGHT, WIDTH};

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
    pub const fn full_board_mask() -> u64 {
        bottom_mask() * ((1 << HEIGHT as u64) - 1)
    }
}

/// A gravity-drop board packed into two bitmaps
///
/// Tiles are stored column by column with one spare bit on top of each
/// column, so bit `column * (HEIGHT + 1) + row` is the tile at `row`
/// (counted from the bottom) of `column`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitBoard {
    // mask of the tiles of the side to move
    player_mask: u64,
    // mask of all tiles
    board_mask: u64,
    num_moves: usize,
}

impl BitBoard {
    pub fn new() -> Self {
        Self {
            player_mask: 0,
            board_mask: 0,
            num_moves: 0,
        }
    }

    /// Plays a sequence of 0-indexed column digits from the empty board
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut board = Self::new();

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column) if column < WIDTH => {
                    if !board.playable(column) {
                        return Err(anyhow!("Invalid move, column {} full", column));
                    }
                    // abort if the position is won at any point
                    if board.is_aligned(board.opponent_mask()) {
                        return Err(anyhow!("Invalid position, game is over"));
                    }
                    board.play(column);
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(board)
    }

    pub fn from_masks(player_mask: u64, board_mask: u64, num_moves: usize) -> Self {
        Self {
            player_mask,
            board_mask,
            num_moves,
        }
    }

    pub fn player_mask(&self) -> u64 {
        self.player_mask
    }

    /// Mask of the tiles of the side that is not to move
    pub fn opponent_mask(&self) -> u64 {
        self.player_mask ^ self.board_mask
    }

    pub fn top_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + (HEIGHT - 1))
    }

    pub fn bottom_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1))
    }

    pub fn column_mask(column: usize) -> u64 {
        ((1 << HEIGHT) - 1) << (column * (HEIGHT + 1))
    }

    pub fn cell_mask(row: usize, column: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + row)
    }

    /// The bitmap of the tile a move in `column` would place
    pub fn move_bitmap(&self, column: usize) -> u64 {
        (self.board_mask + Self::bottom_mask(column)) & Self::column_mask(column)
    }

    /// Number of tiles already stacked in `column`
    pub fn column_height(&self, column: usize) -> usize {
        (self.board_mask & Self::column_mask(column)).count_ones() as usize
    }

    /// Owner of a tile relative to the side to move: `Some(true)` for the side
    /// to move, `Some(false)` for the other side, `None` for an empty cell
    pub fn cell(&self, row: usize, column: usize) -> Option<bool> {
        let tile = Self::cell_mask(row, column);
        if self.board_mask & tile == 0 {
            None
        } else {
            Some(self.player_mask & tile != 0)
        }
    }

    pub fn num_moves(&self) -> usize {
        self.num_moves
    }

    pub fn playable(&self, column: usize) -> bool {
        column < WIDTH && Self::top_mask(column) & self.board_mask == 0
    }

    pub fn is_full(&self) -> bool {
        self.board_mask == static_masks::full_board_mask()
    }

    /// Drops a tile of the side to move into `column` and hands the move over
    pub fn play(&mut self, column: usize) {
        debug_assert!(self.playable(column));
        let move_bitmap = self.move_bitmap(column);
        // switch the current player
        self.player_mask ^= self.board_mask;
        // add a cell of the previous player to the correct column
        self.board_mask |= move_bitmap;
        self.num_moves += 1;
    }

    /// Hands the move over without placing a tile
    pub fn switch_player(&mut self) {
        self.player_mask ^= self.board_mask;
    }

    /// Whether `pos` contains four tiles in a row in any direction
    pub fn is_aligned(&self, pos: u64) -> bool {
        // check horizontal alignment
        // mark all horizontal runs of 2
        let mut m = pos & (pos >> (HEIGHT + 1));
        // check for runs of 2 * (runs of 2)
        if m & (m >> (2 * (HEIGHT + 1))) != 0 {
            return true;
        }

        // check diagonal alignment 1
        m = pos & (pos >> HEIGHT);
        if m & (m >> (2 * HEIGHT)) != 0 {
            return true;
        }

        // check diagonal alignment 2
        m = pos & (pos >> (HEIGHT + 2));
        if m & (m >> (2 * (HEIGHT + 2))) != 0 {
            return true;
        }

        // check vertical alignment
        m = pos & (pos >> 1);
        if m & (m >> 2) != 0 {
            return true;
        }

        false
    }

    /// Creates a bitmap of open squares that would complete an alignment of
    /// four for the tiles in `player_mask`
    pub fn winning_positions(&self, player_mask: u64) -> u64 {
        // vertical
        // find the top ends of 3-alignemnts
        let mut r = (player_mask << 1) & (player_mask << 2) & (player_mask << 3);

        // horizontal
        let mut p = (player_mask << (HEIGHT + 1)) & (player_mask << (2 * (HEIGHT + 1)));
        // find the right ends of 3-alignments
        r |= p & (player_mask << (3 * (HEIGHT + 1)));
        // find holes of the type ...O O _ O...
        r |= p & (player_mask >> (HEIGHT + 1));

        p = (player_mask >> (HEIGHT + 1)) & (player_mask >> (2 * (HEIGHT + 1)));
        // find the left ends of 3-alignments
        r |= p & (player_mask >> (3 * (HEIGHT + 1)));
        // find holes of the type ...O _ O O...
        r |= p & (player_mask << (HEIGHT + 1));

        // diagonal /
        p = (player_mask << HEIGHT) & (player_mask << (2 * HEIGHT));
        r |= p & (player_mask << (3 * (HEIGHT)));
        r |= p & (player_mask >> (HEIGHT));

        p = (player_mask >> (HEIGHT)) & (player_mask >> (2 * HEIGHT));
        r |= p & (player_mask >> (3 * (HEIGHT)));
        r |= p & (player_mask << (HEIGHT));

        // diagonal \
        p = (player_mask << (HEIGHT + 2)) & (player_mask << (2 * (HEIGHT + 2)));
        r |= p & (player_mask << (3 * (HEIGHT + 2)));
        r |= p & (player_mask >> (HEIGHT + 2));

        p = (player_mask >> (HEIGHT + 2)) & (player_mask >> (2 * (HEIGHT + 2)));
        r |= p & (player_mask >> (3 * (HEIGHT + 2)));
        r |= p & (player_mask << (HEIGHT + 2));

        r & (static_masks::full_board_mask() ^ self.board_mask)
    }
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::new()
    }
}
