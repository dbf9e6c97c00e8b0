//! Visibility masks and the percept keys derived from them

use std::fmt;

use crate::{
    game_state::{GameState, Player},
    HEIGHT, WIDTH,
};

/// Number of bytes needed to hold one bit per cell
pub const MASK_BYTES: usize = 6;

/// One bit per cell, set when the true content of the cell is known
///
/// Cell `(row, column)` lives at bit `(row * WIDTH + column) % 8` of byte
/// `(row * WIDTH + column) / 8`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Visibility([u8; MASK_BYTES]);

impl Visibility {
    /// A mask with every cell hidden
    pub fn new() -> Self {
        Self([0; MASK_BYTES])
    }

    pub fn from_bytes(bytes: [u8; MASK_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; MASK_BYTES] {
        self.0
    }

    fn locate(row: usize, column: usize) -> (usize, u32) {
        let pos = row * WIDTH + column;
        (pos / 8, (pos % 8) as u32)
    }

    pub fn is_visible(&self, row: usize, column: usize) -> bool {
        let (index, bit) = Self::locate(row, column);
        (self.0[index] >> bit) & 1 == 1
    }

    pub fn set_visible(&mut self, row: usize, column: usize, visible: bool) {
        let (index, bit) = Self::locate(row, column);
        if visible {
            self.0[index] |= 1 << bit;
        } else {
            self.0[index] &= !(1 << bit);
        }
    }

    pub fn reveal_all(&mut self) {
        for row in 0..HEIGHT {
            for column in 0..WIDTH {
                self.set_visible(row, column, true);
            }
        }
    }

    /// Exposes the cells of `column` that `state` makes visible
    ///
    /// Walking down from the top, a cell is visible once the column is full,
    /// the top cell is already visible, or an opponent tile has been seen at
    /// or above it. Cells that are already visible stay visible.
    pub fn reveal_column(&mut self, state: &GameState, column: usize) {
        let mut visible = state.is_column_full(column) || self.is_visible(HEIGHT - 1, column);
        for row in (0..HEIGHT).rev() {
            visible = visible || state.content(row, column) == Some(Player::Opponent);
            if visible {
                self.set_visible(row, column, true);
            }
        }
    }

    /// The mask that follows a move in `column` leading to `state`
    pub fn after_move(&self, state: &GameState, column: usize) -> Self {
        let mut next = *self;
        if state.is_game_over() {
            next.reveal_all();
        } else {
            next.reveal_column(state, column);
        }
        next
    }

    /// The mask an observer of `state` holds, computed from scratch
    pub fn from_state(state: &GameState) -> Self {
        let mut mask = Self::new();
        if state.is_game_over() {
            mask.reveal_all();
        } else {
            for column in 0..WIDTH {
                mask.reveal_column(state, column);
            }
        }
        mask
    }

    pub fn count(&self) -> u32 {
        self.0.iter().map(|byte| byte.count_ones()).sum()
    }

    pub fn percept_key(&self) -> PerceptKey {
        let mut key = String::with_capacity(MASK_BYTES + 1);
        let mut high_bits = 0u8;
        for (i, &byte) in self.0.iter().enumerate() {
            key.push(char::from(byte & 0x7F));
            high_bits |= ((byte >> 7) & 1) << i;
        }
        key.push(char::from(high_bits));
        PerceptKey(key)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            for column in 0..WIDTH {
                write!(f, "{}", if self.is_visible(row, column) { '1' } else { '0' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The label of an equivalence class of observations
///
/// Seven characters: the low seven bits of each mask byte, followed by one
/// character packing the six high bits.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PerceptKey(String);

impl PerceptKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuilds the mask this key was computed from
    pub fn to_visibility(&self) -> Visibility {
        let chars: Vec<u8> = self.0.chars().map(|c| c as u8).collect();
        let high_bits = chars[MASK_BYTES];
        let mut bytes = [0; MASK_BYTES];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = chars[i] | (((high_bits >> i) & 1) << 7);
        }
        Visibility(bytes)
    }
}

impl fmt::Display for PerceptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            write!(f, "{:02x}", c as u32)?;
        }
        Ok(())
    }
}
