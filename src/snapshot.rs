//! Read-only view of the game handed to the presentation layer

use crate::game::GameState;
use crate::tetromino::TetrominoType;
use serde::Serialize;

/// Everything a renderer needs to draw one frame.
///
/// Snapshots implement [`Serialize`] so front ends outside this process can
/// receive them in any serde format; the field names are part of the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub state: GameState,
    /// Cell codes as [row][col], row 0 at the top
    pub grid: Vec<Vec<u8>>,
    pub score: u64,
    pub lines: u32,
    /// Empty, or the feedback label of the clear being animated
    pub status_text: String,
    /// Rows waiting to be cleared
    pub full_row_indexes: Vec<usize>,
    pub next_pieces: Vec<TetrominoType>,
    pub round: u64,
}

impl GameSnapshot {
    pub fn width(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    pub fn is_row_clearing(&self, row: usize) -> bool {
        self.full_row_indexes.contains(&row)
    }
}
