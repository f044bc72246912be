//! Tetromino definitions: type tags, spawn shapes and cell codes
//!
//! Board cells are plain `u8` codes so the renderer can pick colours without
//! re-deriving game logic: `10 + index` marks the moving piece, `20 + index`
//! a locked cell of the same type.

use serde::Serialize;

/// Codes above this value are permanently locked cells
pub const LOCKED_THRESHOLD: u8 = 20;

/// Base for the codes of the piece still under player control
const MOVING_BASE: u8 = 10;

/// The 7 playable tetrominoes plus the two display-only placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TetrominoType {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
    /// Smiling face shown before the first game starts
    Idle,
    /// Face shown once the stack reaches the spawn area
    Dead,
}

impl TetrominoType {
    /// Get all playable tetromino types, in selector order
    pub fn all() -> [TetrominoType; 7] {
        [
            TetrominoType::I,
            TetrominoType::J,
            TetrominoType::L,
            TetrominoType::O,
            TetrominoType::S,
            TetrominoType::T,
            TetrominoType::Z,
        ]
    }

    /// Decorative variants never fall, collide or lock
    pub fn is_playable(&self) -> bool {
        !matches!(self, TetrominoType::Idle | TetrominoType::Dead)
    }

    fn index(&self) -> u8 {
        match self {
            TetrominoType::I => 1,
            TetrominoType::J => 2,
            TetrominoType::L => 3,
            TetrominoType::O => 4,
            TetrominoType::S => 5,
            TetrominoType::T => 6,
            TetrominoType::Z => 7,
            TetrominoType::Idle => 8,
            TetrominoType::Dead => 9,
        }
    }

    fn from_index(index: u8) -> Option<TetrominoType> {
        let piece_type = match index {
            1 => TetrominoType::I,
            2 => TetrominoType::J,
            3 => TetrominoType::L,
            4 => TetrominoType::O,
            5 => TetrominoType::S,
            6 => TetrominoType::T,
            7 => TetrominoType::Z,
            8 => TetrominoType::Idle,
            9 => TetrominoType::Dead,
            _ => return None,
        };
        Some(piece_type)
    }

    /// Cell code while this piece is still moving
    pub fn moving_code(&self) -> u8 {
        MOVING_BASE + self.index()
    }

    /// Cell code once this piece is locked into the board
    pub fn locked_code(&self) -> u8 {
        LOCKED_THRESHOLD + self.index()
    }

    /// Spawn orientation of this piece
    pub fn shape(&self) -> Shape {
        match self {
            TetrominoType::I => Shape::from_rows(&[
                [0, 1, 0, 0],
                [0, 1, 0, 0],
                [0, 1, 0, 0],
                [0, 1, 0, 0],
            ]),
            TetrominoType::J => Shape::from_rows(&[[0, 1, 0], [0, 1, 0], [1, 1, 0]]),
            TetrominoType::L => Shape::from_rows(&[[0, 1, 0], [0, 1, 0], [0, 1, 1]]),
            TetrominoType::O => Shape::from_rows(&[[1, 1], [1, 1]]),
            TetrominoType::S => Shape::from_rows(&[[0, 1, 1], [1, 1, 0], [0, 0, 0]]),
            TetrominoType::T => Shape::from_rows(&[[0, 1, 0], [1, 1, 1], [0, 0, 0]]),
            TetrominoType::Z => Shape::from_rows(&[[1, 1, 0], [0, 1, 1], [0, 0, 0]]),
            TetrominoType::Idle => Shape::from_rows(&[
                [0, 0, 0, 0, 0, 0],
                [0, 1, 0, 0, 1, 0],
                [0, 1, 0, 0, 1, 0],
                [0, 0, 0, 0, 0, 0],
                [1, 0, 0, 0, 0, 1],
                [0, 1, 1, 1, 1, 0],
            ]),
            TetrominoType::Dead => Shape::from_rows(&[
                [0, 0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0],
                [0, 1, 0, 0, 1, 0],
                [0, 0, 0, 0, 0, 0],
                [0, 1, 1, 1, 1, 1],
                [0, 0, 0, 0, 0, 0],
            ]),
        }
    }
}

/// Decoded meaning of a board cell code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Empty,
    Moving(TetrominoType),
    Locked(TetrominoType),
}

impl CellKind {
    /// Decode a grid code; unknown codes read as empty
    pub fn from_code(code: u8) -> CellKind {
        let decoded = if code > LOCKED_THRESHOLD {
            TetrominoType::from_index(code - LOCKED_THRESHOLD).map(CellKind::Locked)
        } else if code > MOVING_BASE {
            TetrominoType::from_index(code - MOVING_BASE).map(CellKind::Moving)
        } else {
            None
        };
        decoded.unwrap_or(CellKind::Empty)
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, CellKind::Locked(_))
    }
}

/// A binary cell grid in the piece's local coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: usize,
    cols: usize,
    /// Row-major fill flags
    cells: Vec<bool>,
}

impl Shape {
    /// Build a shape from rows of `0`/`1` flags
    pub fn from_rows<const C: usize>(rows: &[[u8; C]]) -> Self {
        Self {
            rows: rows.len(),
            cols: C,
            cells: rows.iter().flatten().map(|&cell| cell != 0).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row * self.cols + col]
    }

    /// Iterate `(row, col, filled)` over every local cell
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &filled)| (i / self.cols, i % self.cols, filled))
    }

    /// Quarter turn clockwise: cell (i, j) moves to (j, rows - 1 - i)
    pub fn rotated_cw(&self) -> Shape {
        let mut cells = vec![false; self.cells.len()];
        // The rotated grid has `self.rows` columns
        for i in 0..self.rows {
            for j in 0..self.cols {
                cells[j * self.rows + (self.rows - 1 - i)] = self.cells[i * self.cols + j];
            }
        }
        Shape {
            rows: self.cols,
            cols: self.rows,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_cell_kind() {
        for piece_type in TetrominoType::all() {
            assert_eq!(
                CellKind::from_code(piece_type.moving_code()),
                CellKind::Moving(piece_type)
            );
            assert_eq!(
                CellKind::from_code(piece_type.locked_code()),
                CellKind::Locked(piece_type)
            );
            assert!(piece_type.locked_code() > LOCKED_THRESHOLD);
            assert!(piece_type.moving_code() <= LOCKED_THRESHOLD);
        }
        assert_eq!(CellKind::from_code(0), CellKind::Empty);
    }

    #[test]
    fn test_every_playable_shape_has_four_cells() {
        for piece_type in TetrominoType::all() {
            let filled = piece_type.shape().cells().filter(|&(_, _, f)| f).count();
            assert_eq!(filled, 4, "{:?}", piece_type);
        }
    }

    #[test]
    fn test_decorative_types_are_not_playable() {
        assert!(!TetrominoType::Idle.is_playable());
        assert!(!TetrominoType::Dead.is_playable());
        assert!(TetrominoType::all().iter().all(|t| t.is_playable()));
    }

    #[test]
    fn test_four_rotations_restore_shape() {
        let mut types = TetrominoType::all().to_vec();
        types.extend([TetrominoType::Idle, TetrominoType::Dead]);
        for piece_type in types {
            let original = piece_type.shape();
            let mut shape = original.clone();
            for _ in 0..4 {
                shape = shape.rotated_cw();
            }
            assert_eq!(shape, original, "{:?}", piece_type);
        }
    }

    #[test]
    fn test_rotation_of_t() {
        // .T.      .T.
        // TTT  ->  .TT
        // ...      .T.
        let rotated = TetrominoType::T.shape().rotated_cw();
        let expected = Shape::from_rows(&[[0, 1, 0], [0, 1, 1], [0, 1, 0]]);
        assert_eq!(rotated, expected);
    }

    #[test]
    fn test_rotation_of_non_square_grid_swaps_dimensions() {
        let shape = Shape::from_rows(&[[1, 1, 1], [1, 0, 0]]);
        let rotated = shape.rotated_cw();
        assert_eq!((rotated.rows(), rotated.cols()), (3, 2));
        assert_eq!(rotated, Shape::from_rows(&[[1, 1], [0, 1], [0, 1]]));
    }
}
