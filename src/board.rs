//! Game board representation, collision queries and line clearing

use crate::piece::{BoundedLog, Control, ControlRecord, Coord};
use crate::score::{NormalClear, Score};
use crate::tetromino::{CellKind, TetrominoType, LOCKED_THRESHOLD};

/// Standard board dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// Smallest board that fits every playable shape grid at spawn
pub const MIN_WIDTH: usize = 4;
pub const MIN_HEIGHT: usize = 4;

/// Piece type whose rotations can earn the special-move bonus
pub const PIVOT_TYPE: TetrominoType = TetrominoType::T;

/// Corner collisions needed for a special move
const SPECIAL_CORNERS: usize = 3;

/// Board edge checked by [`Board::is_out_of_range`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Bottom,
}

/// The game board
#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    /// Permanent cells, stored as [row][col] with row 0 at the top
    locked: Vec<Vec<u8>>,
    /// `locked` with the moving piece drawn over it
    rendered: Vec<Vec<u8>>,
    full_rows: Vec<usize>,
    score: Score,
    last_out_of_range_delta: i32,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty board of the standard size
    pub fn new() -> Self {
        Self::with_size(BOARD_WIDTH, BOARD_HEIGHT)
    }

    /// Create a new empty board, clamped to [`MIN_WIDTH`] x [`MIN_HEIGHT`]
    pub fn with_size(width: usize, height: usize) -> Self {
        let width = width.max(MIN_WIDTH);
        let height = height.max(MIN_HEIGHT);
        let locked = vec![vec![0; width]; height];
        Self {
            width,
            height,
            rendered: locked.clone(),
            locked,
            full_rows: Vec::new(),
            score: Score::new(),
            last_out_of_range_delta: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn locked(&self) -> &[Vec<u8>] {
        &self.locked
    }

    pub fn rendered(&self) -> &[Vec<u8>] {
        &self.rendered
    }

    /// Rows found by the last [`Board::detect_full_rows`], until cleared
    pub fn full_rows(&self) -> &[usize] {
        &self.full_rows
    }

    pub fn score(&self) -> u64 {
        self.score.points
    }

    pub fn lines(&self) -> u32 {
        self.score.lines
    }

    /// Largest run of adjacent rows in the last normal clear
    pub fn last_clear_count(&self) -> usize {
        self.score.last_clear_count
    }

    /// Overflow recorded by the last [`Board::is_out_of_range`] call
    pub fn last_out_of_range_delta(&self) -> i32 {
        self.last_out_of_range_delta
    }

    /// Decoded locked cell; `None` when out of bounds
    pub fn cell(&self, row: i32, col: i32) -> Option<CellKind> {
        let (row, col) = self.index(row, col)?;
        Some(CellKind::from_code(self.locked[row][col]))
    }

    fn index(&self, row: i32, col: i32) -> Option<(usize, usize)> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        (row < self.height && col < self.width).then_some((row, col))
    }

    /// Rebuild `rendered` as `locked` with `code` written at `coordinates`
    pub fn render_overlay(&mut self, coordinates: &[Coord], code: u8) {
        self.rendered.clone_from(&self.locked);
        for &(row, col) in coordinates {
            if let Some((r, c)) = self.index(row, col) {
                self.rendered[r][c] = code;
            }
        }
    }

    /// Rebuild `rendered` with nothing drawn over the locked cells
    pub fn render_locked(&mut self) {
        self.render_overlay(&[], 0);
    }

    /// Write `code` permanently at `coordinates`
    pub fn lock_cells(&mut self, coordinates: &[Coord], code: u8) {
        for &(row, col) in coordinates {
            if let Some((r, c)) = self.index(row, col) {
                self.locked[r][c] = code;
            }
        }
    }

    /// Check whether any coordinate is past `side`, recording the overflow.
    ///
    /// The recorded delta is what [`Piece::shift_axis`] needs to bring the
    /// piece back flush with that edge: the (negative) leftmost column for
    /// `Left`, the distance past the last column for `Right`, the distance
    /// past the last row for `Bottom`.
    ///
    /// [`Piece::shift_axis`]: crate::piece::Piece::shift_axis
    pub fn is_out_of_range(&mut self, coordinates: &[Coord], side: Side) -> bool {
        let last_col = self.width as i32 - 1;
        let last_row = self.height as i32 - 1;

        let overflow = match side {
            Side::Left => coordinates.iter().map(|&(_, col)| col).filter(|&col| col < 0).min(),
            Side::Right => coordinates
                .iter()
                .map(|&(_, col)| col)
                .filter(|&col| col > last_col)
                .max()
                .map(|col| col - last_col),
            Side::Bottom => coordinates
                .iter()
                .map(|&(row, _)| row)
                .filter(|&row| row > last_row)
                .max()
                .map(|row| row - last_row),
        };

        self.last_out_of_range_delta = overflow.unwrap_or(0);
        overflow.is_some()
    }

    /// Number of coordinates that land on locked cells
    pub fn collision_count(&self, coordinates: &[Coord]) -> usize {
        coordinates
            .iter()
            .filter(|&&(row, col)| self.cell(row, col).is_some_and(|cell| cell.is_locked()))
            .count()
    }

    /// Check whether any coordinate lands on a locked cell
    pub fn is_colliding(&self, coordinates: &[Coord]) -> bool {
        self.collision_count(coordinates) > 0
    }

    /// Find every row whose cells are all locked, top to bottom
    pub fn detect_full_rows(&mut self) -> &[usize] {
        self.full_rows = self
            .locked
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|&code| code > LOCKED_THRESHOLD))
            .map(|(index, _)| index)
            .collect();
        &self.full_rows
    }

    /// Remove the given rows, dropping an empty row in at the top for each
    pub fn clear_rows(&mut self, indexes: &[usize]) {
        let mut sorted = indexes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        // Ascending order keeps the remaining indexes valid: removing row `y`
        // and inserting at 0 leaves every row below `y` in place
        for index in sorted.into_iter().filter(|&index| index < self.height) {
            self.locked.remove(index);
            self.locked.insert(0, vec![0; self.width]);
        }
        self.full_rows.clear();
        self.render_locked();
    }

    /// Clear the rows found by the last detection
    pub fn clear_full_rows(&mut self) {
        let rows = std::mem::take(&mut self.full_rows);
        self.clear_rows(&rows);
    }

    /// Add the normal score for clearing `indexes`
    pub fn score_normal_clear(&mut self, indexes: &[usize]) -> NormalClear {
        self.score.add_normal(indexes)
    }

    /// Add the special-move bonus for clearing `indexes`
    pub fn score_special_clear(&mut self, indexes: &[usize]) -> u64 {
        self.score.add_special(indexes)
    }

    /// Decide whether the lock was a special move.
    ///
    /// The deciding action is the newest log entry, or the one before it when
    /// the newest is the downward step that caused the lock. It must be a
    /// rotation by the pivot type, with at least three of `corners` wedged
    /// against locked cells.
    pub fn detect_special_move(
        &self,
        actions: &BoundedLog<ControlRecord>,
        corners: &[Coord],
    ) -> bool {
        let mut recent = actions.newest_first().take(2);
        let deciding = match recent.next() {
            Some(record) if record.control == Control::Down => recent.next(),
            other => other,
        };

        let Some(record) = deciding else {
            return false;
        };

        record.piece_type == PIVOT_TYPE
            && record.control == Control::Rotate
            && self.collision_count(corners) >= SPECIAL_CORNERS
    }

    /// Check if the board has no locked cells
    pub fn is_empty(&self) -> bool {
        self.locked.iter().all(|row| row.iter().all(|&code| code == 0))
    }
}
