//! Active falling piece logic
//!
//! Moves are applied optimistically: every mutation snapshots the previous
//! placement first, so the caller can validate the result against the board
//! and step back with [`Piece::undo_last`].

use crate::error::EngineError;
use crate::tetromino::{Shape, TetrominoType};
use serde::Serialize;
use std::collections::VecDeque;

/// How many placements and control actions a piece remembers
pub const LOG_CAPACITY: usize = 10;

/// Board column of the shape's origin when a piece spawns
pub const SPAWN_COL: i32 = 4;

/// A board position as (row, col); row 0 is the top
pub type Coord = (i32, i32);

/// Player-visible actions recorded in the action log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Control {
    Left,
    Right,
    Rotate,
    Down,
}

/// One action log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRecord {
    pub piece_type: TetrominoType,
    pub control: Control,
}

/// Axis used by corrective shifts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal, column offset
    X,
    /// Vertical, row offset
    Y,
}

/// Shape and anchor of a piece at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub shape: Shape,
    pub row: i32,
    pub col: i32,
}

/// Fixed-capacity stack that evicts its oldest entry when full
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from newest to oldest
    pub fn newest_first(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().rev()
    }
}

impl<T> FromIterator<T> for BoundedLog<T> {
    /// Collect into a log of [`LOG_CAPACITY`], keeping the newest entries
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut log = BoundedLog::new(LOG_CAPACITY);
        for entry in iter {
            log.push(entry);
        }
        log
    }
}

/// An active falling piece
#[derive(Debug, Clone)]
pub struct Piece {
    piece_type: TetrominoType,
    shape: Shape,
    /// Board row of the shape's top-left cell
    row: i32,
    /// Board column of the shape's top-left cell
    col: i32,
    history: BoundedLog<Placement>,
    actions: BoundedLog<ControlRecord>,
}

impl Piece {
    /// Create a new piece at spawn position
    pub fn new(piece_type: TetrominoType) -> Self {
        Self {
            piece_type,
            shape: piece_type.shape(),
            row: 0,
            col: SPAWN_COL,
            history: BoundedLog::new(LOG_CAPACITY),
            actions: BoundedLog::new(LOG_CAPACITY),
        }
    }

    /// Spawn a piece whose grid stays inside a board `width` columns wide.
    ///
    /// The piece starts at [`SPAWN_COL`] unless that would cross the right
    /// edge, in which case it moves left until the grid fits.
    pub fn spawn(piece_type: TetrominoType, width: usize) -> Self {
        let mut piece = Self::new(piece_type);
        let room = width.saturating_sub(piece.shape.cols());
        piece.col = SPAWN_COL.min(i32::try_from(room).unwrap_or(i32::MAX));
        piece
    }

    pub fn piece_type(&self) -> TetrominoType {
        self.piece_type
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Anchor as (row, col)
    pub fn anchor(&self) -> Coord {
        (self.row, self.col)
    }

    pub fn placement(&self) -> Placement {
        Placement {
            shape: self.shape.clone(),
            row: self.row,
            col: self.col,
        }
    }

    pub fn action_log(&self) -> &BoundedLog<ControlRecord> {
        &self.actions
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn move_left(&mut self) {
        self.record(Control::Left);
        self.col -= 1;
    }

    pub fn move_right(&mut self) {
        self.record(Control::Right);
        self.col += 1;
    }

    pub fn move_down(&mut self) {
        self.record(Control::Down);
        self.row += 1;
    }

    /// Quarter turn clockwise in place; no kicks are tried here
    pub fn rotate(&mut self) {
        self.record(Control::Rotate);
        self.shape = self.shape.rotated_cw();
    }

    /// Restore the placement saved by the most recent mutation
    pub fn undo_last(&mut self) -> Result<(), EngineError> {
        let Placement { shape, row, col } = self.history.pop().ok_or(EngineError::EmptyHistory)?;
        self.shape = shape;
        self.row = row;
        self.col = col;
        Ok(())
    }

    /// Push the anchor back by `amount` along `axis`.
    ///
    /// Corrective only: nothing is recorded, so a later undo still returns to
    /// the placement before the player's action.
    pub fn shift_axis(&mut self, axis: Axis, amount: i32) {
        match axis {
            Axis::X => self.col -= amount,
            Axis::Y => self.row -= amount,
        }
    }

    /// Board positions of the filled cells
    pub fn coordinates(&self) -> Vec<Coord> {
        self.project(true)
    }

    /// Board positions of the empty cells inside the shape's grid
    pub fn empty_cell_coordinates(&self) -> Vec<Coord> {
        self.project(false)
    }

    /// Empty cells that sit on a corner of the shape's grid
    pub fn empty_corner_coordinates(&self) -> Vec<Coord> {
        let last_row = self.shape.rows().saturating_sub(1);
        let last_col = self.shape.cols().saturating_sub(1);
        self.shape
            .cells()
            .filter(|&(r, c, filled)| {
                !filled && (r == 0 || r == last_row) && (c == 0 || c == last_col)
            })
            .map(|(r, c, _)| self.to_board(r, c))
            .collect()
    }

    fn project(&self, filled: bool) -> Vec<Coord> {
        self.shape
            .cells()
            .filter(|&(_, _, f)| f == filled)
            .map(|(r, c, _)| self.to_board(r, c))
            .collect()
    }

    fn to_board(&self, r: usize, c: usize) -> Coord {
        (self.row + r as i32, self.col + c as i32)
    }

    fn record(&mut self, control: Control) {
        self.history.push(self.placement());
        self.actions.push(ControlRecord {
            piece_type: self.piece_type,
            control,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_position() {
        let piece = Piece::new(TetrominoType::T);
        assert_eq!(piece.anchor(), (0, SPAWN_COL));
        // .T.
        // TTT
        assert_eq!(piece.coordinates(), vec![(0, 5), (1, 4), (1, 5), (1, 6)]);
    }

    #[test]
    fn test_spawn_fits_narrow_board() {
        assert_eq!(Piece::spawn(TetrominoType::T, 10).anchor(), (0, SPAWN_COL));
        assert_eq!(Piece::spawn(TetrominoType::T, 6).anchor(), (0, 3));
        assert_eq!(Piece::spawn(TetrominoType::I, 4).anchor(), (0, 0));
        assert_eq!(Piece::spawn(TetrominoType::O, 6).anchor(), (0, 4));
        for piece_type in TetrominoType::all() {
            let piece = Piece::spawn(piece_type, 4);
            assert!(piece.coordinates().iter().all(|&(_, col)| (0..4).contains(&col)));
        }
    }

    #[test]
    fn test_moves_shift_coordinates() {
        let mut piece = Piece::new(TetrominoType::O);
        piece.move_down();
        piece.move_left();
        assert_eq!(piece.anchor(), (1, 3));
        piece.move_right();
        piece.move_right();
        assert_eq!(piece.coordinates(), vec![(1, 5), (1, 6), (2, 5), (2, 6)]);
    }

    #[test]
    fn test_undo_restores_each_command() {
        type Command = fn(&mut Piece);
        let commands: [Command; 4] = [
            Piece::move_left,
            Piece::move_right,
            Piece::move_down,
            Piece::rotate,
        ];
        for piece_type in TetrominoType::all() {
            for command in commands {
                let mut piece = Piece::new(piece_type);
                piece.move_down();
                let before = piece.placement();
                command(&mut piece);
                piece.undo_last().unwrap();
                assert_eq!(piece.placement(), before);
            }
        }
    }

    #[test]
    fn test_undo_without_history_fails() {
        let mut piece = Piece::new(TetrominoType::I);
        assert_eq!(piece.undo_last(), Err(EngineError::EmptyHistory));
    }

    #[test]
    fn test_shift_does_not_touch_history() {
        let mut piece = Piece::new(TetrominoType::J);
        piece.move_left();
        piece.shift_axis(Axis::X, -2);
        assert_eq!(piece.anchor(), (0, 5));
        assert_eq!(piece.history_len(), 1);
        assert_eq!(piece.action_log().len(), 1);

        // Undo skips the correction and returns to spawn
        piece.undo_last().unwrap();
        assert_eq!(piece.anchor(), (0, SPAWN_COL));
    }

    #[test]
    fn test_shift_y_moves_up() {
        let mut piece = Piece::new(TetrominoType::O);
        piece.move_down();
        piece.move_down();
        piece.shift_axis(Axis::Y, 1);
        assert_eq!(piece.anchor(), (1, SPAWN_COL));
    }

    #[test]
    fn test_logs_keep_the_newest_ten() {
        let mut piece = Piece::new(TetrominoType::S);
        for _ in 0..12 {
            piece.move_down();
        }
        piece.rotate();
        assert_eq!(piece.history_len(), LOG_CAPACITY);
        assert_eq!(piece.action_log().len(), LOG_CAPACITY);

        let newest = piece.action_log().newest_first().next().unwrap();
        assert_eq!(newest.control, Control::Rotate);
        assert_eq!(newest.piece_type, TetrominoType::S);

        // Only ten undos are available
        for _ in 0..LOG_CAPACITY {
            piece.undo_last().unwrap();
        }
        assert_eq!(piece.undo_last(), Err(EngineError::EmptyHistory));
        assert_eq!(piece.anchor(), (3, SPAWN_COL));
    }

    #[test]
    fn test_empty_cells_complement_filled() {
        let piece = Piece::new(TetrominoType::L);
        let filled = piece.coordinates();
        let empty = piece.empty_cell_coordinates();
        assert_eq!(filled.len() + empty.len(), 9);
        assert!(empty.iter().all(|coord| !filled.contains(coord)));
    }

    #[test]
    fn test_t_has_four_empty_corners_in_every_orientation() {
        let mut piece = Piece::new(TetrominoType::T);
        for _ in 0..4 {
            let mut corners = piece.empty_corner_coordinates();
            corners.sort();
            assert_eq!(corners, vec![(0, 4), (0, 6), (2, 4), (2, 6)]);
            piece.rotate();
        }
    }

    #[test]
    fn test_bounded_log_zero_capacity_stays_empty() {
        let mut log = BoundedLog::new(0);
        log.push(1);
        assert!(log.is_empty());
        assert_eq!(log.pop(), None);
    }
}
