//! Core game state and round lifecycle
//!
//! The machine processes one [`Event`] to completion before the next one:
//! player commands are applied to the piece first, then validated against
//! the board, then corrected or reverted. Timers live outside the machine;
//! each processed event returns the [`Effect`]s the owner must apply to them.

use crate::board::{Board, Side, BOARD_HEIGHT, BOARD_WIDTH};
use crate::error::EngineError;
use crate::piece::{Axis, Piece};
use crate::queue::{PieceQueue, PieceSource, RandomSource, DEFAULT_PREVIEW};
use crate::score::ClearLabel;
use crate::snapshot::GameSnapshot;
use crate::tetromino::TetrominoType;
use serde::Serialize;
use tracing::{debug, error, info, trace};

/// Inputs the machine accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start,
    Restart,
    MoveLeft,
    MoveRight,
    RotateCw,
    /// Fast drop held (`true`) or released (`false`)
    ToggleFastDrop(bool),
    HardDrop,
    /// Emitted by the gravity ticker
    GravityTick,
    /// Emitted by the clear-animation timer
    AnimationComplete,
}

/// Timer work requested by the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StartGravity,
    StopGravity,
    FastDrop(bool),
    StartAnimation,
    CancelAnimation,
}

/// Steps of a game in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    NewRound,
    Control,
    BoundaryCheck,
    Locking,
    LineCheck,
    ScoreCalc,
    Animation,
}

/// Top-level machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameState {
    NewGame,
    InProgress(Phase),
    GameOver,
}

/// Board size and preview depth for a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub preview_depth: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            preview_depth: DEFAULT_PREVIEW,
        }
    }
}

/// The main game struct
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    board: Board,
    /// Falling piece, or a decorative one outside of play
    current: Piece,
    queue: PieceQueue,
    state: GameState,
    status_text: String,
    round: u64,
}

impl Game {
    /// Create a new game drawing pieces from `source`
    pub fn new(config: GameConfig, source: Box<dyn PieceSource>) -> Self {
        let mut game = Self {
            config,
            board: Board::with_size(config.width, config.height),
            current: Piece::new(TetrominoType::Idle),
            queue: PieceQueue::new(source, config.preview_depth),
            state: GameState::NewGame,
            status_text: String::new(),
            round: 0,
        };
        game.show_current();
        game
    }

    /// Create a new game with a seeded random piece source
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::new(config, Box::new(RandomSource::with_seed(seed)))
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_piece(&self) -> &Piece {
        &self.current
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// Capture everything a renderer needs
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.state,
            grid: self.board.rendered().to_vec(),
            score: self.board.score(),
            lines: self.board.lines(),
            status_text: self.status_text.clone(),
            full_row_indexes: self.board.full_rows().to_vec(),
            next_pieces: self.queue.preview(),
            round: self.round,
        }
    }

    /// Process one event to completion
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let mut effects = Vec::new();

        match (self.state, event) {
            (GameState::NewGame, Event::Start) => {
                info!("Game starting");
                effects.push(Effect::StartGravity);
                self.transition(GameState::InProgress(Phase::NewRound));
            }
            (GameState::InProgress(phase), Event::Restart) => {
                info!("Game restarted in {:?} at score {}", phase, self.board.score());
                effects.push(Effect::StopGravity);
                if phase == Phase::Animation {
                    effects.push(Effect::CancelAnimation);
                }
                self.reset();
            }
            (GameState::GameOver, Event::Restart) => self.reset(),
            (GameState::InProgress(_), Event::ToggleFastDrop(on)) => {
                effects.push(Effect::FastDrop(on));
            }
            (GameState::InProgress(Phase::Control), Event::MoveLeft) => {
                self.current.move_left();
                self.transition(GameState::InProgress(Phase::BoundaryCheck));
            }
            (GameState::InProgress(Phase::Control), Event::MoveRight) => {
                self.current.move_right();
                self.transition(GameState::InProgress(Phase::BoundaryCheck));
            }
            (GameState::InProgress(Phase::Control), Event::RotateCw) => {
                self.current.rotate();
                self.transition(GameState::InProgress(Phase::BoundaryCheck));
            }
            (GameState::InProgress(Phase::Control), Event::HardDrop) => {
                self.drop_to_bottom();
                self.transition(GameState::InProgress(Phase::Locking));
            }
            (GameState::InProgress(Phase::Control), Event::GravityTick) => {
                self.current.move_down();
                if self.settle_fall() {
                    self.transition(GameState::InProgress(Phase::Locking));
                } else {
                    self.show_current();
                }
            }
            (GameState::InProgress(Phase::Animation), Event::AnimationComplete) => {
                self.board.clear_full_rows();
                self.status_text.clear();
                self.transition(GameState::InProgress(Phase::NewRound));
            }
            (state, event) => trace!("Ignoring {:?} in {:?}", event, state),
        }

        self.run_transient(&mut effects);
        effects
    }

    /// Walk through phases that need no further input
    fn run_transient(&mut self, effects: &mut Vec<Effect>) {
        while let GameState::InProgress(phase) = self.state {
            let next = match phase {
                // Only these wait for an event; the rest resolve immediately
                Phase::Control | Phase::Animation => break,
                Phase::NewRound => self.spawn_next(),
                Phase::BoundaryCheck => {
                    self.correct_or_revert();
                    GameState::InProgress(Phase::Control)
                }
                Phase::Locking => {
                    self.lock_current();
                    GameState::InProgress(Phase::LineCheck)
                }
                Phase::LineCheck => {
                    if self.board.detect_full_rows().is_empty() {
                        GameState::InProgress(Phase::NewRound)
                    } else {
                        GameState::InProgress(Phase::ScoreCalc)
                    }
                }
                Phase::ScoreCalc => {
                    self.score_clear();
                    effects.push(Effect::StartAnimation);
                    GameState::InProgress(Phase::Animation)
                }
            };

            if next == GameState::GameOver {
                info!("Game over after {} rounds, score {}", self.round, self.board.score());
                effects.push(Effect::StopGravity);
            }
            self.transition(next);
        }
    }

    fn transition(&mut self, next: GameState) {
        if self.state != next {
            debug!("{:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    fn reset(&mut self) {
        self.board = Board::with_size(self.config.width, self.config.height);
        self.current = Piece::new(TetrominoType::Idle);
        self.status_text.clear();
        self.round = 0;
        self.show_current();
        self.transition(GameState::NewGame);
    }

    /// Bring in the next piece; a blocked spawn point ends the game
    fn spawn_next(&mut self) -> GameState {
        self.round += 1;
        self.current = Piece::spawn(self.queue.next(), self.board.width());

        if self.board.is_colliding(&self.current.coordinates()) {
            self.current = Piece::new(TetrominoType::Dead);
            self.show_current();
            return GameState::GameOver;
        }

        debug!("Round {} spawned {:?}", self.round, self.current.piece_type());
        self.show_current();
        GameState::InProgress(Phase::Control)
    }

    /// Push the piece back inside the walls, or revert the command if it
    /// still overlaps the stack
    fn correct_or_revert(&mut self) {
        for (side, axis) in [(Side::Left, Axis::X), (Side::Right, Axis::X), (Side::Bottom, Axis::Y)] {
            if self.board.is_out_of_range(&self.current.coordinates(), side) {
                let delta = self.board.last_out_of_range_delta();
                trace!("Shifting piece off the {:?} edge by {}", side, delta);
                self.current.shift_axis(axis, delta);
            }
        }

        if self.board.is_colliding(&self.current.coordinates()) {
            self.undo();
        }
        self.show_current();
    }

    /// After a downward step, decide whether the piece has landed.
    /// A landed piece is left at its last legal row.
    fn settle_fall(&mut self) -> bool {
        let coordinates = self.current.coordinates();
        if self.board.is_out_of_range(&coordinates, Side::Bottom) {
            let delta = self.board.last_out_of_range_delta();
            self.current.shift_axis(Axis::Y, delta);
            true
        } else if self.board.is_colliding(&coordinates) {
            self.undo();
            true
        } else {
            false
        }
    }

    fn drop_to_bottom(&mut self) {
        loop {
            self.current.move_down();
            if self.settle_fall() {
                break;
            }
        }
    }

    fn lock_current(&mut self) {
        let code = self.current.piece_type().locked_code();
        self.board.lock_cells(&self.current.coordinates(), code);
        self.board.render_locked();
    }

    fn score_clear(&mut self) {
        let rows = self.board.full_rows().to_vec();
        let special = self
            .board
            .detect_special_move(self.current.action_log(), &self.current.empty_corner_coordinates());

        let label = if special {
            let bonus = self.board.score_special_clear(&rows);
            info!("Special move cleared {} rows for {}", rows.len(), bonus);
            Ok(ClearLabel::TSpin)
        } else {
            let clear = self.board.score_normal_clear(&rows);
            debug!("Cleared rows {:?} for {}", rows, clear.points);
            ClearLabel::from_run(clear.largest_run)
        };

        match label {
            Ok(label) => self.status_text = label.text().to_string(),
            Err(err) => contract_violation(err),
        }
    }

    fn undo(&mut self) {
        if let Err(err) = self.current.undo_last() {
            contract_violation(err);
        }
    }

    fn show_current(&mut self) {
        let code = self.current.piece_type().moving_code();
        self.board.render_overlay(&self.current.coordinates(), code);
    }
}

fn contract_violation(err: EngineError) {
    error!("Engine contract violated: {}", err);
    debug_assert!(false, "engine contract violated: {err}");
}
