//! Falling-block puzzle engine
//!
//! [`game::Game`] is a run-to-completion state machine over a [`board::Board`]
//! and the falling [`piece::Piece`]. [`session::Session`] wires it to the
//! gravity and animation timers, and renderers read [`snapshot::GameSnapshot`]s.

pub mod board;
pub mod error;
pub mod game;
pub mod piece;
pub mod queue;
pub mod score;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod tetromino;
pub mod timers;
