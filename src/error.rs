//! Error types for the engine and its configuration

use thiserror::Error;

/// Contract violations inside the engine.
///
/// Neither variant is reachable from player input in a correct build; the
/// state machine logs them and trips a debug assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// `undo_last` was called with nothing to restore
    #[error("piece has no history to undo")]
    EmptyHistory,
    /// A clear produced a run length with no feedback label
    #[error("no clear label for a run of {0} rows")]
    InvalidClearLabel(usize),
}

/// Failures while loading `settings.toml`
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
