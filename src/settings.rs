//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/blockfall/settings.toml (or platform equivalent)

use crate::board::{MIN_HEIGHT, MIN_WIDTH};
use crate::error::SettingsError;
use crate::game::GameConfig;
use crate::session::Timing;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Fast-drop factor used when the configured one is unusable
const DEFAULT_FAST_DROP_FACTOR: f64 = 0.1;

/// All player-tunable settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gameplay: GameplaySettings,
    pub input: InputSettings,
    /// Keybindings
    pub keys: KeyBindings,
}

/// Board size and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    pub board_width: usize,
    pub board_height: usize,
    /// Gravity period in milliseconds
    pub tick_ms: u64,
    /// Gravity period multiplier while fast drop is held
    pub fast_drop_factor: f64,
    /// Line clear flash duration in milliseconds
    pub clear_animation_ms: u64,
    /// Number of upcoming pieces shown
    pub preview_depth: usize,
    /// Fixed piece sequence seed; random when unset
    pub seed: Option<u64>,
}

/// Long-press repeat for horizontal movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Hold time before a key starts repeating
    pub long_press_ms: u64,
    /// Interval between repeats
    pub repeat_ms: u64,
}

/// Key bindings (stored as strings for easy editing)
/// Each action can have one or more keys bound to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub start: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub restart: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub fast_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hard_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &Vec<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    match keys.as_slice() {
        [single] => serializer.serialize_str(single),
        _ => {
            let mut seq = serializer.serialize_seq(Some(keys.len()))?;
            for key in keys {
                seq.serialize_element(key)?;
            }
            seq.end()
        }
    }
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            board_width: 10,
            board_height: 20,
            tick_ms: 800,
            fast_drop_factor: DEFAULT_FAST_DROP_FACTOR,
            clear_animation_ms: 300,
            preview_depth: 3,
            seed: None,
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            long_press_ms: 100,
            repeat_ms: 50,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            start: vec!["s".to_string(), "Enter".to_string()],
            restart: vec!["r".to_string()],
            move_left: vec!["Left".to_string()],
            move_right: vec!["Right".to_string()],
            rotate: vec!["Up".to_string(), "z".to_string()],
            fast_drop: vec!["Down".to_string()],
            hard_drop: vec!["Space".to_string()],
            quit: vec!["q".to_string(), "Esc".to_string()],
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "blockfall", "blockfall").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from file, writing the defaults out on first run
    pub fn load() -> Result<Self, SettingsError> {
        let Some(path) = Self::settings_path() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let settings = Self::default();
                match settings.save() {
                    Ok(()) => info!("Wrote default settings to {}", path.display()),
                    Err(err) => warn!("Could not write default settings: {}", err),
                }
                Ok(settings)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Parse settings; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save settings to file
    pub fn save(&self) -> Result<(), SettingsError> {
        let (Some(dir), Some(path)) = (Self::config_dir(), Self::settings_path()) else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine config directory",
            )
            .into());
        };

        // Create directory if needed
        fs::create_dir_all(&dir)?;
        fs::write(&path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Board shape for a new game, never smaller than the smallest playable board
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            width: self.gameplay.board_width.max(MIN_WIDTH),
            height: self.gameplay.board_height.max(MIN_HEIGHT),
            preview_depth: self.gameplay.preview_depth,
        }
    }

    /// Timer periods for a session
    pub fn timing(&self) -> Timing {
        let tick_ms = self.gameplay.tick_ms;
        let factor = self.gameplay.fast_drop_factor;
        let factor = if factor.is_finite() && factor > 0.0 && factor <= 1.0 {
            factor
        } else {
            warn!("Ignoring fast_drop_factor {}", factor);
            DEFAULT_FAST_DROP_FACTOR
        };

        Timing {
            tick: Duration::from_millis(tick_ms),
            fast_tick: Duration::from_millis((tick_ms as f64 * factor).round() as u64),
            clear_animation: Duration::from_millis(self.gameplay.clear_animation_ms),
        }
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.input.long_press_ms)
    }

    pub fn repeat(&self) -> Duration {
        Duration::from_millis(self.input.repeat_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [gameplay]
            tick_ms = 500
            seed = 42

            [keys]
            rotate = "x"
            quit = ["q", "Ctrl"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.gameplay.tick_ms, 500);
        assert_eq!(settings.gameplay.seed, Some(42));
        assert_eq!(settings.gameplay.board_width, 10);
        assert_eq!(settings.keys.rotate, vec!["x"]);
        assert_eq!(settings.keys.quit, vec!["q", "Ctrl"]);
        assert_eq!(settings.keys.move_left, vec!["Left"]);
        assert_eq!(settings.input, InputSettings::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let result = Settings::from_toml_str("[gameplay]\ntick_ms = \"fast\"");
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_written_settings_load_back() {
        let mut settings = Settings::default();
        settings.gameplay.seed = Some(7);
        settings.keys.hard_drop = vec!["Space".to_string(), "Enter".to_string()];

        let text = settings.to_toml_string().unwrap();
        assert!(text.contains("restart = \"r\""));
        assert_eq!(Settings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_timing_from_settings() {
        let settings = Settings::default();
        let timing = settings.timing();
        assert_eq!(timing.tick, Duration::from_millis(800));
        assert_eq!(timing.fast_tick, Duration::from_millis(80));
        assert_eq!(timing.clear_animation, Duration::from_millis(300));

        let mut broken = Settings::default();
        broken.gameplay.fast_drop_factor = -2.0;
        assert_eq!(broken.timing().fast_tick, Duration::from_millis(80));
    }

    #[test]
    fn test_game_config_from_settings() {
        let mut settings = Settings::default();
        settings.gameplay.board_width = 12;
        settings.gameplay.preview_depth = 5;
        let config = settings.game_config();
        assert_eq!(config.width, 12);
        assert_eq!(config.height, 20);
        assert_eq!(config.preview_depth, 5);

        settings.gameplay.board_width = 2;
        settings.gameplay.board_height = 0;
        let config = settings.game_config();
        assert_eq!((config.width, config.height), (MIN_WIDTH, MIN_HEIGHT));
    }
}
