//! Keyboard handling with long-press repeat for horizontal movement
//!
//! Release events are only reported by terminals that support the keyboard
//! enhancement protocol, so a held key is also considered released once no
//! press or repeat event has been seen for a while.

use blockfall::game::Event;
use blockfall::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};
use tracing::warn;

/// Time after which we consider a key "released" if no repeat received
const KEY_TIMEOUT: Duration = Duration::from_millis(100);

/// What the front end should do with a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Game(Event),
    Quit,
}

/// Input handler with long-press support
pub struct InputHandler {
    left_state: Option<KeyPressState>,
    right_state: Option<KeyPressState>,
    /// Only the hold matters for fast drop, it never repeats
    fast_drop_seen: Option<Instant>,
    bindings: KeyBindings,
    long_press: Duration,
    repeat: Duration,
}

#[derive(Debug, Clone)]
struct KeyPressState {
    first_press: Instant,
    last_seen: Instant,
    last_repeat: Option<Instant>,
}

impl KeyPressState {
    fn new(now: Instant) -> Self {
        Self {
            first_press: now,
            last_seen: now,
            last_repeat: None,
        }
    }

    /// Returns true when a repeat is due
    fn poll(&mut self, now: Instant, long_press: Duration, repeat: Duration) -> bool {
        if now.duration_since(self.first_press) < long_press {
            return false;
        }
        let due = match self.last_repeat {
            None => true,
            Some(last) => now.duration_since(last) >= repeat,
        };
        if due {
            self.last_repeat = Some(now);
        }
        due
    }
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub start: Vec<KeyCode>,
    pub restart: Vec<KeyCode>,
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub rotate: Vec<KeyCode>,
    pub fast_drop: Vec<KeyCode>,
    pub hard_drop: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    fn parse_key(s: &str) -> Option<KeyCode> {
        let key = match s.to_lowercase().as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "esc" | "escape" => KeyCode::Esc,
            s if s.chars().count() == 1 => KeyCode::Char(s.chars().next()?),
            _ => return None,
        };
        Some(key)
    }

    /// Parse a list of key strings into KeyCodes, skipping unknown names
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter()
            .filter_map(|s| {
                let key = Self::parse_key(s);
                if key.is_none() {
                    warn!("Ignoring unknown key binding {:?}", s);
                }
                key
            })
            .collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        let keys = &settings.keys;
        Self {
            start: Self::parse_keys(&keys.start),
            restart: Self::parse_keys(&keys.restart),
            move_left: Self::parse_keys(&keys.move_left),
            move_right: Self::parse_keys(&keys.move_right),
            rotate: Self::parse_keys(&keys.rotate),
            fast_drop: Self::parse_keys(&keys.fast_drop),
            hard_drop: Self::parse_keys(&keys.hard_drop),
            quit: Self::parse_keys(&keys.quit),
        }
    }
}

impl InputHandler {
    /// Create input handler from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            left_state: None,
            right_state: None,
            fast_drop_seen: None,
            bindings: KeyBindings::from_settings(settings),
            long_press: settings.long_press(),
            repeat: settings.repeat(),
        }
    }

    /// Handle a key press or terminal repeat - returns immediate commands
    pub fn key_down(&mut self, key: KeyEvent, now: Instant) -> Vec<Command> {
        let mut commands = Vec::new();

        // Handle Ctrl+C for quit
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            commands.push(Command::Quit);
            return commands;
        }

        let code = normalize_key(key.code);

        if self.bindings.move_left.contains(&code) {
            match &mut self.left_state {
                Some(state) => state.last_seen = now,
                None => {
                    // New press - immediate action
                    commands.push(Command::Game(Event::MoveLeft));
                    self.left_state = Some(KeyPressState::new(now));
                }
            }
            // Cancel opposite direction
            self.right_state = None;
        } else if self.bindings.move_right.contains(&code) {
            match &mut self.right_state {
                Some(state) => state.last_seen = now,
                None => {
                    commands.push(Command::Game(Event::MoveRight));
                    self.right_state = Some(KeyPressState::new(now));
                }
            }
            self.left_state = None;
        } else if self.bindings.fast_drop.contains(&code) {
            if self.fast_drop_seen.is_none() {
                commands.push(Command::Game(Event::ToggleFastDrop(true)));
            }
            self.fast_drop_seen = Some(now);
        } else if self.bindings.hard_drop.contains(&code) {
            commands.push(Command::Game(Event::HardDrop));
        } else if self.bindings.rotate.contains(&code) {
            commands.push(Command::Game(Event::RotateCw));
        } else if self.bindings.start.contains(&code) {
            commands.push(Command::Game(Event::Start));
        } else if self.bindings.restart.contains(&code) {
            self.clear();
            commands.push(Command::Game(Event::Restart));
        } else if self.bindings.quit.contains(&code) {
            commands.push(Command::Quit);
        }

        commands
    }

    /// Handle a key release event (only reported by some terminals)
    pub fn key_up(&mut self, key: KeyEvent) -> Vec<Command> {
        let code = normalize_key(key.code);

        if self.bindings.move_left.contains(&code) {
            self.left_state = None;
        } else if self.bindings.move_right.contains(&code) {
            self.right_state = None;
        } else if self.bindings.fast_drop.contains(&code) && self.fast_drop_seen.take().is_some() {
            return vec![Command::Game(Event::ToggleFastDrop(false))];
        }
        Vec::new()
    }

    /// Update held keys and return repeat commands (call every frame)
    pub fn update(&mut self, now: Instant) -> Vec<Command> {
        let mut commands = Vec::new();

        // Check for timed-out keys (no recent key event = released)
        let timed_out = |state: &Option<KeyPressState>| {
            state
                .as_ref()
                .is_some_and(|state| now.duration_since(state.last_seen) > KEY_TIMEOUT)
        };
        if timed_out(&self.left_state) {
            self.left_state = None;
        }
        if timed_out(&self.right_state) {
            self.right_state = None;
        }
        if self
            .fast_drop_seen
            .is_some_and(|seen| now.duration_since(seen) > KEY_TIMEOUT)
        {
            self.fast_drop_seen = None;
            commands.push(Command::Game(Event::ToggleFastDrop(false)));
        }

        let (long_press, repeat) = (self.long_press, self.repeat);
        if let Some(state) = &mut self.left_state {
            if state.poll(now, long_press, repeat) {
                commands.push(Command::Game(Event::MoveLeft));
            }
        }
        if let Some(state) = &mut self.right_state {
            if state.poll(now, long_press, repeat) {
                commands.push(Command::Game(Event::MoveRight));
            }
        }

        commands
    }

    /// Forget all held keys
    pub fn clear(&mut self) {
        self.left_state = None;
        self.right_state = None;
        self.fast_drop_seen = None;
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
