//! Owns a [`Game`] together with its timers and event channel
//!
//! Inputs and timer events are funnelled through one channel and processed
//! strictly in arrival order by [`Session::pump`], so the machine never sees
//! two events at once.

use crate::game::{Effect, Event, Game};
use crate::snapshot::GameSnapshot;
use crate::timers::{AnimationTimer, GravityTicker};
use std::sync::mpsc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

/// Timer periods for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Gravity period
    pub tick: Duration,
    /// Gravity period while fast drop is held
    pub fast_tick: Duration,
    /// How long cleared rows flash before they are removed
    pub clear_animation: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(800),
            fast_tick: Duration::from_millis(80),
            clear_animation: Duration::from_millis(300),
        }
    }
}

pub struct Session {
    game: Game,
    timing: Timing,
    handle: Handle,
    event_tx: mpsc::Sender<Event>,
    event_rx: mpsc::Receiver<Event>,
    gravity: Option<GravityTicker>,
    animation: Option<AnimationTimer>,
}

impl Session {
    /// Timers are spawned on `handle`
    pub fn new(game: Game, timing: Timing, handle: Handle) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            game,
            timing,
            handle,
            event_tx,
            event_rx,
            gravity: None,
            animation: None,
        }
    }

    /// Queue an event for the next [`Session::pump`]
    pub fn submit(&self, event: Event) {
        // The receiver lives as long as `self`
        let _ = self.event_tx.send(event);
    }

    /// Process every queued event; returns how many were handled
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            for effect in self.game.handle(event) {
                self.apply(effect);
            }
            handled += 1;
        }
        handled
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.game.snapshot()
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn is_gravity_running(&self) -> bool {
        self.gravity.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    fn apply(&mut self, effect: Effect) {
        debug!("Applying {:?}", effect);
        match effect {
            Effect::StartGravity => {
                self.gravity = Some(GravityTicker::spawn(
                    &self.handle,
                    self.timing.tick,
                    self.timing.fast_tick,
                    self.event_tx.clone(),
                ));
            }
            Effect::StopGravity => self.gravity = None,
            Effect::FastDrop(on) => {
                if let Some(gravity) = &self.gravity {
                    gravity.set_fast(on);
                }
            }
            Effect::StartAnimation => {
                self.animation = Some(AnimationTimer::spawn(
                    &self.handle,
                    self.timing.clear_animation,
                    self.event_tx.clone(),
                ));
            }
            Effect::CancelAnimation => self.animation = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, GameState, Phase};
    use crate::queue::ScriptedSource;
    use crate::tetromino::TetrominoType;
    use tokio::time::sleep;

    const CONTROL: GameState = GameState::InProgress(Phase::Control);

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn timing() -> Timing {
        Timing {
            tick: ms(100),
            fast_tick: ms(10),
            clear_animation: ms(300),
        }
    }

    fn session(config: GameConfig, script: &[TetrominoType]) -> Session {
        let game = Game::new(config, Box::new(ScriptedSource::new(script.to_vec())));
        Session::new(game, timing(), Handle::current())
    }

    #[tokio::test(start_paused = true)]
    async fn test_gravity_runs_after_start() {
        let mut session = session(GameConfig::default(), &[TetrominoType::O]);
        sleep(ms(500)).await;
        session.pump();
        assert_eq!(session.snapshot().state, GameState::NewGame);
        assert!(!session.is_gravity_running());

        session.submit(Event::Start);
        assert_eq!(session.pump(), 1);
        assert!(session.is_gravity_running());

        sleep(ms(350)).await;
        session.pump();
        let (row, _) = session.game().current_piece().anchor();
        assert!((2..=4).contains(&row), "piece at row {row}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_drop_speeds_up_gravity() {
        let mut session = session(GameConfig::default(), &[TetrominoType::O]);
        session.submit(Event::Start);
        session.submit(Event::ToggleFastDrop(true));
        session.pump();

        sleep(ms(105)).await;
        session.pump();
        let (row, _) = session.game().current_piece().anchor();
        assert!((8..=11).contains(&row), "piece at row {row}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_stops_gravity() {
        let mut session = session(GameConfig::default(), &[TetrominoType::O]);
        session.submit(Event::Start);
        session.pump();
        sleep(ms(250)).await;
        session.submit(Event::Restart);
        session.pump();
        assert_eq!(session.snapshot().state, GameState::NewGame);
        assert!(!session.is_gravity_running());

        sleep(ms(1000)).await;
        assert_eq!(session.pump(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_line_clear_animates_then_continues() {
        // Three O pieces side by side fill the bottom two rows of a 6 wide board
        let config = GameConfig {
            width: 6,
            height: 8,
            preview_depth: 3,
        };
        let mut session = session(config, &[TetrominoType::O]);
        session.submit(Event::Start);
        for _ in 0..4 {
            session.submit(Event::MoveLeft);
        }
        session.submit(Event::HardDrop);
        for _ in 0..2 {
            session.submit(Event::MoveLeft);
        }
        session.submit(Event::HardDrop);
        session.submit(Event::HardDrop);
        session.pump();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, GameState::InProgress(Phase::Animation));
        assert_eq!(snapshot.status_text, "Double!");
        assert_eq!(snapshot.full_row_indexes, vec![6, 7]);
        assert_eq!(snapshot.score, 220);
        assert!(session.is_animating());

        sleep(ms(150)).await;
        session.pump();
        assert_eq!(session.snapshot().state, GameState::InProgress(Phase::Animation));

        sleep(ms(200)).await;
        session.pump();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, CONTROL);
        assert_eq!(snapshot.status_text, "");
        assert_eq!(snapshot.lines, 2);
        assert_eq!(snapshot.round, 4);
        assert!(session.game().board().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_animation() {
        let config = GameConfig {
            width: 6,
            height: 8,
            preview_depth: 3,
        };
        let mut session = session(config, &[TetrominoType::O]);
        session.submit(Event::Start);
        for _ in 0..4 {
            session.submit(Event::MoveLeft);
        }
        session.submit(Event::HardDrop);
        for _ in 0..2 {
            session.submit(Event::MoveLeft);
        }
        session.submit(Event::HardDrop);
        session.submit(Event::HardDrop);
        session.submit(Event::Restart);
        session.pump();
        assert!(!session.is_animating());

        sleep(ms(1000)).await;
        assert_eq!(session.pump(), 0);
        assert_eq!(session.snapshot().state, GameState::NewGame);
    }
}
