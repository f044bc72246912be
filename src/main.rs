//! blockfall - a falling-block puzzle game for the terminal

mod input;
mod ui;

use blockfall::game::Game;
use blockfall::session::Session;
use blockfall::settings::Settings;
use crossterm::{
    event::{
        self, Event, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use input::{Command, InputHandler};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Half period of the full-row flash
const FLASH_PERIOD: Duration = Duration::from_millis(75);

/// Get the blockfall temp directory, creating it if needed
fn blockfall_temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("blockfall");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> io::Result<()> {
    // Generate session ID for this instance
    let session_id: u32 = rand::random();

    let log_dir = blockfall_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blockfall=debug")),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "blockfall starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let settings = Settings::load().unwrap_or_else(|err| {
        tracing::warn!("Falling back to default settings: {}", err);
        Settings::default()
    });

    let seed = settings.gameplay.seed.unwrap_or_else(rand::random);
    tracing::info!("Piece seed {}", seed);

    // Runtime for the gravity and animation timers
    let runtime = tokio::runtime::Runtime::new()?;
    let game = Game::with_seed(settings.game_config(), seed);
    let mut session = Session::new(game, settings.timing(), runtime.handle().clone());

    // Setup terminal
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    // Release events let a held key end as soon as it is let go
    let enhanced = execute!(
        out,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok();

    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut session, &settings);

    // Restore terminal
    if enhanced {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    let snapshot = session.snapshot();
    tracing::info!("Exiting with score {} after {} rounds", snapshot.score, snapshot.round);
    if result.is_ok() {
        println!("\nThanks for playing blockfall!");
        println!("Final Score: {} | Lines: {}", snapshot.score, snapshot.lines);
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    settings: &Settings,
) -> io::Result<()> {
    let mut input = InputHandler::from_settings(settings);
    let started = Instant::now();

    loop {
        let snapshot = session.snapshot();
        let flash_on = (started.elapsed().as_millis() / FLASH_PERIOD.as_millis()) % 2 == 0;
        terminal.draw(|frame| ui::render_game(frame, &snapshot, settings, flash_on))?;

        let mut commands = Vec::new();

        // Handle input
        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                let now = Instant::now();
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => {
                        commands.extend(input.key_down(key, now));
                    }
                    KeyEventKind::Release => commands.extend(input.key_up(key)),
                }
            }
        }

        // Long-press repeats and timed-out holds
        commands.extend(input.update(Instant::now()));

        for command in commands {
            match command {
                Command::Game(event) => session.submit(event),
                Command::Quit => return Ok(()),
            }
        }

        session.pump();
    }
}
