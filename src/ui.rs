//! Terminal UI rendering with ratatui

use blockfall::game::GameState;
use blockfall::settings::Settings;
use blockfall::snapshot::GameSnapshot;
use blockfall::tetromino::{CellKind, TetrominoType};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const EMPTY: &str = "  ";
const MOVING_BLOCK: &str = "██";
const LOCKED_BLOCK: &str = "▓▓";
const FLASH_BLOCK: &str = "░░";

/// Width of the next queue and stats column
const SIDE_WIDTH: u16 = 18;
/// Rows given to each piece in the next queue
const PREVIEW_ROWS: u16 = 5;

fn piece_color(piece_type: TetrominoType) -> Color {
    match piece_type {
        TetrominoType::I => Color::Cyan,
        TetrominoType::J => Color::Blue,
        TetrominoType::L => Color::Rgb(255, 165, 0),
        TetrominoType::O => Color::Yellow,
        TetrominoType::S => Color::Green,
        TetrominoType::T => Color::Magenta,
        TetrominoType::Z => Color::Red,
        TetrominoType::Idle => Color::LightYellow,
        TetrominoType::Dead => Color::LightRed,
    }
}

/// Render the whole game screen.
///
/// `flash_on` alternates while rows are waiting to be cleared.
pub fn render_game(frame: &mut Frame, snapshot: &GameSnapshot, settings: &Settings, flash_on: bool) {
    let area = frame.area();
    let board_width = span(snapshot.width(), 2).saturating_add(2);
    let board_height = span(snapshot.height(), 1).saturating_add(2);

    let game_area = center_rect(area, board_width.saturating_add(SIDE_WIDTH), board_height);

    // Create main layout: board | next + stats
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(board_width), Constraint::Length(SIDE_WIDTH)])
        .split(game_area);

    render_board(frame, main_layout[0], snapshot, flash_on);

    let queue_height = span(snapshot.next_pieces.len(), PREVIEW_ROWS).saturating_add(2);
    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(queue_height), Constraint::Min(8)])
        .split(main_layout[1]);

    render_next_queue(frame, right_layout[0], &snapshot.next_pieces);
    render_stats(frame, right_layout[1], snapshot, settings);

    match snapshot.state {
        GameState::NewGame => render_overlay(
            frame,
            area,
            "BLOCKFALL",
            &format!("Press {} to start", key_name(&settings.keys.start)),
        ),
        GameState::GameOver => render_overlay(
            frame,
            area,
            "GAME OVER",
            &format!("Press {} to restart", key_name(&settings.keys.restart)),
        ),
        GameState::InProgress(_) => {}
    }
}

/// Terminal cells taken by `count` items of `size` cells each
fn span(count: usize, size: u16) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX).saturating_mul(size)
}

fn key_name(keys: &[String]) -> &str {
    keys.first().map_or("?", String::as_str)
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render the next piece queue
fn render_next_queue(frame: &mut Frame, area: Rect, queue: &[TetrominoType]) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if queue.is_empty() {
        return;
    }

    let piece_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(PREVIEW_ROWS); queue.len()])
        .split(inner);

    for (&piece_type, &piece_area) in queue.iter().zip(piece_areas.iter()) {
        render_mini_piece(frame, piece_area, piece_type);
    }
}

/// Render a small piece preview, skipping the empty rows of its grid
fn render_mini_piece(frame: &mut Frame, area: Rect, piece_type: TetrominoType) {
    if area.height < 1 || area.width < 4 {
        return;
    }

    let style = Style::default().fg(piece_color(piece_type));
    let shape = piece_type.shape();

    let lines: Vec<Line> = (0..shape.rows())
        .filter(|&row| (0..shape.cols()).any(|col| shape.is_filled(row, col)))
        .map(|row| {
            let spans: Vec<Span> = (0..shape.cols())
                .map(|col| {
                    if shape.is_filled(row, col) {
                        Span::styled(MOVING_BLOCK, style)
                    } else {
                        Span::raw(EMPTY)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Render the game board from the snapshot grid
fn render_board(frame: &mut Frame, area: Rect, snapshot: &GameSnapshot, flash_on: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = snapshot
        .grid
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let clearing = flash_on && snapshot.is_row_clearing(row);
            let spans: Vec<Span> = cells
                .iter()
                .map(|&code| {
                    if clearing {
                        return Span::styled(FLASH_BLOCK, Style::default().fg(Color::White));
                    }
                    match CellKind::from_code(code) {
                        CellKind::Empty => Span::raw(EMPTY),
                        CellKind::Moving(piece_type) => {
                            Span::styled(MOVING_BLOCK, Style::default().fg(piece_color(piece_type)).bold())
                        }
                        CellKind::Locked(piece_type) => {
                            Span::styled(LOCKED_BLOCK, Style::default().fg(piece_color(piece_type)))
                        }
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, snapshot: &GameSnapshot, settings: &Settings) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(Span::styled("SCORE", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", snapshot.score),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::raw(""),
        Line::from(Span::styled("LINES", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", snapshot.lines),
            Style::default().fg(Color::Green),
        )),
        Line::raw(""),
        Line::from(Span::styled("ROUND", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", snapshot.round),
            Style::default().fg(Color::Cyan),
        )),
    ];

    // Feedback for the clear being animated
    if !snapshot.status_text.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            snapshot.status_text.clone(),
            Style::default().fg(Color::Magenta).bold(),
        ));
    }

    if matches!(snapshot.state, GameState::InProgress(_)) {
        let keys = &settings.keys;
        lines.push(Line::raw(""));
        for (name, label) in [
            (key_name(&keys.rotate), "rotate"),
            (key_name(&keys.fast_drop), "fast"),
            (key_name(&keys.hard_drop), "drop"),
            (key_name(&keys.restart), "restart"),
        ] {
            lines.push(Line::styled(
                format!("{name:>6} {label}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, inner);
}

/// Render an overlay (for new game / game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_width = 24u16;
    let popup_height = 5u16;
    let popup_area = center_rect(area, popup_width, popup_height);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle, Style::default().fg(Color::Gray)),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockfall::game::{Event, Game, GameConfig};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(snapshot: &GameSnapshot, flash_on: bool) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 30)).unwrap();
        terminal
            .draw(|frame| render_game(frame, snapshot, &Settings::default(), flash_on))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_new_game_screen() {
        let game = Game::with_seed(GameConfig::default(), 1);
        let text = screen_text(&game.snapshot(), false);
        assert!(text.contains("BLOCKFALL"));
        assert!(text.contains("Press s to start"));
        assert!(text.contains("NEXT"));
    }

    #[test]
    fn test_playing_screen_shows_stats_and_piece() {
        let mut game = Game::with_seed(GameConfig::default(), 1);
        game.handle(Event::Start);
        let text = screen_text(&game.snapshot(), false);
        assert!(text.contains("SCORE"));
        assert!(text.contains("ROUND"));
        assert!(!text.contains("BLOCKFALL"));
        assert!(text.contains(MOVING_BLOCK));
    }

    #[test]
    fn test_oversized_board_saturates() {
        assert_eq!(span(40_000, 2), u16::MAX);
        assert_eq!(span(usize::MAX, 1), u16::MAX);
        assert_eq!(span(3, PREVIEW_ROWS), 15);

        let config = GameConfig {
            width: 33_000,
            height: 4,
            preview_depth: 3,
        };
        let game = Game::with_seed(config, 1);
        let text = screen_text(&game.snapshot(), false);
        assert!(text.contains("BLOCKFALL"));
    }

    #[test]
    fn test_piece_colors_are_distinct() {
        let colors: std::collections::HashSet<_> =
            TetrominoType::all().iter().map(|&t| piece_color(t)).collect();
        assert_eq!(colors.len(), 7);
    }
}
