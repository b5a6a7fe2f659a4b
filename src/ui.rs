//! Layout and drawing: playfield, sidebar, pause, game over, name entry, ranking.

use crate::game::{FIELD_HEIGHT, FIELD_WIDTH};
use crate::highscores::MAX_RECORDS;
use crate::input::Button;
use crate::screen::{Screen, Snapshot};
use crate::shapes::PieceKind;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each cell is drawn two terminal columns wide so blocks look square.
const CELL_WIDTH: u16 = 2;
const BOARD_OUTER_W: u16 = FIELD_WIDTH as u16 * CELL_WIDTH + 2;
const BOARD_OUTER_H: u16 = FIELD_HEIGHT as u16 + 2;
const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the game-over fade in ms.
const GAME_OVER_FADE_MS: u32 = 700;
/// Name-entry cursor blink half-period in ms.
const CURSOR_BLINK_MS: u128 = 500;

const GAME_OVER_POPUP: (u16, u16) = (44, 12);
const NAME_POPUP: (u16, u16) = (40, 10);
const RANKING_POPUP: (u16, u16) = (62, 19);

const BLOCK: &str = "██";
const EMPTY: &str = " ·";

/// Game-over fade effect and the last time it was processed.
#[derive(Default)]
pub struct Fade {
    effect: Option<Effect>,
    processed_at: Option<Instant>,
}

impl Fade {
    fn clear(&mut self) {
        self.effect = None;
        self.processed_at = None;
    }

    fn finished(&self) -> bool {
        self.effect.as_ref().is_some_and(Effect::done)
    }
}

/// Board (with border) and sidebar, centred in `area`.
fn game_layout(area: Rect) -> (Rect, Rect) {
    let total_w = BOARD_OUTER_W + SIDEBAR_WIDTH;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_OUTER_H),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_OUTER_W),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Next, stats and help boxes of the sidebar.
fn sidebar_sections(sidebar: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Next (border + title + preview)
            Constraint::Length(1), // gap
            Constraint::Length(8), // Stats (border + score, level, lines, speed, gap, button)
            Constraint::Length(1), // gap
            Constraint::Fill(1),   // Help
        ])
        .split(sidebar);
    [chunks[0], chunks[2], chunks[4]]
}

fn centered(area: Rect, (w, h): (u16, u16)) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn popup_rect(area: Rect, screen: Screen) -> Option<Rect> {
    match screen {
        Screen::Playing | Screen::Paused => None,
        Screen::GameOver => Some(centered(area, GAME_OVER_POPUP)),
        Screen::NameEntry => Some(centered(area, NAME_POPUP)),
        Screen::Ranking(_) => Some(centered(area, RANKING_POPUP)),
    }
}

fn label(button: Button) -> &'static str {
    match button {
        Button::Ranking => "[ Ranking ]",
        Button::Submit => "[ Submit ]",
        Button::Back => "[ Back ]",
        Button::Retry => "[ Retry ]",
        Button::EnterName => "[ Enter Name ]",
    }
}

/// Lay buttons out centred on one row of `within`, two columns apart.
fn button_row(within: Rect, y: u16, row: &[Button]) -> Vec<(Button, Rect)> {
    let gap = 2u16;
    let total: u16 = row.iter().map(|b| label(*b).len() as u16).sum::<u16>()
        + gap * (row.len() as u16).saturating_sub(1);
    let mut x = within.x + within.width.saturating_sub(total) / 2;
    row.iter()
        .map(|&b| {
            let width = label(b).len() as u16;
            let rect = Rect {
                x,
                y,
                width,
                height: 1,
            };
            x += width + gap;
            (b, rect)
        })
        .collect()
}

/// Clickable buttons for the current screen. Drawing and hit-testing share this.
pub fn buttons(area: Rect, screen: Screen) -> Vec<(Button, Rect)> {
    if let Some(popup) = popup_rect(area, screen) {
        let y = (popup.y + popup.height).saturating_sub(3);
        let row: &[Button] = match screen {
            Screen::GameOver => &[Button::Retry, Button::EnterName, Button::Ranking],
            Screen::NameEntry => &[Button::Submit, Button::Back, Button::Ranking],
            Screen::Ranking(_) => &[Button::Back],
            Screen::Playing | Screen::Paused => &[],
        };
        return button_row(popup, y, row);
    }
    let (_, sidebar) = game_layout(area);
    let stats = sidebar_sections(sidebar)[1].inner(Margin::new(1, 1));
    vec![(
        Button::Ranking,
        Rect {
            x: stats.x,
            y: stats.y + 5,
            width: label(Button::Ranking).len() as u16,
            height: 1,
        },
    )]
}

/// Which button (if any) sits under the terminal cell `(column, row)`.
pub fn button_at(area: Rect, screen: Screen, column: u16, row: u16) -> Option<Button> {
    buttons(area, screen)
        .into_iter()
        .find(|(_, r)| {
            column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
        })
        .map(|(b, _)| b)
}

/// Write `s` only when it starts inside the buffer.
fn put(buf: &mut Buffer, x: u16, y: u16, s: &str, style: Style) {
    let area = buf.area;
    if x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height {
        buf.set_string(x, y, s, style);
    }
}

/// Draw the current screen. The game is always drawn underneath; popups go on top.
pub fn draw(
    frame: &mut Frame,
    snap: &Snapshot,
    theme: &Theme,
    fade: &mut Fade,
    now: Instant,
    animate: bool,
) {
    let area = frame.area();
    let (board, sidebar) = game_layout(area);
    let game_over = snap.piece.is_none();
    if !game_over {
        fade.clear();
    }

    let fading = game_over && animate && snap.screen == Screen::GameOver && !fade.finished();
    draw_board(frame, snap, theme, board, game_over && !fading);
    if fading {
        apply_game_over_fade(frame, theme, board, fade, now);
    }
    draw_sidebar(frame, snap, theme, area, sidebar);

    match snap.screen {
        Screen::Playing => {}
        Screen::Paused => draw_pause_overlay(frame, snap, theme, board),
        Screen::GameOver => draw_game_over(frame, snap, theme, area),
        Screen::NameEntry => draw_name_entry(frame, snap, theme, area, now),
        Screen::Ranking(_) => draw_ranking(frame, snap, theme, area),
    }
    if let Some(popup) = popup_rect(area, snap.screen) {
        draw_buttons(frame.buffer_mut(), theme, &buttons(area, snap.screen), popup);
    }
}

/// Fade locked blocks to the inactive colour (TachyonFX).
fn apply_game_over_fade(
    frame: &mut Frame,
    theme: &Theme,
    board: Rect,
    fade: &mut Fade,
    now: Instant,
) {
    let delta = fade
        .processed_at
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    fade.processed_at = Some(now);

    let inner = board.inner(Margin::new(1, 1));
    let effect = fade.effect.get_or_insert_with(|| {
        fx::fade_to(
            theme.inactive_fg,
            theme.bg,
            (GAME_OVER_FADE_MS, Interpolation::Linear),
        )
        .with_area(inner)
    });
    frame.render_effect(effect, inner, TfxDuration::from_millis(delta_ms));
}

fn draw_board(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect, dimmed: bool) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Blockfall ", theme.title));
    let inner = block.inner(area);
    let buf = frame.buffer_mut();
    block.render(area, buf);

    let piece_cells = snap.piece.map(|p| p.cells());
    for y in 0..snap.playfield.height {
        for x in 0..snap.playfield.width {
            let in_piece = piece_cells
                .is_some_and(|cells| cells.contains(&(x as i32, y as i32)));
            let color_id = match (in_piece, snap.piece) {
                (true, Some(p)) => p.kind.color_id(),
                _ => snap.playfield.get(x, y).map_or(0, |c| c.color_id()),
            };
            let (symbol, style) = if color_id == 0 {
                (EMPTY, Style::default().fg(theme.div_line).bg(theme.bg))
            } else if dimmed {
                (BLOCK, Style::default().fg(theme.inactive_fg).bg(theme.bg))
            } else {
                (BLOCK, Style::default().fg(theme.cell_color(color_id)).bg(theme.bg))
            };
            let rx = inner.x + x as u16 * CELL_WIDTH;
            let ry = inner.y + y as u16;
            if rx + CELL_WIDTH <= inner.x + inner.width && ry < inner.y + inner.height {
                put(buf, rx, ry, symbol, style);
            }
        }
    }
}

fn boxed(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
}

fn draw_sidebar(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect, sidebar: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);
    let [next, stats, help] = sidebar_sections(sidebar);
    let buf = frame.buffer_mut();

    // --- Next ---
    let next_block = boxed(theme);
    let next_inner = next_block.inner(next);
    next_block.render(next, buf);
    Paragraph::new(Line::from(Span::styled("Next", title_style))).render(next_inner, buf);
    let preview = Rect {
        y: next_inner.y + 1,
        height: next_inner.height.saturating_sub(1),
        ..next_inner
    };
    draw_preview(buf, theme, preview, snap.next);

    // --- Stats ---
    let stats_block = boxed(theme);
    let stats_inner = stats_block.inner(stats);
    stats_block.render(stats, buf);
    let stat = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(name, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let lines = vec![
        stat("Score: ", snap.score.to_string()),
        stat("Level: ", snap.level.to_string()),
        stat("Lines: ", snap.lines.to_string()),
        stat("Speed: ", format!("{} ms", snap.fall_interval.as_millis())),
        match snap.last_lock {
            Some(event) if event.lines > 0 => {
                stat("Last:  ", format!("+{} ({}L)", event.points, event.lines))
            }
            _ => stat("Last:  ", "-".to_string()),
        },
    ];
    Paragraph::new(lines).render(stats_inner, buf);
    if matches!(snap.screen, Screen::Playing | Screen::Paused) {
        let sidebar_buttons = buttons(area, snap.screen);
        draw_buttons(buf, theme, &sidebar_buttons, stats_inner);
    }

    // --- Help ---
    let help_block = boxed(theme);
    let help_inner = help_block.inner(help);
    help_block.render(help, buf);
    let hints = vec![
        Line::from(Span::styled("←→ move   ↑ rotate", hint_style)),
        Line::from(Span::styled("↓ soft    ␣ drop", hint_style)),
        Line::from(Span::styled("P pause   R ranking", hint_style)),
        Line::from(Span::styled("Esc quit", hint_style)),
    ];
    Paragraph::new(hints).render(help_inner, buf);
}

/// Next piece in its spawn orientation, centred in `area`.
fn draw_preview(buf: &mut Buffer, theme: &Theme, area: Rect, kind: PieceKind) {
    let cells = kind.shape(0);
    let (min_x, min_y, max_x, max_y) = cells.iter().fold(
        (i32::MAX, i32::MAX, i32::MIN, i32::MIN),
        |(ax, ay, bx, by), &(x, y)| (ax.min(x), ay.min(y), bx.max(x), by.max(y)),
    );
    let bw = (max_x - min_x + 1) as u16 * CELL_WIDTH;
    let bh = (max_y - min_y + 1) as u16;
    let off_x = area.width.saturating_sub(bw) / 2;
    let off_y = area.height.saturating_sub(bh) / 2;
    let style = Style::default().fg(theme.piece_color(kind)).bg(theme.bg);
    for (x, y) in cells {
        let rx = area.x + off_x + (x - min_x) as u16 * CELL_WIDTH;
        let ry = area.y + off_y + (y - min_y) as u16;
        if ry < area.y + area.height {
            put(buf, rx, ry, BLOCK, style);
        }
    }
}

fn draw_buttons(buf: &mut Buffer, theme: &Theme, buttons: &[(Button, Rect)], within: Rect) {
    let style = Style::default().fg(Color::Black).bg(theme.title).bold();
    for (button, rect) in buttons {
        if rect.y < within.y + within.height {
            put(buf, rect.x, rect.y, label(*button), style);
        }
    }
}

fn popup(frame: &mut Frame, theme: &Theme, rect: Rect, title: &str, lines: Vec<Line>) {
    let buf = frame.buffer_mut();
    Clear.render(rect, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(
            boxed(theme)
                .border_style(Style::default().fg(theme.title).bg(theme.bg))
                .title(Span::styled(title.to_string(), theme.title)),
        )
        .render(rect, buf);
}

fn draw_pause_overlay(frame: &mut Frame, snap: &Snapshot, theme: &Theme, board: Rect) {
    if !snap.paused() {
        return;
    }
    let rect = centered(board, (board.width, 5));
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(Span::styled(
            "P resume  Esc quit",
            Style::default().fg(theme.main_fg),
        )),
    ];
    popup(frame, theme, rect, "", lines);
}

fn draw_game_over(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect) {
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("Score: {}", snap.score), fg)),
        Line::from(Span::styled(format!("Lines: {}", snap.lines), fg)),
        Line::from(Span::styled(format!("Level: {}", snap.level), fg)),
    ];
    if snap.qualifies && snap.score > 0 {
        lines.push(Line::from(Span::styled(
            "New top-10 score!",
            Style::default().fg(Color::Yellow).bold(),
        )));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "R retry  Enter name  Esc quit",
        Style::default().fg(theme.inactive_fg),
    )));
    let rect = centered(area, GAME_OVER_POPUP);
    popup(frame, theme, rect, " Blockfall ", lines);
}

fn draw_name_entry(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect, now: Instant) {
    let blink_on =
        now.saturating_duration_since(snap.name_started).as_millis() / CURSOR_BLINK_MS % 2 == 0;
    let cursor = if blink_on { "_" } else { " " };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Enter your name", Style::default().fg(theme.title))),
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.inactive_fg)),
            Span::styled(snap.name.to_string(), Style::default().fg(theme.main_fg).bold()),
            Span::styled(cursor, Style::default().fg(theme.main_fg)),
        ]),
        Line::from(Span::styled(
            format!("{}/{}", snap.name.chars().count(), crate::highscores::MAX_NAME_LEN),
            Style::default().fg(theme.inactive_fg),
        )),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "Enter submit  Esc back",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    let rect = centered(area, NAME_POPUP);
    popup(frame, theme, rect, " Name ", lines);
}

fn draw_ranking(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect) {
    let header = Style::default().fg(theme.title);
    let fg = Style::default().fg(theme.main_fg);
    let dim = Style::default().fg(theme.inactive_fg);
    let mut lines = vec![
        Line::from(Span::styled("Top 10", header.bold())),
        Line::from(Span::styled(
            format!(
                "{:>2}  {:<20} {:>7} {:>5} {:>2}  {:<10}",
                "#", "Name", "Score", "Lines", "Lv", "Date"
            ),
            header,
        )),
    ];
    for rank in 0..MAX_RECORDS {
        let line = match snap.ranking.get(rank) {
            Some(r) => Line::from(Span::styled(
                format!(
                    "{:>2}  {:<20} {:>7} {:>5} {:>2}  {:<10}",
                    rank + 1,
                    r.name,
                    r.score,
                    r.lines,
                    r.level,
                    r.date
                ),
                fg,
            )),
            None => Line::from(Span::styled(
                format!("{:>2}  {:<20} {:>7} {:>5} {:>2}  {:<10}", rank + 1, "---", "", "", "", ""),
                dim,
            )),
        };
        lines.push(line);
    }
    lines.push(Line::from(""));
    lines.push(match snap.save_error {
        Some(err) => Line::from(Span::styled(
            format!("Could not save: {err}"),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(""),
    });
    lines.push(match snap.ranking_path {
        Some(path) => Line::from(Span::styled(format!("File: {}", path.display()), dim)),
        None => Line::from(""),
    });
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Esc / Enter back", dim)));
    let rect = centered(area, RANKING_POPUP);
    popup(frame, theme, rect, " Ranking ", lines);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Back;

    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 100,
        height: 40,
    };

    #[test]
    fn test_button_hit_test_matches_layout() {
        for screen in [
            Screen::Playing,
            Screen::Paused,
            Screen::GameOver,
            Screen::NameEntry,
            Screen::Ranking(Back::Playing),
        ] {
            for (button, rect) in buttons(AREA, screen) {
                assert_eq!(button_at(AREA, screen, rect.x, rect.y), Some(button));
                assert_eq!(
                    button_at(AREA, screen, rect.x + rect.width - 1, rect.y),
                    Some(button)
                );
            }
        }
        assert_eq!(button_at(AREA, Screen::GameOver, 0, 0), None);
    }

    #[test]
    fn test_game_over_buttons_fit_popup() {
        let popup = centered(AREA, GAME_OVER_POPUP);
        let row = buttons(AREA, Screen::GameOver);
        let kinds: Vec<Button> = row.iter().map(|(b, _)| *b).collect();
        assert_eq!(kinds, vec![Button::Retry, Button::EnterName, Button::Ranking]);
        for (_, rect) in row {
            assert!(rect.x > popup.x && rect.x + rect.width < popup.x + popup.width);
            assert!(rect.y > popup.y && rect.y < popup.y + popup.height - 1);
        }
    }

    #[test]
    fn test_name_entry_buttons_fit_popup() {
        let popup = centered(AREA, NAME_POPUP);
        let row = buttons(AREA, Screen::NameEntry);
        let kinds: Vec<Button> = row.iter().map(|(b, _)| *b).collect();
        assert_eq!(kinds, vec![Button::Submit, Button::Back, Button::Ranking]);
        for (_, rect) in row {
            assert!(rect.x > popup.x && rect.x + rect.width < popup.x + popup.width);
        }
        assert_eq!(button_at(AREA, Screen::Ranking(Back::NameEntry), 0, 0), None);
    }

    #[test]
    fn test_sidebar_ranking_button_inside_stats_box() {
        let (_, sidebar) = game_layout(AREA);
        let stats = sidebar_sections(sidebar)[1];
        let (button, rect) = buttons(AREA, Screen::Playing)[0];
        assert_eq!(button, Button::Ranking);
        assert!(rect.y > stats.y && rect.y < stats.y + stats.height - 1);
    }
}
