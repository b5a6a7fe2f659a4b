//! App: terminal init, main loop, event routing.

use crate::highscores::Ranking;
use crate::input::{Input, key_to_input};
use crate::screen::{Arcade, Flow};
use crate::theme::Theme;
use crate::ui::{self, Fade};
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, MouseButton, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

pub struct App {
    args: Args,
    theme: Theme,
    arcade: Arcade,
    fade: Fade,
    /// Terminal reports key releases; otherwise every press gets a synthetic
    /// release and the terminal's own auto-repeat drives held keys.
    key_releases: bool,
    /// Area of the last drawn frame, for mouse hit-testing.
    last_area: Rect,
}

impl App {
    pub fn new(args: Args, config: &GameConfig, theme: Theme, ranking: Ranking) -> Self {
        Self {
            args,
            theme,
            arcade: Arcade::new(config, ranking, Instant::now()),
            fade: Fade::default(),
            key_releases: false,
            last_area: Rect::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{
                DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
                PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
            },
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
                supports_keyboard_enhancement,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        // Release events need the kitty keyboard protocol.
        self.key_releases = supports_keyboard_enhancement().unwrap_or(false)
            && execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        if self.key_releases {
            let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        }
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_rate = if self.args.frame_rate > 0.0 {
            self.args.frame_rate
        } else {
            60.0
        };
        let frame_duration = Duration::from_secs_f64(1.0 / frame_rate);
        loop {
            let frame_start = Instant::now();
            let snapshot = self.arcade.snapshot();
            let theme = &self.theme;
            let fade = &mut self.fade;
            let animate = !self.args.no_animation;
            let mut area = self.last_area;
            terminal.draw(|f| {
                area = f.area();
                ui::draw(f, &snapshot, theme, fade, frame_start, animate);
            })?;
            self.last_area = area;

            let timeout = frame_duration.saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let event = event::read()?;
                    if self.dispatch(&event) == Flow::Quit {
                        return Ok(());
                    }
                }
            }

            self.arcade.tick(Instant::now());
        }
    }

    fn dispatch(&mut self, event: &Event) -> Flow {
        let now = Instant::now();
        let input = match event {
            Event::Key(key) => key_to_input(*key),
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                ui::button_at(
                    self.last_area,
                    self.arcade.screen(),
                    mouse.column,
                    mouse.row,
                )
                .map(Input::Click)
            }
            _ => None,
        };
        let Some(input) = input else {
            return Flow::Continue;
        };
        let flow = self.arcade.handle(input, now);
        if let (false, Input::Press(dir)) = (self.key_releases, input) {
            self.arcade.handle(Input::Release(dir), now);
        }
        flow
    }
}
