//! Blockfall — classic falling-block puzzle game in the terminal.

mod app;
mod game;
mod highscores;
mod input;
mod screen;
mod shapes;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Options derived from CLI that affect game behaviour (key repeat, RNG seed).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub repeat_interval: Duration,
    pub soft_drop_interval: Duration,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            repeat_interval: Duration::from_millis(70),
            soft_drop_interval: Duration::from_millis(50),
            seed: None,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        repeat_interval: Duration::from_millis(args.repeat_ms),
        soft_drop_interval: Duration::from_millis(args.soft_drop_ms),
        seed: args.seed,
    };
    let ranking_path = match args.ranking.clone() {
        Some(path) => path,
        None => highscores::default_path()?,
    };
    let ranking = highscores::Ranking::load(ranking_path);
    let mut app = App::new(args, &config, theme, ranking);
    app.run()?;
    Ok(())
}

/// Falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Falling-block puzzle in the terminal. Clear full rows to score; the top 10 scores are kept.",
    long_about = "Blockfall is a terminal puzzle game in the classic falling-block style.\n\n\
        Steer falling pieces, complete horizontal rows to clear them, and climb the levels \
        as gravity speeds up. After a game over, enter your name to save your score to the \
        top-10 ranking.\n\n\
        CONTROLS:\n  Left/Right  Move    Up         Rotate     Down       Soft drop\n  Space       Hard drop   P          Pause      R          Ranking (retry after game over)\n  Enter       Enter name / submit   Esc  Back / quit\n\n\
        Buttons on screen can be clicked with the mouse."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Ranking file (JSON). Defaults to the config directory.
    #[arg(short, long, value_name = "FILE")]
    pub ranking: Option<std::path::PathBuf>,

    /// Target frames per second of the control loop.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Repeat interval in ms for held Left/Right.
    #[arg(long, default_value = "70", value_name = "MS")]
    pub repeat_ms: u64,

    /// Repeat interval in ms for held Down.
    #[arg(long, default_value = "50", value_name = "MS")]
    pub soft_drop_ms: u64,

    /// Seed for the piece generator (same seed, same piece sequence).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Disable the game-over fade.
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
