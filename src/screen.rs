//! Screen state machine: routes inputs by screen and owns the session, the
//! ranking and the name being typed.

use crate::game::{Dir, GameState, LockEvent, Piece, Playfield};
use crate::highscores::{MAX_NAME_LEN, Ranking, Record};
use crate::input::{Button, Input};
use crate::shapes::PieceKind;
use std::path::Path;
use std::time::{Duration, Instant};

/// Where the ranking screen goes when dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Back {
    Playing,
    Paused,
    GameOver,
    /// Name entry, keeping the typed name.
    NameEntry,
    /// Score was just submitted: start a fresh game.
    NewGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Paused,
    GameOver,
    NameEntry,
    Ranking(Back),
}

impl Screen {
    /// Gravity and key repeat only run while playing.
    pub fn ticks(self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Result of routing one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Read-only view handed to the renderer each frame.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub screen: Screen,
    pub playfield: &'a Playfield,
    /// `None` once the game is over.
    pub piece: Option<Piece>,
    pub next: PieceKind,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub fall_interval: Duration,
    pub last_lock: Option<LockEvent>,
    pub ranking: &'a [Record],
    pub ranking_path: Option<&'a Path>,
    pub qualifies: bool,
    pub name: &'a str,
    pub name_started: Instant,
    pub save_error: Option<&'a str>,
}

impl Snapshot<'_> {
    pub fn paused(&self) -> bool {
        matches!(self.screen, Screen::Paused)
    }
}

pub struct Arcade {
    screen: Screen,
    game: GameState,
    ranking: Ranking,
    name: String,
    name_started: Instant,
    save_error: Option<String>,
}

impl Arcade {
    pub fn new(config: &crate::GameConfig, ranking: Ranking, now: Instant) -> Self {
        Self {
            screen: Screen::Playing,
            game: GameState::new(config, now),
            ranking,
            name: String::new(),
            name_started: now,
            save_error: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[cfg(test)]
    pub fn game(&self) -> &GameState {
        &self.game
    }

    #[cfg(test)]
    pub fn game_mut(&mut self) -> &mut GameState {
        &mut self.game
    }

    #[cfg(test)]
    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let game = &self.game;
        Snapshot {
            screen: self.screen,
            playfield: &game.playfield,
            piece: (!game.game_over).then_some(game.piece),
            next: game.next,
            score: game.score,
            level: game.level,
            lines: game.lines_cleared,
            fall_interval: game.fall_interval,
            last_lock: game.last_lock,
            ranking: self.ranking.records(),
            ranking_path: self.ranking.path(),
            qualifies: self.ranking.qualifies(game.score),
            name: &self.name,
            name_started: self.name_started,
            save_error: self.save_error.as_deref(),
        }
    }

    /// Per-frame step. Suspended on every screen but `Playing`.
    pub fn tick(&mut self, now: Instant) {
        if self.screen.ticks() {
            self.game.tick(now);
            self.check_game_over();
        }
    }

    pub fn handle(&mut self, input: Input, now: Instant) -> Flow {
        match input {
            Input::Interrupt => return Flow::Quit,
            // Releases are honoured everywhere so a key let go on another screen
            // does not keep repeating.
            Input::Release(dir) => {
                self.game.release(dir);
                return Flow::Continue;
            }
            _ => {}
        }
        let flow = match self.screen {
            Screen::Playing => self.on_playing(input, now),
            Screen::Paused => self.on_paused(input),
            Screen::GameOver => self.on_game_over(input, now),
            Screen::NameEntry => self.on_name_entry(input),
            Screen::Ranking(back) => self.on_ranking(input, back, now),
        };
        self.check_game_over();
        flow
    }

    fn on_playing(&mut self, input: Input, now: Instant) -> Flow {
        match input {
            Input::Press(dir) => self.game.press(dir, now),
            Input::Rotate => {
                self.game.rotate();
            }
            Input::Text(' ') => self.game.hard_drop(),
            Input::Text('p' | 'P') => self.screen = Screen::Paused,
            Input::Text('r' | 'R') | Input::Click(Button::Ranking) => {
                self.screen = Screen::Ranking(Back::Playing);
            }
            Input::Escape => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    fn on_paused(&mut self, input: Input) -> Flow {
        match input {
            Input::Text('p' | 'P') => self.screen = Screen::Playing,
            Input::Text('r' | 'R') | Input::Click(Button::Ranking) => {
                self.screen = Screen::Ranking(Back::Paused);
            }
            Input::Escape => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    fn on_game_over(&mut self, input: Input, now: Instant) -> Flow {
        match input {
            Input::Text('r' | 'R') | Input::Click(Button::Retry) => self.new_game(now),
            Input::Enter | Input::Click(Button::EnterName) => {
                self.name.clear();
                self.name_started = now;
                self.screen = Screen::NameEntry;
            }
            Input::Click(Button::Ranking) => self.screen = Screen::Ranking(Back::GameOver),
            Input::Escape => return Flow::Quit,
            _ => {}
        }
        Flow::Continue
    }

    fn on_name_entry(&mut self, input: Input) -> Flow {
        match input {
            Input::Text(c) if !c.is_control() => {
                if self.name.chars().count() < MAX_NAME_LEN {
                    self.name.push(c);
                }
            }
            Input::Backspace => {
                self.name.pop();
            }
            Input::Enter | Input::Click(Button::Submit) => self.submit(),
            Input::Click(Button::Ranking) => self.screen = Screen::Ranking(Back::NameEntry),
            Input::Escape | Input::Click(Button::Back) => self.screen = Screen::GameOver,
            _ => {}
        }
        Flow::Continue
    }

    fn on_ranking(&mut self, input: Input, back: Back, now: Instant) -> Flow {
        match input {
            Input::Escape | Input::Enter | Input::Text('r' | 'R') | Input::Click(Button::Back) => {
                match back {
                    Back::Playing => self.screen = Screen::Playing,
                    Back::Paused => self.screen = Screen::Paused,
                    Back::GameOver => self.screen = Screen::GameOver,
                    Back::NameEntry => self.screen = Screen::NameEntry,
                    Back::NewGame => self.new_game(now),
                }
            }
            _ => {}
        }
        Flow::Continue
    }

    /// Saves the current score under the typed name. Blank names are ignored.
    fn submit(&mut self) {
        let name = self.name.trim();
        if name.is_empty() {
            return;
        }
        let game = &self.game;
        let record = Record::new(name, game.score, game.lines_cleared, game.level);
        self.save_error = self.ranking.add(record).err().map(|e| e.to_string());
        self.name.clear();
        self.screen = Screen::Ranking(Back::NewGame);
    }

    fn new_game(&mut self, now: Instant) {
        self.game.reset(now);
        self.save_error = None;
        self.screen = Screen::Playing;
    }

    fn check_game_over(&mut self) {
        if self.screen == Screen::Playing && self.game.game_over {
            for dir in [Dir::Left, Dir::Right, Dir::Down] {
                self.game.release(dir);
            }
            self.screen = Screen::GameOver;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use crate::game::Cell;

    fn arcade() -> (Arcade, Instant) {
        let now = Instant::now();
        let config = GameConfig {
            seed: Some(11),
            ..GameConfig::default()
        };
        (Arcade::new(&config, Ranking::in_memory(), now), now)
    }

    fn block_out(arcade: &mut Arcade, now: Instant) {
        let game = arcade.game_mut();
        for y in 0..4 {
            for x in 0..game.playfield.width - 1 {
                game.playfield.set(x, y, Cell::Block(PieceKind::Z));
            }
        }
        game.game_over = true;
        arcade.tick(now);
    }

    fn type_name(arcade: &mut Arcade, name: &str, now: Instant) {
        for c in name.chars() {
            arcade.handle(Input::Text(c), now);
        }
    }

    #[test]
    fn test_pause_toggle_suspends_gravity() {
        let (mut a, t0) = arcade();
        a.handle(Input::Text('p'), t0);
        assert_eq!(a.screen(), Screen::Paused);
        assert!(a.snapshot().paused());
        let y = a.game().piece.y;
        a.tick(t0 + Duration::from_secs(3));
        a.handle(Input::Press(Dir::Down), t0);
        a.handle(Input::Text(' '), t0);
        assert_eq!(a.game().piece.y, y);
        a.handle(Input::Text('P'), t0);
        assert_eq!(a.screen(), Screen::Playing);
    }

    #[test]
    fn test_block_out_goes_to_game_over() {
        let (mut a, t0) = arcade();
        block_out(&mut a, t0);
        assert_eq!(a.screen(), Screen::GameOver);
        assert!(a.snapshot().piece.is_none());
    }

    #[test]
    fn test_hard_drop_into_block_out() {
        let (mut a, t0) = arcade();
        {
            let game = a.game_mut();
            for y in 2..game.playfield.height {
                for x in 0..game.playfield.width - 1 {
                    game.playfield.set(x, y, Cell::Block(PieceKind::S));
                }
                game.playfield.set(0, y, Cell::Empty);
            }
        }
        // Every lock lands on row 0/1 until a spawn is blocked.
        for _ in 0..20 {
            if a.screen() == Screen::GameOver {
                break;
            }
            a.handle(Input::Text(' '), t0);
        }
        assert_eq!(a.screen(), Screen::GameOver);
    }

    #[test]
    fn test_retry_resets_but_keeps_ranking() {
        let (mut a, t0) = arcade();
        a.ranking.add(Record::new("kept", 900, 9, 1)).unwrap();
        a.game_mut().score = 400;
        block_out(&mut a, t0);
        a.handle(Input::Text('r'), t0);
        assert_eq!(a.screen(), Screen::Playing);
        assert_eq!(a.game().score, 0);
        assert!(!a.game().game_over);
        assert_eq!(a.ranking().records().len(), 1);
        assert_eq!(a.ranking().records()[0].name, "kept");
    }

    #[test]
    fn test_name_entry_submit_adds_record() {
        let (mut a, t0) = arcade();
        a.game_mut().score = 1500;
        a.game_mut().lines_cleared = 12;
        a.game_mut().level = 2;
        block_out(&mut a, t0);
        a.handle(Input::Enter, t0);
        assert_eq!(a.screen(), Screen::NameEntry);
        type_name(&mut a, "ann", t0);
        a.handle(Input::Backspace, t0);
        type_name(&mut a, "a", t0);
        assert_eq!(a.snapshot().name, "ana");
        a.handle(Input::Enter, t0);
        assert_eq!(a.screen(), Screen::Ranking(Back::NewGame));
        let records = a.ranking().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "ana");
        assert_eq!((records[0].score, records[0].lines, records[0].level), (1500, 12, 2));

        a.handle(Input::Click(Button::Back), t0);
        assert_eq!(a.screen(), Screen::Playing);
        assert_eq!(a.game().score, 0);
        assert_eq!(a.ranking().records().len(), 1);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let (mut a, t0) = arcade();
        block_out(&mut a, t0);
        a.handle(Input::Click(Button::EnterName), t0);
        a.handle(Input::Enter, t0);
        assert_eq!(a.screen(), Screen::NameEntry);
        type_name(&mut a, "   ", t0);
        a.handle(Input::Click(Button::Submit), t0);
        assert_eq!(a.screen(), Screen::NameEntry);
        assert!(a.ranking().records().is_empty());
    }

    #[test]
    fn test_name_entry_keys_are_text_and_capped() {
        let (mut a, t0) = arcade();
        block_out(&mut a, t0);
        a.handle(Input::Enter, t0);
        type_name(&mut a, "pr p", t0);
        assert_eq!(a.screen(), Screen::NameEntry);
        type_name(&mut a, &"x".repeat(40), t0);
        assert_eq!(a.snapshot().name.chars().count(), MAX_NAME_LEN);
        assert!(a.snapshot().name.starts_with("pr p"));
    }

    #[test]
    fn test_cancel_name_entry_returns_to_game_over() {
        let (mut a, t0) = arcade();
        block_out(&mut a, t0);
        a.handle(Input::Enter, t0);
        type_name(&mut a, "bob", t0);
        a.handle(Input::Escape, t0);
        assert_eq!(a.screen(), Screen::GameOver);
        assert!(a.ranking().records().is_empty());
    }

    #[test]
    fn test_ranking_returns_to_previous_screen() {
        let (mut a, t0) = arcade();
        a.handle(Input::Click(Button::Ranking), t0);
        assert_eq!(a.screen(), Screen::Ranking(Back::Playing));
        let y = a.game().piece.y;
        a.tick(t0 + Duration::from_secs(2));
        assert_eq!(a.game().piece.y, y);
        a.handle(Input::Escape, t0);
        assert_eq!(a.screen(), Screen::Playing);

        a.handle(Input::Text('p'), t0);
        a.handle(Input::Text('r'), t0);
        assert_eq!(a.screen(), Screen::Ranking(Back::Paused));
        a.handle(Input::Enter, t0);
        assert_eq!(a.screen(), Screen::Paused);

        a.handle(Input::Text('p'), t0);
        block_out(&mut a, t0);
        a.handle(Input::Click(Button::Ranking), t0);
        assert_eq!(a.screen(), Screen::Ranking(Back::GameOver));
        a.handle(Input::Text('r'), t0);
        assert_eq!(a.screen(), Screen::GameOver);
    }

    #[test]
    fn test_ranking_from_name_entry_keeps_name() {
        let (mut a, t0) = arcade();
        block_out(&mut a, t0);
        a.handle(Input::Enter, t0);
        type_name(&mut a, "rex", t0);
        assert_eq!(a.screen(), Screen::NameEntry);
        a.handle(Input::Click(Button::Ranking), t0);
        assert_eq!(a.screen(), Screen::Ranking(Back::NameEntry));
        a.handle(Input::Text('r'), t0);
        assert_eq!(a.screen(), Screen::NameEntry);
        assert_eq!(a.snapshot().name, "rex");
        a.handle(Input::Enter, t0);
        assert_eq!(a.ranking().records()[0].name, "rex");
    }

    #[test]
    fn test_name_entry_suspends_gravity() {
        let (mut a, t0) = arcade();
        let before = a.game().piece;
        a.screen = Screen::NameEntry;
        a.tick(t0 + Duration::from_secs(5));
        assert_eq!(a.screen(), Screen::NameEntry);
        assert_eq!(a.game().piece, before);
    }

    #[test]
    fn test_failed_save_keeps_record_and_reports_error() {
        // A directory cannot be written as a file.
        let dir = std::env::temp_dir().join(format!("blockfall-save-err-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let now = Instant::now();
        let config = GameConfig {
            seed: Some(5),
            ..GameConfig::default()
        };
        let mut a = Arcade::new(&config, Ranking::load(dir.clone()), now);
        a.game_mut().score = 700;
        block_out(&mut a, now);
        a.handle(Input::Enter, now);
        type_name(&mut a, "eve", now);
        a.handle(Input::Enter, now);

        assert_eq!(a.screen(), Screen::Ranking(Back::NewGame));
        assert!(a.snapshot().save_error.is_some());
        assert_eq!(a.ranking().records().len(), 1);
        assert_eq!(a.ranking().records()[0].score, 700);

        a.handle(Input::Escape, now);
        assert_eq!(a.screen(), Screen::Playing);
        assert!(a.snapshot().save_error.is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_escape_quits_from_play() {
        let (mut a, t0) = arcade();
        assert_eq!(a.handle(Input::Escape, t0), Flow::Quit);
        let (mut a, t0) = arcade();
        assert_eq!(a.handle(Input::Interrupt, t0), Flow::Quit);
    }

    #[test]
    fn test_release_forwarded_while_paused() {
        let (mut a, t0) = arcade();
        a.handle(Input::Press(Dir::Left), t0);
        assert!(a.game().is_held(Dir::Left));
        a.handle(Input::Text('p'), t0);
        a.handle(Input::Release(Dir::Left), t0);
        assert!(!a.game().is_held(Dir::Left));
    }
}
