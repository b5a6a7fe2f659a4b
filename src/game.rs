//! Game state: playfield, active piece, gravity, locking, line clears and scoring.

use crate::shapes::PieceKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Playfield width in cells.
pub const FIELD_WIDTH: usize = 10;
/// Playfield height in cells.
pub const FIELD_HEIGHT: usize = 20;

/// Points per clear event, indexed by rows cleared; multiplied by the level.
const LINE_SCORES: [u32; 5] = [0, 100, 300, 500, 800];
const MAX_LEVEL: u32 = 10;
const LINES_PER_LEVEL: u32 = 10;
const BASE_FALL_MS: u64 = 500;
const FALL_STEP_MS: u64 = 40;
const MIN_FALL_MS: u64 = 100;

/// Single cell: empty or a locked block coloured by its piece kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Block(PieceKind),
}

impl Cell {
    /// 0 for empty, otherwise the piece colour id (1..=7).
    pub fn color_id(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Block(kind) => kind.color_id(),
        }
    }

    pub fn is_filled(self) -> bool {
        matches!(self, Self::Block(_))
    }
}

/// Grid of locked cells. y=0 is the top row.
#[derive(Debug, Clone)]
pub struct Playfield {
    pub width: usize,
    pub height: usize,
    rows: VecDeque<Vec<Cell>>,
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new()
    }
}

impl Playfield {
    pub fn new() -> Self {
        let rows = (0..FIELD_HEIGHT)
            .map(|_| vec![Cell::Empty; FIELD_WIDTH])
            .collect();
        Self {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
            rows,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    #[cfg(test)]
    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        self.rows.get(y).map(Vec::as_slice)
    }

    /// True if any cell of the shape at `origin` leaves the side walls, sits at or
    /// below the floor, or lands on a locked block. Cells above row 0 only check
    /// the side walls.
    pub fn collides(&self, cells: &[(i32, i32)], origin: (i32, i32)) -> bool {
        let (ox, oy) = origin;
        cells.iter().any(|&(dx, dy)| {
            let x = ox + dx;
            let y = oy + dy;
            if x < 0 || x >= self.width as i32 || y >= self.height as i32 {
                return true;
            }
            y >= 0 && matches!(self.get(x as usize, y as usize), Some(Cell::Block(_)))
        })
    }

    /// Writes the piece colour into every in-field cell of the shape.
    pub fn lock(&mut self, cells: &[(i32, i32)], origin: (i32, i32), kind: PieceKind) {
        let (ox, oy) = origin;
        for &(dx, dy) in cells {
            let (x, y) = (ox + dx, oy + dy);
            if x >= 0 && y >= 0 {
                self.set(x as usize, y as usize, Cell::Block(kind));
            }
        }
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows
            .get(y)
            .is_some_and(|row| row.iter().all(|c| c.is_filled()))
    }

    /// Removes every full row in one top-to-bottom pass, shifting the rows above
    /// down and inserting an empty row at the top. Returns the number removed.
    pub fn clear_full_lines(&mut self) -> u32 {
        let mut cleared = 0;
        for y in 0..self.height {
            if self.is_row_full(y) {
                self.rows.remove(y);
                self.rows.push_front(vec![Cell::Empty; self.width]);
                cleared += 1;
            }
        }
        cleared
    }
}

/// Active piece: kind, rotation index and top-left origin of its bounding grid.
/// `y` may be negative while the piece enters from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub rotation: usize,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// Spawn position: rotation 0, horizontally centred, top row.
    pub fn spawn(kind: PieceKind, field_width: usize) -> Self {
        Self {
            kind,
            rotation: 0,
            x: field_width as i32 / 2 - kind.size() / 2,
            y: 0,
        }
    }

    pub fn shape(&self) -> [(i32, i32); 4] {
        self.kind.shape(self.rotation)
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Absolute field coordinates of the four cells.
    pub fn cells(&self) -> [(i32, i32); 4] {
        self.shape().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }
}

/// Keys that auto-repeat while held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Left,
    Right,
    Down,
}

impl Dir {
    fn delta(self) -> (i32, i32) {
        match self {
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
        }
    }
}

/// Last-fire timestamps for held keys; `None` = not held.
#[derive(Debug, Clone, Copy, Default)]
struct HeldKeys {
    left: Option<Instant>,
    right: Option<Instant>,
    down: Option<Instant>,
}

impl HeldKeys {
    fn slot(&mut self, dir: Dir) -> &mut Option<Instant> {
        match dir {
            Dir::Left => &mut self.left,
            Dir::Right => &mut self.right,
            Dir::Down => &mut self.down,
        }
    }
}

/// What happened when a piece locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEvent {
    pub lines: u32,
    pub points: u32,
}

/// Game session: playfield, current and next piece, counters and timers.
#[derive(Debug)]
pub struct GameState {
    pub playfield: Playfield,
    pub piece: Piece,
    pub next: PieceKind,
    pub score: u32,
    pub level: u32,
    pub lines_cleared: u32,
    pub fall_interval: Duration,
    pub game_over: bool,
    pub last_lock: Option<LockEvent>,
    last_fall: Instant,
    held: HeldKeys,
    repeat_interval: Duration,
    soft_drop_interval: Duration,
    rng: StdRng,
}

impl GameState {
    pub fn new(config: &crate::GameConfig, now: Instant) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let first = random_kind(&mut rng);
        let next = random_kind(&mut rng);
        let mut state = Self {
            playfield: Playfield::new(),
            piece: Piece {
                kind: first,
                rotation: 0,
                x: 0,
                y: 0,
            },
            next,
            score: 0,
            level: 1,
            lines_cleared: 0,
            fall_interval: fall_interval_for(1),
            game_over: false,
            last_lock: None,
            last_fall: now,
            held: HeldKeys::default(),
            repeat_interval: config.repeat_interval,
            soft_drop_interval: config.soft_drop_interval,
            rng,
        };
        state.spawn(first);
        state
    }

    /// Back to an empty field and fresh counters. The RNG keeps its stream.
    pub fn reset(&mut self, now: Instant) {
        let first = random_kind(&mut self.rng);
        self.next = random_kind(&mut self.rng);
        self.playfield = Playfield::new();
        self.score = 0;
        self.level = 1;
        self.lines_cleared = 0;
        self.fall_interval = fall_interval_for(1);
        self.game_over = false;
        self.last_lock = None;
        self.last_fall = now;
        self.held = HeldKeys::default();
        self.spawn(first);
    }

    /// Places `kind` at the spawn position. A collision there ends the game.
    pub fn spawn(&mut self, kind: PieceKind) {
        self.piece = Piece::spawn(kind, self.playfield.width);
        if self.playfield.collides(&self.piece.shape(), self.piece.origin()) {
            self.game_over = true;
        }
    }

    /// Advances the rotation; reverts when the new orientation collides.
    pub fn rotate(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        let old = self.piece.rotation;
        self.piece.rotation = (old + 1) % self.piece.kind.rotation_count();
        if self.playfield.collides(&self.piece.shape(), self.piece.origin()) {
            self.piece.rotation = old;
            return false;
        }
        true
    }

    /// Translates the piece. A blocked downward move locks it, clears lines and
    /// spawns the next piece; a blocked sideways move does nothing.
    pub fn move_by(&mut self, dx: i32, dy: i32) -> bool {
        if self.game_over {
            return false;
        }
        let (ox, oy) = self.piece.origin();
        self.piece.x += dx;
        self.piece.y += dy;
        if self.playfield.collides(&self.piece.shape(), self.piece.origin()) {
            self.piece.x = ox;
            self.piece.y = oy;
            if dy > 0 {
                self.lock_piece();
            }
            return false;
        }
        true
    }

    pub fn hard_drop(&mut self) {
        while self.move_by(0, 1) {}
    }

    fn lock_piece(&mut self) {
        let piece = self.piece;
        self.playfield.lock(&piece.shape(), piece.origin(), piece.kind);
        let lines = self.playfield.clear_full_lines();
        let points = self.apply_clear(lines);
        self.last_lock = Some(LockEvent { lines, points });
        let kind = self.next;
        self.next = random_kind(&mut self.rng);
        self.spawn(kind);
    }

    /// Prices the clear at the current level, then recomputes level and speed.
    fn apply_clear(&mut self, lines: u32) -> u32 {
        if lines == 0 {
            return 0;
        }
        let points = LINE_SCORES[(lines as usize).min(LINE_SCORES.len() - 1)] * self.level;
        self.score += points;
        self.lines_cleared += lines;
        self.level = level_for(self.lines_cleared);
        self.fall_interval = fall_interval_for(self.level);
        points
    }

    /// Key down: move once now, then repeat from `tick` while held.
    pub fn press(&mut self, dir: Dir, now: Instant) {
        let (dx, dy) = dir.delta();
        self.move_by(dx, dy);
        *self.held.slot(dir) = Some(now);
    }

    pub fn release(&mut self, dir: Dir) {
        *self.held.slot(dir) = None;
    }

    #[cfg(test)]
    pub fn is_held(&self, dir: Dir) -> bool {
        let mut held = self.held;
        held.slot(dir).is_some()
    }

    /// One session step: key repeat for held keys, then gravity.
    pub fn tick(&mut self, now: Instant) {
        if self.game_over {
            return;
        }
        for dir in [Dir::Left, Dir::Right, Dir::Down] {
            let interval = match dir {
                Dir::Down => self.soft_drop_interval,
                Dir::Left | Dir::Right => self.repeat_interval,
            };
            let Some(last) = *self.held.slot(dir) else {
                continue;
            };
            if now.saturating_duration_since(last) > interval {
                let (dx, dy) = dir.delta();
                self.move_by(dx, dy);
                *self.held.slot(dir) = Some(now);
            }
        }
        if now.saturating_duration_since(self.last_fall) >= self.fall_interval {
            self.move_by(0, 1);
            self.last_fall = now;
        }
    }
}

fn random_kind(rng: &mut StdRng) -> PieceKind {
    PieceKind::ALL[rng.gen_range(0..PieceKind::ALL.len())]
}

/// `min(10, 1 + lines / 10)`.
pub fn level_for(lines: u32) -> u32 {
    (1 + lines / LINES_PER_LEVEL).min(MAX_LEVEL)
}

/// `max(100, 500 - 40 * (level - 1))` milliseconds.
pub fn fall_interval_for(level: u32) -> Duration {
    let step = FALL_STEP_MS * u64::from(level.saturating_sub(1));
    Duration::from_millis(BASE_FALL_MS.saturating_sub(step).max(MIN_FALL_MS))
}
