//! Shape catalog: the seven tetrominoes and their rotation states.
//!
//! Each rotation state is a square grid drawn as string art (`#` = occupied). The
//! origin of a piece is the top-left corner of that grid, so offsets are always
//! non-negative and bounded by the grid size.

/// Tetromino kinds (I, O, T, S, Z, J, L).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

/// One orientation of a piece: `size` x `size` rows of `#`/`.`.
type Grid = &'static [&'static str];

const I_STATES: &[Grid] = &[
    &["....", "####", "....", "...."],
    &[".#..", ".#..", ".#..", ".#.."],
];

const O_STATES: &[Grid] = &[&["##", "##"]];

const T_STATES: &[Grid] = &[
    &[".#.", "###", "..."],
    &[".#.", ".##", ".#."],
    &["...", "###", ".#."],
    &[".#.", "##.", ".#."],
];

const S_STATES: &[Grid] = &[&[".##", "##.", "..."], &[".#.", ".##", "..#"]];

const Z_STATES: &[Grid] = &[&["##.", ".##", "..."], &["..#", ".##", ".#."]];

const J_STATES: &[Grid] = &[
    &["#..", "###", "..."],
    &[".##", ".#.", ".#."],
    &["...", "###", "..#"],
    &[".#.", ".#.", "##."],
];

const L_STATES: &[Grid] = &[
    &["..#", "###", "..."],
    &[".#.", ".#.", ".##"],
    &["...", "###", "#.."],
    &["##.", ".#.", ".#."],
];

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::S, Self::Z, Self::J, Self::L];

    fn states(self) -> &'static [Grid] {
        match self {
            Self::I => I_STATES,
            Self::O => O_STATES,
            Self::T => T_STATES,
            Self::S => S_STATES,
            Self::Z => Z_STATES,
            Self::J => J_STATES,
            Self::L => L_STATES,
        }
    }

    /// Number of distinct orientations; rotating past the last wraps to 0.
    pub fn rotation_count(self) -> usize {
        self.states().len()
    }

    /// Side length N of the bounding grid (2, 3 or 4).
    pub fn size(self) -> i32 {
        self.states()[0].len() as i32
    }

    /// Colour id stored in the playfield (1..=7).
    pub fn color_id(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn index(self) -> usize {
        match self {
            Self::I => 0,
            Self::O => 1,
            Self::T => 2,
            Self::S => 3,
            Self::Z => 4,
            Self::J => 5,
            Self::L => 6,
        }
    }

    pub fn from_color_id(id: u8) -> Option<Self> {
        id.checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize))
            .copied()
    }

    /// Occupied `(dx, dy)` offsets of the given rotation, row-major from the top-left.
    /// The rotation index is taken modulo `rotation_count()`.
    pub fn shape(self, rotation: usize) -> [(i32, i32); 4] {
        let states = self.states();
        let grid = states[rotation % states.len()];
        let mut out = [(0, 0); 4];
        let mut n = 0;
        for (dy, row) in grid.iter().enumerate() {
            for (dx, ch) in row.bytes().enumerate() {
                if ch == b'#' && n < out.len() {
                    out[n] = (dx as i32, dy as i32);
                    n += 1;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_state_is_square_with_four_cells() {
        for kind in PieceKind::ALL {
            let n = kind.size() as usize;
            for grid in kind.states() {
                assert_eq!(grid.len(), n, "{:?} height", kind);
                assert!(grid.iter().all(|row| row.len() == n), "{:?} width", kind);
                let filled: usize = grid.iter().map(|r| r.matches('#').count()).sum();
                assert_eq!(filled, 4, "{:?} cell count", kind);
            }
        }
    }

    #[test]
    fn test_rotation_counts() {
        let counts: Vec<usize> = PieceKind::ALL.iter().map(|k| k.rotation_count()).collect();
        assert_eq!(counts, vec![2, 1, 4, 2, 2, 4, 4]);
    }

    #[test]
    fn test_rotation_wraps() {
        for kind in PieceKind::ALL {
            let k = kind.rotation_count();
            assert_eq!(kind.shape(k), kind.shape(0));
            assert_eq!(kind.shape(k + 1), kind.shape(1 % k));
        }
    }

    #[test]
    fn test_t_spawn_cells() {
        assert_eq!(PieceKind::T.shape(0), [(1, 0), (0, 1), (1, 1), (2, 1)]);
        assert_eq!(PieceKind::I.shape(1), [(1, 0), (1, 1), (1, 2), (1, 3)]);
    }

    #[test]
    fn test_color_ids_round_trip() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_color_id(kind.color_id()), Some(kind));
        }
        assert_eq!(PieceKind::from_color_id(0), None);
        assert_eq!(PieceKind::from_color_id(8), None);
    }
}
