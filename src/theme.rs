//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::shapes::PieceKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// One Dark palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Piece colours in `PieceKind::index()` order: I, O, T, S, Z, J, L.
    pub pieces: [Color; 7],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, level).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Hints and empty ranking rows.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// Hardcoded One Dark defaults.
    pub fn onedark_default() -> Self {
        Self {
            pieces: [
                parse_hex("#56B6C2").unwrap(), // I cyan
                parse_hex("#E5C07B").unwrap(), // O yellow
                parse_hex("#C678DD").unwrap(), // T magenta
                parse_hex("#98C379").unwrap(), // S green
                parse_hex("#E06C75").unwrap(), // Z red
                parse_hex("#61AFEF").unwrap(), // J blue
                parse_hex("#D19A66").unwrap(), // L orange
            ],
            bg: parse_hex("#31353F").unwrap(),
            div_line: parse_hex("#3F444F").unwrap(),
            main_fg: parse_hex("#ABB2BF").unwrap(),
            title: parse_hex("#E5C07B").unwrap(),
            inactive_fg: parse_hex("#5C6370").unwrap(),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override piece colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        let hex: [&str; 7] = match palette {
            crate::Palette::Normal => return,
            crate::Palette::HighContrast => [
                "#00FFFF", "#FFFF00", "#FF00FF", "#00FF00", "#FF0000", "#0088FF", "#FF8800",
            ],
            // Paul Tol's bright scheme plus grey; avoids red/green pairs.
            crate::Palette::Colorblind => [
                "#66CCEE", "#CCBB44", "#AA3377", "#228833", "#EE6677", "#4477AA", "#BBBBBB",
            ],
        };
        for (slot, h) in self.pieces.iter_mut().zip(hex) {
            if let Ok(c) = parse_hex(h) {
                *slot = c;
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let fallback = Self::onedark_default();
        let [i, o, t, s, z, j, l] = fallback.pieces;
        Self {
            pieces: [
                get("hi_fg").or_else(|| get("proc_misc")).unwrap_or(i),
                get("title").or_else(|| get("cpu_mid")).unwrap_or(o),
                get("net_box").unwrap_or(t),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(s),
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(z),
                get("cpu_box").unwrap_or(j),
                get("used_end").or_else(|| get("download_mid")).unwrap_or(l),
            ],
            bg: get("meter_bg").unwrap_or(fallback.bg),
            div_line: get("div_line").unwrap_or(fallback.div_line),
            main_fg: get("main_fg").unwrap_or(fallback.main_fg),
            title: get("title").unwrap_or(fallback.title),
            inactive_fg: get("inactive_fg").unwrap_or(fallback.inactive_fg),
        }
    }

    #[inline]
    pub fn piece_color(&self, kind: PieceKind) -> Color {
        self.pieces[kind.index()]
    }

    /// Colour for a playfield colour id (1..=7); `bg` for empty.
    pub fn cell_color(&self, color_id: u8) -> Color {
        PieceKind::from_color_id(color_id)
            .map(|k| self.piece_color(k))
            .unwrap_or(self.bg)
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>, scale: u8| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map(|v| v * scale)
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2, 1)?, channel(2..4, 1)?, channel(4..6, 1)?),
        3 => (channel(0..1, 17)?, channel(1..2, 17)?, channel(2..3, 17)?),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}
