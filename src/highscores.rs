//! Top-10 ranking persisted as JSON (XDG config or ~/.config/blockfall).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FILENAME: &str = "ranking.json";

/// Records kept after every insertion.
pub const MAX_RECORDS: usize = 10;
/// Longest accepted player name, in characters.
pub const MAX_NAME_LEN: usize = 20;

/// Returns the default ranking file path (config dir / blockfall / ranking.json).
pub fn default_path() -> Result<PathBuf> {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if xdg.is_empty() {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".config")
        } else {
            PathBuf::from(xdg)
        }
    } else {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    Ok(base.join("blockfall").join(FILENAME))
}

/// One ranking entry. Field names are the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    /// Local date, `YYYY/MM/DD`.
    pub date: String,
}

impl Record {
    pub fn new(name: &str, score: u32, lines: u32, level: u32) -> Self {
        Self {
            name: name.chars().take(MAX_NAME_LEN).collect(),
            score,
            lines,
            level,
            date: chrono::Local::now().format("%Y/%m/%d").to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ordered list of the best scores plus where it lives on disk.
#[derive(Debug, Clone)]
pub struct Ranking {
    records: Vec<Record>,
    path: Option<PathBuf>,
}

impl Ranking {
    /// Ranking that is never written to disk.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            records: Vec::new(),
            path: None,
        }
    }

    /// Load from `path`. A missing or unreadable file gives an empty ranking.
    pub fn load(path: PathBuf) -> Self {
        let mut records = read_records(&path).unwrap_or_default();
        normalize(&mut records);
        Self {
            records,
            path: Some(path),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert, keep the best ten (equal scores stay in arrival order), then write.
    /// The in-memory list is updated even if writing fails.
    pub fn add(&mut self, record: Record) -> Result<(), RankingError> {
        self.records.push(record);
        normalize(&mut self.records);
        self.persist()
    }

    /// Would `score` make it into the list right now?
    pub fn qualifies(&self, score: u32) -> bool {
        self.records.len() < MAX_RECORDS || self.records.iter().any(|r| score > r.score)
    }

    /// Write the full list. Creates the parent directory if needed.
    pub fn persist(&self) -> Result<(), RankingError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn read_records(path: &Path) -> Result<Vec<Record>, RankingError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn normalize(records: &mut Vec<Record>) {
    // sort_by is stable: ties keep insertion order.
    records.sort_by(|a, b| b.score.cmp(&a.score));
    records.truncate(MAX_RECORDS);
}
