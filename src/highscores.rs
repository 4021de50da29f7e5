//! High-score table persistence.
//!
//! One JSON file per game variant. A missing file is an empty table; a
//! malformed one is an error the caller may choose to ignore.

use std::fs;
use std::path::{Path, PathBuf};

use bevy_ecs::resource::Resource;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PersistenceError;
use crate::game::GameVariant;

/// Entries kept in the table.
pub const TABLE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u32,
    /// Level the run ended on.
    pub level: u32,
}

/// The persisted high-score table, sorted best first.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighScores {
    entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// File the table for `variant` lives in, under `dir`.
    pub fn file_path(dir: &Path, variant: GameVariant) -> PathBuf {
        dir.join(format!("highscores-{}.json", variant.as_ref()))
    }

    /// Loads the table from `path`. A missing file yields an empty table.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no high-score file yet");
                return Ok(Self::default());
            }
            Err(err) => return Err(PersistenceError::Read(err)),
        };
        let mut scores: HighScores = serde_json::from_str(&raw)?;
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(TABLE_SIZE);
        Ok(scores)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(PersistenceError::Write)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).map_err(PersistenceError::Write)?;
        debug!(path = %path.display(), best = self.best(), "high scores written");
        Ok(())
    }

    pub fn best(&self) -> u32 {
        self.entries.first().map_or(0, |entry| entry.score)
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    /// Inserts `entry` in order if it makes the table; returns whether it did.
    pub fn submit(&mut self, entry: HighScoreEntry) -> bool {
        if entry.score == 0 {
            return false;
        }
        let position = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        if position >= TABLE_SIZE {
            return false;
        }
        self.entries.insert(position, entry);
        self.entries.truncate(TABLE_SIZE);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(score: u32) -> HighScoreEntry {
        HighScoreEntry { score, level: 1 }
    }

    #[test]
    fn test_submit_keeps_order_and_size() {
        let mut scores = HighScores::default();
        for s in [300, 100, 200, 500, 400, 700, 600, 900, 800, 1000, 1100, 50] {
            scores.submit(entry(s));
        }
        assert_eq!(scores.entries().len(), TABLE_SIZE);
        assert_eq!(scores.best(), 1100);
        assert!(scores.entries().windows(2).all(|w| w[0].score >= w[1].score));
        // 50 fell off the table.
        assert!(scores.entries().iter().all(|e| e.score >= 100));
    }

    #[test]
    fn test_zero_scores_are_rejected() {
        let mut scores = HighScores::default();
        assert!(!scores.submit(entry(0)));
        assert_eq!(scores.best(), 0);
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = HighScores::file_path(dir.path(), GameVariant::Classic);
        let mut scores = HighScores::default();
        scores.submit(HighScoreEntry {
            score: 12_340,
            level: 4,
        });
        scores.save(&path).unwrap();

        let loaded = HighScores::load(&path).unwrap();
        assert_eq!(loaded.entries(), scores.entries());
    }

    #[test]
    fn test_missing_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = HighScores::file_path(dir.path(), GameVariant::Deluxe);
        let scores = HighScores::load(&path).unwrap();
        assert!(scores.entries().is_empty());
    }
}
