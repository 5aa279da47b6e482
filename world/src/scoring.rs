//! Session high-score bookkeeping.

use serde::{Deserialize, Serialize};

/// Number of entries a table keeps.
pub const MAX_ENTRIES: usize = 20;

/// Single finished run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Name shown next to the score.
    pub name: String,
    /// Final score of the run.
    pub score: u32,
    /// Level the run ended on.
    pub level: u32,
}

/// Best runs in descending score order.
///
/// The table lives in memory; collaborators persist it through serde.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreTable {
    entries: Vec<HighScoreEntry>,
}

impl HighScoreTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries from best to worst.
    #[must_use]
    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    /// Reports whether `score` would earn a place in the table.
    #[must_use]
    pub fn qualifies(&self, score: u32) -> bool {
        self.position_for(score) < MAX_ENTRIES
    }

    /// Rank (1-based) a new run with `score` would take, if any.
    #[must_use]
    pub fn rank_of(&self, score: u32) -> Option<usize> {
        let position = self.position_for(score);
        (position < MAX_ENTRIES).then_some(position + 1)
    }

    /// Records a run and returns its 1-based rank.
    ///
    /// Runs tied with existing entries rank below them. Returns `None` when
    /// the table is full of better runs.
    pub fn insert(&mut self, entry: HighScoreEntry) -> Option<usize> {
        let position = self.position_for(entry.score);
        if position >= MAX_ENTRIES {
            return None;
        }
        self.entries.insert(position, entry);
        self.entries.truncate(MAX_ENTRIES);
        Some(position + 1)
    }

    fn position_for(&self, score: u32) -> usize {
        self.entries
            .iter()
            .position(|entry| entry.score < score)
            .unwrap_or(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str, score: u32) -> HighScoreEntry {
        HighScoreEntry {
            name: name.to_owned(),
            score,
            level: 1,
        }
    }

    #[test]
    fn keeps_descending_order() {
        let mut table = HighScoreTable::new();
        assert_eq!(table.insert(run("a", 300)), Some(1));
        assert_eq!(table.insert(run("b", 900)), Some(1));
        assert_eq!(table.insert(run("c", 500)), Some(2));
        let scores: Vec<u32> = table.entries().iter().map(|entry| entry.score).collect();
        assert_eq!(scores, vec![900, 500, 300]);
    }

    #[test]
    fn ties_rank_below_existing_runs() {
        let mut table = HighScoreTable::new();
        let _ = table.insert(run("first", 500));
        assert_eq!(table.insert(run("second", 500)), Some(2));
        assert_eq!(table.entries()[0].name, "first");
    }

    #[test]
    fn caps_at_twenty_entries() {
        let mut table = HighScoreTable::new();
        for score in 1..=25 {
            let _ = table.insert(run("p", score * 10));
        }
        assert_eq!(table.entries().len(), MAX_ENTRIES);
        assert_eq!(table.entries().last().map(|entry| entry.score), Some(60));
        assert!(!table.qualifies(60));
        assert_eq!(table.rank_of(55), None);
        assert_eq!(table.insert(run("late", 5)), None);
        assert_eq!(table.rank_of(1_000), Some(1));
    }

    #[test]
    fn survives_json_round_trip() {
        let mut table = HighScoreTable::new();
        let _ = table.insert(run("a", 10));
        let json = serde_json::to_string(&table).expect("serialize");
        let restored: HighScoreTable = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, table);
    }
}
