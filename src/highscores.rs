//! Local leaderboard
//!
//! Top 20 runs plus lifetime totals. Persisted through the
//! `PersistenceBridge` as three keys (entries, total, best).

use serde::{Deserialize, Serialize};

/// Maximum number of runs to keep
pub const MAX_ENTRIES: usize = 20;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Unique-ish id, `<timestamp>-<hex>`
    #[serde(default)]
    pub id: String,
    pub score: u64,
    /// Unix timestamp (ms) when achieved
    #[serde(rename = "ts")]
    pub timestamp: f64,
}

/// Run leaderboard with lifetime stats
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Leaderboard {
    /// Sorted descending by score
    pub entries: Vec<LeaderboardEntry>,
    /// Sum of every recorded run's score
    pub total_score: u64,
    /// Highest single run ever recorded
    pub best_run: u64,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored parts, re-sorting and trimming untrusted entries
    pub fn from_parts(mut entries: Vec<LeaderboardEntry>, total_score: u64, best_run: u64) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_ENTRIES);
        Self {
            entries,
            total_score,
            best_run,
        }
    }

    /// Check if a score would make the board
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        // Newer runs win ties
        self.entries.last().map(|e| score >= e.score).unwrap_or(true)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score >= e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Record a finished run: lifetime stats always, board entry if it qualifies.
    /// Returns the rank achieved (1-indexed).
    pub fn record_run(&mut self, score: u64, timestamp: f64) -> Option<usize> {
        self.total_score = self.total_score.saturating_add(score);
        self.best_run = self.best_run.max(score);

        let rank = self.potential_rank(score)?;
        let entry = LeaderboardEntry {
            id: format!("{:.0}-{:x}", timestamp, self.total_score),
            score,
            timestamp,
        };
        self.entries.insert(rank - 1, entry);
        self.entries.truncate(MAX_ENTRIES);

        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Top score on the board (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

/// Relative age of a timestamp for display
pub fn format_age(now_ms: f64, timestamp_ms: f64) -> String {
    let mins = ((now_ms - timestamp_ms) / 60_000.0).max(0.0);
    let hours = mins / 60.0;
    let days = hours / 24.0;

    if days >= 1.0 {
        match days.floor() as u32 {
            1 => "Yesterday".to_string(),
            d => format!("{} days ago", d),
        }
    } else if hours >= 1.0 {
        match hours.floor() as u32 {
            1 => "1 hour ago".to_string(),
            h => format!("{} hours ago", h),
        }
    } else if mins >= 1.0 {
        match mins.floor() as u32 {
            1 => "1 min ago".to_string(),
            m => format!("{} mins ago", m),
        }
    } else {
        "Just now".to_string()
    }
}
