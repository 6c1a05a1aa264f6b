//! Translation and execution history.
//!
//! Every run appends one entry to `history.json` in the config directory so
//! earlier commands can be listed and replayed. Only the newest
//! [`MAX_ENTRIES`] are kept.

use crate::providers::{SystemTimeProvider, TimeProvider};
use anyhow::Result;
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const HISTORY_FILE: &str = "history.json";
pub const MAX_ENTRIES: usize = 1000;

/// One translated command and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    pub query: String,
    pub command: String,
    pub executed: bool,
    /// Exit code when executed; `None` for printed-only entries.
    pub exit_code: Option<i32>,
}

impl HistoryEntry {
    pub fn status_label(&self) -> String {
        match (self.executed, self.exit_code) {
            (false, _) => "(not executed)".to_string(),
            (true, Some(0)) => "✓".to_string(),
            (true, Some(code)) => format!("✗ (exit {})", code),
            (true, None) => "✗".to_string(),
        }
    }

    pub fn formatted_time(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

/// Local `YYYY-MM-DD HH:MM:SS` for a Unix timestamp.
pub fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

pub struct History {
    path: PathBuf,
    time_provider: Box<dyn TimeProvider>,
}

impl History {
    pub fn new(dir: &Path) -> Self {
        Self::with_time_provider(dir, Box::new(SystemTimeProvider))
    }

    /// Creates a history store with a custom time provider (for testing).
    pub fn with_time_provider(dir: &Path, time_provider: Box<dyn TimeProvider>) -> Self {
        Self {
            path: dir.join(HISTORY_FILE),
            time_provider,
        }
    }

    /// All entries, oldest first. A missing or corrupt file reads as empty.
    fn load(&self) -> Vec<HistoryEntry> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring corrupt history file {}: {}", self.path.display(), e);
            Vec::new()
        })
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn record(
        &self,
        query: &str,
        command: &str,
        executed: bool,
        exit_code: Option<i32>,
    ) -> Result<()> {
        let mut entries = self.load();
        entries.push(HistoryEntry {
            timestamp: self.time_provider.now(),
            query: query.to_string(),
            command: command.to_string(),
            executed,
            exit_code,
        });

        if entries.len() > MAX_ENTRIES {
            let excess = entries.len() - MAX_ENTRIES;
            entries.drain(..excess);
        }

        self.save(&entries)?;
        debug!("Recorded history entry for '{}'", query);
        Ok(())
    }

    /// Newest first, at most `limit` entries when given.
    pub fn entries(&self, limit: Option<usize>) -> Vec<HistoryEntry> {
        let mut entries = self.load();
        entries.reverse();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }

    /// Entry by position, 0 being the most recent.
    pub fn entry(&self, index: usize) -> Option<HistoryEntry> {
        self.entries(None).into_iter().nth(index)
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        info!("History cleared");
        Ok(())
    }

    /// Writes the listing shown by `xaw history`.
    pub fn write_listing<W: Write>(&self, limit: Option<usize>, output: &mut W) -> Result<()> {
        let entries = self.entries(limit);
        if entries.is_empty() {
            writeln!(output, "No command history found.")?;
            return Ok(());
        }

        for (index, entry) in entries.iter().enumerate() {
            writeln!(output)?;
            writeln!(output, "[{}] {} {}", index, entry.formatted_time(), entry.status_label())?;
            writeln!(output, "  Query: {}", entry.query)?;
            writeln!(output, "  Command: {}", entry.command)?;
        }
        Ok(())
    }
}
