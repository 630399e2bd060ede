use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::events::{Event, LogEntry};
use crate::config::{self, schema::LoggingConfig};

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

/// Append-only JSONL event log (`~/.aura/events.jsonl` by default).
///
/// Logging is best-effort: write failures are swallowed so that a full disk
/// or read-only home never breaks a chat turn.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    /// Resolve the log from config. A disabled log records nothing.
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        let path = match &config.events_path {
            Some(raw) => Some(config::expand_home(raw)),
            None => default_events_path(),
        };
        Self { path }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record an event stamped with the current time.
    pub fn record(&self, event: Event) {
        self.append(&LogEntry::now(event));
    }

    /// Record a pre-built entry.
    pub fn append(&self, entry: &LogEntry) {
        if let Some(path) = &self.path {
            let _ = append_log_entry(path, entry);
        }
    }

    /// Read every entry. Malformed lines are skipped; a missing file reads
    /// as empty.
    pub fn read_all(&self) -> Vec<LogEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<LogEntry>(&line).ok())
            .collect()
    }

    /// Entries from the last `days` days; all entries when `days` is `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<LogEntry> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));

        entries
            .into_iter()
            .filter(|e| {
                DateTime::parse_from_rfc3339(&e.timestamp)
                    .is_ok_and(|ts| ts.with_timezone(&Utc) >= cutoff)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_log_entry(path: &Path, entry: &LogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Default events file: `~/.aura/events.jsonl`.
pub fn default_events_path() -> Option<PathBuf> {
    config::aura_dir().map(|dir| dir.join("events.jsonl"))
}
