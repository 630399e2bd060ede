//! Event records written to the structured log.
//!
//! One JSON object per line. Every record carries an RFC 3339 `timestamp`
//! and an `event` tag; the remaining fields depend on the event kind:
//!
//! ```json
//! {"timestamp":"2025-11-15T02:10:00Z","event":"turn","intent":"SCHEDULE_TASK","tasks":["washer"],...}
//! {"timestamp":"2025-11-15T02:11:00Z","event":"history_cleared"}
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::nlp::{Deadline, Intent, Priority, ProcessedMessage};
use crate::optimizer::{ScheduleOutcome, ScheduleSource};

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    #[serde(flatten)]
    pub event: Event,
}

impl LogEntry {
    /// Stamp an event with the current time.
    pub fn now(event: Event) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A user message was processed.
    Turn(TurnEvent),
    /// The persisted history was unreadable and was discarded.
    HistoryLoadFailed { error: String },
    /// Writing the history file failed; the turn still completed.
    HistorySaveFailed { error: String },
    HistoryCleared,
    /// A voice capture was attempted and failed.
    SpeechFailed { error: String },
}

/// Summary of a processed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnEvent {
    pub intent: Intent,
    #[serde(default)]
    pub tasks: Vec<String>,
    pub deadline: Deadline,
    pub priority: Priority,
    /// Where the schedule came from; absent when none was planned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ScheduleSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Whether the turn came from a quick-reply click.
    #[serde(default)]
    pub quick_reply: bool,
}

impl TurnEvent {
    pub fn new(
        processed: &ProcessedMessage,
        outcome: Option<&ScheduleOutcome>,
        quick_reply: bool,
    ) -> Self {
        Self {
            intent: processed.intent,
            tasks: processed.entities.task_ids(),
            deadline: processed.entities.deadline,
            priority: processed.entities.priority,
            source: outcome.map(|o| o.source.clone()),
            latency_ms: outcome.and_then(|o| o.latency_ms),
            quick_reply,
        }
    }
}
