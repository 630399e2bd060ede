//! Analytics reporter: aggregates the event log for `aura stats`.

use std::collections::HashMap;

use serde::Serialize;

use super::events::{Event, LogEntry};
use crate::nlp::Intent;
use crate::optimizer::ScheduleSource;

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// Summary statistics for `aura stats`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub total_turns: usize,
    pub quick_reply_turns: usize,
    /// Turn count per intent, in [`Intent::ALL`] order.
    pub intent_distribution: Vec<IntentStat>,
    /// Appliances requested, most frequent first.
    pub appliance_counts: Vec<ApplianceStat>,
    pub source_distribution: SourceDistribution,
    /// Mean optimizer round-trip over turns that called it.
    pub avg_latency_ms: Option<f64>,
    pub history_load_failures: usize,
    pub history_save_failures: usize,
    pub history_clears: usize,
    pub speech_failures: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntentStat {
    pub intent: Intent,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplianceStat {
    pub appliance: String,
    pub count: usize,
}

/// How scheduled turns were backed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceDistribution {
    pub optimizer: usize,
    pub simulated: usize,
}

impl SourceDistribution {
    pub fn total(&self) -> usize {
        self.optimizer + self.simulated
    }

    /// Share of schedules that were simulated, 0.0 when none were planned.
    pub fn simulated_pct(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.simulated as f64 / total as f64) * 100.0
        }
    }
}

impl IntentStat {
    pub fn pct(&self, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (self.count as f64 / total as f64) * 100.0
        }
    }
}

// ---------------------------------------------------------------------------
// Stats computation
// ---------------------------------------------------------------------------

pub fn build_stats(entries: &[LogEntry]) -> Stats {
    let mut stats = Stats::default();
    let mut intents: HashMap<Intent, usize> = HashMap::new();
    let mut appliances: HashMap<&str, usize> = HashMap::new();
    let mut latencies: Vec<u64> = Vec::new();

    for entry in entries {
        match &entry.event {
            Event::Turn(turn) => {
                stats.total_turns += 1;
                if turn.quick_reply {
                    stats.quick_reply_turns += 1;
                }
                *intents.entry(turn.intent).or_default() += 1;
                for task in &turn.tasks {
                    *appliances.entry(task.as_str()).or_default() += 1;
                }
                match &turn.source {
                    Some(ScheduleSource::Optimizer { .. }) => stats.source_distribution.optimizer += 1,
                    Some(ScheduleSource::Simulated { .. }) => stats.source_distribution.simulated += 1,
                    None => {}
                }
                if let Some(ms) = turn.latency_ms {
                    latencies.push(ms);
                }
            }
            Event::HistoryLoadFailed { .. } => stats.history_load_failures += 1,
            Event::HistorySaveFailed { .. } => stats.history_save_failures += 1,
            Event::HistoryCleared => stats.history_clears += 1,
            Event::SpeechFailed { .. } => stats.speech_failures += 1,
        }
    }

    stats.intent_distribution = Intent::ALL
        .into_iter()
        .map(|intent| IntentStat {
            intent,
            count: intents.get(&intent).copied().unwrap_or(0),
        })
        .collect();

    let mut appliance_counts: Vec<ApplianceStat> = appliances
        .into_iter()
        .map(|(appliance, count)| ApplianceStat {
            appliance: appliance.to_string(),
            count,
        })
        .collect();
    appliance_counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.appliance.cmp(&b.appliance)));
    stats.appliance_counts = appliance_counts;

    if !latencies.is_empty() {
        let sum: u64 = latencies.iter().sum();
        stats.avg_latency_ms = Some(sum as f64 / latencies.len() as f64);
    }

    stats
}
