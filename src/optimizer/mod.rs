//! Boundary to the Aura energy optimization API.
//!
//! The assistant never computes green windows itself. Scheduling requests
//! are forwarded to `POST /api/optimize-windows`; the response is parsed
//! and summarised into a [`ScheduleSource`]. The slot layout shown to the
//! user is always the local mock from [`crate::scheduler`], and when the
//! optimizer is disabled or fails the outcome is explicitly marked
//! [`ScheduleSource::Simulated`].

pub mod client;
pub mod demand;
pub mod forecast;

use std::sync::LazyLock;
use std::time::Instant;

use anyhow::{Result, bail};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::nlp::{Appliance, Deadline, ExtractedEntities};
use crate::scheduler::{self, Impact, ScheduleItem, ScheduleTask};

pub use client::OptimizerClient;

/// Upper bound on `number_of_windows` accepted by the API.
pub const MAX_WINDOWS: u32 = 10;

/// `H:MM` or `HH:MM`, 24-hour clock.
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").unwrap());

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Envelope shared by the energy API's JSON responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_true")]
    pub success: bool,
    pub data: T,
    #[serde(default)]
    pub message: String,
}

fn default_true() -> bool {
    true
}

/// Body of `POST /api/optimize-windows`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub start_time: String,
    pub end_time: String,
    pub number_of_windows: u32,
    pub appliances: Vec<String>,
}

impl OptimizeRequest {
    /// Build the request for a set of extracted entities.
    ///
    /// Searches the whole day, or only until 06:00 when the user asked for
    /// it by tomorrow. One window is requested per task.
    pub fn for_entities(entities: &ExtractedEntities) -> Self {
        let end_time = match entities.deadline {
            Deadline::Tomorrow => "06:00",
            _ => "23:59",
        };

        let count = u32::try_from(entities.tasks.len()).unwrap_or(MAX_WINDOWS);

        let mut appliances = entities.task_ids();
        if appliances.is_empty() {
            appliances.push("washer".to_string());
        }

        Self {
            start_time: "00:00".to_string(),
            end_time: end_time.to_string(),
            number_of_windows: count.clamp(1, MAX_WINDOWS),
            appliances,
        }
    }

    /// Reject malformed times and window counts before sending.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("start_time", &self.start_time), ("end_time", &self.end_time)] {
            if !TIME_RE.is_match(value) {
                bail!("invalid {name} '{value}': expected HH:MM");
            }
        }
        if !(1..=MAX_WINDOWS).contains(&self.number_of_windows) {
            bail!(
                "number_of_windows must be between 1 and {MAX_WINDOWS}, got {}",
                self.number_of_windows
            );
        }
        Ok(())
    }
}

/// One window proposed by the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalWindow {
    pub start_time: String,
    pub end_time: String,
    pub carbon_intensity: f64,
    #[serde(default)]
    pub renewable_percentage: Option<f64>,
    #[serde(default)]
    pub appliances: Vec<String>,
    #[serde(default)]
    pub energy_savings_kg: Option<f64>,
}

/// The `data` object of the optimize response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeData {
    pub optimal_windows: Vec<OptimalWindow>,
    pub total_carbon_savings: Option<f64>,
    pub time_range_used: Option<String>,
    pub baseline_threshold: Option<f64>,
    pub fallback_available: bool,
    pub fallback_reason: Option<String>,
}

pub type OptimizeResponse = ApiEnvelope<OptimizeData>;

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// Anything that can answer an optimization request.
///
/// [`OptimizerClient`] talks HTTP; tests substitute canned backends.
pub trait OptimizationBackend {
    fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse>;
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Where a schedule's backing came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleSource {
    /// The optimizer answered. `optimizer_fallback` is set when it found no
    /// green windows and offered the least carbon-intensive ones instead.
    Optimizer {
        windows: usize,
        optimizer_fallback: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_carbon_savings: Option<f64>,
    },
    /// No optimizer answer; the schedule is locally simulated.
    Simulated { reason: String },
}

impl ScheduleSource {
    pub fn simulated_reason(&self) -> Option<&str> {
        match self {
            Self::Simulated { reason } => Some(reason),
            Self::Optimizer { .. } => None,
        }
    }
}

/// A schedule plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleOutcome {
    pub items: Vec<ScheduleItem>,
    pub source: ScheduleSource,
    pub impact: Impact,
    /// Requested appliances the mock windows had no room for.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unplaced: Vec<Appliance>,
    /// Round-trip time of the optimizer call, when one was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ScheduleOutcome {
    pub fn is_simulated(&self) -> bool {
        matches!(self.source, ScheduleSource::Simulated { .. })
    }
}

/// Ask the backend for windows and lay out the schedule.
///
/// `backend` is `None` when the optimizer is disabled. Any failure (transport,
/// non-2xx, unparseable body, `success: false`) yields a simulated outcome;
/// this function never errors.
pub fn plan_schedule<R: Rng + ?Sized>(
    entities: &ExtractedEntities,
    backend: Option<&dyn OptimizationBackend>,
    rng: &mut R,
) -> ScheduleOutcome {
    let (source, latency_ms) = match backend {
        None => (
            ScheduleSource::Simulated {
                reason: "optimizer disabled".to_string(),
            },
            None,
        ),
        Some(backend) => {
            let started = Instant::now();
            let source = query_backend(entities, backend);
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            (source, Some(elapsed))
        }
    };

    let tasks: Vec<ScheduleTask> = entities
        .tasks
        .iter()
        .map(|&appliance| ScheduleTask::new(appliance, entities.priority))
        .collect();

    let items = scheduler::generate_mock_schedule(&tasks, rng);
    let unplaced = unplaced_appliances(&tasks, &items);

    ScheduleOutcome {
        impact: Impact::for_task_count(items.len()),
        items,
        source,
        unplaced,
        latency_ms,
    }
}

/// Tasks with no matching item, one entry per missing slot.
fn unplaced_appliances(tasks: &[ScheduleTask], items: &[ScheduleItem]) -> Vec<Appliance> {
    let mut remaining: Vec<Appliance> = items.iter().map(|item| item.appliance).collect();
    tasks
        .iter()
        .filter_map(|task| match remaining.iter().position(|&a| a == task.appliance) {
            Some(index) => {
                remaining.swap_remove(index);
                None
            }
            None => Some(task.appliance),
        })
        .collect()
}

fn query_backend(entities: &ExtractedEntities, backend: &dyn OptimizationBackend) -> ScheduleSource {
    let request = OptimizeRequest::for_entities(entities);
    if let Err(e) = request.validate() {
        return ScheduleSource::Simulated {
            reason: format!("{e:#}"),
        };
    }

    match backend.optimize(&request) {
        Ok(response) if response.success => ScheduleSource::Optimizer {
            windows: response.data.optimal_windows.len(),
            optimizer_fallback: response.data.fallback_available,
            total_carbon_savings: response.data.total_carbon_savings,
        },
        Ok(response) => ScheduleSource::Simulated {
            reason: if response.message.is_empty() {
                "optimizer reported failure".to_string()
            } else {
                response.message
            },
        },
        Err(e) => ScheduleSource::Simulated {
            reason: format!("{e:#}"),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
