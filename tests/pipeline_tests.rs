use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

use aura::analytics::{Event, EventLog};
use aura::analytics::reporter::build_stats;
use aura::assistant::Assistant;
use aura::chat::{HistoryFile, Role};
use aura::config::AuraConfig;
use aura::nlp::Intent;
use aura::optimizer::{
    ApiEnvelope, OptimalWindow, OptimizationBackend, OptimizeData, OptimizeRequest,
    OptimizeResponse, ScheduleSource,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Backend that records requests and answers from a fixed script.
struct Scripted {
    requests: Rc<RefCell<Vec<OptimizeRequest>>>,
    answer: fn() -> Result<OptimizeResponse>,
}

impl OptimizationBackend for Scripted {
    fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResponse> {
        self.requests.borrow_mut().push(request.clone());
        (self.answer)()
    }
}

fn green_windows() -> Result<OptimizeResponse> {
    Ok(ApiEnvelope {
        success: true,
        data: OptimizeData {
            optimal_windows: vec![OptimalWindow {
                start_time: "02:00".into(),
                end_time: "04:00".into(),
                carbon_intensity: 120.5,
                renewable_percentage: Some(64.0),
                appliances: vec!["washer".into()],
                energy_savings_kg: Some(0.7),
            }],
            total_carbon_savings: Some(0.7),
            ..OptimizeData::default()
        },
        message: String::new(),
    })
}

fn unreachable() -> Result<OptimizeResponse> {
    Err(anyhow!("connection refused"))
}

fn assistant_with(
    answer: fn() -> Result<OptimizeResponse>,
    history: Option<HistoryFile>,
    events: EventLog,
) -> (Assistant, Rc<RefCell<Vec<OptimizeRequest>>>) {
    let requests = Rc::new(RefCell::new(Vec::new()));
    let backend = Scripted {
        requests: Rc::clone(&requests),
        answer,
    };
    let assistant = Assistant::with_parts(
        AuraConfig::default(),
        Some(Box::new(backend)),
        history,
        events,
        StdRng::seed_from_u64(42),
    );
    (assistant, requests)
}

// ---------------------------------------------------------------------------
// Optimizer boundary
// ---------------------------------------------------------------------------

#[test]
fn schedule_turn_forwards_request_to_optimizer() {
    let (mut assistant, requests) = assistant_with(green_windows, None, EventLog::disabled());

    let turn = assistant
        .send("I need to do laundry and charge my car by tomorrow")
        .unwrap();

    let requests = requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].start_time, "00:00");
    assert_eq!(requests[0].end_time, "06:00");
    assert_eq!(requests[0].number_of_windows, 2);
    assert_eq!(requests[0].appliances, vec!["washer", "ev"]);

    let outcome = turn.outcome.unwrap();
    assert!(!outcome.is_simulated());
    assert_eq!(
        outcome.source,
        ScheduleSource::Optimizer {
            windows: 1,
            optimizer_fallback: false,
            total_carbon_savings: Some(0.7),
        }
    );
    assert!(!turn.bot.text.contains("Simulated schedule"));
    assert!(turn.bot.text.contains("🧺 Washer: "));
    assert!(turn.bot.text.contains("🚗 EV: "));
}

#[test]
fn unreachable_optimizer_is_marked_simulated() {
    let (mut assistant, _) = assistant_with(unreachable, None, EventLog::disabled());

    let turn = assistant.send("run the dishwasher").unwrap();
    let outcome = turn.outcome.unwrap();

    assert!(outcome.is_simulated());
    assert_eq!(
        outcome.source.simulated_reason(),
        Some("connection refused")
    );
    assert_eq!(outcome.items.len(), 1);
    assert!(turn.bot.text.contains("Simulated schedule"));
}

#[test]
fn non_schedule_turns_never_call_optimizer() {
    let (mut assistant, requests) = assistant_with(green_windows, None, EventLog::disabled());

    for text in ["hello", "cancel my washer task", "what is the status?", "change it"] {
        let turn = assistant.send(text).unwrap();
        assert!(turn.outcome.is_none(), "{text:?} planned a schedule");
    }
    // Schedule intent without a recognised appliance.
    let turn = assistant.send("schedule something").unwrap();
    assert_eq!(turn.processed.intent, Intent::ScheduleTask);
    assert!(turn.outcome.is_none());

    assert!(requests.borrow().is_empty());
}

// ---------------------------------------------------------------------------
// Message store and persistence
// ---------------------------------------------------------------------------

#[test]
fn every_turn_appends_user_then_bot() {
    let (mut assistant, _) = assistant_with(unreachable, None, EventLog::disabled());

    assistant.send("hi").unwrap();
    assistant.quick_reply("Schedule laundry").unwrap();

    let messages = assistant.messages();
    assert_eq!(messages.len(), 5);
    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::Bot, Role::User, Role::Bot, Role::User, Role::Bot]
    );
    assert_eq!(messages[3].text, "I need to do laundry");

    let ids: Vec<u64> = messages.iter().map(|m| m.id).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn history_survives_restart_and_clear_resets_it() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    let (mut first, _) = assistant_with(
        unreachable,
        Some(HistoryFile::new(&path)),
        EventLog::disabled(),
    );
    first.send("I need to do laundry").unwrap();
    assert!(path.exists());
    let before = first.messages().to_vec();

    let (mut second, _) = assistant_with(
        unreachable,
        Some(HistoryFile::new(&path)),
        EventLog::disabled(),
    );
    assert_eq!(second.messages(), before.as_slice());

    second.clear();
    assert_eq!(second.messages().len(), 1);
    assert!(second.messages()[0].is_bot());
    assert!(!path.exists());
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[test]
fn turns_are_logged_and_reported() {
    let dir = TempDir::new().unwrap();
    let events = EventLog::at(dir.path().join("events.jsonl"));

    let (mut assistant, _) = assistant_with(unreachable, None, events.clone());
    assistant.send("charge my car").unwrap();
    assistant.quick_reply("Help").unwrap();
    assistant.clear();

    let entries = events.read_all();
    assert_eq!(entries.len(), 3);
    assert!(matches!(entries[2].event, Event::HistoryCleared));

    let stats = build_stats(&entries);
    assert_eq!(stats.total_turns, 2);
    assert_eq!(stats.quick_reply_turns, 1);
    assert_eq!(stats.source_distribution.simulated, 1);
    assert_eq!(stats.source_distribution.optimizer, 0);
    assert_eq!(stats.history_clears, 1);
}
