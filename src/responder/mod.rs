//! Bot reply text and quick replies.
//!
//! Replies are fixed templates: a schedule rendering for SCHEDULE_TASK with
//! a plan, and canned responses for every other intent. Nothing here does
//! I/O or consults earlier turns.

use std::fmt::Write;

use serde::Serialize;

use crate::nlp::{Appliance, ExtractedEntities, Intent};
use crate::optimizer::{ScheduleOutcome, ScheduleSource};
use crate::scheduler::{ScheduleItem, Window};

/// Rendered bot reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub quick_replies: Vec<String>,
}

impl Reply {
    fn new(text: impl Into<String>, quick_replies: &[&str]) -> Self {
        Self {
            text: text.into(),
            quick_replies: quick_replies.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const WELCOME_REPLIES: &[&str] = &crate::chat::WELCOME_QUICK_REPLIES;
const SCHEDULE_REPLIES: &[&str] = &["Confirm", "Modify", "See Alternatives"];
const ERROR_REPLIES: &[&str] = &["Try again", "Help"];

pub const ERROR_TEXT: &str =
    "I'm sorry, I encountered an error. Please try again or rephrase your request.";

/// Fixed response for each non-scheduling intent.
fn canned(intent: Intent) -> Reply {
    match intent {
        Intent::ModifySchedule => Reply::new(
            "I can help you modify your existing schedule. What changes would you like to make?",
            &["Change time", "Cancel task", "View schedule"],
        ),
        Intent::CancelTask => Reply::new(
            "I'll help you cancel that scheduled task. Which one would you like to cancel?",
            &["Confirm cancel", "Keep schedule", "Help"],
        ),
        Intent::GetStatus => Reply::new(
            "Let me check your current scheduled tasks and their status.",
            &["View all", "Modify", "Schedule new"],
        ),
        Intent::ScheduleTask => Reply::new(
            "I'd be happy to help you schedule your tasks. What appliances do you need to run? (washer, dryer, oven, dishwasher, EV charger, etc.)",
            WELCOME_REPLIES,
        ),
        Intent::GeneralChat => Reply::new(
            "I'm here to help you optimize your energy usage by scheduling tasks during green energy windows. What would you like to schedule?",
            WELCOME_REPLIES,
        ),
    }
}

/// Build the reply for one processed message.
///
/// `outcome` is the planned schedule, present only for SCHEDULE_TASK with at
/// least one task when a schedule could be produced.
pub fn respond(
    intent: Intent,
    entities: &ExtractedEntities,
    outcome: Option<&ScheduleOutcome>,
) -> Reply {
    match (intent, outcome) {
        (Intent::ScheduleTask, Some(outcome)) if !outcome.items.is_empty() => {
            format_schedule(outcome)
        }
        (Intent::ScheduleTask, _) if !entities.tasks.is_empty() => acknowledge(&entities.tasks),
        _ => canned(intent),
    }
}

/// Plain acknowledgement used when tasks were found but no schedule is shown.
pub fn acknowledge(tasks: &[Appliance]) -> Reply {
    let names: Vec<&str> = tasks.iter().map(|t| t.id()).collect();
    Reply::new(
        format!(
            "I'd be happy to help you schedule your {} task(s). Let me find the optimal green energy window for you.",
            names.join(" and ")
        ),
        &["Add more tasks", "Change time", "Help"],
    )
}

/// Reply used when a turn fails unexpectedly.
pub fn error_reply() -> Reply {
    Reply::new(ERROR_TEXT, ERROR_REPLIES)
}

pub fn task_icon(appliance: Appliance) -> &'static str {
    match appliance {
        Appliance::Washer => "🧺",
        Appliance::Dryer => "👕",
        Appliance::Oven => "🍳",
        Appliance::Dishwasher => "🍽️",
        Appliance::Ev => "🚗",
        Appliance::Vacuum => "🧹",
    }
}

/// Icon for a free-form task label; unknown labels get the fallback glyph.
pub fn icon_for_label(label: &str) -> &'static str {
    Appliance::ALL
        .into_iter()
        .find(|a| a.id().eq_ignore_ascii_case(label) || a.label().eq_ignore_ascii_case(label))
        .map_or("⚡", task_icon)
}

/// Render the schedule template.
pub fn format_schedule(outcome: &ScheduleOutcome) -> Reply {
    let green: Vec<&ScheduleItem> = outcome
        .items
        .iter()
        .filter(|i| i.window == Window::Green)
        .collect();
    let dirty: Vec<&ScheduleItem> = outcome
        .items
        .iter()
        .filter(|i| i.window == Window::Dirty)
        .collect();

    let mut text = String::from("✅ **Optimized Schedule Found:**\n\n");

    write_section(
        &mut text,
        "🌱 **Green Window (Low Carbon):** 2:00 AM - 6:00 AM",
        &green,
    );
    write_section(
        &mut text,
        "⚡ **Dirty Window (Medium Carbon):** 2:00 PM - 6:00 PM",
        &dirty,
    );

    let impact = &outcome.impact;
    text.push_str("📊 **Impact:**\n");
    let _ = writeln!(text, "• Total Tasks Scheduled: {}", outcome.items.len());
    let _ = writeln!(text, "• Green Window Tasks: {}", green.len());
    if !dirty.is_empty() {
        let _ = writeln!(text, "• Dirty Window Tasks: {}", dirty.len());
    }
    let _ = writeln!(
        text,
        "• Carbon Reduction: {:.1} kg CO₂",
        impact.carbon_reduction_kg
    );
    let _ = writeln!(
        text,
        "• Estimated Savings: ${} this month",
        impact.cost_savings
    );
    let _ = writeln!(
        text,
        "• Green Window Utilized: {}\n",
        "★".repeat(green.len().min(5))
    );

    if let Some(note) = source_note(&outcome.source) {
        let _ = writeln!(text, "{note}\n");
    }

    if !outcome.unplaced.is_empty() {
        let names: Vec<&str> = outcome.unplaced.iter().map(|a| a.label()).collect();
        let _ = writeln!(
            text,
            "⚠️ No room left in today's windows for: {}\n",
            names.join(", ")
        );
    }

    text.push_str("Would you like to confirm this schedule?");

    Reply::new(text, SCHEDULE_REPLIES)
}

fn write_section(text: &mut String, heading: &str, items: &[&ScheduleItem]) {
    if items.is_empty() {
        return;
    }
    text.push_str(heading);
    text.push('\n');
    for item in items {
        let _ = writeln!(
            text,
            "{} {}: {} - {}",
            icon_for_label(&item.task),
            item.task,
            item.start_label(),
            item.end_label()
        );
        if let Some(details) = &item.details {
            let _ = writeln!(text, "  - {details}");
        }
    }
    text.push('\n');
}

/// Extra line describing where the schedule came from, if noteworthy.
fn source_note(source: &ScheduleSource) -> Option<String> {
    match source {
        ScheduleSource::Simulated { .. } => Some(
            "ℹ️ _Simulated schedule: the optimization service was unavailable, so these times are estimates._"
                .to_string(),
        ),
        ScheduleSource::Optimizer {
            optimizer_fallback: true,
            ..
        } => Some(
            "ℹ️ _No green windows were found today; times favour the least carbon-intensive hours._"
                .to_string(),
        ),
        ScheduleSource::Optimizer { .. } => None,
    }
}

/// Map a quick-reply label to the utterance it stands for.
///
/// Unknown labels are sent verbatim.
pub fn expand_quick_reply(label: &str) -> String {
    let expanded = match label {
        "Schedule laundry" => "I need to do laundry",
        "Cook dinner" => "I want to cook dinner tonight",
        "Charge EV" => "Charge my electric vehicle",
        "Confirm" => "Yes, please confirm this schedule",
        "Modify" => "I need to modify this schedule",
        "See Alternatives" => "Show me alternative schedules",
        "Help" => "What can you help me with?",
        "Try again" => "Let me try asking differently",
        other => other,
    };
    expanded.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::scheduler::{CarbonLabel, Impact};

    fn item(appliance: Appliance, window: Window, start: (u32, u32), end: (u32, u32)) -> ScheduleItem {
        ScheduleItem {
            task: appliance.label().to_string(),
            appliance,
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            window,
            details: crate::scheduler::task_details(appliance).map(str::to_string),
            carbon_intensity: match window {
                Window::Green => CarbonLabel::Low,
                Window::Dirty => CarbonLabel::Medium,
            },
        }
    }

    fn outcome(items: Vec<ScheduleItem>, source: ScheduleSource) -> ScheduleOutcome {
        ScheduleOutcome {
            impact: Impact::for_task_count(items.len()),
            items,
            source,
            unplaced: Vec::new(),
            latency_ms: None,
        }
    }

    fn optimizer_source() -> ScheduleSource {
        ScheduleSource::Optimizer {
            windows: 1,
            optimizer_fallback: false,
            total_carbon_savings: None,
        }
    }

    #[test]
    fn single_green_task_renders_template() {
        let reply = format_schedule(&outcome(
            vec![item(Appliance::Washer, Window::Green, (2, 0), (4, 0))],
            optimizer_source(),
        ));

        let expected = "✅ **Optimized Schedule Found:**\n\n\
            🌱 **Green Window (Low Carbon):** 2:00 AM - 6:00 AM\n\
            🧺 Washer: 2:00 AM - 4:00 AM\n\
            \x20 - Washer: 45 min cycle\n\
            \n\
            📊 **Impact:**\n\
            • Total Tasks Scheduled: 1\n\
            • Green Window Tasks: 1\n\
            • Carbon Reduction: 0.8 kg CO₂\n\
            • Estimated Savings: $5 this month\n\
            • Green Window Utilized: ★\n\n\
            Would you like to confirm this schedule?";
        assert_eq!(reply.text, expected);
        assert_eq!(reply.quick_replies, vec!["Confirm", "Modify", "See Alternatives"]);
    }

    #[test]
    fn dirty_section_only_when_needed() {
        let items = vec![
            item(Appliance::Washer, Window::Green, (2, 0), (3, 0)),
            item(Appliance::Dryer, Window::Green, (3, 30), (5, 30)),
            item(Appliance::Oven, Window::Green, (5, 30), (6, 0)),
            item(Appliance::Ev, Window::Dirty, (14, 0), (16, 0)),
        ];
        let reply = format_schedule(&outcome(items, optimizer_source()));

        assert!(reply.text.contains("⚡ **Dirty Window (Medium Carbon):** 2:00 PM - 6:00 PM"));
        assert!(reply.text.contains("🚗 EV: 2:00 PM - 4:00 PM"));
        assert!(reply.text.contains("• Dirty Window Tasks: 1"));
        assert!(reply.text.contains("• Carbon Reduction: 3.2 kg CO₂"));
        assert!(reply.text.contains("• Estimated Savings: $20 this month"));
        assert!(reply.text.contains("• Green Window Utilized: ★★★\n"));
    }

    #[test]
    fn simulated_schedule_carries_note() {
        let reply = format_schedule(&outcome(
            vec![item(Appliance::Washer, Window::Green, (2, 0), (3, 0))],
            ScheduleSource::Simulated {
                reason: "connection refused".into(),
            },
        ));
        assert!(reply.text.contains("Simulated schedule"));
        assert!(reply.text.ends_with("Would you like to confirm this schedule?"));
    }

    #[test]
    fn optimizer_schedule_has_no_note() {
        let reply = format_schedule(&outcome(
            vec![item(Appliance::Washer, Window::Green, (2, 0), (3, 0))],
            optimizer_source(),
        ));
        assert!(!reply.text.contains("ℹ️"));
    }

    #[test]
    fn schedule_without_tasks_asks_for_appliances() {
        let reply = respond(Intent::ScheduleTask, &ExtractedEntities::default(), None);
        assert!(reply.text.contains("What appliances do you need to run?"));
        assert_eq!(
            reply.quick_replies,
            vec!["Schedule laundry", "Cook dinner", "Charge EV", "Help"]
        );
    }

    #[test]
    fn schedule_without_plan_acknowledges_tasks() {
        let entities = ExtractedEntities {
            tasks: vec![Appliance::Washer, Appliance::Ev],
            ..ExtractedEntities::default()
        };
        let reply = respond(Intent::ScheduleTask, &entities, None);
        assert_eq!(
            reply.text,
            "I'd be happy to help you schedule your washer and ev task(s). Let me find the optimal green energy window for you."
        );
        assert_eq!(reply.quick_replies, vec!["Add more tasks", "Change time", "Help"]);
    }

    #[test]
    fn canned_replies_per_intent() {
        let entities = ExtractedEntities::default();
        let cancel = respond(Intent::CancelTask, &entities, None);
        assert_eq!(cancel.quick_replies, vec!["Confirm cancel", "Keep schedule", "Help"]);

        let modify = respond(Intent::ModifySchedule, &entities, None);
        assert!(modify.text.starts_with("I can help you modify"));

        let status = respond(Intent::GetStatus, &entities, None);
        assert_eq!(status.quick_replies, vec!["View all", "Modify", "Schedule new"]);

        let general = respond(Intent::GeneralChat, &entities, None);
        assert!(general.text.contains("green energy windows"));
    }

    #[test]
    fn quick_reply_expansion() {
        assert_eq!(expand_quick_reply("Schedule laundry"), "I need to do laundry");
        assert_eq!(expand_quick_reply("Charge EV"), "Charge my electric vehicle");
        assert_eq!(expand_quick_reply("Help"), "What can you help me with?");
        assert_eq!(expand_quick_reply("View all"), "View all");
    }

    #[test]
    fn icons_fall_back_for_unknown_labels() {
        assert_eq!(icon_for_label("washer"), "🧺");
        assert_eq!(icon_for_label("EV"), "🚗");
        assert_eq!(icon_for_label("sauna"), "⚡");
    }

    #[test]
    fn schedule_lines_are_keyed_by_task_name() {
        let mut renamed = item(Appliance::Oven, Window::Green, (2, 0), (3, 0));
        renamed.task = "Slow cooker".to_string();
        renamed.details = None;
        let ev = item(Appliance::Ev, Window::Green, (3, 30), (5, 30));

        let reply = format_schedule(&outcome(vec![renamed, ev], optimizer_source()));
        assert!(reply.text.contains("⚡ Slow cooker: 2:00 AM - 3:00 AM\n"));
        assert!(reply.text.contains("🚗 EV: 3:30 AM - 5:30 AM\n"));
    }

    #[test]
    fn unplaced_tasks_are_listed() {
        let mut scheduled = outcome(
            vec![item(Appliance::Washer, Window::Green, (2, 0), (3, 0))],
            optimizer_source(),
        );
        scheduled.unplaced = vec![Appliance::Vacuum, Appliance::Dryer];

        let reply = format_schedule(&scheduled);
        assert!(reply.text.contains("⚠️ No room left in today's windows for: Vacuum, Dryer"));
        assert!(reply.text.contains("• Total Tasks Scheduled: 1\n"));
    }
}
