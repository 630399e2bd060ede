//! Mock schedule generator.
//!
//! Lays appliance tasks out across two fixed windows:
//!
//! | Window | Hours         | Capacity  | Carbon label |
//! |--------|---------------|-----------|--------------|
//! | green  | 02:00 – 06:00 | first 3   | Low          |
//! | dirty  | 14:00 – 18:00 | next 6    | Medium       |
//!
//! Tasks are stable-sorted by priority (HIGH first) before partitioning.
//! Each task runs for a pseudo-random whole number of hours in `[1, 3)`,
//! with a 30 minute gap before the next task in the same window. A run is
//! cut short when the tasks still waiting would otherwise lose their share
//! of the window, so items never overlap and never cross the window end.
//! The dirty window takes at most six tasks; anything past that is not
//! placed.
//!
//! The output is demonstration data. It is not derived from any carbon or
//! demand signal, and because durations are random only its structure is
//! stable.

use std::cmp::Reverse;
use std::fmt;

use chrono::NaiveTime;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::nlp::{Appliance, Priority};

/// Minutes between consecutive tasks in one window.
pub const TASK_GAP_MINUTES: u32 = 30;

/// Number of tasks the green window accepts before spilling over.
pub const GREEN_WINDOW_CAPACITY: usize = 3;

/// Shortest slot a task may be squeezed into.
pub const MIN_SLOT_MINUTES: u32 = 15;

/// Tasks that fit in a four-hour window at [`MIN_SLOT_MINUTES`] each with
/// the fixed gap between them.
pub const DIRTY_WINDOW_CAPACITY: usize = 6;

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Carbon classification of a scheduling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Green,
    Dirty,
}

impl Window {
    /// Clock span of the window.
    pub fn span(self) -> WindowSpan {
        match self {
            Self::Green => WindowSpan {
                start_minute: 2 * 60,
                end_minute: 6 * 60,
            },
            Self::Dirty => WindowSpan {
                start_minute: 14 * 60,
                end_minute: 18 * 60,
            },
        }
    }

    /// Carbon-intensity label attached to items in this window.
    pub fn carbon_label(self) -> CarbonLabel {
        match self {
            Self::Green => CarbonLabel::Low,
            Self::Dirty => CarbonLabel::Medium,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Dirty => write!(f, "dirty"),
        }
    }
}

/// A same-day clock span, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpan {
    pub start_minute: u32,
    pub end_minute: u32,
}

impl WindowSpan {
    pub fn start(self) -> NaiveTime {
        clock(self.start_minute)
    }

    pub fn end(self) -> NaiveTime {
        clock(self.end_minute)
    }

    pub fn length_minutes(self) -> u32 {
        self.end_minute - self.start_minute
    }

    /// Whether `time` lies in `[start, end)`.
    pub fn contains_start(self, time: NaiveTime) -> bool {
        time >= self.start() && time < self.end()
    }
}

/// Carbon-intensity label shown next to a scheduled item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarbonLabel {
    Low,
    Medium,
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

/// One task handed to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTask {
    pub appliance: Appliance,
    pub priority: Priority,
}

impl ScheduleTask {
    pub fn new(appliance: Appliance, priority: Priority) -> Self {
        Self {
            appliance,
            priority,
        }
    }
}

/// A task placed into a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// Display name (`"Washer"`, `"EV"`).
    pub task: String,
    pub appliance: Appliance,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub window: Window,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub carbon_intensity: CarbonLabel,
}

impl ScheduleItem {
    /// `"2:00 AM"` style start time.
    pub fn start_label(&self) -> String {
        format_clock(self.start)
    }

    /// `"4:00 AM"` style end time.
    pub fn end_label(&self) -> String {
        format_clock(self.end)
    }
}

/// Fixed cycle description for an appliance, if one exists.
pub fn task_details(appliance: Appliance) -> Option<&'static str> {
    match appliance {
        Appliance::Washer => Some("Washer: 45 min cycle"),
        Appliance::Dryer => Some("Dryer: 60 min cycle"),
        Appliance::Oven => Some("Oven: Pre-heat + cooking time"),
        Appliance::Dishwasher => Some("Dishwasher: 90 min cycle"),
        Appliance::Ev => Some("EV Charging: Level 2 charging"),
        Appliance::Vacuum => None,
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Build a mock schedule for `tasks`.
///
/// Returns one item per placed task: green items first (in priority order),
/// then dirty items. Tasks past [`DIRTY_WINDOW_CAPACITY`] find no room and
/// are left out; callers compare lengths to report them.
pub fn generate_mock_schedule<R: Rng + ?Sized>(
    tasks: &[ScheduleTask],
    rng: &mut R,
) -> Vec<ScheduleItem> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|task| Reverse(task.priority));

    let split = sorted.len().min(GREEN_WINDOW_CAPACITY);
    let (green, rest) = sorted.split_at(split);
    let dirty = &rest[..rest.len().min(DIRTY_WINDOW_CAPACITY)];

    let mut schedule = Vec::with_capacity(green.len() + dirty.len());
    place_in_window(green, Window::Green, rng, &mut schedule);
    place_in_window(dirty, Window::Dirty, rng, &mut schedule);
    schedule
}

/// Longest slot every task in a window of `count` tasks is guaranteed.
fn reserved_slot_minutes(span: WindowSpan, count: u32) -> u32 {
    if count == 0 {
        return 0;
    }
    let usable = span.length_minutes() - (count - 1) * TASK_GAP_MINUTES;
    (usable / count).min(60)
}

/// Lay tasks out back to back. Each task may run until the point where the
/// tasks after it would no longer get their reserved slot, so items never
/// overlap and every gap is exactly [`TASK_GAP_MINUTES`].
fn place_in_window<R: Rng + ?Sized>(
    tasks: &[ScheduleTask],
    window: Window,
    rng: &mut R,
    out: &mut Vec<ScheduleItem>,
) {
    let span = window.span();
    let count = u32::try_from(tasks.len()).unwrap_or(u32::MAX);
    let slot = reserved_slot_minutes(span, count);
    let mut cursor = span.start_minute;

    for (placed, task) in (0u32..).zip(tasks) {
        let after = count - placed - 1;
        let latest_end = span.end_minute - after * (slot + TASK_GAP_MINUTES);
        let hours: u32 = rng.random_range(1..3);
        let end = (cursor + hours * 60).min(latest_end);

        out.push(ScheduleItem {
            task: task.appliance.label().to_string(),
            appliance: task.appliance,
            start: clock(cursor),
            end: clock(end),
            window,
            details: task_details(task.appliance).map(str::to_string),
            carbon_intensity: window.carbon_label(),
        });

        cursor = end + TASK_GAP_MINUTES;
    }
}

// ---------------------------------------------------------------------------
// Impact
// ---------------------------------------------------------------------------

/// Estimated benefit of a schedule, shown in the impact section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    /// kg CO₂ avoided.
    pub carbon_reduction_kg: f64,
    /// Dollars saved per month.
    pub cost_savings: u32,
    /// 0–5 star rating.
    pub rating: usize,
}

impl Impact {
    /// Flat per-task estimate: 0.8 kg CO₂ and $5 per task.
    pub fn for_task_count(count: usize) -> Self {
        Self {
            carbon_reduction_kg: count as f64 * 0.8,
            cost_savings: u32::try_from(count).unwrap_or(u32::MAX).saturating_mul(5),
            rating: count.min(5),
        }
    }
}

// ---------------------------------------------------------------------------
// Clock helpers
// ---------------------------------------------------------------------------

/// Convert minutes since midnight to a clock time. Values past the end of
/// the day saturate at 23:59.
fn clock(minute: u32) -> NaiveTime {
    let minute = minute.min(24 * 60 - 1);
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Format a time as a 12-hour clock label, e.g. `"2:00 AM"`.
pub fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn tasks(appliances: &[Appliance]) -> Vec<ScheduleTask> {
        appliances
            .iter()
            .map(|&a| ScheduleTask::new(a, Priority::Medium))
            .collect()
    }

    #[test]
    fn empty_input_gives_empty_schedule() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_mock_schedule(&[], &mut rng).is_empty());
    }

    #[test]
    fn window_partition_is_min_n_three() {
        for seed in 0..20 {
            for n in 0..=Appliance::ALL.len() {
                let mut rng = StdRng::seed_from_u64(seed);
                let input = tasks(&Appliance::ALL[..n]);
                let schedule = generate_mock_schedule(&input, &mut rng);

                let green = schedule.iter().filter(|i| i.window == Window::Green).count();
                let dirty = schedule.iter().filter(|i| i.window == Window::Dirty).count();
                assert_eq!(schedule.len(), n);
                assert_eq!(green, n.min(3));
                assert_eq!(dirty, n.saturating_sub(3));
            }
        }
    }

    #[test]
    fn starts_stay_inside_their_window() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let schedule = generate_mock_schedule(&tasks(&Appliance::ALL), &mut rng);
            for item in &schedule {
                let span = item.window.span();
                assert!(
                    span.contains_start(item.start),
                    "{} starts at {} outside {} window",
                    item.task,
                    item.start,
                    item.window
                );
                assert!(item.end <= span.end());
                assert!(item.end > item.start);
            }
        }
    }

    #[test]
    fn tasks_in_a_window_never_overlap() {
        let mut input = tasks(&Appliance::ALL);
        input.extend(tasks(&Appliance::ALL[..3]));

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let schedule = generate_mock_schedule(&input, &mut rng);
            assert_eq!(schedule[0].start, Window::Green.span().start());

            for pair in schedule.windows(2) {
                if pair[0].window != pair[1].window {
                    continue;
                }
                let gap = pair[1].start - pair[0].end;
                assert_eq!(
                    gap.num_minutes(),
                    i64::from(TASK_GAP_MINUTES),
                    "seed {seed}: {} {}-{} then {} {}-{}",
                    pair[0].task,
                    pair[0].start,
                    pair[0].end,
                    pair[1].task,
                    pair[1].start,
                    pair[1].end
                );
                assert!(pair[1].end > pair[1].start);
            }
        }
    }

    #[test]
    fn full_windows_still_give_every_task_a_slot() {
        let mut input = tasks(&Appliance::ALL);
        input.extend(tasks(&Appliance::ALL[..3]));
        let mut rng = StdRng::seed_from_u64(5);
        let schedule = generate_mock_schedule(&input, &mut rng);

        assert_eq!(schedule.len(), GREEN_WINDOW_CAPACITY + DIRTY_WINDOW_CAPACITY);
        for item in &schedule {
            let minutes = (item.end - item.start).num_minutes();
            assert!(minutes >= i64::from(MIN_SLOT_MINUTES), "{item:?}");
        }
    }

    #[test]
    fn tasks_past_dirty_capacity_are_not_placed() {
        let mut input = tasks(&Appliance::ALL);
        input.extend(tasks(&Appliance::ALL));
        let mut rng = StdRng::seed_from_u64(2);
        let schedule = generate_mock_schedule(&input, &mut rng);

        assert_eq!(schedule.len(), 9);
        let dirty = schedule.iter().filter(|i| i.window == Window::Dirty).count();
        assert_eq!(dirty, DIRTY_WINDOW_CAPACITY);
    }

    #[test]
    fn capacity_matches_the_minimum_slot() {
        let span = Window::Dirty.span();
        let fits = (span.length_minutes() + TASK_GAP_MINUTES) / (MIN_SLOT_MINUTES + TASK_GAP_MINUTES);
        assert_eq!(fits as usize, DIRTY_WINDOW_CAPACITY);
        assert_eq!(reserved_slot_minutes(span, 3), 60);
        assert_eq!(reserved_slot_minutes(span, 6), MIN_SLOT_MINUTES);
    }

    #[test]
    fn high_priority_tasks_claim_green_slots() {
        let mut input = tasks(&[
            Appliance::Washer,
            Appliance::Dryer,
            Appliance::Oven,
            Appliance::Dishwasher,
        ]);
        input[3].priority = Priority::High;
        input[0].priority = Priority::Low;

        let mut rng = StdRng::seed_from_u64(3);
        let schedule = generate_mock_schedule(&input, &mut rng);

        let order: Vec<_> = schedule.iter().map(|i| i.appliance).collect();
        assert_eq!(
            order,
            vec![
                Appliance::Dishwasher,
                Appliance::Dryer,
                Appliance::Oven,
                Appliance::Washer
            ]
        );
        assert_eq!(schedule[3].window, Window::Dirty);
    }

    #[test]
    fn items_carry_labels_and_details() {
        let mut rng = StdRng::seed_from_u64(9);
        let schedule = generate_mock_schedule(
            &tasks(&[
                Appliance::Ev,
                Appliance::Washer,
                Appliance::Oven,
                Appliance::Vacuum,
            ]),
            &mut rng,
        );

        assert_eq!(schedule[0].task, "EV");
        assert_eq!(
            schedule[0].details.as_deref(),
            Some("EV Charging: Level 2 charging")
        );
        assert_eq!(schedule[0].carbon_intensity, CarbonLabel::Low);
        assert_eq!(schedule[3].task, "Vacuum");
        assert!(schedule[3].details.is_none());
        assert_eq!(schedule[3].carbon_intensity, CarbonLabel::Medium);
    }

    #[test]
    fn impact_scales_with_task_count() {
        let impact = Impact::for_task_count(3);
        assert!((impact.carbon_reduction_kg - 2.4).abs() < 1e-9);
        assert_eq!(impact.cost_savings, 15);
        assert_eq!(impact.rating, 3);
        assert_eq!(Impact::for_task_count(9).rating, 5);
    }

    #[test]
    fn clock_labels() {
        assert_eq!(format_clock(clock(2 * 60)), "2:00 AM");
        assert_eq!(format_clock(clock(14 * 60 + 30)), "2:30 PM");
        assert_eq!(format_clock(clock(0)), "12:00 AM");
        assert_eq!(clock(25 * 60), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn window_wire_names() {
        assert_eq!(serde_json::to_string(&Window::Green).unwrap(), "\"green\"");
        assert_eq!(Window::Dirty.to_string(), "dirty");
    }
}
