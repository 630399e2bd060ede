use rand::SeedableRng;
use rand::rngs::StdRng;

use aura::nlp::{Appliance, Priority};
use aura::scheduler::{Impact, ScheduleTask, TASK_GAP_MINUTES, Window, generate_mock_schedule};

fn tasks(list: &[(Appliance, Priority)]) -> Vec<ScheduleTask> {
    list.iter()
        .map(|&(appliance, priority)| ScheduleTask::new(appliance, priority))
        .collect()
}

// ---------------------------------------------------------------------------
// Mock schedule layout
// ---------------------------------------------------------------------------

#[test]
fn every_task_gets_exactly_one_slot() {
    let input = tasks(&[
        (Appliance::Washer, Priority::Medium),
        (Appliance::Dryer, Priority::Low),
        (Appliance::Oven, Priority::High),
        (Appliance::Dishwasher, Priority::Medium),
        (Appliance::Ev, Priority::Low),
    ]);

    for seed in 0..20 {
        let schedule = generate_mock_schedule(&input, &mut StdRng::seed_from_u64(seed));
        assert_eq!(schedule.len(), input.len());

        let mut appliances: Vec<Appliance> = schedule.iter().map(|i| i.appliance).collect();
        appliances.sort();
        let mut expected: Vec<Appliance> = input.iter().map(|t| t.appliance).collect();
        expected.sort();
        assert_eq!(appliances, expected);
    }
}

#[test]
fn green_window_holds_at_most_three_highest_priority_tasks() {
    let input = tasks(&[
        (Appliance::Vacuum, Priority::Low),
        (Appliance::Washer, Priority::High),
        (Appliance::Dryer, Priority::Low),
        (Appliance::Ev, Priority::High),
        (Appliance::Oven, Priority::Medium),
    ]);

    let schedule = generate_mock_schedule(&input, &mut StdRng::seed_from_u64(7));
    let green: Vec<_> = schedule.iter().filter(|i| i.window == Window::Green).collect();
    let dirty: Vec<_> = schedule.iter().filter(|i| i.window == Window::Dirty).collect();

    assert_eq!(green.len(), 3);
    assert_eq!(dirty.len(), 2);
    assert_eq!(green[0].appliance, Appliance::Washer);
    assert_eq!(green[1].appliance, Appliance::Ev);
    assert_eq!(green[2].appliance, Appliance::Oven);
    assert!(schedule[..3].iter().all(|i| i.window == Window::Green));
}

#[test]
fn slots_stay_inside_their_window() {
    let input = tasks(&[
        (Appliance::Washer, Priority::Medium),
        (Appliance::Dryer, Priority::Medium),
        (Appliance::Dishwasher, Priority::Medium),
        (Appliance::Ev, Priority::Medium),
        (Appliance::Vacuum, Priority::Medium),
        (Appliance::Oven, Priority::Medium),
    ]);

    for seed in 0..50 {
        let schedule = generate_mock_schedule(&input, &mut StdRng::seed_from_u64(seed));
        for item in &schedule {
            let span = item.window.span();
            assert!(span.contains_start(item.start), "{item:?}");
            assert!(item.end > item.start, "{item:?}");
            assert!(item.end <= span.end(), "{item:?}");
        }
        for pair in schedule.windows(2) {
            if pair[0].window == pair[1].window {
                let gap = (pair[1].start - pair[0].end).num_minutes();
                assert!(gap >= i64::from(TASK_GAP_MINUTES), "seed {seed}: {pair:?}");
            }
        }
    }
}

#[test]
fn empty_task_list_yields_empty_schedule() {
    let schedule = generate_mock_schedule(&[], &mut StdRng::seed_from_u64(1));
    assert!(schedule.is_empty());
}

// ---------------------------------------------------------------------------
// Impact
// ---------------------------------------------------------------------------

#[test]
fn impact_scales_per_task_and_caps_rating() {
    let one = Impact::for_task_count(1);
    assert!((one.carbon_reduction_kg - 0.8).abs() < 1e-9);
    assert_eq!(one.cost_savings, 5);
    assert_eq!(one.rating, 1);

    let many = Impact::for_task_count(7);
    assert_eq!(many.cost_savings, 35);
    assert_eq!(many.rating, 5);
}
