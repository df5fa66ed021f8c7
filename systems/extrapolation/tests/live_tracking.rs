//! Replays a telemetry session through the ledger, the extrapolator and
//! the gated ticker, checking that the projected counters line up with
//! the observations at every step.

use std::time::Duration;

use skill_advisor_core::{
    Command, CraftItemSpec, CraftKey, Event, ItemId, Level, LevelTable, SkillId, Timestamp,
};
use skill_advisor_system_extrapolation::Extrapolator;
use skill_advisor_system_scheduler::LiveTicker;
use skill_advisor_telemetry::{apply, query, TelemetryLedger};

fn observe_cost(ledger: &mut TelemetryLedger, events: &mut Vec<Event>, at: Timestamp) {
    apply(
        ledger,
        Command::ObserveCraftCost {
            entry: skill_advisor_core::CraftSpecEntry {
                spec: CraftItemSpec {
                    skill: SkillId::new("smithing"),
                    item: ItemId::new("iron bar"),
                    xp_per_action: 50.0,
                    time_per_action: Duration::from_secs(10),
                    requirements: Vec::new(),
                },
                observed_at: at,
            },
        },
        events,
    );
}

#[test]
fn tracked_activity_projects_between_telemetry_updates() {
    let table = LevelTable::from_thresholds(vec![0.0, 2_000.0]).expect("valid fixture table");
    let mut ledger = TelemetryLedger::new();
    let mut events = Vec::new();
    let skill = SkillId::new("smithing");
    let item = ItemId::new("iron bar");

    // Telemetry arrives: the crafting cost, the skill XP, the activity.
    observe_cost(&mut ledger, &mut events, Timestamp::from_millis(0));
    apply(
        &mut ledger,
        Command::ObserveSkillXp {
            skill: skill.clone(),
            xp: 1_000.0,
            at: Timestamp::from_millis(0),
        },
        &mut events,
    );
    apply(
        &mut ledger,
        Command::DetectActivity {
            skill: skill.clone(),
            item: item.clone(),
        },
        &mut events,
    );
    assert!(events.contains(&Event::ActivityDetected {
        skill: skill.clone(),
        item: item.clone(),
    }));

    // The detected activity starts live tracking from the observed state.
    let spec = query::usable_spec(&ledger, &CraftKey::new(skill.clone(), item.clone()))
        .expect("cost was observed");
    let snapshot = query::skill_snapshot(&ledger, &skill).expect("xp was observed");

    let mut extrapolator = Extrapolator::new();
    extrapolator
        .track(
            &table,
            skill.clone(),
            item.clone(),
            Level::new(2),
            snapshot.current_xp,
            spec.xp_per_action,
            spec.time_per_action,
            snapshot.observed_at,
        )
        .expect("observed costs are positive");

    // The ticker only runs while something is tracked and the surface is
    // visible.
    let mut ticker = LiveTicker::new(Duration::from_millis(500));
    ticker.set_gate(!extrapolator.is_idle(), true, Timestamp::from_millis(0));
    assert!(ticker.is_running());

    // Two actions complete over 25 seconds of wall time.
    assert_eq!(ticker.poll(Timestamp::from_millis(25_000)), 50);
    let estimate = extrapolator
        .query(&skill, Timestamp::from_millis(25_000))
        .expect("activity is tracked");
    assert_eq!(estimate.actions_completed, 2);
    assert_eq!(estimate.xp_estimate, 1_100.0);

    // Fresh telemetry ahead of the projection resynchronizes the baseline.
    assert!(extrapolator.ingest(&table, &skill, 1_200.0, Timestamp::from_millis(25_000)));
    let resynced = extrapolator
        .query(&skill, Timestamp::from_millis(25_000))
        .expect("activity is tracked");
    assert_eq!(resynced.xp_estimate, 1_200.0);
    assert_eq!(resynced.actions_remaining, 16);

    // Hiding the surface stops the ticker; untracking keeps it stopped
    // even when the surface returns.
    ticker.set_gate(!extrapolator.is_idle(), false, Timestamp::from_millis(26_000));
    assert!(!ticker.is_running());

    extrapolator.untrack(&skill);
    ticker.set_gate(!extrapolator.is_idle(), true, Timestamp::from_millis(27_000));
    assert!(!ticker.is_running());
}
