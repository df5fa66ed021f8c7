#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that projects XP and ETA between telemetry updates.
//!
//! Telemetry reports XP at coarse intervals; between reports the
//! extrapolator assumes the tracked activity keeps running at its observed
//! per-action cadence and projects the current XP from the last baseline.
//! When fresh telemetry shows genuine forward progress the baseline is
//! replaced wholesale; stale or redundant reports are ignored so the
//! projected counter never visibly regresses.

use std::collections::HashMap;
use std::time::Duration;

use skill_advisor_core::{
    ExtrapolationSnapshot, InvalidCraftSpecError, ItemId, Level, LevelTable, SkillId, Timestamp,
};
use skill_advisor_system_progress::remaining_to_level;

/// Projection of a tracked activity at a point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiveEstimate {
    /// Whole actions completed since the baseline.
    pub actions_completed: u64,
    /// Projected cumulative XP.
    pub xp_estimate: f64,
    /// Actions still remaining toward the target.
    pub actions_remaining: u64,
    /// Time still remaining toward the target.
    pub time_remaining: Duration,
}

/// One tracked activity: the active item, the target, and the baseline.
#[derive(Clone, Debug, PartialEq)]
struct TrackedActivity {
    item: ItemId,
    target_level: Level,
    snapshot: ExtrapolationSnapshot,
}

/// Real-time extrapolator over the set of tracked activities.
#[derive(Debug, Default)]
pub struct Extrapolator {
    tracked: HashMap<SkillId, TrackedActivity>,
}

impl Extrapolator {
    /// Creates an extrapolator with no tracked activities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking an activity, establishing its first baseline from
    /// the provided telemetry values.
    #[allow(clippy::too_many_arguments)]
    pub fn track(
        &mut self,
        table: &LevelTable,
        skill: SkillId,
        item: ItemId,
        target_level: Level,
        current_xp: f64,
        xp_per_action: f64,
        action_time: Duration,
        now: Timestamp,
    ) -> Result<(), InvalidCraftSpecError> {
        if !(xp_per_action > 0.0) {
            return Err(InvalidCraftSpecError::NonPositiveXp {
                value: xp_per_action,
            });
        }
        if action_time.is_zero() {
            return Err(InvalidCraftSpecError::NonPositiveTime);
        }

        let snapshot = baseline(
            table,
            current_xp,
            target_level,
            xp_per_action,
            action_time,
            now,
        );
        let _ = self.tracked.insert(
            skill,
            TrackedActivity {
                item,
                target_level,
                snapshot,
            },
        );
        Ok(())
    }

    /// Stops tracking the skill's activity.
    pub fn untrack(&mut self, skill: &SkillId) {
        let _ = self.tracked.remove(skill);
    }

    /// Reports whether no activity is currently tracked.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Item recorded for the skill's tracked activity, if any.
    #[must_use]
    pub fn tracked_item(&self, skill: &SkillId) -> Option<&ItemId> {
        self.tracked.get(skill).map(|activity| &activity.item)
    }

    /// Projects the skill's tracked activity at the provided time.
    #[must_use]
    pub fn query(&self, skill: &SkillId, now: Timestamp) -> Option<LiveEstimate> {
        self.tracked
            .get(skill)
            .map(|activity| project(&activity.snapshot, now))
    }

    /// Resynchronizes the skill's baseline from fresh telemetry.
    ///
    /// The baseline is replaced wholesale only when the reported XP
    /// strictly exceeds the XP the current baseline already implies at
    /// `now`; anything else is stale or redundant and leaves the snapshot
    /// untouched. Returns whether a resynchronization happened.
    pub fn ingest(
        &mut self,
        table: &LevelTable,
        skill: &SkillId,
        telemetry_xp: f64,
        now: Timestamp,
    ) -> bool {
        let Some(activity) = self.tracked.get_mut(skill) else {
            return false;
        };

        let implied = project(&activity.snapshot, now).xp_estimate;
        if telemetry_xp <= implied {
            return false;
        }

        activity.snapshot = baseline(
            table,
            telemetry_xp,
            activity.target_level,
            activity.snapshot.xp_per_action,
            activity.snapshot.action_time,
            now,
        );
        true
    }
}

fn baseline(
    table: &LevelTable,
    current_xp: f64,
    target_level: Level,
    xp_per_action: f64,
    action_time: Duration,
    now: Timestamp,
) -> ExtrapolationSnapshot {
    let estimate = remaining_to_level(table, current_xp, target_level, xp_per_action, action_time);
    ExtrapolationSnapshot {
        timer_start: now,
        initial_xp: current_xp,
        initial_actions_remaining: estimate.actions_needed,
        initial_time_remaining: estimate.time_needed,
        action_time,
        xp_per_action,
    }
}

fn project(snapshot: &ExtrapolationSnapshot, now: Timestamp) -> LiveEstimate {
    let elapsed = now.saturating_duration_since(snapshot.timer_start);
    let actions_completed =
        (elapsed.as_secs_f64() / snapshot.action_time.as_secs_f64()).floor() as u64;

    LiveEstimate {
        actions_completed,
        xp_estimate: snapshot.initial_xp + actions_completed as f64 * snapshot.xp_per_action,
        actions_remaining: snapshot
            .initial_actions_remaining
            .saturating_sub(actions_completed),
        time_remaining: snapshot.initial_time_remaining.saturating_sub(elapsed),
    }
}
