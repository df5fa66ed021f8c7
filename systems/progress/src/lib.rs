#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure progression model over the level threshold table.
//!
//! Every function here is a synchronous function of its inputs; callers
//! supply the table, the observed XP, and the per-action costs taken from
//! a collected craft spec.

use std::time::Duration;

use skill_advisor_core::{
    AdvisorError, InvalidCraftSpecError, InvalidTargetError, Level, LevelTable, ProgressView,
};

/// Actions and time still required to reach a target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetEstimate {
    /// XP still missing toward the target.
    pub xp_needed: f64,
    /// Whole actions required to close the XP gap.
    pub actions_needed: u64,
    /// Time required to perform those actions.
    pub time_needed: Duration,
}

/// Summarizes progress through the current level toward the next one.
///
/// At the level cap the view reports 100% with zero remaining work; the
/// thresholds on both sides of the cap are equal, so the percentage is
/// fixed rather than computed.
pub fn progress_to_next(
    table: &LevelTable,
    current_xp: f64,
    xp_per_action: f64,
    action_time: Duration,
) -> Result<ProgressView, InvalidCraftSpecError> {
    validate_costs(xp_per_action, action_time)?;

    let current_level = table.level_for_xp(current_xp);
    let max_level = table.max_level();

    if current_level >= max_level {
        return Ok(ProgressView {
            current_level,
            next_level: max_level,
            current_xp,
            xp_for_next: table.xp_for_level(max_level),
            xp_needed: 0.0,
            actions_needed: 0,
            time_needed: Duration::ZERO,
            percentage: 100.0,
        });
    }

    let next_level = Level::new(current_level.get() + 1);
    let floor_xp = table.xp_for_level(current_level);
    let xp_for_next = table.xp_for_level(next_level);
    let xp_needed = xp_for_next - current_xp;
    let actions_needed = actions_for(xp_needed, xp_per_action);
    let percentage = ((current_xp - floor_xp) / (xp_for_next - floor_xp) * 100.0).clamp(0.0, 100.0);

    Ok(ProgressView {
        current_level,
        next_level,
        current_xp,
        xp_for_next,
        xp_needed,
        actions_needed,
        time_needed: time_for(actions_needed, action_time),
        percentage,
    })
}

/// Estimates the actions and time required to reach an explicit target
/// level.
///
/// The target must lie within the table and strictly above the level the
/// provided XP already grants.
pub fn progress_to_target(
    table: &LevelTable,
    current_xp: f64,
    target_level: Level,
    xp_per_action: f64,
    action_time: Duration,
) -> Result<TargetEstimate, AdvisorError> {
    validate_costs(xp_per_action, action_time)?;
    validate_target(table, current_xp, target_level)?;
    Ok(remaining_to_level(
        table,
        current_xp,
        target_level,
        xp_per_action,
        action_time,
    ))
}

/// Rejects targets outside the table or not above the current level.
pub fn validate_target(
    table: &LevelTable,
    current_xp: f64,
    target_level: Level,
) -> Result<(), InvalidTargetError> {
    if !table.contains(target_level) {
        return Err(InvalidTargetError::OutOfRange {
            requested: target_level.get(),
            max: table.max_level().get(),
        });
    }
    let current_level = table.level_for_xp(current_xp);
    if target_level <= current_level {
        return Err(InvalidTargetError::NotAboveCurrent {
            requested: target_level.get(),
            current: current_level.get(),
        });
    }
    Ok(())
}

/// Remaining work toward a target with already-reached targets resolving
/// to zero rather than an error.
///
/// Used by the extrapolator's resynchronization, where the target may have
/// been passed between telemetry updates. Costs must be positive.
#[must_use]
pub fn remaining_to_level(
    table: &LevelTable,
    current_xp: f64,
    target_level: Level,
    xp_per_action: f64,
    action_time: Duration,
) -> TargetEstimate {
    debug_assert!(xp_per_action > 0.0, "remaining_to_level requires positive xp");
    debug_assert!(!action_time.is_zero(), "remaining_to_level requires positive time");

    let xp_needed = (table.xp_for_level(target_level) - current_xp).max(0.0);
    let actions_needed = actions_for(xp_needed, xp_per_action);
    TargetEstimate {
        xp_needed,
        actions_needed,
        time_needed: time_for(actions_needed, action_time),
    }
}

/// Whole actions required to earn the provided XP at the given rate.
#[must_use]
pub fn actions_for(xp_needed: f64, xp_per_action: f64) -> u64 {
    if xp_needed <= 0.0 {
        return 0;
    }
    (xp_needed / xp_per_action).ceil() as u64
}

/// Total time consumed by the provided number of actions.
#[must_use]
pub fn time_for(actions: u64, action_time: Duration) -> Duration {
    action_time.saturating_mul(u32::try_from(actions).unwrap_or(u32::MAX))
}

fn validate_costs(xp_per_action: f64, action_time: Duration) -> Result<(), InvalidCraftSpecError> {
    if !(xp_per_action > 0.0) {
        return Err(InvalidCraftSpecError::NonPositiveXp {
            value: xp_per_action,
        });
    }
    if action_time.is_zero() {
        return Err(InvalidCraftSpecError::NonPositiveTime);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{progress_to_next, progress_to_target, remaining_to_level};
    use skill_advisor_core::{
        AdvisorError, InvalidCraftSpecError, InvalidTargetError, Level, LevelTable,
    };
    use std::time::Duration;

    fn two_level_table() -> LevelTable {
        LevelTable::from_thresholds(vec![0.0, 84.0]).expect("valid fixture table")
    }

    #[test]
    fn target_estimate_matches_worked_example() {
        let table = two_level_table();
        let estimate = progress_to_target(
            &table,
            0.0,
            Level::new(2),
            50.0,
            Duration::from_secs(10),
        )
        .expect("valid target");

        assert_eq!(estimate.xp_needed, 84.0);
        assert_eq!(estimate.actions_needed, 2);
        assert_eq!(estimate.time_needed, Duration::from_secs(20));
    }

    #[test]
    fn progress_to_next_reports_ceil_actions_and_scaled_time() {
        let table = two_level_table();
        let view = progress_to_next(&table, 42.0, 50.0, Duration::from_secs(10))
            .expect("costs are valid");

        assert_eq!(view.current_level, Level::new(1));
        assert_eq!(view.next_level, Level::new(2));
        assert_eq!(view.xp_needed, 42.0);
        assert_eq!(view.actions_needed, 1);
        assert_eq!(view.time_needed, Duration::from_secs(10));
        assert_eq!(view.percentage, 50.0);
    }

    #[test]
    fn max_level_progress_is_terminal_without_division() {
        let table = two_level_table();
        let view = progress_to_next(&table, 84.0, 50.0, Duration::from_secs(10))
            .expect("costs are valid");

        assert_eq!(view.current_level, Level::new(2));
        assert_eq!(view.next_level, Level::new(2));
        assert_eq!(view.xp_needed, 0.0);
        assert_eq!(view.actions_needed, 0);
        assert_eq!(view.time_needed, Duration::ZERO);
        assert_eq!(view.percentage, 100.0);
    }

    #[test]
    fn percentage_is_clamped_for_display() {
        let table = two_level_table();
        let view = progress_to_next(&table, -10.0, 50.0, Duration::from_secs(10))
            .expect("costs are valid");
        assert_eq!(view.percentage, 0.0);
    }

    #[test]
    fn non_positive_costs_are_rejected() {
        let table = two_level_table();
        let error = progress_to_next(&table, 0.0, 0.0, Duration::from_secs(10))
            .expect_err("zero xp per action is undefined");
        assert_eq!(error, InvalidCraftSpecError::NonPositiveXp { value: 0.0 });

        let error = progress_to_next(&table, 0.0, 50.0, Duration::ZERO)
            .expect_err("zero action time is undefined");
        assert_eq!(error, InvalidCraftSpecError::NonPositiveTime);
    }

    #[test]
    fn out_of_range_target_is_rejected() {
        let table = two_level_table();
        let error = progress_to_target(&table, 0.0, Level::new(5), 50.0, Duration::from_secs(10))
            .expect_err("level 5 is beyond the fixture table");
        assert_eq!(
            error,
            AdvisorError::InvalidTarget(InvalidTargetError::OutOfRange {
                requested: 5,
                max: 2,
            })
        );
    }

    #[test]
    fn no_op_target_is_rejected() {
        let table = two_level_table();
        let error = progress_to_target(&table, 84.0, Level::new(2), 50.0, Duration::from_secs(10))
            .expect_err("already at level 2");
        assert_eq!(
            error,
            AdvisorError::InvalidTarget(InvalidTargetError::NotAboveCurrent {
                requested: 2,
                current: 2,
            })
        );
    }

    #[test]
    fn remaining_to_level_is_zero_once_target_reached() {
        let table = two_level_table();
        let estimate =
            remaining_to_level(&table, 100.0, Level::new(2), 50.0, Duration::from_secs(10));
        assert_eq!(estimate.xp_needed, 0.0);
        assert_eq!(estimate.actions_needed, 0);
        assert_eq!(estimate.time_needed, Duration::ZERO);
    }
}
