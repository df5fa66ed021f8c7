//! Plain-text rendering of plans and progress views.

use std::fmt::Write as _;
use std::time::Duration;

use skill_advisor_core::{CraftPlan, ProgressView};

/// Formats a duration as hours, minutes and seconds, dropping leading
/// zero components.
pub(crate) fn fmt_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Renders a crafting plan, with an availability note for raw materials
/// the provided lookup knows the player's stock of.
pub(crate) fn render_plan<F>(plan: &CraftPlan, mut available: F) -> String
where
    F: FnMut(&str) -> Option<u64>,
{
    if plan.already_at_target() {
        return "Already at target level.".to_owned();
    }

    let mut out = String::new();
    for step in &plan.steps {
        let _ = writeln!(
            out,
            "craft {} x{} ({} XP, {}, level {} -> {})",
            step.item,
            step.craft_count,
            step.xp_gained,
            fmt_duration(step.time_spent),
            step.start_level,
            step.end_level,
        );
    }

    let _ = writeln!(
        out,
        "total: {} crafts, {} XP, {}",
        plan.total_crafts,
        plan.xp_gained,
        fmt_duration(plan.total_time),
    );

    if !plan.intermediate_items.is_empty() {
        let names: Vec<&str> = plan
            .intermediate_items
            .iter()
            .map(|item| item.as_str())
            .collect();
        let _ = writeln!(out, "intermediates: {}", names.join(", "));
    }

    if !plan.raw_materials.is_empty() {
        let _ = writeln!(out, "raw materials:");
        for line in &plan.raw_materials {
            match available(line.item.as_str()) {
                Some(stock) if stock < line.quantity => {
                    let _ = writeln!(
                        out,
                        "  {} x{} (have {}, short {})",
                        line.item,
                        line.quantity,
                        stock,
                        line.quantity - stock,
                    );
                }
                Some(stock) => {
                    let _ = writeln!(out, "  {} x{} (have {})", line.item, line.quantity, stock);
                }
                None => {
                    let _ = writeln!(out, "  {} x{}", line.item, line.quantity);
                }
            }
        }
    }

    out
}

/// Renders a live progress view.
pub(crate) fn render_progress(view: &ProgressView) -> String {
    if view.current_level >= view.next_level {
        return format!("level {} (max) - 100%", view.current_level);
    }

    format!(
        "level {} -> {} ({:.1}%): {} XP needed, {} actions, {}",
        view.current_level,
        view.next_level,
        view.percentage,
        view.xp_needed,
        view.actions_needed,
        fmt_duration(view.time_needed),
    )
}

#[cfg(test)]
mod tests {
    use super::{fmt_duration, render_plan};
    use skill_advisor_core::{CraftPlan, CraftPlanStep, ItemId, Level, MaterialLine};
    use std::time::Duration;

    #[test]
    fn durations_render_without_leading_zero_components() {
        assert_eq!(fmt_duration(Duration::from_secs(42)), "42s");
        assert_eq!(fmt_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(fmt_duration(Duration::from_secs(3_725)), "1h 2m 5s");
    }

    #[test]
    fn empty_plan_renders_the_terminal_state() {
        let plan = CraftPlan::empty();
        assert_eq!(render_plan(&plan, |_| None), "Already at target level.");
    }

    #[test]
    fn shortfall_is_reported_when_stock_is_known() {
        let plan = CraftPlan {
            steps: vec![CraftPlanStep {
                item: ItemId::new("iron bar"),
                craft_count: 10,
                xp_gained: 125.0,
                time_spent: Duration::from_secs(30),
                start_level: Level::new(1),
                end_level: Level::new(2),
                requirements: vec![MaterialLine {
                    item: ItemId::new("iron ore"),
                    quantity: 20,
                }],
            }],
            total_time: Duration::from_secs(30),
            total_crafts: 10,
            xp_gained: 125.0,
            intermediate_items: Vec::new(),
            raw_materials: vec![MaterialLine {
                item: ItemId::new("iron ore"),
                quantity: 20,
            }],
        };

        let rendered = render_plan(&plan, |name| (name == "iron ore").then_some(8));
        assert!(rendered.contains("iron ore x20 (have 8, short 12)"));
    }
}
