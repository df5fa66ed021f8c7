#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes minimum-overshoot crafting plans.
//!
//! Given the XP delta to a target level, the final item's observed costs
//! and optionally one intermediate material tier, the planner enumerates
//! craft-count combinations and keeps the one wasting the least XP,
//! breaking ties by total time. The enumeration range is bounded by
//! `ceil(delta / item_xp)` plus [`FINAL_CRAFT_MARGIN`]; the whole range is
//! examined because overshoot is not provably convex in the number of
//! final crafts for arbitrary cost ratios.

use std::collections::BTreeMap;
use std::time::Duration;

use skill_advisor_core::{
    AdvisorError, CraftItemSpec, CraftPlan, CraftPlanStep, InvalidCraftSpecError,
    InvalidTargetError, ItemId, Level, LevelTable, MaterialLine,
};
use skill_advisor_system_progress::{actions_for, time_for};

/// Extra final-craft candidates examined beyond the count that already
/// covers the delta on its own. The slack admits combinations that finish
/// the last stretch with materials alone instead of one more full item.
pub const FINAL_CRAFT_MARGIN: u64 = 10;

/// Intermediate material tier engaged by a two-tier plan.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialTier {
    /// Observed costs and recipe of the material itself.
    pub spec: CraftItemSpec,
    /// Units of the material consumed by one final-item craft.
    pub quantity_per_final_craft: u32,
}

impl MaterialTier {
    /// Finds the final item's single craftable-material tier, if any.
    ///
    /// Walks the final item's recipe in observed order and returns the
    /// first ingredient the provided lookup can supply a collected spec
    /// for. Ingredients without usable specs are raw materials.
    pub fn resolve<'a, F>(final_spec: &CraftItemSpec, mut lookup: F) -> Option<Self>
    where
        F: FnMut(&ItemId) -> Option<&'a CraftItemSpec>,
    {
        final_spec.requirements.iter().find_map(|requirement| {
            lookup(&requirement.item).map(|spec| Self {
                spec: spec.clone(),
                quantity_per_final_craft: requirement.quantity_per_craft,
            })
        })
    }
}

/// Computes the crafting plan reaching `target_level` from `current_xp`.
///
/// Returns the empty "already at target" plan when no XP is missing.
/// Specs engaged by the computation must carry positive costs.
pub fn plan_to_target(
    table: &LevelTable,
    current_xp: f64,
    target_level: Level,
    final_spec: &CraftItemSpec,
    material: Option<&MaterialTier>,
) -> Result<CraftPlan, AdvisorError> {
    if !table.contains(target_level) {
        return Err(InvalidTargetError::OutOfRange {
            requested: target_level.get(),
            max: table.max_level().get(),
        }
        .into());
    }

    let delta = table.xp_for_level(target_level) - current_xp;
    if delta <= 0.0 {
        return Ok(CraftPlan::empty());
    }

    final_spec.validate()?;

    let Some(tier) = material else {
        let final_crafts = actions_for(delta, final_spec.xp_per_action);
        return Ok(materialize(
            table,
            current_xp,
            target_level,
            final_spec,
            None,
            final_crafts,
        ));
    };

    tier.spec.validate()?;
    if tier.quantity_per_final_craft == 0 {
        return Err(AdvisorError::InvalidCraftSpec(
            InvalidCraftSpecError::ZeroQuantity {
                material: tier.spec.item.clone(),
            },
        ));
    }

    let selected = search_combinations(delta, final_spec, tier);
    Ok(materialize(
        table,
        current_xp,
        target_level,
        final_spec,
        Some((tier, selected.total_materials)),
        selected.final_crafts,
    ))
}

/// Enumerated craft-count combination under consideration.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    final_crafts: u64,
    total_materials: u64,
    overshoot: f64,
    total_time: Duration,
}

impl Candidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.overshoot != other.overshoot {
            return self.overshoot < other.overshoot;
        }
        self.total_time < other.total_time
    }
}

fn search_combinations(delta: f64, final_spec: &CraftItemSpec, tier: &MaterialTier) -> Candidate {
    let item_xp = final_spec.xp_per_action;
    let material_xp = tier.spec.xp_per_action;
    let quantity = u64::from(tier.quantity_per_final_craft);
    let bound = actions_for(delta, item_xp) + FINAL_CRAFT_MARGIN;

    let mut best: Option<Candidate> = None;

    for final_crafts in 1..=bound {
        let materials_for_items = final_crafts * quantity;
        let xp_so_far = materials_for_items as f64 * material_xp + final_crafts as f64 * item_xp;

        let (total_materials, total_xp) = if xp_so_far < delta {
            let extra = actions_for(delta - xp_so_far, material_xp);
            (
                materials_for_items + extra,
                xp_so_far + extra as f64 * material_xp,
            )
        } else {
            (materials_for_items, xp_so_far)
        };

        let candidate = Candidate {
            final_crafts,
            total_materials,
            overshoot: total_xp - delta,
            total_time: time_for(total_materials, tier.spec.time_per_action)
                .saturating_add(time_for(final_crafts, final_spec.time_per_action)),
        };

        match &mut best {
            Some(incumbent) => {
                if candidate.precedes(incumbent) {
                    *incumbent = candidate;
                }
            }
            None => best = Some(candidate),
        }
    }

    best.unwrap_or_else(|| {
        // Unreachable while delta and the engaged costs are positive.
        log::warn!(
            "craft search found no candidate for delta {delta}; \
             falling back to a single item-plus-material cycle"
        );
        Candidate {
            final_crafts: 1,
            total_materials: quantity,
            overshoot: quantity as f64 * material_xp + item_xp - delta,
            total_time: time_for(quantity, tier.spec.time_per_action)
                .saturating_add(final_spec.time_per_action),
        }
    })
}

fn materialize(
    table: &LevelTable,
    current_xp: f64,
    target_level: Level,
    final_spec: &CraftItemSpec,
    material: Option<(&MaterialTier, u64)>,
    final_crafts: u64,
) -> CraftPlan {
    let mut steps = Vec::new();
    let mut running_xp = current_xp;

    if let Some((tier, total_materials)) = material {
        if total_materials > 0 {
            let xp_gained = total_materials as f64 * tier.spec.xp_per_action;
            let start_level = table.level_for_xp(running_xp);
            running_xp += xp_gained;
            steps.push(CraftPlanStep {
                item: tier.spec.item.clone(),
                craft_count: total_materials,
                xp_gained,
                time_spent: time_for(total_materials, tier.spec.time_per_action),
                start_level,
                end_level: table.level_for_xp(running_xp),
                requirements: scale_requirements(&tier.spec, total_materials),
            });
        }
    }

    let xp_gained = final_crafts as f64 * final_spec.xp_per_action;
    let start_level = table.level_for_xp(running_xp);
    running_xp += xp_gained;
    // The final step may carry past the level tied to the delta; its end
    // level is capped at the level the caller actually asked for.
    let end_level = table.level_for_xp(running_xp).min(target_level);
    steps.push(CraftPlanStep {
        item: final_spec.item.clone(),
        craft_count: final_crafts,
        xp_gained,
        time_spent: time_for(final_crafts, final_spec.time_per_action),
        start_level,
        end_level,
        requirements: scale_requirements(final_spec, final_crafts),
    });

    roll_up(steps)
}

fn scale_requirements(spec: &CraftItemSpec, craft_count: u64) -> Vec<MaterialLine> {
    spec.requirements
        .iter()
        .map(|requirement| MaterialLine {
            item: requirement.item.clone(),
            quantity: u64::from(requirement.quantity_per_craft) * craft_count,
        })
        .collect()
}

fn roll_up(steps: Vec<CraftPlanStep>) -> CraftPlan {
    let mut total_time = Duration::ZERO;
    let mut total_crafts = 0_u64;
    let mut xp_gained = 0.0;
    let mut intermediate_items: Vec<ItemId> = Vec::new();
    let mut raw_materials: BTreeMap<ItemId, u64> = BTreeMap::new();

    for step in &steps {
        total_time = total_time.saturating_add(step.time_spent);
        total_crafts += step.craft_count;
        xp_gained += step.xp_gained;
    }

    for step in &steps {
        for line in &step.requirements {
            let produced_in_plan = steps.iter().any(|other| other.item == line.item);
            if produced_in_plan {
                if !intermediate_items.contains(&line.item) {
                    intermediate_items.push(line.item.clone());
                }
            } else {
                *raw_materials.entry(line.item.clone()).or_insert(0) += line.quantity;
            }
        }
    }

    CraftPlan {
        steps,
        total_time,
        total_crafts,
        xp_gained,
        intermediate_items,
        raw_materials: raw_materials
            .into_iter()
            .map(|(item, quantity)| MaterialLine { item, quantity })
            .collect(),
    }
}
