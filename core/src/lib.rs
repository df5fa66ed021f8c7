#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the skill-advisor workspace.
//!
//! This crate defines the message surface that connects the telemetry
//! collaborators, the authoritative ledger, and pure systems. Collaborators
//! submit [`Command`] values describing observed game state, the ledger
//! executes those commands via its `apply` entry point, and then broadcasts
//! [`Event`] values for consumers to react to. Systems consume immutable
//! snapshots and views and respond exclusively with plan or progress values.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest level a skill can reach.
pub const MAX_LEVEL: Level = Level::new(99);

/// Name of a trainable skill as reported by telemetry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkillId(String);

impl SkillId {
    /// Creates a new skill identifier from the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the skill name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a craftable item as reported by telemetry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Creates a new item identifier from the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the item name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite key addressing a craft spec by skill and item.
///
/// Replaces separator-joined string keys so item names containing the
/// separator character cannot collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CraftKey {
    skill: SkillId,
    item: ItemId,
}

impl CraftKey {
    /// Creates a key for the provided skill and item pair.
    #[must_use]
    pub fn new(skill: SkillId, item: ItemId) -> Self {
        Self { skill, item }
    }

    /// Skill component of the key.
    #[must_use]
    pub fn skill(&self) -> &SkillId {
        &self.skill
    }

    /// Item component of the key.
    #[must_use]
    pub fn item(&self) -> &ItemId {
        &self.item
    }
}

/// Skill level expressed as a whole number between 1 and [`MAX_LEVEL`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Level(u32);

impl Level {
    /// Creates a new level wrapper with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying numeric level.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point in time expressed as whole milliseconds since the Unix epoch.
///
/// Systems never read a clock; callers supply timestamps so every
/// computation stays a pure function of its inputs.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Retrieves the timestamp as milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Duration elapsed since an earlier timestamp, or zero if `earlier`
    /// is actually later.
    #[must_use]
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// Timestamp advanced by the provided duration, truncated to whole
    /// milliseconds.
    #[must_use]
    pub fn saturating_add(&self, duration: Duration) -> Timestamp {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

/// Monotonic mapping from level to the cumulative XP required to hold it.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelTable {
    thresholds: Vec<f64>,
}

impl LevelTable {
    /// Generates the conventional 99-level curve used by idle progression
    /// games: each level adds `floor(level + 300 * 2^(level / 7)) / 4`
    /// experience points, accumulated with integer truncation.
    #[must_use]
    pub fn standard() -> Self {
        let mut thresholds = Vec::with_capacity(MAX_LEVEL.get() as usize);
        thresholds.push(0.0);
        let mut accumulated = 0_u64;
        for level in 1..u64::from(MAX_LEVEL.get()) {
            let increment = (level as f64 + 300.0 * 2_f64.powf(level as f64 / 7.0)).floor();
            accumulated += increment as u64;
            thresholds.push((accumulated / 4) as f64);
        }
        Self { thresholds }
    }

    /// Builds a table from explicit thresholds where index `i` holds the
    /// cumulative XP required for level `i + 1`.
    ///
    /// The first threshold must be zero and the sequence must be strictly
    /// increasing.
    pub fn from_thresholds(thresholds: Vec<f64>) -> Result<Self, LevelTableError> {
        let Some(&first) = thresholds.first() else {
            return Err(LevelTableError::Empty);
        };
        if first != 0.0 {
            return Err(LevelTableError::FirstThresholdNotZero { found: first });
        }
        for (index, window) in thresholds.windows(2).enumerate() {
            if window[1] <= window[0] {
                return Err(LevelTableError::NotStrictlyIncreasing {
                    level: index as u32 + 2,
                });
            }
        }
        Ok(Self { thresholds })
    }

    /// Highest level described by the table.
    #[must_use]
    pub fn max_level(&self) -> Level {
        Level::new(self.thresholds.len() as u32)
    }

    /// Greatest level whose threshold does not exceed the provided XP.
    ///
    /// XP below the first threshold resolves to level 1 and XP beyond the
    /// final threshold resolves to the table's maximum level.
    #[must_use]
    pub fn level_for_xp(&self, xp: f64) -> Level {
        let index = self.thresholds.partition_point(|&threshold| threshold <= xp);
        Level::new(index.max(1) as u32)
    }

    /// Cumulative XP required to hold the provided level.
    ///
    /// Level 1 and levels outside the table resolve to zero.
    #[must_use]
    pub fn xp_for_level(&self, level: Level) -> f64 {
        let Some(index) = (level.get() as usize).checked_sub(1) else {
            return 0.0;
        };
        self.thresholds.get(index).copied().unwrap_or(0.0)
    }

    /// Reports whether the provided level exists within the table.
    #[must_use]
    pub fn contains(&self, level: Level) -> bool {
        level.get() >= 1 && level.get() <= self.max_level().get()
    }
}

/// Latest XP observation for a single skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillSnapshot {
    /// Skill the snapshot describes.
    pub skill: SkillId,
    /// Cumulative XP reported by the most recent telemetry.
    pub current_xp: f64,
    /// Moment the observation was reported.
    pub observed_at: Timestamp,
}

/// Single ingredient consumed by one craft of an item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    /// Ingredient item.
    pub item: ItemId,
    /// Units consumed per craft. Always at least one on a valid spec.
    pub quantity_per_craft: u32,
    /// Units the player held when the recipe was observed, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u64>,
}

/// Observed per-action cost and recipe of a craftable item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CraftItemSpec {
    /// Skill trained by crafting the item.
    pub skill: SkillId,
    /// Item produced by each craft.
    pub item: ItemId,
    /// XP granted per craft.
    pub xp_per_action: f64,
    /// Time consumed per craft.
    pub time_per_action: Duration,
    /// Ingredients consumed per craft, in observed order.
    pub requirements: Vec<MaterialRequirement>,
}

impl CraftItemSpec {
    /// Reports whether telemetry has populated the per-action costs.
    ///
    /// Zero costs mean the observation has not been collected yet; such a
    /// spec is indistinguishable from an absent one for planning.
    #[must_use]
    pub fn is_collected(&self) -> bool {
        self.xp_per_action > 0.0 && !self.time_per_action.is_zero()
    }

    /// Validates that every cost field supports planning arithmetic.
    pub fn validate(&self) -> Result<(), InvalidCraftSpecError> {
        if !(self.xp_per_action > 0.0) {
            return Err(InvalidCraftSpecError::NonPositiveXp {
                value: self.xp_per_action,
            });
        }
        if self.time_per_action.is_zero() {
            return Err(InvalidCraftSpecError::NonPositiveTime);
        }
        for requirement in &self.requirements {
            if requirement.quantity_per_craft == 0 {
                return Err(InvalidCraftSpecError::ZeroQuantity {
                    material: requirement.item.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Craft spec paired with the moment it was observed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CraftSpecEntry {
    /// Observed cost and recipe.
    pub spec: CraftItemSpec,
    /// Moment the observation was reported.
    pub observed_at: Timestamp,
}

/// Quantity of a single item consumed by a plan step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialLine {
    /// Item consumed.
    pub item: ItemId,
    /// Total units consumed.
    pub quantity: u64,
}

/// One crafted item within a [`CraftPlan`], with its cumulative effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CraftPlanStep {
    /// Item produced by the step.
    pub item: ItemId,
    /// Number of crafts performed.
    pub craft_count: u64,
    /// XP granted by the step as a whole.
    pub xp_gained: f64,
    /// Time consumed by the step as a whole.
    pub time_spent: Duration,
    /// Level held when the step begins.
    pub start_level: Level,
    /// Level held when the step completes.
    pub end_level: Level,
    /// Ingredients consumed by the step, scaled to its craft count.
    pub requirements: Vec<MaterialLine>,
}

/// Ordered crafting plan reaching a requested XP delta.
///
/// The plan never undershoots: the step XP always sums to at least the
/// delta it was computed for. An empty plan means the target was already
/// reached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CraftPlan {
    /// Steps in execution order, materials before the final item.
    pub steps: Vec<CraftPlanStep>,
    /// Total time across all steps.
    pub total_time: Duration,
    /// Total craft count across all steps.
    pub total_crafts: u64,
    /// Total XP granted across all steps.
    pub xp_gained: f64,
    /// Items produced by one step and consumed by another.
    pub intermediate_items: Vec<ItemId>,
    /// Ingredients not produced by any step, merged by item.
    pub raw_materials: Vec<MaterialLine>,
}

impl CraftPlan {
    /// The empty plan produced when the target is already reached.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            steps: Vec::new(),
            total_time: Duration::ZERO,
            total_crafts: 0,
            xp_gained: 0.0,
            intermediate_items: Vec::new(),
            raw_materials: Vec::new(),
        }
    }

    /// Reports whether the plan carries no work because the target was
    /// already reached when it was requested.
    #[must_use]
    pub fn already_at_target(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Live progress summary for display surfaces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressView {
    /// Level currently held.
    pub current_level: Level,
    /// Next level to reach, equal to the current level at the cap.
    pub next_level: Level,
    /// Cumulative XP currently held.
    pub current_xp: f64,
    /// Cumulative XP required for the next level.
    pub xp_for_next: f64,
    /// XP still missing toward the next level.
    pub xp_needed: f64,
    /// Whole actions required to close the XP gap.
    pub actions_needed: u64,
    /// Time required to perform the missing actions.
    pub time_needed: Duration,
    /// Percentage progress through the current level, clamped to 0..=100.
    pub percentage: f64,
}

/// Baseline used to project XP between telemetry updates.
///
/// Snapshots are replaced wholesale on resynchronization and never
/// partially mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtrapolationSnapshot {
    /// Moment the baseline was established.
    pub timer_start: Timestamp,
    /// Cumulative XP at the baseline.
    pub initial_xp: f64,
    /// Actions remaining toward the target at the baseline.
    pub initial_actions_remaining: u64,
    /// Time remaining toward the target at the baseline.
    pub initial_time_remaining: Duration,
    /// Time consumed per action.
    pub action_time: Duration,
    /// XP granted per action.
    pub xp_per_action: f64,
}

/// Commands that express all permissible ledger mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the XP snapshot for a skill with a fresh observation.
    ObserveSkillXp {
        /// Skill the observation describes.
        skill: SkillId,
        /// Cumulative XP reported by telemetry.
        xp: f64,
        /// Moment the observation was reported.
        at: Timestamp,
    },
    /// Records an observed craft cost and recipe, overwriting any prior
    /// entry for the same skill and item.
    ObserveCraftCost {
        /// Observation to record.
        entry: CraftSpecEntry,
    },
    /// Announces which skill and item the player is actively training.
    DetectActivity {
        /// Skill being trained.
        skill: SkillId,
        /// Item being crafted.
        item: ItemId,
    },
    /// Removes every recorded craft spec. Entries never expire on their
    /// own; this is the operator's explicit reset.
    ClearCraftSpecs,
}

/// Events broadcast by the ledger after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a skill's XP snapshot was replaced.
    SkillXpUpdated {
        /// Skill whose snapshot changed.
        skill: SkillId,
        /// Cumulative XP now recorded for the skill.
        xp: f64,
    },
    /// Confirms that a craft spec observation was recorded.
    CraftSpecRecorded {
        /// Key of the recorded entry.
        key: CraftKey,
    },
    /// Announces the actively trained skill and item.
    ActivityDetected {
        /// Skill being trained.
        skill: SkillId,
        /// Item being crafted.
        item: ItemId,
    },
    /// Confirms that the craft spec store was cleared.
    CraftSpecsCleared {
        /// Number of entries removed.
        entries_removed: usize,
    },
}

/// Reasons a level table cannot be constructed from raw thresholds.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LevelTableError {
    /// No thresholds were provided.
    #[error("level table requires at least one threshold")]
    Empty,
    /// The level-1 threshold must be zero.
    #[error("level 1 threshold must be zero, found {found}")]
    FirstThresholdNotZero {
        /// Threshold found at the first position.
        found: f64,
    },
    /// Thresholds must strictly increase with level.
    #[error("threshold for level {level} does not exceed its predecessor")]
    NotStrictlyIncreasing {
        /// First level whose threshold fails to increase.
        level: u32,
    },
}

/// Reasons a requested target level cannot be planned toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InvalidTargetError {
    /// The requested level lies outside the table's valid range.
    #[error("target level {requested} is outside the valid range 1..={max}")]
    OutOfRange {
        /// Level requested by the caller.
        requested: u32,
        /// Highest level the table describes.
        max: u32,
    },
    /// The requested level is not above the level already held.
    #[error("target level {requested} is not above the current level {current}")]
    NotAboveCurrent {
        /// Level requested by the caller.
        requested: u32,
        /// Level currently held.
        current: u32,
    },
}

/// Reasons a craft spec cannot support planning arithmetic.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InvalidCraftSpecError {
    /// XP per action must be positive for action counts to be defined.
    #[error("xp per action must be positive, got {value}")]
    NonPositiveXp {
        /// Value supplied by the caller.
        value: f64,
    },
    /// Time per action must be positive for time estimates to be defined.
    #[error("time per action must be positive")]
    NonPositiveTime,
    /// Every recipe line must consume at least one unit per craft.
    #[error("recipe quantity for {material} must be positive")]
    ZeroQuantity {
        /// Material whose quantity was zero.
        material: ItemId,
    },
}

/// No usable craft data exists for a required item.
///
/// Recoverable: the caller is expected to request the missing observation
/// and retry once it arrives.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("no usable crafting data for {item} in {skill}")]
pub struct MissingSpecError {
    /// Skill the lookup was scoped to.
    pub skill: SkillId,
    /// Item whose data is missing.
    pub item: ItemId,
}

/// Umbrella error for operations spanning the full advisor taxonomy.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AdvisorError {
    /// The requested target level was rejected.
    #[error(transparent)]
    InvalidTarget(#[from] InvalidTargetError),
    /// A craft spec engaged by the computation was unusable.
    #[error(transparent)]
    InvalidCraftSpec(#[from] InvalidCraftSpecError),
    /// Required craft data has not been observed yet.
    #[error(transparent)]
    MissingSpec(#[from] MissingSpecError),
}

#[cfg(test)]
mod tests {
    use super::{
        CraftItemSpec, CraftKey, InvalidCraftSpecError, ItemId, Level, LevelTable,
        LevelTableError, MaterialLine, MaterialRequirement, SkillId, Timestamp, MAX_LEVEL,
    };
    use serde::{de::DeserializeOwned, Serialize};
    use std::time::Duration;

    fn fixture_table() -> LevelTable {
        LevelTable::from_thresholds(vec![0.0, 84.0, 200.0]).expect("valid fixture table")
    }

    #[test]
    fn standard_table_matches_conventional_curve() {
        let table = LevelTable::standard();
        assert_eq!(table.max_level(), MAX_LEVEL);
        assert_eq!(table.xp_for_level(Level::new(1)), 0.0);
        assert_eq!(table.xp_for_level(Level::new(2)), 83.0);
        assert_eq!(table.xp_for_level(MAX_LEVEL), 13_034_431.0);
    }

    #[test]
    fn level_lookup_is_inverse_of_threshold_lookup() {
        let table = LevelTable::standard();
        for xp in [0.0, 82.0, 83.0, 10_000.0, 13_034_431.0, 200_000_000.0] {
            let level = table.level_for_xp(xp);
            assert!(
                table.xp_for_level(level) <= xp,
                "threshold for level {level} must not exceed xp {xp}"
            );
            if level.get() < MAX_LEVEL.get() {
                let next = Level::new(level.get() + 1);
                assert!(xp < table.xp_for_level(next));
            }
        }
    }

    #[test]
    fn level_for_xp_floors_at_level_one() {
        let table = fixture_table();
        assert_eq!(table.level_for_xp(-5.0), Level::new(1));
        assert_eq!(table.level_for_xp(0.0), Level::new(1));
    }

    #[test]
    fn level_for_xp_caps_at_max_level() {
        let table = fixture_table();
        assert_eq!(table.level_for_xp(10_000.0), Level::new(3));
    }

    #[test]
    fn xp_for_level_defaults_to_zero_outside_table() {
        let table = fixture_table();
        assert_eq!(table.xp_for_level(Level::new(0)), 0.0);
        assert_eq!(table.xp_for_level(Level::new(40)), 0.0);
    }

    #[test]
    fn non_monotonic_thresholds_are_rejected() {
        let result = LevelTable::from_thresholds(vec![0.0, 84.0, 84.0]);
        assert_eq!(
            result.expect_err("equal thresholds must be rejected"),
            LevelTableError::NotStrictlyIncreasing { level: 3 }
        );
    }

    #[test]
    fn nonzero_first_threshold_is_rejected() {
        let result = LevelTable::from_thresholds(vec![10.0, 84.0]);
        assert_eq!(
            result.expect_err("first threshold must be zero"),
            LevelTableError::FirstThresholdNotZero { found: 10.0 }
        );
    }

    #[test]
    fn zero_cost_spec_counts_as_not_collected() {
        let spec = CraftItemSpec {
            skill: SkillId::new("smithing"),
            item: ItemId::new("iron bar"),
            xp_per_action: 0.0,
            time_per_action: Duration::from_secs(2),
            requirements: Vec::new(),
        };
        assert!(!spec.is_collected());
        assert_eq!(
            spec.validate().expect_err("zero xp must fail validation"),
            InvalidCraftSpecError::NonPositiveXp { value: 0.0 }
        );
    }

    #[test]
    fn zero_quantity_requirement_fails_validation() {
        let spec = CraftItemSpec {
            skill: SkillId::new("smithing"),
            item: ItemId::new("iron bar"),
            xp_per_action: 12.0,
            time_per_action: Duration::from_secs(2),
            requirements: vec![MaterialRequirement {
                item: ItemId::new("iron ore"),
                quantity_per_craft: 0,
                available: None,
            }],
        };
        assert_eq!(
            spec.validate().expect_err("zero quantity must fail"),
            InvalidCraftSpecError::ZeroQuantity {
                material: ItemId::new("iron ore"),
            }
        );
    }

    #[test]
    fn timestamp_arithmetic_saturates() {
        let earlier = Timestamp::from_millis(1_000);
        let later = Timestamp::from_millis(3_500);
        assert_eq!(
            later.saturating_duration_since(earlier),
            Duration::from_millis(2_500)
        );
        assert_eq!(earlier.saturating_duration_since(later), Duration::ZERO);
        assert_eq!(
            earlier.saturating_add(Duration::from_millis(250)),
            Timestamp::from_millis(1_250)
        );
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn craft_key_round_trips_through_bincode() {
        let key = CraftKey::new(SkillId::new("fletching"), ItemId::new("maple longbow"));
        assert_round_trip(&key);
    }

    #[test]
    fn material_line_round_trips_through_bincode() {
        let line = MaterialLine {
            item: ItemId::new("maple logs"),
            quantity: 420,
        };
        assert_round_trip(&line);
    }

    #[test]
    fn timestamp_round_trips_through_bincode() {
        assert_round_trip(&Timestamp::from_millis(1_700_000_000_000));
    }
}
