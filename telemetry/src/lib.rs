#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative store of observed game state for the skill advisor.
//!
//! The ledger holds the latest skill XP snapshots, the craft spec store,
//! and the detected activity. Collaborators mutate it exclusively through
//! [`apply`], which resolves overlapping observations with
//! last-applied-wins semantics per key and broadcasts [`Event`] values
//! describing what changed. Callers serialize ingestion through their own
//! event loop; the ledger itself never suspends or locks.

use std::collections::HashMap;

use skill_advisor_core::{
    Command, CraftItemSpec, CraftKey, CraftSpecEntry, Event, ItemId, SkillId, SkillSnapshot,
};

/// Observed-state ledger driven by telemetry commands.
#[derive(Debug, Default)]
pub struct TelemetryLedger {
    skills: HashMap<SkillId, SkillSnapshot>,
    specs: HashMap<CraftKey, CraftSpecEntry>,
    activity: Option<(SkillId, ItemId)>,
}

impl TelemetryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Executes a command against the ledger, pushing resulting events into
/// the provided buffer.
pub fn apply(ledger: &mut TelemetryLedger, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ObserveSkillXp { skill, xp, at } => {
            let snapshot = SkillSnapshot {
                skill: skill.clone(),
                current_xp: xp,
                observed_at: at,
            };
            let _ = ledger.skills.insert(skill.clone(), snapshot);
            out_events.push(Event::SkillXpUpdated { skill, xp });
        }
        Command::ObserveCraftCost { entry } => {
            let key = CraftKey::new(entry.spec.skill.clone(), entry.spec.item.clone());
            let _ = ledger.specs.insert(key.clone(), entry);
            out_events.push(Event::CraftSpecRecorded { key });
        }
        Command::DetectActivity { skill, item } => {
            ledger.activity = Some((skill.clone(), item.clone()));
            out_events.push(Event::ActivityDetected { skill, item });
        }
        Command::ClearCraftSpecs => {
            let entries_removed = ledger.specs.len();
            ledger.specs.clear();
            out_events.push(Event::CraftSpecsCleared { entries_removed });
        }
    }
}

/// Read-only queries over the ledger.
pub mod query {
    use super::TelemetryLedger;
    use skill_advisor_core::{
        CraftItemSpec, CraftKey, CraftSpecEntry, ItemId, SkillId, SkillSnapshot,
    };

    /// Latest XP snapshot recorded for the skill, if any.
    #[must_use]
    pub fn skill_snapshot<'a>(
        ledger: &'a TelemetryLedger,
        skill: &SkillId,
    ) -> Option<&'a SkillSnapshot> {
        ledger.skills.get(skill)
    }

    /// Raw spec entry recorded for the key, regardless of whether its
    /// costs have been collected yet.
    #[must_use]
    pub fn spec_entry<'a>(
        ledger: &'a TelemetryLedger,
        key: &CraftKey,
    ) -> Option<&'a CraftSpecEntry> {
        ledger.specs.get(key)
    }

    /// Spec usable for planning: present with positive per-action costs.
    ///
    /// An entry whose costs are still zero has not been collected and is
    /// indistinguishable from an absent one here.
    #[must_use]
    pub fn usable_spec<'a>(
        ledger: &'a TelemetryLedger,
        key: &CraftKey,
    ) -> Option<&'a CraftItemSpec> {
        ledger
            .specs
            .get(key)
            .map(|entry| &entry.spec)
            .filter(|spec| spec.is_collected())
    }

    /// Skill and item the player was last detected training, if any.
    #[must_use]
    pub fn active_activity(ledger: &TelemetryLedger) -> Option<(&SkillId, &ItemId)> {
        ledger
            .activity
            .as_ref()
            .map(|(skill, item)| (skill, item))
    }

    /// Every recorded spec entry in deterministic key order, for the
    /// persistence adapter.
    #[must_use]
    pub fn spec_entries(ledger: &TelemetryLedger) -> Vec<(&CraftKey, &CraftSpecEntry)> {
        let mut entries: Vec<_> = ledger.specs.iter().collect();
        entries.sort_by(|(left, _), (right, _)| left.cmp(right));
        entries
    }

    /// Number of recorded spec entries.
    #[must_use]
    pub fn spec_count(ledger: &TelemetryLedger) -> usize {
        ledger.specs.len()
    }
}
