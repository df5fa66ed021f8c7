#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the skill advisor.
//!
//! Loads a persisted craft spec store, feeds observations through the
//! telemetry ledger, and runs the progression model or the crafting-path
//! planner against the observed data.

mod report;

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use skill_advisor_core::{
    Command as LedgerCommand, CraftKey, Event, ItemId, Level, LevelTable, MissingSpecError,
    SkillId, Timestamp,
};
use skill_advisor_persistence as persistence;
use skill_advisor_system_planner::{plan_to_target, MaterialTier};
use skill_advisor_system_progress::progress_to_next;
use skill_advisor_telemetry::{apply, query, TelemetryLedger};

/// Crafting-path and progression advisor for idle skill training.
#[derive(Debug, Parser)]
#[command(name = "skill-advisor", version)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Computes the minimum-overshoot crafting plan toward a target level.
    Plan {
        /// Skill to train.
        #[arg(long)]
        skill: String,
        /// Final item to craft.
        #[arg(long)]
        item: String,
        /// Target level, between 2 and 99.
        #[arg(long)]
        target: u32,
        /// Current cumulative XP in the skill.
        #[arg(long)]
        xp: f64,
        /// Path to a persisted spec store document.
        #[arg(long)]
        store: PathBuf,
    },
    /// Summarizes progress toward the next level.
    Progress {
        /// Current cumulative XP in the skill.
        #[arg(long)]
        xp: f64,
        /// XP granted per action.
        #[arg(long)]
        xp_per_action: f64,
        /// Seconds consumed per action.
        #[arg(long)]
        action_time: f64,
    },
    /// Re-encodes a persisted spec store as a clipboard export string.
    Export {
        /// Path to a persisted spec store document.
        #[arg(long)]
        store: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Plan {
            skill,
            item,
            target,
            xp,
            store,
        } => run_plan(&skill, &item, target, xp, &store),
        CliCommand::Progress {
            xp,
            xp_per_action,
            action_time,
        } => run_progress(xp, xp_per_action, action_time),
        CliCommand::Export { store } => run_export(&store),
    }
}

fn load_ledger(store: &PathBuf) -> anyhow::Result<TelemetryLedger> {
    let document = std::fs::read_to_string(store)
        .with_context(|| format!("could not read spec store {}", store.display()))?;
    let entries = persistence::decode_store(&document)?;

    let mut ledger = TelemetryLedger::new();
    let mut events: Vec<Event> = Vec::new();
    for entry in entries {
        apply(&mut ledger, LedgerCommand::ObserveCraftCost { entry }, &mut events);
    }
    Ok(ledger)
}

fn run_plan(skill: &str, item: &str, target: u32, xp: f64, store: &PathBuf) -> anyhow::Result<()> {
    let table = LevelTable::standard();
    let skill = SkillId::new(skill);
    let item = ItemId::new(item);

    let mut ledger = load_ledger(store)?;
    let mut events: Vec<Event> = Vec::new();
    apply(
        &mut ledger,
        LedgerCommand::ObserveSkillXp {
            skill: skill.clone(),
            xp,
            at: now(),
        },
        &mut events,
    );

    let key = CraftKey::new(skill.clone(), item.clone());
    let final_spec = query::usable_spec(&ledger, &key).ok_or_else(|| {
        anyhow!(MissingSpecError {
            skill: skill.clone(),
            item: item.clone(),
        })
        .context("cannot craft: cost unknown; craft the item once so telemetry can observe it")
    })?;

    let tier = MaterialTier::resolve(final_spec, |material| {
        query::usable_spec(&ledger, &CraftKey::new(skill.clone(), material.clone()))
    });

    let plan = plan_to_target(&table, xp, Level::new(target), final_spec, tier.as_ref())?;

    let rendered = report::render_plan(&plan, |name| {
        let wanted = ItemId::new(name);
        let mut specs = vec![final_spec];
        if let Some(tier) = &tier {
            specs.push(&tier.spec);
        }
        specs
            .iter()
            .flat_map(|spec| spec.requirements.iter())
            .find(|requirement| requirement.item == wanted)
            .and_then(|requirement| requirement.available)
    });
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn run_progress(xp: f64, xp_per_action: f64, action_time: f64) -> anyhow::Result<()> {
    let table = LevelTable::standard();
    let view = progress_to_next(
        &table,
        xp,
        xp_per_action,
        Duration::from_secs_f64(action_time),
    )?;
    println!("{}", report::render_progress(&view));
    Ok(())
}

fn run_export(store: &PathBuf) -> anyhow::Result<()> {
    let ledger = load_ledger(store)?;
    let entries = query::spec_entries(&ledger);
    println!(
        "{}",
        persistence::encode_export(entries.iter().map(|(key, entry)| (*key, *entry)))
    );
    Ok(())
}

fn now() -> Timestamp {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    Timestamp::from_millis(u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX))
}
