//! Headless War Simulator
//!
//! Runs NPC vs NPC wars to completion and outputs JSON outcome statistics
//! for balance tuning of archetypes, personalities and combat constants.

use frontline::core::config::CombatConfig;
use frontline::core::error::Result;
use frontline::core::types::{Side, WarId};
use frontline::npc::decision::NpcCommander;
use frontline::npc::profiles::NpcConfig;
use frontline::war::{resolve_turn, ControlMode, EndReason, ResolutionMode, ResolveOutcome, War, WarStatus};

use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;

/// Headless War Simulator - NPC vs NPC wars for balance tuning
#[derive(Parser, Debug)]
#[command(name = "war_sim")]
#[command(about = "Run NPC vs NPC wars and output outcome statistics")]
struct Args {
    /// Attacker archetype (nato, csat, guerrilla, swarm, elite, defensive_bloc, insurgent)
    #[arg(long, default_value = "nato")]
    attacker: String,

    /// Attacker tech tier
    #[arg(long, default_value = "modern")]
    attacker_tech: String,

    /// Attacker personality (aggressive, defensive, adaptive, balanced, berserker)
    #[arg(long, default_value = "balanced")]
    attacker_personality: String,

    /// Defender archetype
    #[arg(long, default_value = "csat")]
    defender: String,

    /// Defender tech tier
    #[arg(long, default_value = "modern")]
    defender_tech: String,

    /// Defender personality
    #[arg(long, default_value = "balanced")]
    defender_personality: String,

    /// Warbar of each side
    #[arg(long, default_value_t = 100)]
    warbar: u32,

    /// Number of wars to simulate
    #[arg(long, default_value_t = 100)]
    runs: u32,

    /// Turn limit before the defender wins by default
    #[arg(long)]
    max_turns: Option<u32>,

    /// Combat config TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base seed; run i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Debug, Serialize)]
struct RunResult {
    seed: u64,
    victor: Option<Side>,
    reason: Option<EndReason>,
    turns: u32,
    attacker_warbar: u32,
    defender_warbar: u32,
    ties: u32,
}

#[derive(Debug, Serialize)]
struct Summary {
    attacker: String,
    defender: String,
    runs: u32,
    attacker_wins: u32,
    defender_wins: u32,
    turn_limit_endings: u32,
    average_turns: f64,
    average_ties: f64,
    base_seed: u64,
}

fn simulate(
    config: &CombatConfig,
    attacker: &NpcConfig,
    defender: &NpcConfig,
    warbar: u32,
    seed: u64,
) -> Result<RunResult> {
    let mut war = War::new(WarId(1), "Simulation", "Attacker", "Defender", warbar, config);
    war.attacker.control = ControlMode::Npc(attacker.clone());
    war.defender.control = ControlMode::Npc(defender.clone());
    war.mode = ResolutionMode::Autonomous;
    war.auto_resolve.enabled = true;

    let mut commander = NpcCommander::with_seed(config.clone(), seed);
    let mut ties = 0;

    while war.is_active() {
        match resolve_turn(&mut war, &mut commander, config)? {
            ResolveOutcome::Resolved(result) => {
                if result.winner.is_none() {
                    ties += 1;
                }
            }
            ResolveOutcome::NotReady { .. } => break,
        }
    }

    let (victor, reason) = match war.status {
        WarStatus::Concluded { victor, reason } => (Some(victor), Some(reason)),
        WarStatus::Active => (None, None),
    };

    Ok(RunResult {
        seed,
        victor,
        reason,
        turns: war.turn,
        attacker_warbar: war.attacker.warbar.current,
        defender_warbar: war.defender.warbar.current,
        ties,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CombatConfig::load(path)?,
        None => CombatConfig::default(),
    };
    if let Some(max_turns) = args.max_turns {
        config.max_turns = max_turns;
        config.validate()?;
    }

    let attacker = NpcConfig::parse(
        &args.attacker,
        &args.attacker_tech,
        &args.attacker_personality,
        config.learning_window,
    )?;
    let defender = NpcConfig::parse(
        &args.defender,
        &args.defender_tech,
        &args.defender_personality,
        config.learning_window,
    )?;

    let base_seed = args.seed.unwrap_or_else(rand::random);

    let results: Vec<RunResult> = (0..args.runs)
        .into_par_iter()
        .map(|i| simulate(&config, &attacker, &defender, args.warbar, base_seed.wrapping_add(u64::from(i))))
        .collect::<Result<_>>()?;

    let count = |side: Side| results.iter().filter(|r| r.victor == Some(side)).count() as u32;
    let runs = results.len().max(1) as f64;
    let summary = Summary {
        attacker: format!("{} / {} / {}", attacker.archetype, attacker.tech_tier, attacker.personality),
        defender: format!("{} / {} / {}", defender.archetype, defender.tech_tier, defender.personality),
        runs: args.runs,
        attacker_wins: count(Side::Attacker),
        defender_wins: count(Side::Defender),
        turn_limit_endings: results
            .iter()
            .filter(|r| r.reason == Some(EndReason::TurnLimit))
            .count() as u32,
        average_turns: results.iter().map(|r| f64::from(r.turns)).sum::<f64>() / runs,
        average_ties: results.iter().map(|r| f64::from(r.ties)).sum::<f64>() / runs,
        base_seed,
    };

    match args.format.as_str() {
        "text" => {
            println!("War Simulation");
            println!("==============");
            println!("Attacker: {}", summary.attacker);
            println!("Defender: {}", summary.defender);
            println!("Runs: {}", summary.runs);
            println!("Attacker wins: {}", summary.attacker_wins);
            println!("Defender wins: {} ({} by turn limit)", summary.defender_wins, summary.turn_limit_endings);
            println!("Average turns: {:.1}", summary.average_turns);
            println!("Average ties: {:.1}", summary.average_ties);
            println!("Seed: {}", summary.base_seed);
        }
        other => {
            if other != "json" {
                eprintln!("Unknown format '{}', defaulting to json", other);
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "summary": summary,
                    "runs": results,
                }))?
            );
        }
    }

    Ok(())
}
