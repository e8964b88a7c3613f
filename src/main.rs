//! Frontline - GM console
//!
//! Line-oriented console over a JSON war store. Autonomous wars are resolved
//! in the background by the auto-resolve scheduler while the console runs.
//!
//! Environment:
//!   FRONTLINE_STORE   path of the war store (default: wars.json)
//!   FRONTLINE_CONFIG  combat config TOML (default: data/combat.toml if present)

use frontline::core::config::CombatConfig;
use frontline::core::error::{Result, WarError};
use frontline::core::types::{ModifierId, Side, SubUnitId, TheaterId, WarId};
use frontline::npc::profiles::NpcConfig;
use frontline::persistence::JsonStore;
use frontline::service::{scheduler, Submission, WarService};
use frontline::war::{
    DurationPolicy, PendingAction, PoolRef, PoolUpdate, ResolutionMode, ResolveOutcome, TurnResult,
    War,
};

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::watch;

const HELP: &str = "\
Commands:
  new <warbar> <attacker> <defender> <name..>     - Start a war
  list                                           - List wars
  show <war>                                     - Show a war
  act <war> <side> <main> <minor> <roll>         - Submit a side's action
  resolve <war>                                  - Resolve if both sides are ready
  npc <war> <side> <archetype> <tech> <persona>  - Hand a side to the NPC engine
  release <war> <side>                           - Return an NPC side to players
  mode <war> <gm_driven|player_driven|autonomous>
  auto <war> <on|off> [interval_secs] [max_turns]
  mod <war> <side> <value> <permanent|next|N> <name..>
  unmod <war> <side> <modifier>
  theater <war> <max> <name..>                   - Add a theater
  reopen <war> <theater> | untheater <war> <theater>
  unit <war> <side> <max> <name..>               - Add a sub-unit
  disband <war> <side> <unit>
  push <war> <theater> <amount>                  - Signed; positive favors attacker
  hit <war> <side> <unit> <amount>
  heal <war> <side> <unassigned|unit:N|theater:N> <amount>
  help / quit";

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("frontline=info")),
        )
        .init();

    let config = load_config()?;
    let store_path = std::env::var("FRONTLINE_STORE").unwrap_or_else(|_| "wars.json".to_string());
    let store = JsonStore::open(&store_path, &config)?;
    let service = Arc::new(WarService::new(store, config));

    // Background scheduler for autonomous wars
    let rt = Runtime::new()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = rt.spawn(scheduler::run(
        Arc::clone(&service),
        Duration::from_secs(60),
        shutdown_rx,
    ));

    println!("\n=== FRONTLINE ===");
    println!("War store: {}", store_path);
    println!("{}", HELP);
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "q" {
            break;
        }
        if input == "help" || input == "h" {
            println!("{}", HELP);
            continue;
        }

        if let Err(e) = execute(&service, input) {
            println!("Error: {}", e);
        }
    }

    let _ = shutdown_tx.send(true);
    let _ = rt.block_on(scheduler_task);
    Ok(())
}

fn load_config() -> Result<CombatConfig> {
    match std::env::var("FRONTLINE_CONFIG") {
        Ok(path) => CombatConfig::load(Path::new(&path)),
        Err(_) if Path::new("data/combat.toml").exists() => {
            CombatConfig::load(Path::new("data/combat.toml"))
        }
        Err(_) => Ok(CombatConfig::default()),
    }
}

fn arg<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| WarError::InvalidAmount(format!("usage: {}", usage)))
}

fn number<T: std::str::FromStr>(raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| WarError::InvalidAmount(format!("'{}' is not a valid number", raw)))
}

fn rest(args: &[&str], from: usize) -> String {
    args.get(from..).map(|a| a.join(" ")).unwrap_or_default()
}

fn pool_ref(raw: &str) -> Result<PoolRef> {
    match raw.split_once(':') {
        None if raw == "unassigned" => Ok(PoolRef::Unassigned),
        Some(("unit", id)) => Ok(PoolRef::SubUnit(SubUnitId(number(id)?))),
        Some(("theater", id)) => Ok(PoolRef::Theater(TheaterId(number(id)?))),
        _ => Err(WarError::InvalidAmount(format!("unknown pool '{}'", raw))),
    }
}

fn duration(raw: &str) -> Result<DurationPolicy> {
    match raw {
        "permanent" | "perm" => Ok(DurationPolicy::Permanent),
        "next" | "next_resolution" => Ok(DurationPolicy::NextResolution),
        turns => Ok(DurationPolicy::Turns(number(turns)?)),
    }
}

fn execute(service: &WarService<JsonStore>, input: &str) -> Result<()> {
    let args: Vec<&str> = input.split_whitespace().collect();
    let war_id = |index: usize| -> Result<WarId> { Ok(WarId(number(arg(&args, index, input)?)?)) };
    let side = |index: usize| -> Result<Side> { arg(&args, index, input)?.parse() };

    match args[0] {
        "new" => {
            let warbar = number(arg(&args, 1, "new <warbar> <attacker> <defender> <name..>")?)?;
            let attacker = arg(&args, 2, "new <warbar> <attacker> <defender> <name..>")?;
            let defender = arg(&args, 3, "new <warbar> <attacker> <defender> <name..>")?;
            let war = service.create_war(&rest(&args, 4), attacker, defender, warbar)?;
            println!("Created {} '{}'", war.id, war.name);
        }
        "list" | "ls" => {
            for summary in service.list_wars()? {
                println!(
                    "  {} {:<24} {:?} turn {} - {}",
                    summary.id, summary.name, summary.mode, summary.turn, summary.phase
                );
            }
        }
        "show" => display_war(&service.war(war_id(1)?)?),
        "act" => {
            let action = PendingAction::parse(
                arg(&args, 3, "act <war> <side> <main> <minor> <roll>")?,
                arg(&args, 4, "act <war> <side> <main> <minor> <roll>")?,
                number(arg(&args, 5, "act <war> <side> <main> <minor> <roll>")?)?,
            )?;
            match service.submit_action(war_id(1)?, side(2)?, action)? {
                Submission::Recorded { phase } => println!("Action recorded; war is {}", phase),
                Submission::Resolved(result) => display_result(&result),
            }
        }
        "resolve" => match service.resolve_if_ready(war_id(1)?)? {
            ResolveOutcome::Resolved(result) => display_result(&result),
            ResolveOutcome::NotReady { phase } => println!("Not ready: {}", phase),
        },
        "npc" => {
            let usage = "npc <war> <side> <archetype> <tech> <personality>";
            let npc = NpcConfig::parse(
                arg(&args, 3, usage)?,
                arg(&args, 4, usage)?,
                arg(&args, 5, usage)?,
                service.config().learning_window,
            )?;
            service.configure_npc(war_id(1)?, side(2)?, npc)?;
            println!("Side handed to NPC control");
        }
        "release" => {
            service.release_npc(war_id(1)?, side(2)?)?;
            println!("Side returned to players");
        }
        "mode" => {
            let mode: ResolutionMode = arg(&args, 2, "mode <war> <mode>")?.parse()?;
            service.set_mode(war_id(1)?, mode)?;
            println!("Mode set to {:?}", mode);
        }
        "auto" => {
            let enabled = arg(&args, 2, "auto <war> <on|off> [interval] [max_turns]")? == "on";
            let interval = args.get(3).map(|raw| number(raw)).transpose()?;
            let max_turns = args.get(4).map(|raw| number(raw)).transpose()?;
            service.configure_auto_resolve(war_id(1)?, enabled, interval, max_turns)?;
            println!("Auto-resolve {}", if enabled { "enabled" } else { "disabled" });
        }
        "mod" => {
            let usage = "mod <war> <side> <value> <duration> <name..>";
            let modifier = service.add_modifier(
                war_id(1)?,
                side(2)?,
                &rest(&args, 5),
                number(arg(&args, 3, usage)?)?,
                duration(arg(&args, 4, usage)?)?,
            )?;
            println!("Added {} '{}' ({:+})", modifier.id, modifier.name, modifier.value);
        }
        "unmod" => {
            let id = ModifierId(number(arg(&args, 3, "unmod <war> <side> <modifier>")?)?);
            let modifier = service.remove_modifier(war_id(1)?, side(2)?, id)?;
            println!("Removed '{}'", modifier.name);
        }
        "theater" => {
            let max = number(arg(&args, 2, "theater <war> <max> <name..>")?)?;
            let theater = service.add_theater(war_id(1)?, &rest(&args, 3), max)?;
            println!("Added {} '{}'", theater.id, theater.name);
        }
        "reopen" => {
            let id = TheaterId(number(arg(&args, 2, "reopen <war> <theater>")?)?);
            let theater = service.reopen_theater(war_id(1)?, id)?;
            println!("Reopened '{}'", theater.name);
        }
        "untheater" => {
            let id = TheaterId(number(arg(&args, 2, "untheater <war> <theater>")?)?);
            let theater = service.remove_theater(war_id(1)?, id)?;
            println!("Removed '{}'", theater.name);
        }
        "unit" => {
            let max = number(arg(&args, 3, "unit <war> <side> <max> <name..>")?)?;
            let unit = service.add_sub_unit(war_id(1)?, side(2)?, &rest(&args, 4), max)?;
            println!("Added {} '{}'", unit.id, unit.name);
        }
        "disband" => {
            let id = SubUnitId(number(arg(&args, 3, "disband <war> <side> <unit>")?)?);
            let unit = service.remove_sub_unit(war_id(1)?, side(2)?, id)?;
            println!("Removed '{}'", unit.name);
        }
        "push" => {
            let usage = "push <war> <theater> <amount>";
            let theater = TheaterId(number(arg(&args, 2, usage)?)?);
            let update = service.apply_theater_damage(war_id(1)?, theater, number(arg(&args, 3, usage)?)?)?;
            display_update(&update);
        }
        "hit" => {
            let usage = "hit <war> <side> <unit> <amount>";
            let unit = SubUnitId(number(arg(&args, 3, usage)?)?);
            let update =
                service.apply_subunit_damage(war_id(1)?, side(2)?, unit, number(arg(&args, 4, usage)?)?)?;
            display_update(&update);
        }
        "heal" => {
            let usage = "heal <war> <side> <pool> <amount>";
            let pool = pool_ref(arg(&args, 3, usage)?)?;
            let update = service.heal(war_id(1)?, side(2)?, pool, number(arg(&args, 4, usage)?)?)?;
            display_update(&update);
        }
        other => println!("Unknown command '{}'. Type 'help' for commands.", other),
    }
    Ok(())
}

fn display_war(war: &War) {
    println!("\n=== {} '{}' ===", war.id, war.name);
    println!(
        "Mode: {:?} | Turn: {} | {} | Status: {:?}",
        war.mode,
        war.turn,
        war.turn_phase(),
        war.status
    );
    println!("Tactical momentum: {:+}", war.tactical_momentum);

    for side in Side::BOTH {
        let state = war.side(side);
        let control = match state.npc() {
            Some(npc) => format!("NPC {} / {} / {}", npc.archetype, npc.tech_tier, npc.personality),
            None => "Human".to_string(),
        };
        println!("\n{} - {} [{}]", side, state.name, control);
        println!(
            "  Warbar {}/{} | Unassigned {} | Strategic momentum {}",
            state.warbar.current, state.warbar.max, state.unassigned, state.strategic_momentum
        );
        for unit in &state.sub_units {
            println!("  {} {:<20} {}/{} {:?}", unit.id, unit.name, unit.current, unit.max, unit.status);
        }
        for modifier in &state.modifiers {
            println!("  {} {:<20} {:+} {:?}", modifier.id, modifier.name, modifier.value, modifier.duration);
        }
        if let Some(prepared) = state.prepared {
            println!("  Prepared: {}", prepared.label());
        }
    }

    if !war.theaters.is_empty() {
        println!("\nTheaters:");
        for theater in &war.theaters {
            println!(
                "  {} {:<20} {:+}/{} {:?}",
                theater.id, theater.name, theater.current, theater.max, theater.status
            );
        }
    }
    println!();
}

fn display_result(result: &TurnResult) {
    println!("\n--- Turn {} ---", result.turn);
    for side in Side::BOTH {
        let report = result.side(side);
        println!(
            "{}: {} / {} rolled {} {:+} = {}",
            side,
            report.action.main,
            report.action.minor,
            report.action.roll(),
            report.breakdown.total,
            report.total
        );
        for (label, value) in &report.breakdown.entries {
            println!("    {:<24} {:+}", label, value);
        }
    }
    match result.winner {
        Some(winner) => println!("{} wins by {}", winner, result.margin),
        None => println!("Tie - no damage"),
    }
    if let Some(damage) = &result.damage {
        for pool in &damage.absorbed {
            println!("  {} absorbed {}", pool.name, pool.absorbed);
        }
        if damage.discarded > 0 {
            println!("  {} damage had nowhere to go", damage.discarded);
        }
    }
    for hook in &result.hooks {
        println!("  * {:?}", hook);
    }
    println!();
}

fn display_update(update: &PoolUpdate) {
    println!(
        "{} now {}/{} ({} applied)",
        update.name, update.current, update.max, update.applied
    );
    if let Some(transition) = &update.transition {
        println!("  * {:?}", transition);
    }
}
