//! Schema migration for stored war documents
//!
//! Runs once, on the raw JSON, before anything is deserialized. Version 1
//! documents predate the theater/sub-unit model: they may carry a `stats`
//! block and a free-text `theater` label, mark NPC sides by the presence of
//! an `npc` object, and lack the scheduler and id-counter fields.

use serde_json::{json, Map, Value};

use crate::core::config::CombatConfig;
use crate::core::error::{Result, WarError};
use crate::war::state::{ResolutionMode, SCHEMA_VERSION};

/// Bring a store document up to [`SCHEMA_VERSION`]
///
/// Returns the migrated document and whether anything changed.
pub fn migrate(mut document: Value, config: &CombatConfig) -> Result<(Value, bool)> {
    let root = document
        .as_object_mut()
        .ok_or_else(|| WarError::Configuration("war store document is not an object".to_string()))?;

    let version = root
        .get("schema_version")
        .and_then(Value::as_u64)
        .unwrap_or(1);

    if version > u64::from(SCHEMA_VERSION) {
        return Err(WarError::Configuration(format!(
            "war store schema version {} is newer than supported version {}",
            version, SCHEMA_VERSION
        )));
    }
    if version == u64::from(SCHEMA_VERSION) {
        return Ok((document, false));
    }

    let mut migrated = 0;
    if let Some(wars) = root.get_mut("wars").and_then(Value::as_array_mut) {
        for war in wars.iter_mut().filter_map(Value::as_object_mut) {
            migrate_war_v1(war, config)?;
            migrated += 1;
        }
    } else {
        root.insert("wars".to_string(), Value::Array(Vec::new()));
    }

    let highest_id = root
        .get("wars")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|war| war.get("id").and_then(Value::as_u64))
        .max()
        .unwrap_or(0);
    root.entry("next_war_id").or_insert(json!(highest_id + 1));
    root.insert("schema_version".to_string(), json!(SCHEMA_VERSION));

    tracing::info!(
        "Migrated war store from schema v{} to v{} ({} wars)",
        version,
        SCHEMA_VERSION,
        migrated
    );

    Ok((document, true))
}

fn migrate_war_v1(war: &mut Map<String, Value>, config: &CombatConfig) -> Result<()> {
    let id = war.get("id").cloned().unwrap_or(Value::Null);

    if war.remove("stats").is_some() {
        tracing::info!("War {}: removed legacy stats block", id);
    }
    if war.get("theater").is_some_and(Value::is_string) {
        war.remove("theater");
        tracing::info!("War {}: removed legacy theater label", id);
    }

    // Mode labels were free text
    let mode = match war.get("mode").and_then(Value::as_str) {
        Some(label) => label.parse::<ResolutionMode>()?,
        None => ResolutionMode::GmDriven,
    };
    war.insert("mode".to_string(), serde_json::to_value(mode)?);

    for key in ["attacker", "defender"] {
        if let Some(side) = war.get_mut(key).and_then(Value::as_object_mut) {
            migrate_side_v1(side, config);
        }
    }

    war.entry("theaters").or_insert(json!([]));
    war.entry("tactical_momentum").or_insert(json!(0));
    war.entry("turn").or_insert(json!(0));
    war.entry("status").or_insert(json!({ "state": "active" }));
    war.entry("auto_resolve").or_insert(json!({
        "enabled": mode == ResolutionMode::Autonomous,
        "interval_secs": config.auto_resolve_interval_secs,
        "max_turns": config.max_turns,
    }));
    // Normalization advances both counters past any id in use
    war.entry("next_pool_id").or_insert(json!(1));
    war.entry("next_modifier_id").or_insert(json!(1));
    war.entry("last_scheduled_slot").or_insert(Value::Null);

    Ok(())
}

fn migrate_side_v1(side: &mut Map<String, Value>, config: &CombatConfig) {
    side.remove("stats");
    side.remove("theater");

    if !side.contains_key("control") {
        let control = match side.remove("npc") {
            Some(Value::Object(mut npc)) => {
                npc.entry("history").or_insert(json!({
                    "outcomes": [],
                    "capacity": config.learning_window,
                }));
                npc.insert("kind".to_string(), json!("npc"));
                Value::Object(npc)
            }
            _ => json!({ "kind": "human" }),
        };
        side.insert("control".to_string(), control);
    }

    let warbar_current = side
        .get("warbar")
        .and_then(|w| w.get("current"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    side.entry("unassigned").or_insert(json!(warbar_current));
    side.entry("sub_units").or_insert(json!([]));
    side.entry("modifiers").or_insert(json!([]));
    side.entry("strategic_momentum").or_insert(json!(0));
    side.entry("prepared").or_insert(Value::Null);
    side.entry("pending").or_insert(Value::Null);
}
