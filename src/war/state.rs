//! The War aggregate: all persisted state for one conflict

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::config::CombatConfig;
use crate::core::error::{Result, WarError};
use crate::core::types::{normalize_label, ModifierId, Pool, Side, SubUnitId, TheaterId, Turn, WarId};
use crate::npc::profiles::NpcConfig;
use crate::war::actions::{PendingAction, Preparation};
use crate::war::momentum::MomentumState;
use crate::war::modifiers::Modifier;
use crate::war::pools::{SubUnit, Theater};

/// Current on-disk schema version of a War document
pub const SCHEMA_VERSION: u32 = 2;

/// Who decides a side's actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlMode {
    Human,
    Npc(NpcConfig),
}

/// How turns of a war get resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// A GM resolves each turn by hand
    GmDriven,
    /// Turns resolve as soon as every human side has submitted
    PlayerDriven,
    /// NPC vs NPC, resolved by the scheduler
    Autonomous,
}

impl FromStr for ResolutionMode {
    type Err = WarError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "gm_driven" | "manual" => Ok(ResolutionMode::GmDriven),
            "player_driven" | "automatic" => Ok(ResolutionMode::PlayerDriven),
            "autonomous" | "npc_auto_resolve" => Ok(ResolutionMode::Autonomous),
            _ => Err(WarError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The loser's warbar reached 0
    WarbarDepleted,
    /// An autonomous war hit its turn limit
    TurnLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WarStatus {
    Active,
    Concluded { victor: Side, reason: EndReason },
}

/// Where a war's current turn stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    AwaitingAttacker,
    AwaitingDefender,
    ReadyToResolve,
    Concluded,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TurnPhase::AwaitingAttacker => "awaiting attacker action",
            TurnPhase::AwaitingDefender => "awaiting defender action",
            TurnPhase::ReadyToResolve => "ready to resolve",
            TurnPhase::Concluded => "concluded",
        };
        f.write_str(label)
    }
}

/// Scheduler settings for autonomous wars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoResolveSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub max_turns: Turn,
}

impl AutoResolveSettings {
    pub fn from_config(config: &CombatConfig) -> Self {
        Self {
            enabled: false,
            interval_secs: config.auto_resolve_interval_secs,
            max_turns: config.max_turns,
        }
    }
}

/// Everything one side owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideState {
    pub name: String,
    pub control: ControlMode,
    pub warbar: Pool,
    /// Damage capacity not assigned to any sub-unit
    pub unassigned: u32,
    pub sub_units: Vec<SubUnit>,
    pub modifiers: Vec<Modifier>,
    pub strategic_momentum: u32,
    pub prepared: Option<Preparation>,
    pub pending: Option<PendingAction>,
}

impl SideState {
    pub fn new(name: impl Into<String>, warbar_max: u32) -> Self {
        Self {
            name: name.into(),
            control: ControlMode::Human,
            warbar: Pool::full(warbar_max),
            unassigned: warbar_max,
            sub_units: Vec::new(),
            modifiers: Vec::new(),
            strategic_momentum: 0,
            prepared: None,
            pending: None,
        }
    }

    pub fn npc(&self) -> Option<&NpcConfig> {
        match &self.control {
            ControlMode::Npc(npc) => Some(npc),
            ControlMode::Human => None,
        }
    }

    pub fn npc_mut(&mut self) -> Option<&mut NpcConfig> {
        match &mut self.control {
            ControlMode::Npc(npc) => Some(npc),
            ControlMode::Human => None,
        }
    }

    pub fn is_npc(&self) -> bool {
        self.npc().is_some()
    }

    /// An NPC side always counts as ready: its action is generated at resolution
    pub fn has_action(&self) -> bool {
        self.pending.is_some() || self.is_npc()
    }

    pub fn sub_unit(&self, id: SubUnitId) -> Option<&SubUnit> {
        self.sub_units.iter().find(|u| u.id == id)
    }

    pub fn sub_unit_mut(&mut self, id: SubUnitId) -> Option<&mut SubUnit> {
        self.sub_units.iter_mut().find(|u| u.id == id)
    }

    /// Largest unassigned pool possible: warbar not earmarked for sub-units
    pub fn unassigned_cap(&self) -> u32 {
        let assigned: u32 = self.sub_units.iter().map(|u| u.max).sum();
        self.warbar.max.saturating_sub(assigned)
    }

    /// Largest unassigned pool the current warbar backs: what sub-units don't hold
    pub fn unassigned_limit(&self) -> u32 {
        let held: u32 = self.sub_units.iter().map(|u| u.current).sum();
        self.warbar
            .current
            .saturating_sub(held)
            .min(self.unassigned_cap())
    }

    /// Recompute the unassigned pool after sub-units were added or removed
    pub fn recalculate_unassigned(&mut self) {
        self.unassigned = self.unassigned_limit();
    }

    /// Shrink the unassigned pool once the warbar can no longer back it
    pub fn clamp_unassigned(&mut self) -> bool {
        let limit = self.unassigned_limit();
        if self.unassigned > limit {
            self.unassigned = limit;
            true
        } else {
            false
        }
    }
}

/// A conflict between two sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct War {
    pub id: WarId,
    pub name: String,
    pub mode: ResolutionMode,
    pub attacker: SideState,
    pub defender: SideState,
    /// Shared swing value; positive favors the attacker
    pub tactical_momentum: i32,
    pub theaters: Vec<Theater>,
    pub turn: Turn,
    pub status: WarStatus,
    pub auto_resolve: AutoResolveSettings,
    /// Theaters and sub-units share this counter, so ids reflect creation order
    pub next_pool_id: u32,
    pub next_modifier_id: u32,
    /// Last scheduler slot that resolved this war
    pub last_scheduled_slot: Option<u64>,
}

impl War {
    pub fn new(
        id: WarId,
        name: impl Into<String>,
        attacker_name: impl Into<String>,
        defender_name: impl Into<String>,
        warbar_max: u32,
        config: &CombatConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            mode: ResolutionMode::GmDriven,
            attacker: SideState::new(attacker_name, warbar_max),
            defender: SideState::new(defender_name, warbar_max),
            tactical_momentum: 0,
            theaters: Vec::new(),
            turn: 0,
            status: WarStatus::Active,
            auto_resolve: AutoResolveSettings::from_config(config),
            next_pool_id: 1,
            next_modifier_id: 1,
            last_scheduled_slot: None,
        }
    }

    pub fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Attacker => &mut self.attacker,
            Side::Defender => &mut self.defender,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == WarStatus::Active
    }

    /// Reject mutation of archived wars
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(WarError::WarConcluded(self.id))
        }
    }

    /// Archive the war with a victor; pending actions are dropped
    pub fn conclude(&mut self, victor: Side, reason: EndReason) {
        tracing::info!("War {} concluded: {} victorious ({:?})", self.id, victor, reason);
        self.status = WarStatus::Concluded { victor, reason };
        self.attacker.pending = None;
        self.defender.pending = None;
    }

    /// First side whose warbar has run dry
    pub fn depleted_side(&self) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|side| self.side(*side).warbar.is_empty())
    }

    pub fn turn_phase(&self) -> TurnPhase {
        if !self.is_active() {
            TurnPhase::Concluded
        } else if !self.attacker.has_action() {
            TurnPhase::AwaitingAttacker
        } else if !self.defender.has_action() {
            TurnPhase::AwaitingDefender
        } else {
            TurnPhase::ReadyToResolve
        }
    }

    pub fn momentum(&self) -> MomentumState {
        MomentumState {
            tactical: self.tactical_momentum,
            attacker_strategic: self.attacker.strategic_momentum,
            defender_strategic: self.defender.strategic_momentum,
        }
    }

    pub fn set_momentum(&mut self, momentum: MomentumState) {
        self.tactical_momentum = momentum.tactical;
        self.attacker.strategic_momentum = momentum.attacker_strategic;
        self.defender.strategic_momentum = momentum.defender_strategic;
    }

    pub fn theater(&self, id: TheaterId) -> Option<&Theater> {
        self.theaters.iter().find(|t| t.id == id)
    }

    pub fn theater_mut(&mut self, id: TheaterId) -> Option<&mut Theater> {
        self.theaters.iter_mut().find(|t| t.id == id)
    }

    pub fn allocate_pool_id(&mut self) -> u32 {
        let id = self.next_pool_id;
        self.next_pool_id += 1;
        id
    }

    pub fn allocate_modifier_id(&mut self) -> ModifierId {
        let id = ModifierId(self.next_modifier_id);
        self.next_modifier_id += 1;
        id
    }

    /// Clamp every bounded value back into range
    ///
    /// Persisted state may have been hand-edited or migrated, so this runs on
    /// every load and before every save. Returns a description of each repair.
    pub fn normalize(&mut self, config: &CombatConfig) -> Vec<String> {
        let mut repairs = Vec::new();

        let momentum = self.momentum();
        let clamped = momentum.clamped(config);
        if clamped != momentum {
            repairs.push(format!("momentum {:?} clamped to {:?}", momentum, clamped));
            self.set_momentum(clamped);
        }

        for theater in &mut self.theaters {
            if theater.normalize() {
                repairs.push(format!("theater {} repaired", theater.id));
            }
        }

        let mut highest_pool = self.theaters.iter().map(|t| t.id.0).max().unwrap_or(0);
        let mut highest_modifier = 0;

        for side in Side::BOTH {
            let state = self.side_mut(side);

            if state.warbar.current > state.warbar.max {
                repairs.push(format!("{} warbar clamped to {}", side, state.warbar.max));
                state.warbar.current = state.warbar.max;
            }

            for unit in &mut state.sub_units {
                if unit.normalize() {
                    repairs.push(format!("{} {} repaired", side, unit.id));
                }
            }

            if state.clamp_unassigned() {
                repairs.push(format!("{} unassigned clamped to {}", side, state.unassigned));
            }

            if let Some(npc) = state.npc_mut() {
                if npc.history.capacity() != config.learning_window {
                    npc.history.set_capacity(config.learning_window);
                }
            }

            if state.pending.is_some_and(|p| !p.has_valid_roll()) {
                repairs.push(format!("{} pending action dropped: invalid roll", side));
                state.pending = None;
            }

            highest_pool = highest_pool.max(state.sub_units.iter().map(|u| u.id.0).max().unwrap_or(0));
            highest_modifier = highest_modifier.max(state.modifiers.iter().map(|m| m.id.0).max().unwrap_or(0));
        }

        // Keep counters ahead of every id in use
        if self.next_pool_id <= highest_pool {
            repairs.push(format!("next_pool_id advanced past {}", highest_pool));
            self.next_pool_id = highest_pool + 1;
        }
        if self.next_modifier_id <= highest_modifier {
            repairs.push(format!("next_modifier_id advanced past {}", highest_modifier));
            self.next_modifier_id = highest_modifier + 1;
        }

        for repair in &repairs {
            tracing::warn!("War {}: {}", self.id, repair);
        }

        repairs
    }
}
