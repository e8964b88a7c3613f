//! War service - the engine's external interface
//!
//! Every operation follows the same shape: take the war's lock (failing fast
//! with `WarBusy` if another writer holds it), load a copy, mutate the copy,
//! normalize, save once. An error anywhere before the save leaves the stored
//! war untouched.

pub mod scheduler;

use std::sync::{Arc, Mutex, TryLockError};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::CombatConfig;
use crate::core::error::{Result, WarError};
use crate::core::types::{ModifierId, Side, SubUnitId, TheaterId, Turn, WarId};
use crate::npc::decision::{ActionPlanner, NpcCommander};
use crate::npc::profiles::NpcConfig;
use crate::persistence::WarStore;
use crate::war::actions::PendingAction;
use crate::war::damage::{self, PoolUpdate};
use crate::war::modifiers::{DurationPolicy, Modifier};
use crate::war::pools::{PoolRef, SubUnit, Theater};
use crate::war::resolver::{resolve_turn, ResolveOutcome, TurnResult};
use crate::war::state::{ControlMode, EndReason, ResolutionMode, TurnPhase, War, WarStatus};

/// One line of a war listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarSummary {
    pub id: WarId,
    pub name: String,
    pub mode: ResolutionMode,
    pub turn: Turn,
    pub phase: TurnPhase,
    pub status: WarStatus,
    pub auto_resolve: bool,
    pub interval_secs: u64,
}

impl From<&War> for WarSummary {
    fn from(war: &War) -> Self {
        Self {
            id: war.id,
            name: war.name.clone(),
            mode: war.mode,
            turn: war.turn,
            phase: war.turn_phase(),
            status: war.status,
            auto_resolve: war.auto_resolve.enabled,
            interval_secs: war.auto_resolve.interval_secs,
        }
    }
}

/// What became of a submitted action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Submission {
    /// Recorded; the turn now stands at `phase`
    Recorded { phase: TurnPhase },
    /// Recorded and resolved in the same step (player-driven wars)
    Resolved(Box<TurnResult>),
}

type Planner = Box<dyn ActionPlanner + Send>;

pub struct WarService<S: WarStore> {
    store: S,
    config: CombatConfig,
    planner: Mutex<Planner>,
    locks: Mutex<AHashMap<WarId, Arc<Mutex<()>>>>,
}

impl<S: WarStore> WarService<S> {
    /// Service with an entropy-seeded NPC commander
    pub fn new(store: S, config: CombatConfig) -> Self {
        let planner = Box::new(NpcCommander::new(config.clone()));
        Self::with_planner(store, config, planner)
    }

    /// Service with a caller-supplied planner (seeded or scripted)
    pub fn with_planner(store: S, config: CombatConfig, planner: Planner) -> Self {
        Self {
            store,
            config,
            planner: Mutex::new(planner),
            locks: Mutex::new(AHashMap::new()),
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock_for(&self, id: WarId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| WarError::InvariantViolation("war lock table poisoned".to_string()))?;
        Ok(locks.entry(id).or_default().clone())
    }

    /// Run `f` against a copy of the war and commit it with a single save
    fn with_war<T>(&self, id: WarId, f: impl FnOnce(&mut War, &CombatConfig) -> Result<T>) -> Result<T> {
        let lock = self.lock_for(id)?;
        let _guard = match lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(WarError::WarBusy(id)),
            // The guarded data is (), so a panicked holder left nothing half-written
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let mut war = self.store.load(id)?.ok_or(WarError::WarNotFound(id))?;
        let value = f(&mut war, &self.config)?;
        war.normalize(&self.config);
        self.store.save(&war)?;
        Ok(value)
    }

    /// Like `with_war`, but rejects concluded wars up front
    fn with_active_war<T>(
        &self,
        id: WarId,
        f: impl FnOnce(&mut War, &CombatConfig) -> Result<T>,
    ) -> Result<T> {
        self.with_war(id, |war, config| {
            war.ensure_active()?;
            f(war, config)
        })
    }

    pub fn create_war(
        &self,
        name: &str,
        attacker: &str,
        defender: &str,
        warbar_max: u32,
    ) -> Result<War> {
        if warbar_max == 0 {
            return Err(WarError::InvalidAmount("warbar must be positive".to_string()));
        }
        if name.trim().is_empty() {
            return Err(WarError::InvalidAmount("war name must not be empty".to_string()));
        }

        let id = self.store.next_id()?;
        let war = War::new(id, name.trim(), attacker.trim(), defender.trim(), warbar_max, &self.config);
        self.store.save(&war)?;

        tracing::info!("Created war {} '{}': {} vs {}", id, war.name, attacker, defender);
        Ok(war)
    }

    /// Copy of a stored war
    pub fn war(&self, id: WarId) -> Result<War> {
        self.store.load(id)?.ok_or(WarError::WarNotFound(id))
    }

    pub fn list_wars(&self) -> Result<Vec<WarSummary>> {
        let mut summaries = Vec::new();
        for id in self.store.list()? {
            if let Some(war) = self.store.load(id)? {
                summaries.push(WarSummary::from(&war));
            }
        }
        Ok(summaries)
    }

    /// Record a human side's action; resubmitting replaces the earlier one
    ///
    /// A player-driven war resolves under the same lock once the last
    /// submission makes it ready.
    pub fn submit_action(&self, id: WarId, side: Side, action: PendingAction) -> Result<Submission> {
        self.with_active_war(id, |war, config| {
            if war.side(side).is_npc() {
                return Err(WarError::NpcControlled(side));
            }
            war.side_mut(side).pending = Some(action);
            tracing::debug!("War {}: {} submitted {} / {}", id, side, action.main, action.minor);

            let phase = war.turn_phase();
            if war.mode != ResolutionMode::PlayerDriven || phase != TurnPhase::ReadyToResolve {
                return Ok(Submission::Recorded { phase });
            }
            match self.resolve(war, config)? {
                ResolveOutcome::Resolved(result) => Ok(Submission::Resolved(result)),
                ResolveOutcome::NotReady { phase } => Ok(Submission::Recorded { phase }),
            }
        })
    }

    /// Resolve the current turn if every side is ready
    pub fn resolve_if_ready(&self, id: WarId) -> Result<ResolveOutcome> {
        self.with_active_war(id, |war, config| self.resolve(war, config))
    }

    fn resolve(&self, war: &mut War, config: &CombatConfig) -> Result<ResolveOutcome> {
        let mut planner = self
            .planner
            .lock()
            .map_err(|_| WarError::InvariantViolation("npc planner lock poisoned".to_string()))?;
        resolve_turn(war, planner.as_mut(), config)
    }

    /// Hand a side to the NPC engine
    pub fn configure_npc(&self, id: WarId, side: Side, npc: NpcConfig) -> Result<()> {
        self.with_active_war(id, |war, _| {
            tracing::info!(
                "War {}: {} now NPC ({} / {} / {})",
                id,
                side,
                npc.archetype,
                npc.tech_tier,
                npc.personality
            );
            let state = war.side_mut(side);
            state.control = ControlMode::Npc(npc);
            state.pending = None;
            Ok(())
        })
    }

    /// Escalation: return an NPC side to human control
    ///
    /// An autonomous war cannot run with a human side, so it drops back to
    /// GM-driven and its scheduler is switched off.
    pub fn release_npc(&self, id: WarId, side: Side) -> Result<()> {
        self.with_active_war(id, |war, _| {
            if !war.side(side).is_npc() {
                return Err(WarError::NotNpcControlled(side));
            }
            war.side_mut(side).control = ControlMode::Human;
            if war.mode == ResolutionMode::Autonomous {
                war.mode = ResolutionMode::GmDriven;
                war.auto_resolve.enabled = false;
                tracing::info!("War {}: escalated, {} returned to players", id, side);
            }
            Ok(())
        })
    }

    pub fn set_mode(&self, id: WarId, mode: ResolutionMode) -> Result<()> {
        self.with_active_war(id, |war, _| {
            if mode == ResolutionMode::Autonomous && !(war.attacker.is_npc() && war.defender.is_npc()) {
                return Err(WarError::InvalidMode(
                    "autonomous resolution requires both sides to be NPC-controlled".to_string(),
                ));
            }
            war.mode = mode;
            war.auto_resolve.enabled = mode == ResolutionMode::Autonomous;
            Ok(())
        })
    }

    /// Adjust scheduler settings; `None` keeps the current value
    pub fn configure_auto_resolve(
        &self,
        id: WarId,
        enabled: bool,
        interval_secs: Option<u64>,
        max_turns: Option<Turn>,
    ) -> Result<()> {
        self.with_active_war(id, |war, _| {
            if enabled && war.mode != ResolutionMode::Autonomous {
                return Err(WarError::InvalidMode(
                    "auto-resolve requires an autonomous war".to_string(),
                ));
            }
            if interval_secs == Some(0) || max_turns == Some(0) {
                return Err(WarError::InvalidAmount(
                    "interval and turn limit must be positive".to_string(),
                ));
            }
            war.auto_resolve.enabled = enabled;
            if let Some(interval) = interval_secs {
                war.auto_resolve.interval_secs = interval;
            }
            if let Some(limit) = max_turns {
                war.auto_resolve.max_turns = limit;
            }
            Ok(())
        })
    }

    /// Scheduler entry point, idempotent per slot
    ///
    /// Returns `None` when the war is not due: auto-resolve is off, the war
    /// is over, or `slot` was already handled.
    pub fn resolve_scheduled(&self, id: WarId, slot: u64) -> Result<Option<TurnResult>> {
        self.with_war(id, |war, config| {
            let due = war.is_active()
                && war.mode == ResolutionMode::Autonomous
                && war.auto_resolve.enabled
                && war.last_scheduled_slot.map_or(true, |last| slot > last);
            if !due {
                return Ok(None);
            }

            war.last_scheduled_slot = Some(slot);
            match self.resolve(war, config)? {
                ResolveOutcome::Resolved(result) => Ok(Some(*result)),
                ResolveOutcome::NotReady { phase } => {
                    tracing::warn!("War {}: scheduled resolution skipped ({})", id, phase);
                    Ok(None)
                }
            }
        })
    }

    pub fn add_modifier(
        &self,
        id: WarId,
        side: Side,
        name: &str,
        value: i32,
        duration: DurationPolicy,
    ) -> Result<Modifier> {
        if duration == DurationPolicy::Turns(0) {
            return Err(WarError::InvalidAmount("modifier must last at least one turn".to_string()));
        }
        if name.trim().is_empty() {
            return Err(WarError::InvalidAmount("modifier name must not be empty".to_string()));
        }
        self.with_active_war(id, |war, _| {
            let modifier = Modifier {
                id: war.allocate_modifier_id(),
                name: name.trim().to_string(),
                value,
                duration,
            };
            war.side_mut(side).modifiers.push(modifier.clone());
            Ok(modifier)
        })
    }

    pub fn remove_modifier(&self, id: WarId, side: Side, modifier_id: ModifierId) -> Result<Modifier> {
        self.with_active_war(id, |war, _| {
            let modifiers = &mut war.side_mut(side).modifiers;
            let index = modifiers
                .iter()
                .position(|m| m.id == modifier_id)
                .ok_or(WarError::ModifierNotFound(side, modifier_id))?;
            Ok(modifiers.remove(index))
        })
    }

    pub fn add_theater(&self, id: WarId, name: &str, max: u32) -> Result<Theater> {
        if max == 0 {
            return Err(WarError::InvalidAmount("theater max must be positive".to_string()));
        }
        self.with_active_war(id, |war, _| {
            let theater = Theater::new(TheaterId(war.allocate_pool_id()), name.trim(), max);
            war.theaters.push(theater.clone());
            Ok(theater)
        })
    }

    /// Reset a theater to neutral and reopen it
    pub fn reopen_theater(&self, id: WarId, theater_id: TheaterId) -> Result<Theater> {
        self.with_active_war(id, |war, _| {
            let theater = war
                .theater_mut(theater_id)
                .ok_or(WarError::TheaterNotFound(theater_id))?;
            theater.reopen();
            Ok(theater.clone())
        })
    }

    pub fn remove_theater(&self, id: WarId, theater_id: TheaterId) -> Result<Theater> {
        self.with_active_war(id, |war, _| {
            let index = war
                .theaters
                .iter()
                .position(|t| t.id == theater_id)
                .ok_or(WarError::TheaterNotFound(theater_id))?;
            Ok(war.theaters.remove(index))
        })
    }

    /// Carve a new full-health sub-unit out of a side's warbar
    pub fn add_sub_unit(&self, id: WarId, side: Side, name: &str, max: u32) -> Result<SubUnit> {
        if max == 0 {
            return Err(WarError::InvalidAmount("sub-unit max must be positive".to_string()));
        }
        self.with_active_war(id, |war, _| {
            if max > war.side(side).unassigned_cap() {
                return Err(WarError::InvalidAmount(format!(
                    "{} has only {} unallocated warbar",
                    side,
                    war.side(side).unassigned_cap()
                )));
            }
            let unit = SubUnit::new(SubUnitId(war.allocate_pool_id()), name.trim(), max);
            let state = war.side_mut(side);
            state.sub_units.push(unit.clone());
            state.recalculate_unassigned();
            Ok(unit)
        })
    }

    pub fn remove_sub_unit(&self, id: WarId, side: Side, unit_id: SubUnitId) -> Result<SubUnit> {
        self.with_active_war(id, |war, _| {
            let state = war.side_mut(side);
            let index = state
                .sub_units
                .iter()
                .position(|u| u.id == unit_id)
                .ok_or(WarError::SubUnitNotFound(side, unit_id))?;
            let unit = state.sub_units.remove(index);
            state.recalculate_unassigned();
            Ok(unit)
        })
    }

    /// Push a theater directly; positive favors the attacker
    pub fn apply_theater_damage(&self, id: WarId, theater_id: TheaterId, amount: i32) -> Result<PoolUpdate> {
        self.with_active_war(id, |war, _| {
            let update = damage::apply_theater_damage(war, theater_id, amount)?;
            conclude_if_depleted(war);
            Ok(update)
        })
    }

    pub fn apply_subunit_damage(
        &self,
        id: WarId,
        side: Side,
        unit_id: SubUnitId,
        amount: u32,
    ) -> Result<PoolUpdate> {
        self.with_active_war(id, |war, _| {
            let update = damage::apply_subunit_damage(war, side, unit_id, amount)?;
            conclude_if_depleted(war);
            Ok(update)
        })
    }

    pub fn heal(&self, id: WarId, side: Side, pool: PoolRef, amount: u32) -> Result<PoolUpdate> {
        self.with_active_war(id, |war, _| damage::heal(war, side, pool, amount))
    }
}

fn conclude_if_depleted(war: &mut War) {
    if let Some(loser) = war.depleted_side() {
        war.conclude(loser.opponent(), EndReason::WarbarDepleted);
    }
}
