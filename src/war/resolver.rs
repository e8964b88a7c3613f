//! Turn resolution
//!
//! One call takes a war whose sides have both committed (or are NPCs), rolls
//! everything forward by a turn and reports what happened.

use serde::{Deserialize, Serialize};

use crate::core::config::CombatConfig;
use crate::core::error::{Result, WarError};
use crate::core::types::{Side, SubUnitId, TheaterId, Turn, WarId};
use crate::npc::decision::{effective_aggression, ActionPlanner, DecisionContext};
use crate::npc::learning::BattleOutcome;
use crate::war::actions::{MainAction, MinorAction, PendingAction};
use crate::war::damage::{distribute, heal_unassigned, DamageReport, PoolTransition};
use crate::war::modifiers::{aggregate, expire_modifiers, AggregatorInput, DurationPolicy, Modifier, ModifierBreakdown};
use crate::war::momentum::{damage_multiplier, MomentumState};
use crate::war::state::{EndReason, ResolutionMode, TurnPhase, War, WarStatus};

/// Label of the modifier granted by the Fortify minor action
pub const FORTIFIED_POSITION: &str = "Fortified Position";

/// One side's half of a resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideReport {
    pub side: Side,
    pub action: PendingAction,
    /// True when the engine chose this action for an NPC
    pub generated: bool,
    /// Aggression the NPC decided with this turn
    pub decision_aggression: Option<f64>,
    /// NPC aggression after this turn's outcome was learned
    pub npc_aggression: Option<f64>,
    pub breakdown: ModifierBreakdown,
    pub total: i32,
    pub expired_modifiers: Vec<String>,
}

/// Story beats the command layer may narrate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrativeHook {
    DecisiveVictory { side: Side, margin: u32 },
    Stalemate,
    MomentumReversal { side: Side },
    SpecialUnitDeployed { side: Side },
    TheaterCaptured { theater: TheaterId, name: String, by: Side },
    SubUnitNeutralized { side: Side, unit: SubUnitId, name: String },
    WarConcluded { victor: Side, reason: EndReason },
}

/// Everything a resolution decided
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub war_id: WarId,
    /// The turn that was resolved
    pub turn: Turn,
    pub attacker: SideReport,
    pub defender: SideReport,
    pub winner: Option<Side>,
    pub margin: u32,
    /// Tier damage before the action factor and momentum multiplier
    pub base_damage: u32,
    pub multiplier: f64,
    pub damage: Option<DamageReport>,
    pub momentum: MomentumState,
    pub hooks: Vec<NarrativeHook>,
    pub status: WarStatus,
}

impl TurnResult {
    pub fn side(&self, side: Side) -> &SideReport {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolveOutcome {
    Resolved(Box<TurnResult>),
    NotReady { phase: TurnPhase },
}

/// Damage step for a winning margin
pub fn tier_damage(margin: u32, config: &CombatConfig) -> u32 {
    config
        .damage_tiers
        .iter()
        .find(|(threshold, _)| margin <= *threshold)
        .map(|(_, damage)| *damage)
        .unwrap_or(config.decisive_damage)
}

/// Damage factor of the winner's main action
pub fn action_factor(main: MainAction, config: &CombatConfig) -> f64 {
    match main {
        MainAction::Attack => 1.0,
        MainAction::DeploySpecialUnit => config.special_unit_damage_factor,
        MainAction::Defend => config.defend_damage_factor,
    }
}

/// Final damage: tier × action factor × momentum multiplier, floored
pub fn resolution_damage(margin: u32, main: MainAction, multiplier: f64, config: &CombatConfig) -> u32 {
    let raw = f64::from(tier_damage(margin, config)) * action_factor(main, config) * multiplier;
    raw.floor().max(0.0) as u32
}

fn decision_context(war: &War, side: Side) -> DecisionContext {
    DecisionContext {
        side,
        tactical_momentum: war.tactical_momentum,
        own_strategic: war.side(side).strategic_momentum,
        opponent_strategic: war.side(side.opponent()).strategic_momentum,
    }
}

/// Action for one side: its submission, or a fresh NPC decision
fn committed_action(
    war: &War,
    side: Side,
    planner: &mut dyn ActionPlanner,
) -> Result<(PendingAction, bool, Option<f64>)> {
    let state = war.side(side);
    if let Some(action) = state.pending {
        if !action.has_valid_roll() {
            return Err(WarError::InvalidRoll(action.roll()));
        }
        return Ok((action, false, None));
    }
    match state.npc() {
        Some(npc) => {
            let decision = planner.plan(npc, &decision_context(war, side));
            Ok((decision.action, true, Some(decision.aggression)))
        }
        None => Err(WarError::InvariantViolation(format!(
            "{} has no action for {}",
            side, war.id
        ))),
    }
}

/// Resolve the current turn if both sides are ready
///
/// Validation happens before any mutation, so an error leaves `war` as it was.
pub fn resolve_turn(
    war: &mut War,
    planner: &mut dyn ActionPlanner,
    config: &CombatConfig,
) -> Result<ResolveOutcome> {
    war.ensure_active()?;
    let phase = war.turn_phase();
    if phase != TurnPhase::ReadyToResolve {
        return Ok(ResolveOutcome::NotReady { phase });
    }

    let (attacker_action, attacker_generated, attacker_aggression) =
        committed_action(war, Side::Attacker, planner)?;
    let (defender_action, defender_generated, defender_aggression) =
        committed_action(war, Side::Defender, planner)?;
    let action_of = |side: Side| match side {
        Side::Attacker => attacker_action,
        Side::Defender => defender_action,
    };

    let breakdown_of = |side: Side| {
        let state = war.side(side);
        aggregate(
            &AggregatorInput {
                side,
                modifiers: &state.modifiers,
                main: action_of(side).main,
                prepared: state.prepared,
                opponent_minor: action_of(side.opponent()).minor,
                tactical_momentum: war.tactical_momentum,
            },
            config,
        )
    };
    let attacker_breakdown = breakdown_of(Side::Attacker);
    let defender_breakdown = breakdown_of(Side::Defender);

    let attacker_total = i32::from(attacker_action.roll()) + attacker_breakdown.total;
    let defender_total = i32::from(defender_action.roll()) + defender_breakdown.total;
    let margin = attacker_total.abs_diff(defender_total);
    let winner = Side::favored_by(attacker_total - defender_total);

    let resolved_turn = war.turn;
    let previous = war.momentum();
    let mut hooks = Vec::new();
    let mut base_damage = 0;
    let mut multiplier = 1.0;
    let mut damage = None;

    match winner {
        Some(winner) => {
            let loser = winner.opponent();
            let winner_main = action_of(winner).main;
            base_damage = tier_damage(margin, config);
            multiplier = damage_multiplier(previous.strategic(winner), config);
            let amount = resolution_damage(margin, winner_main, multiplier, config);

            tracing::info!(
                "War {} turn {}: {} wins {} to {} (margin {}), {} damage",
                war.id,
                resolved_turn,
                winner,
                attacker_total.max(defender_total),
                attacker_total.min(defender_total),
                margin,
                amount
            );

            let decisive_threshold = config.damage_tiers.last().map_or(0, |(t, _)| *t);
            if margin > decisive_threshold {
                hooks.push(NarrativeHook::DecisiveVictory { side: winner, margin });
            }
            if Side::favored_by(previous.tactical) == Some(loser) {
                hooks.push(NarrativeHook::MomentumReversal { side: winner });
            }
            if winner_main == MainAction::DeploySpecialUnit {
                hooks.push(NarrativeHook::SpecialUnitDeployed { side: winner });
            }

            let report = distribute(war, loser, amount);
            for transition in &report.transitions {
                match transition {
                    PoolTransition::TheaterCaptured { theater, name, by } => {
                        hooks.push(NarrativeHook::TheaterCaptured {
                            theater: *theater,
                            name: name.clone(),
                            by: *by,
                        });
                    }
                    PoolTransition::SubUnitNeutralized { side, unit, name } => {
                        hooks.push(NarrativeHook::SubUnitNeutralized {
                            side: *side,
                            unit: *unit,
                            name: name.clone(),
                        });
                    }
                    PoolTransition::SubUnitReactivated { .. } => {}
                }
            }
            damage = Some(report);

            for (side, outcome) in [(winner, BattleOutcome::Win), (loser, BattleOutcome::Loss)] {
                if let Some(npc) = war.side_mut(side).npc_mut() {
                    npc.history.record(outcome);
                }
            }
        }
        None => {
            tracing::info!(
                "War {} turn {}: tie at {}, no damage",
                war.id,
                resolved_turn,
                attacker_total
            );
            hooks.push(NarrativeHook::Stalemate);
        }
    }

    war.set_momentum(previous.after_resolution(winner, config));

    // Bookkeeping runs on ties too: preparations are spent by the attempt
    let mut expired = [Vec::new(), Vec::new()];
    for (slot, side) in Side::BOTH.into_iter().enumerate() {
        let action = action_of(side);
        let fortify_id = (action.minor == MinorAction::Fortify).then(|| war.allocate_modifier_id());
        let state = war.side_mut(side);

        expired[slot] = expire_modifiers(&mut state.modifiers);
        state.prepared = action.minor.preparation();
        state.pending = None;

        if let Some(id) = fortify_id {
            state.modifiers.push(Modifier {
                id,
                name: FORTIFIED_POSITION.to_string(),
                value: config.fortify_bonus,
                duration: DurationPolicy::NextResolution,
            });
        }
        if action.minor == MinorAction::Heal {
            heal_unassigned(state, config.minor_heal_amount);
        }
    }

    war.turn += 1;

    if let Some(winner) = winner {
        if war.side(winner.opponent()).warbar.is_empty() {
            conclude(war, winner, EndReason::WarbarDepleted, &mut hooks);
        }
    }
    if war.is_active()
        && war.mode == ResolutionMode::Autonomous
        && war.turn >= war.auto_resolve.max_turns
    {
        conclude(war, Side::Defender, EndReason::TurnLimit, &mut hooks);
    }

    let [attacker_expired, defender_expired] = expired;
    let learned_aggression = |side: Side| war.side(side).npc().map(|npc| effective_aggression(npc, config));
    let result = TurnResult {
        war_id: war.id,
        turn: resolved_turn,
        attacker: SideReport {
            side: Side::Attacker,
            action: attacker_action,
            generated: attacker_generated,
            decision_aggression: attacker_aggression,
            npc_aggression: learned_aggression(Side::Attacker),
            total: attacker_total,
            breakdown: attacker_breakdown,
            expired_modifiers: attacker_expired,
        },
        defender: SideReport {
            side: Side::Defender,
            action: defender_action,
            generated: defender_generated,
            decision_aggression: defender_aggression,
            npc_aggression: learned_aggression(Side::Defender),
            total: defender_total,
            breakdown: defender_breakdown,
            expired_modifiers: defender_expired,
        },
        winner,
        margin,
        base_damage,
        multiplier,
        damage,
        momentum: war.momentum(),
        hooks,
        status: war.status,
    };

    Ok(ResolveOutcome::Resolved(Box::new(result)))
}

fn conclude(war: &mut War, victor: Side, reason: EndReason, hooks: &mut Vec<NarrativeHook>) {
    war.conclude(victor, reason);
    hooks.push(NarrativeHook::WarConcluded { victor, reason });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npc::decision::NpcDecision;
    use crate::npc::profiles::NpcConfig;

    #[test]
    fn test_tier_damage_boundaries() {
        let config = CombatConfig::default();
        assert_eq!(tier_damage(1, &config), 5);
        assert_eq!(tier_damage(5, &config), 5);
        assert_eq!(tier_damage(6, &config), 10);
        assert_eq!(tier_damage(15, &config), 15);
        assert_eq!(tier_damage(16, &config), 20);
    }

    #[test]
    fn test_resolution_damage_floors() {
        let config = CombatConfig::default();
        assert_eq!(resolution_damage(7, MainAction::Attack, 1.0, &config), 10);
        assert_eq!(resolution_damage(7, MainAction::DeploySpecialUnit, 1.0, &config), 7);
        assert_eq!(resolution_damage(3, MainAction::Defend, 1.3, &config), 3);
        assert_eq!(resolution_damage(20, MainAction::Attack, 2.0, &config), 40);
    }

    struct Scripted(PendingAction);

    impl ActionPlanner for Scripted {
        fn plan(&mut self, _npc: &NpcConfig, _context: &DecisionContext) -> NpcDecision {
            NpcDecision {
                action: self.0,
                aggression: 0.5,
                weights: [1.0, 0.0, 0.0],
            }
        }
    }

    #[test]
    fn test_not_ready_reports_phase() {
        let config = CombatConfig::default();
        let mut war = War::new(WarId(1), "Test", "Red", "Blue", 100, &config);
        let mut planner = Scripted(PendingAction::new(MainAction::Attack, MinorAction::Heal, 10).unwrap());

        let outcome = resolve_turn(&mut war, &mut planner, &config).unwrap();
        assert_eq!(
            outcome,
            ResolveOutcome::NotReady {
                phase: TurnPhase::AwaitingAttacker
            }
        );
        assert_eq!(war.turn, 0);
    }
}
