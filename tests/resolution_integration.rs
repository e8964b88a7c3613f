//! Turn resolution integration tests

use frontline::core::config::CombatConfig;
use frontline::core::types::{ModifierId, Side, TheaterId, WarId};
use frontline::npc::decision::{effective_aggression, ActionPlanner, DecisionContext, NpcDecision};
use frontline::npc::learning::{BattleOutcome, OutcomeHistory};
use frontline::npc::profiles::{Archetype, NpcConfig, Personality, TechTier};
use frontline::war::*;

/// Planner that always returns the same action
struct Scripted(PendingAction);

impl ActionPlanner for Scripted {
    fn plan(&mut self, _npc: &NpcConfig, _context: &DecisionContext) -> NpcDecision {
        NpcDecision {
            action: self.0,
            aggression: 0.5,
            weights: [0.5, 0.4, 0.1],
        }
    }
}

fn action(main: MainAction, minor: MinorAction, roll: u8) -> PendingAction {
    PendingAction::new(main, minor, roll).unwrap()
}

fn new_war(config: &CombatConfig) -> War {
    War::new(WarId(1), "Test War", "Red", "Blue", 100, config)
}

fn idle_planner() -> Scripted {
    Scripted(action(MainAction::Defend, MinorAction::Heal, 1))
}

fn resolve(war: &mut War, config: &CombatConfig) -> TurnResult {
    match resolve_turn(war, &mut idle_planner(), config).unwrap() {
        ResolveOutcome::Resolved(result) => *result,
        ResolveOutcome::NotReady { phase } => panic!("war not ready: {}", phase),
    }
}

fn permanent(id: u32, name: &str, value: i32) -> Modifier {
    Modifier {
        id: ModifierId(id),
        name: name.to_string(),
        value,
        duration: DurationPolicy::Permanent,
    }
}

fn submit(war: &mut War, attacker: PendingAction, defender: PendingAction) {
    war.attacker.pending = Some(attacker);
    war.defender.pending = Some(defender);
}

#[test]
fn test_attacker_wins_by_seven() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    war.attacker.modifiers.push(permanent(1, "Air Superiority", 2));
    submit(
        &mut war,
        action(MainAction::Attack, MinorAction::PrepareAttack, 15),
        action(MainAction::Attack, MinorAction::PrepareSpecialUnit, 10),
    );

    let result = resolve(&mut war, &config);

    assert_eq!(result.attacker.total, 17);
    assert_eq!(result.defender.total, 10);
    assert_eq!(result.winner, Some(Side::Attacker));
    assert_eq!(result.margin, 7);
    assert_eq!(result.base_damage, 10);
    assert_eq!(war.tactical_momentum, 1);
    assert_eq!(war.attacker.strategic_momentum, 1);
    assert_eq!(war.defender.warbar.current, 90);
    assert_eq!(war.defender.unassigned, 90);
    assert_eq!(war.attacker.prepared, Some(Preparation::Attack));
}

#[test]
fn test_win_builds_existing_momentum() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    war.tactical_momentum = 2;
    submit(
        &mut war,
        action(MainAction::Attack, MinorAction::Sabotage, 15),
        action(MainAction::Attack, MinorAction::Sabotage, 10),
    );

    let result = resolve(&mut war, &config);

    assert_eq!(result.winner, Some(Side::Attacker));
    assert_eq!(war.tactical_momentum, 3);
}

#[test]
fn test_win_reverses_negative_momentum() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    war.tactical_momentum = -1;
    war.attacker.modifiers.push(permanent(1, "Air Superiority", 2));
    submit(
        &mut war,
        action(MainAction::Attack, MinorAction::Heal, 15),
        action(MainAction::Attack, MinorAction::Heal, 10),
    );

    let result = resolve(&mut war, &config);

    assert_eq!(result.defender.total, 11);
    assert_eq!(result.winner, Some(Side::Attacker));
    assert_eq!(war.tactical_momentum, 1);
    assert!(result.hooks.contains(&NarrativeHook::MomentumReversal { side: Side::Attacker }));
}

#[test]
fn test_modifier_order_does_not_matter() {
    let config = CombatConfig::default();
    let modifiers = vec![
        permanent(1, "A", 2),
        permanent(2, "B", 1),
        permanent(3, "C", -1),
    ];
    let mut reversed = modifiers.clone();
    reversed.reverse();

    let total = |modifiers: &[Modifier]| {
        aggregate(
            &AggregatorInput {
                side: Side::Attacker,
                modifiers,
                main: MainAction::Attack,
                prepared: None,
                opponent_minor: MinorAction::Heal,
                tactical_momentum: 0,
            },
            &config,
        )
        .total
    };

    assert_eq!(total(&modifiers), 2);
    assert_eq!(total(&reversed), 2);
}

#[test]
fn test_damage_spills_from_unassigned_into_first_theater() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    war.defender.unassigned = 5;
    for name in ["A", "B"] {
        let id = TheaterId(war.allocate_pool_id());
        war.theaters.push(Theater::new(id, name, 10));
    }

    let report = distribute(&mut war, Side::Defender, 12);

    let absorbed: Vec<(String, u32)> = report
        .absorbed
        .iter()
        .map(|p| (p.name.clone(), p.absorbed))
        .collect();
    assert_eq!(
        absorbed,
        vec![("Unassigned".to_string(), 5), ("A".to_string(), 7)]
    );
    assert!(war.theaters[0].is_active());
    assert_eq!(war.theaters[1].current, 0);
}

#[test]
fn test_learning_lowers_aggression() {
    let config = CombatConfig::default();
    let mut npc = NpcConfig::new(Archetype::Csat, TechTier::Modern, Personality::Aggressive, 5);
    for outcome in [
        BattleOutcome::Win,
        BattleOutcome::Loss,
        BattleOutcome::Win,
        BattleOutcome::Loss,
        BattleOutcome::Win,
    ] {
        npc.history.record(outcome);
    }

    assert!((npc.history.aggression_delta(&config) + 0.1).abs() < 1e-9);
    assert!((effective_aggression(&npc, &config) - 0.7).abs() < 1e-9);
}

#[test]
fn test_tie_changes_nothing_but_the_turn() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    war.tactical_momentum = -2;
    war.attacker.strategic_momentum = 4;
    war.attacker.prepared = Some(Preparation::Attack);
    war.defender.modifiers.push(Modifier {
        id: ModifierId(1),
        name: "Ambush".to_string(),
        value: 3,
        duration: DurationPolicy::NextResolution,
    });
    // Attacker: 12 + 1 prepared = 13; defender: 8 + 3 ambush + 2 momentum = 13
    submit(
        &mut war,
        action(MainAction::Attack, MinorAction::Heal, 12),
        action(MainAction::Attack, MinorAction::Heal, 8),
    );

    let result = resolve(&mut war, &config);

    assert_eq!(result.attacker.total, result.defender.total);
    assert_eq!(result.winner, None);
    assert_eq!(result.margin, 0);
    assert!(result.damage.is_none());
    assert_eq!(war.tactical_momentum, -2);
    assert_eq!(war.attacker.strategic_momentum, 4);
    assert_eq!(war.attacker.warbar.current, 100);
    assert_eq!(war.defender.warbar.current, 100);
    assert_eq!(war.turn, 1);
    assert!(war.attacker.pending.is_none());
    assert!(war.defender.pending.is_none());
    // The attempt still spends preparations and one-shot modifiers
    assert_eq!(war.attacker.prepared, None);
    assert!(war.defender.modifiers.is_empty());
    assert_eq!(result.defender.expired_modifiers, vec!["Ambush".to_string()]);
}

#[test]
fn test_tie_is_not_learned() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    war.attacker.control = ControlMode::Npc(NpcConfig::new(
        Archetype::Nato,
        TechTier::Modern,
        Personality::Balanced,
        5,
    ));
    war.defender.pending = Some(action(MainAction::Attack, MinorAction::Heal, 10));

    let mut planner = Scripted(action(MainAction::Attack, MinorAction::Heal, 10));
    let outcome = resolve_turn(&mut war, &mut planner, &config).unwrap();

    let ResolveOutcome::Resolved(result) = outcome else {
        panic!("expected resolution");
    };
    assert_eq!(result.winner, None);
    assert!(result.attacker.generated);
    assert_eq!(result.attacker.decision_aggression, Some(0.5));
    assert!(war.attacker.npc().unwrap().history.is_empty());
    assert_eq!(
        result.attacker.npc_aggression,
        Some(effective_aggression(war.attacker.npc().unwrap(), &config))
    );
}

#[test]
fn test_reported_aggression_includes_this_turns_outcome() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    war.attacker.control = ControlMode::Npc(NpcConfig::new(
        Archetype::Csat,
        TechTier::Modern,
        Personality::Balanced,
        5,
    ));
    war.defender.pending = Some(action(MainAction::Attack, MinorAction::Sabotage, 1));
    let before = effective_aggression(war.attacker.npc().unwrap(), &config);

    let mut planner = Scripted(action(MainAction::Attack, MinorAction::PrepareAttack, 20));
    let ResolveOutcome::Resolved(result) = resolve_turn(&mut war, &mut planner, &config).unwrap() else {
        panic!("expected resolution");
    };

    assert_eq!(result.winner, Some(Side::Attacker));
    let after = effective_aggression(war.attacker.npc().unwrap(), &config);
    assert!(after > before);
    assert_eq!(result.attacker.npc_aggression, Some(after));
    assert_eq!(result.attacker.decision_aggression, Some(0.5));
    assert_eq!(result.defender.npc_aggression, None);
}

#[test]
fn test_npc_records_win_and_loss() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    for side in Side::BOTH {
        war.side_mut(side).control = ControlMode::Npc(NpcConfig::new(
            Archetype::Swarm,
            TechTier::Legacy,
            Personality::Aggressive,
            5,
        ));
    }
    war.attacker.modifiers.push(permanent(1, "Numbers", 5));

    let mut planner = Scripted(action(MainAction::Attack, MinorAction::PrepareAttack, 10));
    resolve_turn(&mut war, &mut planner, &config).unwrap();

    let attacker = &war.attacker.npc().unwrap().history;
    let defender = &war.defender.npc().unwrap().history;
    assert_eq!(attacker.wins(), 1);
    assert_eq!(defender.losses(), 1);
    assert_eq!(war.turn_phase(), TurnPhase::ReadyToResolve);
}

#[test]
fn test_defend_and_sabotage_bonuses() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    submit(
        &mut war,
        action(MainAction::Attack, MinorAction::Sabotage, 10),
        action(MainAction::Defend, MinorAction::Heal, 10),
    );

    let result = resolve(&mut war, &config);

    // Defender: 10 + 2 defend - 1 sabotage = 11
    assert_eq!(result.defender.total, 11);
    assert_eq!(result.winner, Some(Side::Defender));
    // Margin 1 -> tier 5, halved for a defensive win
    assert_eq!(result.damage.as_ref().unwrap().requested, 2);
    assert_eq!(war.attacker.warbar.current, 98);
}

#[test]
fn test_fortify_grants_one_shot_modifier() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    submit(
        &mut war,
        action(MainAction::Attack, MinorAction::Heal, 10),
        action(MainAction::Attack, MinorAction::Fortify, 10),
    );
    resolve(&mut war, &config);

    assert_eq!(war.defender.modifiers.len(), 1);
    assert_eq!(war.defender.modifiers[0].name, FORTIFIED_POSITION);

    submit(
        &mut war,
        action(MainAction::Attack, MinorAction::Heal, 10),
        action(MainAction::Attack, MinorAction::Heal, 10),
    );
    let result = resolve(&mut war, &config);

    assert_eq!(result.defender.total, 11);
    assert!(war.defender.modifiers.is_empty());
}

#[test]
fn test_heal_minor_restores_unassigned() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    submit(
        &mut war,
        action(MainAction::Attack, MinorAction::Heal, 20),
        action(MainAction::Attack, MinorAction::Heal, 1),
    );

    let result = resolve(&mut war, &config);

    // Margin 19 -> 20 damage, then the defender's heal gives back 5
    assert_eq!(result.damage.as_ref().unwrap().total_absorbed(), 20);
    assert_eq!(war.defender.unassigned, 85);
    assert_eq!(war.defender.warbar.current, 85);
    assert!(result
        .hooks
        .contains(&NarrativeHook::DecisiveVictory { side: Side::Attacker, margin: 19 }));
}

#[test]
fn test_strategic_momentum_multiplies_damage() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    war.attacker.strategic_momentum = 5;
    submit(
        &mut war,
        action(MainAction::Attack, MinorAction::Heal, 18),
        action(MainAction::Attack, MinorAction::Heal, 10),
    );

    let result = resolve(&mut war, &config);

    // Margin 8 -> 10, multiplier from momentum before the update: 1.5
    assert!((result.multiplier - 1.5).abs() < 1e-9);
    assert_eq!(result.damage.as_ref().unwrap().requested, 15);
    assert_eq!(war.attacker.strategic_momentum, 6);
}

#[test]
fn test_depleted_warbar_ends_war() {
    let config = CombatConfig::default();
    let mut war = War::new(WarId(1), "Short", "Red", "Blue", 10, &config);
    submit(
        &mut war,
        action(MainAction::Attack, MinorAction::Heal, 20),
        action(MainAction::Attack, MinorAction::Sabotage, 1),
    );

    let result = resolve(&mut war, &config);

    assert_eq!(
        war.status,
        WarStatus::Concluded {
            victor: Side::Attacker,
            reason: EndReason::WarbarDepleted
        }
    );
    assert!(result.hooks.contains(&NarrativeHook::WarConcluded {
        victor: Side::Attacker,
        reason: EndReason::WarbarDepleted
    }));
    assert!(resolve_turn(&mut war, &mut idle_planner(), &config).is_err());
}

#[test]
fn test_autonomous_turn_limit_favors_defender() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    for side in Side::BOTH {
        war.side_mut(side).control = ControlMode::Npc(NpcConfig::new(
            Archetype::Nato,
            TechTier::Modern,
            Personality::Balanced,
            5,
        ));
    }
    war.mode = ResolutionMode::Autonomous;
    war.auto_resolve.max_turns = 3;

    // Every turn ties, so only the limit can end the war
    let mut planner = Scripted(action(MainAction::Attack, MinorAction::Heal, 10));
    for _ in 0..3 {
        resolve_turn(&mut war, &mut planner, &config).unwrap();
    }

    assert_eq!(war.turn, 3);
    assert_eq!(
        war.status,
        WarStatus::Concluded {
            victor: Side::Defender,
            reason: EndReason::TurnLimit
        }
    );
}

#[test]
fn test_war_round_trips_through_json() {
    let config = CombatConfig::default();
    let mut war = new_war(&config);
    war.attacker.control = ControlMode::Npc(NpcConfig {
        history: OutcomeHistory::from_outcomes([BattleOutcome::Win, BattleOutcome::Loss], 5),
        ..NpcConfig::new(Archetype::Elite, TechTier::CuttingEdge, Personality::Adaptive, 5)
    });
    war.theaters.push(Theater::new(TheaterId(1), "Gulf", 12));
    war.defender.modifiers.push(Modifier {
        id: ModifierId(2),
        name: "Blockade".to_string(),
        value: -1,
        duration: DurationPolicy::Turns(2),
    });
    war.defender.pending = Some(action(MainAction::DeploySpecialUnit, MinorAction::Fortify, 7));

    let json = serde_json::to_string(&war).unwrap();
    let back: War = serde_json::from_str(&json).unwrap();

    assert_eq!(back, war);
}
