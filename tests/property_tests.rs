//! Property tests for the combat engine

use proptest::prelude::*;

use frontline::core::config::CombatConfig;
use frontline::core::types::{ModifierId, Side, SubUnitId, TheaterId, WarId};
use frontline::npc::learning::{BattleOutcome, OutcomeHistory};
use frontline::war::*;

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Attacker), Just(Side::Defender)]
}

fn outcome_strategy() -> impl Strategy<Value = BattleOutcome> {
    prop_oneof![Just(BattleOutcome::Win), Just(BattleOutcome::Loss)]
}

fn modifiers_from(values: &[i32]) -> Vec<Modifier> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| Modifier {
            id: ModifierId(i as u32 + 1),
            name: format!("Mod {}", i),
            value: *value,
            duration: DurationPolicy::Permanent,
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_aggregate_ignores_modifier_order(
        values in prop::collection::vec(-10i32..10, 0..8),
        rotation in 0usize..8,
        tactical in -3i32..=3,
    ) {
        let config = CombatConfig::default();
        let modifiers = modifiers_from(&values);
        let mut shuffled = modifiers.clone();
        if !shuffled.is_empty() {
            let by = rotation % shuffled.len();
            shuffled.rotate_left(by);
        }
        shuffled.reverse();

        let total = |modifiers: &[Modifier]| aggregate(&AggregatorInput {
            side: Side::Defender,
            modifiers,
            main: MainAction::Defend,
            prepared: Some(Preparation::Attack),
            opponent_minor: MinorAction::Sabotage,
            tactical_momentum: tactical,
        }, &config).total;

        prop_assert_eq!(total(&modifiers), total(&shuffled));
    }

    #[test]
    fn prop_momentum_stays_in_bounds(winners in prop::collection::vec(prop::option::of(side_strategy()), 0..60)) {
        let config = CombatConfig::default();
        let mut state = MomentumState { tactical: 0, attacker_strategic: 0, defender_strategic: 0 };
        for winner in winners {
            let next = state.after_resolution(winner, &config);
            prop_assert!(next.tactical.abs() <= config.tactical_momentum_cap);
            prop_assert!(next.attacker_strategic <= config.strategic_momentum_cap);
            prop_assert!(next.defender_strategic <= config.strategic_momentum_cap);
            if winner.is_none() {
                prop_assert_eq!(next, state);
            } else {
                prop_assert_eq!(Side::favored_by(next.tactical), winner);
            }
            state = next;
        }
    }

    #[test]
    fn prop_multiplier_monotonic_and_capped(a in 0u32..40, b in 0u32..40) {
        let config = CombatConfig::default();
        let (low, high) = (a.min(b), a.max(b));
        prop_assert!(damage_multiplier(low, &config) <= damage_multiplier(high, &config));
        prop_assert!(damage_multiplier(high, &config) <= 2.0);
        prop_assert!(damage_multiplier(low, &config) >= 1.0);
    }

    #[test]
    fn prop_distribution_conserves_damage(
        amount in 0u32..300,
        unassigned in 0u32..50,
        theater_caps in prop::collection::vec(1u32..30, 0..4),
        unit_caps in prop::collection::vec(1u32..30, 0..4),
        loser in side_strategy(),
    ) {
        let config = CombatConfig::default();
        let mut war = War::new(WarId(1), "Prop", "A", "B", 200, &config);
        for (i, cap) in theater_caps.iter().enumerate() {
            let id = TheaterId(war.allocate_pool_id());
            war.theaters.push(Theater::new(id, format!("T{}", i), *cap));
        }
        for (i, cap) in unit_caps.iter().enumerate() {
            let id = SubUnitId(war.allocate_pool_id());
            war.side_mut(loser).sub_units.push(SubUnit::new(id, format!("U{}", i), *cap));
        }
        war.side_mut(loser).unassigned = unassigned;
        let warbar_before = war.side(loser).warbar.current;

        let report = distribute(&mut war, loser, amount);

        prop_assert!(report.total_absorbed() <= amount);
        prop_assert_eq!(report.total_absorbed() + report.discarded, amount);
        prop_assert_eq!(
            war.side(loser).warbar.current,
            warbar_before.saturating_sub(report.total_absorbed())
        );
        for theater in &war.theaters {
            prop_assert!(theater.current.unsigned_abs() <= theater.max);
            prop_assert_eq!(theater.is_active(), theater.current.unsigned_abs() < theater.max);
        }
        for unit in &war.side(loser).sub_units {
            prop_assert!(unit.current <= unit.max);
            prop_assert_eq!(unit.is_active(), unit.current > 0);
        }
        prop_assert!(war.side(loser.opponent()).sub_units.is_empty());
    }

    #[test]
    fn prop_sub_unit_status_tracks_health(max in 1u32..50, hits in prop::collection::vec(0u32..30, 1..10)) {
        let mut unit = SubUnit::new(SubUnitId(1), "Unit", max);
        for hit in hits {
            unit.damage(hit);
            prop_assert_eq!(unit.status == SubUnitStatus::Neutralized, unit.current == 0);
        }
        if unit.current == 0 {
            prop_assert_eq!(unit.heal(1), 1);
            prop_assert!(unit.is_active());
        }
    }

    #[test]
    fn prop_history_window_is_bounded(outcomes in prop::collection::vec(outcome_strategy(), 0..30)) {
        let config = CombatConfig::default();
        let history = OutcomeHistory::from_outcomes(outcomes.clone(), config.learning_window);

        prop_assert!(history.len() <= config.learning_window);
        prop_assert_eq!(history.aggression_delta(&config), history.aggression_delta(&config));

        let recent: Vec<BattleOutcome> = outcomes
            .iter()
            .copied()
            .skip(outcomes.len().saturating_sub(config.learning_window))
            .collect();
        prop_assert_eq!(history.iter().collect::<Vec<_>>(), recent);
    }

    #[test]
    fn prop_normalize_is_idempotent(
        tactical in -20i32..20,
        strategic in 0u32..30,
        theater_value in -50i32..50,
    ) {
        let config = CombatConfig::default();
        let mut war = War::new(WarId(1), "Prop", "A", "B", 100, &config);
        war.tactical_momentum = tactical;
        war.attacker.strategic_momentum = strategic;
        let mut theater = Theater::new(TheaterId(1), "Edited", 20);
        theater.current = theater_value;
        war.theaters.push(theater);

        war.normalize(&config);
        let once = war.clone();
        let repairs = war.normalize(&config);

        prop_assert!(repairs.is_empty());
        prop_assert_eq!(war, once);
    }
}
