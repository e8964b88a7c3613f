//! Modifiers and the modifier aggregator
//!
//! Combat is purely modifier + roll + momentum. There is deliberately no
//! stat comparison term: faction strength only enters through modifiers a GM
//! grants explicitly.

use serde::{Deserialize, Serialize};

use crate::core::config::CombatConfig;
use crate::core::types::{ModifierId, Side};
use crate::war::actions::{MainAction, MinorAction, Preparation};

/// How long a modifier stays in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "turns", rename_all = "snake_case")]
pub enum DurationPolicy {
    Permanent,
    NextResolution,
    Turns(u32),
}

/// A named, signed bonus attached to one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub id: ModifierId,
    pub name: String,
    pub value: i32,
    pub duration: DurationPolicy,
}

impl Modifier {
    /// A modifier still counts while it has turns left
    pub fn is_valid(&self) -> bool {
        !matches!(self.duration, DurationPolicy::Turns(0))
    }
}

/// Advance modifier durations after a resolution attempt
///
/// NextResolution modifiers are dropped, Turns(n) count down and are dropped
/// at zero, Permanent modifiers stay. Returns the names of expired modifiers.
pub fn expire_modifiers(modifiers: &mut Vec<Modifier>) -> Vec<String> {
    let mut expired = Vec::new();

    modifiers.retain_mut(|modifier| {
        let keep = match &mut modifier.duration {
            DurationPolicy::Permanent => true,
            DurationPolicy::NextResolution => false,
            DurationPolicy::Turns(turns) => {
                *turns = turns.saturating_sub(1);
                *turns > 0
            }
        };
        if !keep {
            expired.push(modifier.name.clone());
        }
        keep
    });

    expired
}

/// Everything the aggregator looks at for one side
#[derive(Debug, Clone, Copy)]
pub struct AggregatorInput<'a> {
    pub side: Side,
    pub modifiers: &'a [Modifier],
    pub main: MainAction,
    pub prepared: Option<Preparation>,
    pub opponent_minor: MinorAction,
    /// Shared signed tactical momentum (positive favors the attacker)
    pub tactical_momentum: i32,
}

/// Labelled contributions and their sum, for the command layer to render
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModifierBreakdown {
    pub entries: Vec<(String, i32)>,
    pub total: i32,
}

impl ModifierBreakdown {
    fn push(&mut self, label: impl Into<String>, value: i32) {
        self.entries.push((label.into(), value));
        self.total += value;
    }
}

/// Combine a side's bonuses into one signed total added to its d20
pub fn aggregate(input: &AggregatorInput, config: &CombatConfig) -> ModifierBreakdown {
    let mut breakdown = ModifierBreakdown::default();

    for modifier in input.modifiers.iter().filter(|m| m.is_valid()) {
        breakdown.push(modifier.name.clone(), modifier.value);
    }

    if input.main == MainAction::Defend {
        breakdown.push("Defense Stance", config.defend_bonus);
    }

    if let Some(preparation) = input.prepared {
        breakdown.push(preparation.label(), config.prepare_bonus);
    }

    if input.opponent_minor == MinorAction::Sabotage {
        breakdown.push("Enemy Sabotage", -config.sabotage_penalty);
    }

    // Only the favored side draws on tactical momentum
    if Side::favored_by(input.tactical_momentum) == Some(input.side) {
        breakdown.push("Tactical Momentum", input.tactical_momentum.abs());
    }

    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifier(id: u32, value: i32, duration: DurationPolicy) -> Modifier {
        Modifier {
            id: ModifierId(id),
            name: format!("mod {}", id),
            value,
            duration,
        }
    }

    fn input<'a>(side: Side, modifiers: &'a [Modifier]) -> AggregatorInput<'a> {
        AggregatorInput {
            side,
            modifiers,
            main: MainAction::Attack,
            prepared: None,
            opponent_minor: MinorAction::Heal,
            tactical_momentum: 0,
        }
    }

    #[test]
    fn test_permanent_modifiers_sum() {
        let mods = vec![
            modifier(1, 2, DurationPolicy::Permanent),
            modifier(2, 1, DurationPolicy::Permanent),
            modifier(3, -1, DurationPolicy::Permanent),
        ];
        let config = CombatConfig::default();
        let total = aggregate(&input(Side::Attacker, &mods), &config).total;
        assert_eq!(total, 2);

        let reversed: Vec<Modifier> = mods.iter().rev().cloned().collect();
        assert_eq!(aggregate(&input(Side::Attacker, &reversed), &config).total, 2);
    }

    #[test]
    fn test_defend_bonus() {
        let config = CombatConfig::default();
        let mut inp = input(Side::Defender, &[]);
        inp.main = MainAction::Defend;
        assert_eq!(aggregate(&inp, &config).total, 2);
    }

    #[test]
    fn test_preparation_bonus() {
        let config = CombatConfig::default();
        let mut inp = input(Side::Attacker, &[]);
        inp.prepared = Some(Preparation::Attack);
        let breakdown = aggregate(&inp, &config);
        assert_eq!(breakdown.total, 1);
        assert_eq!(breakdown.entries[0].0, "Prepared Attack");
    }

    #[test]
    fn test_opponent_sabotage_penalty() {
        let config = CombatConfig::default();
        let mut inp = input(Side::Attacker, &[]);
        inp.opponent_minor = MinorAction::Sabotage;
        assert_eq!(aggregate(&inp, &config).total, -1);
    }

    #[test]
    fn test_tactical_momentum_only_for_favored_side() {
        let config = CombatConfig::default();
        let mut attacker = input(Side::Attacker, &[]);
        attacker.tactical_momentum = -2;
        assert_eq!(aggregate(&attacker, &config).total, 0);

        let mut defender = input(Side::Defender, &[]);
        defender.tactical_momentum = -2;
        assert_eq!(aggregate(&defender, &config).total, 2);

        let mut neutral = input(Side::Defender, &[]);
        neutral.tactical_momentum = 0;
        assert!(aggregate(&neutral, &config).entries.is_empty());
    }

    #[test]
    fn test_exhausted_modifier_ignored() {
        let config = CombatConfig::default();
        let mods = vec![modifier(1, 5, DurationPolicy::Turns(0))];
        assert_eq!(aggregate(&input(Side::Attacker, &mods), &config).total, 0);
    }

    #[test]
    fn test_expire_modifiers() {
        let mut mods = vec![
            modifier(1, 1, DurationPolicy::Permanent),
            modifier(2, 1, DurationPolicy::NextResolution),
            modifier(3, 1, DurationPolicy::Turns(2)),
            modifier(4, 1, DurationPolicy::Turns(1)),
        ];

        let expired = expire_modifiers(&mut mods);

        assert_eq!(expired, vec!["mod 2".to_string(), "mod 4".to_string()]);
        assert_eq!(mods.len(), 2);
        assert_eq!(mods[1].duration, DurationPolicy::Turns(1));
    }
}
