//! NPC action selection
//!
//! Aggression comes from archetype + personality + learning. The main action
//! is sampled from a blended bias distribution weighted by that aggression;
//! the minor action comes from the archetype's preference table; the roll is
//! a fair d20.

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::CombatConfig;
use crate::core::types::Side;
use crate::npc::profiles::{ActionBias, Archetype, NpcConfig, Personality};
use crate::war::actions::{MainAction, MinorAction, PendingAction, ROLL_MAX, ROLL_MIN};

/// What the NPC knows about the war when it decides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionContext {
    pub side: Side,
    pub tactical_momentum: i32,
    pub own_strategic: u32,
    pub opponent_strategic: u32,
}

impl DecisionContext {
    /// Whether momentum currently runs this side's way
    ///
    /// Tactical momentum decides; on a tactical tie, strictly more strategic
    /// momentum than the opponent counts as favorable.
    pub fn holds_favorable_momentum(&self) -> bool {
        match Side::favored_by(self.tactical_momentum) {
            Some(side) => side == self.side,
            None => self.own_strategic > self.opponent_strategic,
        }
    }
}

/// A generated action plus the reasoning behind it
#[derive(Debug, Clone, PartialEq)]
pub struct NpcDecision {
    pub action: PendingAction,
    pub aggression: f64,
    /// Sampling weights over [attack, defend, deploy special unit]
    pub weights: [f64; 3],
}

/// Chooses actions for NPC-controlled sides
///
/// The resolver only talks to this trait, so tests and tools can script NPCs.
pub trait ActionPlanner {
    fn plan(&mut self, npc: &NpcConfig, context: &DecisionContext) -> NpcDecision;
}

/// Default planner backed by a seedable RNG
pub struct NpcCommander {
    config: CombatConfig,
    rng: ChaCha8Rng,
}

impl NpcCommander {
    /// Create a commander seeded from OS entropy
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Create with specific RNG seed for deterministic behavior
    pub fn with_seed(config: CombatConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl ActionPlanner for NpcCommander {
    fn plan(&mut self, npc: &NpcConfig, context: &DecisionContext) -> NpcDecision {
        decide(npc, context, &self.config, &mut self.rng)
    }
}

/// Archetype + personality + learning, clamped to the configured range
pub fn effective_aggression(npc: &NpcConfig, config: &CombatConfig) -> f64 {
    let raw = npc.archetype.profile().aggression
        + npc.personality.profile().aggression_modifier
        + npc.history.aggression_delta(config);
    raw.clamp(config.aggression_min, config.aggression_max)
}

/// Blend personality (dominant) with archetype bias, then apply the adaptive shift
pub fn action_distribution(
    archetype: Archetype,
    personality: Personality,
    context: &DecisionContext,
    config: &CombatConfig,
) -> ActionBias {
    let w = config.personality_weight;
    let personal = personality.profile().action_bias;
    let doctrinal = archetype.profile().action_bias;

    let mut dist = [0.0; 3];
    for i in 0..3 {
        dist[i] = w * personal[i] + (1.0 - w) * doctrinal[i];
    }

    if personality == Personality::Adaptive {
        let (attack, defend) = (MainAction::Attack.index(), MainAction::Defend.index());
        if context.holds_favorable_momentum() {
            let moved = config.adaptive_shift.min(dist[defend]);
            dist[defend] -= moved;
            dist[attack] += moved;
        } else {
            let moved = config.adaptive_shift.min(dist[attack]);
            dist[attack] -= moved;
            dist[defend] += moved;
        }
    }

    dist
}

/// Sampling weights: attack scales with aggression, defend with its complement
pub fn main_action_weights(distribution: ActionBias, aggression: f64) -> [f64; 3] {
    let mut weights = distribution;
    weights[MainAction::Attack.index()] *= aggression;
    weights[MainAction::Defend.index()] *= 1.0 - aggression;
    weights
}

fn sample_main<R: Rng + ?Sized>(weights: &[f64; 3], rng: &mut R) -> MainAction {
    match WeightedIndex::new(weights.iter()) {
        Ok(index) => MainAction::ALL[index.sample(rng)],
        // All-zero weights: hold the line
        Err(_) => MainAction::Defend,
    }
}

/// Pick a minor action from the archetype's preference table
pub fn choose_minor<R: Rng + ?Sized>(archetype: Archetype, rng: &mut R) -> MinorAction {
    pick_minor(archetype.profile().minor_preferences, rng)
}

/// Weighted pick over `preferences`; uniform over every minor action when the
/// table is empty or carries no weight
pub fn pick_minor<R: Rng + ?Sized>(preferences: &[(MinorAction, f64)], rng: &mut R) -> MinorAction {
    let weighted = WeightedIndex::new(preferences.iter().map(|(_, weight)| *weight));

    match weighted {
        Ok(index) => preferences[index.sample(rng)].0,
        Err(_) => MinorAction::ALL[rng.gen_range(0..MinorAction::ALL.len())],
    }
}

/// Produce a full action for one NPC side
pub fn decide<R: Rng + ?Sized>(
    npc: &NpcConfig,
    context: &DecisionContext,
    config: &CombatConfig,
    rng: &mut R,
) -> NpcDecision {
    let aggression = effective_aggression(npc, config);
    let distribution = action_distribution(npc.archetype, npc.personality, context, config);
    let weights = main_action_weights(distribution, aggression);

    let main = sample_main(&weights, rng);
    let minor = choose_minor(npc.archetype, rng);
    let roll = rng.gen_range(ROLL_MIN..=ROLL_MAX);

    tracing::debug!(
        side = %context.side,
        %main,
        %minor,
        roll,
        aggression,
        "NPC chose action"
    );

    NpcDecision {
        action: PendingAction::generated(main, minor, roll),
        aggression,
        weights,
    }
}
