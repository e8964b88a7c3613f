//! Combat configuration with documented constants
//!
//! Every tunable number in the resolver, momentum model and NPC engine is
//! collected here. Values can be overridden from a TOML file; any key left out
//! keeps its default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, WarError};

/// Configuration for combat resolution and NPC behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === MODIFIERS ===
    /// Bonus for choosing Defend as the main action
    pub defend_bonus: i32,

    /// One-shot bonus at the next resolution after a prepare minor action
    pub prepare_bonus: i32,

    /// Penalty applied to a side whose opponent chose Sabotage this turn
    pub sabotage_penalty: i32,

    /// Value of the modifier granted by the Fortify minor action
    ///
    /// Lasts for the next resolution only.
    pub fortify_bonus: i32,

    /// HP restored to the acting side's unassigned pool by the Heal minor action
    pub minor_heal_amount: u32,

    // === MOMENTUM ===
    /// Maximum magnitude of the shared tactical momentum value
    pub tactical_momentum_cap: i32,

    /// Upper bound of each side's strategic momentum
    pub strategic_momentum_cap: u32,

    /// Strategic momentum is divided by this before being added to 1.0
    ///
    /// At 10.0, each point of strategic momentum adds 10% damage.
    pub strategic_divisor: f64,

    /// Ceiling for the damage multiplier
    pub damage_multiplier_cap: f64,

    // === DAMAGE ===
    /// Margin tiers as (max margin, base damage), checked in order
    ///
    /// Margins above the last tier deal `decisive_damage`.
    pub damage_tiers: Vec<(u32, u32)>,

    /// Base damage for margins beyond every tier
    pub decisive_damage: u32,

    /// Scale on base damage when the winner's main action was Defend
    pub defend_damage_factor: f64,

    /// Scale on base damage when the winner deployed a special unit
    pub special_unit_damage_factor: f64,

    // === NPC ===
    /// Lower bound of effective NPC aggression
    pub aggression_min: f64,

    /// Upper bound of effective NPC aggression
    pub aggression_max: f64,

    /// Weight of the personality bias when blended with the archetype bias
    ///
    /// Must be above 0.5 so personality stays the dominant signal.
    pub personality_weight: f64,

    /// Probability mass moved by the Adaptive personality toward attack or defend
    pub adaptive_shift: f64,

    /// Number of recent outcomes an NPC remembers
    pub learning_window: usize,

    /// Aggression gained per remembered win
    pub learning_win_delta: f64,

    /// Aggression gained per remembered loss (negative)
    pub learning_loss_delta: f64,

    // === WAR LIFECYCLE ===
    /// Default turn limit for autonomous wars; reaching it hands victory to the defender
    pub max_turns: u32,

    /// Default seconds between scheduled resolutions of an autonomous war
    pub auto_resolve_interval_secs: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            defend_bonus: 2,
            prepare_bonus: 1,
            sabotage_penalty: 1,
            fortify_bonus: 1,
            minor_heal_amount: 5,

            tactical_momentum_cap: 3,
            strategic_momentum_cap: 10,
            strategic_divisor: 10.0,
            damage_multiplier_cap: 2.0,

            // Narrow, marginal, clear; anything above is decisive
            damage_tiers: vec![(5, 5), (10, 10), (15, 15)],
            decisive_damage: 20,
            defend_damage_factor: 0.5,
            special_unit_damage_factor: 0.75,

            aggression_min: 0.05,
            aggression_max: 0.95,
            personality_weight: 0.7,
            adaptive_shift: 0.2,
            learning_window: 5,
            learning_win_delta: 0.1,
            learning_loss_delta: -0.2,

            max_turns: 50,
            auto_resolve_interval_secs: 12 * 60 * 60,
        }
    }
}

impl CombatConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!("Loaded combat config from {:?}", path);
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: CombatConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.tactical_momentum_cap < 1 {
            return Err(WarError::Configuration(format!(
                "tactical_momentum_cap ({}) must be at least 1",
                self.tactical_momentum_cap
            )));
        }

        if self.strategic_divisor <= 0.0 {
            return Err(WarError::Configuration(
                "strategic_divisor must be positive".into(),
            ));
        }

        if self.damage_multiplier_cap < 1.0 {
            return Err(WarError::Configuration(format!(
                "damage_multiplier_cap ({}) must be >= 1.0",
                self.damage_multiplier_cap
            )));
        }

        // Tiers must be strictly increasing in margin
        if self.damage_tiers.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(WarError::Configuration(
                "damage_tiers must be sorted by strictly increasing margin".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.defend_damage_factor)
            || !(0.0..=1.0).contains(&self.special_unit_damage_factor)
        {
            return Err(WarError::Configuration(
                "non-attack damage factors must be within [0, 1]".into(),
            ));
        }

        if !(0.0 <= self.aggression_min
            && self.aggression_min < self.aggression_max
            && self.aggression_max <= 1.0)
        {
            return Err(WarError::Configuration(format!(
                "aggression bounds [{}, {}] must satisfy 0 <= min < max <= 1",
                self.aggression_min, self.aggression_max
            )));
        }

        if !(0.5..=1.0).contains(&self.personality_weight) {
            return Err(WarError::Configuration(format!(
                "personality_weight ({}) must be within [0.5, 1.0]",
                self.personality_weight
            )));
        }

        if self.learning_window == 0 {
            return Err(WarError::Configuration(
                "learning_window must be at least 1".into(),
            ));
        }

        if self.max_turns == 0 || self.auto_resolve_interval_secs == 0 {
            return Err(WarError::Configuration(
                "max_turns and auto_resolve_interval_secs must be positive".into(),
            ));
        }

        Ok(())
    }
}
