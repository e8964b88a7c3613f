//! Dual-track momentum
//!
//! Tactical momentum is one shared signed value that swings between the
//! sides. Strategic momentum is tracked per side and is not zero-sum: both
//! sides may hold some at once.

use serde::{Deserialize, Serialize};

use crate::core::config::CombatConfig;
use crate::core::types::Side;

/// Momentum values after a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MomentumState {
    pub tactical: i32,
    pub attacker_strategic: u32,
    pub defender_strategic: u32,
}

impl MomentumState {
    pub fn strategic(&self, side: Side) -> u32 {
        match side {
            Side::Attacker => self.attacker_strategic,
            Side::Defender => self.defender_strategic,
        }
    }

    fn strategic_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::Attacker => &mut self.attacker_strategic,
            Side::Defender => &mut self.defender_strategic,
        }
    }

    /// Clamp every track to its configured bounds
    pub fn clamped(mut self, config: &CombatConfig) -> Self {
        let cap = config.tactical_momentum_cap;
        self.tactical = self.tactical.clamp(-cap, cap);
        self.attacker_strategic = self.attacker_strategic.min(config.strategic_momentum_cap);
        self.defender_strategic = self.defender_strategic.min(config.strategic_momentum_cap);
        self
    }

    /// Apply one resolution's outcome; `None` is a tie and changes nothing
    pub fn after_resolution(self, winner: Option<Side>, config: &CombatConfig) -> Self {
        let Some(winner) = winner else {
            return self.clamped(config);
        };

        let mut next = self.clamped(config);
        next.tactical = next_tactical(next.tactical, winner, config.tactical_momentum_cap);

        let won = next.strategic_mut(winner);
        *won = (*won + 1).min(config.strategic_momentum_cap);
        let lost = next.strategic_mut(winner.opponent());
        *lost = lost.saturating_sub(1);

        next
    }
}

/// Tactical momentum after `winner` takes a turn
///
/// A winner already holding the favorable sign gains one step; any other
/// winner (reversal or from neutral) starts again at magnitude 1.
pub fn next_tactical(current: i32, winner: Side, cap: i32) -> i32 {
    let direction = winner.sign();
    let magnitude = if Side::favored_by(current) == Some(winner) {
        (current.abs() + 1).min(cap)
    } else {
        1
    };
    direction * magnitude
}

/// Damage multiplier for the winner of the current resolution
pub fn damage_multiplier(winner_strategic: u32, config: &CombatConfig) -> f64 {
    let raw = 1.0 + winner_strategic as f64 / config.strategic_divisor;
    raw.min(config.damage_multiplier_cap)
}
