//! NPC learning: a bounded window of recent battle outcomes
//!
//! The window itself is the decay mechanism. Nothing is forgotten early;
//! an outcome simply stops counting once N newer ones have arrived.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::config::CombatConfig;

/// Result of a resolved turn from one NPC side's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Win,
    Loss,
}

/// Last N outcomes, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeHistory {
    outcomes: VecDeque<BattleOutcome>,
    capacity: usize,
}

impl OutcomeHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a history from raw outcomes, keeping only the newest `capacity`
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = BattleOutcome>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        for outcome in outcomes {
            history.record(outcome);
        }
        history
    }

    /// Append the newest outcome, dropping the oldest past capacity
    pub fn record(&mut self, outcome: BattleOutcome) {
        self.outcomes.push_back(outcome);
        while self.outcomes.len() > self.capacity {
            self.outcomes.pop_front();
        }
    }

    /// Shrink or grow the window; excess oldest entries are dropped
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.outcomes.len() > self.capacity {
            self.outcomes.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = BattleOutcome> + '_ {
        self.outcomes.iter().copied()
    }

    pub fn wins(&self) -> usize {
        self.iter().filter(|o| *o == BattleOutcome::Win).count()
    }

    pub fn losses(&self) -> usize {
        self.iter().filter(|o| *o == BattleOutcome::Loss).count()
    }

    /// Aggression adjustment from the current window
    pub fn aggression_delta(&self, config: &CombatConfig) -> f64 {
        learning_delta(self.iter(), config)
    }
}

/// Sum of per-outcome contributions: wins add, losses subtract
pub fn learning_delta(
    outcomes: impl IntoIterator<Item = BattleOutcome>,
    config: &CombatConfig,
) -> f64 {
    outcomes
        .into_iter()
        .map(|outcome| match outcome {
            BattleOutcome::Win => config.learning_win_delta,
            BattleOutcome::Loss => config.learning_loss_delta,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use BattleOutcome::{Loss, Win};

    #[test]
    fn test_window_drops_oldest() {
        let mut history = OutcomeHistory::new(5);
        for outcome in [Loss, Win, Win, Win, Win, Win] {
            history.record(outcome);
        }
        assert_eq!(history.len(), 5);
        assert_eq!(history.losses(), 0);
        assert_eq!(history.iter().next(), Some(Win));
    }

    #[test]
    fn test_delta_three_wins_two_losses() {
        let config = CombatConfig::default();
        let history = OutcomeHistory::from_outcomes([Win, Loss, Win, Loss, Win], 5);
        assert!((history.aggression_delta(&config) - (-0.1)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_history_has_no_delta() {
        let config = CombatConfig::default();
        assert_eq!(OutcomeHistory::new(5).aggression_delta(&config), 0.0);
    }

    #[test]
    fn test_set_capacity_trims() {
        let mut history = OutcomeHistory::from_outcomes([Win, Win, Loss, Loss], 5);
        history.set_capacity(2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.wins(), 0);
    }
}
