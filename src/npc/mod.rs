//! NPC factions - doctrine tables, action selection and outcome learning

pub mod decision;
pub mod learning;
pub mod profiles;

pub use decision::{ActionPlanner, DecisionContext, NpcCommander, NpcDecision};
pub use learning::{BattleOutcome, OutcomeHistory};
pub use profiles::{Archetype, NpcConfig, Personality, TechTier};
