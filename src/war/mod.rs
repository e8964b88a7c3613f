//! War system - turn-based conflicts between two sides
//!
//! Each turn both sides commit a main and a minor action plus a d20 roll.
//! Resolution is roll + modifiers + momentum; there is no stat comparison.
//! The loser's pools absorb the damage, and momentum carries into the next turn.

pub mod actions;
pub mod damage;
pub mod modifiers;
pub mod momentum;
pub mod pools;
pub mod resolver;
pub mod state;

// Re-exports for convenient access
pub use actions::{MainAction, MinorAction, PendingAction, Preparation, ROLL_MAX, ROLL_MIN};
pub use damage::{
    apply_subunit_damage, apply_theater_damage, distribute, heal, DamageReport, PoolDamage,
    PoolTransition, PoolUpdate,
};
pub use modifiers::{aggregate, expire_modifiers, AggregatorInput, DurationPolicy, Modifier, ModifierBreakdown};
pub use momentum::{damage_multiplier, next_tactical, MomentumState};
pub use pools::{PoolRef, SubUnit, SubUnitStatus, Theater, TheaterStatus};
pub use resolver::{
    resolve_turn, resolution_damage, tier_damage, NarrativeHook, ResolveOutcome, SideReport,
    TurnResult, FORTIFIED_POSITION,
};
pub use state::{
    AutoResolveSettings, ControlMode, EndReason, ResolutionMode, SideState, TurnPhase, War,
    WarStatus, SCHEMA_VERSION,
};
