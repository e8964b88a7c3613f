//! Damage distribution and direct pool operations
//!
//! Resolution damage is poured into the loser's pools in a fixed order:
//! the unassigned pool first, then every active theater and active sub-unit
//! in creation order. Whatever no pool can hold is discarded. The loser's
//! warbar drops by exactly what the pools absorbed.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, WarError};
use crate::core::types::{Side, SubUnitId, TheaterId};
use crate::war::pools::PoolRef;
use crate::war::state::{SideState, War};

/// One pool's share of a damage application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolDamage {
    pub pool: PoolRef,
    pub name: String,
    pub absorbed: u32,
}

/// Status changes triggered by damage or healing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolTransition {
    TheaterCaptured { theater: TheaterId, name: String, by: Side },
    SubUnitNeutralized { side: Side, unit: SubUnitId, name: String },
    SubUnitReactivated { side: Side, unit: SubUnitId, name: String },
}

/// Where resolution damage went
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    pub target: Side,
    pub requested: u32,
    pub absorbed: Vec<PoolDamage>,
    pub discarded: u32,
    pub transitions: Vec<PoolTransition>,
}

impl DamageReport {
    pub fn total_absorbed(&self) -> u32 {
        self.absorbed.iter().map(|p| p.absorbed).sum()
    }
}

/// Result of a direct damage or heal call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolUpdate {
    pub side: Side,
    pub pool: PoolRef,
    pub name: String,
    /// Amount actually applied after capacity limits
    pub applied: u32,
    /// Pool value afterwards; signed for theaters
    pub current: i64,
    pub max: u32,
    pub transition: Option<PoolTransition>,
}

/// Next pool in the merged creation-order walk
enum Target {
    Theater(usize),
    SubUnit(usize),
}

/// Active theaters and the loser's active sub-units, ordered by id
fn creation_order(war: &War, loser: Side) -> Vec<(u32, Target)> {
    let mut order: Vec<(u32, Target)> = war
        .theaters
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_active())
        .map(|(i, t)| (t.id.0, Target::Theater(i)))
        .chain(
            war.side(loser)
                .sub_units
                .iter()
                .enumerate()
                .filter(|(_, u)| u.is_active())
                .map(|(i, u)| (u.id.0, Target::SubUnit(i))),
        )
        .collect();
    order.sort_by_key(|(id, _)| *id);
    order
}

/// Spread `amount` of resolution damage over `loser`'s pools
pub fn distribute(war: &mut War, loser: Side, amount: u32) -> DamageReport {
    let winner = loser.opponent();
    let mut report = DamageReport {
        target: loser,
        requested: amount,
        absorbed: Vec::new(),
        discarded: 0,
        transitions: Vec::new(),
    };
    let mut remaining = amount;

    {
        let state = war.side_mut(loser);
        let taken = remaining.min(state.unassigned);
        if taken > 0 {
            state.unassigned -= taken;
            remaining -= taken;
            report.absorbed.push(PoolDamage {
                pool: PoolRef::Unassigned,
                name: "Unassigned".to_string(),
                absorbed: taken,
            });
        }
    }

    for (_, target) in creation_order(war, loser) {
        if remaining == 0 {
            break;
        }
        match target {
            Target::Theater(index) => {
                let theater = &mut war.theaters[index];
                let taken = theater.push(winner, remaining);
                if taken == 0 {
                    continue;
                }
                remaining -= taken;
                report.absorbed.push(PoolDamage {
                    pool: PoolRef::Theater(theater.id),
                    name: theater.name.clone(),
                    absorbed: taken,
                });
                if !theater.is_active() {
                    report.transitions.push(PoolTransition::TheaterCaptured {
                        theater: theater.id,
                        name: theater.name.clone(),
                        by: winner,
                    });
                }
            }
            Target::SubUnit(index) => {
                let unit = &mut war.side_mut(loser).sub_units[index];
                let taken = unit.damage(remaining);
                if taken == 0 {
                    continue;
                }
                remaining -= taken;
                report.absorbed.push(PoolDamage {
                    pool: PoolRef::SubUnit(unit.id),
                    name: unit.name.clone(),
                    absorbed: taken,
                });
                if !unit.is_active() {
                    report.transitions.push(PoolTransition::SubUnitNeutralized {
                        side: loser,
                        unit: unit.id,
                        name: unit.name.clone(),
                    });
                }
            }
        }
    }

    report.discarded = remaining;
    let absorbed = report.total_absorbed();
    war.side_mut(loser).warbar.drain(absorbed);

    tracing::debug!(
        "War {}: {} took {} of {} damage ({} discarded)",
        war.id,
        loser,
        absorbed,
        amount,
        report.discarded
    );

    report
}

fn ensure_positive(amount: u32) -> Result<()> {
    if amount == 0 {
        return Err(WarError::InvalidAmount("amount must be positive".to_string()));
    }
    Ok(())
}

/// Push a theater directly; positive amounts push toward attacker capture
///
/// The side pushed against loses warbar equal to what the theater absorbed.
pub fn apply_theater_damage(war: &mut War, theater_id: TheaterId, amount: i32) -> Result<PoolUpdate> {
    if amount == 0 {
        return Err(WarError::InvalidAmount("theater damage must be non-zero".to_string()));
    }
    let pusher = if amount > 0 { Side::Attacker } else { Side::Defender };

    let theater = war
        .theater_mut(theater_id)
        .ok_or(WarError::TheaterNotFound(theater_id))?;
    if !theater.is_active() {
        return Err(WarError::TheaterClosed(theater_id));
    }

    let applied = theater.push(pusher, amount.unsigned_abs());
    let transition = (!theater.is_active()).then(|| PoolTransition::TheaterCaptured {
        theater: theater.id,
        name: theater.name.clone(),
        by: pusher,
    });
    let (name, current, max) = (theater.name.clone(), theater.current, theater.max);

    let target = war.side_mut(pusher.opponent());
    target.warbar.drain(applied);
    target.clamp_unassigned();

    Ok(PoolUpdate {
        side: pusher.opponent(),
        pool: PoolRef::Theater(theater_id),
        name,
        applied,
        current: i64::from(current),
        max,
        transition,
    })
}

/// Damage one of `side`'s sub-units directly
pub fn apply_subunit_damage(war: &mut War, side: Side, unit_id: SubUnitId, amount: u32) -> Result<PoolUpdate> {
    ensure_positive(amount)?;

    let state = war.side_mut(side);
    let unit = state
        .sub_unit_mut(unit_id)
        .ok_or(WarError::SubUnitNotFound(side, unit_id))?;

    let was_active = unit.is_active();
    let applied = unit.damage(amount);
    let transition = (was_active && !unit.is_active()).then(|| PoolTransition::SubUnitNeutralized {
        side,
        unit: unit.id,
        name: unit.name.clone(),
    });
    let (name, current, max) = (unit.name.clone(), unit.current, unit.max);

    state.warbar.drain(applied);

    Ok(PoolUpdate {
        side,
        pool: PoolRef::SubUnit(unit_id),
        name,
        applied,
        current: i64::from(current),
        max,
        transition,
    })
}

/// Restore a side's unassigned pool, bounded by its cap and by the warbar
pub(crate) fn heal_unassigned(state: &mut SideState, amount: u32) -> u32 {
    let room = state.unassigned_cap().saturating_sub(state.unassigned);
    let given = state.warbar.restore(amount.min(room));
    state.unassigned += given;
    given
}

/// Heal one of `side`'s pools; healing is only ever explicit
pub fn heal(war: &mut War, side: Side, pool: PoolRef, amount: u32) -> Result<PoolUpdate> {
    ensure_positive(amount)?;

    match pool {
        PoolRef::Unassigned => {
            let state = war.side_mut(side);
            let applied = heal_unassigned(state, amount);
            Ok(PoolUpdate {
                side,
                pool,
                name: "Unassigned".to_string(),
                applied,
                current: i64::from(state.unassigned),
                max: state.unassigned_cap(),
                transition: None,
            })
        }
        PoolRef::SubUnit(unit_id) => {
            let state = war.side_mut(side);
            let unit = state
                .sub_unit_mut(unit_id)
                .ok_or(WarError::SubUnitNotFound(side, unit_id))?;

            let was_active = unit.is_active();
            let applied = unit.heal(amount);
            let transition = (!was_active && unit.is_active()).then(|| PoolTransition::SubUnitReactivated {
                side,
                unit: unit.id,
                name: unit.name.clone(),
            });
            let (name, current, max) = (unit.name.clone(), unit.current, unit.max);

            state.warbar.restore(applied);

            Ok(PoolUpdate {
                side,
                pool,
                name,
                applied,
                current: i64::from(current),
                max,
                transition,
            })
        }
        PoolRef::Theater(theater_id) => {
            let theater = war
                .theater_mut(theater_id)
                .ok_or(WarError::TheaterNotFound(theater_id))?;
            if !theater.is_active() {
                return Err(WarError::TheaterClosed(theater_id));
            }

            let applied = theater.relieve(side, amount);
            let (name, current, max) = (theater.name.clone(), theater.current, theater.max);

            war.side_mut(side).warbar.restore(applied);

            Ok(PoolUpdate {
                side,
                pool,
                name,
                applied,
                current: i64::from(current),
                max,
                transition: None,
            })
        }
    }
}
