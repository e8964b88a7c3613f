//! Theaters and sub-units: the named HP pools under a war's warbar

use serde::{Deserialize, Serialize};

use crate::core::types::{Side, SubUnitId, TheaterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TheaterStatus {
    Active,
    Closed,
}

/// A contested front, shared by both sides
///
/// `current` runs from `-max` (defender capture) to `+max` (attacker capture);
/// 0 is neutral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theater {
    pub id: TheaterId,
    pub name: String,
    pub current: i32,
    pub max: u32,
    pub status: TheaterStatus,
    pub captured_by: Option<Side>,
}

impl Theater {
    pub fn new(id: TheaterId, name: impl Into<String>, max: u32) -> Self {
        Self {
            id,
            name: name.into(),
            current: 0,
            max,
            status: TheaterStatus::Active,
            captured_by: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TheaterStatus::Active
    }

    fn bound(&self) -> i32 {
        i32::try_from(self.max).unwrap_or(i32::MAX)
    }

    /// How far `side` can still push this theater before capturing it
    pub fn capacity_toward(&self, side: Side) -> u32 {
        if !self.is_active() {
            return 0;
        }
        let room = i64::from(self.bound()) - i64::from(self.current) * i64::from(side.sign());
        u32::try_from(room.max(0)).unwrap_or(u32::MAX)
    }

    /// Move `current` by `amount` toward `side`, staying within the bounds
    fn shift(&mut self, side: Side, amount: u32) {
        let bound = i64::from(self.bound());
        let moved = i64::from(self.current) + i64::from(amount) * i64::from(side.sign());
        self.current = moved.clamp(-bound, bound) as i32;
    }

    /// Push toward `side`'s bound by up to `amount`; returns what was absorbed
    ///
    /// Reaching the bound closes the theater as captured by `side`.
    pub fn push(&mut self, side: Side, amount: u32) -> u32 {
        let absorbed = amount.min(self.capacity_toward(side));
        self.shift(side, absorbed);

        if absorbed > 0 && self.current.abs() >= self.bound() {
            self.status = TheaterStatus::Closed;
            self.captured_by = Some(side);
        }
        absorbed
    }

    /// Ease the theater back toward neutral in `side`'s favor
    ///
    /// Only undoes the opponent's gains; never pushes past 0.
    pub fn relieve(&mut self, side: Side, amount: u32) -> u32 {
        if !self.is_active() {
            return 0;
        }
        let opponent_gain = i64::from(self.current) * i64::from(side.opponent().sign());
        let relieved = amount.min(u32::try_from(opponent_gain.max(0)).unwrap_or(u32::MAX));
        self.shift(side, relieved);
        relieved
    }

    /// Reset to neutral and active, clearing the captor
    pub fn reopen(&mut self) {
        self.current = 0;
        self.status = TheaterStatus::Active;
        self.captured_by = None;
    }

    /// Clamp into [-max, max] and repair status/captor consistency
    pub(crate) fn normalize(&mut self) -> bool {
        let before = self.clone();
        let bound = self.bound();
        self.current = self.current.clamp(-bound, bound);

        if self.current.abs() >= bound && bound > 0 {
            self.status = TheaterStatus::Closed;
            self.captured_by = Side::favored_by(self.current);
        }
        if self.status == TheaterStatus::Active {
            self.captured_by = None;
        }
        *self != before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubUnitStatus {
    Active,
    Neutralized,
}

/// A fleet, army or squad owned by one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubUnit {
    pub id: SubUnitId,
    pub name: String,
    pub current: u32,
    pub max: u32,
    pub status: SubUnitStatus,
}

impl SubUnit {
    /// New sub-units start at full health
    pub fn new(id: SubUnitId, name: impl Into<String>, max: u32) -> Self {
        Self {
            id,
            name: name.into(),
            current: max,
            max,
            status: if max > 0 {
                SubUnitStatus::Active
            } else {
                SubUnitStatus::Neutralized
            },
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubUnitStatus::Active
    }

    /// Remove up to `amount` HP; reaching 0 neutralizes the unit
    pub fn damage(&mut self, amount: u32) -> u32 {
        if !self.is_active() {
            return 0;
        }
        let taken = amount.min(self.current);
        self.current -= taken;
        if self.current == 0 {
            self.status = SubUnitStatus::Neutralized;
        }
        taken
    }

    /// Restore up to `amount` HP; any HP above 0 reactivates the unit
    pub fn heal(&mut self, amount: u32) -> u32 {
        let given = amount.min(self.max.saturating_sub(self.current));
        self.current += given;
        if self.current > 0 {
            self.status = SubUnitStatus::Active;
        }
        given
    }

    pub(crate) fn normalize(&mut self) -> bool {
        let before = self.clone();
        self.current = self.current.min(self.max);
        self.status = if self.current == 0 {
            SubUnitStatus::Neutralized
        } else {
            SubUnitStatus::Active
        };
        *self != before
    }
}

/// Target of an explicit heal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PoolRef {
    Unassigned,
    SubUnit(SubUnitId),
    Theater(TheaterId),
}
