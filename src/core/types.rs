//! Core type definitions used throughout the codebase

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::WarError;

/// Unique identifier for wars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WarId(pub u32);

/// Theater identifier (allocated from the war's shared pool counter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TheaterId(pub u32);

/// Sub-unit identifier (allocated from the war's shared pool counter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubUnitId(pub u32);

/// Modifier identifier, unique within a war
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModifierId(pub u32);

macro_rules! display_id {
    ($($ty:ident => $prefix:literal),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!($prefix, "#{}"), self.0)
                }
            }
        )*
    };
}

display_id!(WarId => "war", TheaterId => "theater", SubUnitId => "unit", ModifierId => "mod");

/// Resolution turn counter
pub type Turn = u32;

/// One of the two sides of a war
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Attacker, Side::Defender];

    pub fn opponent(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }

    /// Direction this side pushes signed values (tactical momentum, theaters)
    pub fn sign(self) -> i32 {
        match self {
            Side::Attacker => 1,
            Side::Defender => -1,
        }
    }

    /// The side a signed value favors, if any
    pub fn favored_by(value: i32) -> Option<Side> {
        match value.signum() {
            1 => Some(Side::Attacker),
            -1 => Some(Side::Defender),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Attacker => write!(f, "attacker"),
            Side::Defender => write!(f, "defender"),
        }
    }
}

impl FromStr for Side {
    type Err = WarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attacker" | "a" => Ok(Side::Attacker),
            "defender" | "d" => Ok(Side::Defender),
            other => Err(WarError::UnknownSide(other.to_string())),
        }
    }
}

/// Normalize a user-facing enum label ("Cutting Edge", "cutting-edge") to snake_case
pub(crate) fn normalize_label(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

/// HP pool with a current value bounded by its maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub current: u32,
    pub max: u32,
}

impl Pool {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Remove up to `amount`, returning how much was actually removed
    pub fn drain(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.current);
        self.current -= taken;
        taken
    }

    /// Restore up to `amount`, returning how much was actually restored
    pub fn restore(&mut self, amount: u32) -> u32 {
        let room = self.max.saturating_sub(self.current);
        let given = amount.min(room);
        self.current += given;
        given
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Attacker.opponent(), Side::Defender);
        assert_eq!(Side::Defender.opponent(), Side::Attacker);
    }

    #[test]
    fn test_favored_by_sign() {
        assert_eq!(Side::favored_by(2), Some(Side::Attacker));
        assert_eq!(Side::favored_by(-1), Some(Side::Defender));
        assert_eq!(Side::favored_by(0), None);
    }

    #[test]
    fn test_side_parse() {
        assert_eq!("Attacker".parse::<Side>().unwrap(), Side::Attacker);
        assert_eq!(" d ".parse::<Side>().unwrap(), Side::Defender);
        assert!("neutral".parse::<Side>().is_err());
    }

    #[test]
    fn test_pool_drain_and_restore_are_bounded() {
        let mut pool = Pool::full(10);
        assert_eq!(pool.drain(4), 4);
        assert_eq!(pool.drain(20), 6);
        assert!(pool.is_empty());
        assert_eq!(pool.restore(25), 10);
        assert_eq!(pool.current, 10);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(WarId(3).to_string(), "war#3");
        assert_eq!(TheaterId(7).to_string(), "theater#7");
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("Cutting Edge"), "cutting_edge");
        assert_eq!(normalize_label("defensive-bloc"), "defensive_bloc");
    }
}
