//! Turn actions submitted by (or generated for) each side

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, WarError};
use crate::core::types::normalize_label;

/// Lowest and highest faces of the resolution die
pub const ROLL_MIN: u8 = 1;
pub const ROLL_MAX: u8 = 20;

/// The main action a side commits to for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainAction {
    Attack,
    Defend,
    DeploySpecialUnit,
}

impl MainAction {
    pub const ALL: [MainAction; 3] = [
        MainAction::Attack,
        MainAction::Defend,
        MainAction::DeploySpecialUnit,
    ];

    /// Position in three-way probability vectors
    pub fn index(self) -> usize {
        match self {
            MainAction::Attack => 0,
            MainAction::Defend => 1,
            MainAction::DeploySpecialUnit => 2,
        }
    }
}

/// The minor action a side takes alongside its main action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinorAction {
    PrepareAttack,
    Sabotage,
    Fortify,
    Heal,
    PrepareSpecialUnit,
}

impl MinorAction {
    pub const ALL: [MinorAction; 5] = [
        MinorAction::PrepareAttack,
        MinorAction::Sabotage,
        MinorAction::Fortify,
        MinorAction::Heal,
        MinorAction::PrepareSpecialUnit,
    ];

    /// Preparation stored for the next resolution, if this minor action sets one
    pub fn preparation(self) -> Option<Preparation> {
        match self {
            MinorAction::PrepareAttack => Some(Preparation::Attack),
            MinorAction::PrepareSpecialUnit => Some(Preparation::SpecialUnit),
            _ => None,
        }
    }
}

/// A one-shot bonus carried from one resolution into the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preparation {
    Attack,
    SpecialUnit,
}

impl Preparation {
    pub fn label(self) -> &'static str {
        match self {
            Preparation::Attack => "Prepared Attack",
            Preparation::SpecialUnit => "Prepared Special Unit",
        }
    }
}

impl fmt::Display for MainAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MainAction::Attack => "attack",
            MainAction::Defend => "defend",
            MainAction::DeploySpecialUnit => "deploy special unit",
        };
        f.write_str(label)
    }
}

impl fmt::Display for MinorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MinorAction::PrepareAttack => "prepare attack",
            MinorAction::Sabotage => "sabotage",
            MinorAction::Fortify => "fortify",
            MinorAction::Heal => "heal",
            MinorAction::PrepareSpecialUnit => "prepare special unit",
        };
        f.write_str(label)
    }
}

impl FromStr for MainAction {
    type Err = WarError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "attack" => Ok(MainAction::Attack),
            "defend" => Ok(MainAction::Defend),
            "deploy_special_unit" | "special_unit" | "super_unit" => {
                Ok(MainAction::DeploySpecialUnit)
            }
            _ => Err(WarError::UnknownAction(s.to_string())),
        }
    }
}

impl FromStr for MinorAction {
    type Err = WarError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "prepare_attack" => Ok(MinorAction::PrepareAttack),
            "sabotage" => Ok(MinorAction::Sabotage),
            "fortify" | "fortify_defense" => Ok(MinorAction::Fortify),
            "heal" => Ok(MinorAction::Heal),
            "prepare_special_unit" | "prepare_super_unit" => Ok(MinorAction::PrepareSpecialUnit),
            _ => Err(WarError::UnknownAction(s.to_string())),
        }
    }
}

/// A side's validated choice for the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub main: MainAction,
    pub minor: MinorAction,
    roll: u8,
}

impl PendingAction {
    /// Build an action, rejecting rolls outside 1..=20
    pub fn new(main: MainAction, minor: MinorAction, roll: u8) -> Result<Self> {
        if !(ROLL_MIN..=ROLL_MAX).contains(&roll) {
            return Err(WarError::InvalidRoll(roll));
        }
        Ok(Self { main, minor, roll })
    }

    /// Parse raw command-layer input
    pub fn parse(main: &str, minor: &str, roll: u8) -> Result<Self> {
        Self::new(main.parse()?, minor.parse()?, roll)
    }

    /// Build an action from an engine-drawn roll, clamping it onto the die
    pub(crate) fn generated(main: MainAction, minor: MinorAction, roll: u8) -> Self {
        Self {
            main,
            minor,
            roll: roll.clamp(ROLL_MIN, ROLL_MAX),
        }
    }

    pub fn roll(&self) -> u8 {
        self.roll
    }

    /// Whether a deserialized action still holds a legal roll
    pub fn has_valid_roll(&self) -> bool {
        (ROLL_MIN..=ROLL_MAX).contains(&self.roll)
    }
}
