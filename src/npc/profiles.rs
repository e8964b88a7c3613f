//! NPC archetypes, tech tiers and personalities
//!
//! Each enum variant owns one row of a static profile table. Behavior is read
//! from the row, never branched on by name elsewhere in the engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, WarError};
use crate::core::types::normalize_label;
use crate::npc::learning::OutcomeHistory;
use crate::war::actions::MinorAction;

/// Stat pool an NPC's doctrine distributes across domains
pub const BASE_POWER: u32 = 50;

/// Three-way bias over [attack, defend, deploy special unit]
pub type ActionBias = [f64; 3];

/// Relative weighting of a doctrine across force domains
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatWeights {
    pub exosphere: f64,
    pub naval: f64,
    pub military: f64,
}

/// Doctrine-derived force profile, scaled by tech tier
///
/// Descriptive only: resolution never compares stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatProfile {
    pub exosphere: u32,
    pub naval: u32,
    pub military: u32,
}

#[derive(Debug)]
pub struct ArchetypeProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub stat_weights: StatWeights,
    pub aggression: f64,
    pub action_bias: ActionBias,
    /// Weighted minor-action preferences; empty means uniform over all
    pub minor_preferences: &'static [(MinorAction, f64)],
}

#[derive(Debug)]
pub struct TechTierProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub stat_multiplier: f64,
}

#[derive(Debug)]
pub struct PersonalityProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub aggression_modifier: f64,
    pub action_bias: ActionBias,
}

/// Military doctrine of an NPC side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Nato,
    Csat,
    Guerrilla,
    Swarm,
    Elite,
    DefensiveBloc,
    Insurgent,
}

/// Technology era, ordered from oldest to newest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechTier {
    Legacy,
    Modern,
    Advanced,
    CuttingEdge,
}

/// Tactical temperament of an NPC side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Aggressive,
    Defensive,
    Adaptive,
    Balanced,
    Berserker,
}

static ARCHETYPES: [ArchetypeProfile; 7] = [
    ArchetypeProfile {
        name: "NATO Doctrine",
        description: "Professional combined-arms force with air superiority focus",
        stat_weights: StatWeights { exosphere: 0.3, naval: 0.3, military: 0.4 },
        aggression: 0.6,
        action_bias: [0.5, 0.2, 0.3],
        minor_preferences: &[(MinorAction::PrepareAttack, 0.6), (MinorAction::Sabotage, 0.4)],
    },
    ArchetypeProfile {
        name: "CSAT Doctrine",
        description: "Mass mobilization with emphasis on ground forces",
        stat_weights: StatWeights { exosphere: 0.2, naval: 0.2, military: 0.6 },
        aggression: 0.5,
        action_bias: [0.45, 0.45, 0.1],
        minor_preferences: &[(MinorAction::Fortify, 0.5), (MinorAction::Heal, 0.5)],
    },
    ArchetypeProfile {
        name: "Guerrilla Force",
        description: "Asymmetric warfare specialists, hit-and-run tactics",
        stat_weights: StatWeights { exosphere: 0.1, naval: 0.1, military: 0.8 },
        aggression: 0.4,
        action_bias: [0.3, 0.6, 0.1],
        minor_preferences: &[(MinorAction::Sabotage, 0.7), (MinorAction::PrepareAttack, 0.3)],
    },
    ArchetypeProfile {
        name: "Swarm Doctrine",
        description: "Overwhelming numbers, drone-heavy approach",
        stat_weights: StatWeights { exosphere: 0.4, naval: 0.2, military: 0.4 },
        aggression: 0.8,
        action_bias: [0.75, 0.2, 0.05],
        minor_preferences: &[(MinorAction::PrepareAttack, 0.6), (MinorAction::Sabotage, 0.4)],
    },
    ArchetypeProfile {
        name: "Elite Force",
        description: "Small, highly-trained professional units",
        stat_weights: StatWeights { exosphere: 0.3, naval: 0.2, military: 0.5 },
        aggression: 0.7,
        action_bias: [0.45, 0.2, 0.35],
        minor_preferences: &[
            (MinorAction::PrepareAttack, 0.5),
            (MinorAction::PrepareSpecialUnit, 0.5),
        ],
    },
    ArchetypeProfile {
        name: "Defensive Bloc",
        description: "Fortification-focused, attrition warfare",
        stat_weights: StatWeights { exosphere: 0.2, naval: 0.3, military: 0.5 },
        aggression: 0.3,
        action_bias: [0.15, 0.75, 0.1],
        minor_preferences: &[(MinorAction::Fortify, 0.6), (MinorAction::Heal, 0.4)],
    },
    ArchetypeProfile {
        name: "Insurgent Force",
        description: "Rebellion and incited conflict, unpredictable hit-and-fade tactics",
        stat_weights: StatWeights { exosphere: 0.05, naval: 0.05, military: 0.9 },
        aggression: 0.6,
        action_bias: [0.35, 0.55, 0.1],
        minor_preferences: &[(MinorAction::Sabotage, 0.6), (MinorAction::PrepareAttack, 0.4)],
    },
];

static TECH_TIERS: [TechTierProfile; 4] = [
    TechTierProfile {
        name: "Legacy",
        description: "Cold War-era technology",
        stat_multiplier: 0.7,
    },
    TechTierProfile {
        name: "Modern",
        description: "Contemporary military technology",
        stat_multiplier: 1.0,
    },
    TechTierProfile {
        name: "Advanced",
        description: "Near-future smart weapons and cyber warfare",
        stat_multiplier: 1.2,
    },
    TechTierProfile {
        name: "Cutting Edge",
        description: "Nanoweapons, orbital strikes and full AI integration",
        stat_multiplier: 1.4,
    },
];

static PERSONALITIES: [PersonalityProfile; 5] = [
    PersonalityProfile {
        name: "Aggressive",
        description: "Prefers offensive actions, high risk tolerance",
        aggression_modifier: 0.3,
        action_bias: [0.7, 0.2, 0.1],
    },
    PersonalityProfile {
        name: "Defensive",
        description: "Prefers defensive posture, low risk tolerance",
        aggression_modifier: -0.3,
        action_bias: [0.2, 0.7, 0.1],
    },
    PersonalityProfile {
        name: "Adaptive",
        description: "Adjusts tactics to the momentum of the war",
        aggression_modifier: 0.0,
        action_bias: [0.4, 0.4, 0.2],
    },
    PersonalityProfile {
        name: "Balanced",
        description: "Even mix of offensive and defensive tactics",
        aggression_modifier: 0.0,
        action_bias: [0.5, 0.4, 0.1],
    },
    PersonalityProfile {
        name: "Berserker",
        description: "All-out attack, ignores defensive considerations",
        aggression_modifier: 0.5,
        action_bias: [0.9, 0.05, 0.05],
    },
];

impl Archetype {
    pub const ALL: [Archetype; 7] = [
        Archetype::Nato,
        Archetype::Csat,
        Archetype::Guerrilla,
        Archetype::Swarm,
        Archetype::Elite,
        Archetype::DefensiveBloc,
        Archetype::Insurgent,
    ];

    pub fn profile(self) -> &'static ArchetypeProfile {
        &ARCHETYPES[self as usize]
    }
}

impl TechTier {
    pub const ALL: [TechTier; 4] = [
        TechTier::Legacy,
        TechTier::Modern,
        TechTier::Advanced,
        TechTier::CuttingEdge,
    ];

    pub fn profile(self) -> &'static TechTierProfile {
        &TECH_TIERS[self as usize]
    }
}

impl Personality {
    pub const ALL: [Personality; 5] = [
        Personality::Aggressive,
        Personality::Defensive,
        Personality::Adaptive,
        Personality::Balanced,
        Personality::Berserker,
    ];

    pub fn profile(self) -> &'static PersonalityProfile {
        &PERSONALITIES[self as usize]
    }
}

impl FromStr for Archetype {
    type Err = WarError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "nato" => Ok(Archetype::Nato),
            "csat" => Ok(Archetype::Csat),
            "guerrilla" => Ok(Archetype::Guerrilla),
            "swarm" => Ok(Archetype::Swarm),
            "elite" => Ok(Archetype::Elite),
            "defensive_bloc" => Ok(Archetype::DefensiveBloc),
            "insurgent" => Ok(Archetype::Insurgent),
            _ => Err(WarError::UnknownArchetype(s.to_string())),
        }
    }
}

impl FromStr for TechTier {
    type Err = WarError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "legacy" => Ok(TechTier::Legacy),
            "modern" => Ok(TechTier::Modern),
            "advanced" => Ok(TechTier::Advanced),
            "cutting_edge" => Ok(TechTier::CuttingEdge),
            _ => Err(WarError::UnknownTechTier(s.to_string())),
        }
    }
}

impl FromStr for Personality {
    type Err = WarError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_label(s).as_str() {
            "aggressive" => Ok(Personality::Aggressive),
            "defensive" => Ok(Personality::Defensive),
            "adaptive" => Ok(Personality::Adaptive),
            "balanced" => Ok(Personality::Balanced),
            "berserker" => Ok(Personality::Berserker),
            _ => Err(WarError::UnknownPersonality(s.to_string())),
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

impl fmt::Display for TechTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

/// NPC control settings for one side of a war
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcConfig {
    pub archetype: Archetype,
    pub tech_tier: TechTier,
    pub personality: Personality,
    pub history: OutcomeHistory,
}

impl NpcConfig {
    pub fn new(
        archetype: Archetype,
        tech_tier: TechTier,
        personality: Personality,
        learning_window: usize,
    ) -> Self {
        Self {
            archetype,
            tech_tier,
            personality,
            history: OutcomeHistory::new(learning_window),
        }
    }

    /// Parse command-layer labels; unknown labels are configuration errors
    pub fn parse(
        archetype: &str,
        tech_tier: &str,
        personality: &str,
        learning_window: usize,
    ) -> Result<Self> {
        Ok(Self::new(
            archetype.parse()?,
            tech_tier.parse()?,
            personality.parse()?,
            learning_window,
        ))
    }

    /// Archetype stat weighting scaled by the tech tier multiplier
    pub fn stat_profile(&self) -> StatProfile {
        let weights = self.archetype.profile().stat_weights;
        let multiplier = self.tech_tier.profile().stat_multiplier;
        let scale = |weight: f64| (BASE_POWER as f64 * weight * multiplier) as u32;
        StatProfile {
            exosphere: scale(weights.exosphere),
            naval: scale(weights.naval),
            military: scale(weights.military),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_line_up_with_variants() {
        assert_eq!(Archetype::Nato.profile().name, "NATO Doctrine");
        assert_eq!(Archetype::Insurgent.profile().name, "Insurgent Force");
        assert_eq!(TechTier::CuttingEdge.profile().stat_multiplier, 1.4);
        assert_eq!(Personality::Berserker.profile().aggression_modifier, 0.5);
    }

    #[test]
    fn test_biases_are_distributions() {
        let archetype_biases = Archetype::ALL.iter().map(|a| a.profile().action_bias);
        let personality_biases = Personality::ALL.iter().map(|p| p.profile().action_bias);
        for bias in archetype_biases.chain(personality_biases) {
            let sum: f64 = bias.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "bias {:?} sums to {}", bias, sum);
        }
    }

    #[test]
    fn test_tech_tiers_are_ordered_by_multiplier() {
        for pair in TechTier::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].profile().stat_multiplier < pair[1].profile().stat_multiplier);
        }
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("Defensive Bloc".parse::<Archetype>().unwrap(), Archetype::DefensiveBloc);
        assert_eq!("cutting-edge".parse::<TechTier>().unwrap(), TechTier::CuttingEdge);
        assert_eq!("ADAPTIVE".parse::<Personality>().unwrap(), Personality::Adaptive);
    }

    #[test]
    fn test_unknown_labels_are_configuration_errors() {
        assert!(matches!(
            NpcConfig::parse("pirates", "modern", "balanced", 5),
            Err(WarError::UnknownArchetype(_))
        ));
        assert!(matches!(
            NpcConfig::parse("nato", "steampunk", "balanced", 5),
            Err(WarError::UnknownTechTier(_))
        ));
        assert!(matches!(
            NpcConfig::parse("nato", "modern", "timid", 5),
            Err(WarError::UnknownPersonality(_))
        ));
    }

    #[test]
    fn test_stat_profile_scales_with_tech() {
        let legacy = NpcConfig::new(Archetype::Csat, TechTier::Legacy, Personality::Balanced, 5);
        let modern = NpcConfig::new(Archetype::Csat, TechTier::Modern, Personality::Balanced, 5);
        assert_eq!(modern.stat_profile().military, 30);
        assert_eq!(legacy.stat_profile().military, 21);
    }
}
