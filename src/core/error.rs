use thiserror::Error;

use crate::core::types::{ModifierId, Side, SubUnitId, TheaterId, WarId};

#[derive(Error, Debug)]
pub enum WarError {
    // === VALIDATION ===
    #[error("War not found: {0}")]
    WarNotFound(WarId),

    #[error("Roll must be between 1 and 20, got {0}")]
    InvalidRoll(u8),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Unknown side: {0}")]
    UnknownSide(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{0:?} side is NPC-controlled and cannot submit actions")]
    NpcControlled(Side),

    #[error("{0:?} side is not NPC-controlled")]
    NotNpcControlled(Side),

    #[error("War {0} has concluded")]
    WarConcluded(WarId),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error("Theater {0} is closed")]
    TheaterClosed(TheaterId),

    // === CONFIGURATION ===
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    #[error("Unknown personality: {0}")]
    UnknownPersonality(String),

    #[error("Unknown tech tier: {0}")]
    UnknownTechTier(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // === NOT FOUND ===
    #[error("Theater not found: {0}")]
    TheaterNotFound(TheaterId),

    #[error("Sub-unit not found: {1} ({0:?})")]
    SubUnitNotFound(Side, SubUnitId),

    #[error("Modifier not found: {1} ({0:?})")]
    ModifierNotFound(Side, ModifierId),

    // === INTERNAL ===
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("War {0} is being resolved, try again")]
    WarBusy(WarId),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl WarError {
    /// Malformed or out-of-range input from the caller
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            WarError::WarNotFound(_)
                | WarError::InvalidRoll(_)
                | WarError::UnknownAction(_)
                | WarError::UnknownSide(_)
                | WarError::InvalidAmount(_)
                | WarError::NpcControlled(_)
                | WarError::NotNpcControlled(_)
                | WarError::WarConcluded(_)
                | WarError::InvalidMode(_)
                | WarError::TheaterClosed(_)
        ) || self.is_configuration()
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            WarError::UnknownArchetype(_)
                | WarError::UnknownPersonality(_)
                | WarError::UnknownTechTier(_)
                | WarError::Configuration(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WarError::TheaterNotFound(_)
                | WarError::SubUnitNotFound(..)
                | WarError::ModifierNotFound(..)
        )
    }
}

pub type Result<T> = std::result::Result<T, WarError>;
