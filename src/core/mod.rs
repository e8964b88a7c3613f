pub mod config;
pub mod error;
pub mod types;

pub use config::CombatConfig;
pub use error::{Result, WarError};
pub use types::{ModifierId, Pool, Side, SubUnitId, TheaterId, Turn, WarId};
