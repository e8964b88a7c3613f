//! War storage
//!
//! The service talks to storage only through [`WarStore`]. Stores hand out
//! owned copies; nothing outside the store ever holds a live reference.

pub mod json;
pub mod memory;
pub mod migration;

pub use json::JsonStore;
pub use memory::MemoryStore;
pub use migration::migrate;

use crate::core::error::Result;
use crate::core::types::WarId;
use crate::war::state::War;

pub trait WarStore: Send + Sync {
    /// Load a copy of a war
    fn load(&self, id: WarId) -> Result<Option<War>>;

    /// Insert or replace a war in one write
    fn save(&self, war: &War) -> Result<()>;

    /// Ids of every stored war, concluded ones included
    fn list(&self) -> Result<Vec<WarId>>;

    /// Reserve a fresh war id
    fn next_id(&self) -> Result<WarId>;
}
