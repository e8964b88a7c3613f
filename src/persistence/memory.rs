use std::sync::Mutex;

use ahash::AHashMap;

use crate::core::error::{Result, WarError};
use crate::core::types::WarId;
use crate::persistence::WarStore;
use crate::war::state::War;

#[derive(Debug, Default)]
struct Inner {
    wars: AHashMap<WarId, War>,
    next_id: u32,
}

/// Process-local store, used by tests and the headless simulator
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| WarError::InvariantViolation("memory store lock poisoned".to_string()))
    }
}

impl WarStore for MemoryStore {
    fn load(&self, id: WarId) -> Result<Option<War>> {
        Ok(self.inner()?.wars.get(&id).cloned())
    }

    fn save(&self, war: &War) -> Result<()> {
        let mut inner = self.inner()?;
        inner.next_id = inner.next_id.max(war.id.0);
        inner.wars.insert(war.id, war.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<WarId>> {
        let mut ids: Vec<WarId> = self.inner()?.wars.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn next_id(&self) -> Result<WarId> {
        let mut inner = self.inner()?;
        inner.next_id += 1;
        Ok(WarId(inner.next_id))
    }
}
