//! Single-file JSON war store
//!
//! The whole document is read, migrated and normalized once when the store
//! opens. After that the in-memory cache is authoritative and every save
//! rewrites the file atomically (temp file, then rename).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::CombatConfig;
use crate::core::error::{Result, WarError};
use crate::core::types::WarId;
use crate::persistence::migration::migrate;
use crate::persistence::WarStore;
use crate::war::state::{War, SCHEMA_VERSION};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Document {
    schema_version: u32,
    next_war_id: u32,
    wars: Vec<War>,
}

impl Document {
    fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            next_war_id: 1,
            wars: Vec::new(),
        }
    }
}

pub struct JsonStore {
    path: PathBuf,
    document: Mutex<Document>,
}

impl JsonStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl Into<PathBuf>, config: &CombatConfig) -> Result<Self> {
        let path = path.into();

        let (document, dirty) = if path.exists() {
            let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
            let (raw, migrated) = migrate(raw, config)?;
            let mut document: Document = serde_json::from_value(raw)?;

            let mut repaired = false;
            for war in &mut document.wars {
                repaired |= !war.normalize(config).is_empty();
            }
            let highest = document.wars.iter().map(|w| w.id.0).max().unwrap_or(0);
            if document.next_war_id <= highest {
                document.next_war_id = highest + 1;
                repaired = true;
            }
            (document, migrated || repaired)
        } else {
            (Document::empty(), true)
        };

        tracing::info!(
            "Opened war store {:?} ({} wars)",
            path,
            document.wars.len()
        );

        let store = Self {
            path,
            document: Mutex::new(document),
        };
        if dirty {
            store.persist(&*store.document()?)?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn document(&self) -> Result<MutexGuard<'_, Document>> {
        self.document
            .lock()
            .map_err(|_| WarError::InvariantViolation("json store lock poisoned".to_string()))
    }

    /// Write the document atomically: temp file in the same directory, then rename
    fn persist(&self, document: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = self.path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        fs::write(&temp, serde_json::to_string_pretty(document)?)?;
        if let Err(e) = fs::rename(&temp, &self.path) {
            tracing::error!("Failed to replace war store {:?}: {}", self.path, e);
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl WarStore for JsonStore {
    fn load(&self, id: WarId) -> Result<Option<War>> {
        Ok(self.document()?.wars.iter().find(|w| w.id == id).cloned())
    }

    fn save(&self, war: &War) -> Result<()> {
        let mut document = self.document()?;

        // Build the next document first so a failed write leaves the cache as it was
        let mut next = document.clone();
        match next.wars.iter_mut().find(|w| w.id == war.id) {
            Some(slot) => *slot = war.clone(),
            None => next.wars.push(war.clone()),
        }
        next.next_war_id = next.next_war_id.max(war.id.0 + 1);

        self.persist(&next)?;
        *document = next;
        tracing::debug!("Saved war {} to {:?}", war.id, self.path);
        Ok(())
    }

    fn list(&self) -> Result<Vec<WarId>> {
        Ok(self.document()?.wars.iter().map(|w| w.id).collect())
    }

    fn next_id(&self) -> Result<WarId> {
        let mut document = self.document()?;
        let id = WarId(document.next_war_id);
        document.next_war_id += 1;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("frontline-{}", Uuid::new_v4()))
            .join("wars.json")
    }

    #[test]
    fn test_round_trip_through_disk() {
        let config = CombatConfig::default();
        let path = temp_path();

        let store = JsonStore::open(&path, &config).unwrap();
        let id = store.next_id().unwrap();
        let war = War::new(id, "Disk War", "Red", "Blue", 120, &config);
        store.save(&war).unwrap();

        let reopened = JsonStore::open(&path, &config).unwrap();
        assert_eq!(reopened.load(id).unwrap(), Some(war));
        assert!(reopened.next_id().unwrap().0 > id.0);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_open_migrates_legacy_file() {
        let config = CombatConfig::default();
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"wars":[{"id":7,"name":"Old","stats":{},"theater":"Coast",
                "attacker":{"name":"A","warbar":{"current":60,"max":60}},
                "defender":{"name":"B","warbar":{"current":60,"max":60}}}]}"#,
        )
        .unwrap();

        let store = JsonStore::open(&path, &config).unwrap();
        let war = store.load(WarId(7)).unwrap().unwrap();
        assert_eq!(war.name, "Old");
        assert_eq!(store.next_id().unwrap(), WarId(8));

        let rewritten: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten["schema_version"], serde_json::json!(SCHEMA_VERSION));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
