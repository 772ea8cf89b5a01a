//! Named truck/cargo configurations.
//!
//! A saved configuration holds the inputs of a packing run, never its output.
//! Loading one means packing it again, so a changed algorithm or cargo order
//! can give a different layout under the same name.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tempfile::NamedTempFile;
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::{CargoItem, TruckConfig};

type Entries = BTreeMap<String, SavedConfiguration>;

/// Errors of the configuration store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Configuration name must not be empty")]
    EmptyName,
    #[error("No configuration named '{0}'")]
    NotFound(String),
    #[error("Store is unavailable: {0}")]
    Unavailable(String),
    #[error("Could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not read saved configurations from {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Inputs of a packing run stored under a name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "Monday route",
    "truck": { "length": 4.2, "width": 2.0, "height": 2.1 },
    "cargo": [
        { "id": "pallet-1", "type": "standard", "dims": { "length": 1.2, "width": 0.8, "height": 1.0 }, "color": "#4f8cff" }
    ]
}))]
pub struct SavedConfiguration {
    pub name: String,
    pub truck: TruckConfig,
    pub cargo: Vec<CargoItem>,
}

/// Read/write access to saved configurations.
///
/// Saving under an existing name replaces the stored entry.
pub trait ConfigurationStore: Send + Sync {
    fn save(&self, config: SavedConfiguration) -> Result<(), StoreError>;
    fn load(&self, name: &str) -> Result<SavedConfiguration, StoreError>;
    /// Names of all stored configurations, sorted.
    fn list(&self) -> Result<Vec<String>, StoreError>;
    fn delete(&self, name: &str) -> Result<(), StoreError>;
}

/// Trims a name and rejects empty ones.
fn normalize_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

fn insert_entry(entries: &mut Entries, mut config: SavedConfiguration) -> Result<(), StoreError> {
    let name = normalize_name(&config.name)?;
    config.name = name.clone();
    entries.insert(name, config);
    Ok(())
}

fn remove_entry(entries: &mut Entries, name: &str) -> Result<(), StoreError> {
    let name = normalize_name(name)?;
    match entries.remove(&name) {
        Some(_) => Ok(()),
        None => Err(StoreError::NotFound(name)),
    }
}

fn load_entry(entries: &Entries, name: &str) -> Result<SavedConfiguration, StoreError> {
    let name = normalize_name(name)?;
    entries.get(&name).cloned().ok_or(StoreError::NotFound(name))
}

/// Keeps configurations in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigurationStore for MemoryStore {
    fn save(&self, config: SavedConfiguration) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        insert_entry(&mut entries, config)
    }

    fn load(&self, name: &str) -> Result<SavedConfiguration, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        load_entry(&entries, name)
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.keys().cloned().collect())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        remove_entry(&mut entries, name)
    }
}

/// Configurations kept in memory and mirrored to a JSON file after every write.
///
/// Writes hold the lock until the file is replaced. A write whose file update
/// fails leaves the entries unchanged.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl JsonFileStore {
    /// Opens the store, reading existing entries if the file is present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries: Entries = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let list: Vec<SavedConfiguration> =
                serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?;
            list.into_iter().map(|c| (c.name.clone(), c)).collect()
        } else {
            BTreeMap::new()
        };

        println!(
            "💾 {} saved configuration(s) loaded from {}",
            entries.len(),
            path.display()
        );
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Applies `change` to a copy of the entries, writes the copy to disk and
    /// only then makes it visible.
    fn update(
        &self,
        change: impl FnOnce(&mut Entries) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let mut next = entries.clone();
        change(&mut next)?;
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn flush(&self, entries: &Entries) -> Result<(), StoreError> {
        let list: Vec<&SavedConfiguration> = entries.values().collect();
        let raw = serde_json::to_string_pretty(&list).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|err| self.io_error(err))?;
        tmp.write_all(raw.as_bytes())
            .map_err(|err| self.io_error(err))?;
        tmp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

impl ConfigurationStore for JsonFileStore {
    fn save(&self, config: SavedConfiguration) -> Result<(), StoreError> {
        self.update(|entries| insert_entry(entries, config))
    }

    fn load(&self, name: &str) -> Result<SavedConfiguration, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        load_entry(&entries, name)
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.keys().cloned().collect())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.update(|entries| remove_entry(entries, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CargoKind, Dimensions};

    fn sample(name: &str) -> SavedConfiguration {
        let cube = Dimensions {
            length: 1.2,
            width: 1.2,
            height: 1.2,
        };
        SavedConfiguration {
            name: name.to_string(),
            truck: Dimensions {
                length: 2.4,
                width: 1.2,
                height: 1.2,
            },
            cargo: vec![
                CargoItem::new("a", CargoKind::Standard, cube).unwrap(),
                CargoItem::new("b", CargoKind::Custom, cube)
                    .unwrap()
                    .with_delivery_stop(1),
            ],
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.save(sample("  Monday ")).unwrap();

        let loaded = store.load("Monday").unwrap();
        assert_eq!(loaded.name, "Monday");
        assert_eq!(loaded.cargo, sample("x").cargo);
        assert_eq!(store.list().unwrap(), vec!["Monday".to_string()]);
    }

    #[test]
    fn saving_twice_replaces_the_entry() {
        let store = MemoryStore::new();
        store.save(sample("route")).unwrap();
        let mut changed = sample("route");
        changed.cargo.pop();
        store.save(changed).unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.load("route").unwrap().cargo.len(), 1);
    }

    #[test]
    fn list_is_sorted() {
        let store = MemoryStore::new();
        for name in ["tuesday", "friday", "monday"] {
            store.save(sample(name)).unwrap();
        }
        assert_eq!(store.list().unwrap(), vec!["friday", "monday", "tuesday"]);
    }

    #[test]
    fn missing_and_empty_names_are_errors() {
        let store = MemoryStore::new();
        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.delete("nope"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.save(sample("   ")), Err(StoreError::EmptyName)));
    }

    #[test]
    fn delete_removes_entry() {
        let store = MemoryStore::new();
        store.save(sample("a")).unwrap();
        store.delete("a").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configurations.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.save(sample("depot")).unwrap();
            store.save(sample("city")).unwrap();
            store.delete("city").unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(reopened.list().unwrap(), vec!["depot".to_string()]);
        assert_eq!(reopened.load("depot").unwrap(), sample("depot"));
    }

    #[test]
    fn file_store_stores_inputs_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configurations.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.save(sample("depot")).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let entry = &value[0];
        assert_eq!(entry["name"], "depot");
        assert!(entry.get("truck").is_some());
        assert!(entry.get("cargo").is_some());
        assert!(entry["cargo"][0].get("position").is_none());
        assert!(entry["cargo"][0].get("pos").is_none());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configurations.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn concurrent_saves_all_reach_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("configurations.json");
        let store = JsonFileStore::open(&path).unwrap();

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..50 {
                        store.save(sample(&format!("route-{worker}-{i}"))).unwrap();
                    }
                });
            }
        });

        assert_eq!(store.list().unwrap().len(), 400);
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.list().unwrap().len(), 400);
    }

    #[test]
    fn failed_write_leaves_entries_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("configurations.json");
        let store = JsonFileStore::open(&path).unwrap();

        assert!(matches!(
            store.save(sample("depot")),
            Err(StoreError::Io { .. })
        ));
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(store.load("depot"), Err(StoreError::NotFound(_))));
    }
}
