//! Persisting the session. Storage works like the browser's localStorage:
//! string values under string keys, and the whole snapshot is one value.

use super::{
    errors::ToolError,
    models::{MapData, Note, Npc, Snapshot},
    tabs::Tab,
};
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    io::{self, ErrorKind},
    path::PathBuf,
};

pub trait Storage: Send {
    fn get_item(&self, key: &str) -> io::Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// One `<key>.json` file per key inside a data directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Write aside and rename, so a crash mid-write keeps the old blob.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(tmp, self.path(key))
    }
}

/// In-process storage, gone when the process exits. A quota makes oversized
/// writes fail the way a full localStorage does.
#[derive(Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    #[cfg(test)]
    pub fn with_quota(bytes: usize) -> Self {
        MemoryStorage {
            items: HashMap::new(),
            quota: Some(bytes),
        }
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> io::Result<()> {
        if let Some(quota) = self.quota {
            let others: usize = self
                .items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if others + key.len() + value.len() > quota {
                return Err(io::Error::new(
                    ErrorKind::Other,
                    format!("storage quota of {quota} bytes exceeded"),
                ));
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A saved blob may lack any top-level property; the missing ones leave the
/// live state alone.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialSnapshot {
    current_tab: Option<Tab>,
    notes: Option<Vec<Note>>,
    npcs: Option<Vec<Npc>>,
    map_data: Option<MapData>,
}

impl PartialSnapshot {
    fn merge_into(self, snapshot: &mut Snapshot) {
        if let Some(tab) = self.current_tab {
            snapshot.current_tab = tab;
        }
        if let Some(notes) = self.notes {
            snapshot.notes = notes;
        }
        if let Some(npcs) = self.npcs {
            snapshot.npcs = npcs;
        }
        if let Some(map_data) = self.map_data {
            snapshot.map_data = map_data;
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    NothingSaved,
}

pub fn save(
    storage: &mut dyn Storage,
    key: &str,
    snapshot: &Snapshot,
) -> Result<(), ToolError> {
    let blob = serde_json::to_string(snapshot).map_err(ToolError::Serialize)?;
    storage.set_item(key, &blob).map_err(ToolError::Storage)
}

/// Parses the whole blob before touching `snapshot`, so a corrupt save never
/// half-applies.
pub fn load(
    storage: &dyn Storage,
    key: &str,
    snapshot: &mut Snapshot,
) -> Result<LoadOutcome, ToolError> {
    let Some(blob) = storage.get_item(key).map_err(ToolError::StorageRead)? else {
        return Ok(LoadOutcome::NothingSaved);
    };
    let saved: PartialSnapshot =
        serde_json::from_str(&blob).map_err(ToolError::Parse)?;
    saved.merge_into(snapshot);

    Ok(LoadOutcome::Loaded)
}
