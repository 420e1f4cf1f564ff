//! Named-snapshot persistence: save/load/list/delete a circuit by name,
//! one JSON file per save under a caller-supplied directory
//! (`SPEC_FULL.md` §6, grounded on `storage.py` in the original service).
//!
//! There is no implicit global saves directory — every function takes
//! the root explicitly so callers (the CLI, a future HTTP server, tests)
//! each pick their own.

mod error;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub use error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Strip everything but letters, digits, spaces, underscores and
/// hyphens, then trim — the same filter the original service applies to
/// a save name before using it.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '_' || *c == '-')
        .collect::<String>()
        .trim()
        .to_string()
}

/// One row of `list_saves` — the save's identity and last-touched time,
/// without the (possibly large) snapshot payload.
#[derive(Debug, Clone, Serialize)]
pub struct SaveSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

/// The on-disk record for one save: identity, timestamps, and the raw
/// circuit snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SaveRecord {
    id: String,
    name: String,
    snapshot: Value,
    #[serde(rename = "createdAt")]
    created_at: i64,
    #[serde(rename = "updatedAt")]
    updated_at: i64,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })
}

fn save_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.json"))
}

fn read_record(path: &Path) -> Option<SaveRecord> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// List every save under `dir`, newest first by `updatedAt`. Corrupt or
/// unreadable files are skipped, matching the original's best-effort
/// scan rather than failing the whole listing.
pub fn list_saves(dir: &Path) -> Result<Vec<SaveSummary>, StoreError> {
    ensure_dir(dir)?;
    let mut saves = Vec::new();
    for entry in fs::read_dir(dir).map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })? {
        let entry = entry.map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(record) = read_record(&path) else {
            log::warn!("skipping unreadable save file {}", path.display());
            continue;
        };
        saves.push(SaveSummary { id: record.id, name: record.name, updated_at: record.updated_at });
    }
    saves.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(saves)
}

/// Load a save's circuit snapshot by id. A missing file is `NotFound`;
/// a present-but-unparseable one is `Corrupt`, not `NotFound`.
pub fn load_snapshot(dir: &Path, id: &str) -> Result<Value, StoreError> {
    let path = save_path(dir, id);
    let bytes = fs::read(&path).map_err(|_| StoreError::NotFound(id.to_string()))?;
    let record: SaveRecord =
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt { id: id.to_string(), source })?;
    Ok(record.snapshot)
}

/// Delete a save by id. Errors if it doesn't exist.
pub fn delete_save(dir: &Path, id: &str) -> Result<(), StoreError> {
    let path = save_path(dir, id);
    if !path.exists() {
        return Err(StoreError::NotFound(id.to_string()));
    }
    fs::remove_file(&path).map_err(|source| StoreError::Io { path, source })
}

/// Save (or overwrite) a snapshot under `name`. When `id` names an
/// existing save it is overwritten in place; otherwise an existing save
/// with the same `name` is reused (so re-saving under a familiar name
/// doesn't pile up duplicate files), falling back to a freshly generated
/// id. `createdAt` carries over from the record it replaces.
pub fn save_snapshot(dir: &Path, name: &str, snapshot: Value, id: Option<&str>) -> Result<SaveSummary, StoreError> {
    let name = safe_name(name);
    if name.is_empty() {
        return Err(StoreError::EmptyName);
    }
    ensure_dir(dir)?;

    let mut resolved_id = id.map(str::to_string);
    let mut existing = resolved_id.as_deref().and_then(|id| read_record(&save_path(dir, id)));

    if existing.is_none() && resolved_id.is_none() {
        for entry in (fs::read_dir(dir).map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })?).flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(record) = read_record(&path)
                && record.name == name
            {
                resolved_id = Some(record.id.clone());
                existing = Some(record);
                break;
            }
        }
    }

    let id = resolved_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let updated_at = now_ms();
    let created_at = existing.map(|e| e.created_at).unwrap_or(updated_at);

    let record = SaveRecord { id: id.clone(), name: name.clone(), snapshot, created_at, updated_at };
    let path = save_path(dir, &id);
    let bytes = serde_json::to_vec_pretty(&record).expect("SaveRecord always serializes");
    fs::write(&path, bytes).map_err(|source| StoreError::Io { path, source })?;

    Ok(SaveSummary { id, name, updated_at })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    #[test]
    fn safe_name_strips_punctuation() {
        assert_eq!(safe_name("  My Rig #1! "), "My Rig 1");
    }

    #[test]
    fn round_trips_a_save() {
        let dir = temp_dir();
        let snapshot = serde_json::json!({"components": [], "wires": []});
        let summary = save_snapshot(dir.path(), "Starter Circuit", snapshot.clone(), None).unwrap();
        assert_eq!(summary.name, "Starter Circuit");

        let loaded = load_snapshot(dir.path(), &summary.id).unwrap();
        assert_eq!(loaded, snapshot);

        let saves = list_saves(dir.path()).unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].id, summary.id);
    }

    #[test]
    fn re_saving_under_the_same_name_reuses_the_record_and_keeps_created_at() {
        let dir = temp_dir();
        let first = save_snapshot(dir.path(), "Rig", serde_json::json!({"v": 1}), None).unwrap();
        let second = save_snapshot(dir.path(), "Rig", serde_json::json!({"v": 2}), None).unwrap();
        assert_eq!(first.id, second.id);

        let saves = list_saves(dir.path()).unwrap();
        assert_eq!(saves.len(), 1);

        let loaded = load_snapshot(dir.path(), &second.id).unwrap();
        assert_eq!(loaded, serde_json::json!({"v": 2}));
    }

    #[test]
    fn save_by_id_overwrites_even_under_a_new_name() {
        let dir = temp_dir();
        let first = save_snapshot(dir.path(), "Rig", serde_json::json!({"v": 1}), None).unwrap();
        let second = save_snapshot(dir.path(), "Renamed Rig", serde_json::json!({"v": 2}), Some(&first.id)).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Renamed Rig");
        assert_eq!(list_saves(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn empty_name_after_sanitization_is_rejected() {
        let dir = temp_dir();
        let err = save_snapshot(dir.path(), "###", serde_json::json!({}), None).unwrap_err();
        assert!(matches!(err, StoreError::EmptyName));
    }

    #[test]
    fn loading_a_corrupt_save_reports_corrupt_not_not_found() {
        let dir = temp_dir();
        fs::write(dir.path().join("bad.json"), b"not json").unwrap();
        let err = load_snapshot(dir.path(), "bad").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn loading_or_deleting_a_missing_save_errors() {
        let dir = temp_dir();
        assert!(matches!(load_snapshot(dir.path(), "nope"), Err(StoreError::NotFound(_))));
        assert!(matches!(delete_save(dir.path(), "nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_removes_the_file() {
        let dir = temp_dir();
        let saved = save_snapshot(dir.path(), "Rig", serde_json::json!({}), None).unwrap();
        delete_save(dir.path(), &saved.id).unwrap();
        assert!(list_saves(dir.path()).unwrap().is_empty());
    }
}
