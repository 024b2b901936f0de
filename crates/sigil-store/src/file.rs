//! File-backed store: one JSON document holding every definition plus
//! the per-database markers. Mutations rewrite the document through a
//! temp file and rename, so readers never observe a half-written store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sigil_common::{CustomProceduresConfig, SigilError, SigilResult};
use sigil_types::{CustomKind, QualifiedName};

use crate::record::StoredRecord;
use crate::store::{bumped_marker, sort_records, SystemStore};

const STORE_FILE: &str = "custom_procedures.json";

#[derive(Default, serde::Serialize, serde::Deserialize)]
struct StoreDocument {
    entries: Vec<StoredRecord>,
    markers: HashMap<String, i64>,
}

pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (or create) the store document in `dir`.
    pub fn open(dir: &Path) -> SigilResult<Self> {
        Self::open_with_file_name(dir, STORE_FILE)
    }

    /// Open the store document named by the configuration.
    pub fn open_with_config(dir: &Path, config: &CustomProceduresConfig) -> SigilResult<Self> {
        Self::open_with_file_name(dir, &config.store_file_name)
    }

    pub fn open_with_file_name(dir: &Path, file_name: &str) -> SigilResult<Self> {
        std::fs::create_dir_all(dir).map_err(|e| {
            SigilError::Store(format!("cannot create store dir '{}': {e}", dir.display()))
        })?;
        Ok(Self {
            path: dir.join(file_name),
            lock: Mutex::new(()),
        })
    }

    fn load(&self) -> SigilResult<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            SigilError::Store(format!(
                "cannot read store from '{}': {e}",
                self.path.display()
            ))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| SigilError::Store(format!("cannot parse store JSON: {e}")))
    }

    fn save(&self, document: &StoreDocument) -> SigilResult<()> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| SigilError::Store(format!("cannot serialize store: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json.as_bytes()).map_err(|e| {
            SigilError::Store(format!("cannot write store to '{}': {e}", tmp.display()))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            SigilError::Store(format!(
                "cannot move store into place at '{}': {e}",
                self.path.display()
            ))
        })
    }
}

fn same_entry(record: &StoredRecord, database: &str, kind: CustomKind, name: &str) -> bool {
    record.database == database
        && record.kind == kind
        && record.qualified_name().to_string() == name
}

fn bump(document: &mut StoreDocument, database: &str) {
    let previous = document.markers.get(database).copied().unwrap_or(0);
    document
        .markers
        .insert(database.to_string(), bumped_marker(previous));
}

impl SystemStore for FileStore {
    fn upsert(&self, record: StoredRecord) -> SigilResult<()> {
        let _guard = self.lock.lock().unwrap();
        let mut document = self.load()?;
        let database = record.database.to_string();
        let name = record.qualified_name().to_string();
        document
            .entries
            .retain(|entry| !same_entry(entry, &database, record.kind, &name));
        document.entries.push(record);
        bump(&mut document, &database);
        self.save(&document)
    }

    fn remove(
        &self,
        database: &str,
        kind: CustomKind,
        name: &QualifiedName,
    ) -> SigilResult<Option<StoredRecord>> {
        let _guard = self.lock.lock().unwrap();
        let mut document = self.load()?;
        let name = name.to_string();
        let position = document
            .entries
            .iter()
            .position(|entry| same_entry(entry, database, kind, &name));
        let Some(position) = position else {
            return Ok(None);
        };
        let removed = document.entries.remove(position);
        bump(&mut document, database);
        self.save(&document)?;
        Ok(Some(removed))
    }

    fn remove_all(&self, database: &str) -> SigilResult<Vec<StoredRecord>> {
        let _guard = self.lock.lock().unwrap();
        let mut document = self.load()?;
        let mut removed = Vec::new();
        document.entries.retain(|entry| {
            if entry.database == database {
                removed.push(entry.clone());
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            bump(&mut document, database);
            self.save(&document)?;
        }
        sort_records(&mut removed);
        Ok(removed)
    }

    fn list(&self, database: &str) -> SigilResult<Vec<StoredRecord>> {
        let _guard = self.lock.lock().unwrap();
        let document = self.load()?;
        let mut records: Vec<StoredRecord> = document
            .entries
            .into_iter()
            .filter(|record| record.database == database)
            .collect();
        sort_records(&mut records);
        Ok(records)
    }

    fn last_updated(&self, database: &str) -> SigilResult<i64> {
        let _guard = self.lock.lock().unwrap();
        let document = self.load()?;
        Ok(document.markers.get(database).copied().unwrap_or(0))
    }
}
