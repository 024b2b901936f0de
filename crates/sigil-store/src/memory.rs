use std::sync::Mutex;

use hashbrown::HashMap;
use smol_str::SmolStr;

use sigil_common::SigilResult;
use sigil_types::{CustomKind, QualifiedName};

use crate::record::StoredRecord;
use crate::store::{bumped_marker, sort_records, SystemStore};

type EntryKey = (SmolStr, CustomKind, SmolStr);

#[derive(Default)]
struct MemoryInner {
    entries: HashMap<EntryKey, StoredRecord>,
    markers: HashMap<SmolStr, i64>,
}

/// In-process store, used standalone in tests and as the single-node
/// backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key_of(record: &StoredRecord) -> EntryKey {
    (
        record.database.clone(),
        record.kind,
        SmolStr::new(record.qualified_name().to_string()),
    )
}

impl MemoryInner {
    fn bump(&mut self, database: &str) {
        let previous = self.markers.get(database).copied().unwrap_or(0);
        self.markers
            .insert(SmolStr::new(database), bumped_marker(previous));
    }
}

impl SystemStore for MemoryStore {
    fn upsert(&self, record: StoredRecord) -> SigilResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let database = record.database.clone();
        inner.entries.insert(key_of(&record), record);
        inner.bump(&database);
        Ok(())
    }

    fn remove(
        &self,
        database: &str,
        kind: CustomKind,
        name: &QualifiedName,
    ) -> SigilResult<Option<StoredRecord>> {
        let mut inner = self.inner.lock().unwrap();
        let key = (
            SmolStr::new(database),
            kind,
            SmolStr::new(name.to_string()),
        );
        let removed = inner.entries.remove(&key);
        if removed.is_some() {
            inner.bump(database);
        }
        Ok(removed)
    }

    fn remove_all(&self, database: &str) -> SigilResult<Vec<StoredRecord>> {
        let mut inner = self.inner.lock().unwrap();
        let keys: Vec<EntryKey> = inner
            .entries
            .keys()
            .filter(|(db, _, _)| db == database)
            .cloned()
            .collect();
        let mut removed: Vec<StoredRecord> = keys
            .iter()
            .filter_map(|key| inner.entries.remove(key))
            .collect();
        if !removed.is_empty() {
            inner.bump(database);
        }
        sort_records(&mut removed);
        Ok(removed)
    }

    fn list(&self, database: &str) -> SigilResult<Vec<StoredRecord>> {
        let inner = self.inner.lock().unwrap();
        let mut records: Vec<StoredRecord> = inner
            .entries
            .values()
            .filter(|record| record.database == database)
            .cloned()
            .collect();
        sort_records(&mut records);
        Ok(records)
    }

    fn last_updated(&self, database: &str) -> SigilResult<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.markers.get(database).copied().unwrap_or(0))
    }
}
