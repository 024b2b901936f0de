use std::time::{SystemTime, UNIX_EPOCH};

use sigil_common::SigilResult;
use sigil_types::{CustomKind, QualifiedName};

use crate::record::StoredRecord;

/// Persistence seam for custom procedure definitions.
///
/// Definitions are keyed by `(database, kind, qualified name)`, so a
/// procedure and a function may share a name. Every mutation bumps the
/// owning database's last-updated marker; removal of a missing
/// definition is a silent no-op and does not bump it.
pub trait SystemStore: Send + Sync {
    /// Insert or replace a definition.
    fn upsert(&self, record: StoredRecord) -> SigilResult<()>;

    /// Remove one definition, returning it if it existed.
    fn remove(
        &self,
        database: &str,
        kind: CustomKind,
        name: &QualifiedName,
    ) -> SigilResult<Option<StoredRecord>>;

    /// Remove every definition of a database. Returns the removed
    /// records sorted by (name, kind).
    fn remove_all(&self, database: &str) -> SigilResult<Vec<StoredRecord>>;

    /// All definitions of a database, sorted by (name, kind).
    fn list(&self, database: &str) -> SigilResult<Vec<StoredRecord>>;

    /// Epoch-millisecond marker of the database's last mutation. Zero
    /// when the database has never been written.
    fn last_updated(&self, database: &str) -> SigilResult<i64>;
}

/// Current time in epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Markers never move backwards, even across a clock step.
pub(crate) fn bumped_marker(previous: i64) -> i64 {
    now_millis().max(previous)
}

pub(crate) fn sort_records(records: &mut [StoredRecord]) {
    records.sort_by(|a, b| {
        let left = (a.qualified_name().to_string(), a.kind);
        let right = (b.qualified_name().to_string(), b.kind);
        left.cmp(&right)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_is_monotonic() {
        let far_future = i64::MAX - 1;
        assert_eq!(bumped_marker(far_future), far_future);
        assert!(bumped_marker(0) > 0);
    }
}
