//! Per-database handler: the write path from admin commands into the
//! store and the live registry, plus the restore path a refresh
//! scheduler drives.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use smol_str::SmolStr;

use sigil_common::{SigilError, SigilResult};
use sigil_store::{StoredRecord, SystemStore};
use sigil_types::{CustomDescriptor, CustomKind, FunctionDescriptor, ProcedureDescriptor, QualifiedName};

use crate::engine::{ReconcileOutcome, RegistrationEngine};

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Owns the custom definitions of one database: persists them through
/// the system store, keeps the live registry in step, and remembers the
/// marker of the last snapshot it applied.
pub struct CustomProcedureHandler {
    database: SmolStr,
    store: Arc<dyn SystemStore>,
    engine: RegistrationEngine,
    /// Marker value of the last restore, compared against the store's
    /// last-updated marker to decide whether a refresh pass is due.
    last_update: AtomicI64,
}

impl CustomProcedureHandler {
    pub fn new(database: &str, store: Arc<dyn SystemStore>, engine: RegistrationEngine) -> Self {
        Self {
            database: SmolStr::new(database),
            store,
            engine,
            last_update: AtomicI64::new(0),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn engine(&self) -> &RegistrationEngine {
        &self.engine
    }

    /// Persist a procedure definition and register it live. If live
    /// registration fails the persisted record is rolled back so the
    /// store never advertises a definition no member could load.
    pub fn install_procedure(&self, descriptor: &ProcedureDescriptor) -> SigilResult<()> {
        let record = StoredRecord::from_procedure(&self.database, descriptor);
        self.store.upsert(record)?;
        if let Err(e) = self.engine.register_procedure(descriptor) {
            log::error!(
                "registration of procedure {} failed after persisting, rolling back: {e}",
                descriptor.signature.name
            );
            self.rollback(CustomKind::Procedure, &descriptor.signature.name);
            return Err(SigilError::Registration(format!(
                "Error registering procedure {}, see log.",
                descriptor.signature.name
            )));
        }
        Ok(())
    }

    pub fn install_function(&self, descriptor: &FunctionDescriptor) -> SigilResult<()> {
        let record = StoredRecord::from_function(&self.database, descriptor);
        self.store.upsert(record)?;
        if let Err(e) = self.engine.register_function(descriptor) {
            log::error!(
                "registration of function {} failed after persisting, rolling back: {e}",
                descriptor.signature.name
            );
            self.rollback(CustomKind::Function, &descriptor.signature.name);
            return Err(SigilError::Registration(format!(
                "Error registering function {}, see log.",
                descriptor.signature.name
            )));
        }
        Ok(())
    }

    fn rollback(&self, kind: CustomKind, name: &QualifiedName) {
        if let Err(e) = self.store.remove(&self.database, kind, name) {
            log::error!("cannot roll back store entry for {} {name}: {e}", kind.as_str());
        }
    }

    /// Remove a procedure definition and tombstone it live. A miss is a
    /// silent no-op returning `None`.
    pub fn drop_procedure(&self, name: &QualifiedName) -> SigilResult<Option<CustomDescriptor>> {
        let Some(record) = self.store.remove(&self.database, CustomKind::Procedure, name)? else {
            return Ok(None);
        };
        let descriptor = record.to_descriptor()?;
        if let Some(procedure) = descriptor.as_procedure() {
            self.engine.tombstone_procedure(&procedure.signature)?;
        }
        Ok(Some(descriptor))
    }

    pub fn drop_function(&self, name: &QualifiedName) -> SigilResult<Option<CustomDescriptor>> {
        let Some(record) = self.store.remove(&self.database, CustomKind::Function, name)? else {
            return Ok(None);
        };
        let descriptor = record.to_descriptor()?;
        if let Some(function) = descriptor.as_function() {
            self.engine.tombstone_function(&function.signature)?;
        }
        Ok(Some(descriptor))
    }

    /// Remove every definition of this database. Each removed entry is
    /// tombstoned live; a tombstone failure is logged and does not stop
    /// the pass. Returns the removed descriptors in listing order.
    pub fn drop_all(&self) -> SigilResult<Vec<CustomDescriptor>> {
        let removed = self.store.remove_all(&self.database)?;
        let mut descriptors = Vec::with_capacity(removed.len());
        for record in removed {
            let descriptor = match record.to_descriptor() {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    log::warn!(
                        "cannot decode removed {} {}: {e}",
                        record.kind.as_str(),
                        record.qualified_name()
                    );
                    continue;
                }
            };
            let result = match &descriptor {
                CustomDescriptor::Procedure(p) => self.engine.tombstone_procedure(&p.signature),
                CustomDescriptor::Function(f) => self.engine.tombstone_function(&f.signature),
            };
            if let Err(e) = result {
                log::warn!("cannot tombstone {}: {e}", descriptor.name());
            }
            descriptors.push(descriptor);
        }
        Ok(descriptors)
    }

    /// Reload every persisted definition of this database into the live
    /// registry, tombstoning names that disappeared. Records that fail
    /// to decode are logged and skipped.
    pub fn restore(&self) -> SigilResult<ReconcileOutcome> {
        // Mark before reading so a concurrent write is picked up again
        // on the next poll rather than missed.
        self.last_update.store(now_millis(), Ordering::SeqCst);

        let records = self.store.list(&self.database)?;
        let mut failed = 0usize;
        let mut descriptors = Vec::with_capacity(records.len());
        for record in records {
            match record.to_descriptor() {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => {
                    log::warn!(
                        "skipping stored {} {}: {e}",
                        record.kind.as_str(),
                        record.qualified_name()
                    );
                    failed += 1;
                }
            }
        }
        let mut outcome = self.engine.reconcile(&descriptors);
        outcome.failed += failed;
        Ok(outcome)
    }

    /// True when the store has been written since the last restore.
    pub fn needs_refresh(&self) -> SigilResult<bool> {
        let marker = self.store.last_updated(&self.database)?;
        Ok(marker > self.last_update.load(Ordering::SeqCst))
    }

    /// Persisted definitions of this database in listing order.
    pub fn list(&self) -> SigilResult<Vec<CustomDescriptor>> {
        let records = self.store.list(&self.database)?;
        let mut descriptors = Vec::with_capacity(records.len());
        for record in records {
            descriptors.push(record.to_descriptor()?);
        }
        Ok(descriptors)
    }
}
