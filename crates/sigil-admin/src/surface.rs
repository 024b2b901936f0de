//! Administrative entry points for custom definitions.
//!
//! The service is bound to the database the calling session is
//! connected to. The install/drop/show surface only works when that is
//! the system database and routes writes to the target database's
//! handler when it lives in this process, falling back to store-only
//! writes that remote members pick up by polling. The legacy declare
//! surface works directly on a user database and validates statements
//! eagerly with EXPLAIN.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use smol_str::SmolStr;

use sigil_common::{SigilError, SigilResult};
use sigil_parser::Signatures;
use sigil_registry::{CustomProcedureHandler, QueryExecutor};
use sigil_store::{StoredRecord, SystemStore};
use sigil_types::{
    CustomKind, FunctionDescriptor, Mode, ProcedureDescriptor, QualifiedName,
};

use crate::info::CustomProcedureInfo;
use crate::topology::{
    DatabaseTopology, ERROR_NOT_SYSTEM_DATABASE, ERROR_RESERVED_TARGET,
    ERROR_SYSTEM_NOT_WRITABLE, SYSTEM_DATABASE,
};
use crate::validate::{validate_function, validate_procedure};

pub struct CustomProcedures {
    /// Database the calling session is bound to.
    database: SmolStr,
    store: Arc<dyn SystemStore>,
    topology: Arc<dyn DatabaseTopology>,
    executor: Arc<dyn QueryExecutor>,
    signatures: Signatures,
    /// Handlers for the databases hosted in this process.
    handlers: RwLock<HashMap<SmolStr, Arc<CustomProcedureHandler>>>,
}

impl CustomProcedures {
    pub fn new(
        database: &str,
        store: Arc<dyn SystemStore>,
        topology: Arc<dyn DatabaseTopology>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        Self {
            database: SmolStr::new(database),
            store,
            topology,
            executor,
            signatures: Signatures::new(),
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Attach the handler of a locally hosted database so writes take
    /// effect in its live registry immediately instead of waiting for a
    /// refresh poll.
    pub fn attach_handler(&self, handler: Arc<CustomProcedureHandler>) {
        let mut handlers = self.handlers.write().unwrap();
        handlers.insert(SmolStr::new(handler.database()), handler);
    }

    fn handler(&self, database: &str) -> Option<Arc<CustomProcedureHandler>> {
        self.handlers.read().unwrap().get(database).cloned()
    }

    // -- admin surface, bound to the system database --------------------

    pub fn install_procedure(
        &self,
        signature: &str,
        statement: &str,
        target: &str,
        mode: Option<&str>,
        description: Option<&str>,
    ) -> SigilResult<()> {
        self.check_admin_write(target)?;
        let mode = Mode::parse(mode)?;
        let signature = self.signatures.procedure(signature, mode, description)?;
        let descriptor = ProcedureDescriptor {
            signature,
            statement: SmolStr::new(statement),
        };
        match self.handler(target) {
            Some(handler) => handler.install_procedure(&descriptor),
            None => self
                .store
                .upsert(StoredRecord::from_procedure(target, &descriptor)),
        }
    }

    pub fn install_function(
        &self,
        signature: &str,
        statement: &str,
        target: &str,
        force_single: bool,
        description: Option<&str>,
    ) -> SigilResult<()> {
        self.check_admin_write(target)?;
        let (signature, map_result) = self.signatures.function(signature, description)?;
        let descriptor = FunctionDescriptor {
            signature,
            statement: SmolStr::new(statement),
            force_single,
            map_result,
        };
        match self.handler(target) {
            Some(handler) => handler.install_function(&descriptor),
            None => self
                .store
                .upsert(StoredRecord::from_function(target, &descriptor)),
        }
    }

    pub fn drop_procedure(
        &self,
        name: &str,
        target: &str,
    ) -> SigilResult<Option<CustomProcedureInfo>> {
        self.check_admin_write(target)?;
        self.drop_one(target, CustomKind::Procedure, name)
    }

    pub fn drop_function(
        &self,
        name: &str,
        target: &str,
    ) -> SigilResult<Option<CustomProcedureInfo>> {
        self.check_admin_write(target)?;
        self.drop_one(target, CustomKind::Function, name)
    }

    /// Remove every definition of the target database, returning what
    /// was removed in listing order.
    pub fn drop_all(&self, target: &str) -> SigilResult<Vec<CustomProcedureInfo>> {
        self.check_admin_write(target)?;
        let descriptors = match self.handler(target) {
            Some(handler) => handler.drop_all()?,
            None => {
                let mut descriptors = Vec::new();
                for record in self.store.remove_all(target)? {
                    descriptors.push(record.to_descriptor()?);
                }
                descriptors
            }
        };
        Ok(descriptors
            .iter()
            .map(CustomProcedureInfo::from_descriptor)
            .collect())
    }

    /// Enumerate the target database's definitions in listing order.
    pub fn show(&self, target: &str) -> SigilResult<Vec<CustomProcedureInfo>> {
        self.check_admin_read(target)?;
        let mut infos = Vec::new();
        for record in self.store.list(target)? {
            infos.push(CustomProcedureInfo::from_descriptor(&record.to_descriptor()?));
        }
        Ok(infos)
    }

    fn drop_one(
        &self,
        target: &str,
        kind: CustomKind,
        name: &str,
    ) -> SigilResult<Option<CustomProcedureInfo>> {
        let qualified = QualifiedName::from_user(name);
        let descriptor = match self.handler(target) {
            Some(handler) => match kind {
                CustomKind::Procedure => handler.drop_procedure(&qualified)?,
                CustomKind::Function => handler.drop_function(&qualified)?,
            },
            None => match self.store.remove(target, kind, &qualified)? {
                Some(record) => Some(record.to_descriptor()?),
                None => None,
            },
        };
        Ok(descriptor
            .as_ref()
            .map(CustomProcedureInfo::from_descriptor))
    }

    fn check_admin_read(&self, target: &str) -> SigilResult<()> {
        if self.database != SYSTEM_DATABASE {
            return Err(SigilError::Routing(ERROR_NOT_SYSTEM_DATABASE.to_string()));
        }
        self.check_target(target)
    }

    fn check_admin_write(&self, target: &str) -> SigilResult<()> {
        if self.database != SYSTEM_DATABASE {
            return Err(SigilError::Routing(ERROR_NOT_SYSTEM_DATABASE.to_string()));
        }
        if !self.topology.is_leader(SYSTEM_DATABASE) {
            return Err(SigilError::Routing(ERROR_SYSTEM_NOT_WRITABLE.to_string()));
        }
        self.check_target(target)
    }

    fn check_target(&self, target: &str) -> SigilResult<()> {
        if target == SYSTEM_DATABASE {
            return Err(SigilError::Routing(ERROR_RESERVED_TARGET.to_string()));
        }
        if !self.topology.database_exists(target) {
            return Err(SigilError::Routing(format!(
                "The database '{target}' does not exist"
            )));
        }
        Ok(())
    }

    // -- legacy declare surface, bound to a user database ---------------

    /// Declare a procedure on the bound database, validating the
    /// statement eagerly with EXPLAIN before persisting.
    pub fn declare_procedure(
        &self,
        signature: &str,
        statement: &str,
        mode: Option<&str>,
        description: Option<&str>,
    ) -> SigilResult<()> {
        let handler = self.legacy_handler()?;
        let mode = Mode::parse(mode)?;
        let signature = self.signatures.procedure(signature, mode, description)?;
        validate_procedure(self.executor.as_ref(), statement, &signature)?;
        handler.install_procedure(&ProcedureDescriptor {
            signature,
            statement: SmolStr::new(statement),
        })
    }

    pub fn declare_function(
        &self,
        signature: &str,
        statement: &str,
        force_single: bool,
        description: Option<&str>,
    ) -> SigilResult<()> {
        let handler = self.legacy_handler()?;
        let (signature, map_result) = self.signatures.function(signature, description)?;
        validate_function(self.executor.as_ref(), statement, &signature, map_result)?;
        handler.install_function(&FunctionDescriptor {
            signature,
            statement: SmolStr::new(statement),
            force_single,
            map_result,
        })
    }

    /// Remove a procedure from the bound database. A miss is silent.
    pub fn remove_procedure(&self, name: &str) -> SigilResult<Option<CustomProcedureInfo>> {
        let handler = self.legacy_handler()?;
        let dropped = handler.drop_procedure(&QualifiedName::from_user(name))?;
        Ok(dropped.as_ref().map(CustomProcedureInfo::from_descriptor))
    }

    pub fn remove_function(&self, name: &str) -> SigilResult<Option<CustomProcedureInfo>> {
        let handler = self.legacy_handler()?;
        let dropped = handler.drop_function(&QualifiedName::from_user(name))?;
        Ok(dropped.as_ref().map(CustomProcedureInfo::from_descriptor))
    }

    /// Enumerate the bound database's definitions.
    pub fn list(&self) -> SigilResult<Vec<CustomProcedureInfo>> {
        if self.database == SYSTEM_DATABASE {
            return Err(SigilError::Routing(ERROR_RESERVED_TARGET.to_string()));
        }
        let mut infos = Vec::new();
        for record in self.store.list(&self.database)? {
            infos.push(CustomProcedureInfo::from_descriptor(&record.to_descriptor()?));
        }
        Ok(infos)
    }

    fn legacy_handler(&self) -> SigilResult<Arc<CustomProcedureHandler>> {
        if self.database == SYSTEM_DATABASE {
            return Err(SigilError::Routing(ERROR_RESERVED_TARGET.to_string()));
        }
        self.handler(&self.database).ok_or_else(|| {
            SigilError::Internal(format!(
                "no handler attached for database '{}'",
                self.database
            ))
        })
    }
}
