use std::sync::{Arc, RwLock};

use hashbrown::HashMap;

use sigil_common::{SigilError, SigilResult};
use sigil_types::{FunctionSignature, ProcedureSignature, QualifiedName, Value};

use crate::executor::QueryExecutor;

/// Invocable body of a registered procedure: arguments in, rows out.
pub type ProcedureCallable =
    Arc<dyn Fn(&dyn QueryExecutor, &[Value]) -> SigilResult<Vec<Vec<Value>>> + Send + Sync>;

/// Invocable body of a registered function.
pub type FunctionCallable =
    Arc<dyn Fn(&dyn QueryExecutor, &[Value]) -> SigilResult<Value> + Send + Sync>;

/// Seam to the host's live callable registry. Registering a name that
/// already exists replaces it; that is how both updates and tombstones
/// take effect.
pub trait CallableRegistry: Send + Sync {
    fn register_procedure(
        &self,
        signature: &ProcedureSignature,
        callable: ProcedureCallable,
    ) -> SigilResult<()>;

    fn register_function(
        &self,
        signature: &FunctionSignature,
        callable: FunctionCallable,
    ) -> SigilResult<()>;

    fn procedure_exists(&self, name: &QualifiedName) -> bool;

    fn function_exists(&self, name: &QualifiedName) -> bool;
}

/// In-memory callable registry with name-keyed dispatch.
#[derive(Default)]
pub struct DispatchTable {
    procedures: RwLock<HashMap<QualifiedName, (ProcedureSignature, ProcedureCallable)>>,
    functions: RwLock<HashMap<QualifiedName, (FunctionSignature, FunctionCallable)>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_procedure(
        &self,
        name: &QualifiedName,
        executor: &dyn QueryExecutor,
        args: &[Value],
    ) -> SigilResult<Vec<Vec<Value>>> {
        let callable = {
            let procedures = self.procedures.read().unwrap();
            procedures
                .get(name)
                .map(|(_, callable)| callable.clone())
                .ok_or_else(|| SigilError::NotFound(name.to_string()))?
        };
        callable(executor, args)
    }

    pub fn call_function(
        &self,
        name: &QualifiedName,
        executor: &dyn QueryExecutor,
        args: &[Value],
    ) -> SigilResult<Value> {
        let callable = {
            let functions = self.functions.read().unwrap();
            functions
                .get(name)
                .map(|(_, callable)| callable.clone())
                .ok_or_else(|| SigilError::NotFound(name.to_string()))?
        };
        callable(executor, args)
    }

    pub fn procedure_signature(&self, name: &QualifiedName) -> Option<ProcedureSignature> {
        self.procedures
            .read()
            .unwrap()
            .get(name)
            .map(|(signature, _)| signature.clone())
    }

    pub fn function_signature(&self, name: &QualifiedName) -> Option<FunctionSignature> {
        self.functions
            .read()
            .unwrap()
            .get(name)
            .map(|(signature, _)| signature.clone())
    }
}

impl CallableRegistry for DispatchTable {
    fn register_procedure(
        &self,
        signature: &ProcedureSignature,
        callable: ProcedureCallable,
    ) -> SigilResult<()> {
        let mut procedures = self.procedures.write().unwrap();
        procedures.insert(signature.name.clone(), (signature.clone(), callable));
        Ok(())
    }

    fn register_function(
        &self,
        signature: &FunctionSignature,
        callable: FunctionCallable,
    ) -> SigilResult<()> {
        let mut functions = self.functions.write().unwrap();
        functions.insert(signature.name.clone(), (signature.clone(), callable));
        Ok(())
    }

    fn procedure_exists(&self, name: &QualifiedName) -> bool {
        self.procedures.read().unwrap().contains_key(name)
    }

    fn function_exists(&self, name: &QualifiedName) -> bool {
        self.functions.read().unwrap().contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::QueryPlan;
    use crate::executor::QueryResult;
    use sigil_types::{FieldType, Mode, ProcedureOutputs};
    use smol_str::SmolStr;

    struct NullExecutor;

    impl QueryExecutor for NullExecutor {
        fn execute(
            &self,
            _statement: &str,
            _params: &[(SmolStr, Value)],
        ) -> SigilResult<QueryResult> {
            Ok(QueryResult::default())
        }

        fn explain(
            &self,
            _statement: &str,
            _params: &[(SmolStr, Value)],
        ) -> SigilResult<QueryPlan> {
            Ok(QueryPlan {
                columns: Vec::new(),
                missing_parameters: Vec::new(),
                query_type: crate::executor::QueryType::ReadOnly,
            })
        }
    }

    fn procedure_signature(name: &str) -> ProcedureSignature {
        ProcedureSignature {
            name: QualifiedName::from_user(name),
            inputs: Vec::new(),
            outputs: ProcedureOutputs::Void,
            mode: Mode::Read,
            description: None,
        }
    }

    fn function_signature(name: &str) -> FunctionSignature {
        FunctionSignature {
            name: QualifiedName::from_user(name),
            inputs: Vec::new(),
            output: FieldType::Integer,
            description: None,
        }
    }

    #[test]
    fn register_and_call() {
        let table = DispatchTable::new();
        table
            .register_function(
                &function_signature("answer"),
                Arc::new(|_, _| Ok(Value::Integer(42))),
            )
            .unwrap();

        let name = QualifiedName::from_user("answer");
        assert!(table.function_exists(&name));
        let signature = table.function_signature(&name).unwrap();
        assert_eq!(signature.output, FieldType::Integer);
        let value = table.call_function(&name, &NullExecutor, &[]).unwrap();
        assert_eq!(value, Value::Integer(42));
    }

    #[test]
    fn register_replaces_homonym() {
        let table = DispatchTable::new();
        let name = QualifiedName::from_user("answer");
        table
            .register_function(
                &function_signature("answer"),
                Arc::new(|_, _| Ok(Value::Integer(1))),
            )
            .unwrap();
        table
            .register_function(
                &function_signature("answer"),
                Arc::new(|_, _| Ok(Value::Integer(2))),
            )
            .unwrap();
        let value = table.call_function(&name, &NullExecutor, &[]).unwrap();
        assert_eq!(value, Value::Integer(2));
    }

    #[test]
    fn unknown_name_is_not_found() {
        let table = DispatchTable::new();
        let name = QualifiedName::from_user("nothing");
        assert!(!table.procedure_exists(&name));
        let err = table
            .call_procedure(&name, &NullExecutor, &[])
            .unwrap_err();
        assert!(matches!(err, SigilError::NotFound(_)));
    }

    #[test]
    fn procedure_and_function_namespaces_are_separate() {
        let table = DispatchTable::new();
        table
            .register_procedure(
                &procedure_signature("same"),
                Arc::new(|_, _| Ok(Vec::new())),
            )
            .unwrap();
        let name = QualifiedName::from_user("same");
        assert!(table.procedure_exists(&name));
        assert!(!table.function_exists(&name));
        assert!(table.procedure_signature(&name).is_some());
        assert!(table.function_signature(&name).is_none());
    }
}
