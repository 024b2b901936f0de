//! Registration engine: turns persisted descriptors into live
//! callables, registers tombstones for removed names, and reconciles a
//! persisted snapshot against the live bookkeeping.

use std::sync::{Arc, Mutex};

use hashbrown::{HashMap, HashSet};
use smol_str::SmolStr;

use sigil_common::{SigilError, SigilResult};
use sigil_types::{
    default_inputs, is_wrapped, CustomDescriptor, FieldSpec, FieldType, FunctionDescriptor,
    FunctionSignature, ProcedureDescriptor, ProcedureOutputs, ProcedureSignature, QualifiedName,
    Value,
};

use crate::callable::{CallableRegistry, FunctionCallable, ProcedureCallable};
use crate::executor::QueryResult;

// ---------------------------------------------------------------------------
// Parameter binding
// ---------------------------------------------------------------------------

/// Bind positional invocation arguments to the declared input fields.
///
/// The reserved `(params :: MAP = {})` shape takes the first argument as
/// the whole parameter map. Otherwise arguments are zipped with the
/// declared names in order, and declared defaults fill in missing
/// trailing arguments.
pub fn bind_params(args: &[Value], fields: &[FieldSpec]) -> SigilResult<Vec<(SmolStr, Value)>> {
    if fields == default_inputs().as_slice() {
        return match args.first() {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Map(entries)) => Ok(entries.clone()),
            Some(other) => Err(SigilError::Execution(format!(
                "expected a single parameter map, got {other:?}"
            ))),
        };
    }

    if args.len() > fields.len() {
        return Err(SigilError::Execution(format!(
            "too many arguments: got {}, expected at most {}",
            args.len(),
            fields.len()
        )));
    }

    let mut params = Vec::with_capacity(fields.len());
    for (i, field) in fields.iter().enumerate() {
        match args.get(i) {
            Some(value) => params.push((field.name.clone(), value.clone())),
            None => match &field.default {
                Some(default) => params.push((field.name.clone(), default.clone())),
                None => {
                    return Err(SigilError::Execution(format!(
                        "missing argument '{}'",
                        field.name
                    )))
                }
            },
        }
    }
    Ok(params)
}

// ---------------------------------------------------------------------------
// Output conversion
// ---------------------------------------------------------------------------

/// Convert a statement result into procedure rows per the declared
/// outputs. VOID drops everything; the reserved `(row :: MAP)` shape
/// wraps each row into a single map column; otherwise the declared
/// columns are projected in order, missing ones as null.
pub fn procedure_rows(
    result: QueryResult,
    outputs: &ProcedureOutputs,
) -> SigilResult<Vec<Vec<Value>>> {
    match outputs {
        ProcedureOutputs::Void => Ok(Vec::new()),
        ProcedureOutputs::Fields(fields) => {
            if outputs.is_default_map_output() {
                let rows = result
                    .rows
                    .iter()
                    .map(|row| vec![result.row_map(row)])
                    .collect();
                return Ok(rows);
            }
            let indices: Vec<Option<usize>> = fields
                .iter()
                .map(|field| result.columns.iter().position(|c| *c == field.name))
                .collect();
            let rows = result
                .rows
                .iter()
                .map(|row| {
                    indices
                        .iter()
                        .map(|index| match index {
                            Some(i) => row.get(*i).cloned().unwrap_or(Value::Null),
                            None => Value::Null,
                        })
                        .collect()
                })
                .collect();
            Ok(rows)
        }
    }
}

/// Convert a statement result into a single function value per the
/// declared return type.
pub fn function_value(
    result: QueryResult,
    output: &FieldType,
    force_single: bool,
    map_result: bool,
) -> SigilResult<Value> {
    if result.rows.is_empty() {
        return Ok(Value::Null);
    }

    // ANY collects everything as a list of row maps.
    if *output == FieldType::Any {
        let rows = result
            .rows
            .iter()
            .map(|row| result.row_map(row))
            .collect();
        return Ok(Value::List(rows));
    }

    if !force_single {
        if let FieldType::List(inner) = output {
            if is_wrapped(inner, map_result) {
                let rows = result
                    .rows
                    .iter()
                    .map(|row| result.row_map(row))
                    .collect();
                return Ok(Value::List(rows));
            }
            if result.columns.len() == 1 {
                let values = result
                    .rows
                    .iter()
                    .map(|row| row.first().cloned().unwrap_or(Value::Null))
                    .collect();
                return Ok(Value::List(values));
            }
            return Err(result_mismatch(&result, output));
        }
    }

    let row = &result.rows[0];
    if is_wrapped(output, map_result) {
        return Ok(result.row_map(row));
    }
    if result.columns.len() == 1 {
        return Ok(row.first().cloned().unwrap_or(Value::Null));
    }
    Err(result_mismatch(&result, output))
}

fn result_mismatch(result: &QueryResult, output: &FieldType) -> SigilError {
    SigilError::Internal(format!(
        "Result mismatch {:?} output type is {}",
        result.columns,
        output.type_name()
    ))
}

// ---------------------------------------------------------------------------
// Callable construction
// ---------------------------------------------------------------------------

fn procedure_callable(descriptor: &ProcedureDescriptor) -> ProcedureCallable {
    let statement = descriptor.statement.clone();
    let inputs = descriptor.signature.inputs.clone();
    let outputs = descriptor.signature.outputs.clone();
    Arc::new(move |executor, args| {
        let params = bind_params(args, &inputs)?;
        let result = executor.execute(&statement, &params)?;
        procedure_rows(result, &outputs)
    })
}

fn procedure_tombstone(name: &QualifiedName) -> ProcedureCallable {
    let name = name.to_string();
    Arc::new(move |_executor, _args| Err(SigilError::UnknownProcedure(name.clone())))
}

fn function_callable(descriptor: &FunctionDescriptor) -> FunctionCallable {
    let statement = descriptor.statement.clone();
    let inputs = descriptor.signature.inputs.clone();
    let output = descriptor.signature.output.clone();
    let force_single = descriptor.force_single;
    let map_result = descriptor.map_result;
    Arc::new(move |executor, args| {
        let params = bind_params(args, &inputs)?;
        let result = executor.execute(&statement, &params)?;
        function_value(result, &output, force_single, map_result)
    })
}

fn function_tombstone(name: &QualifiedName) -> FunctionCallable {
    let name = name.to_string();
    Arc::new(move |_executor, _args| Err(SigilError::UnknownFunction(name.clone())))
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Counts from one reconciliation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub registered: usize,
    pub tombstoned: usize,
    pub failed: usize,
}

#[derive(Default)]
struct LiveState {
    procedures: HashMap<QualifiedName, ProcedureSignature>,
    functions: HashMap<QualifiedName, FunctionSignature>,
}

/// Tracks which definitions are live in the callable registry and keeps
/// that bookkeeping in step with registrations, tombstones, and whole
/// reconciliation passes. The internal lock makes a reconciliation pass
/// atomic with respect to individual registrations.
pub struct RegistrationEngine {
    registry: Arc<dyn CallableRegistry>,
    state: Mutex<LiveState>,
}

impl RegistrationEngine {
    pub fn new(registry: Arc<dyn CallableRegistry>) -> Self {
        Self {
            registry,
            state: Mutex::new(LiveState::default()),
        }
    }

    pub fn registry(&self) -> &Arc<dyn CallableRegistry> {
        &self.registry
    }

    pub fn register_procedure(&self, descriptor: &ProcedureDescriptor) -> SigilResult<()> {
        let mut state = self.state.lock().unwrap();
        self.register_procedure_locked(&mut state, descriptor)
    }

    pub fn register_function(&self, descriptor: &FunctionDescriptor) -> SigilResult<()> {
        let mut state = self.state.lock().unwrap();
        self.register_function_locked(&mut state, descriptor)
    }

    /// Replace a live procedure with a tombstone that fails with the
    /// stable unknown-procedure message.
    pub fn tombstone_procedure(&self, signature: &ProcedureSignature) -> SigilResult<()> {
        let mut state = self.state.lock().unwrap();
        self.tombstone_procedure_locked(&mut state, signature)
    }

    pub fn tombstone_function(&self, signature: &FunctionSignature) -> SigilResult<()> {
        let mut state = self.state.lock().unwrap();
        self.tombstone_function_locked(&mut state, signature)
    }

    /// Bring the live registry in step with a persisted snapshot:
    /// register every descriptor, then tombstone every previously live
    /// name the snapshot no longer contains. A descriptor that fails to
    /// register is logged and skipped; it does not stop the pass.
    pub fn reconcile(&self, descriptors: &[CustomDescriptor]) -> ReconcileOutcome {
        let mut state = self.state.lock().unwrap();
        let mut outcome = ReconcileOutcome::default();

        let mut stale_procedures: HashSet<QualifiedName> =
            state.procedures.keys().cloned().collect();
        let mut stale_functions: HashSet<QualifiedName> =
            state.functions.keys().cloned().collect();

        for descriptor in descriptors {
            let result = match descriptor {
                CustomDescriptor::Procedure(p) => {
                    stale_procedures.remove(&p.signature.name);
                    self.register_procedure_locked(&mut state, p)
                }
                CustomDescriptor::Function(f) => {
                    stale_functions.remove(&f.signature.name);
                    self.register_function_locked(&mut state, f)
                }
            };
            match result {
                Ok(()) => outcome.registered += 1,
                Err(e) => {
                    log::warn!(
                        "skipping {} {} during reconciliation: {e}",
                        descriptor.kind().as_str(),
                        descriptor.name()
                    );
                    outcome.failed += 1;
                }
            }
        }

        for name in stale_procedures {
            let Some(signature) = state.procedures.get(&name).cloned() else {
                continue;
            };
            match self.tombstone_procedure_locked(&mut state, &signature) {
                Ok(()) => outcome.tombstoned += 1,
                Err(e) => {
                    log::warn!("cannot tombstone procedure {name}: {e}");
                    outcome.failed += 1;
                }
            }
        }
        for name in stale_functions {
            let Some(signature) = state.functions.get(&name).cloned() else {
                continue;
            };
            match self.tombstone_function_locked(&mut state, &signature) {
                Ok(()) => outcome.tombstoned += 1,
                Err(e) => {
                    log::warn!("cannot tombstone function {name}: {e}");
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Live procedure signatures, keyed by qualified name so an updated
    /// signature counts as the same entry.
    pub fn live_procedures(&self) -> Vec<ProcedureSignature> {
        self.state
            .lock()
            .unwrap()
            .procedures
            .values()
            .cloned()
            .collect()
    }

    pub fn live_functions(&self) -> Vec<FunctionSignature> {
        self.state
            .lock()
            .unwrap()
            .functions
            .values()
            .cloned()
            .collect()
    }

    fn register_procedure_locked(
        &self,
        state: &mut LiveState,
        descriptor: &ProcedureDescriptor,
    ) -> SigilResult<()> {
        let signature = &descriptor.signature;
        self.registry
            .register_procedure(signature, procedure_callable(descriptor))
            .map_err(|e| {
                log::error!(
                    "cannot register procedure {} (mode {}, statement {:?}): {e}",
                    signature.name,
                    signature.mode,
                    descriptor.statement
                );
                e
            })?;
        state
            .procedures
            .insert(signature.name.clone(), signature.clone());
        Ok(())
    }

    fn register_function_locked(
        &self,
        state: &mut LiveState,
        descriptor: &FunctionDescriptor,
    ) -> SigilResult<()> {
        let signature = &descriptor.signature;
        self.registry
            .register_function(signature, function_callable(descriptor))
            .map_err(|e| {
                log::error!(
                    "cannot register function {} (statement {:?}): {e}",
                    signature.name,
                    descriptor.statement
                );
                e
            })?;
        state
            .functions
            .insert(signature.name.clone(), signature.clone());
        Ok(())
    }

    fn tombstone_procedure_locked(
        &self,
        state: &mut LiveState,
        signature: &ProcedureSignature,
    ) -> SigilResult<()> {
        self.registry
            .register_procedure(signature, procedure_tombstone(&signature.name))?;
        state.procedures.remove(&signature.name);
        Ok(())
    }

    fn tombstone_function_locked(
        &self,
        state: &mut LiveState,
        signature: &FunctionSignature,
    ) -> SigilResult<()> {
        self.registry
            .register_function(signature, function_tombstone(&signature.name))?;
        state.functions.remove(&signature.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::DispatchTable;
    use crate::executor::{QueryExecutor, QueryPlan, QueryType};
    use sigil_types::{default_map_output, Mode};

    type ExecuteFn =
        Box<dyn Fn(&str, &[(SmolStr, Value)]) -> SigilResult<QueryResult> + Send + Sync>;

    struct FakeExecutor {
        execute: ExecuteFn,
    }

    impl FakeExecutor {
        fn returning(result: QueryResult) -> Self {
            Self {
                execute: Box::new(move |_, _| Ok(result.clone())),
            }
        }
    }

    impl QueryExecutor for FakeExecutor {
        fn execute(
            &self,
            statement: &str,
            params: &[(SmolStr, Value)],
        ) -> SigilResult<QueryResult> {
            (self.execute)(statement, params)
        }

        fn explain(
            &self,
            _statement: &str,
            _params: &[(SmolStr, Value)],
        ) -> SigilResult<QueryPlan> {
            Ok(QueryPlan {
                columns: Vec::new(),
                missing_parameters: Vec::new(),
                query_type: QueryType::ReadOnly,
            })
        }
    }

    fn columns(names: &[&str]) -> Vec<SmolStr> {
        names.iter().map(|n| SmolStr::new(n)).collect()
    }

    fn procedure(name: &str, outputs: ProcedureOutputs) -> ProcedureDescriptor {
        ProcedureDescriptor {
            signature: ProcedureSignature {
                name: QualifiedName::from_user(name),
                inputs: Vec::new(),
                outputs,
                mode: Mode::Read,
                description: None,
            },
            statement: SmolStr::new("RETURN 42 AS answer"),
        }
    }

    fn function(name: &str, output: FieldType) -> FunctionDescriptor {
        FunctionDescriptor {
            signature: FunctionSignature {
                name: QualifiedName::from_user(name),
                inputs: vec![FieldSpec::new("value", FieldType::Integer)],
                output,
                description: None,
            },
            statement: SmolStr::new("RETURN $value, $value"),
            force_single: false,
            map_result: false,
        }
    }

    // -- bind_params --------------------------------------------------------

    #[test]
    fn bind_positional() {
        let fields = vec![
            FieldSpec::new("aa", FieldType::Integer),
            FieldSpec::new("bb", FieldType::String),
        ];
        let params = bind_params(&[Value::Integer(1), Value::string("x")], &fields).unwrap();
        assert_eq!(params[0], (SmolStr::new("aa"), Value::Integer(1)));
        assert_eq!(params[1], (SmolStr::new("bb"), Value::string("x")));
    }

    #[test]
    fn bind_fills_trailing_defaults() {
        let fields = vec![
            FieldSpec::new("aa", FieldType::Integer),
            FieldSpec::new("bb", FieldType::Integer).with_default(Value::Integer(10)),
        ];
        let params = bind_params(&[Value::Integer(1)], &fields).unwrap();
        assert_eq!(params[1], (SmolStr::new("bb"), Value::Integer(10)));
    }

    #[test]
    fn bind_missing_without_default_errors() {
        let fields = vec![FieldSpec::new("aa", FieldType::Integer)];
        assert!(bind_params(&[], &fields).is_err());
    }

    #[test]
    fn bind_reserved_map_shape() {
        let fields = default_inputs();
        let map = Value::Map(vec![(SmolStr::new("limit"), Value::Integer(3))]);
        let params = bind_params(std::slice::from_ref(&map), &fields).unwrap();
        assert_eq!(params, vec![(SmolStr::new("limit"), Value::Integer(3))]);

        // No argument at all binds nothing.
        assert!(bind_params(&[], &fields).unwrap().is_empty());
        // A non-map argument is rejected.
        assert!(bind_params(&[Value::Integer(1)], &fields).is_err());
    }

    #[test]
    fn bind_too_many_arguments_errors() {
        let fields = vec![FieldSpec::new("aa", FieldType::Integer)];
        assert!(bind_params(&[Value::Integer(1), Value::Integer(2)], &fields).is_err());
    }

    // -- procedure_rows -----------------------------------------------------

    #[test]
    fn void_drops_rows() {
        let result = QueryResult::new(columns(&["xx"]), vec![vec![Value::Integer(1)]]);
        let rows = procedure_rows(result, &ProcedureOutputs::Void).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn default_map_output_wraps_rows() {
        let result = QueryResult::new(
            columns(&["aa", "bb"]),
            vec![vec![Value::Integer(1), Value::Integer(2)]],
        );
        let outputs = ProcedureOutputs::Fields(default_map_output());
        let rows = procedure_rows(result, &outputs).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 1);
        let entries = rows[0][0].as_map().unwrap();
        assert_eq!(entries[0], (SmolStr::new("aa"), Value::Integer(1)));
    }

    #[test]
    fn declared_outputs_project_in_order() {
        let result = QueryResult::new(
            columns(&["bb", "aa"]),
            vec![vec![Value::Integer(2), Value::Integer(1)]],
        );
        let outputs = ProcedureOutputs::Fields(vec![
            FieldSpec::new("aa", FieldType::Integer),
            FieldSpec::new("bb", FieldType::Integer),
            FieldSpec::new("cc", FieldType::Integer),
        ]);
        let rows = procedure_rows(result, &outputs).unwrap();
        // Declared order, missing column as null.
        assert_eq!(
            rows[0],
            vec![Value::Integer(1), Value::Integer(2), Value::Null]
        );
    }

    // -- function_value -----------------------------------------------------

    #[test]
    fn empty_result_is_null() {
        let result = QueryResult::new(columns(&["xx"]), Vec::new());
        let value = function_value(result, &FieldType::Integer, false, false).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn any_collects_row_maps() {
        let result = QueryResult::new(
            columns(&["xx"]),
            vec![vec![Value::Integer(1)], vec![Value::Integer(2)]],
        );
        let value = function_value(result, &FieldType::Any, false, false).unwrap();
        let items = value.as_list().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].as_map().is_some());
    }

    #[test]
    fn list_output_single_column_collects_values() {
        let result = QueryResult::new(
            columns(&["xx"]),
            vec![vec![Value::Integer(3)], vec![Value::Integer(3)]],
        );
        let output = FieldType::List(Box::new(FieldType::Integer));
        let value = function_value(result, &output, false, false).unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Integer(3), Value::Integer(3)])
        );
    }

    #[test]
    fn list_of_map_collects_row_maps() {
        let result = QueryResult::new(
            columns(&["aa", "bb"]),
            vec![vec![Value::Integer(1), Value::Integer(2)]],
        );
        let output = FieldType::List(Box::new(FieldType::Map));
        let value = function_value(result, &output, false, false).unwrap();
        let items = value.as_list().unwrap();
        assert!(items[0].as_map().is_some());
    }

    #[test]
    fn map_result_hint_disables_wrapping() {
        let result = QueryResult::new(
            columns(&["mm"]),
            vec![vec![Value::Map(vec![(
                SmolStr::new("key"),
                Value::Integer(1),
            )])]],
        );
        // With the hint, the single column is returned as-is.
        let value = function_value(result, &FieldType::Map, true, true).unwrap();
        assert_eq!(
            value,
            Value::Map(vec![(SmolStr::new("key"), Value::Integer(1))])
        );
    }

    #[test]
    fn wrapped_map_returns_row() {
        let result = QueryResult::new(
            columns(&["aa", "bb"]),
            vec![vec![Value::Integer(1), Value::Integer(2)]],
        );
        let value = function_value(result, &FieldType::Map, true, false).unwrap();
        let entries = value.as_map().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn force_single_takes_first_row() {
        let result = QueryResult::new(
            columns(&["xx"]),
            vec![vec![Value::Integer(1)], vec![Value::Integer(2)]],
        );
        let output = FieldType::List(Box::new(FieldType::Integer));
        let value = function_value(result, &output, true, false).unwrap();
        // force_single skips the list collection and unwraps row one.
        assert_eq!(value, Value::Integer(1));
    }

    #[test]
    fn multi_column_scalar_is_result_mismatch() {
        let result = QueryResult::new(
            columns(&["aa", "bb"]),
            vec![vec![Value::Integer(1), Value::Integer(2)]],
        );
        let err = function_value(result, &FieldType::Integer, false, false).unwrap_err();
        assert!(err.to_string().contains("Result mismatch"));
    }

    // -- engine -------------------------------------------------------------

    #[test]
    fn register_and_invoke_procedure() {
        let table = Arc::new(DispatchTable::new());
        let engine = RegistrationEngine::new(table.clone());

        let descriptor = procedure(
            "answer",
            ProcedureOutputs::Fields(vec![FieldSpec::new("answer", FieldType::Integer)]),
        );
        engine.register_procedure(&descriptor).unwrap();
        assert_eq!(engine.live_procedures().len(), 1);

        let executor = FakeExecutor::returning(QueryResult::new(
            columns(&["answer"]),
            vec![vec![Value::Integer(42)]],
        ));
        let rows = table
            .call_procedure(&QualifiedName::from_user("answer"), &executor, &[])
            .unwrap();
        assert_eq!(rows, vec![vec![Value::Integer(42)]]);
    }

    #[test]
    fn tombstone_fails_with_stable_message() {
        let table = Arc::new(DispatchTable::new());
        let engine = RegistrationEngine::new(table.clone());

        let descriptor = procedure("answer", ProcedureOutputs::Void);
        engine.register_procedure(&descriptor).unwrap();
        engine.tombstone_procedure(&descriptor.signature).unwrap();
        assert!(engine.live_procedures().is_empty());

        // Still registered, but fails on invocation.
        let name = QualifiedName::from_user("answer");
        assert!(table.procedure_exists(&name));
        let executor = FakeExecutor::returning(QueryResult::default());
        let err = table.call_procedure(&name, &executor, &[]).unwrap_err();
        assert!(matches!(err, SigilError::UnknownProcedure(_)));
        assert!(err
            .to_string()
            .contains("There is no procedure with the name `custom.answer`"));
    }

    #[test]
    fn function_tombstone_message() {
        let table = Arc::new(DispatchTable::new());
        let engine = RegistrationEngine::new(table.clone());

        let descriptor = function("double", FieldType::Integer);
        engine.register_function(&descriptor).unwrap();
        engine.tombstone_function(&descriptor.signature).unwrap();

        let executor = FakeExecutor::returning(QueryResult::default());
        let err = table
            .call_function(&QualifiedName::from_user("double"), &executor, &[])
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown function 'custom.double'");
    }

    #[test]
    fn reconcile_registers_and_tombstones() {
        let table = Arc::new(DispatchTable::new());
        let engine = RegistrationEngine::new(table.clone());

        let keep = procedure("keep", ProcedureOutputs::Void);
        let gone = procedure("gone", ProcedureOutputs::Void);
        engine.register_procedure(&keep).unwrap();
        engine.register_procedure(&gone).unwrap();

        let added = function("added", FieldType::Integer);
        let snapshot = vec![
            CustomDescriptor::Procedure(keep.clone()),
            CustomDescriptor::Function(added),
        ];
        let outcome = engine.reconcile(&snapshot);
        assert_eq!(outcome.registered, 2);
        assert_eq!(outcome.tombstoned, 1);
        assert_eq!(outcome.failed, 0);

        assert_eq!(engine.live_procedures().len(), 1);
        assert_eq!(engine.live_functions().len(), 1);

        // The removed name is tombstoned, not unregistered.
        let executor = FakeExecutor::returning(QueryResult::default());
        let err = table
            .call_procedure(&QualifiedName::from_user("gone"), &executor, &[])
            .unwrap_err();
        assert!(matches!(err, SigilError::UnknownProcedure(_)));
    }

    #[test]
    fn reconcile_update_is_not_a_tombstone() {
        let table = Arc::new(DispatchTable::new());
        let engine = RegistrationEngine::new(table.clone());

        let original = procedure("answer", ProcedureOutputs::Void);
        engine.register_procedure(&original).unwrap();

        // Same name, changed signature.
        let mut updated = procedure(
            "answer",
            ProcedureOutputs::Fields(vec![FieldSpec::new("answer", FieldType::Integer)]),
        );
        updated.statement = SmolStr::new("RETURN 1 AS answer");
        let outcome = engine.reconcile(&[CustomDescriptor::Procedure(updated.clone())]);
        assert_eq!(outcome.tombstoned, 0);
        assert_eq!(engine.live_procedures(), vec![updated.signature.clone()]);

        // The updated callable answers.
        let executor = FakeExecutor::returning(QueryResult::new(
            columns(&["answer"]),
            vec![vec![Value::Integer(1)]],
        ));
        let rows = table
            .call_procedure(&QualifiedName::from_user("answer"), &executor, &[])
            .unwrap();
        assert_eq!(rows, vec![vec![Value::Integer(1)]]);
    }

    struct RejectingRegistry {
        inner: DispatchTable,
        reject: SmolStr,
    }

    impl CallableRegistry for RejectingRegistry {
        fn register_procedure(
            &self,
            signature: &ProcedureSignature,
            callable: ProcedureCallable,
        ) -> SigilResult<()> {
            if signature.name.name == self.reject {
                return Err(SigilError::Registration("host rejected".into()));
            }
            self.inner.register_procedure(signature, callable)
        }

        fn register_function(
            &self,
            signature: &FunctionSignature,
            callable: FunctionCallable,
        ) -> SigilResult<()> {
            if signature.name.name == self.reject {
                return Err(SigilError::Registration("host rejected".into()));
            }
            self.inner.register_function(signature, callable)
        }

        fn procedure_exists(&self, name: &QualifiedName) -> bool {
            self.inner.procedure_exists(name)
        }

        fn function_exists(&self, name: &QualifiedName) -> bool {
            self.inner.function_exists(name)
        }
    }

    #[test]
    fn reconcile_skips_failing_entry() {
        let registry = Arc::new(RejectingRegistry {
            inner: DispatchTable::new(),
            reject: SmolStr::new("poison"),
        });
        let engine = RegistrationEngine::new(registry);

        let snapshot = vec![
            CustomDescriptor::Procedure(procedure("good", ProcedureOutputs::Void)),
            CustomDescriptor::Procedure(procedure("poison", ProcedureOutputs::Void)),
            CustomDescriptor::Procedure(procedure("also_good", ProcedureOutputs::Void)),
        ];
        let outcome = engine.reconcile(&snapshot);
        assert_eq!(outcome.registered, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(engine.live_procedures().len(), 2);
    }
}
