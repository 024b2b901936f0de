//! Eager validation for the legacy declare surface: plan the backing
//! statement with EXPLAIN and reject declarations whose inputs, outputs,
//! or mode cannot match what the statement produces.

use smol_str::SmolStr;

use sigil_common::{SigilError, SigilResult};
use sigil_registry::{QueryExecutor, QueryPlan, QueryType};
use sigil_types::{
    default_inputs, is_wrapped, FieldSpec, FieldType, FunctionSignature, Mode,
    ProcedureOutputs, ProcedureSignature, Value,
};

/// Fixed so client tooling can pattern-match the failure.
pub const ERROR_MISMATCHED_INPUTS: &str =
    "Required query parameters do not match provided input arguments.";
pub const ERROR_MISMATCHED_OUTPUTS: &str = "Query results do not match requested output.";

pub fn validate_procedure(
    executor: &dyn QueryExecutor,
    statement: &str,
    signature: &ProcedureSignature,
) -> SigilResult<()> {
    let plan = explain(executor, statement, &signature.inputs)?;
    check_inputs(&plan, &signature.inputs)?;
    check_procedure_outputs(&plan, &signature.outputs)?;
    check_mode(signature.mode, plan.query_type)
}

pub fn validate_function(
    executor: &dyn QueryExecutor,
    statement: &str,
    signature: &FunctionSignature,
    map_result: bool,
) -> SigilResult<()> {
    let plan = explain(executor, statement, &signature.inputs)?;
    check_inputs(&plan, &signature.inputs)?;
    check_function_output(&plan, &signature.output, map_result)?;
    if plan.query_type != QueryType::ReadOnly {
        return Err(SigilError::Validation(
            "Custom functions must be read-only, the statement writes".to_string(),
        ));
    }
    Ok(())
}

fn explain(
    executor: &dyn QueryExecutor,
    statement: &str,
    inputs: &[FieldSpec],
) -> SigilResult<QueryPlan> {
    // Bind every declared name so the plan reports only parameters the
    // declaration does not cover.
    let params: Vec<(SmolStr, Value)> = inputs
        .iter()
        .map(|field| {
            (
                field.name.clone(),
                field.default.clone().unwrap_or(Value::Null),
            )
        })
        .collect();
    executor.explain(statement, &params)
}

fn check_inputs(plan: &QueryPlan, inputs: &[FieldSpec]) -> SigilResult<()> {
    // The reserved single-map shape passes arbitrary parameters through.
    if inputs == default_inputs().as_slice() {
        return Ok(());
    }
    if plan.missing_parameters.is_empty() {
        Ok(())
    } else {
        Err(SigilError::Validation(ERROR_MISMATCHED_INPUTS.to_string()))
    }
}

fn check_procedure_outputs(plan: &QueryPlan, outputs: &ProcedureOutputs) -> SigilResult<()> {
    match outputs {
        ProcedureOutputs::Void => Ok(()),
        ProcedureOutputs::Fields(fields) => {
            if outputs.is_default_map_output() {
                return Ok(());
            }
            let declared: Vec<&str> = fields.iter().map(|field| field.name.as_str()).collect();
            let produced: Vec<&str> = plan
                .columns
                .iter()
                .map(|column| strip_column_tag(column))
                .collect();
            let matches = declared.len() == produced.len()
                && declared.iter().all(|name| produced.contains(name));
            if matches {
                Ok(())
            } else {
                Err(SigilError::Validation(ERROR_MISMATCHED_OUTPUTS.to_string()))
            }
        }
    }
}

fn check_function_output(
    plan: &QueryPlan,
    output: &FieldType,
    map_result: bool,
) -> SigilResult<()> {
    // Wrapped and ANY outputs absorb whole rows; anything scalar-shaped
    // needs exactly one column to unwrap.
    let absorbs_rows = match output {
        FieldType::Any => true,
        FieldType::List(inner) => is_wrapped(inner, map_result),
        other => is_wrapped(other, map_result),
    };
    if absorbs_rows || plan.columns.len() == 1 {
        Ok(())
    } else {
        Err(SigilError::Validation(ERROR_MISMATCHED_OUTPUTS.to_string()))
    }
}

fn check_mode(declared: Mode, query_type: QueryType) -> SigilResult<()> {
    let required = match query_type {
        QueryType::ReadOnly => Mode::Read,
        QueryType::Write | QueryType::ReadWrite => Mode::Write,
        QueryType::SchemaWrite => Mode::Schema,
        QueryType::Dbms => Mode::Dbms,
    };
    let permitted = match required {
        Mode::Read => true,
        Mode::Write => matches!(declared, Mode::Write | Mode::Schema),
        Mode::Schema => declared == Mode::Schema,
        Mode::Dbms => declared == Mode::Dbms,
        Mode::Default => true,
    };
    if permitted {
        Ok(())
    } else {
        Err(SigilError::Validation(format!(
            "Procedure mode {declared} cannot run a {} statement",
            required
        )))
    }
}

/// Planners may tag result columns with a positional suffix such as
/// `answer@3`; strip it before comparing against declared names.
fn strip_column_tag(column: &str) -> &str {
    if let Some(at) = column.rfind('@') {
        let digits = &column[at + 1..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return &column[..at];
        }
    }
    column
}
