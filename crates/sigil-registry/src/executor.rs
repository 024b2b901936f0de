use smol_str::SmolStr;

use sigil_common::SigilResult;
use sigil_types::Value;

/// Columns-plus-rows result of executing a statement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<SmolStr>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<SmolStr>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// One row as a map keyed by column name.
    pub fn row_map(&self, row: &[Value]) -> Value {
        Value::Map(
            self.columns
                .iter()
                .zip(row.iter())
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }
}

/// Execution type reported by a query plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryType {
    ReadOnly,
    Write,
    ReadWrite,
    SchemaWrite,
    Dbms,
}

/// Result of planning a statement without running it.
#[derive(Clone, Debug)]
pub struct QueryPlan {
    pub columns: Vec<SmolStr>,
    /// Parameters the statement uses but the provided set did not bind.
    pub missing_parameters: Vec<SmolStr>,
    pub query_type: QueryType,
}

/// Seam to the host query engine. Custom callables run their backing
/// statement through this; the admin surface plans statements through
/// it when validating declarations eagerly.
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, statement: &str, params: &[(SmolStr, Value)]) -> SigilResult<QueryResult>;

    fn explain(&self, statement: &str, params: &[(SmolStr, Value)]) -> SigilResult<QueryPlan>;
}
