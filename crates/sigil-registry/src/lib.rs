//! sigil-registry: live registration of custom procedures and
//! functions.
//!
//! The engine turns persisted descriptors into callables over a host
//! [`QueryExecutor`], keeps the host's [`CallableRegistry`] in step with
//! the store through whole-snapshot reconciliation, and replaces
//! dropped names with tombstones that fail with a stable message. The
//! per-database [`CustomProcedureHandler`] is the write path, and the
//! [`RefreshScheduler`] polls the store marker so every member converges
//! on the same definitions.

pub mod callable;
pub mod engine;
pub mod executor;
pub mod handler;
pub mod refresh;

pub use callable::{CallableRegistry, DispatchTable, FunctionCallable, ProcedureCallable};
pub use engine::{bind_params, function_value, procedure_rows, ReconcileOutcome, RegistrationEngine};
pub use executor::{QueryExecutor, QueryPlan, QueryResult, QueryType};
pub use handler::CustomProcedureHandler;
pub use refresh::RefreshScheduler;
