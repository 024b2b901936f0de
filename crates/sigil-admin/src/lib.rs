//! sigil-admin: the administrative surface for custom procedures and
//! functions.
//!
//! Install, drop, and show run against the system database and route to
//! per-database handlers; the legacy declare surface runs on a user
//! database and validates statements eagerly with EXPLAIN.

pub mod info;
pub mod surface;
pub mod topology;
pub mod validate;

pub use info::{CustomProcedureInfo, OutputsInfo};
pub use surface::CustomProcedures;
pub use topology::{DatabaseTopology, StaticTopology, SYSTEM_DATABASE};
pub use validate::{ERROR_MISMATCHED_INPUTS, ERROR_MISMATCHED_OUTPUTS};
