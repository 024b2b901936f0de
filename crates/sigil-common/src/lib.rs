//! sigil-common: shared error taxonomy and configuration.

pub mod config;
pub mod error;

pub use config::CustomProceduresConfig;
pub use error::{SigilError, SigilResult};
