//! sigil-store: persistence of custom procedure definitions.
//!
//! Definitions are keyed by `(database, kind, qualified name)` and each
//! database carries a last-updated marker in epoch milliseconds that
//! refresh schedulers poll. Two backends: an in-process `MemoryStore`
//! and a JSON-document `FileStore` with atomic rewrites.

pub mod file;
pub mod memory;
pub mod record;
pub mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::StoredRecord;
pub use store::SystemStore;
