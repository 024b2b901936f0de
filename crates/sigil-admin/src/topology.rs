//! Routing context: which databases exist and whether this member may
//! write administrative state.

use smol_str::SmolStr;

/// Name of the reserved internal database that persists administrative
/// state. Custom definitions are stored there but can never target it.
pub const SYSTEM_DATABASE: &str = "system";

pub const ERROR_NOT_SYSTEM_DATABASE: &str =
    "This procedure must be executed against the system database";
pub const ERROR_SYSTEM_NOT_WRITABLE: &str =
    "The system database is not writable on this member, execute the procedure against the leader";
pub const ERROR_RESERVED_TARGET: &str =
    "Custom definitions cannot target the reserved system database";

/// Seam to the host's database topology.
pub trait DatabaseTopology: Send + Sync {
    fn database_exists(&self, name: &str) -> bool;

    /// Whether this member may write `name`. Single-member deployments
    /// are always the leader.
    fn is_leader(&self, name: &str) -> bool;
}

/// Fixed topology, for single-process deployments and tests.
pub struct StaticTopology {
    databases: Vec<SmolStr>,
    leader: bool,
}

impl StaticTopology {
    pub fn new(databases: &[&str], leader: bool) -> Self {
        Self {
            databases: databases.iter().map(|name| SmolStr::new(name)).collect(),
            leader,
        }
    }
}

impl DatabaseTopology for StaticTopology {
    fn database_exists(&self, name: &str) -> bool {
        name == SYSTEM_DATABASE || self.databases.iter().any(|db| db == name)
    }

    fn is_leader(&self, _name: &str) -> bool {
        self.leader
    }
}
