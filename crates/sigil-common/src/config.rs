use std::time::Duration;

/// Configuration for the custom procedure subsystem.
#[derive(Clone, Debug)]
pub struct CustomProceduresConfig {
    /// Interval in milliseconds between refresh polls of the system
    /// store's last-updated marker. Default: 60000 (one minute).
    pub refresh_interval_ms: u64,
    /// File name of the persisted definitions document inside the
    /// system store directory.
    pub store_file_name: String,
}

impl CustomProceduresConfig {
    /// The refresh interval as a `Duration` for scheduler wiring.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl Default for CustomProceduresConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 60_000,
            store_file_name: "custom_procedures.json".to_string(),
        }
    }
}
