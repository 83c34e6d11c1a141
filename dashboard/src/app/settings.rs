//! Runtime tunables loaded via OrthoConfig.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

/// Optional settings layered from the environment and config files.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DASHBOARD")]
pub struct DashboardSettings {
    /// Directory holding persisted credentials. Absent keeps them in memory.
    pub storage_dir: Option<PathBuf>,
    /// Delay in milliseconds used to coalesce cache invalidations.
    #[ortho_config(default = 16)]
    pub invalidation_window_ms: u64,
}

impl DashboardSettings {
    /// Invalidation coalescing window.
    pub fn invalidation_window(&self) -> Duration {
        Duration::from_millis(self.invalidation_window_ms)
    }
}
