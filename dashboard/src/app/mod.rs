//! Application wiring: startup environment, tunables and shared state.

mod env;
mod settings;
mod state;

pub use env::{API_BASE_URL_ENV, PROJECT_ID_ENV, RequiredEnv, StartupError};
pub use settings::DashboardSettings;
pub use state::{AppState, EntityApis};
