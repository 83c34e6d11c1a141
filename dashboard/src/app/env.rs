//! Required startup environment.
//!
//! The backend base URL and project identifier are read exactly once at
//! startup. Both are mandatory; the binary refuses to start without them.

use std::path::PathBuf;

use mockable::Env;
use url::Url;

use crate::domain::Error;
use crate::domain::ports::StorageError;

/// Environment variable holding the backend base URL.
pub const API_BASE_URL_ENV: &str = "DASHBOARD_API_BASE_URL";
/// Environment variable holding the backend project identifier.
pub const PROJECT_ID_ENV: &str = "DASHBOARD_PROJECT_ID";

const URL_EXPECTED: &str = "an absolute http or https URL";
const PROJECT_ID_EXPECTED: &str = "a non-blank identifier";

/// Errors that prevent the dashboard from starting.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StartupError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// The credential directory could not be opened.
    #[error("failed to open credential storage at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: StorageError,
    },
    /// The HTTP client could not be configured.
    #[error("failed to configure the backend client: {0}")]
    Transport(#[source] Error),
}

/// Validated startup environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredEnv {
    api_base_url: Url,
    project_id: String,
}

impl RequiredEnv {
    /// Read and validate both required variables.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dashboard::app::RequiredEnv;
    /// use mockable::MockEnv;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|name| match name {
    ///     "DASHBOARD_API_BASE_URL" => Some("https://api.example.com/v1".to_owned()),
    ///     "DASHBOARD_PROJECT_ID" => Some("insights".to_owned()),
    ///     _ => None,
    /// });
    ///
    /// let required = RequiredEnv::from_env(&env).expect("valid environment");
    /// assert_eq!(required.project_id(), "insights");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::MissingEnv`] when a variable is absent and
    /// [`StartupError::InvalidEnv`] when its value is unusable.
    pub fn from_env<E: Env>(env: &E) -> Result<Self, StartupError> {
        let raw_url = require(env, API_BASE_URL_ENV)?;
        let api_base_url = parse_base_url(&raw_url)?;
        let raw_project = require(env, PROJECT_ID_ENV)?;
        let project_id = raw_project.trim();
        if project_id.is_empty() {
            return Err(StartupError::InvalidEnv {
                name: PROJECT_ID_ENV,
                value: raw_project,
                expected: PROJECT_ID_EXPECTED,
            });
        }
        Ok(Self {
            api_base_url,
            project_id: project_id.to_owned(),
        })
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

fn require<E: Env>(env: &E, name: &'static str) -> Result<String, StartupError> {
    env.string(name).ok_or(StartupError::MissingEnv { name })
}

fn parse_base_url(raw: &str) -> Result<Url, StartupError> {
    let invalid = || StartupError::InvalidEnv {
        name: API_BASE_URL_ENV,
        value: raw.to_owned(),
        expected: URL_EXPECTED,
    };
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid());
    }
    Ok(url)
}
