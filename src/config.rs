//! Store configuration loaded from environment variables.
//!
//! Credential material itself is never stored here; only the name of the
//! variable that carries it, so the JSON blob is read once at connect time.

use std::env;

/// Default environment variable holding the service-account JSON.
pub const DEFAULT_CREDENTIALS_VAR: &str = "FIREBASE_JSON";

/// Which document backend the store connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Hosted Firestore (or the emulator when `FIRESTORE_EMULATOR_HOST` is set).
    Firestore,
    /// In-process store, used for local runs and tests.
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(BackendKind::Firestore),
            "memory" => Ok(BackendKind::Memory),
            other => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// Store configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase / GCP project ID
    pub project_id: String,
    /// Name of the environment variable carrying credential JSON
    pub credentials_var: String,
    /// Emulator address, when running against the local emulator
    pub emulator_host: Option<String>,
    /// Max in-flight `queries` sub-collection fetches when listing users
    pub user_query_concurrency: usize,
    /// Backend to connect to
    pub backend: BackendKind,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            project_id: "test-project".to_string(),
            credentials_var: DEFAULT_CREDENTIALS_VAR.to_string(),
            emulator_host: None,
            user_query_concurrency: 1,
            backend: BackendKind::Memory,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let project_id = env::var("FIREBASE_PROJECT_ID")
            .or_else(|_| env::var("GCP_PROJECT_ID"))
            .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?;

        let user_query_concurrency = match env::var("STORE_USER_QUERY_CONCURRENCY") {
            Ok(raw) => parse_concurrency(&raw)?,
            Err(_) => 1,
        };

        let backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => BackendKind::Firestore,
        };

        Ok(Self {
            project_id: project_id.trim().to_string(),
            credentials_var: env::var("FIREBASE_CREDENTIALS_VAR")
                .unwrap_or_else(|_| DEFAULT_CREDENTIALS_VAR.to_string()),
            emulator_host: env::var("FIRESTORE_EMULATOR_HOST").ok(),
            user_query_concurrency,
            backend,
        })
    }
}

fn parse_concurrency(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ConfigError::Invalid {
            name: "STORE_USER_QUERY_CONCURRENCY",
            value: raw.to_string(),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
