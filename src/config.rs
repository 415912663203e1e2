//! Typed runtime configuration (A2), loaded from the environment and an
//! optional `.env` file. Mirrors the shape of a `pydantic_settings`
//! settings object: every field has a sane default so a bare checkout
//! still runs, but production deployments override via the environment.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Application-wide configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub default_model: String,
    pub log_level: String,
    pub debug: bool,
    pub project_root: PathBuf,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub fetch_timeout_secs: u64,
    pub http_user_agent: String,
    /// §6.2 feature flags, read once here at construction and not
    /// re-checked per request.
    pub enable_semantic_memory: bool,
    pub enable_reflection: bool,
    pub enable_trust_verification: bool,
    pub daily_report_enabled: bool,
}

/// Parses a `"1"`/`"true"`/`"0"`/`"false"` (case-insensitive) environment
/// flag, defaulting to `default` when unset or unrecognized.
fn bool_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => v == "1" || v.eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Load configuration from the process environment, first merging in
    /// a `.env` file from the current directory if one is present. A
    /// missing `.env` is not an error -- only malformed values are.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    fn from_env() -> Result<Self> {
        let project_root = std::env::var("PROJECT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("data"));
        let logs_dir = std::env::var("LOGS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("logs"));

        let fetch_timeout_secs = match std::env::var("FETCH_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("FETCH_TIMEOUT_SECS is not a valid integer: {raw}")))?,
            Err(_) => 20,
        };

        Ok(Self {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            google_api_key: std::env::var("GOOGLE_API_KEY").ok(),
            default_model: std::env::var("DEFAULT_MODEL")
                .unwrap_or_else(|_| "claude-3-5-sonnet-20241022".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            debug: std::env::var("DEBUG")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            project_root,
            data_dir,
            logs_dir,
            fetch_timeout_secs,
            http_user_agent: std::env::var("HTTP_USER_AGENT")
                .unwrap_or_else(|_| "insightweaver-core/0.1".to_string()),
            enable_semantic_memory: bool_flag("ENABLE_SEMANTIC_MEMORY", true),
            enable_reflection: bool_flag("ENABLE_REFLECTION", true),
            enable_trust_verification: bool_flag("ENABLE_TRUST_VERIFICATION", true),
            daily_report_enabled: bool_flag("DAILY_REPORT_ENABLED", true),
        })
    }

    /// Create the data/log directories this config points at if they do
    /// not already exist, mirroring the Python settings object's
    /// constructor-time directory bootstrap.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| Error::Config(format!("could not create data dir: {e}")))?;
        std::fs::create_dir_all(&self.logs_dir)
            .map_err(|e| Error::Config(format!("could not create logs dir: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_unset() {
        std::env::remove_var("FETCH_TIMEOUT_SECS");
        std::env::remove_var("DEBUG");
        std::env::remove_var("ENABLE_TRUST_VERIFICATION");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.fetch_timeout_secs, 20);
        assert!(!config.debug);
        assert_eq!(config.log_level, "info");
        assert!(config.enable_trust_verification);
    }

    #[test]
    fn feature_flag_can_be_disabled_via_env() {
        std::env::set_var("ENABLE_REFLECTION", "false");
        let config = AppConfig::from_env().unwrap();
        std::env::remove_var("ENABLE_REFLECTION");
        assert!(!config.enable_reflection);
    }

    #[test]
    fn malformed_timeout_is_a_config_error() {
        std::env::set_var("FETCH_TIMEOUT_SECS", "not-a-number");
        let result = AppConfig::from_env();
        std::env::remove_var("FETCH_TIMEOUT_SECS");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
