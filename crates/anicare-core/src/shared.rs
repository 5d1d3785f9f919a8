//! Shared configuration and helpers used across all AniCare crates.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name of the sled database under `storage_path`.
pub const SLED_DB_DIR: &str = "anicare_store";

/// Unix timestamp in milliseconds (0 if the clock is before the epoch).
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Which [`PetCareStore`](crate::PetCareStore) backend the gateway opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process memory only; restart loses every profile and transcript.
    #[default]
    Memory,
    /// Sled database under `storage_path`.
    Sled,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Sled => "sled",
        }
    }
}

/// Global application configuration (gateway + generation client). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity reported by `/api/status` and the startup log.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Interface the gateway binds to.
    pub bind_address: String,
    /// Store backend (`memory` or `sled`).
    pub storage_backend: StorageBackend,
    /// Base directory for the sled database.
    pub storage_path: String,
    /// Generation mode (`live` calls the API, `offline` always uses the fallbacks).
    pub llm_mode: String,
    /// Chat-completions model identifier.
    pub model: String,
    /// Base URL of the OpenAI-compatible API (no trailing `/chat/completions`).
    pub api_base_url: String,
    /// Timeout for a single generation call.
    pub request_timeout_secs: u64,

    /// If true, the gateway serves the built frontend from `frontend_dir`. (Config alias: `ui_enabled`)
    #[serde(default, alias = "ui_enabled")]
    pub frontend_enabled: bool,
    #[serde(default = "default_frontend_dir")]
    pub frontend_dir: String,
}

fn default_frontend_dir() -> String {
    "dist/public".to_string()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "AniCare".to_string(),
            port: 5000,
            bind_address: "0.0.0.0".to_string(),
            storage_backend: StorageBackend::Memory,
            storage_path: "./data".to_string(),
            llm_mode: "live".to_string(),
            model: "gpt-4o".to_string(),
            api_base_url: "https://api.openai.com/v1".to_string(),
            request_timeout_secs: 30,
            frontend_enabled: false,
            frontend_dir: default_frontend_dir(),
        }
    }
}

impl CoreConfig {
    /// Path of the sled database directory.
    pub fn sled_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join(SLED_DB_DIR)
    }

    /// Load config from file and environment.
    /// Precedence: env `ANICARE__*` > file at `ANICARE_CONFIG` (default `config/anicare.toml`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("ANICARE_CONFIG").unwrap_or_else(|_| "config/anicare.toml".to_string());
        let defaults = CoreConfig::default();
        let builder = config::Config::builder()
            .set_default("app_name", defaults.app_name)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("bind_address", defaults.bind_address)?
            .set_default("storage_backend", defaults.storage_backend.as_str())?
            .set_default("storage_path", defaults.storage_path)?
            .set_default("llm_mode", defaults.llm_mode)?
            .set_default("model", defaults.model)?
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("frontend_enabled", defaults.frontend_enabled)?
            .set_default("frontend_dir", defaults.frontend_dir)?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("ANICARE").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_openai_and_memory_store() {
        let config = CoreConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert!(config.sled_path().ends_with(SLED_DB_DIR));
    }

    #[test]
    fn backend_deserializes_from_snake_case() {
        let backend: StorageBackend = serde_json::from_str("\"sled\"").unwrap();
        assert_eq!(backend, StorageBackend::Sled);
        assert_eq!(backend.as_str(), "sled");
    }

    #[test]
    fn load_layers_env_over_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anicare.toml");
        std::fs::write(
            &path,
            "app_name = \"Test Clinic\"\nport = 6100\nstorage_backend = \"sled\"\nllm_mode = \"offline\"\n",
        )
        .unwrap();

        // Only test in this crate touching these variables.
        std::env::set_var("ANICARE_CONFIG", &path);
        std::env::set_var("ANICARE__PORT", "7200");
        let loaded = CoreConfig::load();
        std::env::remove_var("ANICARE_CONFIG");
        std::env::remove_var("ANICARE__PORT");

        let config = loaded.unwrap();
        assert_eq!(config.port, 7200);
        assert_eq!(config.app_name, "Test Clinic");
        assert_eq!(config.storage_backend, StorageBackend::Sled);
        assert_eq!(config.llm_mode, "offline");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.request_timeout_secs, 30);
        assert!(!config.frontend_enabled);
        assert_eq!(config.frontend_dir, "dist/public");
    }
}
