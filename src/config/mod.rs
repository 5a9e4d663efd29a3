//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `STUDYKEEPER`
//! prefix and nested sections use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use studykeeper::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod discord;
mod error;
mod llm;
mod session;
mod storage;

pub use discord::DiscordConfig;
pub use error::{ConfigError, ValidationError};
pub use llm::LlmConfig;
pub use session::{AudioConfig, SessionConfig};
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains every configuration section of the bot. Load using
/// [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Discord gateway configuration (token, command guild, notifications)
    pub discord: DiscordConfig,

    /// Chat-completion provider configuration
    pub llm: LlmConfig,

    /// Filesystem paths (task store, knowledge bank, ingest sources)
    #[serde(default)]
    pub storage: StorageConfig,

    /// Focus-session timing
    #[serde(default)]
    pub session: SessionConfig,

    /// Background-audio playback
    #[serde(default)]
    pub audio: AudioConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` if present (for development)
    /// 2. Reads environment variables with the `STUDYKEEPER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `STUDYKEEPER__DISCORD__TOKEN=...` -> `discord.token = ...`
    /// - `STUDYKEEPER__LLM__API_KEY=...` -> `llm.api_key = ...`
    /// - `STUDYKEEPER__SESSION__FOCUS_SECS=1500` -> `session.focus_secs = 1500`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STUDYKEEPER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.discord.validate()?;
        self.llm.validate()?;
        self.storage.validate()?;
        self.session.validate()?;
        self.audio.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("STUDYKEEPER__DISCORD__TOKEN", "bot-token");
        env::set_var("STUDYKEEPER__LLM__API_KEY", "sk-or-xxx");
    }

    fn clear_env() {
        env::remove_var("STUDYKEEPER__DISCORD__TOKEN");
        env::remove_var("STUDYKEEPER__LLM__API_KEY");
        env::remove_var("STUDYKEEPER__SESSION__FOCUS_SECS");
        env::remove_var("STUDYKEEPER__STORAGE__DATA_FILE");
    }

    #[test]
    fn loads_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.discord.token(), "bot-token");
        assert_eq!(config.llm.api_key(), "sk-or-xxx");
    }

    #[test]
    fn validates_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn section_defaults_apply() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.session.focus_secs, 25 * 60);
        assert_eq!(config.session.break_secs, 5 * 60);
        assert_eq!(config.storage.data_file.to_str(), Some("study_data.json"));
    }

    #[test]
    fn custom_session_lengths_override_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("STUDYKEEPER__SESSION__FOCUS_SECS", "10");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.session.focus_secs, 10);
    }
}
