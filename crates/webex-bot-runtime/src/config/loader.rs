//! Configuration loader using figment.
//!
//! This module provides a flexible configuration loading system that supports:
//!
//! - **Multiple sources**: TOML/YAML/JSON files, environment variables, programmatic defaults
//! - **Layered configuration**: Later sources override earlier ones
//! - **Profile support**: Development vs production configurations
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables TOML files (`webexbot.toml`, `config.toml`)
//! - `yaml-config`: enables YAML files (`webexbot.yaml`, `webexbot.yml`)
//! - `json-config`: enables JSON files (`webexbot.json`, `config.json`)
//!
//! Several formats can be enabled at once; each is searched and loaded.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides passed to [`ConfigLoader::merge`]
//! 3. Profile-specific config file (`webexbot.{profile}.toml`, ...)
//! 4. Main config file (`webexbot.toml`, ...)
//! 5. Environment variables (`WEBEX_BOT_*`)
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `WEBEX_BOT_` prefix with `__` as separator:
//!
//! - `WEBEX_BOT_BOT__ACCESS_TOKEN=xxx` → `bot.access_token = "xxx"`
//! - `WEBEX_BOT_SERVER__PORT=9000` → `server.port = 9000`
//! - `WEBEX_BOT_TUNNEL__PUBLIC_URL=https://abc.example` → `tunnel.public_url`
//!
//! # Example
//!
//! ```rust,ignore
//! use webex_bot_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load()?;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./deploy/webexbot.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config", feature = "json-config"))]
use figment::providers::Format;
#[cfg(feature = "json-config")]
use figment::providers::Json;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::WebexBotConfig;
use super::validation::validate_config;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "WEBEX_BOT_";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `WEBEX_BOT_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var(format!("{ENV_PREFIX}PROFILE"))
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides.
    figment: Figment,
    /// Configuration profile.
    profile: Profile,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds the user config directory (`<config>/webex-bot`) to search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("webex-bot"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration programmatically.
    ///
    /// Files and environment variables still take precedence.
    ///
    /// ```rust,ignore
    /// let config = ConfigLoader::new()
    ///     .merge(WebexBotConfig {
    ///         bot: BotConfig { name: "echo".into(), access_token: token },
    ///         ..Default::default()
    ///     })
    ///     .load()?;
    /// ```
    pub fn merge(mut self, config: WebexBotConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and validates the configuration.
    pub fn load(self) -> ConfigResult<WebexBotConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: WebexBotConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            profile = %profile,
            bot = %config.bot.name,
            port = config.server.port,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(WebexBotConfig::default()));

        let user_figment = std::mem::take(&mut self.figment);
        figment = figment.merge(user_figment);

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }

    /// Merges a single config file into the figment, dispatching on file extension.
    ///
    /// Only extensions enabled via feature flags are accepted.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            #[cfg(feature = "json-config")]
            "json" => Ok(figment.merge(Json::file(path))),
            _ => Err(ConfigError::ParseError(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("webex-bot"));
        }
        paths
    }

    /// Searches one file format.
    ///
    /// Tries `search_paths × base_names`, merging a profile-specific variant
    /// before the base file. Stops at the first base file found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config", feature = "json-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    figment = merge_fn(figment, &base_path);
                    return (figment, true);
                }
            }
        }
        (figment, false)
    }

    /// Searches for and loads configuration files from search paths.
    #[allow(unused_mut)]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["webexbot.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["webexbot.yaml", "webexbot.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "json-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["webexbot.json", "config.json"],
                |fig, path| fig.merge(Json::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

/// Loads the configuration from the default locations.
pub fn load_config() -> ConfigResult<WebexBotConfig> {
    ConfigLoader::new().load()
}

/// Loads the configuration from a specific file, plus environment variables.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<WebexBotConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BotConfig, LogLevel};
    use figment::Jail;

    #[test]
    fn test_defaults_with_token_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("WEBEX_BOT_BOT__ACCESS_TOKEN", "token-123");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.bot.access_token, "token-123");
            assert_eq!(config.bot.name, "mywebexbot");
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.logging.level, LogLevel::Info);
            assert!(config.webhooks.cleanup_existing);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "webexbot.toml",
                r#"
                [bot]
                name = "helper"
                access_token = "from-file"

                [server]
                port = 9000

                [tunnel]
                public_url = "http://abc.ngrok.example"

                [logging]
                level = "debug"
                "#,
            )?;
            jail.set_env("WEBEX_BOT_SERVER__PORT", "9100");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.bot.name, "helper");
            assert_eq!(config.bot.access_token, "from-file");
            assert_eq!(config.server.port, 9100);
            assert_eq!(
                config.tunnel.public_url.as_deref(),
                Some("http://abc.ngrok.example")
            );
            assert_eq!(config.logging.level, LogLevel::Debug);
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_is_overridden_by_main_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "webexbot.production.toml",
                "[bot]\nname = \"prod\"\naccess_token = \"t\"\n[server]\nport = 7000\n",
            )?;
            jail.create_file("webexbot.toml", "[server]\nport = 7100\n")?;

            let config = ConfigLoader::new()
                .profile("prod")
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.bot.name, "prod");
            assert_eq!(config.server.port, 7100);
            Ok(())
        });
    }

    #[test]
    fn test_merge_is_overridden_by_env() {
        Jail::expect_with(|jail| {
            jail.set_env("WEBEX_BOT_BOT__NAME", "from-env");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(WebexBotConfig {
                    bot: BotConfig {
                        name: "merged".into(),
                        access_token: "merged-token".into(),
                    },
                    ..Default::default()
                })
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.bot.name, "from-env");
            assert_eq!(config.bot.access_token, "merged-token");
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .without_env()
            .file("/definitely/not/here/webexbot.toml")
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("webexbot.toml", "[server]\nport = 0\n")?;
            jail.set_env("WEBEX_BOT_BOT__ACCESS_TOKEN", "t");

            let result = ConfigLoader::new().search_path(jail.directory()).load();
            assert!(matches!(result, Err(ConfigError::InvalidPort(0))));
            Ok(())
        });
    }

    #[test]
    fn test_profile_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("WEBEX_BOT_PROFILE", "production");
            assert_eq!(Profile::from_env(), Profile::Production);
            jail.set_env("WEBEX_BOT_PROFILE", "Staging");
            assert_eq!(Profile::from_env(), Profile::Custom("staging".into()));
            Ok(())
        });
    }
}
