use crate::tools::git::GitConfig;
use crate::tools::github::GitHubConfig;
use config::{Config, ConfigError, Environment, File, Source};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load `config/<CONFIG_ENV>` (optional) overlaid with `APP__*` variables.
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        Self::load(
            File::with_name(&format!("config/{}", config_env)).required(false),
            Self::environment(),
        )
    }

    pub fn github_token() -> Option<String> {
        env::var("GITHUB_TOKEN").ok()
    }

    /// `APP__GIT__BLOCKED_COMMANDS=push,reset` style overrides.
    fn environment() -> Environment {
        Environment::with_prefix("APP")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("git.blocked_commands")
            .try_parsing(true)
    }

    fn load<S>(file: S, environment: Environment) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}
