mod channels;
mod defaults;


pub use channels::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MachmaError;
use defaults::*;

/// Environment variable that overrides `channel.telegram.bot_token`.
pub const TELEGRAM_TOKEN_ENV: &str = "MACHMA_TELEGRAM_TOKEN";

/// Top-level machma configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub machma: MachmaConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    /// Flat `api-token` key of older config files.
    #[serde(default, rename = "api-token", skip_serializing)]
    pub api_token: Option<String>,
    /// Flat `database-url` key of older config files, e.g. `sqlite:///machma.db`.
    #[serde(default, rename = "database-url", skip_serializing)]
    pub database_url: Option<String>,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachmaConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Also write logs to `{data_dir}/logs/`.
    #[serde(default = "default_true")]
    pub log_to_file: bool,
}

impl Default for MachmaConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            log_to_file: true,
        }
    }
}

/// Store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite file path, or `:memory:` for a throwaway database.
    #[serde(default = "default_db_path", alias = "database-url")]
    pub db_path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl StoreConfig {
    /// A config for a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            db_path: MEMORY_DB_PATH.to_string(),
            max_connections: 1,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path == MEMORY_DB_PATH
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Path value that selects an in-memory database.
pub const MEMORY_DB_PATH: &str = ":memory:";

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. The Telegram token
/// may be supplied (or overridden) through [`TELEGRAM_TOKEN_ENV`].
pub fn load(path: &str) -> Result<Config, MachmaError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MachmaError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        parse(&content)?
    } else {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    if let Ok(token) = std::env::var(TELEGRAM_TOKEN_ENV) {
        apply_token_override(&mut config, token);
    }

    Ok(config)
}

/// Parse configuration from TOML text.
///
/// The flat `api-token` and `database-url` keys are folded into their
/// sections. A token already set in `[channel.telegram]` wins; the flat
/// database URL replaces `[store] db_path`.
pub fn parse(content: &str) -> Result<Config, MachmaError> {
    let mut config: Config = toml::from_str(content)
        .map_err(|e| MachmaError::Config(format!("failed to parse config: {e}")))?;

    if let Some(url) = config.database_url.take() {
        config.store.db_path = url;
    }
    config.store.db_path = db_path_from_url(&config.store.db_path)?;

    if let Some(token) = config.api_token.take() {
        let has_token = config
            .channel
            .telegram
            .as_ref()
            .is_some_and(|tg| !tg.bot_token.is_empty());
        if !has_token {
            apply_token_override(&mut config, token);
        }
    }

    Ok(config)
}

/// Turn a `sqlite:///path` database URL into a plain path.
///
/// `sqlite://` alone means an in-memory database. Plain paths pass through;
/// URLs for any other database are rejected.
pub fn db_path_from_url(url: &str) -> Result<String, MachmaError> {
    let Some(rest) = url.strip_prefix("sqlite://") else {
        if url.contains("://") {
            return Err(MachmaError::Config(format!(
                "unsupported database url {url}: only sqlite is supported"
            )));
        }
        return Ok(url.to_string());
    };
    let path = rest.strip_prefix('/').unwrap_or(rest);
    if path.is_empty() {
        Ok(MEMORY_DB_PATH.to_string())
    } else {
        Ok(path.to_string())
    }
}

fn apply_token_override(config: &mut Config, token: String) {
    if token.is_empty() {
        return;
    }
    match config.channel.telegram {
        Some(ref mut tg) => tg.bot_token = token,
        None => {
            config.channel.telegram = Some(TelegramConfig {
                bot_token: token,
                ..TelegramConfig::default()
            })
        }
    }
}
