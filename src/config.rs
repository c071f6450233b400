use shuttle_runtime::SecretStore;
use std::sync::OnceLock;
use teloxide::types::UserId;

use crate::error::{BotError, BotResult};

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

const DEFAULT_SCHEDULER_TICK_SECS: u64 = 1800;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing secret: {0}")]
    MissingSecret(String),
    #[error("Invalid secret: {0}")]
    InvalidSecret(String),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub admin: AdminConfig,
    pub turso: TursoConfig,
    pub source: SourceConfig,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    pub fn set_global(config: AppConfig) -> BotResult<()> {
        APP_CONFIG
            .set(config)
            .map_err(|_| BotError::AppStateError("Failed to set global app config".to_string()))
    }

    pub fn get() -> BotResult<&'static AppConfig> {
        APP_CONFIG
            .get()
            .ok_or_else(|| BotError::AppStateError("App config not initialized".to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct TelegramConfig(pub String);

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub telegram_user_id: UserId,
}

#[derive(Clone, Debug)]
pub struct TursoConfig {
    pub url: String,
    pub token: String,
}

/// MTProto user-client credentials. The session file must hold an already
/// authorized session; the bot never drives an interactive login.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub session_file: String,
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub tick_secs: u64,
}

fn required(secret_store: &SecretStore, key: &str) -> Result<String, ConfigError> {
    secret_store
        .get(key)
        .ok_or_else(|| ConfigError::MissingSecret(key.to_string()))
}

pub fn build_config(secret_store: &SecretStore) -> Result<AppConfig, ConfigError> {
    info!("Building AppConfig...");

    let config = AppConfig {
        telegram: TelegramConfig(required(secret_store, "TELEGRAM_BOT_TOKEN")?),
        admin: AdminConfig {
            telegram_user_id: UserId(
                required(secret_store, "ADMIN_TELEGRAM_USER_ID")?
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSecret("ADMIN_TELEGRAM_USER_ID".to_string()))?,
            ),
        },
        turso: TursoConfig {
            url: required(secret_store, "TURSO_URL")?,
            token: required(secret_store, "TURSO_TOKEN")?,
        },
        source: SourceConfig {
            api_id: required(secret_store, "TG_API_ID")?
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidSecret("TG_API_ID".to_string()))?,
            api_hash: required(secret_store, "TG_API_HASH")?,
            session_file: required(secret_store, "TG_SESSION_FILE")?,
        },
        scheduler: SchedulerConfig {
            tick_secs: match secret_store.get("SCHEDULER_TICK_SECS") {
                Some(raw) => raw
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSecret("SCHEDULER_TICK_SECS".to_string()))?,
                None => DEFAULT_SCHEDULER_TICK_SECS,
            },
        },
    };

    info!("AppConfig built");

    Ok(config)
}
