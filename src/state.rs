use std::sync::{Arc, OnceLock};

use teloxide::adaptors::Throttle;
use teloxide::Bot;

use crate::config::AppConfig;
use crate::error::{BotError, BotResult};
use crate::service::delivery::TelegramDelivery;
use crate::service::ServiceRegistry;
use crate::source::TelegramSource;
use crate::storage::{AccountStore, StorageManager, TursoAccountStore};

static APP_STATE: OnceLock<AppState> = OnceLock::new();

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub service_registry: ServiceRegistry,
}

impl AppState {
    pub async fn new(config: &AppConfig, bot: Throttle<Bot>) -> BotResult<Self> {
        StorageManager::init(&config.turso.url, &config.turso.token).await?;
        let storage = StorageManager::get()?;

        let account_store = TursoAccountStore::new(storage.turso());
        account_store.migrate().await?;

        let store: Arc<dyn AccountStore> = Arc::new(account_store);
        let source = Arc::new(TelegramSource::new(config.source.clone()));
        let delivery = Arc::new(TelegramDelivery::new(bot));

        let service_registry = ServiceRegistry::new(store, source, delivery);

        Ok(Self {
            config: config.clone(),
            service_registry,
        })
    }

    pub fn set_global(state: AppState) -> BotResult<()> {
        APP_STATE
            .set(state)
            .map_err(|_| BotError::AppStateError("Failed to set global app state".to_string()))
    }

    pub fn get() -> BotResult<&'static AppState> {
        APP_STATE
            .get()
            .ok_or_else(|| BotError::AppStateError("App state not initialized".to_string()))
    }
}
