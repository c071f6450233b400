use std::time::Duration;

use chrono::Utc;
use teloxide::adaptors::throttle::Limits;
use teloxide::dptree;
use teloxide::adaptors::Throttle;
use teloxide::prelude::*;
use teloxide::Bot;

use crate::config::AppConfig;
use crate::error::{BotResult, HandlerResult};
use crate::handler::get_handler;
use crate::service::dialogue::DialogueService;
use crate::state::AppState;
use crate::utils::http;

pub struct BotService {
    pub bot: Throttle<Bot>,
}

impl BotService {
    pub async fn new() -> BotResult<Self> {
        let config = AppConfig::get()?;

        let client = http::create_telegram_client();
        let bot = Bot::with_client(config.telegram.0.clone(), client).throttle(Limits::default());

        info!("Initializing AppState...");
        let state = AppState::new(config, bot.clone()).await?;
        AppState::set_global(state)?;
        info!("AppState initialized");

        Ok(Self { bot })
    }

    pub async fn start(&self) -> HandlerResult<()> {
        info!("Testing connection to Telegram API...");
        match self.bot.get_me().await {
            Ok(_) => info!("Successfully connected to Telegram API"),
            Err(e) => {
                error!("Failed to connect to Telegram API: {:?}", e);
                return Err(anyhow::anyhow!("Failed to connect to Telegram API: {}", e).into());
            }
        }

        let bot = self.bot.clone();
        let storage = DialogueService::get_dialogue_storage().await?;

        crate::command::setup_user_commands(&bot).await?;

        start_scheduler_job()?;

        let handler = get_handler();

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![storage])
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

/// Spawns the recurring schedule runner. Due entries are evaluated every
/// tick; a failed tick is logged and retried on the next one.
fn start_scheduler_job() -> BotResult<()> {
    let tick_secs = AppConfig::get()?.scheduler.tick_secs;
    let schedule = AppState::get()?.service_registry.schedule.clone();

    info!("Starting scheduler job (tick every {}s)", tick_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(tick_secs));
        loop {
            interval.tick().await;
            if let Err(e) = schedule.run_due(Utc::now()).await {
                error!("Scheduler tick failed: {}", e);
            }
        }
    });

    Ok(())
}
