mod menu;
mod parse;
mod plans;
mod schedule;

use teloxide::{
    adaptors::Throttle,
    dispatching::{dialogue::ErasedStorage, UpdateHandler},
    prelude::*,
    types::CallbackQuery,
};

use crate::error::{BotError, HandlerResult};
use crate::service::dialogue::model::DialogueState;

async fn handle_callback(
    bot: Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    q: CallbackQuery,
) -> HandlerResult<()> {
    let data = q
        .data
        .clone()
        .ok_or_else(|| BotError::DialogueStateError("No callback data".into()))?;

    let message = q
        .message
        .clone()
        .ok_or_else(|| BotError::DialogueStateError("No message".into()))?;

    let user_id = q.from.id;

    match data.as_str() {
        "parse_menu" => menu::handle_callback_parse_menu(&bot, dialogue, message, user_id).await?,
        "plans_menu" => menu::handle_callback_plans_menu(&bot, message).await?,
        "schedule_menu" => menu::handle_callback_schedule_menu(&bot, dialogue, message, user_id).await?,
        "account_menu" => menu::handle_callback_account_menu(&bot, message, user_id).await?,
        "back_to_main_menu" => menu::handle_callback_back_to_main_menu(&bot, dialogue, message).await?,

        s if s.starts_with("buy:") => {
            let tier_key = s.split(':').nth(1).unwrap_or_default();
            plans::handle_callback_buy(&bot, message, tier_key).await?
        }

        s if s.starts_with("period:") => {
            let period_key = s.split(':').nth(1).unwrap_or_default();
            parse::handle_callback_period(&bot, dialogue, message, user_id, period_key).await?
        }
        s if s.starts_with("limit:") => {
            let limit_key = s.split(':').nth(1).unwrap_or_default();
            parse::handle_callback_limit(&bot, dialogue, message, limit_key).await?
        }
        s if s.starts_with("format:") => {
            let format_key = s.split(':').nth(1).unwrap_or_default();
            parse::handle_callback_format(&bot, dialogue, message, user_id, format_key).await?
        }

        s if s.starts_with("interval:") => {
            let interval_key = s.split(':').nth(1).unwrap_or_default();
            schedule::handle_callback_interval(&bot, dialogue, message, user_id, interval_key).await?
        }

        other => {
            warn!("Unhandled callback data: {}", other);
        }
    }

    bot.answer_callback_query(&q.id).cache_time(1).await?;

    Ok(())
}

pub fn get_callback_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_callback_query().endpoint(handle_callback)
}
