use teloxide::{
    adaptors::Throttle,
    dispatching::dialogue::ErasedStorage,
    payloads::EditMessageTextSetters,
    prelude::{Dialogue, Requester},
    types::{MaybeInaccessibleMessage, UserId},
    Bot,
};

use crate::error::{BotError, HandlerResult};
use crate::handler::keyboard::{
    get_back_to_main_menu_keyboard, get_main_menu_keyboard, get_plans_keyboard,
};
use crate::service::dialogue::model::{DialogueState, INTERVAL_CHOICES};
use crate::service::ServiceError;
use crate::state::AppState;

pub(super) async fn handle_callback_interval(
    bot: &Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    message: MaybeInaccessibleMessage,
    user_id: UserId,
    interval_key: &str,
) -> HandlerResult<()> {
    let Some(DialogueState::AwaitingScheduleInterval { chat }) = dialogue.get().await? else {
        bot.edit_message_text(
            message.chat().id,
            message.id(),
            "Сессия устарела. Начните заново: /schedule",
        )
        .reply_markup(get_back_to_main_menu_keyboard())
        .await?;
        return Ok(());
    };

    let Ok(interval_hours) = interval_key.parse::<u32>() else {
        return Ok(());
    };
    if !INTERVAL_CHOICES.contains(&interval_hours) {
        return Ok(());
    }

    let registry = &AppState::get()?.service_registry;

    // The plan gate sits at creation; existing schedules are never
    // re-authorized afterwards.
    match registry.quota.authorize_schedule(user_id.0 as i64).await {
        Ok(()) => {}
        Err(ServiceError::SchedulingNotAllowed) => {
            bot.edit_message_text(
                message.chat().id,
                message.id(),
                "📅 Автопарсинг доступен на тарифах PRO и MAX.",
            )
            .reply_markup(get_plans_keyboard())
            .await?;
            dialogue
                .update(DialogueState::Start)
                .await
                .map_err(|e| BotError::DialogueStateError(e.to_string()))?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    registry
        .account
        .add_schedule(user_id.0 as i64, &chat, interval_hours)
        .await?;

    bot.edit_message_text(
        message.chat().id,
        message.id(),
        format!(
            "✅ Готово! Буду парсить {} каждые {} ч и присылать Excel.",
            chat, interval_hours
        ),
    )
    .reply_markup(get_main_menu_keyboard())
    .await?;

    dialogue
        .update(DialogueState::Start)
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}
