use teloxide::{
    adaptors::Throttle,
    dispatching::dialogue::ErasedStorage,
    payloads::EditMessageTextSetters,
    prelude::{Dialogue, Requester},
    types::{MaybeInaccessibleMessage, UserId},
    Bot,
};

use crate::error::{BotError, HandlerResult};
use crate::handler::keyboard::{get_main_menu_keyboard, get_plans_keyboard};
use crate::handler::view;
use crate::service::dialogue::model::DialogueState;
use crate::state::AppState;

pub(super) async fn handle_callback_back_to_main_menu(
    bot: &Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    message: MaybeInaccessibleMessage,
) -> HandlerResult<()> {
    bot.edit_message_text(message.chat().id, message.id(), "Выберите действие:")
        .reply_markup(get_main_menu_keyboard())
        .await?;

    dialogue.update(DialogueState::Start).await?;

    Ok(())
}

pub(super) async fn handle_callback_plans_menu(
    bot: &Throttle<Bot>,
    message: MaybeInaccessibleMessage,
) -> HandlerResult<()> {
    bot.edit_message_text(message.chat().id, message.id(), view::plans_text())
        .reply_markup(get_plans_keyboard())
        .await?;

    Ok(())
}

pub(super) async fn handle_callback_account_menu(
    bot: &Throttle<Bot>,
    message: MaybeInaccessibleMessage,
    user_id: UserId,
) -> HandlerResult<()> {
    let text = view::account_text(user_id.0 as i64).await?;
    bot.edit_message_text(message.chat().id, message.id(), text)
        .reply_markup(get_main_menu_keyboard())
        .await?;

    Ok(())
}

pub(super) async fn handle_callback_parse_menu(
    bot: &Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    message: MaybeInaccessibleMessage,
    user_id: UserId,
) -> HandlerResult<()> {
    let state = AppState::get()?;
    let plan = state
        .service_registry
        .account
        .effective_plan(user_id.0 as i64)
        .await?;

    bot.edit_message_text(
        message.chat().id,
        message.id(),
        format!(
            "📝 Пришлите список чатов через запятую (до {}).\n\
             Например: @durov, t.me/telegram",
            plan.chat_cap
        ),
    )
    .await?;

    dialogue
        .update(DialogueState::AwaitingChats)
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}

pub(super) async fn handle_callback_schedule_menu(
    bot: &Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    message: MaybeInaccessibleMessage,
    user_id: UserId,
) -> HandlerResult<()> {
    let state = AppState::get()?;
    if state
        .service_registry
        .quota
        .authorize_schedule(user_id.0 as i64)
        .await
        .is_err()
    {
        bot.edit_message_text(
            message.chat().id,
            message.id(),
            "📅 Автопарсинг доступен на тарифах PRO и MAX.",
        )
        .reply_markup(get_plans_keyboard())
        .await?;
        return Ok(());
    }

    bot.edit_message_text(
        message.chat().id,
        message.id(),
        "📝 Какой чат парсить по расписанию?",
    )
    .await?;

    dialogue
        .update(DialogueState::AwaitingScheduleChat)
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}
