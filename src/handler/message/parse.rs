use teloxide::{
    adaptors::Throttle,
    dispatching::dialogue::ErasedStorage,
    payloads::SendMessageSetters,
    prelude::{Dialogue, Requester},
    types::Message,
    Bot,
};

use crate::error::{BotError, HandlerResult};
use crate::handler::keyboard::get_period_keyboard;
use crate::service::dialogue::model::DialogueState;
use crate::service::ServiceError;
use crate::state::AppState;
use crate::utils::{normalize_chat_identifier, split_chat_list};

pub(super) async fn handle_message_awaiting_chats(
    bot: Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    msg: Message,
) -> HandlerResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Пришлите список чатов текстом.")
            .await?;
        return Ok(());
    };

    let chats = split_chat_list(text);
    if chats.is_empty() {
        bot.send_message(msg.chat.id, "Список пуст. Пришлите чаты через запятую.")
            .await?;
        return Ok(());
    }

    if let Some(bad) = chats
        .iter()
        .find(|chat| normalize_chat_identifier(chat).is_none())
    {
        bot.send_message(
            msg.chat.id,
            format!("Не похоже на чат: {}\nПришлите @username или ссылку t.me.", bad),
        )
        .await?;
        return Ok(());
    }

    // The chat-count limit is checked up front so the user is not walked
    // through the whole flow just to be refused.
    let registry = &AppState::get()?.service_registry;
    let plan = registry.account.effective_plan(user.id.0 as i64).await?;
    match registry
        .quota
        .validate_job(user.id.0 as i64, chats.len(), plan.message_cap)
        .await
    {
        Ok(_) => {}
        Err(e @ ServiceError::ChatCountExceeded { .. }) => {
            bot.send_message(msg.chat.id, format!("❌ {}", e)).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    bot.send_message(msg.chat.id, "📆 За какой период выгрузить сообщения?")
        .reply_markup(get_period_keyboard())
        .await?;

    dialogue
        .update(DialogueState::AwaitingPeriod { chats })
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}
