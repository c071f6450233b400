use teloxide::{
    adaptors::Throttle,
    dispatching::dialogue::ErasedStorage,
    payloads::SendMessageSetters,
    prelude::{Dialogue, Requester},
    types::Message,
    Bot,
};

use crate::error::{BotError, HandlerResult};
use crate::handler::keyboard::get_interval_keyboard;
use crate::service::dialogue::model::DialogueState;
use crate::utils::normalize_chat_identifier;

pub(super) async fn handle_message_awaiting_schedule_chat(
    bot: Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    msg: Message,
) -> HandlerResult<()> {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Пришлите чат текстом.").await?;
        return Ok(());
    };

    let chat = text.trim().to_string();
    if normalize_chat_identifier(&chat).is_none() {
        bot.send_message(
            msg.chat.id,
            "Не похоже на чат. Пришлите @username или ссылку t.me.",
        )
        .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "⏱ Как часто запускать парсинг?")
        .reply_markup(get_interval_keyboard())
        .await?;

    dialogue
        .update(DialogueState::AwaitingScheduleInterval { chat })
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}
