mod parse;
mod schedule;

use teloxide::{
    adaptors::Throttle,
    dispatching::{UpdateFilterExt, UpdateHandler},
    dptree,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, Update},
    Bot,
};

use crate::error::HandlerResult;
use crate::service::dialogue::model::DialogueState;

use super::keyboard::get_main_menu_keyboard;

pub fn get_message_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_message()
        .branch(dptree::case![DialogueState::AwaitingChats].endpoint(parse::handle_message_awaiting_chats))
        .branch(
            dptree::case![DialogueState::AwaitingScheduleChat]
                .endpoint(schedule::handle_message_awaiting_schedule_chat),
        )
}

pub async fn handle_message_unknown(bot: Throttle<Bot>, msg: Message) -> HandlerResult<()> {
    bot.send_message(msg.chat.id, "Я вас не понял. Выберите действие:")
        .reply_markup(get_main_menu_keyboard())
        .await?;

    Ok(())
}
