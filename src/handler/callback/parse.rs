use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use teloxide::{
    adaptors::Throttle,
    dispatching::dialogue::ErasedStorage,
    prelude::*,
    types::{InputFile, MaybeInaccessibleMessage, MessageId},
    Bot,
};

use crate::error::{BotError, HandlerResult};
use crate::handler::keyboard::{
    get_back_to_main_menu_keyboard, get_format_keyboard, get_limit_keyboard, get_main_menu_keyboard,
};
use crate::service::dialogue::model::{
    format_from_callback_key, DialogueState, ExportPeriod, LIMIT_CHOICES,
};
use crate::service::export;
use crate::service::extractor::JobProgress;
use crate::service::ServiceError;
use crate::source::SourceError;
use crate::state::AppState;

const ON_DEMAND_FILE_PREFIX: &str = "tgparse";

pub(super) async fn handle_callback_period(
    bot: &Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    message: MaybeInaccessibleMessage,
    user_id: UserId,
    period_key: &str,
) -> HandlerResult<()> {
    let Some(DialogueState::AwaitingPeriod { chats }) = dialogue.get().await? else {
        return stale_session(bot, &message).await;
    };
    let Some(period) = ExportPeriod::from_callback_key(period_key) else {
        return Ok(());
    };

    let plan = AppState::get()?
        .service_registry
        .account
        .effective_plan(user_id.0 as i64)
        .await?;

    bot.edit_message_text(
        message.chat().id,
        message.id(),
        "🔢 Сколько сообщений выгрузить (максимум)?",
    )
    .reply_markup(get_limit_keyboard(plan.message_cap))
    .await?;

    dialogue
        .update(DialogueState::AwaitingLimit { chats, period })
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}

pub(super) async fn handle_callback_limit(
    bot: &Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    message: MaybeInaccessibleMessage,
    limit_key: &str,
) -> HandlerResult<()> {
    let Some(DialogueState::AwaitingLimit { chats, period }) = dialogue.get().await? else {
        return stale_session(bot, &message).await;
    };
    let Ok(limit) = limit_key.parse::<u64>() else {
        return Ok(());
    };
    if !LIMIT_CHOICES.contains(&limit) {
        return Ok(());
    }

    bot.edit_message_text(message.chat().id, message.id(), "📁 В каком формате выгрузить?")
        .reply_markup(get_format_keyboard())
        .await?;

    dialogue
        .update(DialogueState::AwaitingFormat { chats, period, limit })
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}

pub(super) async fn handle_callback_format(
    bot: &Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    message: MaybeInaccessibleMessage,
    user_id: UserId,
    format_key: &str,
) -> HandlerResult<()> {
    let Some(DialogueState::AwaitingFormat { chats, period, limit }) = dialogue.get().await? else {
        return stale_session(bot, &message).await;
    };
    let Some(format) = format_from_callback_key(format_key) else {
        return Ok(());
    };

    let account_id = user_id.0 as i64;
    let chat_id = message.chat().id;
    let registry = &AppState::get()?.service_registry;

    let budget = match registry.quota.validate_job(account_id, chats.len(), limit).await {
        Ok(budget) => budget,
        Err(e @ ServiceError::ChatCountExceeded { .. }) => {
            bot.edit_message_text(chat_id, message.id(), format!("❌ {}", e))
                .await?;
            dialogue
                .update(DialogueState::Start)
                .await
                .map_err(|e| BotError::DialogueStateError(e.to_string()))?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    bot.edit_message_text(
        chat_id,
        message.id(),
        format!("⚙️ Запускаю парсинг ({} чат(ов))...", chats.len()),
    )
    .await?;

    let observer = Arc::new(ChatProgressMessages {
        bot: bot.clone(),
        chat_id,
        messages: DashMap::new(),
    });

    let window = period.window(Utc::now());
    let result = registry
        .extractor
        .run_job(&chats, window, budget.message_cap, None, Some(observer))
        .await;

    // Every successful chat gets an audit row, empty ones included;
    // failed chats get none.
    for extraction in &result.per_chat {
        registry
            .account
            .record_usage(account_id, &extraction.chat, extraction.rows.len() as u64)
            .await?;
    }

    if result.total_rows() == 0 {
        let text = if result.per_chat.is_empty() && !result.failures.is_empty() {
            "❌ Ни один чат выгрузить не удалось."
        } else {
            "⚠️ За выбранный период сообщений не найдено."
        };
        bot.send_message(chat_id, text)
            .reply_markup(get_main_menu_keyboard())
            .await?;
    } else {
        let total_rows = result.total_rows();
        let distinct_senders = result.distinct_senders();

        let table = export::aggregate(result.per_chat);
        let payload = export::render(&table, format)?;
        let file_name = export::file_name(ON_DEMAND_FILE_PREFIX, format, Utc::now());

        let caption = format!(
            "✅ Готово!\n📊 Сообщений: {}\n👥 Отправителей: {}",
            total_rows, distinct_senders
        );
        bot.send_document(chat_id, InputFile::memory(payload).file_name(file_name))
            .caption(caption)
            .await?;
    }

    dialogue
        .update(DialogueState::Start)
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}

async fn stale_session(bot: &Throttle<Bot>, message: &MaybeInaccessibleMessage) -> HandlerResult<()> {
    bot.edit_message_text(
        message.chat().id,
        message.id(),
        "Сессия устарела. Начните заново: /parse",
    )
    .reply_markup(get_back_to_main_menu_keyboard())
    .await?;

    Ok(())
}

/// One status message per chat, edited in place as the extraction runs.
/// Everything here is best effort; a failed edit never touches the job.
struct ChatProgressMessages {
    bot: Throttle<Bot>,
    chat_id: ChatId,
    messages: DashMap<String, MessageId>,
}

#[async_trait]
impl JobProgress for ChatProgressMessages {
    async fn on_chat_started(&self, chat: &str) {
        if let Ok(sent) = self
            .bot
            .send_message(self.chat_id, format!("⏳ {}: начинаю...", chat))
            .await
        {
            self.messages.insert(chat.to_string(), sent.id);
        }
    }

    async fn on_chat_progress(&self, chat: &str, accepted: usize) {
        // Copy the id out so no map guard is held across the await.
        let message_id = self.messages.get(chat).map(|entry| *entry.value());
        if let Some(message_id) = message_id {
            let _ = self
                .bot
                .edit_message_text(
                    self.chat_id,
                    message_id,
                    format!("⏳ {}: {} сообщений...", chat, accepted),
                )
                .await;
        }
    }

    async fn on_chat_done(&self, chat: &str, outcome: Result<usize, &SourceError>) {
        let text = match outcome {
            Ok(accepted) => format!("✅ {}: {} сообщений", chat, accepted),
            Err(error) => format!("❌ {}: {}", chat, error),
        };
        let message_id = self.messages.get(chat).map(|entry| *entry.value());
        match message_id {
            Some(message_id) => {
                let _ = self.bot.edit_message_text(self.chat_id, message_id, text).await;
            }
            None => {
                let _ = self.bot.send_message(self.chat_id, text).await;
            }
        }
    }
}
