use teloxide::adaptors::Throttle;
use teloxide::dispatching::dialogue::ErasedStorage;
use teloxide::dispatching::{HandlerExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::{types::Message, Bot};

use crate::command::Command;
use crate::error::{BotError, HandlerResult};
use crate::service::dialogue::model::DialogueState;
use crate::service::plan::{Tier, PLANS};
use crate::state::AppState;
use crate::utils::is_admin;

use super::keyboard::{get_main_menu_keyboard, get_plans_keyboard};
use super::view;

async fn handle_start(
    bot: Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    msg: Message,
) -> HandlerResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };

    let state = AppState::get()?;
    state
        .service_registry
        .account
        .touch(user.id.0 as i64, user.username.as_deref())
        .await?;

    let plan = state
        .service_registry
        .account
        .effective_plan(user.id.0 as i64)
        .await?;

    let welcome_text = format!(
        "👋 Привет, {}!\n\n\
         Я выгружаю сообщения из каналов и групп в Excel/CSV.\n\
         Текущий тариф: {}\n\n\
         Выберите действие:",
        user.first_name, plan.display_name
    );

    bot.send_message(msg.chat.id, welcome_text)
        .reply_markup(get_main_menu_keyboard())
        .await?;

    dialogue
        .update(DialogueState::Start)
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}

async fn handle_plans(bot: Throttle<Bot>, msg: Message) -> HandlerResult<()> {
    bot.send_message(msg.chat.id, view::plans_text())
        .reply_markup(get_plans_keyboard())
        .await?;

    Ok(())
}

async fn handle_parse(
    bot: Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    msg: Message,
) -> HandlerResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };

    let state = AppState::get()?;
    let plan = state
        .service_registry
        .account
        .effective_plan(user.id.0 as i64)
        .await?;

    let text = format!(
        "📝 Пришлите список чатов через запятую (до {}).\n\
         Например: @durov, t.me/telegram",
        plan.chat_cap
    );
    bot.send_message(msg.chat.id, text).await?;

    dialogue
        .update(DialogueState::AwaitingChats)
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}

async fn handle_schedule(
    bot: Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    msg: Message,
) -> HandlerResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };

    let state = AppState::get()?;
    if let Err(e) = state
        .service_registry
        .quota
        .authorize_schedule(user.id.0 as i64)
        .await
    {
        info!("Schedule refused for {}: {}", user.id, e);
        bot.send_message(
            msg.chat.id,
            "📅 Автопарсинг доступен на тарифах PRO и MAX.",
        )
        .reply_markup(get_plans_keyboard())
        .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "📝 Какой чат парсить по расписанию?")
        .await?;

    dialogue
        .update(DialogueState::AwaitingScheduleChat)
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    Ok(())
}

async fn handle_account(bot: Throttle<Bot>, msg: Message) -> HandlerResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };

    let text = view::account_text(user.id.0 as i64).await?;
    bot.send_message(msg.chat.id, text)
        .reply_markup(get_main_menu_keyboard())
        .await?;

    Ok(())
}

async fn handle_admin(bot: Throttle<Bot>, msg: Message) -> HandlerResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };

    if !is_admin(user.id)? {
        bot.send_message(msg.chat.id, "Неизвестная команда. Попробуйте /start.")
            .await?;
        return Ok(());
    }

    let stats = AppState::get()?.service_registry.account.stats().await?;
    let paid_breakdown: String = PLANS
        .iter()
        .filter(|plan| plan.tier != Tier::Free)
        .map(|plan| format!("  {} — {}⭐\n", plan.display_name, plan.price_stars))
        .collect();

    let text = format!(
        "📈 Статистика\n\n\
         Пользователей: {}\n\
         Платных: {}\n\
         Выручка: {}⭐\n\
         Парсингов: {}\n\
         Сообщений: {}\n\n\
         Тарифы:\n{}",
        stats.total_accounts,
        stats.paid_accounts,
        stats.stars_revenue,
        stats.total_jobs,
        stats.total_messages,
        paid_breakdown
    );
    bot.send_message(msg.chat.id, text).await?;

    Ok(())
}

async fn handle_cancel(
    bot: Throttle<Bot>,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
    msg: Message,
) -> HandlerResult<()> {
    dialogue
        .update(DialogueState::Start)
        .await
        .map_err(|e| BotError::DialogueStateError(e.to_string()))?;

    bot.send_message(msg.chat.id, "Действие отменено.")
        .reply_markup(get_main_menu_keyboard())
        .await?;

    Ok(())
}

async fn handle_command(
    bot: Throttle<Bot>,
    msg: Message,
    cmd: Command,
    dialogue: Dialogue<DialogueState, ErasedStorage<DialogueState>>,
) -> HandlerResult<()> {
    match cmd {
        Command::Start => handle_start(bot, dialogue, msg).await?,
        Command::Plans => handle_plans(bot, msg).await?,
        Command::Parse => handle_parse(bot, dialogue, msg).await?,
        Command::Schedule => handle_schedule(bot, dialogue, msg).await?,
        Command::Account => handle_account(bot, msg).await?,
        Command::Admin => handle_admin(bot, msg).await?,
        Command::Cancel => handle_cancel(bot, dialogue, msg).await?,
    }

    Ok(())
}

pub fn get_command_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(handle_command)
}
