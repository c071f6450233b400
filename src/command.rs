use teloxide::{
    adaptors::Throttle,
    macros::BotCommands,
    prelude::Requester,
    types::BotCommand,
    Bot,
};

use crate::error::HandlerResult;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    Start,
    Plans,
    Parse,
    Schedule,
    Account,
    Admin,
    Cancel,
}

impl Command {
    pub fn user_commands() -> Vec<BotCommand> {
        vec![
            BotCommand::new("start", "Запустить бота"),
            BotCommand::new("plans", "Тарифы и оплата"),
            BotCommand::new("parse", "Парсинг чатов"),
            BotCommand::new("schedule", "Автопарсинг по расписанию"),
            BotCommand::new("account", "Мой аккаунт"),
            BotCommand::new("cancel", "Отменить текущее действие"),
        ]
    }
}

#[cfg(not(test))]
pub async fn setup_user_commands(bot: &Throttle<Bot>) -> HandlerResult<()> {
    bot.delete_my_commands().await?;
    bot.set_my_commands(Command::user_commands()).await?;
    Ok(())
}

#[cfg(test)]
pub async fn setup_user_commands(_bot: &Throttle<Bot>) -> HandlerResult<()> {
    Ok(())
}
