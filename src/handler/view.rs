use crate::error::BotResult;
use crate::service::export::format_timestamp;
use crate::service::plan::{Tier, PLANS};
use crate::state::AppState;

pub fn plans_text() -> String {
    let mut text = String::from("💳 Тарифы (оплата в Telegram Stars):\n\n");
    for plan in PLANS {
        let schedule = if plan.scheduling_enabled {
            "расписание ✅"
        } else {
            "расписание —"
        };
        let price = if plan.price_stars == 0 {
            "бесплатно".to_string()
        } else {
            format!("{}⭐ / 30 дней", plan.price_stars)
        };
        text.push_str(&format!(
            "{}\n{} сообщений, {} чатов, {}\n{}\n\n",
            plan.display_name, plan.message_cap, plan.chat_cap, schedule, price
        ));
    }
    text
}

pub async fn account_text(account_id: i64) -> BotResult<String> {
    let registry = &AppState::get()?.service_registry;

    let account = registry.account.get_account(account_id).await?;
    let plan = registry.account.effective_plan(account_id).await?;
    let schedules = registry.account.schedules_for(account_id).await?;

    let expiry = match (plan.tier, account.tier_until) {
        (Tier::Free, _) => String::new(),
        (_, Some(until)) => format!("До: {}\n", format_timestamp(&until)),
        (_, None) => String::new(),
    };

    let mut text = format!(
        "📊 Мой аккаунт\n\n\
         Тариф: {}\n\
         {}Использовано сообщений: {}\n\
         Лимит за парсинг: {}\n\
         Чатов за парсинг: {}\n",
        plan.display_name, expiry, account.messages_used, plan.message_cap, plan.chat_cap
    );

    if !schedules.is_empty() {
        text.push_str("\n📅 Расписания:\n");
        for entry in schedules {
            let last_run = entry
                .last_run
                .map(|ts| format_timestamp(&ts))
                .unwrap_or_else(|| "ещё не было".to_string());
            text.push_str(&format!(
                "• {} — каждые {} ч (последний запуск: {})\n",
                entry.chat, entry.interval_hours, last_run
            ));
        }
    }

    Ok(text)
}
