use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::service::dialogue::model::{ExportPeriod, INTERVAL_CHOICES, LIMIT_CHOICES};
use crate::service::plan::{Tier, PLANS};

pub fn get_main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        [InlineKeyboardButton::callback("▶ Парсить", "parse_menu")],
        [InlineKeyboardButton::callback("💳 Тарифы", "plans_menu")],
        [InlineKeyboardButton::callback("📅 Расписание", "schedule_menu")],
        [InlineKeyboardButton::callback("📊 Мой аккаунт", "account_menu")],
    ])
}

pub fn get_back_to_main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
        "⬅️ Главное меню",
        "back_to_main_menu",
    )]])
}

pub fn get_plans_keyboard() -> InlineKeyboardMarkup {
    let mut buttons = Vec::new();
    for plan in PLANS.iter().filter(|plan| plan.tier != Tier::Free) {
        buttons.push(vec![InlineKeyboardButton::callback(
            format!("{} — {}⭐", plan.display_name, plan.price_stars),
            format!("buy:{}", plan.tier.as_str()),
        )]);
    }
    buttons.push(vec![InlineKeyboardButton::callback(
        "⬅️ Главное меню",
        "back_to_main_menu",
    )]);

    InlineKeyboardMarkup::new(buttons)
}

pub fn get_period_keyboard() -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = ExportPeriod::ALL
        .iter()
        .map(|period| {
            vec![InlineKeyboardButton::callback(
                period.label(),
                format!("period:{}", period.callback_key()),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// Limit buttons are cut down to the plan's message cap; anything above
/// it would be clamped anyway.
pub fn get_limit_keyboard(message_cap: u64) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = LIMIT_CHOICES
        .iter()
        .filter(|limit| **limit <= message_cap)
        .map(|limit| {
            vec![InlineKeyboardButton::callback(
                format!("{} сообщений", limit),
                format!("limit:{}", limit),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

pub fn get_format_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[
        InlineKeyboardButton::callback("📗 Excel", "format:xlsx"),
        InlineKeyboardButton::callback("📄 CSV", "format:csv"),
    ]])
}

pub fn get_interval_keyboard() -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = INTERVAL_CHOICES
        .iter()
        .map(|hours| {
            vec![InlineKeyboardButton::callback(
                format!("каждые {} ч", hours),
                format!("interval:{}", hours),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}
