use teloxide::{
    adaptors::Throttle,
    dispatching::{UpdateFilterExt, UpdateHandler},
    prelude::Requester,
    types::{Message, PreCheckoutQuery, SuccessfulPayment, Update},
    Bot,
};

use crate::error::HandlerResult;
use crate::handler::keyboard::get_main_menu_keyboard;
use crate::service::plan::{self, Tier};
use crate::state::AppState;

use teloxide::payloads::SendMessageSetters;

pub const INVOICE_PAYLOAD_PREFIX: &str = "plan:";

/// Stars payments have no provider-side validation to do here; every
/// pre-checkout is approved.
pub async fn handle_pre_checkout(bot: Throttle<Bot>, q: PreCheckoutQuery) -> HandlerResult<()> {
    bot.answer_pre_checkout_query(q.id, true).await?;

    Ok(())
}

async fn handle_successful_payment(
    bot: Throttle<Bot>,
    msg: Message,
    payment: SuccessfulPayment,
) -> HandlerResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };

    let Some(tier_key) = payment.invoice_payload.strip_prefix(INVOICE_PAYLOAD_PREFIX) else {
        warn!("Unexpected invoice payload: {}", payment.invoice_payload);
        return Ok(());
    };

    let tier = Tier::from_key(tier_key);
    if tier == Tier::Free {
        warn!("Refusing to activate free tier from payload {}", payment.invoice_payload);
        return Ok(());
    }

    let account_id = user.id.0 as i64;
    let registry = &AppState::get()?.service_registry;
    registry.account.activate_tier(account_id, tier).await?;
    registry
        .account
        .add_payment(account_id, tier, payment.total_amount)
        .await?;

    info!(
        "Payment: user {} bought {} for {}⭐",
        account_id,
        tier.as_str(),
        payment.total_amount
    );

    let plan = plan::resolve(tier);
    bot.send_message(
        msg.chat.id,
        format!(
            "🎉 Тариф {} активирован на 30 дней!\n\
             Лимит: {} сообщений, {} чатов.",
            plan.display_name, plan.message_cap, plan.chat_cap
        ),
    )
    .reply_markup(get_main_menu_keyboard())
    .await?;

    Ok(())
}

pub fn get_payment_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.successful_payment().cloned())
        .endpoint(handle_successful_payment)
}
