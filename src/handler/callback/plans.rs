use teloxide::{
    adaptors::Throttle,
    prelude::Requester,
    types::{LabeledPrice, MaybeInaccessibleMessage},
    Bot,
};

use crate::error::HandlerResult;
use crate::handler::payment::INVOICE_PAYLOAD_PREFIX;
use crate::service::plan::{self, Tier};

pub(super) async fn handle_callback_buy(
    bot: &Throttle<Bot>,
    message: MaybeInaccessibleMessage,
    tier_key: &str,
) -> HandlerResult<()> {
    let tier = Tier::from_key(tier_key);
    let plan = plan::resolve(tier);
    if plan.price_stars == 0 {
        return Ok(());
    }

    // Telegram Stars invoices use the XTR currency and no provider token.
    bot.send_invoice(
        message.chat().id,
        plan.display_name.to_string(),
        format!(
            "{} сообщений, {} чатов, 30 дней",
            plan.message_cap, plan.chat_cap
        ),
        format!("{}{}", INVOICE_PAYLOAD_PREFIX, tier.as_str()),
        "XTR".to_string(),
        vec![LabeledPrice {
            label: plan.display_name.to_string(),
            amount: plan.price_stars,
        }],
    )
    .await?;

    Ok(())
}
