use async_trait::async_trait;
use teloxide::adaptors::Throttle;
use teloxide::payloads::SendDocumentSetters;
use teloxide::prelude::Requester;
use teloxide::types::{ChatId, InputFile, ParseMode};
use teloxide::Bot;

use crate::service::ServiceError;

/// Outbound document delivery. The scheduler goes through this seam so
/// its tests never need a live bot.
#[async_trait]
pub trait Delivery: Send + Sync + 'static {
    async fn send_document(
        &self,
        account_id: i64,
        file_name: &str,
        payload: Vec<u8>,
        caption: &str,
    ) -> Result<(), ServiceError>;
}

pub struct TelegramDelivery {
    bot: Throttle<Bot>,
}

impl TelegramDelivery {
    pub fn new(bot: Throttle<Bot>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Delivery for TelegramDelivery {
    async fn send_document(
        &self,
        account_id: i64,
        file_name: &str,
        payload: Vec<u8>,
        caption: &str,
    ) -> Result<(), ServiceError> {
        let document = InputFile::memory(payload).file_name(file_name.to_string());

        self.bot
            .send_document(ChatId(account_id), document)
            .caption(caption.to_string())
            .parse_mode(ParseMode::Markdown)
            .await
            .map_err(|e| ServiceError::Delivery(e.to_string()))?;

        Ok(())
    }
}
