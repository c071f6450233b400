use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grammers_client::types::Chat;
use grammers_client::{Client, Config, InitParams};
use grammers_session::Session;

use super::model::{ChatHandle, SenderIdentity, SourceMessage};
use super::{ChatSource, SourceError, SourceSession};
use crate::config::SourceConfig;
use crate::utils::normalize_chat_identifier;

/// MTProto-backed chat source. Reads history through a pre-authorized user
/// session; the bot API alone cannot fetch arbitrary chat history.
pub struct TelegramSource {
    config: SourceConfig,
}

impl TelegramSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ChatSource for TelegramSource {
    async fn connect(&self) -> Result<Box<dyn SourceSession>, SourceError> {
        let session = Session::load_file_or_create(&self.config.session_file)
            .map_err(|e| SourceError::Connection(format!("session file: {}", e)))?;

        let client = Client::connect(Config {
            session,
            api_id: self.config.api_id,
            api_hash: self.config.api_hash.clone(),
            params: InitParams::default(),
        })
        .await
        .map_err(|e| SourceError::Connection(e.to_string()))?;

        let authorized = client
            .is_authorized()
            .await
            .map_err(|e| SourceError::Connection(e.to_string()))?;
        if !authorized {
            return Err(SourceError::Connection(
                "MTProto session is not authorized".to_string(),
            ));
        }

        Ok(Box::new(TelegramSession {
            client,
            chats: HashMap::new(),
            history_chat: None,
            offset_id: None,
            exhausted: false,
            senders: HashMap::new(),
        }))
    }
}

struct TelegramSession {
    client: Client,
    chats: HashMap<i64, Chat>,
    history_chat: Option<Chat>,
    offset_id: Option<i32>,
    exhausted: bool,
    // sender per fetched message id, kept so resolve_sender needs no
    // further round trips
    senders: HashMap<i64, Option<Chat>>,
}

#[async_trait]
impl SourceSession for TelegramSession {
    async fn resolve_chat(&mut self, identifier: &str) -> Result<ChatHandle, SourceError> {
        let username = normalize_chat_identifier(identifier)
            .ok_or_else(|| SourceError::ChatResolution(identifier.to_string()))?;

        let chat = self
            .client
            .resolve_username(&username)
            .await
            .map_err(|e| SourceError::Transient(e.to_string()))?
            .ok_or_else(|| SourceError::ChatResolution(identifier.to_string()))?;

        let handle = ChatHandle {
            id: chat.id(),
            title: chat.name().to_string(),
        };
        self.chats.insert(chat.id(), chat);

        Ok(handle)
    }

    async fn start_history(
        &mut self,
        chat: &ChatHandle,
        _anchor: Option<DateTime<Utc>>,
    ) -> Result<(), SourceError> {
        let chat = self
            .chats
            .get(&chat.id)
            .ok_or_else(|| SourceError::ChatResolution(chat.title.clone()))?;

        // Iteration always starts at the head of the history; callers clip
        // by timestamp.
        self.history_chat = Some(chat.clone());
        self.offset_id = None;
        self.exhausted = false;
        self.senders.clear();

        Ok(())
    }

    async fn next_page(&mut self, page_size: usize) -> Result<Vec<SourceMessage>, SourceError> {
        if self.exhausted {
            return Ok(Vec::new());
        }

        let chat = self.history_chat.clone().ok_or(SourceError::NoHistory)?;

        let mut iter = self.client.iter_messages(&chat).limit(page_size);
        if let Some(offset_id) = self.offset_id {
            iter = iter.offset_id(offset_id);
        }

        let mut page = Vec::with_capacity(page_size);
        loop {
            match iter.next().await {
                Ok(Some(message)) => {
                    self.offset_id = Some(message.id());
                    self.senders.insert(message.id() as i64, message.sender());
                    page.push(SourceMessage {
                        id: message.id() as i64,
                        text: message.text().to_string(),
                        timestamp: message.date(),
                    });
                    if page.len() >= page_size {
                        break;
                    }
                }
                Ok(None) => {
                    // A short page means the history ran out; a full page
                    // just hit the iterator's limit.
                    if page.len() < page_size {
                        self.exhausted = true;
                    }
                    break;
                }
                Err(e) => return Err(SourceError::Transient(e.to_string())),
            }
        }

        Ok(page)
    }

    async fn resolve_sender(
        &mut self,
        message: &SourceMessage,
    ) -> Result<SenderIdentity, SourceError> {
        match self.senders.get(&message.id) {
            Some(Some(sender)) => {
                let display_name = match sender.username() {
                    Some(username) => format!("@{}", username),
                    None => sender.name().to_string(),
                };
                Ok(SenderIdentity { display_name })
            }
            _ => Err(SourceError::SenderResolution(message.id)),
        }
    }
}
