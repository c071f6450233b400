use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::model::{ChatHandle, SenderIdentity, SourceMessage};
use super::{ChatSource, SourceError, SourceSession};

/// Scripted source for tests. Each chat carries pre-cut pages (newest
/// first), a sender table, and optional injected failures.
#[derive(Clone, Default)]
pub struct MemorySource {
    chats: Arc<DashMap<String, ScriptedChat>>,
    connects: Arc<AtomicUsize>,
}

#[derive(Clone, Default)]
pub struct ScriptedChat {
    pub id: i64,
    pub title: String,
    pub pages: Vec<Vec<SourceMessage>>,
    pub senders: HashMap<i64, String>,
    /// Page index at which `next_page` fails with a transient error.
    pub fail_on_page: Option<usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_chat(&self, identifier: &str, chat: ScriptedChat) {
        self.chats.insert(identifier.to_string(), chat);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

pub fn scripted_message(id: i64, timestamp: DateTime<Utc>, text: &str) -> SourceMessage {
    SourceMessage {
        id,
        text: text.to_string(),
        timestamp,
    }
}

#[async_trait]
impl ChatSource for MemorySource {
    async fn connect(&self) -> Result<Box<dyn SourceSession>, SourceError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            chats: self.chats.clone(),
            current: None,
            page_cursor: 0,
        }))
    }
}

struct MemorySession {
    chats: Arc<DashMap<String, ScriptedChat>>,
    current: Option<ScriptedChat>,
    page_cursor: usize,
}

#[async_trait]
impl SourceSession for MemorySession {
    async fn resolve_chat(&mut self, identifier: &str) -> Result<ChatHandle, SourceError> {
        match self.chats.get(identifier) {
            Some(chat) => Ok(ChatHandle {
                id: chat.id,
                title: chat.title.clone(),
            }),
            None => Err(SourceError::ChatResolution(identifier.to_string())),
        }
    }

    async fn start_history(
        &mut self,
        chat: &ChatHandle,
        _anchor: Option<DateTime<Utc>>,
    ) -> Result<(), SourceError> {
        let scripted = self
            .chats
            .iter()
            .find(|entry| entry.id == chat.id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SourceError::ChatResolution(chat.title.clone()))?;

        self.current = Some(scripted);
        self.page_cursor = 0;

        Ok(())
    }

    async fn next_page(&mut self, _page_size: usize) -> Result<Vec<SourceMessage>, SourceError> {
        let chat = self.current.as_ref().ok_or(SourceError::NoHistory)?;

        if chat.fail_on_page == Some(self.page_cursor) {
            return Err(SourceError::Transient("injected failure".to_string()));
        }

        let page = chat
            .pages
            .get(self.page_cursor)
            .cloned()
            .unwrap_or_default();
        self.page_cursor += 1;

        Ok(page)
    }

    async fn resolve_sender(
        &mut self,
        message: &SourceMessage,
    ) -> Result<SenderIdentity, SourceError> {
        let chat = self.current.as_ref().ok_or(SourceError::NoHistory)?;

        match chat.senders.get(&message.id) {
            Some(display_name) => Ok(SenderIdentity {
                display_name: display_name.clone(),
            }),
            None => Err(SourceError::SenderResolution(message.id)),
        }
    }
}
