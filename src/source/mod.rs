mod error;
#[cfg(test)]
pub mod memory;
pub mod model;
mod telegram;

pub use error::SourceError;
#[cfg(test)]
pub use memory::{MemorySource, ScriptedChat};
pub use telegram::TelegramSource;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use model::{ChatHandle, SenderIdentity, SourceMessage};

/// Factory for live source sessions.
#[async_trait]
pub trait ChatSource: Send + Sync + 'static {
    /// Opens one session. A session owns exclusive use of one remote
    /// connection and is dropped when the extraction finishes.
    async fn connect(&self) -> Result<Box<dyn SourceSession>, SourceError>;
}

/// One live connection to the remote source. History iteration runs
/// newest to oldest; `next_page` returning an empty page means the
/// history is exhausted.
#[async_trait]
pub trait SourceSession: Send {
    async fn resolve_chat(&mut self, identifier: &str) -> Result<ChatHandle, SourceError>;

    /// Positions the history cursor at the newest message. `anchor` is a
    /// hint for sources that can seek by timestamp; callers still clip
    /// every message against their own window.
    async fn start_history(
        &mut self,
        chat: &ChatHandle,
        anchor: Option<DateTime<Utc>>,
    ) -> Result<(), SourceError>;

    async fn next_page(&mut self, page_size: usize) -> Result<Vec<SourceMessage>, SourceError>;

    async fn resolve_sender(
        &mut self,
        message: &SourceMessage,
    ) -> Result<SenderIdentity, SourceError>;
}
