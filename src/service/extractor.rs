use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::source::model::SourceMessage;
use crate::source::{ChatSource, SourceError, SourceSession};

/// Accepted rows are cut to this many characters after filtering, so the
/// keyword filter still sees the full text.
pub const TEXT_TRUNCATE_CHARS: usize = 500;

/// Progress is reported every time this many rows have been accepted.
pub const PROGRESS_INTERVAL: usize = 100;

const PAGE_SIZE: usize = 100;

/// Inclusive timestamp window. `None` bounds are open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn last_hours(hours: i64, now: DateTime<Utc>) -> Self {
        Self {
            from: Some(now - Duration::hours(hours)),
            to: Some(now),
        }
    }

    pub fn last_days(days: i64, now: DateTime<Utc>) -> Self {
        Self {
            from: Some(now - Duration::days(days)),
            to: Some(now),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if ts < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if ts > to {
                return false;
            }
        }
        true
    }
}

/// One accepted message. `seq` is 1-based within its chat; aggregation
/// renumbers globally before export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedRow {
    pub seq: u64,
    pub sender: String,
    pub text: String,
    pub chat_title: String,
    pub timestamp: DateTime<Utc>,
}

pub type ProgressCallback =
    Box<dyn Fn(usize) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send + Sync>;

/// Per-job observer. Every method is best-effort; implementations must
/// not assume they see each event exactly once.
#[async_trait]
pub trait JobProgress: Send + Sync {
    async fn on_chat_started(&self, _chat: &str) {}
    async fn on_chat_progress(&self, _chat: &str, _accepted: usize) {}
    async fn on_chat_done(&self, _chat: &str, _outcome: Result<usize, &SourceError>) {}
}

#[derive(Debug)]
pub struct ChatFailure {
    pub chat: String,
    pub error: SourceError,
}

#[derive(Clone, Debug)]
pub struct ChatExtraction {
    pub chat: String,
    pub chat_title: String,
    pub rows: Vec<ExtractedRow>,
}

/// Outcome of a multi-chat job. Failed chats are skipped, not fatal.
#[derive(Debug, Default)]
pub struct JobResult {
    pub per_chat: Vec<ChatExtraction>,
    pub failures: Vec<ChatFailure>,
}

impl JobResult {
    pub fn total_rows(&self) -> usize {
        self.per_chat.iter().map(|chat| chat.rows.len()).sum()
    }

    pub fn distinct_senders(&self) -> usize {
        let mut senders: Vec<&str> = self
            .per_chat
            .iter()
            .flat_map(|chat| chat.rows.iter().map(|row| row.sender.as_str()))
            .collect();
        senders.sort_unstable();
        senders.dedup();
        senders.len()
    }
}

#[derive(Clone)]
pub struct ExtractorService {
    source: Arc<dyn ChatSource>,
}

impl ExtractorService {
    pub fn new(source: Arc<dyn ChatSource>) -> Self {
        Self { source }
    }

    /// Extracts up to `cap` accepted rows from one chat, newest to oldest
    /// within `window`. Opens its own source session and drops it when
    /// done.
    pub async fn extract(
        &self,
        chat_identifier: &str,
        window: TimeWindow,
        cap: u64,
        keywords: Option<&[String]>,
        progress: Option<&ProgressCallback>,
    ) -> Result<ChatExtraction, SourceError> {
        let mut session = self.source.connect().await?;
        self.extract_with_session(session.as_mut(), chat_identifier, window, cap, keywords, progress)
            .await
    }

    async fn extract_with_session(
        &self,
        session: &mut dyn SourceSession,
        chat_identifier: &str,
        window: TimeWindow,
        cap: u64,
        keywords: Option<&[String]>,
        progress: Option<&ProgressCallback>,
    ) -> Result<ChatExtraction, SourceError> {
        let handle = session.resolve_chat(chat_identifier).await?;
        session.start_history(&handle, window.to).await?;

        let keywords: Option<Vec<String>> =
            keywords.map(|list| list.iter().map(|kw| kw.to_lowercase()).collect());

        let mut rows: Vec<ExtractedRow> = Vec::new();

        'pages: loop {
            let page = session.next_page(PAGE_SIZE).await?;
            if page.is_empty() {
                break;
            }

            // Pages come roughly newest-first, but ordering is not
            // guaranteed. Each message is checked against both bounds,
            // and the walk only stops once a whole page is older than
            // the window.
            let mut page_entirely_below = window.from.is_some();

            for message in &page {
                if window
                    .from
                    .map(|from| message.timestamp >= from)
                    .unwrap_or(true)
                {
                    page_entirely_below = false;
                }

                if !window.contains(message.timestamp) {
                    continue;
                }

                if message.text.is_empty() {
                    continue;
                }

                if let Some(keywords) = &keywords {
                    let lowered = message.text.to_lowercase();
                    if !keywords.iter().any(|kw| lowered.contains(kw)) {
                        continue;
                    }
                }

                let sender = match session.resolve_sender(message).await {
                    Ok(identity) => identity.display_name,
                    Err(SourceError::SenderResolution(_)) => "Unknown".to_string(),
                    Err(other) => return Err(other),
                };

                rows.push(ExtractedRow {
                    seq: rows.len() as u64 + 1,
                    sender,
                    text: truncate_chars(&message.text, TEXT_TRUNCATE_CHARS),
                    chat_title: handle.title.clone(),
                    timestamp: message.timestamp,
                });

                if rows.len() % PROGRESS_INTERVAL == 0 {
                    if let Some(progress) = progress {
                        // Best effort; a broken callback never aborts
                        // the extraction.
                        let _ = progress(rows.len()).await;
                    }
                }

                if rows.len() as u64 >= cap {
                    break 'pages;
                }
            }

            if page_entirely_below {
                break;
            }
        }

        Ok(ChatExtraction {
            chat: chat_identifier.to_string(),
            chat_title: handle.title,
            rows,
        })
    }

    /// Runs one job over several chats sequentially. A failing chat is
    /// recorded and skipped; the job carries on with the rest.
    pub async fn run_job(
        &self,
        chats: &[String],
        window: TimeWindow,
        cap: u64,
        keywords: Option<&[String]>,
        observer: Option<Arc<dyn JobProgress>>,
    ) -> JobResult {
        let mut result = JobResult::default();

        for chat in chats {
            if let Some(observer) = &observer {
                observer.on_chat_started(chat).await;
            }

            let progress = observer.as_ref().map(|observer| {
                let observer = Arc::clone(observer);
                let chat = chat.clone();
                let callback: ProgressCallback = Box::new(move |accepted| {
                    let observer = Arc::clone(&observer);
                    let chat = chat.clone();
                    Box::pin(async move {
                        observer.on_chat_progress(&chat, accepted).await;
                        Ok(())
                    })
                });
                callback
            });

            match self
                .extract(chat, window, cap, keywords, progress.as_ref())
                .await
            {
                Ok(extraction) => {
                    if let Some(observer) = &observer {
                        observer.on_chat_done(chat, Ok(extraction.rows.len())).await;
                    }
                    result.per_chat.push(extraction);
                }
                Err(error) => {
                    warn!("Extraction failed for {}: {}", chat, error);
                    if let Some(observer) = &observer {
                        observer.on_chat_done(chat, Err(&error)).await;
                    }
                    result.failures.push(ChatFailure {
                        chat: chat.clone(),
                        error,
                    });
                }
            }
        }

        result
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
