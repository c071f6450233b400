use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::service::account::model::ScheduleEntry;
use crate::service::account::AccountService;
use crate::service::delivery::Delivery;
use crate::service::export::{self, ExportFormat};
use crate::service::extractor::{ExtractorService, TimeWindow};
use crate::service::ServiceError;

const SCHEDULED_FILE_PREFIX: &str = "auto";

#[derive(Clone)]
pub struct ScheduleService {
    accounts: AccountService,
    extractor: ExtractorService,
    delivery: Arc<dyn Delivery>,
}

impl ScheduleService {
    pub fn new(
        accounts: AccountService,
        extractor: ExtractorService,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            accounts,
            extractor,
            delivery,
        }
    }

    /// One scheduler tick. Runs every due entry; a failing entry is
    /// logged and left due, so the next tick retries it.
    pub async fn run_due(&self, now: DateTime<Utc>) -> Result<(), ServiceError> {
        let entries = self.accounts.list_active_schedules().await?;

        for entry in entries {
            if !entry.is_due(now) {
                continue;
            }

            info!(
                "Running schedule {} (chat {}, every {}h)",
                entry.entry_id, entry.chat, entry.interval_hours
            );

            if let Err(e) = self.run_entry(&entry, now).await {
                error!(
                    "Schedule {} for chat {} failed: {}",
                    entry.entry_id, entry.chat, e
                );
            }
        }

        Ok(())
    }

    async fn run_entry(&self, entry: &ScheduleEntry, now: DateTime<Utc>) -> Result<(), ServiceError> {
        // The cap follows whatever the account's plan is at run time.
        let plan = self.accounts.effective_plan(entry.account_id).await?;
        let window = TimeWindow::last_hours(i64::from(entry.interval_hours), now);

        let extraction = self
            .extractor
            .extract(&entry.chat, window, plan.message_cap, None, None)
            .await?;

        if !extraction.rows.is_empty() {
            let row_count = extraction.rows.len();
            self.accounts
                .record_usage(entry.account_id, &entry.chat, row_count as u64)
                .await?;

            let table = export::aggregate(vec![extraction]);
            let payload = export::to_xlsx(&table)?;
            let file_name = export::file_name(SCHEDULED_FILE_PREFIX, ExportFormat::Xlsx, now);
            let caption = format!(
                "⏰ *Автопарсинг* `{}`\n📊 Сообщений: {}",
                entry.chat, row_count
            );

            self.delivery
                .send_document(entry.account_id, &file_name, payload, &caption)
                .await?;
        }

        // An empty window is still a successful run; only failures leave
        // the entry due.
        self.accounts.advance_last_run(entry.entry_id, now).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{memory::scripted_message, MemorySource, ScriptedChat};
    use crate::storage::{AccountStore, MemoryAccountStore};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDelivery {
        sent: Mutex<Vec<(i64, String, String)>>,
    }

    #[async_trait]
    impl Delivery for RecordingDelivery {
        async fn send_document(
            &self,
            account_id: i64,
            file_name: &str,
            _payload: Vec<u8>,
            caption: &str,
        ) -> Result<(), ServiceError> {
            self.sent
                .lock()
                .unwrap()
                .push((account_id, file_name.to_string(), caption.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<MemoryAccountStore>,
        source: MemorySource,
        delivery: Arc<RecordingDelivery>,
        schedule: ScheduleService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryAccountStore::new());
        let source = MemorySource::new();
        let delivery = Arc::new(RecordingDelivery::default());
        let accounts = AccountService::new(store.clone());
        let extractor = ExtractorService::new(Arc::new(source.clone()));
        let schedule = ScheduleService::new(accounts, extractor, delivery.clone());
        Fixture {
            store,
            source,
            delivery,
            schedule,
        }
    }

    fn fresh_chat(id: i64, now: DateTime<Utc>) -> ScriptedChat {
        ScriptedChat {
            id,
            title: "News".to_string(),
            pages: vec![vec![scripted_message(1, now - Duration::hours(1), "hello")]],
            senders: HashMap::from([(1, "@a".to_string())]),
            fail_on_page: None,
        }
    }

    #[tokio::test]
    async fn due_entry_runs_once_per_interval() {
        let f = fixture();
        let now = Utc::now();
        f.source.add_chat("news", fresh_chat(1, now));
        f.store.add_schedule(7, "news", 24).await.unwrap();

        f.schedule.run_due(now).await.unwrap();
        // Second tick inside the same interval must not re-run.
        f.schedule.run_due(now + Duration::minutes(30)).await.unwrap();

        assert_eq!(f.delivery.sent.lock().unwrap().len(), 1);
        let entry = f.store.schedule(1).unwrap();
        assert_eq!(entry.last_run, Some(now));
    }

    #[tokio::test]
    async fn entry_becomes_due_again_after_interval() {
        let f = fixture();
        let now = Utc::now();
        f.source.add_chat("news", fresh_chat(1, now));
        f.store.add_schedule(7, "news", 6).await.unwrap();

        f.schedule.run_due(now).await.unwrap();

        // New history lands inside the second interval.
        f.source
            .add_chat("news", fresh_chat(1, now + Duration::hours(6)));
        f.schedule.run_due(now + Duration::hours(6)).await.unwrap();

        assert_eq!(f.delivery.sent.lock().unwrap().len(), 2);
        let entry = f.store.schedule(1).unwrap();
        assert_eq!(entry.last_run, Some(now + Duration::hours(6)));
    }

    #[tokio::test]
    async fn empty_run_advances_without_delivery() {
        let f = fixture();
        let now = Utc::now();
        // All history is older than the 6h window.
        f.source.add_chat(
            "news",
            ScriptedChat {
                id: 1,
                title: "News".to_string(),
                pages: vec![vec![scripted_message(1, now - Duration::days(2), "old")]],
                senders: HashMap::from([(1, "@a".to_string())]),
                fail_on_page: None,
            },
        );
        f.store.add_schedule(7, "news", 6).await.unwrap();

        f.schedule.run_due(now).await.unwrap();

        assert!(f.delivery.sent.lock().unwrap().is_empty());
        assert!(f.store.usage_rows(7).is_empty());
        assert_eq!(f.store.schedule(1).unwrap().last_run, Some(now));
    }

    #[tokio::test]
    async fn failed_run_stays_due_for_the_next_tick() {
        let f = fixture();
        let now = Utc::now();
        // Chat is unknown to the source, so every run fails.
        f.store.add_schedule(7, "ghost", 6).await.unwrap();

        f.schedule.run_due(now).await.unwrap();
        assert_eq!(f.store.schedule(1).unwrap().last_run, None);

        // Add the chat; the retry on the next tick succeeds.
        f.source.add_chat("ghost", fresh_chat(2, now));
        let later = now + Duration::minutes(30);
        f.schedule.run_due(later).await.unwrap();

        assert_eq!(f.delivery.sent.lock().unwrap().len(), 1);
        assert_eq!(f.store.schedule(1).unwrap().last_run, Some(later));
    }

    #[tokio::test]
    async fn successful_run_records_usage() {
        let f = fixture();
        let now = Utc::now();
        f.source.add_chat("news", fresh_chat(1, now));
        f.store.add_schedule(7, "news", 6).await.unwrap();

        f.schedule.run_due(now).await.unwrap();

        let rows = f.store.usage_rows(7);
        assert_eq!(rows, vec![("news".to_string(), 1)]);
    }

    #[tokio::test]
    async fn scheduled_files_use_the_auto_prefix() {
        let f = fixture();
        let now = Utc::now();
        f.source.add_chat("news", fresh_chat(1, now));
        f.store.add_schedule(7, "news", 6).await.unwrap();

        f.schedule.run_due(now).await.unwrap();

        let sent = f.delivery.sent.lock().unwrap();
        assert!(sent[0].1.starts_with("auto_"));
        assert!(sent[0].1.ends_with(".xlsx"));
    }

    #[tokio::test]
    async fn transient_failure_distinct_from_empty_window() {
        let f = fixture();
        let now = Utc::now();
        f.source.add_chat(
            "flaky",
            ScriptedChat {
                id: 1,
                title: "Flaky".to_string(),
                pages: vec![vec![scripted_message(1, now - Duration::hours(1), "x")]],
                senders: HashMap::from([(1, "@a".to_string())]),
                fail_on_page: Some(0),
            },
        );
        f.store.add_schedule(7, "flaky", 6).await.unwrap();

        f.schedule.run_due(now).await.unwrap();

        // A transient failure is a failed run, not an empty success.
        assert!(f.delivery.sent.lock().unwrap().is_empty());
        assert_eq!(f.store.schedule(1).unwrap().last_run, None);
    }
}
