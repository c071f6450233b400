use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{AccountStore, StorageError};
use crate::service::account::model::{Account, ScheduleEntry, UsageStats};
use crate::service::plan::Tier;

/// In-memory store used by service-level tests.
#[derive(Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<DashMap<i64, Account>>,
    schedules: Arc<DashMap<i64, ScheduleEntry>>,
    payments: Arc<DashMap<i64, Vec<(Tier, u32)>>>,
    usage_log: Arc<DashMap<i64, Vec<(String, u64)>>>,
    next_schedule_id: Arc<AtomicI64>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self {
            next_schedule_id: Arc::new(AtomicI64::new(1)),
            ..Default::default()
        }
    }

    pub fn usage_rows(&self, account_id: i64) -> Vec<(String, u64)> {
        self.usage_log
            .get(&account_id)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }

    pub fn schedule(&self, entry_id: i64) -> Option<ScheduleEntry> {
        self.schedules.get(&entry_id).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get_account(&self, account_id: i64) -> Result<Option<Account>, StorageError> {
        Ok(self
            .accounts
            .get(&account_id)
            .map(|account| account.value().clone()))
    }

    async fn touch(&self, account_id: i64, username: Option<&str>) -> Result<(), StorageError> {
        self.accounts
            .entry(account_id)
            .and_modify(|account| account.username = username.map(str::to_string))
            .or_insert_with(|| Account {
                username: username.map(str::to_string),
                ..Account::synthesized(account_id)
            });

        Ok(())
    }

    async fn set_tier(
        &self,
        account_id: i64,
        tier: Tier,
        until: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut account = self
            .accounts
            .entry(account_id)
            .or_insert_with(|| Account::synthesized(account_id));
        account.tier = tier;
        account.tier_until = Some(until);

        Ok(())
    }

    async fn add_payment(&self, account_id: i64, tier: Tier, stars: u32) -> Result<(), StorageError> {
        self.payments
            .entry(account_id)
            .or_default()
            .push((tier, stars));

        Ok(())
    }

    async fn record_usage(
        &self,
        account_id: i64,
        chat: &str,
        message_count: u64,
    ) -> Result<(), StorageError> {
        self.usage_log
            .entry(account_id)
            .or_default()
            .push((chat.to_string(), message_count));
        self.accounts
            .entry(account_id)
            .or_insert_with(|| Account::synthesized(account_id))
            .messages_used += message_count;

        Ok(())
    }

    async fn add_schedule(
        &self,
        account_id: i64,
        chat: &str,
        interval_hours: u32,
    ) -> Result<(), StorageError> {
        let entry_id = self.next_schedule_id.fetch_add(1, Ordering::SeqCst);
        self.schedules.insert(
            entry_id,
            ScheduleEntry {
                entry_id,
                account_id,
                chat: chat.to_string(),
                interval_hours,
                last_run: None,
                active: true,
            },
        );

        Ok(())
    }

    async fn list_active_schedules(&self) -> Result<Vec<ScheduleEntry>, StorageError> {
        let mut entries: Vec<ScheduleEntry> = self
            .schedules
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|entry| entry.entry_id);

        Ok(entries)
    }

    async fn advance_last_run(
        &self,
        entry_id: i64,
        ran_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if let Some(mut entry) = self.schedules.get_mut(&entry_id) {
            entry.last_run = Some(ran_at);
        }

        Ok(())
    }

    async fn stats(&self) -> Result<UsageStats, StorageError> {
        let paid_accounts = self
            .accounts
            .iter()
            .filter(|account| account.tier != Tier::Free)
            .count() as u64;
        let stars_revenue: u64 = self
            .payments
            .iter()
            .flat_map(|payments| payments.iter().map(|(_, stars)| *stars as u64).collect::<Vec<_>>())
            .sum();
        let total_jobs: u64 = self.usage_log.iter().map(|rows| rows.len() as u64).sum();
        let total_messages: u64 = self
            .usage_log
            .iter()
            .map(|rows| rows.iter().map(|(_, count)| count).sum::<u64>())
            .sum();

        Ok(UsageStats {
            total_accounts: self.accounts.len() as u64,
            paid_accounts,
            stars_revenue,
            total_jobs,
            total_messages,
        })
    }
}
