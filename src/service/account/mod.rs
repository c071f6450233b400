pub mod model;

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::service::plan::{self, Plan, Tier, PAID_TIER_DAYS};
use crate::service::ServiceError;
use crate::storage::AccountStore;

use model::{Account, ScheduleEntry, UsageStats};

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Accounts that were never stored read as fresh free-tier accounts.
    pub async fn get_account(&self, account_id: i64) -> Result<Account, ServiceError> {
        Ok(self
            .store
            .get_account(account_id)
            .await?
            .unwrap_or_else(|| Account::synthesized(account_id)))
    }

    pub async fn touch(&self, account_id: i64, username: Option<&str>) -> Result<(), ServiceError> {
        self.store.touch(account_id, username).await?;
        Ok(())
    }

    /// Activates a paid tier for the standard 30 days from now.
    pub async fn activate_tier(&self, account_id: i64, tier: Tier) -> Result<(), ServiceError> {
        let until = Utc::now() + Duration::days(PAID_TIER_DAYS);
        self.store.set_tier(account_id, tier, until).await?;
        Ok(())
    }

    pub async fn add_payment(
        &self,
        account_id: i64,
        tier: Tier,
        stars: u32,
    ) -> Result<(), ServiceError> {
        self.store.add_payment(account_id, tier, stars).await?;
        Ok(())
    }

    pub async fn record_usage(
        &self,
        account_id: i64,
        chat: &str,
        message_count: u64,
    ) -> Result<(), ServiceError> {
        self.store.record_usage(account_id, chat, message_count).await?;
        Ok(())
    }

    /// Expiry is evaluated on every read; the stored row stays untouched.
    pub async fn effective_plan(&self, account_id: i64) -> Result<&'static Plan, ServiceError> {
        let account = self.get_account(account_id).await?;
        let tier = plan::effective_tier(account.tier, account.tier_until, Utc::now());
        Ok(plan::resolve(tier))
    }

    pub async fn add_schedule(
        &self,
        account_id: i64,
        chat: &str,
        interval_hours: u32,
    ) -> Result<(), ServiceError> {
        self.store.add_schedule(account_id, chat, interval_hours).await?;
        Ok(())
    }

    pub async fn list_active_schedules(&self) -> Result<Vec<ScheduleEntry>, ServiceError> {
        Ok(self.store.list_active_schedules().await?)
    }

    pub async fn schedules_for(&self, account_id: i64) -> Result<Vec<ScheduleEntry>, ServiceError> {
        let mut entries = self.store.list_active_schedules().await?;
        entries.retain(|entry| entry.account_id == account_id);
        Ok(entries)
    }

    pub async fn advance_last_run(
        &self,
        entry_id: i64,
        ran_at: chrono::DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        self.store.advance_last_run(entry_id, ran_at).await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<UsageStats, ServiceError> {
        Ok(self.store.stats().await?)
    }
}
