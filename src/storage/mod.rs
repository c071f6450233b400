mod error;
#[cfg(test)]
mod memory;
mod turso;

pub use error::StorageError;
#[cfg(test)]
pub use memory::MemoryAccountStore;
pub use turso::{TursoAccountStore, TursoClient};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::service::account::model::{Account, ScheduleEntry, UsageStats};
use crate::service::plan::Tier;

/// Persistence port for accounts, payments, schedules and the parse audit
/// log. `get_account` returning `None` is not an error; callers synthesize
/// a default free-tier account instead.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    async fn get_account(&self, account_id: i64) -> Result<Option<Account>, StorageError>;

    /// Upsert the identity row. Never touches tier, expiry or usage.
    async fn touch(&self, account_id: i64, username: Option<&str>) -> Result<(), StorageError>;

    async fn set_tier(
        &self,
        account_id: i64,
        tier: Tier,
        until: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    async fn add_payment(&self, account_id: i64, tier: Tier, stars: u32) -> Result<(), StorageError>;

    /// Appends one audit row and advances the usage counter in a single
    /// transaction.
    async fn record_usage(
        &self,
        account_id: i64,
        chat: &str,
        message_count: u64,
    ) -> Result<(), StorageError>;

    async fn add_schedule(
        &self,
        account_id: i64,
        chat: &str,
        interval_hours: u32,
    ) -> Result<(), StorageError>;

    async fn list_active_schedules(&self) -> Result<Vec<ScheduleEntry>, StorageError>;

    async fn advance_last_run(
        &self,
        entry_id: i64,
        ran_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    async fn stats(&self) -> Result<UsageStats, StorageError>;
}

#[derive(Clone)]
pub struct StorageManager {
    turso: &'static TursoClient,
}

impl StorageManager {
    pub async fn init(turso_url: &str, turso_token: &str) -> Result<(), StorageError> {
        TursoClient::init(turso_url, turso_token).await?;

        Ok(())
    }

    pub fn get() -> Result<Self, StorageError> {
        let turso = TursoClient::get()?;

        Ok(Self { turso })
    }

    pub fn turso(&self) -> &'static TursoClient {
        self.turso
    }
}
