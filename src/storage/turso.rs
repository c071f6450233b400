use chrono::{DateTime, Utc};
use libsql::errors::Error as TursoError;
use libsql::{params, Builder, Connection, Database, Row, Value};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;

use super::{AccountStore, StorageError};
use crate::service::account::model::{Account, ScheduleEntry, UsageStats};
use crate::service::plan::Tier;

pub static TURSO_CLIENT: OnceLock<TursoClient> = OnceLock::new();

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    user_id     INTEGER PRIMARY KEY,
    username    TEXT,
    plan        TEXT DEFAULT 'free',
    plan_until  TEXT,
    msgs_used   INTEGER DEFAULT 0,
    created_at  TEXT DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS payments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL,
    plan        TEXT NOT NULL,
    stars       INTEGER NOT NULL,
    created_at  TEXT DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS schedules (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL,
    chat        TEXT NOT NULL,
    interval_h  INTEGER NOT NULL,
    last_run    TEXT,
    active      INTEGER DEFAULT 1
);
CREATE TABLE IF NOT EXISTS parse_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL,
    chat        TEXT NOT NULL,
    msg_count   INTEGER NOT NULL,
    created_at  TEXT DEFAULT CURRENT_TIMESTAMP
);
";

#[derive(Clone)]
pub struct TursoClient {
    inner: Arc<Database>,
}

impl TursoClient {
    pub async fn init(url: &str, token: &str) -> Result<(), StorageError> {
        if TURSO_CLIENT.get().is_some() {
            info!("TursoClient already initialized");
            return Ok(());
        }

        info!("Initializing TursoClient...");
        let db = Arc::new(
            Builder::new_remote(url.to_string(), token.to_string())
                .build()
                .await
                .map_err(StorageError::Turso)?,
        );

        info!("TursoClient initialized");
        TURSO_CLIENT.set(Self { inner: db }).map_err(|_| {
            StorageError::Turso(TursoError::ConnectionFailed(
                "Failed to set global Turso client".to_string(),
            ))
        })?;

        Ok(())
    }

    pub fn get() -> Result<&'static TursoClient, StorageError> {
        TURSO_CLIENT.get().ok_or_else(|| {
            StorageError::Turso(TursoError::ConnectionFailed(
                "Turso client not initialized".to_string(),
            ))
        })
    }

    pub async fn get_connection(&self) -> Result<Connection, StorageError> {
        let conn = self.inner.connect().map_err(StorageError::Turso)?;
        Ok(conn)
    }
}

#[derive(Clone)]
pub struct TursoAccountStore {
    client: &'static TursoClient,
}

impl TursoAccountStore {
    pub fn new(client: &'static TursoClient) -> Self {
        Self { client }
    }

    pub async fn migrate(&self) -> Result<(), StorageError> {
        let conn = self.client.get_connection().await?;
        conn.execute_batch(SCHEMA).await.map_err(StorageError::Turso)?;
        info!("Database schema ready");
        Ok(())
    }

    fn account_from_row(row: &Row) -> Result<Account, StorageError> {
        let account_id = row.get::<i64>(0).map_err(StorageError::Turso)?;
        let username = optional_text(row, 1)?;
        let tier = optional_text(row, 2)?
            .map(|raw| Tier::from_key(&raw))
            .unwrap_or(Tier::Free);
        let tier_until = optional_timestamp(row, 3)?;
        let messages_used = row.get::<i64>(4).map_err(StorageError::Turso)?.max(0) as u64;

        Ok(Account {
            account_id,
            username,
            tier,
            tier_until,
            messages_used,
        })
    }

    fn schedule_from_row(row: &Row) -> Result<ScheduleEntry, StorageError> {
        Ok(ScheduleEntry {
            entry_id: row.get::<i64>(0).map_err(StorageError::Turso)?,
            account_id: row.get::<i64>(1).map_err(StorageError::Turso)?,
            chat: row.get::<String>(2).map_err(StorageError::Turso)?,
            interval_hours: row.get::<i64>(3).map_err(StorageError::Turso)?.max(0) as u32,
            last_run: optional_timestamp(row, 4)?,
            active: row.get::<i64>(5).map_err(StorageError::Turso)? != 0,
        })
    }
}

fn optional_text(row: &Row, idx: i32) -> Result<Option<String>, StorageError> {
    match row.get_value(idx).map_err(StorageError::Turso)? {
        Value::Text(text) => Ok(Some(text)),
        Value::Null => Ok(None),
        other => Err(StorageError::CorruptRow(format!(
            "expected text at column {}, got {:?}",
            idx, other
        ))),
    }
}

fn optional_timestamp(row: &Row, idx: i32) -> Result<Option<DateTime<Utc>>, StorageError> {
    match optional_text(row, idx)? {
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| StorageError::CorruptRow(format!("bad timestamp {:?}: {}", raw, e)))?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl AccountStore for TursoAccountStore {
    async fn get_account(&self, account_id: i64) -> Result<Option<Account>, StorageError> {
        let conn = self.client.get_connection().await?;
        let mut rows = conn
            .query(
                "SELECT user_id, username, plan, plan_until, msgs_used FROM users WHERE user_id = ?1",
                params![account_id],
            )
            .await
            .map_err(StorageError::Turso)?;

        match rows.next().await.map_err(StorageError::Turso)? {
            Some(row) => Ok(Some(Self::account_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn touch(&self, account_id: i64, username: Option<&str>) -> Result<(), StorageError> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO users (user_id, username) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET username = excluded.username",
            params![account_id, username],
        )
        .await
        .map_err(StorageError::Turso)?;

        Ok(())
    }

    async fn set_tier(
        &self,
        account_id: i64,
        tier: Tier,
        until: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO users (user_id, plan, plan_until) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET plan = excluded.plan, plan_until = excluded.plan_until",
            params![account_id, tier.as_str(), until.to_rfc3339()],
        )
        .await
        .map_err(StorageError::Turso)?;

        Ok(())
    }

    async fn add_payment(&self, account_id: i64, tier: Tier, stars: u32) -> Result<(), StorageError> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO payments (user_id, plan, stars) VALUES (?1, ?2, ?3)",
            params![account_id, tier.as_str(), stars as i64],
        )
        .await
        .map_err(StorageError::Turso)?;

        Ok(())
    }

    async fn record_usage(
        &self,
        account_id: i64,
        chat: &str,
        message_count: u64,
    ) -> Result<(), StorageError> {
        let conn = self.client.get_connection().await?;
        let tx = conn.transaction().await.map_err(StorageError::Turso)?;

        tx.execute(
            "INSERT INTO parse_log (user_id, chat, msg_count) VALUES (?1, ?2, ?3)",
            params![account_id, chat, message_count as i64],
        )
        .await
        .map_err(StorageError::Turso)?;

        tx.execute(
            "UPDATE users SET msgs_used = msgs_used + ?2 WHERE user_id = ?1",
            params![account_id, message_count as i64],
        )
        .await
        .map_err(StorageError::Turso)?;

        tx.commit().await.map_err(StorageError::Turso)?;

        Ok(())
    }

    async fn add_schedule(
        &self,
        account_id: i64,
        chat: &str,
        interval_hours: u32,
    ) -> Result<(), StorageError> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "INSERT INTO schedules (user_id, chat, interval_h) VALUES (?1, ?2, ?3)",
            params![account_id, chat, interval_hours as i64],
        )
        .await
        .map_err(StorageError::Turso)?;

        Ok(())
    }

    async fn list_active_schedules(&self) -> Result<Vec<ScheduleEntry>, StorageError> {
        let conn = self.client.get_connection().await?;
        let mut rows = conn
            .query(
                "SELECT id, user_id, chat, interval_h, last_run, active FROM schedules WHERE active = 1",
                (),
            )
            .await
            .map_err(StorageError::Turso)?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await.map_err(StorageError::Turso)? {
            entries.push(Self::schedule_from_row(&row)?);
        }

        Ok(entries)
    }

    async fn advance_last_run(
        &self,
        entry_id: i64,
        ran_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let conn = self.client.get_connection().await?;
        conn.execute(
            "UPDATE schedules SET last_run = ?2 WHERE id = ?1",
            params![entry_id, ran_at.to_rfc3339()],
        )
        .await
        .map_err(StorageError::Turso)?;

        Ok(())
    }

    async fn stats(&self) -> Result<UsageStats, StorageError> {
        let conn = self.client.get_connection().await?;
        let mut rows = conn
            .query(
                "SELECT
                    (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM users WHERE plan != 'free'),
                    (SELECT COALESCE(SUM(stars), 0) FROM payments),
                    (SELECT COUNT(*) FROM parse_log),
                    (SELECT COALESCE(SUM(msg_count), 0) FROM parse_log)",
                (),
            )
            .await
            .map_err(StorageError::Turso)?;

        let row = rows
            .next()
            .await
            .map_err(StorageError::Turso)?
            .ok_or_else(|| StorageError::Other("stats query returned no row".to_string()))?;

        Ok(UsageStats {
            total_accounts: row.get::<i64>(0).map_err(StorageError::Turso)?.max(0) as u64,
            paid_accounts: row.get::<i64>(1).map_err(StorageError::Turso)?.max(0) as u64,
            stars_revenue: row.get::<i64>(2).map_err(StorageError::Turso)?.max(0) as u64,
            total_jobs: row.get::<i64>(3).map_err(StorageError::Turso)?.max(0) as u64,
            total_messages: row.get::<i64>(4).map_err(StorageError::Turso)?.max(0) as u64,
        })
    }
}
