use chrono::{DateTime, Duration, Utc};

use crate::service::plan::Tier;

#[derive(Clone, Debug)]
pub struct Account {
    pub account_id: i64,
    pub username: Option<String>,
    pub tier: Tier,
    pub tier_until: Option<DateTime<Utc>>,
    pub messages_used: u64,
}

impl Account {
    /// Default free-tier view of an account with no stored row.
    pub fn synthesized(account_id: i64) -> Self {
        Self {
            account_id,
            username: None,
            tier: Tier::Free,
            tier_until: None,
            messages_used: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScheduleEntry {
    pub entry_id: i64,
    pub account_id: i64,
    pub chat: String,
    pub interval_hours: u32,
    pub last_run: Option<DateTime<Utc>>,
    pub active: bool,
}

impl ScheduleEntry {
    /// Never ran, or at least one full interval has passed. Works under
    /// tick drift because it compares against the interval, not against
    /// an expected fire time.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_run {
            None => true,
            Some(last_run) => now - last_run >= Duration::hours(i64::from(self.interval_hours)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UsageStats {
    pub total_accounts: u64,
    pub paid_accounts: u64,
    pub stars_revenue: u64,
    pub total_jobs: u64,
    pub total_messages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(interval_hours: u32, last_run: Option<DateTime<Utc>>) -> ScheduleEntry {
        ScheduleEntry {
            entry_id: 1,
            account_id: 7,
            chat: "news".to_string(),
            interval_hours,
            last_run,
            active: true,
        }
    }

    #[test]
    fn never_ran_is_due() {
        assert!(entry(24, None).is_due(Utc::now()));
    }

    #[test]
    fn due_exactly_at_interval_boundary() {
        let now = Utc::now();
        let last_run = now - Duration::hours(6);
        assert!(entry(6, Some(last_run)).is_due(now));
        assert!(!entry(6, Some(last_run + Duration::seconds(1))).is_due(now));
    }
}
