use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::export::ExportFormat;
use crate::service::extractor::TimeWindow;

/// Conversation state for the parse and schedule flows. Serializable so
/// the storage backend can be swapped for a persistent one.
#[derive(Clone, Default, Serialize, Deserialize, Debug)]
pub enum DialogueState {
    #[default]
    Start,

    // parse flow
    AwaitingChats,
    AwaitingPeriod {
        chats: Vec<String>,
    },
    AwaitingLimit {
        chats: Vec<String>,
        period: ExportPeriod,
    },
    AwaitingFormat {
        chats: Vec<String>,
        period: ExportPeriod,
        limit: u64,
    },

    // schedule flow
    AwaitingScheduleChat,
    AwaitingScheduleInterval {
        chat: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportPeriod {
    Today,
    Days7,
    Days30,
    Days90,
    All,
}

impl ExportPeriod {
    pub const ALL: [ExportPeriod; 5] = [
        ExportPeriod::Today,
        ExportPeriod::Days7,
        ExportPeriod::Days30,
        ExportPeriod::Days90,
        ExportPeriod::All,
    ];

    pub fn callback_key(&self) -> &'static str {
        match self {
            ExportPeriod::Today => "today",
            ExportPeriod::Days7 => "7d",
            ExportPeriod::Days30 => "30d",
            ExportPeriod::Days90 => "90d",
            ExportPeriod::All => "all",
        }
    }

    pub fn from_callback_key(key: &str) -> Option<ExportPeriod> {
        Self::ALL.iter().copied().find(|p| p.callback_key() == key)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportPeriod::Today => "📅 Сегодня",
            ExportPeriod::Days7 => "🗓 7 дней",
            ExportPeriod::Days30 => "🗓 30 дней",
            ExportPeriod::Days90 => "🗓 90 дней",
            ExportPeriod::All => "♾ Вся история",
        }
    }

    pub fn window(&self, now: DateTime<Utc>) -> TimeWindow {
        match self {
            ExportPeriod::Today => TimeWindow::last_days(1, now),
            ExportPeriod::Days7 => TimeWindow::last_days(7, now),
            ExportPeriod::Days30 => TimeWindow::last_days(30, now),
            ExportPeriod::Days90 => TimeWindow::last_days(90, now),
            ExportPeriod::All => TimeWindow::all(),
        }
    }
}

/// Limit choices offered in the parse flow; the quota layer clamps them
/// to the plan cap anyway.
pub const LIMIT_CHOICES: [u64; 6] = [100, 500, 1_000, 5_000, 10_000, 50_000];

/// Interval choices offered in the schedule flow.
pub const INTERVAL_CHOICES: [u32; 4] = [6, 12, 24, 72];

pub fn format_from_callback_key(key: &str) -> Option<ExportFormat> {
    match key {
        "xlsx" => Some(ExportFormat::Xlsx),
        "csv" => Some(ExportFormat::Csv),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn callback_keys_round_trip() {
        for period in ExportPeriod::ALL {
            assert_eq!(
                ExportPeriod::from_callback_key(period.callback_key()),
                Some(period)
            );
        }
        assert_eq!(ExportPeriod::from_callback_key("yesterday"), None);
    }

    #[test]
    fn windows_are_anchored_at_now() {
        let now = Utc::now();
        let window = ExportPeriod::Days7.window(now);
        assert_eq!(window.to, Some(now));
        assert_eq!(window.from, Some(now - Duration::days(7)));

        assert_eq!(ExportPeriod::All.window(now), TimeWindow::all());
    }
}
