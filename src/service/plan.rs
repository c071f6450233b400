use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PAID_TIER_DAYS: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Basic,
    Pro,
    Max,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Basic => "basic",
            Tier::Pro => "pro",
            Tier::Max => "max",
        }
    }

    /// Unknown keys fall back to the free tier.
    pub fn from_key(key: &str) -> Tier {
        match key {
            "basic" => Tier::Basic,
            "pro" => Tier::Pro,
            "max" => Tier::Max,
            _ => Tier::Free,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Plan {
    pub tier: Tier,
    pub display_name: &'static str,
    pub price_stars: u32,
    pub message_cap: u64,
    pub chat_cap: u32,
    pub scheduling_enabled: bool,
}

pub const PLANS: [Plan; 4] = [
    Plan {
        tier: Tier::Free,
        display_name: "🆓 FREE",
        price_stars: 0,
        message_cap: 100,
        chat_cap: 1,
        scheduling_enabled: false,
    },
    Plan {
        tier: Tier::Basic,
        display_name: "⚡ BASIC",
        price_stars: 50,
        message_cap: 1_000,
        chat_cap: 3,
        scheduling_enabled: false,
    },
    Plan {
        tier: Tier::Pro,
        display_name: "🚀 PRO",
        price_stars: 150,
        message_cap: 10_000,
        chat_cap: 10,
        scheduling_enabled: true,
    },
    Plan {
        tier: Tier::Max,
        display_name: "💎 MAX",
        price_stars: 400,
        message_cap: 50_000,
        chat_cap: 999,
        scheduling_enabled: true,
    },
];

/// Total over all tiers; `PLANS[0]` is the free fallback.
pub fn resolve(tier: Tier) -> &'static Plan {
    PLANS.iter().find(|plan| plan.tier == tier).unwrap_or(&PLANS[0])
}

/// A paid tier holds until its expiry passes; an expired or absent expiry
/// degrades to free. The stored row is never rewritten on read.
pub fn effective_tier(stored: Tier, until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Tier {
    match (stored, until) {
        (Tier::Free, _) => Tier::Free,
        (tier, Some(until)) if until >= now => tier,
        (_, Some(_)) => Tier::Free,
        (tier, None) => tier,
    }
}
