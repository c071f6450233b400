pub mod account;
pub mod delivery;
pub mod dialogue;
mod error;
pub mod export;
pub mod extractor;
pub mod plan;
pub mod quota;
pub mod schedule;

pub use error::ServiceError;

use std::sync::Arc;

use account::AccountService;
use delivery::Delivery;
use extractor::ExtractorService;
use quota::QuotaService;
use schedule::ScheduleService;

use crate::source::ChatSource;
use crate::storage::AccountStore;

#[derive(Clone)]
pub struct ServiceRegistry {
    pub account: AccountService,
    pub quota: QuotaService,
    pub extractor: ExtractorService,
    pub schedule: ScheduleService,
}

impl ServiceRegistry {
    pub fn new(
        store: Arc<dyn AccountStore>,
        source: Arc<dyn ChatSource>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        let account = AccountService::new(store);
        let quota = QuotaService::new(account.clone());
        let extractor = ExtractorService::new(source);
        let schedule = ScheduleService::new(account.clone(), extractor.clone(), delivery);

        Self {
            account,
            quota,
            extractor,
            schedule,
        }
    }
}
