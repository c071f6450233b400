use crate::service::account::AccountService;
use crate::service::plan::Plan;
use crate::service::ServiceError;

/// Per-job budget derived from the requesting account's effective plan.
/// The message cap is per chat, not an aggregate over the job.
#[derive(Clone, Copy, Debug)]
pub struct JobBudget {
    pub plan: &'static Plan,
    pub message_cap: u64,
}

#[derive(Clone)]
pub struct QuotaService {
    accounts: AccountService,
}

impl QuotaService {
    pub fn new(accounts: AccountService) -> Self {
        Self { accounts }
    }

    /// Too many chats is a hard error; a too-high message cap is clamped
    /// silently.
    pub async fn validate_job(
        &self,
        account_id: i64,
        chat_count: usize,
        requested_cap: u64,
    ) -> Result<JobBudget, ServiceError> {
        let plan = self.accounts.effective_plan(account_id).await?;

        if chat_count as u32 > plan.chat_cap {
            return Err(ServiceError::ChatCountExceeded {
                requested: chat_count,
                allowed: plan.chat_cap,
            });
        }

        Ok(JobBudget {
            plan,
            message_cap: requested_cap.min(plan.message_cap),
        })
    }

    /// Checked at schedule creation only; existing schedules are not
    /// re-authorized later.
    pub async fn authorize_schedule(&self, account_id: i64) -> Result<(), ServiceError> {
        let plan = self.accounts.effective_plan(account_id).await?;

        if !plan.scheduling_enabled {
            return Err(ServiceError::SchedulingNotAllowed);
        }

        Ok(())
    }
}
