use crate::service::export::ExportError;
use crate::source::SourceError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Запрошено чатов: {requested}, лимит тарифа: {allowed}")]
    ChatCountExceeded { requested: usize, allowed: u32 },

    #[error("Scheduling is not available on the current plan")]
    SchedulingNotAllowed,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Other error: {0}")]
    Other(String),
}
