#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Chat not found: {0}")]
    ChatResolution(String),
    #[error("Transient source failure: {0}")]
    Transient(String),
    #[error("Sender resolution failed for message {0}")]
    SenderResolution(i64),
    #[error("Source connection error: {0}")]
    Connection(String),
    #[error("No chat history opened")]
    NoHistory,
}
