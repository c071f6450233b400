use chrono::{DateTime, Utc};

/// A resolved chat, ready for history iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatHandle {
    pub id: i64,
    pub title: String,
}

/// One raw message as fetched from the source. `text` is empty for media
/// without a caption, service messages and the like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceMessage {
    pub id: i64,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SenderIdentity {
    pub display_name: String,
}
