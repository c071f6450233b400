pub mod http;

use once_cell::sync::Lazy;
use regex::Regex;
use teloxide::types::UserId;
use url::Url;

use crate::error::BotResult;
use crate::state::AppState;

static CHAT_USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{3,31}$").expect("Invalid chat username regex"));

pub fn is_admin(user_id: UserId) -> BotResult<bool> {
    let state = AppState::get()?;
    Ok(state.config.admin.telegram_user_id == user_id)
}

/// Accepts `@channel`, `channel` or a `t.me/channel` link and returns the
/// bare username, or `None` when the input cannot name a public chat.
pub fn normalize_chat_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        let url = Url::parse(trimmed).ok()?;
        if !matches!(url.host_str(), Some("t.me") | Some("telegram.me")) {
            return None;
        }
        url.path_segments()?.next()?.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("t.me/") {
        rest.split('/').next()?.to_string()
    } else {
        trimmed.trim_start_matches('@').to_string()
    };

    if CHAT_USERNAME_REGEX.is_match(&candidate) {
        Some(candidate)
    } else {
        None
    }
}

/// Splits the comma-separated chat list a user types in the parse flow.
pub fn split_chat_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_usernames_and_links() {
        assert_eq!(
            normalize_chat_identifier("@durov_channel"),
            Some("durov_channel".to_string())
        );
        assert_eq!(
            normalize_chat_identifier("durov_channel"),
            Some("durov_channel".to_string())
        );
        assert_eq!(
            normalize_chat_identifier("https://t.me/durov_channel"),
            Some("durov_channel".to_string())
        );
        assert_eq!(
            normalize_chat_identifier("t.me/durov_channel/123"),
            Some("durov_channel".to_string())
        );
    }

    #[test]
    fn rejects_invalid_identifiers() {
        assert_eq!(normalize_chat_identifier(""), None);
        assert_eq!(normalize_chat_identifier("ab"), None);
        assert_eq!(normalize_chat_identifier("has spaces"), None);
        assert_eq!(normalize_chat_identifier("https://example.com/chat"), None);
    }

    #[test]
    fn splits_chat_lists_with_noise() {
        assert_eq!(
            split_chat_list(" @one, two ,, t.me/three "),
            vec!["@one", "two", "t.me/three"]
        );
        assert!(split_chat_list("  ,  ").is_empty());
    }
}
