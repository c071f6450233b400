use reqwest::Client;
use std::time::Duration;

/// Long-poll friendly client for the Bot API.
pub fn create_telegram_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .user_agent("TelegramBot/1.0")
        .build()
        .expect("Failed to build Telegram HTTP client")
}
