//! Telegram notifications for executed entries

use serde::Serialize;
use tracing::warn;

use crate::config::TelegramConfig;
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Posts entry announcements to a Telegram channel
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
    channel: String,
}

impl TelegramNotifier {
    /// Build a notifier when enabled and credentialed, `None` otherwise
    pub fn from_config(config: &TelegramConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let bot_token = if config.bot_token.is_empty() {
            match std::env::var("TELEGRAM_BOT_TOKEN") {
                Ok(token) => token,
                Err(_) => {
                    warn!("Telegram enabled but no bot token configured");
                    return None;
                }
            }
        } else {
            config.bot_token.clone()
        };

        Some(Self {
            client: reqwest::Client::new(),
            bot_token,
            channel: config.channel.clone(),
        })
    }

    /// Send one message; failures are reported to the caller for logging
    pub async fn send(&self, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let resp = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: &self.channel,
                text,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Notify(format!("sendMessage {status}: {body}")));
        }
        Ok(())
    }

    /// Announcement for a bought pool, with its boost count
    pub fn entry_message(pool_address: &str, boost: u32) -> String {
        format!("{boost}⚡: {pool_address}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_yields_none() {
        let config = TelegramConfig::default();
        assert!(TelegramNotifier::from_config(&config).is_none());
    }

    #[test]
    fn test_entry_message_format() {
        assert_eq!(
            TelegramNotifier::entry_message("PooL111", 3),
            "3⚡: PooL111"
        );
    }
}
