use super::{DeliveryChannel, DeliveryError};
use crate::config::TelegramConfig;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const REJECTION_BODY_LIMIT: usize = 2000;

#[derive(Debug, Clone)]
struct TelegramCredentials {
    bot_token: String,
    chat_id: String,
}

/// Telegram Bot API channel posting `sendMessage` with HTML parse mode to a
/// preconfigured chat. Constructed without credentials it stays inert and
/// reports every attempt as [`DeliveryError::NotConfigured`].
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    client: reqwest::Client,
    credentials: Option<TelegramCredentials>,
}

impl TelegramChannel {
    pub fn from_config(config: &TelegramConfig) -> Self {
        let credentials = match (&config.bot_token, &config.chat_id) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramCredentials {
                bot_token: bot_token.clone(),
                chat_id: chat_id.clone(),
            }),
            _ => None,
        };

        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(DeliveryError::NotConfigured)?;

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            credentials.bot_token
        );

        let response = self
            .client
            .post(&url)
            .timeout(SEND_TIMEOUT)
            .json(&json!({
                "chat_id": credentials.chat_id,
                "text": message,
                "parse_mode": "HTML",
            }))
            .send()
            .await
            .map_err(|source| DeliveryError::Transport { source })?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(REJECTION_BODY_LIMIT)
                .collect();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
