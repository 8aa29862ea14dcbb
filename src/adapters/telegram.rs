//! Telegram Bot API notifications
//!
//! Posts signal messages to a channel and deletes them again by message id.

use crate::config::TelegramConfig;
use crate::domain::MessageHandle;
use crate::error::{Result, SignalError};
use crate::strategy::error_text;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Where formatted messages go
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Post a message; `None` when the sink could not be reached
    async fn post(&self, text: &str) -> Option<MessageHandle>;

    /// Best-effort delete, failures are ignored
    async fn delete(&self, handle: MessageHandle);
}

/// Telegram notification client
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Serialize)]
struct DeleteMessage<'a> {
    chat_id: &'a str,
    message_id: i64,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Arc<Self>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Arc::new(Self {
            client,
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }))
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// Check that the bot token is accepted
    pub async fn verify(&self) -> Result<String> {
        let resp = self.client.get(self.api_url("getMe")).send().await?;
        let status = resp.status();
        let body: Value = resp.json().await?;

        if !status.is_success() || body.get("ok").and_then(Value::as_bool) != Some(true) {
            return Err(SignalError::Notification(format!(
                "getMe rejected (HTTP {}): {}",
                status,
                describe(&body)
            )));
        }

        let username = body
            .get("result")
            .and_then(|r| r.get("username"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        info!("Telegram bot verified: @{}", username);
        Ok(username)
    }

    /// Send an HTML message and return its id
    pub async fn send_message(&self, text: &str) -> Result<MessageHandle> {
        let message = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
        };

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&message)
            .send()
            .await?;

        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            return Err(SignalError::Notification(format!(
                "sendMessage failed (HTTP {}): {}",
                status,
                describe(&body)
            )));
        }

        body.get("result")
            .and_then(|r| r.get("message_id"))
            .and_then(Value::as_i64)
            .map(MessageHandle)
            .ok_or_else(|| {
                SignalError::Notification("sendMessage response missing message_id".to_string())
            })
    }

    /// Delete a message by id
    pub async fn delete_message(&self, handle: MessageHandle) -> Result<()> {
        let message = DeleteMessage {
            chat_id: &self.chat_id,
            message_id: handle.0,
        };

        self.client
            .post(self.api_url("deleteMessage"))
            .json(&message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Send error notification
    pub async fn notify_error(&self, err: &str) {
        if let Err(e) = self.send_message(&error_text(err)).await {
            error!("Failed to send error notification: {}", e);
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn post(&self, text: &str) -> Option<MessageHandle> {
        match self.send_message(text).await {
            Ok(handle) => {
                debug!("Telegram message sent: {}", handle);
                Some(handle)
            }
            Err(e) => {
                error!("Telegram message failed: {}", e);
                None
            }
        }
    }

    async fn delete(&self, handle: MessageHandle) {
        if let Err(e) = self.delete_message(handle).await {
            debug!("Ignoring failed delete of {}: {}", handle, e);
        }
    }
}

fn describe(body: &Value) -> String {
    body.get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}
