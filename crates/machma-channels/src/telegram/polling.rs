//! Long-polling update loop and Channel trait implementation.

use super::types::{TgResponse, TgUpdate, TgUser};
use super::TelegramChannel;
use async_trait::async_trait;
use machma_core::{
    error::MachmaError,
    message::{IncomingMessage, OutgoingMessage, Sender},
    traits::Channel,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const MAX_BACKOFF_SECS: u64 = 60;

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn bot_username(&self) -> Option<String> {
        self.bot_username.get().cloned()
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, MachmaError> {
        let username = self.fetch_bot_username().await?;
        info!("Telegram bot is @{username}");
        // Already set on a restart; the name does not change.
        let _ = self.bot_username.set(username);

        self.register_commands().await;

        if self.config.skip_updates {
            self.skip_pending_updates().await?;
        }

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let allowed_users = self.config.allowed_users.clone();
        let last_update_id = self.last_update_id.clone();

        info!("Telegram channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let offset = last_update_id.lock().await.map(|id| id + 1);

                let mut url = format!("{base_url}/getUpdates?timeout=30");
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let resp = match client
                    .get(&url)
                    .timeout(Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("telegram poll error (retry in {backoff_secs}s): {e}");
                        backoff_secs = backoff(backoff_secs).await;
                        continue;
                    }
                };

                let body: TgResponse<Vec<TgUpdate>> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("telegram parse error (retry in {backoff_secs}s): {e}");
                        backoff_secs = backoff(backoff_secs).await;
                        continue;
                    }
                };

                if !body.ok {
                    error!(
                        "telegram API error (retry in {backoff_secs}s): {}",
                        body.description.unwrap_or_default()
                    );
                    backoff_secs = backoff(backoff_secs).await;
                    continue;
                }

                backoff_secs = 1;

                let updates = body.result.unwrap_or_default();

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let Some(incoming) = to_incoming(update, &allowed_users) else {
                        continue;
                    };
                    if tx.send(incoming).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), MachmaError> {
        let chat_id_str = message
            .reply_target
            .as_deref()
            .ok_or_else(|| MachmaError::Channel("no reply_target on outgoing message".into()))?;

        let chat_id: i64 = chat_id_str.parse().map_err(|e| {
            MachmaError::Channel(format!("invalid telegram chat_id '{chat_id_str}': {e}"))
        })?;

        self.send_text(chat_id, &message.reply).await
    }

    async fn stop(&self) -> Result<(), MachmaError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}

impl TelegramChannel {
    /// Ask `getMe` who we are, so `/cmd@name` mentions can be checked.
    async fn fetch_bot_username(&self) -> Result<String, MachmaError> {
        let url = format!("{}/getMe", self.base_url);
        let body: TgResponse<TgUser> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MachmaError::Channel(format!("telegram getMe failed: {e}")))?
            .json()
            .await
            .map_err(|e| MachmaError::Channel(format!("telegram getMe parse: {e}")))?;
        bot_username_from(body)
    }

    /// Acknowledge everything that queued up while the bot was offline.
    ///
    /// `offset=-1` returns only the newest update; remembering its id makes
    /// the first real poll confirm and drop the whole backlog.
    async fn skip_pending_updates(&self) -> Result<(), MachmaError> {
        let url = format!("{}/getUpdates?offset=-1&timeout=0", self.base_url);
        let body: TgResponse<Vec<TgUpdate>> = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MachmaError::Channel(format!("telegram skip_updates failed: {e}")))?
            .json()
            .await
            .map_err(|e| MachmaError::Channel(format!("telegram skip_updates parse: {e}")))?;

        if !body.ok {
            return Err(MachmaError::Channel(format!(
                "telegram skip_updates rejected: {}",
                body.description.unwrap_or_default()
            )));
        }

        if let Some(last) = body.result.unwrap_or_default().last() {
            *self.last_update_id.lock().await = Some(last.update_id);
            info!("skipping pending telegram updates up to {}", last.update_id);
        }
        Ok(())
    }
}

/// Extract the bot's username from a `getMe` response.
pub(crate) fn bot_username_from(body: TgResponse<TgUser>) -> Result<String, MachmaError> {
    if !body.ok {
        return Err(MachmaError::Channel(format!(
            "telegram getMe rejected: {}",
            body.description.unwrap_or_default()
        )));
    }
    body.result
        .and_then(|user| user.username)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| MachmaError::Channel("telegram getMe returned no username".into()))
}

/// Sleep for the current backoff and return the next one.
async fn backoff(secs: u64) -> u64 {
    tokio::time::sleep(Duration::from_secs(secs)).await;
    (secs * 2).min(MAX_BACKOFF_SECS)
}

/// Turn a raw update into an incoming message.
///
/// Only text messages from a human sender pass; when `allowed_users` is not
/// empty the sender must be in it.
pub(crate) fn to_incoming(update: TgUpdate, allowed_users: &[i64]) -> Option<IncomingMessage> {
    let msg = update.message?;
    let text = msg.text?;
    let user = msg.from?;

    if user.is_bot {
        debug!("ignoring message from bot {}", user.id);
        return None;
    }

    if !allowed_users.is_empty() && !allowed_users.contains(&user.id) {
        warn!("ignoring message from unauthorized user {}", user.id);
        return None;
    }

    debug!(
        "telegram {} chat {}: update {}",
        msg.chat.chat_type, msg.chat.id, update.update_id
    );

    Some(IncomingMessage {
        id: Uuid::new_v4(),
        channel: "telegram".to_string(),
        sender: Sender {
            id: user.id,
            first_name: user.first_name,
            username: user.username,
            last_name: user.last_name,
        },
        text,
        timestamp: chrono::Utc::now(),
        reply_target: Some(msg.chat.id.to_string()),
    })
}
