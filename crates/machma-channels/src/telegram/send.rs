//! Message sending and command registration.

use super::{TelegramChannel, MAX_MESSAGE_LEN};
use crate::utils::{split_html, split_message};
use machma_core::{
    error::MachmaError,
    message::{ParseMode, Reply},
};
use tracing::{info, warn};

/// Commands shown in the Telegram autocomplete menu.
const BOT_COMMANDS: &[(&str, &str)] = &[
    ("help", "Diese Hilfe"),
    ("exercise", "Neue Übung mit optionalem Link"),
    ("alias", "Alias für eine Übung"),
    ("todos", "Deine Todos"),
    ("done", "Wiederholungen anrechnen"),
    ("exercises", "Übungsübersicht"),
];

impl TelegramChannel {
    /// Send a reply to a specific chat, split into chunks Telegram accepts.
    pub(crate) async fn send_text(&self, chat_id: i64, reply: &Reply) -> Result<(), MachmaError> {
        let url = format!("{}/sendMessage", self.base_url);

        let chunks = match reply.parse_mode {
            ParseMode::Html => split_html(&reply.text, MAX_MESSAGE_LEN),
            ParseMode::Plain => split_message(&reply.text, MAX_MESSAGE_LEN)
                .into_iter()
                .map(str::to_string)
                .collect(),
        };

        for chunk in &chunks {
            let body = send_message_body(chat_id, chunk, reply);

            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| MachmaError::Channel(format!("telegram send failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(MachmaError::Channel(format!(
                    "telegram send failed ({status}): {error_text}"
                )));
            }
        }

        Ok(())
    }

    /// Register bot commands with Telegram so users see an autocomplete menu.
    /// Best-effort: logs failures but does not propagate errors.
    pub(crate) async fn register_commands(&self) {
        let commands: Vec<_> = BOT_COMMANDS
            .iter()
            .map(|(command, description)| {
                serde_json::json!({ "command": command, "description": description })
            })
            .collect();
        let body = serde_json::json!({ "commands": commands });

        let url = format!("{}/setMyCommands", self.base_url);
        match self.client.post(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("registered Telegram bot commands");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to register Telegram bot commands: {body}");
            }
            Err(e) => {
                warn!("failed to register Telegram bot commands: {e}");
            }
        }
    }
}

/// JSON body of a `sendMessage` call.
pub(crate) fn send_message_body(chat_id: i64, text: &str, reply: &Reply) -> serde_json::Value {
    let mut body = serde_json::json!({
        "chat_id": chat_id,
        "text": text,
    });
    if reply.parse_mode == ParseMode::Html {
        body["parse_mode"] = "HTML".into();
    }
    if reply.disable_link_preview {
        body["disable_web_page_preview"] = true.into();
    }
    body
}
