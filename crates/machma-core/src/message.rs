use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the person who sent a message, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Platform-assigned numeric user id.
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
    pub last_name: Option<String>,
}

/// An incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "telegram").
    pub channel: String,
    pub sender: Sender,
    /// Message text content.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Platform-specific target for routing the response (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
}

/// How the receiving platform should interpret the text of a reply.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Plain,
    /// HTML subset: `<b>`, `<a href>`, `<pre>`.
    Html,
}

/// One reply fragment produced by a command handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default)]
    pub parse_mode: ParseMode,
    #[serde(default)]
    pub disable_link_preview: bool,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: ParseMode::Html,
            disable_link_preview: false,
        }
    }

    /// Suppress link previews for this reply.
    pub fn without_preview(mut self) -> Self {
        self.disable_link_preview = true;
        self
    }
}

/// An outgoing message to send back through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub reply: Reply,
    /// Platform-specific target for routing (e.g. Telegram chat_id).
    #[serde(default)]
    pub reply_target: Option<String>,
}

impl OutgoingMessage {
    /// Address a reply to wherever `incoming` came from.
    pub fn answer(incoming: &IncomingMessage, reply: Reply) -> Self {
        Self {
            reply,
            reply_target: incoming.reply_target.clone(),
        }
    }
}
