use crate::{
    error::MachmaError,
    message::{IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;

/// Messaging Channel trait.
///
/// Every messaging platform implements this trait to receive and send
/// messages. The gateway only ever talks to channels through it.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// The bot's own username on this platform, once known.
    /// Commands mentioning any other name are ignored.
    fn bot_username(&self) -> Option<String> {
        None
    }

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, MachmaError>;

    /// Send a response back through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), MachmaError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), MachmaError>;
}
