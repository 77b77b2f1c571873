//! Gateway: the main event loop connecting channels and the store.
//!
//! Messages from all channels are funneled into one queue and handled one at
//! a time, each command inside its own store transaction.

use crate::commands::{self, Command};
use machma_core::{
    message::{IncomingMessage, OutgoingMessage, Reply},
    traits::Channel,
};
use machma_store::{Scope, Store};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Routes messages between channels and the command layer.
pub struct Gateway {
    channels: HashMap<String, Arc<dyn Channel>>,
    store: Store,
}

impl Gateway {
    pub fn new(channels: HashMap<String, Arc<dyn Channel>>, store: Store) -> Self {
        Self { channels, store }
    }

    /// Run the main event loop until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        info!(
            "machma gateway running | channels: {}",
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
        );

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        loop {
            tokio::select! {
                Some(incoming) = rx.recv() => {
                    self.handle_message(incoming).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Run one command and send its replies.
    async fn handle_message(&self, incoming: IncomingMessage) {
        let bot_name = self
            .channels
            .get(&incoming.channel)
            .and_then(|channel| channel.bot_username());
        let Some(cmd) = Command::parse(&incoming.text, bot_name.as_deref()) else {
            debug!("ignoring non-command message from {}", incoming.sender.id);
            return;
        };
        let args = commands::args(&incoming.text);
        let sender = &incoming.sender;

        info!("{cmd:?} from {} ({})", sender.id, sender.first_name);

        let replies = match self
            .store
            .scoped(async |scope: &mut Scope| commands::handle(cmd, args, sender, scope).await)
            .await
        {
            Ok(replies) => replies,
            Err(e) => {
                error!("{cmd:?} from {} failed, rolled back: {e}", sender.id);
                vec![commands::error_reply(&e)]
            }
        };

        for reply in replies {
            self.send(&incoming, reply).await;
        }
    }

    /// Send a reply back to wherever `incoming` came from.
    async fn send(&self, incoming: &IncomingMessage, reply: Reply) {
        let Some(channel) = self.channels.get(&incoming.channel) else {
            warn!("no channel {} to answer on", incoming.channel);
            return;
        };
        if let Err(e) = channel.send(OutgoingMessage::answer(incoming, reply)).await {
            error!("failed to send message: {e}");
        }
    }

    /// Graceful shutdown: stop channels.
    async fn shutdown(&self) {
        info!("Shutting down...");

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        info!("Shutdown complete.");
    }
}

#[cfg(test)]
mod tests;
