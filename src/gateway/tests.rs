use super::*;
use async_trait::async_trait;
use machma_core::{config::StoreConfig, error::MachmaError, message::Sender};
use std::sync::Mutex;

/// Channel that records everything sent through it.
#[derive(Default)]
struct RecordingChannel {
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl RecordingChannel {
    fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.reply.text.clone())
            .collect()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "test"
    }

    fn bot_username(&self) -> Option<String> {
        Some("machma_bot".to_string())
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, MachmaError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), MachmaError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn stop(&self) -> Result<(), MachmaError> {
        Ok(())
    }
}

async fn test_gateway() -> (Gateway, Arc<RecordingChannel>) {
    let store = Store::new(&StoreConfig::in_memory()).await.unwrap();
    store
        .scoped(async |scope: &mut Scope| scope.seed_demo_data().await)
        .await
        .unwrap();

    let channel = Arc::new(RecordingChannel::default());
    let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
    channels.insert("test".to_string(), channel.clone());
    (Gateway::new(channels, store), channel)
}

fn message(user_id: i64, first_name: &str, text: &str) -> IncomingMessage {
    IncomingMessage {
        id: uuid::Uuid::new_v4(),
        channel: "test".to_string(),
        sender: Sender {
            id: user_id,
            first_name: first_name.to_string(),
            username: None,
            last_name: None,
        },
        text: text.to_string(),
        timestamp: chrono::Utc::now(),
        reply_target: Some("4711".to_string()),
    }
}

#[tokio::test]
async fn test_done_commits_and_announces() {
    let (gw, channel) = test_gateway().await;
    gw.handle_message(message(3, "Ada", "/done 40 Triceps")).await;

    assert_eq!(
        channel.texts(),
        vec!["10 weitere Dips von <a href=\"tg://user?id=3\">Ada</a>.".to_string()]
    );
    let sent = channel.sent.lock().unwrap();
    assert_eq!(sent[0].reply_target.as_deref(), Some("4711"));
    drop(sent);

    let stats = gw.store.stats().await.unwrap();
    assert_eq!(stats.users, 3, "sender registered");
    assert_eq!(stats.rep_rows, 6);
}

#[tokio::test]
async fn test_plain_text_is_ignored() {
    let (gw, channel) = test_gateway().await;
    gw.handle_message(message(1, "Eve", "hallo zusammen")).await;
    gw.handle_message(message(1, "Eve", "/unknown")).await;
    assert!(channel.texts().is_empty());
    assert_eq!(gw.store.stats().await.unwrap().users, 2);
}

#[tokio::test]
async fn test_failed_command_rolls_back() {
    let (gw, channel) = test_gateway().await;
    // "Triceps" is no exercise but already an alias, so the self-alias insert fails.
    gw.handle_message(message(1, "Eve", "/exercise Triceps")).await;

    assert_eq!(
        channel.texts(),
        vec![commands::SOMETHING_WENT_WRONG.to_string()]
    );
    let stats = gw.store.stats().await.unwrap();
    assert_eq!(stats.exercises, 3);
    assert_eq!(stats.aliases, 4);
}

#[tokio::test]
async fn test_commands_share_state_across_messages() {
    let (gw, channel) = test_gateway().await;
    gw.handle_message(message(1, "Eve", "/exercise Pushups")).await;
    gw.handle_message(message(1, "Eve", "/alias Liegestütze Pushups")).await;
    gw.handle_message(message(2, "John", "/getan 15 Liegestütze")).await;

    assert_eq!(
        channel.texts(),
        vec![
            "Ich kenne jetzt die Übung Pushups.".to_string(),
            "Liegestütze oder Pushups? Alles das gleiche!".to_string(),
            "15 weitere Pushups von <a href=\"tg://user?id=2\">John</a>.".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_command_for_other_bot_is_ignored() {
    let (gw, channel) = test_gateway().await;
    gw.handle_message(message(3, "Ada", "/done@some_other_bot 40 Triceps")).await;

    assert!(channel.texts().is_empty());
    let stats = gw.store.stats().await.unwrap();
    assert_eq!(stats.users, 2, "sender not registered");
    assert_eq!(stats.rep_rows, 5);

    gw.handle_message(message(3, "Ada", "/Done@machma_bot 40 Triceps")).await;
    assert_eq!(channel.texts().len(), 1);
    assert_eq!(gw.store.stats().await.unwrap().rep_rows, 6);
}
