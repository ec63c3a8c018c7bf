mod common;

use auction_light::error::AppError;
use auction_light::notify::{ChangeEvent, Topic};
use auction_light::store::ConversationRepository;
use chrono::Duration;
use common::Harness;
use std::time::Duration as StdDuration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// 어느 쪽에서 열어도 같은 대화방
#[tokio::test]
async fn test_conversation_is_unique_per_pair() {
    let h = Harness::new();
    h.user("alice", false).await;
    h.user("bob", false).await;

    let first = h.state.relay.get_or_create_conversation("alice", "bob").await.unwrap();
    let second = h.state.relay.get_or_create_conversation("bob", "alice").await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(first.user_low, "alice");
    assert_eq!(first.user_high, "bob");
}

#[tokio::test]
async fn test_concurrent_open_creates_one_conversation() {
    let h = Harness::new();
    h.user("alice", false).await;
    h.user("bob", false).await;

    let mut tasks = Vec::new();
    for i in 0..8 {
        let relay = h.state.relay.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                relay.get_or_create_conversation("alice", "bob").await
            } else {
                relay.get_or_create_conversation("bob", "alice").await
            }
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(h.stores.conversations.list_for_user("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_self_conversation_and_unknown_user() {
    let h = Harness::new();
    h.user("alice", false).await;

    let own = h.state.relay.get_or_create_conversation("alice", "alice").await;
    assert!(matches!(own, Err(AppError::Validation(_))));

    let ghost = h.state.relay.get_or_create_conversation("alice", "ghost").await;
    assert!(matches!(ghost, Err(AppError::NotFound { .. })));
}

#[tokio::test]
async fn test_messages_are_ordered_and_published() {
    let h = Harness::new();
    h.user("alice", false).await;
    h.user("bob", false).await;
    let conversation = h.state.relay.get_or_create_conversation("alice", "bob").await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _subscription = h.hub.subscribe(Topic::Conversation(conversation.id), move |event| {
        let _ = tx.send(event);
    });

    let hello = h.state.relay.post_message(conversation.id, "alice", "Is it still available?").await.unwrap();
    h.clock.advance(Duration::seconds(30));
    let reply = h.state.relay.post_message(conversation.id, "bob", "Yes").await.unwrap();
    assert!(hello.timestamp <= reply.timestamp);

    let texts: Vec<String> = h
        .state
        .relay
        .messages(conversation.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(texts, vec!["Is it still available?", "Yes"]);

    let event = timeout(StdDuration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    assert!(matches!(
        event,
        ChangeEvent::MessagePosted { message_id, .. } if message_id == hello.id
    ));
}

#[tokio::test]
async fn test_message_rules() {
    let h = Harness::new();
    h.user("alice", false).await;
    h.user("bob", false).await;
    h.user("mallory", false).await;
    let conversation = h.state.relay.get_or_create_conversation("alice", "bob").await.unwrap();

    let blank = h.state.relay.post_message(conversation.id, "alice", "   ").await;
    assert!(matches!(blank, Err(AppError::Validation(_))));

    let outsider = h.state.relay.post_message(conversation.id, "mallory", "hi").await;
    assert!(matches!(outsider, Err(AppError::Validation(_))));

    let missing = h.state.relay.post_message(999, "alice", "hi").await;
    assert!(matches!(missing, Err(AppError::NotFound { .. })));
}

#[tokio::test]
async fn test_conversation_summaries_track_unread() {
    let h = Harness::new();
    h.user("alice", false).await;
    h.user("bob", false).await;
    let conversation = h.state.relay.get_or_create_conversation("alice", "bob").await.unwrap();

    let message = h.state.relay.post_message(conversation.id, "alice", "Hello").await.unwrap();

    let bob_view = h.state.relay.conversations_for("bob").await.unwrap();
    assert_eq!(bob_view.len(), 1);
    assert_eq!(bob_view[0].counterpart_id, "alice");
    assert_eq!(bob_view[0].counterpart_username.as_deref(), Some("alice"));
    assert_eq!(bob_view[0].last_message.as_ref().map(|m| m.id), Some(message.id));
    assert!(bob_view[0].unread);

    // 보낸 사람에게는 읽지 않은 메시지가 아니다
    let alice_view = h.state.relay.conversations_for("alice").await.unwrap();
    assert!(!alice_view[0].unread);

    h.state.relay.mark_read(conversation.id, "bob", message.id).await.unwrap();
    let bob_view = h.state.relay.conversations_for("bob").await.unwrap();
    assert!(!bob_view[0].unread);
}

/// 다른 대화나 없는 메시지로는 읽음 위치를 옮길 수 없다
#[tokio::test]
async fn test_mark_read_rejects_foreign_message() {
    let h = Harness::new();
    h.user("alice", false).await;
    h.user("bob", false).await;
    h.user("carol", false).await;
    let ours = h.state.relay.get_or_create_conversation("alice", "bob").await.unwrap();
    let other = h.state.relay.get_or_create_conversation("alice", "carol").await.unwrap();
    let elsewhere = h.state.relay.post_message(other.id, "alice", "Hi Carol").await.unwrap();

    for message_id in [1_000_000, elsewhere.id] {
        let result = h.state.relay.mark_read(ours.id, "bob", message_id).await;
        assert!(matches!(result, Err(AppError::Validation(ref e)) if e.field == "message_id"));
    }

    h.state.relay.post_message(ours.id, "alice", "Still there?").await.unwrap();
    let bob_view = h.state.relay.conversations_for("bob").await.unwrap();
    assert!(bob_view[0].unread);
}
