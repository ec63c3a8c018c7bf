/// 변경 알림
/// 1. 변경 이벤트 모델
/// 2. 프로세스 내 발행/구독 허브
/// 3. 발행 포트 (ChangeNotifier)
// region:    --- Imports
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// endregion: --- Imports

// region:    --- Change Event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    AuctionCreated {
        auction_id: i64,
        created_by: String,
        timestamp: DateTime<Utc>,
    },
    BidPlaced {
        auction_id: i64,
        bidder_id: String,
        amount: i64,
        timestamp: DateTime<Utc>,
    },
    AuctionFinished {
        auction_id: i64,
        timestamp: DateTime<Utc>,
    },
    MessagePosted {
        conversation_id: i64,
        message_id: i64,
        sender_id: String,
        timestamp: DateTime<Utc>,
    },
    UserVerified {
        user_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl ChangeEvent {
    pub fn topic(&self) -> Topic {
        match self {
            ChangeEvent::AuctionCreated { auction_id, .. }
            | ChangeEvent::BidPlaced { auction_id, .. }
            | ChangeEvent::AuctionFinished { auction_id, .. } => Topic::Auction(*auction_id),
            ChangeEvent::MessagePosted {
                conversation_id, ..
            } => Topic::Conversation(*conversation_id),
            ChangeEvent::UserVerified { user_id, .. } => Topic::User(user_id.clone()),
        }
    }
}

/// 구독 대상 문서
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Auction(i64),
    Conversation(i64),
    User(String),
    All,
}

impl Topic {
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        match self {
            Topic::All => true,
            topic => *topic == event.topic(),
        }
    }

    /// 메시지 브로커 키
    pub fn key(&self) -> String {
        match self {
            Topic::Auction(id) => format!("auctions/{}", id),
            Topic::Conversation(id) => format!("conversations/{}", id),
            Topic::User(id) => format!("users/{}", id),
            Topic::All => "*".to_string(),
        }
    }
}
// endregion: --- Change Event

// region:    --- Notifier Port
/// 변경 발행 포트
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn publish(&self, event: ChangeEvent) -> Result<(), AppError>;
}

/// 발행 실패는 호출한 연산을 실패시키지 않는다
pub async fn publish_or_warn(notifier: &dyn ChangeNotifier, event: ChangeEvent) {
    if let Err(e) = notifier.publish(event).await {
        warn!("{:<12} --> 변경 알림 발행 실패: {}", "Notify", e);
    }
}
// endregion: --- Notifier Port

// region:    --- Change Hub
/// 프로세스 내 발행/구독 허브
#[derive(Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 로컬 구독자에게 전달 (구독자가 없어도 성공)
    pub fn publish_local(&self, event: ChangeEvent) {
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!("{:<12} --> 로컬 구독자 {}명에게 전달", "Notify", delivered);
    }

    /// 현재 활성 구독 수
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// 토픽 구독. 반환된 Subscription을 해제하거나 drop하면 콜백이 더 이상 호출되지 않는다.
    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> Subscription
    where
        F: Fn(ChangeEvent) + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if topic.matches(&event) => callback(event),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            "{:<12} --> 구독자가 {}개의 이벤트를 놓쳤습니다: {}",
                            "Notify",
                            skipped,
                            topic.key()
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Subscription { task }
    }
}

#[async_trait]
impl ChangeNotifier for ChangeHub {
    async fn publish(&self, event: ChangeEvent) -> Result<(), AppError> {
        self.publish_local(event);
        Ok(())
    }
}

/// 구독 핸들
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
// endregion: --- Change Hub
