use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 정렬된 사용자 쌍 (대화방 유일성 키)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPair {
    low: String,
    high: String,
}

impl UserPair {
    pub fn new(a: &str, b: &str) -> Result<Self, ValidationError> {
        if a == b {
            return Err(ValidationError::new(
                "user_ids",
                "자기 자신과는 대화할 수 없습니다.",
            ));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self {
            low: low.to_string(),
            high: high.to_string(),
        })
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn high(&self) -> &str {
        &self.high
    }
}

// 대화방 모델
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: i64,
    pub user_low: String,
    pub user_high: String,
    /// 사용자별 마지막으로 읽은 메시지 id
    #[sqlx(json)]
    pub last_read: HashMap<String, i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.user_low == user_id || self.user_high == user_id
    }

    /// 상대방 id
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        if self.user_low == user_id {
            Some(&self.user_high)
        } else if self.user_high == user_id {
            Some(&self.user_low)
        } else {
            None
        }
    }
}

// 메시지 모델 (timestamp는 저장소가 기록)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

// 내 대화 목록 항목
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub counterpart_id: String,
    pub counterpart_username: Option<String>,
    pub last_message: Option<Message>,
    pub unread: bool,
}
