/// 대화 / 메시지 중계
/// 1. 대화방 조회 또는 생성 (정렬된 사용자 쌍 기준)
/// 2. 메시지 전송
/// 3. 메시지 / 대화 목록 조회, 읽음 표시
// region:    --- Imports
use crate::error::{AppError, ValidationError};
use crate::messaging::model::{Conversation, ConversationSummary, Message, UserPair};
use crate::notify::{publish_or_warn, ChangeEvent, ChangeNotifier};
use crate::store::{ConversationRepository, UserRepository};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

#[derive(Clone)]
pub struct MessageRelay {
    conversations: Arc<dyn ConversationRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl MessageRelay {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            conversations,
            users,
            notifier,
        }
    }

    /// 1. 대화방 조회 또는 생성
    pub async fn get_or_create_conversation(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Conversation, AppError> {
        let pair = UserPair::new(user_a, user_b)?;
        if let Some(existing) = self.conversations.find_by_pair(&pair).await? {
            return Ok(existing);
        }
        for user_id in [pair.low(), pair.high()] {
            if self.users.find_by_id(user_id).await?.is_none() {
                return Err(AppError::not_found("사용자", user_id));
            }
        }
        info!(
            "{:<12} --> 대화방 생성: {} <-> {}",
            "Relay",
            pair.low(),
            pair.high()
        );
        self.conversations.create_if_absent(&pair).await
    }

    pub async fn get_conversation(&self, conversation_id: i64) -> Result<Conversation, AppError> {
        self.conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("대화", conversation_id))
    }

    /// 2. 메시지 전송
    pub async fn post_message(
        &self,
        conversation_id: i64,
        sender_id: &str,
        text: &str,
    ) -> Result<Message, AppError> {
        if text.trim().is_empty() {
            return Err(ValidationError::new("text", "메시지를 입력하세요.").into());
        }
        let conversation = self.get_conversation(conversation_id).await?;
        if !conversation.has_member(sender_id) {
            return Err(ValidationError::new("sender_id", "대화 참여자만 메시지를 보낼 수 있습니다.").into());
        }

        let message = self
            .conversations
            .append_message(conversation.id, sender_id, text)
            .await?;
        publish_or_warn(
            self.notifier.as_ref(),
            ChangeEvent::MessagePosted {
                conversation_id: conversation.id,
                message_id: message.id,
                sender_id: message.sender_id.clone(),
                timestamp: message.timestamp,
            },
        )
        .await;
        Ok(message)
    }

    /// 3. 메시지 목록 (오래된 순)
    pub async fn messages(&self, conversation_id: i64) -> Result<Vec<Message>, AppError> {
        let conversation = self.get_conversation(conversation_id).await?;
        self.conversations.list_messages(conversation.id).await
    }

    /// 내 대화 목록
    pub async fn conversations_for(&self, user_id: &str) -> Result<Vec<ConversationSummary>, AppError> {
        let conversations = self.conversations.list_for_user(user_id).await?;
        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let Some(counterpart_id) = conversation.counterpart_of(user_id).map(str::to_string) else {
                continue;
            };
            let counterpart_username = self
                .users
                .find_by_id(&counterpart_id)
                .await?
                .map(|u| u.username);
            let last_message = self.conversations.last_message(conversation.id).await?;
            let unread = match &last_message {
                Some(m) if m.sender_id != user_id => {
                    conversation.last_read.get(user_id).copied() < Some(m.id)
                }
                _ => false,
            };
            summaries.push(ConversationSummary {
                conversation,
                counterpart_id,
                counterpart_username,
                last_message,
                unread,
            });
        }
        Ok(summaries)
    }

    /// 읽음 표시
    pub async fn mark_read(
        &self,
        conversation_id: i64,
        user_id: &str,
        message_id: i64,
    ) -> Result<(), AppError> {
        let conversation = self.get_conversation(conversation_id).await?;
        if !conversation.has_member(user_id) {
            return Err(ValidationError::new("user_id", "대화 참여자가 아닙니다.").into());
        }
        // 읽음 기준은 메시지 id 비교이므로 이 대화의 메시지만 허용
        if self
            .conversations
            .find_message(conversation.id, message_id)
            .await?
            .is_none()
        {
            return Err(ValidationError::new("message_id", "이 대화의 메시지가 아닙니다.").into());
        }
        self.conversations
            .set_last_read(conversation.id, user_id, message_id)
            .await?;
        Ok(())
    }
}
