/// 영속성 포트
/// 도메인 로직이 필요로 하는 저장소 연산만 정의한다.
/// 구현체: PostgreSQL (database 모듈), 인메모리 (memory 모듈)
// region:    --- Imports
use crate::auction::model::{Auction, NewAuction};
use crate::bidding::model::{Bid, BidUpdate, NewBid};
use crate::error::AppError;
use crate::messaging::model::{Conversation, Message, UserPair};
use crate::users::model::{NewUser, ProfilePatch, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod memory;

// endregion: --- Imports

// region:    --- Repository Traits
#[async_trait]
pub trait AuctionRepository: Send + Sync {
    async fn insert(&self, auction: NewAuction) -> Result<Auction, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Auction>, AppError>;
    /// 최신 등록순
    async fn list_all(&self) -> Result<Vec<Auction>, AppError>;
    async fn list_by_creator(&self, user_id: &str) -> Result<Vec<Auction>, AppError>;
    async fn list_by_winner(&self, user_id: &str) -> Result<Vec<Auction>, AppError>;
    /// 종료 시각이 지났지만 아직 finished가 아닌 경매
    async fn list_due_unfinished(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, AppError>;
    /// 저장된 현재 입찰가가 expected_bid와 같고 경매가 진행 중일 때만 갱신.
    /// 조건이 맞지 않으면 None.
    async fn compare_and_set_bid(&self, update: BidUpdate) -> Result<Option<Auction>, AppError>;
    /// finished = false 이고 종료 시각이 지났을 때만 true로 전이. 전이했으면 true.
    async fn mark_finished(&self, id: i64, now: DateTime<Utc>) -> Result<bool, AppError>;
}

#[async_trait]
pub trait BidLedger: Send + Sync {
    async fn append(&self, bid: NewBid) -> Result<Bid, AppError>;
    /// 최신순
    async fn list_by_auction(&self, auction_id: i64) -> Result<Vec<Bid>, AppError>;
    /// 최신순
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Bid>, AppError>;
    async fn highest_for_auction(&self, auction_id: i64) -> Result<Option<Bid>, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<Option<User>, AppError>;
    /// 단방향 (false -> true)
    async fn mark_verified(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Conversation>, AppError>;
    async fn find_by_pair(&self, pair: &UserPair) -> Result<Option<Conversation>, AppError>;
    /// 같은 쌍에 대한 동시 생성은 하나로 합쳐진다
    async fn create_if_absent(&self, pair: &UserPair) -> Result<Conversation, AppError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Conversation>, AppError>;
    /// 타임스탬프는 저장소가 기록한다
    async fn append_message(
        &self,
        conversation_id: i64,
        sender_id: &str,
        text: &str,
    ) -> Result<Message, AppError>;
    /// 오래된 순
    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>, AppError>;
    /// 해당 대화에 속한 메시지만 찾는다
    async fn find_message(
        &self,
        conversation_id: i64,
        message_id: i64,
    ) -> Result<Option<Message>, AppError>;
    async fn last_message(&self, conversation_id: i64) -> Result<Option<Message>, AppError>;
    async fn set_last_read(
        &self,
        conversation_id: i64,
        user_id: &str,
        message_id: i64,
    ) -> Result<bool, AppError>;
}
// endregion: --- Repository Traits

// region:    --- Stores
/// 저장소 묶음
#[derive(Clone)]
pub struct Stores {
    pub auctions: Arc<dyn AuctionRepository>,
    pub bids: Arc<dyn BidLedger>,
    pub users: Arc<dyn UserRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
}

impl Stores {
    /// 하나의 구현체가 모든 저장소 역할을 할 때
    pub fn from_single<S>(store: Arc<S>) -> Self
    where
        S: AuctionRepository + BidLedger + UserRepository + ConversationRepository + 'static,
    {
        Self {
            auctions: store.clone(),
            bids: store.clone(),
            users: store.clone(),
            conversations: store,
        }
    }
}
// endregion: --- Stores
