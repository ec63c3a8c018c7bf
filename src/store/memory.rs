/// 인메모리 저장소
/// PostgreSQL 구현과 같은 조건부 갱신 규칙을 하나의 락 안에서 적용한다.
// region:    --- Imports
use super::{AuctionRepository, BidLedger, ConversationRepository, UserRepository};
use crate::auction::model::{Auction, NewAuction};
use crate::bidding::model::{Bid, BidUpdate, NewBid};
use crate::clock::Clock;
use crate::error::{AppError, ValidationError};
use crate::messaging::model::{Conversation, Message, UserPair};
use crate::users::model::{NewUser, ProfilePatch, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

// endregion: --- Imports

#[derive(Default)]
struct Inner {
    next_id: i64,
    auctions: BTreeMap<i64, Auction>,
    bids: Vec<Bid>,
    users: HashMap<String, User>,
    conversations: BTreeMap<i64, Conversation>,
    messages: Vec<Message>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// 메시지 타임스탬프는 저장소의 시계로 기록한다
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }
}

// region:    --- Auctions
fn newest_first(mut auctions: Vec<Auction>) -> Vec<Auction> {
    auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    auctions
}

#[async_trait]
impl AuctionRepository for MemoryStore {
    async fn insert(&self, new: NewAuction) -> Result<Auction, AppError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let draft = new.draft;
        let auction = Auction {
            id,
            title: draft.title,
            description: draft.description,
            condition: draft.condition,
            location: draft.location,
            delivery: draft.delivery,
            only_verified: draft.only_verified,
            seller_verified: new.seller_verified,
            start_time: draft.start_time,
            duration_days: draft.duration_days,
            duration_hours: draft.duration_hours,
            end_time: new.end_time,
            starting_bid: draft.starting_bid,
            reserve_bid: draft.reserve_bid,
            current_bid: None,
            current_bidder_id: None,
            winning_bidder_id: None,
            created_by: new.created_by,
            finished: false,
            version: 0,
            thumbnail_url: new.thumbnail_url,
            photo_urls: new.photo_urls,
            created_at: new.created_at,
        };
        inner.auctions.insert(id, auction.clone());
        Ok(auction)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Auction>, AppError> {
        Ok(self.inner.read().await.auctions.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Auction>, AppError> {
        let inner = self.inner.read().await;
        Ok(newest_first(inner.auctions.values().cloned().collect()))
    }

    async fn list_by_creator(&self, user_id: &str) -> Result<Vec<Auction>, AppError> {
        let inner = self.inner.read().await;
        Ok(newest_first(
            inner
                .auctions
                .values()
                .filter(|a| a.created_by == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_winner(&self, user_id: &str) -> Result<Vec<Auction>, AppError> {
        let inner = self.inner.read().await;
        Ok(newest_first(
            inner
                .auctions
                .values()
                .filter(|a| a.winning_bidder_id.as_deref() == Some(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn list_due_unfinished(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .auctions
            .values()
            .filter(|a| !a.finished && a.end_time <= now)
            .cloned()
            .collect())
    }

    async fn compare_and_set_bid(&self, update: BidUpdate) -> Result<Option<Auction>, AppError> {
        let mut inner = self.inner.write().await;
        let Some(auction) = inner.auctions.get_mut(&update.auction_id) else {
            return Ok(None);
        };
        let open = !auction.finished
            && auction.start_time <= update.now
            && update.now < auction.end_time;
        if !open || auction.current_bid != update.expected_bid {
            return Ok(None);
        }
        auction.current_bid = Some(update.amount);
        auction.current_bidder_id = Some(update.bidder_id.clone());
        auction.winning_bidder_id = Some(update.bidder_id);
        auction.version += 1;
        Ok(Some(auction.clone()))
    }

    async fn mark_finished(&self, id: i64, now: DateTime<Utc>) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        match inner.auctions.get_mut(&id) {
            Some(auction) if !auction.finished && auction.end_time <= now => {
                auction.finished = true;
                auction.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
// endregion: --- Auctions

// region:    --- Bids
fn bids_newest_first(mut bids: Vec<Bid>) -> Vec<Bid> {
    bids.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    bids
}

#[async_trait]
impl BidLedger for MemoryStore {
    async fn append(&self, new: NewBid) -> Result<Bid, AppError> {
        let mut inner = self.inner.write().await;
        let bid = Bid {
            id: inner.next_id(),
            auction_id: new.auction_id,
            user_id: new.user_id,
            amount: new.amount,
            timestamp: new.timestamp,
        };
        inner.bids.push(bid.clone());
        Ok(bid)
    }

    async fn list_by_auction(&self, auction_id: i64) -> Result<Vec<Bid>, AppError> {
        let inner = self.inner.read().await;
        Ok(bids_newest_first(
            inner
                .bids
                .iter()
                .filter(|b| b.auction_id == auction_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Bid>, AppError> {
        let inner = self.inner.read().await;
        Ok(bids_newest_first(
            inner
                .bids
                .iter()
                .filter(|b| b.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn highest_for_auction(&self, auction_id: i64) -> Result<Option<Bid>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .bids
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .max_by_key(|b| b.amount)
            .cloned())
    }
}
// endregion: --- Bids

// region:    --- Users
#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, AppError> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&new.id) {
            return Err(ValidationError::new("id", "이미 가입된 사용자입니다.").into());
        }
        if inner.users.values().any(|u| u.username == new.username) {
            return Err(ValidationError::new(
                "username",
                "Username already exists. Please choose another one.",
            )
            .into());
        }
        if inner.users.values().any(|u| u.email == new.email) {
            return Err(ValidationError::new("email", "Email already exists. Please login").into());
        }
        let user = User {
            id: new.id,
            email: new.email,
            username: new.username,
            verified: false,
            first_name: None,
            last_name: None,
            phone_number: None,
            address_line1: None,
            address_line2: None,
            country: None,
            city: None,
            created_at: now,
        };
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<Option<User>, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.get_mut(id).map(|user| {
            patch.apply_to(user);
            user.clone()
        }))
    }

    async fn mark_verified(&self, id: &str) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        Ok(match inner.users.get_mut(id) {
            Some(user) => {
                user.verified = true;
                true
            }
            None => false,
        })
    }
}
// endregion: --- Users

// region:    --- Conversations
#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Conversation>, AppError> {
        Ok(self.inner.read().await.conversations.get(&id).cloned())
    }

    async fn find_by_pair(&self, pair: &UserPair) -> Result<Option<Conversation>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .conversations
            .values()
            .find(|c| c.user_low == pair.low() && c.user_high == pair.high())
            .cloned())
    }

    async fn create_if_absent(&self, pair: &UserPair) -> Result<Conversation, AppError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .conversations
            .values()
            .find(|c| c.user_low == pair.low() && c.user_high == pair.high())
        {
            return Ok(existing.clone());
        }
        let now = self.clock.now();
        let conversation = Conversation {
            id: inner.next_id(),
            user_low: pair.low().to_string(),
            user_high: pair.high().to_string(),
            last_read: HashMap::new(),
            created_at: now,
            updated_at: now,
        };
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Conversation>, AppError> {
        let inner = self.inner.read().await;
        let mut conversations: Vec<Conversation> = inner
            .conversations
            .values()
            .filter(|c| c.has_member(user_id))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(conversations)
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        sender_id: &str,
        text: &str,
    ) -> Result<Message, AppError> {
        let mut inner = self.inner.write().await;
        let now = self.clock.now();
        let id = inner.next_id();
        let conversation = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| AppError::not_found("대화", conversation_id))?;
        conversation.updated_at = now;
        let message = Message {
            id,
            conversation_id,
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            timestamp: now,
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>, AppError> {
        let inner = self.inner.read().await;
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn find_message(
        &self,
        conversation_id: i64,
        message_id: i64,
    ) -> Result<Option<Message>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .messages
            .iter()
            .find(|m| m.conversation_id == conversation_id && m.id == message_id)
            .cloned())
    }

    async fn last_message(&self, conversation_id: i64) -> Result<Option<Message>, AppError> {
        Ok(self.list_messages(conversation_id).await?.pop())
    }

    async fn set_last_read(
        &self,
        conversation_id: i64,
        user_id: &str,
        message_id: i64,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        let now = self.clock.now();
        Ok(match inner.conversations.get_mut(&conversation_id) {
            Some(conversation) => {
                conversation
                    .last_read
                    .insert(user_id.to_string(), message_id);
                conversation.updated_at = now;
                true
            }
            None => false,
        })
    }
}
// endregion: --- Conversations
