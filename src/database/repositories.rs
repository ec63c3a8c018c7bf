// region:    --- Imports
use super::queries;
use super::DatabaseManager;
use crate::auction::model::{Auction, NewAuction};
use crate::bidding::model::{Bid, BidUpdate, NewBid};
use crate::error::{AppError, ValidationError};
use crate::messaging::model::{Conversation, Message, UserPair};
use crate::store::{AuctionRepository, BidLedger, ConversationRepository, UserRepository};
use crate::users::model::{NewUser, ProfilePatch, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Auctions
#[async_trait]
impl AuctionRepository for DatabaseManager {
    async fn insert(&self, new: NewAuction) -> Result<Auction, AppError> {
        let draft = new.draft;
        let auction = sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
            .bind(draft.title)
            .bind(draft.description)
            .bind(draft.condition.as_str())
            .bind(draft.location.as_str())
            .bind(draft.delivery.as_str())
            .bind(draft.only_verified)
            .bind(new.seller_verified)
            .bind(draft.start_time)
            .bind(draft.duration_days)
            .bind(draft.duration_hours)
            .bind(new.end_time)
            .bind(draft.starting_bid)
            .bind(draft.reserve_bid)
            .bind(new.created_by)
            .bind(new.thumbnail_url)
            .bind(new.photo_urls)
            .bind(new.created_at)
            .fetch_one(self.pool())
            .await?;
        info!("{:<12} --> 경매 저장 id: {}", "Database", auction.id);
        Ok(auction)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Auction>, AppError> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn list_all(&self) -> Result<Vec<Auction>, AppError> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_ALL_AUCTIONS)
            .fetch_all(self.pool())
            .await?)
    }

    async fn list_by_creator(&self, user_id: &str) -> Result<Vec<Auction>, AppError> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_AUCTIONS_BY_CREATOR)
            .bind(user_id)
            .fetch_all(self.pool())
            .await?)
    }

    async fn list_by_winner(&self, user_id: &str) -> Result<Vec<Auction>, AppError> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_AUCTIONS_BY_WINNER)
            .bind(user_id)
            .fetch_all(self.pool())
            .await?)
    }

    async fn list_due_unfinished(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, AppError> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_DUE_AUCTIONS)
            .bind(now)
            .fetch_all(self.pool())
            .await?)
    }

    async fn compare_and_set_bid(&self, update: BidUpdate) -> Result<Option<Auction>, AppError> {
        Ok(sqlx::query_as::<_, Auction>(queries::COMPARE_AND_SET_BID)
            .bind(update.amount)
            .bind(update.bidder_id)
            .bind(update.auction_id)
            .bind(update.now)
            .bind(update.expected_bid)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn mark_finished(&self, id: i64, now: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(queries::MARK_FINISHED)
            .bind(id)
            .bind(now)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
// endregion: --- Auctions

// region:    --- Bids
#[async_trait]
impl BidLedger for DatabaseManager {
    async fn append(&self, bid: NewBid) -> Result<Bid, AppError> {
        Ok(sqlx::query_as::<_, Bid>(queries::INSERT_BID)
            .bind(bid.auction_id)
            .bind(bid.user_id)
            .bind(bid.amount)
            .bind(bid.timestamp)
            .fetch_one(self.pool())
            .await?)
    }

    async fn list_by_auction(&self, auction_id: i64) -> Result<Vec<Bid>, AppError> {
        Ok(sqlx::query_as::<_, Bid>(queries::GET_BIDS_BY_AUCTION)
            .bind(auction_id)
            .fetch_all(self.pool())
            .await?)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Bid>, AppError> {
        Ok(sqlx::query_as::<_, Bid>(queries::GET_BIDS_BY_USER)
            .bind(user_id)
            .fetch_all(self.pool())
            .await?)
    }

    async fn highest_for_auction(&self, auction_id: i64) -> Result<Option<Bid>, AppError> {
        Ok(sqlx::query_as::<_, Bid>(queries::GET_HIGHEST_BID)
            .bind(auction_id)
            .fetch_optional(self.pool())
            .await?)
    }
}
// endregion: --- Bids

// region:    --- Users
/// 유니크 제약 위반을 입력 오류로 변환
fn map_user_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            warn!("{:<12} --> 사용자 중복: {:?}", "Database", db.constraint());
            return match db.constraint() {
                Some("users_username_key") => ValidationError::new(
                    "username",
                    "Username already exists. Please choose another one.",
                ),
                Some("users_email_key") => {
                    ValidationError::new("email", "Email already exists. Please login")
                }
                _ => ValidationError::new("id", "이미 가입된 사용자입니다."),
            }
            .into();
        }
    }
    e.into()
}

#[async_trait]
impl UserRepository for DatabaseManager {
    async fn insert(&self, user: NewUser, now: DateTime<Utc>) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(queries::INSERT_USER)
            .bind(user.id)
            .bind(user.email)
            .bind(user.username)
            .bind(now)
            .fetch_one(self.pool())
            .await
            .map_err(map_user_conflict)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(queries::GET_USER)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(queries::GET_USER_BY_USERNAME)
            .bind(username)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(queries::GET_USER_BY_EMAIL)
            .bind(email)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn update_profile(&self, id: &str, patch: &ProfilePatch) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(queries::UPDATE_PROFILE)
            .bind(id)
            .bind(patch.first_name.as_deref())
            .bind(patch.last_name.as_deref())
            .bind(patch.phone_number.as_deref())
            .bind(patch.address_line1.as_deref())
            .bind(patch.address_line2.as_deref())
            .bind(patch.country.as_deref())
            .bind(patch.city.as_deref())
            .fetch_optional(self.pool())
            .await?)
    }

    async fn mark_verified(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(queries::MARK_VERIFIED)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
// endregion: --- Users

// region:    --- Conversations
#[async_trait]
impl ConversationRepository for DatabaseManager {
    async fn find_by_id(&self, id: i64) -> Result<Option<Conversation>, AppError> {
        Ok(sqlx::query_as::<_, Conversation>(queries::GET_CONVERSATION)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn find_by_pair(&self, pair: &UserPair) -> Result<Option<Conversation>, AppError> {
        Ok(sqlx::query_as::<_, Conversation>(queries::GET_CONVERSATION_BY_PAIR)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_optional(self.pool())
            .await?)
    }

    async fn create_if_absent(&self, pair: &UserPair) -> Result<Conversation, AppError> {
        let created = sqlx::query_as::<_, Conversation>(queries::INSERT_CONVERSATION)
            .bind(pair.low())
            .bind(pair.high())
            .fetch_optional(self.pool())
            .await?;
        if let Some(conversation) = created {
            info!("{:<12} --> 대화방 생성 id: {}", "Database", conversation.id);
            return Ok(conversation);
        }
        // 동시 생성에서 진 쪽은 먼저 만들어진 대화방을 읽는다
        self.find_by_pair(pair)
            .await?
            .ok_or_else(|| AppError::not_found("대화방", format!("{}:{}", pair.low(), pair.high())))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Conversation>, AppError> {
        Ok(sqlx::query_as::<_, Conversation>(queries::GET_CONVERSATIONS_BY_USER)
            .bind(user_id)
            .fetch_all(self.pool())
            .await?)
    }

    async fn append_message(
        &self,
        conversation_id: i64,
        sender_id: &str,
        text: &str,
    ) -> Result<Message, AppError> {
        let sender_id = sender_id.to_string();
        let text = text.to_string();
        self.transaction(move |tx| {
            Box::pin(async move {
                let message = sqlx::query_as::<_, Message>(queries::INSERT_MESSAGE)
                    .bind(conversation_id)
                    .bind(sender_id)
                    .bind(text)
                    .fetch_one(&mut **tx)
                    .await?;

                sqlx::query(queries::TOUCH_CONVERSATION)
                    .bind(conversation_id)
                    .bind(message.timestamp)
                    .execute(&mut **tx)
                    .await?;

                Ok::<_, AppError>(message)
            })
        })
        .await
    }

    async fn list_messages(&self, conversation_id: i64) -> Result<Vec<Message>, AppError> {
        Ok(sqlx::query_as::<_, Message>(queries::GET_MESSAGES)
            .bind(conversation_id)
            .fetch_all(self.pool())
            .await?)
    }

    async fn find_message(
        &self,
        conversation_id: i64,
        message_id: i64,
    ) -> Result<Option<Message>, AppError> {
        Ok(sqlx::query_as::<_, Message>(queries::GET_MESSAGE)
            .bind(conversation_id)
            .bind(message_id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn last_message(&self, conversation_id: i64) -> Result<Option<Message>, AppError> {
        Ok(sqlx::query_as::<_, Message>(queries::GET_LAST_MESSAGE)
            .bind(conversation_id)
            .fetch_optional(self.pool())
            .await?)
    }

    async fn set_last_read(
        &self,
        conversation_id: i64,
        user_id: &str,
        message_id: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(queries::SET_LAST_READ)
            .bind(conversation_id)
            .bind(user_id)
            .bind(message_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
// endregion: --- Conversations
