use crate::auction::model::Auction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// 입찰 원장 모델 (추가만 가능)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub user_id: String,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

// 원장에 추가할 입찰
#[derive(Debug, Clone)]
pub struct NewBid {
    pub auction_id: i64,
    pub user_id: String,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

// 경매 레코드에 대한 조건부 갱신 요청
#[derive(Debug, Clone)]
pub struct BidUpdate {
    pub auction_id: i64,
    /// 검증 시점에 읽은 현재 입찰가
    pub expected_bid: Option<i64>,
    pub amount: i64,
    pub bidder_id: String,
    pub now: DateTime<Utc>,
}

// 수락된 입찰
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedBid {
    pub auction: Auction,
    pub bidder_id: String,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
    /// 원장 기록 실패 시 None (경매 레코드가 기준)
    pub ledger_entry: Option<Bid>,
}

/// 입찰 거절 사유 (검사 순서대로)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BidRejection {
    #[error("경매가 아직 시작되지 않았습니다.")]
    NotStarted,

    #[error("경매가 이미 종료되었습니다.")]
    AuctionFinished,

    #[error("첫 입찰 금액은 시작가({starting_bid}) 이상이어야 합니다.")]
    BelowStartingBid { starting_bid: i64 },

    #[error("입찰 금액이 현재 가격({current_bid})보다 높아야 합니다.")]
    BelowCurrentBid { current_bid: i64 },

    #[error("인증된 사용자만 입찰할 수 있는 경매입니다.")]
    VerificationRequired,

    #[error("자신의 경매에는 입찰할 수 없습니다.")]
    SelfBid,

    #[error("입찰하려면 로그인이 필요합니다.")]
    SignInRequired,
}

impl BidRejection {
    pub fn code(&self) -> &'static str {
        match self {
            BidRejection::NotStarted => "NOT_STARTED",
            BidRejection::AuctionFinished => "ALREADY_ENDED",
            BidRejection::BelowStartingBid { .. } => "BELOW_STARTING_BID",
            BidRejection::BelowCurrentBid { .. } => "LOW_BID",
            BidRejection::VerificationRequired => "VERIFICATION_REQUIRED",
            BidRejection::SelfBid => "SELF_BID",
            BidRejection::SignInRequired => "SIGN_IN_REQUIRED",
        }
    }
}
