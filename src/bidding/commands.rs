/// 입찰 관련 커맨드 처리
/// 1. 입찰 검증 및 수락 (조건부 갱신)
/// 2. 최신 상태 재조회 후 재시도하는 입찰
// region:    --- Imports
use crate::auction::model::Auction;
use crate::bidding::model::{AcceptedBid, Bid, BidRejection, BidUpdate, NewBid};
use crate::bidding::validator::validate_bid;
use crate::clock::Clock;
use crate::error::AppError;
use crate::notify::{publish_or_warn, ChangeEvent, ChangeNotifier};
use crate::store::{AuctionRepository, BidLedger, UserRepository};
use crate::users::model::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_id: Option<String>,
    pub amount: i64,
}

#[derive(Clone)]
pub struct BidService {
    auctions: Arc<dyn AuctionRepository>,
    bids: Arc<dyn BidLedger>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn ChangeNotifier>,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl BidService {
    pub fn new(
        auctions: Arc<dyn AuctionRepository>,
        bids: Arc<dyn BidLedger>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn ChangeNotifier>,
        clock: Arc<dyn Clock>,
        max_retries: u32,
    ) -> Self {
        Self {
            auctions,
            bids,
            users,
            notifier,
            clock,
            max_retries,
        }
    }

    /// 1. 읽어 둔 경매 상태를 기준으로 입찰 검증 후 조건부 갱신
    /// 저장된 입찰가가 읽은 값과 달라졌으면 StaleState.
    pub async fn submit_bid(
        &self,
        auction: &Auction,
        bidder: Option<&User>,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<AcceptedBid, AppError> {
        validate_bid(auction, bidder, amount, now)?;
        // validate_bid가 입찰자 존재를 보장한다
        let bidder_id = bidder
            .map(|b| b.id.clone())
            .ok_or(BidRejection::SignInRequired)?;

        let update = BidUpdate {
            auction_id: auction.id,
            expected_bid: auction.current_bid,
            amount,
            bidder_id: bidder_id.clone(),
            now,
        };

        let Some(updated) = self.auctions.compare_and_set_bid(update).await? else {
            return Err(self.classify_failed_write(auction.id, now).await);
        };
        info!(
            "{:<12} --> 입찰 성공: 경매 {} 현재 가격 {}",
            "Command", updated.id, amount
        );

        let ledger_entry = self.append_ledger(auction.id, &bidder_id, amount, now).await;

        publish_or_warn(
            self.notifier.as_ref(),
            ChangeEvent::BidPlaced {
                auction_id: auction.id,
                bidder_id: bidder_id.clone(),
                amount,
                timestamp: now,
            },
        )
        .await;

        Ok(AcceptedBid {
            auction: updated,
            bidder_id,
            amount,
            timestamp: now,
            ledger_entry,
        })
    }

    /// 2. 최신 경매/입찰자를 조회해 입찰. 동시성 충돌 시 재조회 후 재시도
    pub async fn place_bid(&self, cmd: PlaceBidCommand) -> Result<AcceptedBid, AppError> {
        info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

        let bidder = match &cmd.bidder_id {
            Some(id) => Some(
                self.users
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::not_found("사용자", id))?,
            ),
            None => None,
        };

        let mut retries = 0;
        loop {
            let auction = self
                .auctions
                .find_by_id(cmd.auction_id)
                .await?
                .ok_or_else(|| AppError::not_found("경매", cmd.auction_id))?;
            let now = self.clock.now();

            match self.submit_bid(&auction, bidder.as_ref(), cmd.amount, now).await {
                Err(AppError::StaleState) if retries < self.max_retries => {
                    retries += 1;
                    warn!(
                        "{:<12} --> 낙관적 업데이트로 인한 충돌: 재시도 ({}/{})",
                        "Command", retries, self.max_retries
                    );
                }
                result => return result,
            }
        }
    }

    /// 경매 입찰 이력 (최신순)
    pub async fn bid_history(&self, auction_id: i64) -> Result<Vec<Bid>, AppError> {
        if self.auctions.find_by_id(auction_id).await?.is_none() {
            return Err(AppError::not_found("경매", auction_id));
        }
        self.bids.list_by_auction(auction_id).await
    }

    /// 조건부 갱신 실패 원인 판별: 종료되었으면 AuctionFinished, 아니면 StaleState
    async fn classify_failed_write(&self, auction_id: i64, now: DateTime<Utc>) -> AppError {
        match self.auctions.find_by_id(auction_id).await {
            Ok(Some(latest)) if latest.finished || now >= latest.end_time => {
                BidRejection::AuctionFinished.into()
            }
            Ok(Some(_)) => AppError::StaleState,
            Ok(None) => AppError::not_found("경매", auction_id),
            Err(e) => e,
        }
    }

    /// 원장 기록 실패는 입찰을 실패시키지 않는다 (경매 레코드가 기준)
    async fn append_ledger(
        &self,
        auction_id: i64,
        bidder_id: &str,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Option<Bid> {
        let new_bid = NewBid {
            auction_id,
            user_id: bidder_id.to_string(),
            amount,
            timestamp: now,
        };
        match self.bids.append(new_bid).await {
            Ok(bid) => Some(bid),
            Err(e) => {
                error!(
                    "{:<12} --> 입찰 원장 불일치: 경매 {} 입찰자 {} 금액 {} 기록 실패 ({})",
                    "Command", auction_id, bidder_id, amount, e
                );
                None
            }
        }
    }
}
// endregion: --- Commands
