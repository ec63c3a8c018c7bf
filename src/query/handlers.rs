// region:    --- Imports
use super::filters::AuctionFilter;
use crate::auction::lifecycle::time_left_text;
use crate::auction::model::Auction;
use crate::bidding::model::Bid;
use crate::clock::Clock;
use crate::error::AppError;
use crate::store::{AuctionRepository, BidLedger};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

/// 입찰 내역 화면 항목
#[derive(Debug, Clone, Serialize)]
pub struct BidHistoryEntry {
    pub bid: Bid,
    pub auction_id: i64,
    pub auction_title: String,
    pub thumbnail_url: String,
    pub current_bid: Option<i64>,
    pub end_time: DateTime<Utc>,
    pub time_left: String,
}

// region:    --- Query Handlers
#[derive(Clone)]
pub struct CatalogQueries {
    auctions: Arc<dyn AuctionRepository>,
    bids: Arc<dyn BidLedger>,
    clock: Arc<dyn Clock>,
}

impl CatalogQueries {
    pub fn new(
        auctions: Arc<dyn AuctionRepository>,
        bids: Arc<dyn BidLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            auctions,
            bids,
            clock,
        }
    }

    /// 경매 목록 조회 (필터 적용)
    pub async fn browse(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, AppError> {
        info!("{:<12} --> 경매 목록 조회: {:?}", "Query", filter);
        let auctions = self.auctions.list_all().await?;
        Ok(filter.apply(auctions, self.clock.now()))
    }

    /// 내가 등록한 경매
    pub async fn auctions_created_by(&self, user_id: &str) -> Result<Vec<Auction>, AppError> {
        info!("{:<12} --> 등록 경매 조회 user: {}", "Query", user_id);
        self.auctions.list_by_creator(user_id).await
    }

    /// 입찰 내역 (최신순, 삭제된 경매는 건너뜀)
    pub async fn bid_history(&self, user_id: &str) -> Result<Vec<BidHistoryEntry>, AppError> {
        info!("{:<12} --> 입찰 내역 조회 user: {}", "Query", user_id);
        let now = self.clock.now();
        let mut entries = Vec::new();
        for bid in self.bids.list_by_user(user_id).await? {
            let Some(auction) = self.auctions.find_by_id(bid.auction_id).await? else {
                continue;
            };
            entries.push(BidHistoryEntry {
                auction_id: auction.id,
                auction_title: auction.title,
                thumbnail_url: auction.thumbnail_url,
                current_bid: auction.current_bid,
                end_time: auction.end_time,
                time_left: time_left_text(auction.end_time, now),
                bid,
            });
        }
        Ok(entries)
    }

    /// 낙찰 받은 경매 (종료 + 최저 낙찰가 충족)
    pub async fn items_won(&self, user_id: &str) -> Result<Vec<Auction>, AppError> {
        info!("{:<12} --> 낙찰 경매 조회 user: {}", "Query", user_id);
        Ok(self
            .auctions
            .list_by_winner(user_id)
            .await?
            .into_iter()
            .filter(|a| a.finished && a.current_bid.is_some_and(|bid| bid >= a.reserve_bid))
            .collect())
    }

    /// 경매 최고 입찰
    pub async fn highest_bid(&self, auction_id: i64) -> Result<Option<Bid>, AppError> {
        info!("{:<12} --> 최고 입찰가 조회 id: {}", "Query", auction_id);
        self.bids.highest_for_auction(auction_id).await
    }
}
// endregion: --- Query Handlers
