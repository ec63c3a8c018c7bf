mod common;

use async_trait::async_trait;
use auction_light::auction::outcome::{outcome_of, Outcome};
use auction_light::bidding::commands::{BidService, PlaceBidCommand};
use auction_light::bidding::model::{Bid, BidRejection, NewBid};
use auction_light::error::AppError;
use auction_light::notify::ChangeHub;
use auction_light::store::{AuctionRepository, BidLedger};
use chrono::Duration;
use common::Harness;
use std::sync::Arc;

fn bid(auction_id: i64, bidder: &str, amount: i64) -> PlaceBidCommand {
    PlaceBidCommand {
        auction_id,
        bidder_id: Some(bidder.to_string()),
        amount,
    }
}

fn rejection(result: Result<impl std::fmt::Debug, AppError>) -> BidRejection {
    match result {
        Err(AppError::Bid(rejection)) => rejection,
        other => panic!("입찰 거절이 아님: {:?}", other),
    }
}

/// 시작가 이상 첫 입찰, 더 낮은 입찰 거절, 더 높은 입찰 수락 후 낙찰
#[tokio::test]
async fn test_bidding_sequence_and_win() {
    let h = Harness::new();
    h.user("seller", true).await;
    h.user("bob", false).await;
    h.user("carol", false).await;
    let auction = h.active_auction("seller", 10, 50).await;

    let first = h.state.bids.place_bid(bid(auction.id, "bob", 30)).await.unwrap();
    assert_eq!(first.auction.current_bid, Some(30));
    assert_eq!(first.ledger_entry.as_ref().map(|b| b.amount), Some(30));

    let low = h.state.bids.place_bid(bid(auction.id, "carol", 25)).await;
    assert_eq!(
        rejection(low),
        BidRejection::BelowCurrentBid { current_bid: 30 }
    );

    let second = h.state.bids.place_bid(bid(auction.id, "carol", 60)).await.unwrap();
    assert_eq!(second.auction.current_bid, Some(60));
    assert_eq!(second.auction.current_bidder_id.as_deref(), Some("carol"));
    assert_eq!(second.auction.version, auction.version + 2);

    h.clock.advance(Duration::hours(1));
    let outcome = h.state.auctions.outcome(auction.id).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Won {
            winner_id: "carol".into(),
            amount: 60
        }
    );

    let history = h.state.bids.bid_history(auction.id).await.unwrap();
    let amounts: Vec<i64> = history.iter().map(|b| b.amount).collect();
    assert_eq!(amounts, vec![60, 30]);
}

#[tokio::test]
async fn test_reserve_not_met() {
    let h = Harness::new();
    h.user("seller", false).await;
    h.user("bob", false).await;
    let auction = h.active_auction("seller", 10, 50).await;

    h.state.bids.place_bid(bid(auction.id, "bob", 20)).await.unwrap();
    h.clock.advance(Duration::hours(1));

    let outcome = h.state.auctions.outcome(auction.id).await.unwrap();
    assert_eq!(outcome, Outcome::ReserveNotMet { amount: 20 });
    assert!(h.state.catalog.items_won("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_first_bid_below_starting_bid() {
    let h = Harness::new();
    h.user("seller", false).await;
    h.user("bob", false).await;
    let auction = h.active_auction("seller", 10, 0).await;

    let result = h.state.bids.place_bid(bid(auction.id, "bob", 9)).await;
    assert_eq!(
        rejection(result),
        BidRejection::BelowStartingBid { starting_bid: 10 }
    );

    // 시작가와 같은 첫 입찰은 허용
    let accepted = h.state.bids.place_bid(bid(auction.id, "bob", 10)).await.unwrap();
    assert_eq!(accepted.auction.current_bid, Some(10));
}

#[tokio::test]
async fn test_verified_only_auction() {
    let h = Harness::new();
    h.user("seller", true).await;
    h.user("bob", false).await;
    h.user("dave", true).await;
    let auction = h
        .auction("seller", h.now() - Duration::hours(1), 2, 10, 0, true)
        .await;

    let result = h.state.bids.place_bid(bid(auction.id, "bob", 100)).await;
    assert_eq!(rejection(result), BidRejection::VerificationRequired);

    let accepted = h.state.bids.place_bid(bid(auction.id, "dave", 100)).await.unwrap();
    assert_eq!(accepted.bidder_id, "dave");
}

/// 종료 플래그가 기록되기 전이라도 종료 시각이 지나면 거절
#[tokio::test]
async fn test_bid_after_end_time_rejected_before_flag_lands() {
    let h = Harness::new();
    h.user("seller", false).await;
    h.user("bob", false).await;
    let auction = h.active_auction("seller", 10, 0).await;

    h.clock.advance(Duration::hours(1) + Duration::seconds(1));
    let stored = h.stores.auctions.find_by_id(auction.id).await.unwrap().unwrap();
    assert!(!stored.finished);

    let result = h.state.bids.place_bid(bid(auction.id, "bob", 100)).await;
    assert_eq!(rejection(result), BidRejection::AuctionFinished);

    // 종료 전에 읽어 둔 상태로 제출해도 마찬가지
    let bob = h.state.users.get_user("bob").await.unwrap();
    let late = h.state.bids.submit_bid(&auction, Some(&bob), 500, h.now()).await;
    assert_eq!(rejection(late), BidRejection::AuctionFinished);
}

#[tokio::test]
async fn test_pending_self_and_anonymous_bids() {
    let h = Harness::new();
    h.user("seller", false).await;
    h.user("bob", false).await;
    let pending = h
        .auction("seller", h.now() + Duration::minutes(5), 2, 10, 0, false)
        .await;
    let result = h.state.bids.place_bid(bid(pending.id, "bob", 50)).await;
    assert_eq!(rejection(result), BidRejection::NotStarted);

    let active = h.active_auction("seller", 10, 0).await;
    let own = h.state.bids.place_bid(bid(active.id, "seller", 50)).await;
    assert_eq!(rejection(own), BidRejection::SelfBid);

    let anonymous = h
        .state
        .bids
        .place_bid(PlaceBidCommand {
            auction_id: active.id,
            bidder_id: None,
            amount: 50,
        })
        .await;
    assert_eq!(rejection(anonymous), BidRejection::SignInRequired);

    let stored = h.stores.auctions.find_by_id(active.id).await.unwrap().unwrap();
    assert_eq!(stored.current_bid, None);
    assert!(h.state.bids.bid_history(active.id).await.unwrap().is_empty());
}

/// 같은 상태를 읽은 두 입찰 중 하나만 반영된다
#[tokio::test]
async fn test_stale_snapshot_is_rejected() {
    let h = Harness::new();
    h.user("seller", false).await;
    let bob = h.user("bob", false).await;
    let carol = h.user("carol", false).await;
    let auction = h.active_auction("seller", 10, 0).await;

    let now = h.now();
    h.state
        .bids
        .submit_bid(&auction, Some(&bob), 30, now)
        .await
        .unwrap();
    let stale = h.state.bids.submit_bid(&auction, Some(&carol), 35, now).await;
    assert!(matches!(stale, Err(AppError::StaleState)));
    assert_eq!(stale.unwrap_err().code(), "STALE_STATE");

    // 재조회 후 재시도하면 반영된다
    let retried = h.state.bids.place_bid(bid(auction.id, "carol", 35)).await.unwrap();
    assert_eq!(retried.auction.current_bid, Some(35));
    assert_eq!(h.state.bids.bid_history(auction.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrent_bids_keep_highest() {
    let h = Harness::new();
    h.user("seller", false).await;
    for i in 0..10 {
        h.user(&format!("bidder{}", i), false).await;
    }
    let auction = h.active_auction("seller", 10, 0).await;

    let mut tasks = Vec::new();
    for i in 0..10 {
        let bids = h.state.bids.clone();
        let cmd = bid(auction.id, &format!("bidder{}", i), 100 + i * 10);
        tasks.push(tokio::spawn(async move { bids.place_bid(cmd).await }));
    }

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(AppError::Bid(BidRejection::BelowCurrentBid { .. })) => {}
            Err(e) => panic!("예상하지 못한 오류: {:?}", e),
        }
    }

    let stored = h.stores.auctions.find_by_id(auction.id).await.unwrap().unwrap();
    assert_eq!(stored.current_bid, Some(190));
    assert_eq!(stored.current_bidder_id.as_deref(), Some("bidder9"));
    assert_eq!(stored.version, accepted);

    // 원장은 수락된 입찰만, 금액은 시간 순으로 증가
    let mut history = h.state.bids.bid_history(auction.id).await.unwrap();
    assert_eq!(history.len() as i64, accepted);
    history.reverse();
    assert!(history.windows(2).all(|w| w[0].amount < w[1].amount));
}

struct FailingLedger;

#[async_trait]
impl BidLedger for FailingLedger {
    async fn append(&self, _bid: NewBid) -> Result<Bid, AppError> {
        Err(AppError::unavailable("ledger down"))
    }

    async fn list_by_auction(&self, _auction_id: i64) -> Result<Vec<Bid>, AppError> {
        Ok(Vec::new())
    }

    async fn list_by_user(&self, _user_id: &str) -> Result<Vec<Bid>, AppError> {
        Ok(Vec::new())
    }

    async fn highest_for_auction(&self, _auction_id: i64) -> Result<Option<Bid>, AppError> {
        Ok(None)
    }
}

/// 원장 기록 실패는 입찰을 실패시키지 않는다
#[tokio::test]
async fn test_ledger_failure_keeps_accepted_bid() {
    let h = Harness::new();
    h.user("seller", false).await;
    h.user("bob", false).await;
    let auction = h.active_auction("seller", 10, 50).await;

    let service = BidService::new(
        h.stores.auctions.clone(),
        Arc::new(FailingLedger),
        h.stores.users.clone(),
        Arc::new(ChangeHub::default()),
        h.clock.clone(),
        3,
    );
    let accepted = service.place_bid(bid(auction.id, "bob", 70)).await.unwrap();
    assert!(accepted.ledger_entry.is_none());

    let stored = h.stores.auctions.find_by_id(auction.id).await.unwrap().unwrap();
    assert_eq!(stored.current_bid, Some(70));
    assert_eq!(
        outcome_of(&stored),
        Outcome::Won {
            winner_id: "bob".into(),
            amount: 70
        }
    );
}

#[tokio::test]
async fn test_unknown_auction_or_bidder() {
    let h = Harness::new();
    h.user("bob", false).await;
    let missing = h.state.bids.place_bid(bid(999, "bob", 10)).await;
    assert!(matches!(missing, Err(AppError::NotFound { .. })));

    h.user("seller", false).await;
    let auction = h.active_auction("seller", 10, 0).await;
    let ghost = h.state.bids.place_bid(bid(auction.id, "ghost", 10)).await;
    assert!(matches!(ghost, Err(AppError::NotFound { .. })));
}
