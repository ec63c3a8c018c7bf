//! PostgreSQL 저장소 테스트
//! 실행: DATABASE_URL=postgres://... cargo test --test postgres_tests -- --ignored
mod common;

use auction_light::auction::model::{end_time_for, Auction, NewAuction};
use auction_light::bidding::commands::{BidService, PlaceBidCommand};
use auction_light::clock::{Clock, SystemClock};
use auction_light::database::DatabaseManager;
use auction_light::error::AppError;
use auction_light::messaging::model::UserPair;
use auction_light::notify::ChangeHub;
use auction_light::store::{
    AuctionRepository, BidLedger, ConversationRepository, Stores, UserRepository,
};
use auction_light::users::model::NewUser;
use chrono::{DateTime, Duration, Utc};
use common::{draft, init_tracing};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// 데이터베이스 매니저 설정 (스키마는 한 번만 생성)
async fn setup() -> Arc<DatabaseManager> {
    init_tracing();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL이 필요합니다");
    let db_manager = Arc::new(DatabaseManager::new(&url, 5).await.unwrap());
    SCHEMA
        .get_or_init(|| async {
            db_manager
                .initialize_database()
                .await
                .expect("스키마 생성 실패");
        })
        .await;
    db_manager
}

/// 실행마다 겹치지 않는 사용자 id
fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, uuid::Uuid::new_v4().simple())
}

async fn user(stores: &Stores, prefix: &str) -> String {
    let id = unique(prefix);
    stores
        .users
        .insert(
            NewUser {
                id: id.clone(),
                email: format!("{}@example.com", id),
                username: id.clone(),
            },
            Utc::now(),
        )
        .await
        .unwrap();
    id
}

async fn auction(stores: &Stores, seller: &str, start_time: DateTime<Utc>, hours: i32) -> Auction {
    let mut draft = draft(start_time, 10, 0);
    draft.duration_hours = hours;
    stores
        .auctions
        .insert(NewAuction {
            end_time: end_time_for(start_time, 0, hours),
            draft,
            created_by: seller.to_string(),
            seller_verified: false,
            thumbnail_url: "memory://thumbnails/test.jpg".into(),
            photo_urls: Vec::new(),
            created_at: Utc::now(),
        })
        .await
        .unwrap()
}

/// 동시 입찰에서 조건부 갱신이 최고가만 남긴다
#[tokio::test]
#[ignore]
async fn test_concurrent_bids_keep_highest() {
    let db_manager = setup().await;
    let stores = Stores::from_single(db_manager);
    let seller = user(&stores, "seller").await;
    let auction = auction(&stores, &seller, Utc::now() - Duration::hours(1), 2).await;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = BidService::new(
        stores.auctions.clone(),
        stores.bids.clone(),
        stores.users.clone(),
        Arc::new(ChangeHub::default()),
        clock,
        100,
    );

    let auction_id = auction.id;
    let mut tasks = Vec::new();
    for amount in (20..=100).step_by(10) {
        let bidder = user(&stores, "bidder").await;
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            service
                .place_bid(PlaceBidCommand {
                    auction_id,
                    bidder_id: Some(bidder),
                    amount,
                })
                .await
        }));
    }
    let mut accepted: i64 = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(AppError::Bid(_)) => {}
            Err(e) => panic!("예상하지 못한 오류: {:?}", e),
        }
    }
    info!("{:<12} --> 수락된 입찰 {}건", "Test", accepted);

    let stored = stores.auctions.find_by_id(auction.id).await.unwrap().unwrap();
    assert_eq!(stored.current_bid, Some(100));
    assert_eq!(stored.version, auction.version + accepted);
    let highest = stores.bids.highest_for_auction(auction.id).await.unwrap().unwrap();
    assert_eq!(highest.amount, 100);
    assert_eq!(Some(highest.user_id), stored.winning_bidder_id);
}

/// 기대한 현재 입찰가가 다르면 갱신하지 않는다
#[tokio::test]
#[ignore]
async fn test_compare_and_set_rejects_stale_expectation() {
    let db_manager = setup().await;
    let stores = Stores::from_single(db_manager);
    let seller = user(&stores, "seller").await;
    let bidder = user(&stores, "bidder").await;
    let auction = auction(&stores, &seller, Utc::now() - Duration::hours(1), 2).await;

    let service = BidService::new(
        stores.auctions.clone(),
        stores.bids.clone(),
        stores.users.clone(),
        Arc::new(ChangeHub::default()),
        Arc::new(SystemClock),
        0,
    );
    service
        .place_bid(PlaceBidCommand {
            auction_id: auction.id,
            bidder_id: Some(bidder.clone()),
            amount: 30,
        })
        .await
        .unwrap();

    // 입찰 전에 읽어 둔 사본으로 제출
    let bidder = stores.users.find_by_id(&bidder).await.unwrap().unwrap();
    let stale = service.submit_bid(&auction, Some(&bidder), 40, Utc::now()).await;
    assert!(matches!(stale, Err(AppError::StaleState)));
    let stored = stores.auctions.find_by_id(auction.id).await.unwrap().unwrap();
    assert_eq!(stored.current_bid, Some(30));
}

#[tokio::test]
#[ignore]
async fn test_mark_finished_transitions_once() {
    let db_manager = setup().await;
    let stores = Stores::from_single(db_manager);
    let seller = user(&stores, "seller").await;
    let auction = auction(&stores, &seller, Utc::now() - Duration::hours(3), 1).await;

    let due = stores.auctions.list_due_unfinished(Utc::now()).await.unwrap();
    assert!(due.iter().any(|a| a.id == auction.id));
    assert!(stores.auctions.mark_finished(auction.id, Utc::now()).await.unwrap());
    assert!(!stores.auctions.mark_finished(auction.id, Utc::now()).await.unwrap());
    assert!(!stores.auctions.mark_finished(-1, Utc::now()).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_duplicate_username_maps_to_field() {
    let db_manager = setup().await;
    let stores = Stores::from_single(db_manager);
    let taken = user(&stores, "taken").await;

    let result = stores
        .users
        .insert(
            NewUser {
                id: unique("other"),
                email: format!("{}@example.org", taken),
                username: taken.clone(),
            },
            Utc::now(),
        )
        .await;
    assert!(matches!(result, Err(AppError::Validation(ref e)) if e.field == "username"));
}

/// 같은 쌍의 동시 생성은 한 대화방으로 합쳐지고 읽음 위치가 기록된다
#[tokio::test]
#[ignore]
async fn test_conversation_pair_is_unique() {
    let db_manager = setup().await;
    let stores = Stores::from_single(db_manager);
    let alice = user(&stores, "alice").await;
    let bob = user(&stores, "bob").await;

    let mut tasks = Vec::new();
    for i in 0..6 {
        let conversations = stores.conversations.clone();
        let (a, b) = if i % 2 == 0 {
            (alice.clone(), bob.clone())
        } else {
            (bob.clone(), alice.clone())
        };
        tasks.push(tokio::spawn(async move {
            let pair = UserPair::new(&a, &b).unwrap();
            conversations.create_if_absent(&pair).await
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let message = stores
        .conversations
        .append_message(ids[0], &alice, "Hello")
        .await
        .unwrap();
    assert!(stores
        .conversations
        .find_message(ids[0], message.id)
        .await
        .unwrap()
        .is_some());
    assert!(stores
        .conversations
        .set_last_read(ids[0], &bob, message.id)
        .await
        .unwrap());
    let conversation = stores.conversations.find_by_id(ids[0]).await.unwrap().unwrap();
    assert_eq!(conversation.last_read.get(&bob), Some(&message.id));
}
