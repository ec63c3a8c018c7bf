#![allow(dead_code)]

use auction_light::auction::model::{
    end_time_for, Auction, AuctionDraft, Condition, Delivery, Location, NewAuction,
};
use auction_light::clock::{Clock, ManualClock};
use auction_light::collaborators::{FixedVerifier, MemoryBlobStore, Upload};
use auction_light::config::ServiceSettings;
use auction_light::handlers::AppState;
use auction_light::notify::ChangeHub;
use auction_light::store::memory::MemoryStore;
use auction_light::store::{AuctionRepository, Stores, UserRepository};
use auction_light::users::model::{NewUser, User};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// 트레이싱 초기화
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .without_time()
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// 인메모리 저장소와 수동 시계로 구성한 테스트 환경
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub stores: Stores,
    pub hub: ChangeHub,
    pub blobs: Arc<MemoryBlobStore>,
    pub verifier: Arc<FixedVerifier>,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_verifier(true)
    }

    pub fn with_verifier(answer: bool) -> Self {
        init_tracing();
        let clock = Arc::new(ManualClock::new(epoch()));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let stores = Stores::from_single(store.clone());
        let hub = ChangeHub::default();
        let blobs = Arc::new(MemoryBlobStore::default());
        let verifier = Arc::new(FixedVerifier::new(answer));
        let state = AppState::new(
            stores.clone(),
            blobs.clone(),
            verifier.clone(),
            Arc::new(hub.clone()),
            clock.clone(),
            &ServiceSettings::default(),
        );
        Self {
            clock,
            store,
            stores,
            hub,
            blobs,
            verifier,
            state,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// 사용자 등록 (verified이면 인증 완료 상태로)
    pub async fn user(&self, id: &str, verified: bool) -> User {
        let user = self
            .stores
            .users
            .insert(
                NewUser {
                    id: id.to_string(),
                    email: format!("{}@example.com", id),
                    username: id.to_string(),
                },
                self.now(),
            )
            .await
            .unwrap();
        if verified {
            self.stores.users.mark_verified(id).await.unwrap();
            return self.stores.users.find_by_id(id).await.unwrap().unwrap();
        }
        user
    }

    /// 시작 시각을 자유롭게 정해 경매를 저장 (등록 검증을 거치지 않음)
    pub async fn auction(
        &self,
        seller: &str,
        start_time: DateTime<Utc>,
        duration_hours: i32,
        starting_bid: i64,
        reserve_bid: i64,
        only_verified: bool,
    ) -> Auction {
        let mut draft = draft(start_time, starting_bid, reserve_bid);
        draft.duration_hours = duration_hours;
        draft.only_verified = only_verified;
        self.stores
            .auctions
            .insert(NewAuction {
                end_time: end_time_for(start_time, 0, duration_hours),
                draft,
                created_by: seller.to_string(),
                seller_verified: false,
                thumbnail_url: "memory://thumbnails/test.jpg".into(),
                photo_urls: Vec::new(),
                created_at: self.now(),
            })
            .await
            .unwrap()
    }

    /// 한 시간 전에 시작한 두 시간짜리 경매
    pub async fn active_auction(&self, seller: &str, starting_bid: i64, reserve_bid: i64) -> Auction {
        self.auction(
            seller,
            self.now() - Duration::hours(1),
            2,
            starting_bid,
            reserve_bid,
            false,
        )
        .await
    }
}

pub fn draft(start_time: DateTime<Utc>, starting_bid: i64, reserve_bid: i64) -> AuctionDraft {
    AuctionDraft {
        title: "Vintage camera".into(),
        description: "Works fine".into(),
        condition: Condition::Used,
        location: Location::Ireland,
        delivery: Delivery::Postage,
        only_verified: false,
        start_time,
        duration_days: 0,
        duration_hours: 2,
        starting_bid,
        reserve_bid,
    }
}

pub fn image(name: &str) -> Upload {
    Upload {
        file_name: name.to_string(),
        content_type: "image/jpeg".into(),
        bytes: vec![0xFF, 0xD8, 0xFF],
    }
}
