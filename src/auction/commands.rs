/// 경매 관련 커맨드 처리
/// 1. 경매 등록 (검증, 미디어 업로드)
/// 2. 경매 조회 / 결과 조회
// region:    --- Imports
use crate::auction::lifecycle::mark_finished_if_due;
use crate::auction::model::{end_time_for, Auction, AuctionDraft, NewAuction};
use crate::auction::outcome::{outcome_of, Outcome};
use crate::auction::view::AuctionView;
use crate::clock::Clock;
use crate::collaborators::blob::{object_name, BlobStore, Upload};
use crate::error::{AppError, ValidationError};
use crate::notify::{publish_or_warn, ChangeEvent, ChangeNotifier};
use crate::store::{AuctionRepository, UserRepository};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

/// 최대 경매 기간 (5일 12시간)
pub const MAX_AUCTION_HOURS: i64 = 132;
/// 사진 최대 개수 (썸네일 제외)
pub const MAX_PHOTOS: usize = 4;

// region:    --- Validation
/// 경매 입력 검증
pub fn validate_draft(draft: &AuctionDraft, photo_count: usize, now: DateTime<Utc>) -> Result<(), ValidationError> {
    if draft.title.trim().is_empty() {
        return Err(ValidationError::new("title", "제목을 입력하세요."));
    }

    if draft.duration_days < 0 || draft.duration_hours < 0 {
        return Err(ValidationError::new("duration", "경매 기간은 음수일 수 없습니다."));
    }
    let total_hours = i64::from(draft.duration_days) * 24 + i64::from(draft.duration_hours);
    if total_hours == 0 {
        return Err(ValidationError::new("duration", "경매 기간은 최소 1시간입니다."));
    }
    if total_hours > MAX_AUCTION_HOURS {
        return Err(ValidationError::new(
            "duration",
            "Auction length cannot be longer than 5 days and 12 hours.",
        ));
    }

    let earliest = now + Duration::minutes(1);
    let latest = now + Duration::days(5);
    if draft.start_time < earliest || draft.start_time > latest {
        return Err(ValidationError::new(
            "start_time",
            "Auction must start in a minimum of 1 minute and a maximum of 5 days.",
        ));
    }

    if draft.starting_bid < 0 || draft.reserve_bid < 0 {
        return Err(ValidationError::new(
            "starting_bid",
            "Starting bid and reserve bid must be positive numbers.",
        ));
    }

    if photo_count > MAX_PHOTOS {
        return Err(ValidationError::new("photos", "사진은 최대 4장까지 등록할 수 있습니다."));
    }
    Ok(())
}
// endregion: --- Validation

// region:    --- Commands
/// 경매 미디어
#[derive(Debug, Clone)]
pub struct AuctionMedia {
    pub thumbnail: Upload,
    pub photos: Vec<Upload>,
}

/// 경매 등록 결과 / 상세 조회용
#[derive(Debug, Clone, Serialize)]
pub struct AuctionDetails {
    #[serde(flatten)]
    pub view: AuctionView,
    pub seller_username: Option<String>,
}

#[derive(Clone)]
pub struct AuctionService {
    auctions: Arc<dyn AuctionRepository>,
    users: Arc<dyn UserRepository>,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn ChangeNotifier>,
    clock: Arc<dyn Clock>,
}

impl AuctionService {
    pub fn new(
        auctions: Arc<dyn AuctionRepository>,
        users: Arc<dyn UserRepository>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn ChangeNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            auctions,
            users,
            blobs,
            notifier,
            clock,
        }
    }

    /// 1. 경매 등록
    pub async fn create_auction(
        &self,
        seller_id: &str,
        draft: AuctionDraft,
        media: AuctionMedia,
    ) -> Result<Auction, AppError> {
        info!("{:<12} --> 경매 등록 요청: {} ({})", "Command", draft.title, seller_id);
        let now = self.clock.now();
        validate_draft(&draft, media.photos.len(), now)?;

        let seller = self
            .users
            .find_by_id(seller_id)
            .await?
            .ok_or_else(|| AppError::not_found("사용자", seller_id))?;

        let thumbnail_url = self
            .blobs
            .upload(&format!("thumbnails/{}", object_name(&media.thumbnail.file_name)), &media.thumbnail)
            .await?;
        let mut photo_urls = Vec::with_capacity(media.photos.len());
        for photo in &media.photos {
            let url = self
                .blobs
                .upload(&format!("photos/{}", object_name(&photo.file_name)), photo)
                .await?;
            photo_urls.push(url);
        }

        let end_time = end_time_for(draft.start_time, draft.duration_days, draft.duration_hours);
        let auction = self
            .auctions
            .insert(NewAuction {
                draft,
                created_by: seller.id.clone(),
                seller_verified: seller.verified,
                end_time,
                thumbnail_url,
                photo_urls,
                created_at: now,
            })
            .await?;
        info!("{:<12} --> 경매 등록 성공 id: {}", "Command", auction.id);

        publish_or_warn(
            self.notifier.as_ref(),
            ChangeEvent::AuctionCreated {
                auction_id: auction.id,
                created_by: seller.id,
                timestamp: now,
            },
        )
        .await;
        Ok(auction)
    }

    /// 2. 경매 조회
    /// 종료 시각이 지난 경매는 조회 시점에도 종료 처리를 시도한다.
    pub async fn get_auction(&self, auction_id: i64) -> Result<Auction, AppError> {
        let mut auction = self
            .auctions
            .find_by_id(auction_id)
            .await?
            .ok_or_else(|| AppError::not_found("경매", auction_id))?;
        let now = self.clock.now();
        match mark_finished_if_due(self.auctions.as_ref(), &mut auction, now).await {
            Ok(true) => {
                publish_or_warn(
                    self.notifier.as_ref(),
                    ChangeEvent::AuctionFinished {
                        auction_id,
                        timestamp: now,
                    },
                )
                .await
            }
            Ok(false) => {}
            // 스케줄러가 다시 시도한다
            Err(e) => warn!("{:<12} --> 경매 종료 처리 실패 id: {} ({})", "Query", auction_id, e),
        }
        Ok(auction)
    }

    /// 경매 상세 (뷰 모델 + 판매자 이름)
    pub async fn auction_details(&self, auction_id: i64) -> Result<AuctionDetails, AppError> {
        let auction = self.get_auction(auction_id).await?;
        let seller_username = self
            .users
            .find_by_id(&auction.created_by)
            .await?
            .map(|u| u.username);
        Ok(AuctionDetails {
            view: AuctionView::build(&auction, self.clock.now()),
            seller_username,
        })
    }

    /// 경매 결과
    pub async fn outcome(&self, auction_id: i64) -> Result<Outcome, AppError> {
        let auction = self.get_auction(auction_id).await?;
        Ok(outcome_of(&auction))
    }
}
// endregion: --- Commands

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::{Condition, Delivery, Location};
    use chrono::TimeZone;

    fn draft(now: DateTime<Utc>) -> AuctionDraft {
        AuctionDraft {
            title: "Vintage camera".into(),
            description: String::new(),
            condition: Condition::Used,
            location: Location::Ireland,
            delivery: Delivery::Postage,
            only_verified: false,
            start_time: now + Duration::hours(1),
            duration_days: 2,
            duration_hours: 0,
            starting_bid: 10,
            reserve_bid: 50,
        }
    }

    #[test]
    fn duration_and_start_window_limits() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert!(validate_draft(&draft(now), 4, now).is_ok());

        let mut too_long = draft(now);
        too_long.duration_days = 5;
        too_long.duration_hours = 13;
        assert_eq!(validate_draft(&too_long, 0, now).unwrap_err().field, "duration");

        let mut max_length = draft(now);
        max_length.duration_days = 5;
        max_length.duration_hours = 12;
        assert!(validate_draft(&max_length, 0, now).is_ok());

        let mut too_soon = draft(now);
        too_soon.start_time = now + Duration::seconds(30);
        assert_eq!(validate_draft(&too_soon, 0, now).unwrap_err().field, "start_time");

        let mut too_late = draft(now);
        too_late.start_time = now + Duration::days(5) + Duration::minutes(1);
        assert_eq!(validate_draft(&too_late, 0, now).unwrap_err().field, "start_time");

        assert_eq!(validate_draft(&draft(now), 5, now).unwrap_err().field, "photos");
    }

    #[test]
    fn negative_prices_are_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut bad = draft(now);
        bad.reserve_bid = -1;
        assert_eq!(validate_draft(&bad, 0, now).unwrap_err().field, "starting_bid");
    }
}
