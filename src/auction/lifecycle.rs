/// 경매 생명주기
/// 1. 단계 계산 (대기 / 진행 / 종료)
/// 2. 남은 시간 표시
/// 3. 종료 표시 (finished 플래그)
// region:    --- Imports
use crate::auction::model::Auction;
use crate::error::AppError;
use crate::store::AuctionRepository;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Pending,
    Active,
    Ended,
}

/// 시작/종료 시각과 현재 시각으로 단계 계산
pub fn phase_between(start_time: DateTime<Utc>, end_time: DateTime<Utc>, now: DateTime<Utc>) -> Phase {
    if now < start_time {
        Phase::Pending
    } else if now < end_time {
        Phase::Active
    } else {
        Phase::Ended
    }
}

pub fn phase_of(auction: &Auction, now: DateTime<Utc>) -> Phase {
    phase_between(auction.start_time, auction.end_time, now)
}

/// 대기 중이면 시작까지, 진행 중이면 종료까지 남은 시간
pub fn time_remaining(auction: &Auction, now: DateTime<Utc>) -> Option<Duration> {
    match phase_of(auction, now) {
        Phase::Pending => Some(auction.start_time - now),
        Phase::Active => Some(auction.end_time - now),
        Phase::Ended => None,
    }
}
// endregion: --- Phase

// region:    --- Timer Text
fn format_hms(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

/// 경매 상세 화면의 타이머 문구
pub fn timer_text(auction: &Auction, now: DateTime<Utc>) -> String {
    match (phase_of(auction, now), time_remaining(auction, now)) {
        (Phase::Pending, Some(left)) => {
            format!("Bidding Begins In: {}", format_hms(left.num_seconds()))
        }
        (Phase::Active, Some(left)) => {
            format!("Auction Ends In: {}", format_hms(left.num_seconds()))
        }
        _ => "Auction Ended".to_string(),
    }
}

/// 목록 화면의 남은 시간 문구 (일 단위 포함)
pub fn time_left_text(end_time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let left = end_time - now;
    if left <= Duration::zero() {
        return "The auction has ended.".to_string();
    }
    let total = left.num_seconds();
    let days = total / 86_400;
    format!("{}d {}", days, format_hms(total % 86_400))
}
// endregion: --- Timer Text

// region:    --- Finish
/// 종료 시각이 지난 경매를 finished로 표시
/// 이미 종료 표시된 경매에는 아무것도 하지 않는다. 실제로 전이가 일어났으면 true.
pub async fn mark_finished_if_due(
    auctions: &dyn AuctionRepository,
    auction: &mut Auction,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    if auction.finished || phase_of(auction, now) != Phase::Ended {
        return Ok(false);
    }

    if auctions.mark_finished(auction.id, now).await? {
        auction.finished = true;
        auction.version += 1;
        info!("{:<12} --> 경매 종료 처리 id: {}", "Lifecycle", auction.id);
        return Ok(true);
    }

    // 다른 기록자가 먼저 전이했거나 레코드가 없는 경우. 저장된 상태를 따른다.
    if let Some(latest) = auctions.find_by_id(auction.id).await? {
        *auction = latest;
    }
    Ok(false)
}
// endregion: --- Finish
