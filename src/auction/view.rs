use crate::auction::lifecycle::{phase_of, time_remaining, timer_text, Phase};
use crate::auction::model::Auction;
use crate::auction::outcome::{outcome_of, Outcome};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 경매 상세 화면 뷰 모델
/// 저장된 경매와 현재 시각만으로 만들어진다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuctionView {
    pub auction: Auction,
    pub phase: Phase,
    pub timer_text: String,
    pub seconds_remaining: Option<i64>,
    pub bidding_open: bool,
    pub bid_label: &'static str,
    /// 종료된 경매에만 채워진다
    pub outcome: Option<Outcome>,
    pub computed_at: DateTime<Utc>,
}

impl AuctionView {
    pub fn build(auction: &Auction, now: DateTime<Utc>) -> Self {
        let phase = phase_of(auction, now);
        let ended = phase == Phase::Ended || auction.finished;
        let bid_label = if auction.finished && auction.current_bid.is_some() {
            "Winning Bid"
        } else {
            "Current Bid"
        };

        Self {
            auction: auction.clone(),
            phase,
            timer_text: timer_text(auction, now),
            seconds_remaining: time_remaining(auction, now).map(|left| left.num_seconds()),
            bidding_open: phase == Phase::Active && !auction.finished,
            bid_label,
            outcome: ended.then(|| outcome_of(auction)),
            computed_at: now,
        }
    }
}
