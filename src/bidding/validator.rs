use crate::auction::lifecycle::{phase_of, Phase};
use crate::auction::model::Auction;
use crate::bidding::model::BidRejection;
use crate::users::model::User;
use chrono::{DateTime, Utc};

/// 입찰 검증 (거절 사유는 정해진 순서로 검사)
pub fn validate_bid(
    auction: &Auction,
    bidder: Option<&User>,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<(), BidRejection> {
    match phase_of(auction, now) {
        Phase::Pending => return Err(BidRejection::NotStarted),
        // 종료 플래그 기록 전이라도 종료 시각이 지났으면 종료로 본다
        Phase::Ended => return Err(BidRejection::AuctionFinished),
        Phase::Active => {}
    }

    if auction.finished {
        return Err(BidRejection::AuctionFinished);
    }

    match auction.current_bid {
        None if amount < auction.starting_bid => {
            return Err(BidRejection::BelowStartingBid {
                starting_bid: auction.starting_bid,
            })
        }
        Some(current_bid) if amount <= current_bid => {
            return Err(BidRejection::BelowCurrentBid { current_bid })
        }
        _ => {}
    }

    if auction.only_verified && !bidder.is_some_and(|b| b.verified) {
        return Err(BidRejection::VerificationRequired);
    }

    let bidder = bidder.ok_or(BidRejection::SignInRequired)?;
    if bidder.id == auction.created_by {
        return Err(BidRejection::SelfBid);
    }

    Ok(())
}
