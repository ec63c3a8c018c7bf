use crate::auction::model::Auction;
use serde::{Deserialize, Serialize};

/// 경매 결과
/// 종료 여부와 무관하게 계산되며, 단계 확인은 호출자 책임이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    NoBids,
    ReserveNotMet { amount: i64 },
    Won { winner_id: String, amount: i64 },
}

pub fn outcome_of(auction: &Auction) -> Outcome {
    let Some(amount) = auction.current_bid else {
        return Outcome::NoBids;
    };
    if amount < auction.reserve_bid {
        return Outcome::ReserveNotMet { amount };
    }
    match auction
        .winning_bidder_id
        .as_ref()
        .or(auction.current_bidder_id.as_ref())
    {
        Some(winner_id) => Outcome::Won {
            winner_id: winner_id.clone(),
            amount,
        },
        None => Outcome::NoBids,
    }
}
