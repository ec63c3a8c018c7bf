/// 경매 목록 필터
/// 각 항목은 비어 있으면 조건 없음. 종료된 경매는 항상 제외한다.
use crate::auction::model::{Auction, Condition, Delivery, Location};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 남은 시간 구간
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemainingBucket {
    /// 24시간 초과
    MoreThanDay,
    /// 12시간 초과 24시간 이하
    #[serde(rename = "BETWEEN_12_AND_24_HOURS")]
    Between12And24Hours,
    /// 12시간 이하
    #[serde(rename = "LESS_THAN_12_HOURS")]
    LessThan12Hours,
}

impl RemainingBucket {
    fn contains(&self, seconds_left: i64) -> bool {
        match self {
            RemainingBucket::MoreThanDay => seconds_left > 86_400,
            RemainingBucket::Between12And24Hours => seconds_left > 43_200 && seconds_left <= 86_400,
            RemainingBucket::LessThan12Hours => seconds_left <= 43_200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SellerVerification {
    Verified,
    Unverified,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuctionFilter {
    /// 제목 검색 (대소문자 무시, 부분 일치)
    #[serde(default)]
    pub search: Option<String>,
    /// 현재 입찰가(없으면 시작가) 상한
    #[serde(default)]
    pub max_bid: Option<i64>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub deliveries: Vec<Delivery>,
    #[serde(default)]
    pub seller_verification: Vec<SellerVerification>,
    #[serde(default)]
    pub remaining: Vec<RemainingBucket>,
}

fn any_or_empty<T>(allowed: &[T], pred: impl Fn(&T) -> bool) -> bool {
    allowed.is_empty() || allowed.iter().any(pred)
}

impl AuctionFilter {
    pub fn matches(&self, auction: &Auction, now: DateTime<Utc>) -> bool {
        if now >= auction.end_time {
            return false;
        }

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if !auction.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }

        if let Some(max_bid) = self.max_bid {
            if auction.price_floor() > max_bid {
                return false;
            }
        }

        let seconds_left = (auction.end_time - now).num_seconds();

        any_or_empty(&self.conditions, |c| *c == auction.condition)
            && any_or_empty(&self.locations, |l| *l == auction.location)
            && any_or_empty(&self.deliveries, |d| *d == auction.delivery)
            && any_or_empty(&self.seller_verification, |v| match v {
                SellerVerification::Verified => auction.seller_verified,
                SellerVerification::Unverified => !auction.seller_verified,
            })
            && any_or_empty(&self.remaining, |bucket| bucket.contains(seconds_left))
    }

    pub fn apply(&self, auctions: Vec<Auction>, now: DateTime<Utc>) -> Vec<Auction> {
        auctions.into_iter().filter(|a| self.matches(a, now)).collect()
    }
}
