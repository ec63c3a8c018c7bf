use crate::error::ValidationError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// region:    --- Enums
/// 상품 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    NewWithPackaging,
    NewWithoutPackaging,
    Used,
}

/// 거래 지역
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Location {
    Ireland,
    IrelandUk,
    Europe,
}

/// 배송 방법
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Delivery {
    Collection,
    Postage,
    Both,
}

// DB에는 serde 표기와 같은 문자열로 저장한다.
macro_rules! text_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                match value.as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(ValidationError::new($field, format!("알 수 없는 값: {}", other))),
                }
            }
        }
    };
}

text_enum!(Condition, "condition", {
    NewWithPackaging => "NEW_WITH_PACKAGING",
    NewWithoutPackaging => "NEW_WITHOUT_PACKAGING",
    Used => "USED",
});

text_enum!(Location, "location", {
    Ireland => "IRELAND",
    IrelandUk => "IRELAND_UK",
    Europe => "EUROPE",
});

text_enum!(Delivery, "delivery", {
    Collection => "COLLECTION",
    Postage => "POSTAGE",
    Both => "BOTH",
});
// endregion: --- Enums

// region:    --- Auction
// 경매 모델
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub condition: Condition,
    #[sqlx(try_from = "String")]
    pub location: Location,
    #[sqlx(try_from = "String")]
    pub delivery: Delivery,
    pub only_verified: bool,
    pub seller_verified: bool,
    pub start_time: DateTime<Utc>,
    pub duration_days: i32,
    pub duration_hours: i32,
    pub end_time: DateTime<Utc>,
    pub starting_bid: i64,
    pub reserve_bid: i64,
    pub current_bid: Option<i64>,
    pub current_bidder_id: Option<String>,
    pub winning_bidder_id: Option<String>,
    pub created_by: String,
    pub finished: bool,
    pub version: i64,
    pub thumbnail_url: String,
    pub photo_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    /// 다음 입찰이 넘어야 하는 기준 금액
    pub fn price_floor(&self) -> i64 {
        self.current_bid.unwrap_or(self.starting_bid)
    }
}

/// 시작 시각과 기간으로 종료 시각 계산
pub fn end_time_for(start_time: DateTime<Utc>, days: i32, hours: i32) -> DateTime<Utc> {
    start_time + Duration::days(i64::from(days)) + Duration::hours(i64::from(hours))
}
// endregion: --- Auction

// region:    --- New Auction
/// 판매자가 입력한 경매 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
    pub location: Location,
    pub delivery: Delivery,
    #[serde(default)]
    pub only_verified: bool,
    pub start_time: DateTime<Utc>,
    pub duration_days: i32,
    pub duration_hours: i32,
    pub starting_bid: i64,
    pub reserve_bid: i64,
}

/// 검증과 미디어 업로드가 끝난 저장용 경매
#[derive(Debug, Clone)]
pub struct NewAuction {
    pub draft: AuctionDraft,
    pub created_by: String,
    pub seller_verified: bool,
    pub end_time: DateTime<Utc>,
    pub thumbnail_url: String,
    pub photo_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}
// endregion: --- New Auction
