// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
// endregion: --- Imports

// region:    --- Auction Status
/// 경매 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Active,
    Ended,
    Cancelled,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Ended => "ENDED",
            AuctionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(AuctionStatus::Active),
            "ENDED" => Some(AuctionStatus::Ended),
            "CANCELLED" => Some(AuctionStatus::Cancelled),
            _ => None,
        }
    }
}
// endregion: --- Auction Status

// region:    --- Auction Record
/// 상품별 경매 레코드
/// 가격/최고 입찰자/마감 시각은 AuctionWriter의 CAS 커밋으로만 변경된다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub product_id: i64,
    pub seller_id: i64,
    pub start_price: i64,
    pub step_price: i64,
    pub buy_now_price: Option<i64>,
    pub current_price: i64,
    pub highest_bidder_id: Option<i64>,
    pub bidder_count: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AuctionStatus,
    pub auto_extend_enabled: bool,
    pub allow_new_bidders: bool,
    pub kicked_bidders: Vec<i64>,
}

impl AuctionRecord {
    /// 퇴장 처리된 입찰자인지 확인
    pub fn is_kicked(&self, bidder_id: i64) -> bool {
        self.kicked_bidders.contains(&bidder_id)
    }
}
// endregion: --- Auction Record

// region:    --- Bid
/// 입찰 원장 항목
/// AuctionWriter의 커밋 성공 시에만 생성되며, 이후 수정/삭제되지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub product_id: i64,
    pub bidder_id: i64,
    pub bid_price: i64,
    pub bid_time: DateTime<Utc>,
}
// endregion: --- Bid

// region:    --- System Setting
/// 전역 설정 (단일 행)
/// 자동 연장 정책과 신규 상품 뱃지 판정에 읽기 전용으로 소비된다. 단위는 분.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SystemSetting {
    pub auto_extend_before: i64,
    pub auto_extend_duration: i64,
    pub latest_product_time: i64,
}

impl Default for SystemSetting {
    fn default() -> Self {
        Self {
            auto_extend_before: 5,
            auto_extend_duration: 10,
            latest_product_time: 1440,
        }
    }
}
// endregion: --- System Setting
