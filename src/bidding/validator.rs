/// 입찰 규칙 검사기
/// 스냅샷 기준의 순수 판정만 수행하며 부수 효과가 없다.
/// 스냅샷은 동시성 하에서 낡을 수 있으므로, 커밋 시점에 최신 상태로 재검증된다.
// region:    --- Imports
use chrono::{DateTime, Utc};

use crate::bidding::model::{AuctionRecord, AuctionStatus};
use crate::error::MarketError;
// endregion: --- Imports

// region:    --- Decision
/// 검증 통과 시의 입찰 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidDecision {
    /// 일반 증액 입찰
    Raise,
    /// 즉시 구매가 이상의 입찰 (증액 규칙을 건너뛴다)
    BuyNow,
}
// endregion: --- Decision

// region:    --- Validator
/// 입찰 검증
/// 규칙 순서:
/// 1. 경매가 진행 중이고 마감 전이어야 한다.
/// 2. 퇴장된 입찰자, (허용 안 된 경우) 신규 입찰자는 거부된다.
/// 3. 즉시 구매가 이상이면 증액 검사 없이 즉시 구매로 판정한다.
/// 4. 그 외에는 현재가 + 입찰 단위 이상이어야 하고, 증액분이 입찰 단위의 배수여야 한다.
pub fn validate(
    auction: &AuctionRecord,
    is_known_bidder: bool,
    bidder_id: i64,
    bid_amount: i64,
    now: DateTime<Utc>,
) -> Result<BidDecision, MarketError> {
    if now < auction.start_time {
        return Err(MarketError::AuctionNotStarted);
    }
    if auction.status != AuctionStatus::Active || now >= auction.end_time {
        return Err(MarketError::AuctionClosed);
    }
    if auction.is_kicked(bidder_id) {
        return Err(MarketError::BidderKicked);
    }
    if !auction.allow_new_bidders && !is_known_bidder {
        return Err(MarketError::NewBidderBlocked);
    }

    if let Some(buy_now_price) = auction.buy_now_price {
        if bid_amount >= buy_now_price {
            return Ok(BidDecision::BuyNow);
        }
    }

    let minimum = auction.current_price + auction.step_price;
    if bid_amount <= auction.current_price {
        return Err(MarketError::BidTooLow { minimum });
    }
    if (bid_amount - auction.current_price) % auction.step_price != 0 {
        return Err(MarketError::InvalidIncrement {
            step: auction.step_price,
        });
    }
    if bid_amount < minimum {
        return Err(MarketError::BidTooLow { minimum });
    }

    Ok(BidDecision::Raise)
}
// endregion: --- Validator
