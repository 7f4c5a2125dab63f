/// 입찰 관련 커맨드 처리
/// 1. 입찰 (즉시 구매가 도달 시 즉시 낙찰 포함)
/// 2. 입찰자 퇴장
// region:    --- Imports
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bidding::model::{AuctionRecord, AuctionStatus, Bid};
use crate::bidding::{expiry, policy, validator};
use crate::error::MarketError;
use crate::order::model::Order;
use crate::store::{AuctionHead, BidCommit, CommitOutcome, MarketStore};
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub product_id: i64,
    pub bidder_id: i64,
    pub bid_amount: i64,
}

/// 입찰자 퇴장 명령 (판매자 전용)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KickBidderCommand {
    pub product_id: i64,
    pub actor_id: i64,
    pub bidder_id: i64,
}

/// 입찰 커밋 결과
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BidReceipt {
    pub current_price: i64,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub bought_now: bool,
}

// CAS 충돌 시 최대 재시도 횟수
const MAX_RETRIES: u32 = 3;

/// 1. 입찰
/// 스냅샷 검증 -> 자동 연장 판정 -> 헤드 CAS 커밋(+원장 추가)을 반복한다.
/// 충돌이 나면 최신 상태로 재검증하는데, 직전 라운드에서 유효했던 금액이
/// 가격 규칙에서 탈락하면 경합 패배(OUTBID)로 보고한다.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    store: &dyn MarketStore,
) -> Result<BidReceipt, MarketError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    let settings = store.get_settings().await?;
    let mut contested = false;

    for _ in 0..MAX_RETRIES {
        let now = Utc::now();

        // 마감이 지난 경매는 먼저 종료 전이시킨다 (지연 종료)
        expiry::finalize_if_due(store, cmd.product_id, now).await?;

        let auction = store.get_auction(cmd.product_id).await?;
        let is_known_bidder = store.has_bid_from(cmd.product_id, cmd.bidder_id).await?;

        let decision = match validator::validate(
            &auction,
            is_known_bidder,
            cmd.bidder_id,
            cmd.bid_amount,
            now,
        ) {
            Ok(decision) => decision,
            // 경합에 밀려 재검증에서 가격 규칙이 깨진 경우
            Err(MarketError::BidTooLow { .. } | MarketError::InvalidIncrement { .. })
                if contested =>
            {
                return Err(MarketError::Outbid {
                    current_price: auction.current_price,
                })
            }
            Err(e) => return Err(e),
        };

        let buy_now = decision == validator::BidDecision::BuyNow;
        // 즉시 구매는 입찰가 대신 즉시 구매가로 확정한다
        let new_price = if buy_now {
            auction.buy_now_price.unwrap_or(cmd.bid_amount)
        } else {
            cmd.bid_amount
        };
        let new_end_time = if buy_now {
            None
        } else {
            policy::extended_end_time(&auction, &settings, now)
        };

        let expected = AuctionHead {
            current_price: auction.current_price,
            end_time: auction.end_time,
        };
        let commit = BidCommit {
            new_price,
            bidder_id: cmd.bidder_id,
            new_end_time,
            close: buy_now,
            bid: Bid {
                product_id: cmd.product_id,
                bidder_id: cmd.bidder_id,
                bid_price: new_price,
                bid_time: now,
            },
        };

        match store.commit_bid(cmd.product_id, expected, commit).await? {
            CommitOutcome::Committed => {
                // 즉시 구매 낙찰은 결제 대기 주문을 곧바로 생성한다
                if buy_now {
                    let order = Order::new(cmd.product_id, auction.seller_id, cmd.bidder_id);
                    store.insert_order(order).await?;
                    info!(
                        "{:<12} --> 즉시 구매 낙찰: 상품 {} 구매자 {}",
                        "Command", cmd.product_id, cmd.bidder_id
                    );
                }
                return Ok(BidReceipt {
                    current_price: new_price,
                    end_time: new_end_time.unwrap_or(auction.end_time),
                    bought_now: buy_now,
                });
            }
            CommitOutcome::Conflict => {
                warn!(
                    "{:<12} --> 경매 헤드 버전 충돌: 재검증 후 재시도 (상품 {})",
                    "Command", cmd.product_id
                );
                contested = true;
                continue;
            }
        }
    }

    Err(MarketError::BidConflict)
}

/// 2. 입찰자 퇴장
/// 판매자만 호출할 수 있다. 퇴장된 입찰자는 이후 입찰이 거부되고,
/// 경매 헤드는 남은 유효 입찰 중 최고가로 되돌아간다.
pub async fn handle_kick_bidder(
    cmd: KickBidderCommand,
    store: &dyn MarketStore,
) -> Result<AuctionRecord, MarketError> {
    info!("{:<12} --> 입찰자 퇴장 요청: {:?}", "Command", cmd);

    let auction = store.get_auction(cmd.product_id).await?;
    if auction.seller_id != cmd.actor_id {
        return Err(MarketError::UnauthorizedActor);
    }
    if auction.status != AuctionStatus::Active {
        return Err(MarketError::AuctionClosed);
    }

    store.kick_bidder(cmd.product_id, cmd.bidder_id).await
}
// endregion: --- Commands
