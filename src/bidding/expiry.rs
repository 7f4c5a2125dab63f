/// 경매 종료 처리
/// 마감이 지난 경매를 ENDED로 전이시키고, 입찰이 있었다면
/// 최고 입찰자를 구매자로 하는 결제 대기 주문을 생성한다.
/// 조회/입찰 시의 지연 확인과 스케줄러의 주기 스윕 양쪽에서 호출된다.
// region:    --- Imports
use chrono::{DateTime, Utc};
use tracing::info;

use crate::bidding::model::AuctionRecord;
use crate::error::MarketError;
use crate::order::model::Order;
use crate::store::MarketStore;
// endregion: --- Imports

// region:    --- Expiry
/// 마감 경과 시 종료 전이 (멱등)
/// 이미 종료된 경매에 대해서는 아무 일도 하지 않는다.
/// 전이가 지금 일어나고 입찰이 있었다면 생성된 주문을 돌려준다.
pub async fn finalize_if_due(
    store: &dyn MarketStore,
    product_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<Order>, MarketError> {
    let Some(auction) = store.finalize_auction(product_id, now).await? else {
        return Ok(None);
    };
    spawn_order(store, &auction).await
}

/// 마감이 지난 진행 중 경매 전체 스윕. 종료 전이 건수를 돌려준다.
pub async fn sweep(store: &dyn MarketStore, now: DateTime<Utc>) -> Result<usize, MarketError> {
    let due = store.due_auctions(now).await?;
    let mut finalized = 0;
    for product_id in due {
        if let Some(auction) = store.finalize_auction(product_id, now).await? {
            spawn_order(store, &auction).await?;
            finalized += 1;
        }
    }
    Ok(finalized)
}

/// 방금 종료된 경매에 대한 주문 생성
/// 입찰이 없었으면 주문 없이 닫힌다. 주문 생성 자체도 멱등이다.
async fn spawn_order(
    store: &dyn MarketStore,
    auction: &AuctionRecord,
) -> Result<Option<Order>, MarketError> {
    match auction.highest_bidder_id {
        Some(buyer_id) => {
            let order = Order::new(auction.product_id, auction.seller_id, buyer_id);
            store.insert_order(order.clone()).await?;
            info!(
                "{:<12} --> 경매 종료 및 주문 생성: 상품 {} 낙찰자 {}",
                "Expiry", auction.product_id, buyer_id
            );
            Ok(Some(order))
        }
        None => {
            info!(
                "{:<12} --> 입찰 없이 경매 종료: 상품 {}",
                "Expiry", auction.product_id
            );
            Ok(None)
        }
    }
}
// endregion: --- Expiry
