use auction_market::bidding::commands::{
    handle_kick_bidder, handle_place_bid, BidReceipt, KickBidderCommand, PlaceBidCommand,
};
use auction_market::bidding::expiry;
use auction_market::bidding::model::{AuctionRecord, AuctionStatus, SystemSetting};
use auction_market::error::MarketError;
use auction_market::order::model::OrderStatus;
use auction_market::store::memory::MemoryStore;
use auction_market::store::MarketStore;
use auction_market::store::{AuctionHead, BidCommit, CommitOutcome};
use chrono::{Duration, Utc};
use std::sync::Arc;

const SELLER_ID: i64 = 900;

/// 테스트용 경매 레코드 생성
fn test_auction(
    product_id: i64,
    start_price: i64,
    step_price: i64,
    buy_now_price: Option<i64>,
) -> AuctionRecord {
    let now = Utc::now();
    AuctionRecord {
        product_id,
        seller_id: SELLER_ID,
        start_price,
        step_price,
        buy_now_price,
        current_price: start_price,
        highest_bidder_id: None,
        bidder_count: 0,
        start_time: now - Duration::minutes(1),
        end_time: now + Duration::hours(2),
        status: AuctionStatus::Active,
        auto_extend_enabled: true,
        allow_new_bidders: true,
        kicked_bidders: Vec::new(),
    }
}

/// 저장소 설정 및 경매 등록
async fn setup(auction: AuctionRecord) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_auction(auction).await.unwrap();
    store
}

async fn bid(
    store: &MemoryStore,
    product_id: i64,
    bidder_id: i64,
    bid_amount: i64,
) -> Result<BidReceipt, MarketError> {
    handle_place_bid(
        PlaceBidCommand {
            product_id,
            bidder_id,
            bid_amount,
        },
        store,
    )
    .await
}

/// 입찰 단위 시나리오: 정상 증액은 수락, 단위가 어긋난 증액은 거부
#[tokio::test]
async fn test_step_price_rules() {
    let store = setup(test_auction(1, 100_000, 50_000, None)).await;

    let receipt = bid(&store, 1, 1, 150_000).await.unwrap();
    assert_eq!(receipt.current_price, 150_000);
    assert!(!receipt.bought_now);
    assert_eq!(store.get_auction(1).await.unwrap().current_price, 150_000);

    // 증액분 20,000은 입찰 단위 50,000의 배수가 아니다
    let err = bid(&store, 1, 2, 170_000).await.unwrap_err();
    assert!(matches!(err, MarketError::InvalidIncrement { step: 50_000 }));

    // 현재가 이하 입찰은 금액 미달
    let err = bid(&store, 1, 2, 150_000).await.unwrap_err();
    assert!(matches!(err, MarketError::BidTooLow { minimum: 200_000 }));

    let receipt = bid(&store, 1, 2, 200_000).await.unwrap();
    assert_eq!(receipt.current_price, 200_000);
}

/// 첫 입찰은 시작가 + 입찰 단위 이상이어야 한다
#[tokio::test]
async fn test_first_bid_minimum() {
    let store = setup(test_auction(1, 100_000, 50_000, None)).await;

    let err = bid(&store, 1, 1, 120_000).await.unwrap_err();
    assert!(matches!(err, MarketError::InvalidIncrement { .. }));
    let err = bid(&store, 1, 1, 100_000).await.unwrap_err();
    assert!(matches!(err, MarketError::BidTooLow { minimum: 150_000 }));

    // 원장이 비어 있으면 현재가는 시작가 그대로
    let auction = store.get_auction(1).await.unwrap();
    assert_eq!(auction.current_price, auction.start_price);
}

/// 즉시 구매 시나리오: 즉시 구매가 도달 시 경매가 바로 종료되고 주문이 생성된다
#[tokio::test]
async fn test_buy_now_ends_auction_and_creates_order() {
    let store = setup(test_auction(1, 100_000, 50_000, Some(2_000_000))).await;

    let receipt = bid(&store, 1, 7, 2_000_000).await.unwrap();
    assert!(receipt.bought_now);
    assert_eq!(receipt.current_price, 2_000_000);

    let auction = store.get_auction(1).await.unwrap();
    assert_eq!(auction.status, AuctionStatus::Ended);
    assert_eq!(auction.current_price, 2_000_000);
    assert_eq!(auction.highest_bidder_id, Some(7));

    let order = store.get_order(1).await.unwrap();
    assert_eq!(order.status, OrderStatus::PendingPayment);
    assert_eq!(order.buyer_id, 7);
    assert_eq!(order.seller_id, SELLER_ID);

    // 종료된 경매에는 더 이상 입찰할 수 없다
    let err = bid(&store, 1, 8, 2_050_000).await.unwrap_err();
    assert!(matches!(err, MarketError::AuctionClosed));
}

/// 즉시 구매가를 넘는 입찰도 즉시 구매가로 확정된다
#[tokio::test]
async fn test_buy_now_caps_at_buy_now_price() {
    let store = setup(test_auction(1, 100_000, 50_000, Some(2_000_000))).await;

    let receipt = bid(&store, 1, 7, 2_345_678).await.unwrap();
    assert!(receipt.bought_now);
    assert_eq!(receipt.current_price, 2_000_000);
    assert_eq!(store.get_auction(1).await.unwrap().current_price, 2_000_000);
}

/// 자동 연장 시나리오: 마감 3분 전 입찰 -> 마감이 now + 10분으로 밀린다
#[tokio::test]
async fn test_auto_extend_near_deadline() {
    let mut auction = test_auction(1, 100_000, 50_000, None);
    auction.end_time = Utc::now() + Duration::minutes(3);
    let old_end = auction.end_time;
    let store = setup(auction).await;
    store
        .update_settings(SystemSetting {
            auto_extend_before: 5,
            auto_extend_duration: 10,
            latest_product_time: 1440,
        })
        .await
        .unwrap();

    let before = Utc::now();
    let receipt = bid(&store, 1, 1, 150_000).await.unwrap();

    assert!(receipt.end_time > old_end);
    let extended_by = receipt.end_time - before;
    assert!(extended_by >= Duration::minutes(9) && extended_by <= Duration::minutes(11));
    assert_eq!(store.get_auction(1).await.unwrap().end_time, receipt.end_time);
}

/// 마감이 멀면 자동 연장되지 않는다
#[tokio::test]
async fn test_no_extend_outside_window() {
    let auction = test_auction(1, 100_000, 50_000, None);
    let old_end = auction.end_time;
    let store = setup(auction).await;

    let receipt = bid(&store, 1, 1, 150_000).await.unwrap();
    assert_eq!(receipt.end_time, old_end);
}

/// 자동 연장 비활성 경매는 마감 직전 입찰에도 연장되지 않는다
#[tokio::test]
async fn test_no_extend_when_disabled() {
    let mut auction = test_auction(1, 100_000, 50_000, None);
    auction.auto_extend_enabled = false;
    auction.end_time = Utc::now() + Duration::minutes(3);
    let old_end = auction.end_time;
    let store = setup(auction).await;

    let receipt = bid(&store, 1, 1, 150_000).await.unwrap();
    assert_eq!(receipt.end_time, old_end);
}

/// 원장 불변식: 수락 순서대로 가격이 강증가하고, 현재가는 마지막 입찰가와 같다
#[tokio::test]
async fn test_ledger_strictly_increasing() {
    let store = setup(test_auction(1, 100_000, 50_000, None)).await;

    for (bidder_id, amount) in [(1, 150_000), (2, 200_000), (1, 300_000), (3, 350_000)] {
        bid(&store, 1, bidder_id, amount).await.unwrap();
    }

    // 이력은 최신 순으로 반환된다
    let history = store.bid_history(1).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].bid_price, 350_000);

    let mut in_acceptance_order: Vec<i64> = history.iter().map(|b| b.bid_price).collect();
    in_acceptance_order.reverse();
    assert!(in_acceptance_order.windows(2).all(|w| w[0] < w[1]));

    let auction = store.get_auction(1).await.unwrap();
    assert_eq!(auction.current_price, 350_000);
    assert_eq!(auction.highest_bidder_id, Some(3));
    assert_eq!(auction.bidder_count, 3);
}

/// 동시성 속성: 같은 금액의 경쟁 입찰 중 정확히 하나만 수락된다
#[tokio::test]
async fn test_concurrent_equal_bids() {
    let store = setup(test_auction(1, 100_000, 50_000, None)).await;

    let mut handles = Vec::new();
    for bidder_id in 1..=8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            bid(&store, 1, bidder_id, 150_000).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => {
                accepted += 1;
                assert_eq!(receipt.current_price, 150_000);
            }
            // 경합에 밀렸거나, 패자의 첫 검증 전에 이미 가격이 올라간 경우
            Err(MarketError::Outbid { current_price }) => assert_eq!(current_price, 150_000),
            Err(MarketError::BidTooLow { minimum }) => assert_eq!(minimum, 200_000),
            Err(e) => panic!("예상하지 못한 오류: {e:?}"),
        }
    }

    assert_eq!(accepted, 1, "같은 금액의 입찰은 정확히 하나만 수락되어야 한다");
    assert_eq!(store.bid_history(1).await.unwrap().len(), 1);
    assert_eq!(store.get_auction(1).await.unwrap().current_price, 150_000);
}

/// 저장소 CAS: 낡은 헤드로는 커밋할 수 없다
#[tokio::test]
async fn test_stale_head_commit_conflicts() {
    let store = setup(test_auction(1, 100_000, 50_000, None)).await;
    let auction = store.get_auction(1).await.unwrap();
    let stale = AuctionHead {
        current_price: auction.current_price,
        end_time: auction.end_time,
    };

    bid(&store, 1, 1, 150_000).await.unwrap();

    let now = Utc::now();
    let outcome = store
        .commit_bid(
            1,
            stale,
            BidCommit {
                new_price: 150_000,
                bidder_id: 2,
                new_end_time: None,
                close: false,
                bid: auction_market::bidding::model::Bid {
                    product_id: 1,
                    bidder_id: 2,
                    bid_price: 150_000,
                    bid_time: now,
                },
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome, CommitOutcome::Conflict);
    assert_eq!(store.bid_history(1).await.unwrap().len(), 1);
}

/// 경매 종료: 입찰이 있으면 주문이 생성되고, 재종료는 no-op이다
#[tokio::test]
async fn test_expiry_creates_order_once() {
    let mut auction = test_auction(1, 100_000, 50_000, None);
    // 자동 연장이 꺼진 채 곧 마감되는 경매
    auction.end_time = Utc::now() + Duration::seconds(30);
    auction.auto_extend_enabled = false;
    let store = setup(auction).await;

    bid(&store, 1, 5, 150_000).await.unwrap();
    let after_end = Utc::now() + Duration::seconds(60);

    let order = expiry::finalize_if_due(store.as_ref(), 1, after_end)
        .await
        .unwrap()
        .expect("주문이 생성되어야 한다");
    assert_eq!(order.buyer_id, 5);
    assert_eq!(order.status, OrderStatus::PendingPayment);
    assert_eq!(store.get_auction(1).await.unwrap().status, AuctionStatus::Ended);

    // 멱등성: 이미 종료된 경매의 재평가는 아무 일도 하지 않는다
    let again = expiry::finalize_if_due(store.as_ref(), 1, after_end)
        .await
        .unwrap();
    assert!(again.is_none());
    assert!(store.get_order(1).await.is_ok());
}

/// 입찰 없는 경매는 주문 없이 닫힌다
#[tokio::test]
async fn test_expiry_without_bids() {
    let mut auction = test_auction(1, 100_000, 50_000, None);
    auction.end_time = Utc::now() - Duration::seconds(1);
    let store = setup(auction).await;

    let order = expiry::finalize_if_due(store.as_ref(), 1, Utc::now())
        .await
        .unwrap();
    assert!(order.is_none());
    assert_eq!(store.get_auction(1).await.unwrap().status, AuctionStatus::Ended);
    assert!(matches!(
        store.get_order(1).await.unwrap_err(),
        MarketError::OrderNotFound(1)
    ));
}

/// 마감이 지난 경매에 대한 입찰은 종료 처리 후 거부된다
#[tokio::test]
async fn test_bid_after_deadline_rejected() {
    let mut auction = test_auction(1, 100_000, 50_000, None);
    auction.end_time = Utc::now() - Duration::seconds(1);
    let store = setup(auction).await;

    let err = bid(&store, 1, 1, 150_000).await.unwrap_err();
    assert!(matches!(err, MarketError::AuctionClosed));
    assert_eq!(store.get_auction(1).await.unwrap().status, AuctionStatus::Ended);
}

/// 스윕: 마감이 지난 경매들을 일괄 종료한다
#[tokio::test]
async fn test_sweep_finalizes_due_auctions() {
    let store = Arc::new(MemoryStore::new());
    for product_id in 1..=3 {
        let mut auction = test_auction(product_id, 100_000, 50_000, None);
        if product_id != 3 {
            auction.end_time = Utc::now() - Duration::seconds(1);
        }
        store.insert_auction(auction).await.unwrap();
    }

    let finalized = expiry::sweep(store.as_ref(), Utc::now()).await.unwrap();
    assert_eq!(finalized, 2);
    assert_eq!(store.get_auction(1).await.unwrap().status, AuctionStatus::Ended);
    assert_eq!(store.get_auction(3).await.unwrap().status, AuctionStatus::Active);

    // 재스윕은 아무것도 종료하지 않는다
    assert_eq!(expiry::sweep(store.as_ref(), Utc::now()).await.unwrap(), 0);
}

/// 시작 전 경매에는 입찰할 수 없다
#[tokio::test]
async fn test_bid_before_start_rejected() {
    let mut auction = test_auction(1, 100_000, 50_000, None);
    auction.start_time = Utc::now() + Duration::hours(1);
    let store = setup(auction).await;

    let err = bid(&store, 1, 1, 150_000).await.unwrap_err();
    assert!(matches!(err, MarketError::AuctionNotStarted));
}

/// 신규 입찰자 차단: 기존 입찰자만 계속 입찰할 수 있다
#[tokio::test]
async fn test_new_bidder_blocked() {
    let mut auction = test_auction(1, 100_000, 50_000, None);
    let store = setup(auction.clone()).await;
    bid(&store, 1, 1, 150_000).await.unwrap();

    // 차단 플래그를 올린 새 경매로 재구성
    auction.product_id = 2;
    auction.allow_new_bidders = false;
    store.insert_auction(auction).await.unwrap();

    let err = bid(&store, 2, 1, 150_000).await.unwrap_err();
    assert!(matches!(err, MarketError::NewBidderBlocked));

    // 허용 경매 쪽에서는 같은 입찰자가 계속 입찰할 수 있다
    assert!(bid(&store, 1, 1, 200_000).await.is_ok());
}

/// 입찰자 퇴장: 헤드가 남은 최고 입찰로 되돌아가고, 퇴장자는 재입찰할 수 없다
#[tokio::test]
async fn test_kick_reverts_head_and_bans() {
    let store = setup(test_auction(1, 100_000, 50_000, None)).await;
    bid(&store, 1, 1, 150_000).await.unwrap();
    bid(&store, 1, 2, 200_000).await.unwrap();

    let auction = handle_kick_bidder(
        KickBidderCommand {
            product_id: 1,
            actor_id: SELLER_ID,
            bidder_id: 2,
        },
        store.as_ref(),
    )
    .await
    .unwrap();

    assert_eq!(auction.current_price, 150_000);
    assert_eq!(auction.highest_bidder_id, Some(1));
    assert_eq!(auction.bidder_count, 1);
    // 원장은 보존된다
    assert_eq!(store.bid_history(1).await.unwrap().len(), 2);

    let err = bid(&store, 1, 2, 250_000).await.unwrap_err();
    assert!(matches!(err, MarketError::BidderKicked));

    // 다른 입찰자는 되돌려진 헤드 기준으로 입찰한다
    let receipt = bid(&store, 1, 3, 200_000).await.unwrap();
    assert_eq!(receipt.current_price, 200_000);
}

/// 퇴장 후 유효 입찰이 없으면 시작가로 되돌아간다
#[tokio::test]
async fn test_kick_sole_bidder_reverts_to_start_price() {
    let store = setup(test_auction(1, 100_000, 50_000, None)).await;
    bid(&store, 1, 1, 150_000).await.unwrap();

    let auction = handle_kick_bidder(
        KickBidderCommand {
            product_id: 1,
            actor_id: SELLER_ID,
            bidder_id: 1,
        },
        store.as_ref(),
    )
    .await
    .unwrap();

    assert_eq!(auction.current_price, 100_000);
    assert_eq!(auction.highest_bidder_id, None);
    assert_eq!(auction.bidder_count, 0);
}

/// 퇴장은 판매자만 할 수 있다
#[tokio::test]
async fn test_kick_requires_seller() {
    let store = setup(test_auction(1, 100_000, 50_000, None)).await;
    bid(&store, 1, 1, 150_000).await.unwrap();

    let err = handle_kick_bidder(
        KickBidderCommand {
            product_id: 1,
            actor_id: 1,
            bidder_id: 1,
        },
        store.as_ref(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MarketError::UnauthorizedActor));
}

/// 중복 경매 등록은 거부된다
#[tokio::test]
async fn test_duplicate_auction_rejected() {
    let store = setup(test_auction(1, 100_000, 50_000, None)).await;
    let err = store
        .insert_auction(test_auction(1, 100_000, 50_000, None))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::AlreadyExists(1)));
}
