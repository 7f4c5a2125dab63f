use auction_market::error::MarketError;
use auction_market::order::commands::{apply_order_action, upsert_review, OrderAction};
use auction_market::order::model::{Order, OrderRole, OrderStatus, ReviewDraft};
use auction_market::store::memory::MemoryStore;
use auction_market::store::MarketStore;
use std::sync::Arc;

const PRODUCT_ID: i64 = 1;
const SELLER_ID: i64 = 10;
const BUYER_ID: i64 = 20;
const OUTSIDER_ID: i64 = 99;

/// 결제 대기 주문이 들어 있는 저장소
async fn setup() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_order(Order::new(PRODUCT_ID, SELLER_ID, BUYER_ID))
        .await
        .unwrap();
    store
}

fn submit_payment() -> OrderAction {
    OrderAction::SubmitPayment {
        full_name: "김철수".to_string(),
        address: "서울특별시 마포구 1-2-3".to_string(),
        payment_proof_image: "1-payment-proof.png".to_string(),
    }
}

fn confirm_shipment() -> OrderAction {
    OrderAction::ConfirmShipment {
        shipping_proof_image: "1-shipping-proof.png".to_string(),
    }
}

/// 전체 이행 사이클: 결제 -> 발송 -> 수령 -> 종료
/// 각 전이 시각은 해당 단계에서 정확히 한 번 기록된다
#[tokio::test]
async fn test_full_fulfillment_cycle() {
    let store = setup().await;

    let order = apply_order_action(store.as_ref(), PRODUCT_ID, BUYER_ID, submit_payment())
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::PendingConfirmation);
    assert!(order.timelines.payment_submitted.is_some());
    assert_eq!(order.fulfillment.full_name.as_deref(), Some("김철수"));
    assert_eq!(
        order.fulfillment.payment_proof_image.as_deref(),
        Some("1-payment-proof.png")
    );

    let order = apply_order_action(store.as_ref(), PRODUCT_ID, SELLER_ID, confirm_shipment())
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Shipping);
    assert!(order.timelines.seller_confirmed.is_some());

    let order = apply_order_action(
        store.as_ref(),
        PRODUCT_ID,
        BUYER_ID,
        OrderAction::ConfirmDelivery,
    )
    .await
    .unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.timelines.buyer_received.is_some());

    // 거래 종료는 어느 쪽이든 호출할 수 있다
    let order = apply_order_action(store.as_ref(), PRODUCT_ID, SELLER_ID, OrderAction::Close)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert!(order.timelines.finished.is_some());

    // 앞 단계의 기록은 그대로 남는다
    assert!(order.timelines.payment_submitted.is_some());
    assert!(order.timelines.seller_confirmed.is_some());
    assert!(order.timelines.buyer_received.is_some());
}

/// 역할이 맞지 않는 요청은 거부된다
#[tokio::test]
async fn test_wrong_role_rejected() {
    let store = setup().await;

    // 판매자는 결제를 제출할 수 없다
    let err = apply_order_action(store.as_ref(), PRODUCT_ID, SELLER_ID, submit_payment())
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::UnauthorizedActor));

    // 구매자는 발송을 확인할 수 없다
    apply_order_action(store.as_ref(), PRODUCT_ID, BUYER_ID, submit_payment())
        .await
        .unwrap();
    let err = apply_order_action(store.as_ref(), PRODUCT_ID, BUYER_ID, confirm_shipment())
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::UnauthorizedActor));

    // 거래 당사자가 아니면 어떤 액션도 할 수 없다
    let err = apply_order_action(
        store.as_ref(),
        PRODUCT_ID,
        OUTSIDER_ID,
        OrderAction::Cancel,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MarketError::UnauthorizedActor));
}

/// 중복 제출: 이미 지나간 단계의 액션은 상태 전제에서 걸러진다
#[tokio::test]
async fn test_duplicate_submission_rejected() {
    let store = setup().await;

    apply_order_action(store.as_ref(), PRODUCT_ID, BUYER_ID, submit_payment())
        .await
        .unwrap();
    let err = apply_order_action(store.as_ref(), PRODUCT_ID, BUYER_ID, submit_payment())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MarketError::InvalidStateTransition { ref current } if current == "PENDING_CONFIRMATION"
    ));
}

/// 단계 건너뛰기는 허용되지 않는다
#[tokio::test]
async fn test_skipping_steps_rejected() {
    let store = setup().await;

    // 결제 전에 수령 확인은 불가
    let err = apply_order_action(
        store.as_ref(),
        PRODUCT_ID,
        BUYER_ID,
        OrderAction::ConfirmDelivery,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MarketError::InvalidStateTransition { .. }));

    // 수령 전에 거래 종료는 불가
    let err = apply_order_action(store.as_ref(), PRODUCT_ID, SELLER_ID, OrderAction::Close)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidStateTransition { .. }));
}

/// 수령 확인 후에는 취소할 수 없다 (시나리오 D)
#[tokio::test]
async fn test_cancel_after_delivery_rejected() {
    let store = setup().await;

    apply_order_action(store.as_ref(), PRODUCT_ID, BUYER_ID, submit_payment())
        .await
        .unwrap();
    apply_order_action(store.as_ref(), PRODUCT_ID, SELLER_ID, confirm_shipment())
        .await
        .unwrap();
    let order = apply_order_action(
        store.as_ref(),
        PRODUCT_ID,
        BUYER_ID,
        OrderAction::ConfirmDelivery,
    )
    .await
    .unwrap();
    assert!(order.timelines.buyer_received.is_some());

    let err = apply_order_action(store.as_ref(), PRODUCT_ID, SELLER_ID, OrderAction::Cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MarketError::InvalidStateTransition { ref current } if current == "DELIVERED"
    ));
}

/// 수령 전에는 판매자가 취소할 수 있고, 취소는 되돌릴 수 없다
#[tokio::test]
async fn test_seller_cancel_is_irreversible() {
    let store = setup().await;

    // 구매자는 취소 권한이 없다
    let err = apply_order_action(store.as_ref(), PRODUCT_ID, BUYER_ID, OrderAction::Cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::UnauthorizedActor));

    let order = apply_order_action(store.as_ref(), PRODUCT_ID, SELLER_ID, OrderAction::Cancel)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);

    // 취소된 주문은 더 이상 진행할 수 없다
    let err = apply_order_action(store.as_ref(), PRODUCT_ID, BUYER_ID, submit_payment())
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::InvalidStateTransition { .. }));
}

/// 후기 왕복: 저장한 내용이 그대로 조회되고, 집계 반영 전까지 is_synced는 false다
#[tokio::test]
async fn test_review_round_trip() {
    let store = setup().await;

    let review = upsert_review(
        store.as_ref(),
        PRODUCT_ID,
        BUYER_ID,
        ReviewDraft {
            is_good: true,
            content: "ok".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(review.is_good);
    assert!(!review.is_synced);

    let order = store.get_order(PRODUCT_ID).await.unwrap();
    let saved = order.review_by_buyer.as_ref().unwrap();
    assert!(saved.is_good);
    assert_eq!(saved.content, "ok");
    assert!(!saved.is_synced);
    // 상대방 후기에는 영향이 없다
    assert!(order.review_by_seller.is_none());

    // 외부 집계기 반영 표시
    store
        .mark_review_synced(PRODUCT_ID, OrderRole::Buyer)
        .await
        .unwrap();
    let order = store.get_order(PRODUCT_ID).await.unwrap();
    assert!(order.review_by_buyer.as_ref().unwrap().is_synced);

    // 수정하면 다시 미반영 상태로 내려간다
    upsert_review(
        store.as_ref(),
        PRODUCT_ID,
        BUYER_ID,
        ReviewDraft {
            is_good: false,
            content: "배송이 늦었어요".to_string(),
        },
    )
    .await
    .unwrap();
    let order = store.get_order(PRODUCT_ID).await.unwrap();
    let saved = order.review_by_buyer.as_ref().unwrap();
    assert!(!saved.is_good);
    assert!(!saved.is_synced);
}

/// 양쪽 후기는 서로 독립적으로 저장된다
#[tokio::test]
async fn test_reviews_are_independent_per_role() {
    let store = setup().await;

    upsert_review(
        store.as_ref(),
        PRODUCT_ID,
        BUYER_ID,
        ReviewDraft {
            is_good: true,
            content: "좋은 판매자입니다".to_string(),
        },
    )
    .await
    .unwrap();
    upsert_review(
        store.as_ref(),
        PRODUCT_ID,
        SELLER_ID,
        ReviewDraft {
            is_good: true,
            content: "입금이 빨랐습니다".to_string(),
        },
    )
    .await
    .unwrap();

    let order = store.get_order(PRODUCT_ID).await.unwrap();
    assert_eq!(
        order.review_by_buyer.as_ref().unwrap().content,
        "좋은 판매자입니다"
    );
    assert_eq!(
        order.review_by_seller.as_ref().unwrap().content,
        "입금이 빨랐습니다"
    );
}

/// 취소된 주문에는 후기를 쓸 수 없다
#[tokio::test]
async fn test_review_blocked_on_cancelled_order() {
    let store = setup().await;
    apply_order_action(store.as_ref(), PRODUCT_ID, SELLER_ID, OrderAction::Cancel)
        .await
        .unwrap();

    let err = upsert_review(
        store.as_ref(),
        PRODUCT_ID,
        BUYER_ID,
        ReviewDraft {
            is_good: false,
            content: "".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MarketError::InvalidStateTransition { .. }));
}

/// 거래 당사자가 아니면 후기를 쓸 수 없다
#[tokio::test]
async fn test_review_requires_participant() {
    let store = setup().await;
    let err = upsert_review(
        store.as_ref(),
        PRODUCT_ID,
        OUTSIDER_ID,
        ReviewDraft {
            is_good: true,
            content: "ok".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MarketError::UnauthorizedActor));
}

/// 주문 생성은 멱등이다: 재삽입해도 진행 상태를 덮어쓰지 않는다
#[tokio::test]
async fn test_insert_order_is_idempotent() {
    let store = setup().await;
    apply_order_action(store.as_ref(), PRODUCT_ID, BUYER_ID, submit_payment())
        .await
        .unwrap();

    store
        .insert_order(Order::new(PRODUCT_ID, SELLER_ID, BUYER_ID))
        .await
        .unwrap();
    let order = store.get_order(PRODUCT_ID).await.unwrap();
    assert_eq!(order.status, OrderStatus::PendingConfirmation);
}
