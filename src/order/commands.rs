/// 주문 이행 커맨드 처리
/// 1. 이행 단계 전이 (결제 제출 / 발송 확인 / 수령 확인 / 거래 종료 / 취소)
/// 2. 역할별 후기 작성
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::MarketError;
use crate::order::model::{Order, OrderRole, OrderStatus, OrderUpdate, Review, ReviewDraft};
use crate::store::{CommitOutcome, MarketStore};
// endregion: --- Imports

// region:    --- Actions
/// 이행 단계 액션
/// 각 액션은 §전이표의 역할/현재 상태 전제 조건을 가진다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderAction {
    SubmitPayment {
        full_name: String,
        address: String,
        payment_proof_image: String,
    },
    ConfirmShipment {
        shipping_proof_image: String,
    },
    ConfirmDelivery,
    Close,
    Cancel,
}

impl OrderAction {
    fn name(&self) -> &'static str {
        match self {
            OrderAction::SubmitPayment { .. } => "SubmitPayment",
            OrderAction::ConfirmShipment { .. } => "ConfirmShipment",
            OrderAction::ConfirmDelivery => "ConfirmDelivery",
            OrderAction::Close => "Close",
            OrderAction::Cancel => "Cancel",
        }
    }
}
// endregion: --- Actions

// region:    --- Transition Table
/// 전이표 판정 (순수 함수)
/// 역할이 맞지 않으면 UnauthorizedActor, 현재 상태에서 허용되지 않는
/// 액션이면 InvalidStateTransition을 돌려준다.
fn plan_transition(
    current: OrderStatus,
    role: OrderRole,
    action: OrderAction,
    now: DateTime<Utc>,
) -> Result<OrderUpdate, MarketError> {
    let invalid = || MarketError::InvalidStateTransition {
        current: current.as_str().to_string(),
    };

    match action {
        OrderAction::SubmitPayment {
            full_name,
            address,
            payment_proof_image,
        } => {
            if role != OrderRole::Buyer {
                return Err(MarketError::UnauthorizedActor);
            }
            if current != OrderStatus::PendingPayment {
                return Err(invalid());
            }
            Ok(OrderUpdate::PaymentSubmitted {
                full_name,
                address,
                payment_proof_image,
                at: now,
            })
        }
        OrderAction::ConfirmShipment {
            shipping_proof_image,
        } => {
            if role != OrderRole::Seller {
                return Err(MarketError::UnauthorizedActor);
            }
            if current != OrderStatus::PendingConfirmation {
                return Err(invalid());
            }
            Ok(OrderUpdate::ShipmentConfirmed {
                shipping_proof_image,
                at: now,
            })
        }
        OrderAction::ConfirmDelivery => {
            if role != OrderRole::Buyer {
                return Err(MarketError::UnauthorizedActor);
            }
            if current != OrderStatus::Shipping {
                return Err(invalid());
            }
            Ok(OrderUpdate::DeliveryConfirmed { at: now })
        }
        // 거래 종료는 양쪽 모두 호출할 수 있다
        OrderAction::Close => {
            if current != OrderStatus::Delivered {
                return Err(invalid());
            }
            Ok(OrderUpdate::Closed { at: now })
        }
        // 취소는 판매자(또는 시스템) 권한, 수령 전까지만
        OrderAction::Cancel => {
            if role != OrderRole::Seller {
                return Err(MarketError::UnauthorizedActor);
            }
            if !current.is_cancellable() {
                return Err(invalid());
            }
            Ok(OrderUpdate::Cancelled)
        }
    }
}
// endregion: --- Transition Table

// region:    --- Commands
/// 이행 단계 전이 처리
/// 전이표 판정 후 상태 CAS로 적용한다. 중복 요청은 저장된 상태가
/// 전제와 달라져 CAS에서 걸러진다.
pub async fn apply_order_action(
    store: &dyn MarketStore,
    product_id: i64,
    actor_id: i64,
    action: OrderAction,
) -> Result<Order, MarketError> {
    info!(
        "{:<12} --> 주문 전이 요청: 상품 {} 액션 {}",
        "Command",
        product_id,
        action.name()
    );

    let order = store.get_order(product_id).await?;
    let role = order.role_of(actor_id).ok_or(MarketError::UnauthorizedActor)?;
    let update = plan_transition(order.status, role, action, Utc::now())?;

    match store
        .try_transition_order(product_id, order.status, update)
        .await?
    {
        CommitOutcome::Committed => store.get_order(product_id).await,
        // 읽은 사이에 상태가 바뀌었다 (중복 제출 등)
        CommitOutcome::Conflict => {
            let fresh = store.get_order(product_id).await?;
            Err(MarketError::InvalidStateTransition {
                current: fresh.status.as_str().to_string(),
            })
        }
    }
}

/// 역할별 후기 작성/수정
/// 취소된 주문에는 작성할 수 없고, 저장 시마다 is_synced는 false로 내려간다.
pub async fn upsert_review(
    store: &dyn MarketStore,
    product_id: i64,
    actor_id: i64,
    draft: ReviewDraft,
) -> Result<Review, MarketError> {
    info!("{:<12} --> 후기 저장 요청: 상품 {}", "Command", product_id);

    let order = store.get_order(product_id).await?;
    let role = order.role_of(actor_id).ok_or(MarketError::UnauthorizedActor)?;
    if order.status == OrderStatus::Cancelled {
        return Err(MarketError::InvalidStateTransition {
            current: order.status.as_str().to_string(),
        });
    }

    store
        .upsert_review(product_id, role, draft, Utc::now())
        .await
}
// endregion: --- Commands
