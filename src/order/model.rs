// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
// endregion: --- Imports

// region:    --- Order Status
/// 주문 상태
/// 전이는 결제 -> 발송 확인 -> 배송 -> 수령 -> 완료의 한 방향으로만 진행되고,
/// 취소는 비종결 상태(수령 전)에서만 가능하다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    PendingConfirmation,
    Shipping,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::PendingConfirmation => "PENDING_CONFIRMATION",
            OrderStatus::Shipping => "SHIPPING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING_PAYMENT" => Some(OrderStatus::PendingPayment),
            "PENDING_CONFIRMATION" => Some(OrderStatus::PendingConfirmation),
            "SHIPPING" => Some(OrderStatus::Shipping),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// 취소 가능한 상태인지 (수령 이후에는 취소 불가)
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            OrderStatus::PendingPayment | OrderStatus::PendingConfirmation | OrderStatus::Shipping
        )
    }
}
// endregion: --- Order Status

// region:    --- Order Role
/// 요청자 id로부터 한 번 해석되는 주문 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderRole {
    Buyer,
    Seller,
}

impl OrderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderRole::Buyer => "buyer",
            OrderRole::Seller => "seller",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buyer" => Some(OrderRole::Buyer),
            "seller" => Some(OrderRole::Seller),
            _ => None,
        }
    }
}
// endregion: --- Order Role

// region:    --- Review
/// 역할별 후기 문서
/// 작성자 본인만 갱신하며, 저장할 때마다 is_synced가 false로 내려간다.
/// is_synced는 외부 평점 집계기가 반영 후 올린다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub is_good: bool,
    pub content: String,
    pub last_updated: DateTime<Utc>,
    pub is_synced: bool,
}

/// 후기 작성/수정 요청 본문
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub is_good: bool,
    pub content: String,
}
// endregion: --- Review

// region:    --- Order
/// 이행 절차에서 채워지는 결제/배송 정보
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FulfillmentInfo {
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub payment_proof_image: Option<String>,
    pub shipping_proof_image: Option<String>,
}

/// 전이 시각 기록 (각 필드는 해당 전이 시점에 정확히 한 번 기록된다)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timelines {
    pub payment_submitted: Option<DateTime<Utc>>,
    pub seller_confirmed: Option<DateTime<Utc>>,
    pub buyer_received: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
}

/// 낙찰된 경매당 하나 생성되는 주문
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub product_id: i64,
    pub seller_id: i64,
    pub buyer_id: i64,
    pub status: OrderStatus,
    pub fulfillment: FulfillmentInfo,
    pub review_by_seller: Option<Review>,
    pub review_by_buyer: Option<Review>,
    pub timelines: Timelines,
}

impl Order {
    /// 낙찰 직후의 결제 대기 주문
    pub fn new(product_id: i64, seller_id: i64, buyer_id: i64) -> Self {
        Self {
            product_id,
            seller_id,
            buyer_id,
            status: OrderStatus::PendingPayment,
            fulfillment: FulfillmentInfo::default(),
            review_by_seller: None,
            review_by_buyer: None,
            timelines: Timelines::default(),
        }
    }

    /// 요청자 id를 역할로 해석한다. 거래 당사자가 아니면 None.
    pub fn role_of(&self, actor_id: i64) -> Option<OrderRole> {
        if actor_id == self.buyer_id {
            Some(OrderRole::Buyer)
        } else if actor_id == self.seller_id {
            Some(OrderRole::Seller)
        } else {
            None
        }
    }
}
// endregion: --- Order

// region:    --- Order Update
/// 상태 CAS 전이와 함께 적용되는 갱신 내용
#[derive(Debug, Clone)]
pub enum OrderUpdate {
    PaymentSubmitted {
        full_name: String,
        address: String,
        payment_proof_image: String,
        at: DateTime<Utc>,
    },
    ShipmentConfirmed {
        shipping_proof_image: String,
        at: DateTime<Utc>,
    },
    DeliveryConfirmed {
        at: DateTime<Utc>,
    },
    Closed {
        at: DateTime<Utc>,
    },
    Cancelled,
}

impl OrderUpdate {
    /// 전이 결과 상태
    pub fn next_status(&self) -> OrderStatus {
        match self {
            OrderUpdate::PaymentSubmitted { .. } => OrderStatus::PendingConfirmation,
            OrderUpdate::ShipmentConfirmed { .. } => OrderStatus::Shipping,
            OrderUpdate::DeliveryConfirmed { .. } => OrderStatus::Delivered,
            OrderUpdate::Closed { .. } => OrderStatus::Completed,
            OrderUpdate::Cancelled => OrderStatus::Cancelled,
        }
    }
}
// endregion: --- Order Update
