// region:    --- Imports
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::bidding::commands::{handle_kick_bidder, handle_place_bid, KickBidderCommand, PlaceBidCommand};
use crate::bidding::expiry;
use crate::bidding::model::{AuctionRecord, AuctionStatus, SystemSetting};
use crate::error::MarketError;
use crate::order::commands::{apply_order_action, upsert_review, OrderAction};
use crate::order::model::{Order, OrderRole, ReviewDraft};
use crate::store::SharedStore;

// endregion: --- Imports

// 증빙 이미지 저장 경로
const UPLOAD_DIR: &str = "uploads";

// region:    --- Auction Handlers

/// 경매 등록 요청 본문
#[derive(Debug, Deserialize)]
pub struct CreateAuctionRequest {
    pub product_id: i64,
    pub seller_id: i64,
    pub start_price: i64,
    pub step_price: i64,
    pub buy_now_price: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub auto_extend_enabled: bool,
    #[serde(default = "default_true")]
    pub allow_new_bidders: bool,
}

fn default_true() -> bool {
    true
}

/// 경매 등록
pub async fn handle_create_auction(
    State(store): State<SharedStore>,
    Json(req): Json<CreateAuctionRequest>,
) -> Result<Json<AuctionRecord>, MarketError> {
    info!("{:<12} --> 경매 등록 요청: 상품 {}", "Handler", req.product_id);

    if req.step_price <= 0 {
        return Err(MarketError::InvalidInput(
            "입찰 단위는 0보다 커야 합니다.".to_string(),
        ));
    }
    if req.start_price < 0 {
        return Err(MarketError::InvalidInput(
            "시작가는 0 이상이어야 합니다.".to_string(),
        ));
    }
    if req.end_time <= req.start_time {
        return Err(MarketError::InvalidInput(
            "마감 시각은 시작 시각 이후여야 합니다.".to_string(),
        ));
    }
    if let Some(buy_now_price) = req.buy_now_price {
        if buy_now_price <= req.start_price {
            return Err(MarketError::InvalidInput(
                "즉시 구매가는 시작가보다 높아야 합니다.".to_string(),
            ));
        }
    }

    let auction = AuctionRecord {
        product_id: req.product_id,
        seller_id: req.seller_id,
        start_price: req.start_price,
        step_price: req.step_price,
        buy_now_price: req.buy_now_price,
        current_price: req.start_price,
        highest_bidder_id: None,
        bidder_count: 0,
        start_time: req.start_time,
        end_time: req.end_time,
        status: AuctionStatus::Active,
        auto_extend_enabled: req.auto_extend_enabled,
        allow_new_bidders: req.allow_new_bidders,
        kicked_bidders: Vec::new(),
    };
    store.insert_auction(auction.clone()).await?;
    Ok(Json(auction))
}

/// 경매 상태 조회 (조회 시점에 마감 경과분을 지연 처리한다)
pub async fn handle_get_auction(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
) -> Result<Json<AuctionRecord>, MarketError> {
    info!("{:<12} --> 경매 상태 조회 id: {}", "Handler", product_id);
    expiry::finalize_if_due(store.as_ref(), product_id, Utc::now()).await?;
    let auction = store.get_auction(product_id).await?;
    Ok(Json(auction))
}

/// 입찰 요청 본문
#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub bidder_id: i64,
    pub bid_amount: i64,
}

/// 입찰 요청 처리
pub async fn handle_bid(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
    Json(req): Json<BidRequest>,
) -> Result<Json<Value>, MarketError> {
    let cmd = PlaceBidCommand {
        product_id,
        bidder_id: req.bidder_id,
        bid_amount: req.bid_amount,
    };
    let receipt = handle_place_bid(cmd, store.as_ref()).await?;

    let message = if receipt.bought_now {
        "즉시 구매가에 도달하여 낙찰 처리되었습니다."
    } else {
        "입찰이 성공적으로 처리되었습니다."
    };
    Ok(Json(json!({
        "message": message,
        "current_price": receipt.current_price,
        "end_time": receipt.end_time,
        "bought_now": receipt.bought_now,
    })))
}

/// 입찰자 퇴장 요청 본문
#[derive(Debug, Deserialize)]
pub struct KickRequest {
    pub actor_id: i64,
    pub bidder_id: i64,
}

/// 입찰자 퇴장 처리 (판매자 전용)
pub async fn handle_kick(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
    Json(req): Json<KickRequest>,
) -> Result<Json<Value>, MarketError> {
    let cmd = KickBidderCommand {
        product_id,
        actor_id: req.actor_id,
        bidder_id: req.bidder_id,
    };
    let auction = handle_kick_bidder(cmd, store.as_ref()).await?;
    Ok(Json(json!({
        "message": "입찰자가 퇴장 처리되었습니다.",
        "current_price": auction.current_price,
        "highest_bidder_id": auction.highest_bidder_id,
    })))
}

/// 입찰 이력 조회 (최신 순)
pub async fn handle_get_history(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
) -> Result<Json<Value>, MarketError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Handler", product_id);
    let history = store.bid_history(product_id).await?;
    Ok(Json(json!({
        "number_of_bids": history.len(),
        "history_list": history,
    })))
}
// endregion: --- Auction Handlers

// region:    --- Order Handlers

#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor_id: i64,
}

/// 상품 기준 주문 조회 (거래 당사자만)
pub async fn handle_get_order(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Order>, MarketError> {
    info!("{:<12} --> 주문 조회 id: {}", "Handler", product_id);
    let order = store.get_order(product_id).await?;
    order
        .role_of(query.actor_id)
        .ok_or(MarketError::UnauthorizedActor)?;
    Ok(Json(order))
}

/// 결제 제출 (구매자, multipart: actor_id / full_name / address / payment_proof)
pub async fn handle_submit_payment(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Order>, MarketError> {
    let mut form = FulfillmentForm::read(product_id, "payment", multipart).await?;
    let action = OrderAction::SubmitPayment {
        full_name: form.take_text("full_name")?,
        address: form.take_text("address")?,
        payment_proof_image: form.take_file("payment_proof")?,
    };
    let order = apply_order_action(store.as_ref(), product_id, form.actor_id()?, action).await?;
    Ok(Json(order))
}

/// 발송 확인 (판매자, multipart: actor_id / shipping_proof)
pub async fn handle_confirm_shipment(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Order>, MarketError> {
    let mut form = FulfillmentForm::read(product_id, "shipping", multipart).await?;
    let action = OrderAction::ConfirmShipment {
        shipping_proof_image: form.take_file("shipping_proof")?,
    };
    let order = apply_order_action(store.as_ref(), product_id, form.actor_id()?, action).await?;
    Ok(Json(order))
}

/// 수령 확인 (구매자)
pub async fn handle_confirm_delivery(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Order>, MarketError> {
    let order = apply_order_action(
        store.as_ref(),
        product_id,
        req.actor_id,
        OrderAction::ConfirmDelivery,
    )
    .await?;
    Ok(Json(order))
}

/// 거래 종료 (양쪽 모두 가능)
pub async fn handle_close_order(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Order>, MarketError> {
    let order =
        apply_order_action(store.as_ref(), product_id, req.actor_id, OrderAction::Close).await?;
    Ok(Json(order))
}

/// 주문 취소 (판매자, 수령 전까지만)
pub async fn handle_cancel_order(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Order>, MarketError> {
    let order =
        apply_order_action(store.as_ref(), product_id, req.actor_id, OrderAction::Cancel).await?;
    Ok(Json(order))
}

/// 후기 작성/수정 요청 본문
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub actor_id: i64,
    pub is_good: bool,
    pub content: String,
}

/// 후기 작성/수정
pub async fn handle_upsert_review(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Value>, MarketError> {
    let draft = ReviewDraft {
        is_good: req.is_good,
        content: req.content,
    };
    let review = upsert_review(store.as_ref(), product_id, req.actor_id, draft).await?;
    Ok(Json(json!({
        "message": "후기가 저장되었습니다.",
        "review": review,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ReviewSyncRequest {
    pub role: OrderRole,
}

/// 외부 평점 집계기의 반영 완료 표시
pub async fn handle_mark_review_synced(
    State(store): State<SharedStore>,
    Path(product_id): Path<i64>,
    Json(req): Json<ReviewSyncRequest>,
) -> Result<Json<Value>, MarketError> {
    store.mark_review_synced(product_id, req.role).await?;
    Ok(Json(json!({ "message": "후기 집계 반영이 표시되었습니다." })))
}
// endregion: --- Order Handlers

// region:    --- Settings Handlers

/// 전역 설정 조회
pub async fn handle_get_settings(
    State(store): State<SharedStore>,
) -> Result<Json<SystemSetting>, MarketError> {
    Ok(Json(store.get_settings().await?))
}

/// 전역 설정 갱신 (관리자)
pub async fn handle_update_settings(
    State(store): State<SharedStore>,
    Json(settings): Json<SystemSetting>,
) -> Result<Json<SystemSetting>, MarketError> {
    info!("{:<12} --> 전역 설정 갱신: {:?}", "Handler", settings);
    if settings.auto_extend_before < 0
        || settings.auto_extend_duration < 0
        || settings.latest_product_time < 0
    {
        return Err(MarketError::InvalidInput(
            "설정 값은 0 이상이어야 합니다.".to_string(),
        ));
    }
    store.update_settings(settings).await?;
    Ok(Json(settings))
}
// endregion: --- Settings Handlers

// region:    --- Multipart Form

/// 이행 증빙 multipart 본문
/// 텍스트 필드와 증빙 파일 하나를 읽어들이고, 파일은 업로드 경로에 저장한다.
struct FulfillmentForm {
    actor_id: Option<i64>,
    texts: std::collections::HashMap<String, String>,
    saved_file: Option<(String, String)>, // (필드 이름, 저장된 파일 이름)
}

impl FulfillmentForm {
    async fn read(
        product_id: i64,
        kind: &str,
        mut multipart: Multipart,
    ) -> Result<Self, MarketError> {
        let mut form = Self {
            actor_id: None,
            texts: std::collections::HashMap::new(),
            saved_file: None,
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| MarketError::InvalidInput(e.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if field.file_name().is_some() {
                let original = field
                    .file_name()
                    .unwrap_or("proof")
                    .replace(['/', '\\'], "_");
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| MarketError::InvalidInput(e.to_string()))?;
                if data.is_empty() {
                    return Err(MarketError::InvalidInput(
                        "증빙 파일이 비어 있습니다.".to_string(),
                    ));
                }
                let saved = format!(
                    "{}-{}-{}-{}",
                    product_id,
                    kind,
                    Utc::now().timestamp_millis(),
                    original
                );
                tokio::fs::create_dir_all(UPLOAD_DIR).await?;
                tokio::fs::write(std::path::Path::new(UPLOAD_DIR).join(&saved), &data).await?;
                form.saved_file = Some((name, saved));
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| MarketError::InvalidInput(e.to_string()))?;
                if name == "actor_id" {
                    form.actor_id = Some(text.parse().map_err(|_| {
                        MarketError::InvalidInput("actor_id가 올바르지 않습니다.".to_string())
                    })?);
                } else {
                    form.texts.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    fn actor_id(&self) -> Result<i64, MarketError> {
        self.actor_id
            .ok_or_else(|| MarketError::InvalidInput("actor_id가 누락되었습니다.".to_string()))
    }

    fn take_text(&mut self, name: &str) -> Result<String, MarketError> {
        self.texts
            .remove(name)
            .ok_or_else(|| MarketError::InvalidInput(format!("{name} 필드가 누락되었습니다.")))
    }

    fn take_file(&mut self, name: &str) -> Result<String, MarketError> {
        match self.saved_file.take() {
            Some((field, saved)) if field == name => Ok(saved),
            _ => Err(MarketError::InvalidInput(format!(
                "{name} 파일이 누락되었습니다."
            ))),
        }
    }
}
// endregion: --- Multipart Form
