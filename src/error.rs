/// 마켓플레이스 코어 오류 타입
/// 입찰 경로, 주문 경로, 저장소 오류를 모두 포함한다.
// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
// endregion: --- Imports

// region:    --- Error
#[derive(Debug, Error)]
pub enum MarketError {
    // 입찰 경로 오류
    #[error("경매가 아직 시작되지 않았습니다.")]
    AuctionNotStarted,
    #[error("경매가 이미 종료되었습니다.")]
    AuctionClosed,
    #[error("입찰 금액이 최소 입찰가보다 낮습니다. (최소 {minimum})")]
    BidTooLow { minimum: i64 },
    #[error("입찰 금액이 입찰 단위에 맞지 않습니다. (단위 {step})")]
    InvalidIncrement { step: i64 },
    #[error("다른 입찰자가 먼저 입찰하여 가격이 변경되었습니다. (현재 가격 {current_price})")]
    Outbid { current_price: i64 },
    #[error("입찰 경합이 계속되어 처리하지 못했습니다. 잠시 후 다시 시도해주세요.")]
    BidConflict,
    #[error("퇴장 처리된 입찰자는 더 이상 입찰할 수 없습니다.")]
    BidderKicked,
    #[error("이 경매는 신규 입찰자의 참여를 허용하지 않습니다.")]
    NewBidderBlocked,

    // 주문 경로 오류
    #[error("현재 주문 상태에서는 처리할 수 없는 요청입니다. (현재 상태 {current})")]
    InvalidStateTransition { current: String },
    #[error("해당 주문에 대한 권한이 없습니다.")]
    UnauthorizedActor,

    // 조회/등록 오류
    #[error("경매를 찾을 수 없습니다. (상품 {0})")]
    AuctionNotFound(i64),
    #[error("주문을 찾을 수 없습니다. (상품 {0})")]
    OrderNotFound(i64),
    #[error("이미 등록된 경매입니다. (상품 {0})")]
    AlreadyExists(i64),
    #[error("요청 값이 올바르지 않습니다: {0}")]
    InvalidInput(String),

    // 인프라 오류
    #[error("데이터베이스 오류: {0}")]
    Store(#[from] sqlx::Error),
    #[error("파일 저장 오류: {0}")]
    Io(#[from] std::io::Error),
}

impl MarketError {
    /// 클라이언트 응답에 실리는 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::AuctionNotStarted => "NOT_STARTED",
            MarketError::AuctionClosed => "ALREADY_ENDED",
            MarketError::BidTooLow { .. } => "LOW_BID",
            MarketError::InvalidIncrement { .. } => "INVALID_INCREMENT",
            MarketError::Outbid { .. } => "OUTBID",
            MarketError::BidConflict => "MAX_RETRIES_EXCEEDED",
            MarketError::BidderKicked => "BIDDER_KICKED",
            MarketError::NewBidderBlocked => "NEW_BIDDER_BLOCKED",
            MarketError::InvalidStateTransition { .. } => "INVALID_STATUS",
            MarketError::UnauthorizedActor => "UNAUTHORIZED",
            MarketError::AuctionNotFound(_) | MarketError::OrderNotFound(_) => "NOT_FOUND",
            MarketError::AlreadyExists(_) => "ALREADY_EXISTS",
            MarketError::InvalidInput(_) => "INVALID_INPUT",
            MarketError::Store(_) => "STORE_ERROR",
            MarketError::Io(_) => "IO_ERROR",
        }
    }

    /// HTTP 상태 코드 매핑
    fn status(&self) -> StatusCode {
        match self {
            MarketError::Outbid { .. }
            | MarketError::BidConflict
            | MarketError::InvalidStateTransition { .. }
            | MarketError::AlreadyExists(_) => StatusCode::CONFLICT,
            MarketError::UnauthorizedActor => StatusCode::FORBIDDEN,
            MarketError::AuctionNotFound(_) | MarketError::OrderNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            MarketError::Store(_) | MarketError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// 오류 응답 형식: {"error": 메시지, "code": 코드}
impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{:<12} --> 내부 오류: {:?}", "Error", self);
        }
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (status, Json(body)).into_response()
    }
}
// endregion: --- Error
