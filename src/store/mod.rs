/// 마켓 저장소 추상화
/// 경매 레코드 + 입찰 원장 + 주문 + 전역 설정을 보관한다.
/// 같은 상품에 대한 쓰기는 저장소가 제공하는 CAS 연산으로 직렬화되며,
/// 서로 다른 상품은 경합하지 않는다.
// region:    --- Imports
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::bidding::model::{AuctionRecord, Bid, SystemSetting};
use crate::error::MarketError;
use crate::order::model::{Order, OrderRole, OrderStatus, OrderUpdate, Review, ReviewDraft};

pub mod memory;
pub mod postgres;
pub mod queries;
// endregion: --- Imports

// region:    --- CAS Types
/// 검증 시점에 읽은 경매 헤드
/// 커밋 시 저장된 값과 일치해야만 쓰기가 적용된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionHead {
    pub current_price: i64,
    pub end_time: DateTime<Utc>,
}

/// CAS 성공 시 적용되는 입찰 커밋 내용
/// 원장 추가는 헤드 갱신과 같은 원자 단위 안에서만 일어난다.
#[derive(Debug, Clone)]
pub struct BidCommit {
    pub new_price: i64,
    pub bidder_id: i64,
    /// 자동 연장 정책이 제안한 새 마감 시각
    pub new_end_time: Option<DateTime<Utc>>,
    /// 즉시 구매: 마감 시각과 무관하게 경매를 종료한다
    pub close: bool,
    pub bid: Bid,
}

/// CAS 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    Conflict,
}
// endregion: --- CAS Types

// region:    --- Store Trait
pub type SharedStore = Arc<dyn MarketStore>;

#[async_trait]
pub trait MarketStore: Send + Sync {
    // -- 경매
    async fn insert_auction(&self, auction: AuctionRecord) -> Result<(), MarketError>;
    async fn get_auction(&self, product_id: i64) -> Result<AuctionRecord, MarketError>;
    /// 해당 입찰자의 원장 기록 존재 여부 (신규 입찰자 판정용)
    async fn has_bid_from(&self, product_id: i64, bidder_id: i64) -> Result<bool, MarketError>;
    /// 입찰 CAS 커밋: 저장된 헤드가 expected와 일치할 때만
    /// 가격/최고 입찰자/마감/상태를 갱신하고 원장에 추가한다.
    async fn commit_bid(
        &self,
        product_id: i64,
        expected: AuctionHead,
        commit: BidCommit,
    ) -> Result<CommitOutcome, MarketError>;
    /// 입찰자 퇴장: 퇴장 목록에 추가하고, 남은 유효 입찰 중
    /// 최고가로 헤드를 되돌린다. (없으면 시작가로)
    async fn kick_bidder(
        &self,
        product_id: i64,
        bidder_id: i64,
    ) -> Result<AuctionRecord, MarketError>;
    /// 마감 경과 경매의 종료 전이 (ACTIVE -> ENDED)
    /// 전이가 지금 일어났을 때만 레코드를 돌려준다. 이미 종료된 경매는 no-op.
    async fn finalize_auction(
        &self,
        product_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<AuctionRecord>, MarketError>;
    /// 마감이 지난 진행 중 경매 목록 (주기 스윕용)
    async fn due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<i64>, MarketError>;
    /// 입찰 이력 (최신 순)
    async fn bid_history(&self, product_id: i64) -> Result<Vec<Bid>, MarketError>;

    // -- 주문
    /// 주문 생성 (이미 있으면 no-op, 종료 전이의 멱등성 보장)
    async fn insert_order(&self, order: Order) -> Result<(), MarketError>;
    async fn get_order(&self, product_id: i64) -> Result<Order, MarketError>;
    /// 주문 상태 CAS 전이: 저장된 상태가 expected와 일치할 때만 적용한다.
    async fn try_transition_order(
        &self,
        product_id: i64,
        expected: OrderStatus,
        update: OrderUpdate,
    ) -> Result<CommitOutcome, MarketError>;
    /// 역할별 후기 저장/수정 (저장 시마다 is_synced = false)
    async fn upsert_review(
        &self,
        product_id: i64,
        role: OrderRole,
        draft: ReviewDraft,
        now: DateTime<Utc>,
    ) -> Result<Review, MarketError>;
    /// 외부 평점 집계기가 반영 완료를 표시하는 인터페이스
    async fn mark_review_synced(
        &self,
        product_id: i64,
        role: OrderRole,
    ) -> Result<(), MarketError>;

    // -- 전역 설정
    async fn get_settings(&self) -> Result<SystemSetting, MarketError>;
    async fn update_settings(&self, settings: SystemSetting) -> Result<(), MarketError>;
}
// endregion: --- Store Trait
