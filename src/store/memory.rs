/// 인메모리 마켓 저장소
/// Postgres 구현과 같은 인터페이스를 제공하며, 테스트와
/// 인프라 없는 개발 모드에서 사용한다.
/// 쓰기 락 구간이 곧 원자 단위다. 상품 단위 비교는 락 안에서 수행되므로
/// 같은 상품에 대한 쓰기는 모두 직렬화된다.
// region:    --- Imports
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::bidding::model::{AuctionRecord, AuctionStatus, Bid, SystemSetting};
use crate::error::MarketError;
use crate::order::model::{Order, OrderRole, OrderStatus, OrderUpdate, Review, ReviewDraft};
use crate::store::{AuctionHead, BidCommit, CommitOutcome, MarketStore};
// endregion: --- Imports

// region:    --- Memory Store
/// 경매 레코드와 그 입찰 원장
struct AuctionSlot {
    record: AuctionRecord,
    ledger: Vec<Bid>,
}

impl AuctionSlot {
    /// 퇴장자를 제외한 서로 다른 입찰자 수
    fn live_bidder_count(&self) -> i64 {
        self.ledger
            .iter()
            .filter(|b| !self.record.is_kicked(b.bidder_id))
            .map(|b| b.bidder_id)
            .collect::<HashSet<_>>()
            .len() as i64
    }
}

#[derive(Default)]
pub struct MemoryStore {
    auctions: RwLock<HashMap<i64, AuctionSlot>>,
    orders: RwLock<HashMap<i64, Order>>,
    settings: RwLock<SystemSetting>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn insert_auction(&self, auction: AuctionRecord) -> Result<(), MarketError> {
        let mut auctions = self.auctions.write().await;
        if auctions.contains_key(&auction.product_id) {
            return Err(MarketError::AlreadyExists(auction.product_id));
        }
        auctions.insert(
            auction.product_id,
            AuctionSlot {
                record: auction,
                ledger: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get_auction(&self, product_id: i64) -> Result<AuctionRecord, MarketError> {
        let auctions = self.auctions.read().await;
        auctions
            .get(&product_id)
            .map(|slot| slot.record.clone())
            .ok_or(MarketError::AuctionNotFound(product_id))
    }

    async fn has_bid_from(&self, product_id: i64, bidder_id: i64) -> Result<bool, MarketError> {
        let auctions = self.auctions.read().await;
        let slot = auctions
            .get(&product_id)
            .ok_or(MarketError::AuctionNotFound(product_id))?;
        Ok(slot.ledger.iter().any(|b| b.bidder_id == bidder_id))
    }

    async fn commit_bid(
        &self,
        product_id: i64,
        expected: AuctionHead,
        commit: BidCommit,
    ) -> Result<CommitOutcome, MarketError> {
        let mut auctions = self.auctions.write().await;
        let slot = auctions
            .get_mut(&product_id)
            .ok_or(MarketError::AuctionNotFound(product_id))?;
        let record = &mut slot.record;

        // 헤드 비교: 검증 이후 다른 쓰기가 끼어들었으면 충돌
        if record.status != AuctionStatus::Active
            || record.current_price != expected.current_price
            || record.end_time != expected.end_time
        {
            return Ok(CommitOutcome::Conflict);
        }

        record.current_price = commit.new_price;
        record.highest_bidder_id = Some(commit.bidder_id);
        if let Some(end_time) = commit.new_end_time {
            record.end_time = end_time;
        }
        if commit.close {
            record.status = AuctionStatus::Ended;
        }
        // 원장 추가는 헤드 갱신과 같은 락 구간 안에서만 일어난다
        slot.ledger.push(commit.bid);
        slot.record.bidder_count = slot.live_bidder_count();

        Ok(CommitOutcome::Committed)
    }

    async fn kick_bidder(
        &self,
        product_id: i64,
        bidder_id: i64,
    ) -> Result<AuctionRecord, MarketError> {
        let mut auctions = self.auctions.write().await;
        let slot = auctions
            .get_mut(&product_id)
            .ok_or(MarketError::AuctionNotFound(product_id))?;

        if !slot.record.is_kicked(bidder_id) {
            slot.record.kicked_bidders.push(bidder_id);
        }

        // 남은 유효 입찰 중 최고가로 헤드 되돌리기 (없으면 시작가)
        let best = slot
            .ledger
            .iter()
            .filter(|b| !slot.record.is_kicked(b.bidder_id))
            .max_by_key(|b| b.bid_price)
            .cloned();
        match best {
            Some(bid) => {
                slot.record.current_price = bid.bid_price;
                slot.record.highest_bidder_id = Some(bid.bidder_id);
            }
            None => {
                slot.record.current_price = slot.record.start_price;
                slot.record.highest_bidder_id = None;
            }
        }
        slot.record.bidder_count = slot.live_bidder_count();

        Ok(slot.record.clone())
    }

    async fn finalize_auction(
        &self,
        product_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<AuctionRecord>, MarketError> {
        let mut auctions = self.auctions.write().await;
        let slot = auctions
            .get_mut(&product_id)
            .ok_or(MarketError::AuctionNotFound(product_id))?;

        if slot.record.status != AuctionStatus::Active || now < slot.record.end_time {
            return Ok(None);
        }
        slot.record.status = AuctionStatus::Ended;
        Ok(Some(slot.record.clone()))
    }

    async fn due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<i64>, MarketError> {
        let auctions = self.auctions.read().await;
        Ok(auctions
            .values()
            .filter(|slot| {
                slot.record.status == AuctionStatus::Active && slot.record.end_time <= now
            })
            .map(|slot| slot.record.product_id)
            .collect())
    }

    async fn bid_history(&self, product_id: i64) -> Result<Vec<Bid>, MarketError> {
        let auctions = self.auctions.read().await;
        let slot = auctions
            .get(&product_id)
            .ok_or(MarketError::AuctionNotFound(product_id))?;
        // 수락 순서의 역순 (최신 먼저)
        Ok(slot.ledger.iter().rev().cloned().collect())
    }

    async fn insert_order(&self, order: Order) -> Result<(), MarketError> {
        let mut orders = self.orders.write().await;
        orders.entry(order.product_id).or_insert(order);
        Ok(())
    }

    async fn get_order(&self, product_id: i64) -> Result<Order, MarketError> {
        let orders = self.orders.read().await;
        orders
            .get(&product_id)
            .cloned()
            .ok_or(MarketError::OrderNotFound(product_id))
    }

    async fn try_transition_order(
        &self,
        product_id: i64,
        expected: OrderStatus,
        update: OrderUpdate,
    ) -> Result<CommitOutcome, MarketError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&product_id)
            .ok_or(MarketError::OrderNotFound(product_id))?;

        if order.status != expected {
            return Ok(CommitOutcome::Conflict);
        }

        order.status = update.next_status();
        match update {
            OrderUpdate::PaymentSubmitted {
                full_name,
                address,
                payment_proof_image,
                at,
            } => {
                order.fulfillment.full_name = Some(full_name);
                order.fulfillment.address = Some(address);
                order.fulfillment.payment_proof_image = Some(payment_proof_image);
                order.timelines.payment_submitted = Some(at);
            }
            OrderUpdate::ShipmentConfirmed {
                shipping_proof_image,
                at,
            } => {
                order.fulfillment.shipping_proof_image = Some(shipping_proof_image);
                order.timelines.seller_confirmed = Some(at);
            }
            OrderUpdate::DeliveryConfirmed { at } => {
                order.timelines.buyer_received = Some(at);
            }
            OrderUpdate::Closed { at } => {
                order.timelines.finished = Some(at);
            }
            OrderUpdate::Cancelled => {}
        }

        Ok(CommitOutcome::Committed)
    }

    async fn upsert_review(
        &self,
        product_id: i64,
        role: OrderRole,
        draft: ReviewDraft,
        now: DateTime<Utc>,
    ) -> Result<Review, MarketError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&product_id)
            .ok_or(MarketError::OrderNotFound(product_id))?;

        let review = Review {
            is_good: draft.is_good,
            content: draft.content,
            last_updated: now,
            is_synced: false,
        };
        match role {
            OrderRole::Buyer => order.review_by_buyer = Some(review.clone()),
            OrderRole::Seller => order.review_by_seller = Some(review.clone()),
        }
        Ok(review)
    }

    async fn mark_review_synced(
        &self,
        product_id: i64,
        role: OrderRole,
    ) -> Result<(), MarketError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&product_id)
            .ok_or(MarketError::OrderNotFound(product_id))?;

        let review = match role {
            OrderRole::Buyer => order.review_by_buyer.as_mut(),
            OrderRole::Seller => order.review_by_seller.as_mut(),
        };
        if let Some(review) = review {
            review.is_synced = true;
        }
        Ok(())
    }

    async fn get_settings(&self) -> Result<SystemSetting, MarketError> {
        Ok(*self.settings.read().await)
    }

    async fn update_settings(&self, settings: SystemSetting) -> Result<(), MarketError> {
        *self.settings.write().await = settings;
        Ok(())
    }
}
// endregion: --- Memory Store
