/// Postgres 마켓 저장소
/// 입찰 커밋은 조건부 UPDATE(저장된 헤드 = 검증 시점 헤드)와 원장 INSERT를
/// 하나의 트랜잭션으로 묶는다. 조건 불일치로 갱신된 행이 없으면 충돌이다.
// region:    --- Imports
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::bidding::model::{AuctionRecord, AuctionStatus, Bid, SystemSetting};
use crate::error::MarketError;
use crate::order::model::{
    FulfillmentInfo, Order, OrderRole, OrderStatus, OrderUpdate, Review, ReviewDraft, Timelines,
};
use crate::store::{queries, AuctionHead, BidCommit, CommitOutcome, MarketStore};
// endregion: --- Imports

// region:    --- Row Mapping
fn decode_err(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

fn auction_from_row(row: &PgRow) -> Result<AuctionRecord, sqlx::Error> {
    let status_raw: String = row.try_get("status")?;
    let status = AuctionStatus::parse(&status_raw)
        .ok_or_else(|| decode_err(format!("알 수 없는 경매 상태: {status_raw}")))?;
    Ok(AuctionRecord {
        product_id: row.try_get("product_id")?,
        seller_id: row.try_get("seller_id")?,
        start_price: row.try_get("start_price")?,
        step_price: row.try_get("step_price")?,
        buy_now_price: row.try_get("buy_now_price")?,
        current_price: row.try_get("current_price")?,
        highest_bidder_id: row.try_get("highest_bidder_id")?,
        bidder_count: row.try_get("bidder_count")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        status,
        auto_extend_enabled: row.try_get("auto_extend_enabled")?,
        allow_new_bidders: row.try_get("allow_new_bidders")?,
        kicked_bidders: row.try_get("kicked_bidders")?,
    })
}

fn bid_from_row(row: &PgRow) -> Result<Bid, sqlx::Error> {
    Ok(Bid {
        product_id: row.try_get("product_id")?,
        bidder_id: row.try_get("bidder_id")?,
        bid_price: row.try_get("bid_price")?,
        bid_time: row.try_get("bid_time")?,
    })
}

/// (is_good, content, updated, synced) 4열 묶음을 후기로 복원
fn review_from_columns(
    row: &PgRow,
    prefix: &str,
) -> Result<Option<Review>, sqlx::Error> {
    let updated: Option<DateTime<Utc>> = row.try_get(format!("{prefix}_updated").as_str())?;
    let Some(last_updated) = updated else {
        return Ok(None);
    };
    Ok(Some(Review {
        is_good: row
            .try_get::<Option<bool>, _>(format!("{prefix}_is_good").as_str())?
            .unwrap_or(false),
        content: row
            .try_get::<Option<String>, _>(format!("{prefix}_content").as_str())?
            .unwrap_or_default(),
        last_updated,
        is_synced: row
            .try_get::<Option<bool>, _>(format!("{prefix}_synced").as_str())?
            .unwrap_or(false),
    }))
}

fn order_from_row(row: &PgRow) -> Result<Order, sqlx::Error> {
    let status_raw: String = row.try_get("status")?;
    let status = OrderStatus::parse(&status_raw)
        .ok_or_else(|| decode_err(format!("알 수 없는 주문 상태: {status_raw}")))?;
    Ok(Order {
        product_id: row.try_get("product_id")?,
        seller_id: row.try_get("seller_id")?,
        buyer_id: row.try_get("buyer_id")?,
        status,
        fulfillment: FulfillmentInfo {
            full_name: row.try_get("full_name")?,
            address: row.try_get("address")?,
            payment_proof_image: row.try_get("payment_proof_image")?,
            shipping_proof_image: row.try_get("shipping_proof_image")?,
        },
        review_by_buyer: review_from_columns(row, "buyer_review")?,
        review_by_seller: review_from_columns(row, "seller_review")?,
        timelines: Timelines {
            payment_submitted: row.try_get("payment_submitted")?,
            seller_confirmed: row.try_get("seller_confirmed")?,
            buyer_received: row.try_get("buyer_received")?,
            finished: row.try_get("finished")?,
        },
    })
}
// endregion: --- Row Mapping

// region:    --- Postgres Store
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MarketStore for PostgresStore {
    async fn insert_auction(&self, auction: AuctionRecord) -> Result<(), MarketError> {
        let inserted = sqlx::query(queries::INSERT_AUCTION)
            .bind(auction.product_id)
            .bind(auction.seller_id)
            .bind(auction.start_price)
            .bind(auction.step_price)
            .bind(auction.buy_now_price)
            .bind(auction.current_price)
            .bind(auction.highest_bidder_id)
            .bind(auction.bidder_count)
            .bind(auction.start_time)
            .bind(auction.end_time)
            .bind(auction.status.as_str())
            .bind(auction.auto_extend_enabled)
            .bind(auction.allow_new_bidders)
            .bind(&auction.kicked_bidders)
            .fetch_optional(&*self.pool)
            .await?;
        if inserted.is_none() {
            return Err(MarketError::AlreadyExists(auction.product_id));
        }
        Ok(())
    }

    async fn get_auction(&self, product_id: i64) -> Result<AuctionRecord, MarketError> {
        let row = sqlx::query(queries::GET_AUCTION)
            .bind(product_id)
            .fetch_optional(&*self.pool)
            .await?
            .ok_or(MarketError::AuctionNotFound(product_id))?;
        Ok(auction_from_row(&row)?)
    }

    async fn has_bid_from(&self, product_id: i64, bidder_id: i64) -> Result<bool, MarketError> {
        let row = sqlx::query(queries::HAS_BID_FROM)
            .bind(product_id)
            .bind(bidder_id)
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.try_get("known")?)
    }

    async fn commit_bid(
        &self,
        product_id: i64,
        expected: AuctionHead,
        commit: BidCommit,
    ) -> Result<CommitOutcome, MarketError> {
        let mut tx = self.pool.begin().await?;

        let next_status = if commit.close {
            AuctionStatus::Ended
        } else {
            AuctionStatus::Active
        };
        let updated = sqlx::query(queries::COMMIT_BID_UPDATE)
            .bind(product_id)
            .bind(commit.new_price)
            .bind(commit.bidder_id)
            .bind(commit.new_end_time)
            .bind(next_status.as_str())
            .bind(expected.current_price)
            .bind(expected.end_time)
            .fetch_optional(&mut *tx)
            .await?;

        if updated.is_none() {
            tx.rollback().await?;
            return Ok(CommitOutcome::Conflict);
        }

        sqlx::query(queries::INSERT_BID)
            .bind(commit.bid.product_id)
            .bind(commit.bid.bidder_id)
            .bind(commit.bid.bid_price)
            .bind(commit.bid.bid_time)
            .execute(&mut *tx)
            .await?;
        sqlx::query(queries::REFRESH_BIDDER_COUNT)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CommitOutcome::Committed)
    }

    async fn kick_bidder(
        &self,
        product_id: i64,
        bidder_id: i64,
    ) -> Result<AuctionRecord, MarketError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(queries::APPEND_KICKED_BIDDER)
            .bind(product_id)
            .bind(bidder_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(queries::REVERT_HEAD_AFTER_KICK)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(queries::REFRESH_BIDDER_COUNT)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        let row = sqlx::query(queries::GET_AUCTION)
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(MarketError::AuctionNotFound(product_id))?;
        let record = auction_from_row(&row)?;

        tx.commit().await?;
        Ok(record)
    }

    async fn finalize_auction(
        &self,
        product_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<AuctionRecord>, MarketError> {
        let row = sqlx::query(queries::FINALIZE_AUCTION)
            .bind(product_id)
            .bind(now)
            .fetch_optional(&*self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(auction_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<i64>, MarketError> {
        let rows = sqlx::query(queries::DUE_AUCTIONS)
            .bind(now)
            .fetch_all(&*self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get("product_id").map_err(MarketError::from))
            .collect()
    }

    async fn bid_history(&self, product_id: i64) -> Result<Vec<Bid>, MarketError> {
        let rows = sqlx::query(queries::GET_BID_HISTORY)
            .bind(product_id)
            .fetch_all(&*self.pool)
            .await?;
        rows.iter()
            .map(|row| bid_from_row(row).map_err(MarketError::from))
            .collect()
    }

    async fn insert_order(&self, order: Order) -> Result<(), MarketError> {
        sqlx::query(queries::INSERT_ORDER)
            .bind(order.product_id)
            .bind(order.seller_id)
            .bind(order.buyer_id)
            .bind(order.status.as_str())
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn get_order(&self, product_id: i64) -> Result<Order, MarketError> {
        let row = sqlx::query(queries::GET_ORDER)
            .bind(product_id)
            .fetch_optional(&*self.pool)
            .await?
            .ok_or(MarketError::OrderNotFound(product_id))?;
        Ok(order_from_row(&row)?)
    }

    async fn try_transition_order(
        &self,
        product_id: i64,
        expected: OrderStatus,
        update: OrderUpdate,
    ) -> Result<CommitOutcome, MarketError> {
        let next = update.next_status();
        let updated = match update {
            OrderUpdate::PaymentSubmitted {
                full_name,
                address,
                payment_proof_image,
                at,
            } => {
                sqlx::query(queries::ORDER_SUBMIT_PAYMENT)
                    .bind(product_id)
                    .bind(next.as_str())
                    .bind(full_name)
                    .bind(address)
                    .bind(payment_proof_image)
                    .bind(at)
                    .bind(expected.as_str())
                    .fetch_optional(&*self.pool)
                    .await?
            }
            OrderUpdate::ShipmentConfirmed {
                shipping_proof_image,
                at,
            } => {
                sqlx::query(queries::ORDER_CONFIRM_SHIPMENT)
                    .bind(product_id)
                    .bind(next.as_str())
                    .bind(shipping_proof_image)
                    .bind(at)
                    .bind(expected.as_str())
                    .fetch_optional(&*self.pool)
                    .await?
            }
            OrderUpdate::DeliveryConfirmed { at } => {
                sqlx::query(queries::ORDER_CONFIRM_DELIVERY)
                    .bind(product_id)
                    .bind(next.as_str())
                    .bind(at)
                    .bind(expected.as_str())
                    .fetch_optional(&*self.pool)
                    .await?
            }
            OrderUpdate::Closed { at } => {
                sqlx::query(queries::ORDER_CLOSE)
                    .bind(product_id)
                    .bind(next.as_str())
                    .bind(at)
                    .bind(expected.as_str())
                    .fetch_optional(&*self.pool)
                    .await?
            }
            OrderUpdate::Cancelled => {
                sqlx::query(queries::ORDER_CANCEL)
                    .bind(product_id)
                    .bind(next.as_str())
                    .bind(expected.as_str())
                    .fetch_optional(&*self.pool)
                    .await?
            }
        };

        Ok(if updated.is_some() {
            CommitOutcome::Committed
        } else {
            CommitOutcome::Conflict
        })
    }

    async fn upsert_review(
        &self,
        product_id: i64,
        role: OrderRole,
        draft: ReviewDraft,
        now: DateTime<Utc>,
    ) -> Result<Review, MarketError> {
        let query = match role {
            OrderRole::Buyer => queries::UPSERT_BUYER_REVIEW,
            OrderRole::Seller => queries::UPSERT_SELLER_REVIEW,
        };
        let updated = sqlx::query(query)
            .bind(product_id)
            .bind(draft.is_good)
            .bind(&draft.content)
            .bind(now)
            .fetch_optional(&*self.pool)
            .await?;
        if updated.is_none() {
            return Err(MarketError::OrderNotFound(product_id));
        }
        Ok(Review {
            is_good: draft.is_good,
            content: draft.content,
            last_updated: now,
            is_synced: false,
        })
    }

    async fn mark_review_synced(
        &self,
        product_id: i64,
        role: OrderRole,
    ) -> Result<(), MarketError> {
        let query = match role {
            OrderRole::Buyer => queries::MARK_BUYER_REVIEW_SYNCED,
            OrderRole::Seller => queries::MARK_SELLER_REVIEW_SYNCED,
        };
        sqlx::query(query)
            .bind(product_id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn get_settings(&self) -> Result<SystemSetting, MarketError> {
        let row = sqlx::query(queries::GET_SETTINGS)
            .fetch_one(&*self.pool)
            .await?;
        Ok(SystemSetting {
            auto_extend_before: row.try_get("auto_extend_before")?,
            auto_extend_duration: row.try_get("auto_extend_duration")?,
            latest_product_time: row.try_get("latest_product_time")?,
        })
    }

    async fn update_settings(&self, settings: SystemSetting) -> Result<(), MarketError> {
        sqlx::query(queries::UPDATE_SETTINGS)
            .bind(settings.auto_extend_before)
            .bind(settings.auto_extend_duration)
            .bind(settings.latest_product_time)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}
// endregion: --- Postgres Store
