/// Postgres 저장소 쿼리 모음

/// 경매 조회
pub const GET_AUCTION: &str = r#"
    SELECT product_id, seller_id, start_price, step_price, buy_now_price, current_price,
           highest_bidder_id, bidder_count, start_time, end_time, status,
           auto_extend_enabled, allow_new_bidders, kicked_bidders
    FROM auctions
    WHERE product_id = $1
"#;

/// 경매 등록 (중복 등록은 무시하고 행 반환 없음)
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (product_id, seller_id, start_price, step_price, buy_now_price,
                          current_price, highest_bidder_id, bidder_count, start_time, end_time,
                          status, auto_extend_enabled, allow_new_bidders, kicked_bidders)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
    ON CONFLICT (product_id) DO NOTHING
    RETURNING product_id
"#;

/// 입찰 헤드 CAS 갱신
/// 저장된 현재가/마감 시각이 검증 시점 값과 일치할 때만 적용된다.
pub const COMMIT_BID_UPDATE: &str = r#"
    UPDATE auctions
    SET current_price = $2,
        highest_bidder_id = $3,
        end_time = COALESCE($4, end_time),
        status = $5
    WHERE product_id = $1
      AND status = 'ACTIVE'
      AND current_price = $6
      AND end_time = $7
    RETURNING product_id
"#;

/// 입찰 원장 추가
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (product_id, bidder_id, bid_price, bid_time)
    VALUES ($1, $2, $3, $4)
"#;

/// 퇴장자를 제외한 입찰자 수 갱신
pub const REFRESH_BIDDER_COUNT: &str = r#"
    UPDATE auctions
    SET bidder_count = (
        SELECT COUNT(DISTINCT b.bidder_id)
        FROM bids b
        WHERE b.product_id = $1
          AND NOT (b.bidder_id = ANY(auctions.kicked_bidders))
    )
    WHERE product_id = $1
"#;

/// 입찰자의 원장 기록 존재 여부
pub const HAS_BID_FROM: &str = r#"
    SELECT EXISTS(SELECT 1 FROM bids WHERE product_id = $1 AND bidder_id = $2) AS known
"#;

/// 퇴장 목록 추가
pub const APPEND_KICKED_BIDDER: &str = r#"
    UPDATE auctions
    SET kicked_bidders = array_append(kicked_bidders, $2)
    WHERE product_id = $1
      AND NOT (kicked_bidders @> ARRAY[$2]::BIGINT[])
"#;

/// 퇴장 후 헤드 되돌리기: 남은 유효 입찰 중 최고가 (없으면 시작가)
pub const REVERT_HEAD_AFTER_KICK: &str = r#"
    WITH best AS (
        SELECT b.bidder_id, b.bid_price
        FROM bids b
        JOIN auctions a ON a.product_id = b.product_id
        WHERE b.product_id = $1
          AND NOT (b.bidder_id = ANY(a.kicked_bidders))
        ORDER BY b.bid_price DESC, b.id DESC
        LIMIT 1
    )
    UPDATE auctions
    SET current_price = COALESCE((SELECT bid_price FROM best), start_price),
        highest_bidder_id = (SELECT bidder_id FROM best)
    WHERE product_id = $1
"#;

/// 마감 경과 경매 종료 전이 (멱등: 이미 종료된 경매에는 적용되지 않음)
pub const FINALIZE_AUCTION: &str = r#"
    UPDATE auctions
    SET status = 'ENDED'
    WHERE product_id = $1
      AND status = 'ACTIVE'
      AND end_time <= $2
    RETURNING product_id, seller_id, start_price, step_price, buy_now_price, current_price,
              highest_bidder_id, bidder_count, start_time, end_time, status,
              auto_extend_enabled, allow_new_bidders, kicked_bidders
"#;

/// 마감이 지난 진행 중 경매 목록
pub const DUE_AUCTIONS: &str = r#"
    SELECT product_id FROM auctions WHERE status = 'ACTIVE' AND end_time <= $1
"#;

/// 입찰 이력 조회 (최신 순)
pub const GET_BID_HISTORY: &str = r#"
    SELECT product_id, bidder_id, bid_price, bid_time
    FROM bids
    WHERE product_id = $1
    ORDER BY id DESC
"#;

/// 주문 생성 (멱등)
pub const INSERT_ORDER: &str = r#"
    INSERT INTO orders (product_id, seller_id, buyer_id, status)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (product_id) DO NOTHING
"#;

/// 주문 조회
pub const GET_ORDER: &str = r#"
    SELECT product_id, seller_id, buyer_id, status,
           full_name, address, payment_proof_image, shipping_proof_image,
           buyer_review_is_good, buyer_review_content, buyer_review_updated, buyer_review_synced,
           seller_review_is_good, seller_review_content, seller_review_updated, seller_review_synced,
           payment_submitted, seller_confirmed, buyer_received, finished
    FROM orders
    WHERE product_id = $1
"#;

/// 결제 제출 전이 (상태 CAS)
pub const ORDER_SUBMIT_PAYMENT: &str = r#"
    UPDATE orders
    SET status = $2, full_name = $3, address = $4, payment_proof_image = $5,
        payment_submitted = $6
    WHERE product_id = $1 AND status = $7
    RETURNING product_id
"#;

/// 발송 확인 전이 (상태 CAS)
pub const ORDER_CONFIRM_SHIPMENT: &str = r#"
    UPDATE orders
    SET status = $2, shipping_proof_image = $3, seller_confirmed = $4
    WHERE product_id = $1 AND status = $5
    RETURNING product_id
"#;

/// 수령 확인 전이 (상태 CAS)
pub const ORDER_CONFIRM_DELIVERY: &str = r#"
    UPDATE orders
    SET status = $2, buyer_received = $3
    WHERE product_id = $1 AND status = $4
    RETURNING product_id
"#;

/// 거래 종료 전이 (상태 CAS)
pub const ORDER_CLOSE: &str = r#"
    UPDATE orders
    SET status = $2, finished = $3
    WHERE product_id = $1 AND status = $4
    RETURNING product_id
"#;

/// 취소 전이 (상태 CAS)
pub const ORDER_CANCEL: &str = r#"
    UPDATE orders
    SET status = $2
    WHERE product_id = $1 AND status = $3
    RETURNING product_id
"#;

/// 구매자 후기 저장/수정
pub const UPSERT_BUYER_REVIEW: &str = r#"
    UPDATE orders
    SET buyer_review_is_good = $2, buyer_review_content = $3,
        buyer_review_updated = $4, buyer_review_synced = FALSE
    WHERE product_id = $1
    RETURNING product_id
"#;

/// 판매자 후기 저장/수정
pub const UPSERT_SELLER_REVIEW: &str = r#"
    UPDATE orders
    SET seller_review_is_good = $2, seller_review_content = $3,
        seller_review_updated = $4, seller_review_synced = FALSE
    WHERE product_id = $1
    RETURNING product_id
"#;

/// 구매자 후기 집계 반영 표시
pub const MARK_BUYER_REVIEW_SYNCED: &str = r#"
    UPDATE orders
    SET buyer_review_synced = TRUE
    WHERE product_id = $1 AND buyer_review_updated IS NOT NULL
"#;

/// 판매자 후기 집계 반영 표시
pub const MARK_SELLER_REVIEW_SYNCED: &str = r#"
    UPDATE orders
    SET seller_review_synced = TRUE
    WHERE product_id = $1 AND seller_review_updated IS NOT NULL
"#;

/// 전역 설정 조회
pub const GET_SETTINGS: &str = r#"
    SELECT auto_extend_before, auto_extend_duration, latest_product_time
    FROM settings
    WHERE only_row
"#;

/// 전역 설정 갱신
pub const UPDATE_SETTINGS: &str = r#"
    UPDATE settings
    SET auto_extend_before = $1, auto_extend_duration = $2, latest_product_time = $3
    WHERE only_row
"#;
