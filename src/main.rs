// region:    --- Imports
use crate::database::DatabaseManager;
use crate::store::postgres::PostgresStore;
use crate::store::SharedStore;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod bidding;
mod database;
mod error;
mod handlers;
mod order;
mod scheduler;
mod store;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 마켓 저장소 생성
    let market_store: SharedStore = Arc::new(PostgresStore::new(db_manager.get_pool()));

    // 경매 종료 스윕 시작
    let expiry_scheduler = scheduler::ExpiryScheduler::new(Arc::clone(&market_store));
    expiry_scheduler.start();

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/auctions", post(handlers::handle_create_auction))
        .route("/auctions/:id", get(handlers::handle_get_auction))
        .route("/auctions/:id/bids", post(handlers::handle_bid))
        .route("/auctions/:id/kick", post(handlers::handle_kick))
        .route("/auctions/:id/history", get(handlers::handle_get_history))
        .route("/orders/:id", get(handlers::handle_get_order))
        .route("/orders/:id/payment", post(handlers::handle_submit_payment))
        .route(
            "/orders/:id/shipping",
            post(handlers::handle_confirm_shipment),
        )
        .route(
            "/orders/:id/delivered",
            post(handlers::handle_confirm_delivery),
        )
        .route("/orders/:id/close", post(handlers::handle_close_order))
        .route("/orders/:id/cancel", post(handlers::handle_cancel_order))
        .route("/orders/:id/review", put(handlers::handle_upsert_review))
        .route(
            "/orders/:id/review/synced",
            post(handlers::handle_mark_review_synced),
        )
        .route(
            "/settings",
            get(handlers::handle_get_settings).put(handlers::handle_update_settings),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20)) // 증빙 이미지 업로드를 위한 바디 사이즈(20MB)
        .with_state(market_store);

    // 리스너 생성(로컬 호스트의 3000번 포트를 사용)
    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
